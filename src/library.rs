//! Template libraries: TOML descriptions of template modules
//!
//! The built-in library covers the modules the CTF final-fit variants import
//! (propagators, updators, estimators, fitters and smoothers, rec-hit tooling,
//! geometry, magnetic field and the track producers). Additional libraries can
//! be layered over it with [`TemplateLibrary::merge`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::record::{ParameterRecord, Value};
use crate::template::{ModuleCatalog, RegistryError, TemplateModule};

/// Errors that can occur when loading a template library
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Failed to read template library: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse template library TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid template library: {0}")]
    Registry(#[from] RegistryError),
}

/// TOML structure for deserializing libraries
#[derive(Deserialize)]
struct TomlLibrary {
    #[serde(default, rename = "module")]
    modules: Vec<TomlModule>,
}

#[derive(Deserialize)]
struct TomlModule {
    path: String,
    #[serde(default, rename = "record")]
    records: Vec<TomlRecord>,
}

#[derive(Deserialize)]
struct TomlRecord {
    binding: String,
    kind: String,
    #[serde(default)]
    fields: BTreeMap<String, Value>,
}

/// Template modules shipped with the crate
const DEFAULT_LIBRARY: &str = r##"
# Magnetic field and geometry

[[module]]
path = "MagneticField.Engine.uniformMagneticField"

[[module.record]]
binding = "UniformMagneticFieldESProducer"
kind = "UniformMagneticFieldESProducer"
[module.record.fields]
ZFieldInTesla = 0.0

[[module]]
path = "Geometry.CMSCommonData.cmsIdealGeometryXML"

[[module.record]]
binding = "XMLIdealGeometryESSource"
kind = "XMLIdealGeometryESSource"
[module.record.fields]
rootNodeName = "cms:OCMS"
geomXMLFiles = [
    "Geometry/CMSCommonData/data/materials.xml",
    "Geometry/CMSCommonData/data/rotations.xml",
    "Geometry/CMSCommonData/data/cms.xml",
    "Geometry/TrackerCommonData/data/tracker.xml",
]

[[module]]
path = "Geometry.TrackerGeometryBuilder.trackerGeometry"

[[module.record]]
binding = "TrackerDigiGeometryESModule"
kind = "TrackerDigiGeometryESModule"
[module.record.fields]
applyAlignment = false

[[module]]
path = "Geometry.TrackerNumberingBuilder.trackerNumberingGeometry"

[[module.record]]
binding = "TrackerGeometricDetESModule"
kind = "TrackerGeometricDetESModule"
[module.record.fields]
fromDDD = true

# Updators and estimators

[[module]]
path = "TrackingTools.KalmanUpdators.KFUpdatorESProducer"

[[module.record]]
binding = "KFUpdatorESProducer"
kind = "KFUpdatorESProducer"
[module.record.fields]
ComponentName = "KFUpdator"

[[module]]
path = "TrackingTools.KalmanUpdators.Chi2MeasurementEstimatorESProducer"

[[module.record]]
binding = "Chi2MeasurementEstimator"
kind = "Chi2MeasurementEstimatorESProducer"
[module.record.fields]
ComponentName = "Chi2"
MaxChi2 = 30.0
nSigma = 3.0

[[module]]
path = "TrackingTools.KalmanUpdators.MRHChi2MeasurementEstimatorESProducer"

[[module.record]]
binding = "MRHChi2MeasurementEstimator"
kind = "MRHChi2MeasurementEstimatorESProducer"
[module.record.fields]
ComponentName = "MRHChi2"
MaxChi2 = 30.0
nSigma = 3.0

# Propagators

[[module]]
path = "TrackingTools.MaterialEffects.MaterialPropagator"

[[module.record]]
binding = "MaterialPropagator"
kind = "PropagatorWithMaterialESProducer"
[module.record.fields]
ComponentName = "PropagatorWithMaterial"
Mass = 0.105
MaxDPhi = 1.6
PropagationDirection = "alongMomentum"
useRungeKutta = false

[[module]]
path = "TrackingTools.MaterialEffects.OppositeMaterialPropagator"

[[module.record]]
binding = "OppositeMaterialPropagator"
kind = "PropagatorWithMaterialESProducer"
[module.record.fields]
ComponentName = "PropagatorWithMaterialOpposite"
Mass = 0.105
MaxDPhi = 1.6
PropagationDirection = "oppositeToMomentum"
useRungeKutta = false

# Kalman fitting

[[module]]
path = "TrackingTools.TrackFitters.KFTrajectoryFitterESProducer"

[[module.record]]
binding = "KFTrajectoryFitter"
kind = "KFTrajectoryFitterESProducer"
[module.record.fields]
ComponentName = "KFFitter"
Propagator = "PropagatorWithMaterial"
Updator = "KFUpdator"
Estimator = "Chi2"
minHits = 3

[[module]]
path = "TrackingTools.TrackFitters.KFTrajectorySmootherESProducer"

[[module.record]]
binding = "KFTrajectorySmoother"
kind = "KFTrajectorySmootherESProducer"
[module.record.fields]
ComponentName = "KFSmoother"
Propagator = "PropagatorWithMaterial"
Updator = "KFUpdator"
Estimator = "Chi2"
errorRescaling = 100.0
minHits = 3

[[module]]
path = "TrackingTools.TrackFitters.KFFittingSmootherESProducer"

[[module.record]]
binding = "KFFittingSmoother"
kind = "KFFittingSmootherESProducer"
[module.record.fields]
ComponentName = "KFFittingSmoother"
Fitter = "KFFitter"
Smoother = "KFSmoother"
EstimateCut = -1.0
MinNumberOfHits = 5

# Deterministic annealing fitting

[[module]]
path = "TrackingTools.TrackFitters.DAFTrajectoryFitterESProducer"

[[module.record]]
binding = "DAFTrajectoryFitter"
kind = "DAFTrajectoryFitterESProducer"
[module.record.fields]
ComponentName = "DAFFitter"
Propagator = "RungeKuttaTrackerPropagator"
Updator = "KFUpdator"
Estimator = "MRHChi2"
minHits = 3

[[module]]
path = "TrackingTools.TrackFitters.DAFTrajectorySmootherESProducer"

[[module.record]]
binding = "DAFTrajectorySmoother"
kind = "DAFTrajectorySmootherESProducer"
[module.record.fields]
ComponentName = "DAFSmoother"
Propagator = "RungeKuttaTrackerPropagator"
Updator = "KFUpdator"
Estimator = "MRHChi2"
errorRescaling = 100.0
minHits = 3

[[module]]
path = "TrackingTools.TrackFitters.DAFFittingSmootherESProducer"

[[module.record]]
binding = "DAFFittingSmoother"
kind = "KFFittingSmootherESProducer"
[module.record.fields]
ComponentName = "DAFFittingSmoother"
Fitter = "DAFFitter"
Smoother = "DAFSmoother"
EstimateCut = -1.0
MinNumberOfHits = 3

# Multi rec-hit tooling

[[module]]
path = "RecoTracker.SiTrackerMRHTools.GroupedMultiRecHitCollector"

[[module.record]]
binding = "groupedMultiRecHitCollector"
kind = "MultiRecHitCollectorESProducer"
[module.record.fields]
ComponentName = "groupedMultiRecHitCollector"
Mode = "Grouped"
MeasurementTrackerName = ""
propagatorAlongName = "RungeKuttaTrackerPropagator"
propagatorOppositeName = "OppositeRungeKuttaTrackerPropagator"
MultiRecHitUpdator = "SiTrackerMultiRecHitUpdator"

[[module]]
path = "RecoTracker.SiTrackerMRHTools.SimpleMultiRecHitCollector"

[[module.record]]
binding = "simpleMultiRecHitCollector"
kind = "MultiRecHitCollectorESProducer"
[module.record.fields]
ComponentName = "simpleMultiRecHitCollector"
Mode = "Simple"
MeasurementTrackerName = ""
propagatorAlongName = "RungeKuttaTrackerPropagator"
MultiRecHitUpdator = "SiTrackerMultiRecHitUpdator"

[[module]]
path = "RecoTracker.SiTrackerMRHTools.SiTrackerMultiRecHitUpdator"

[[module.record]]
binding = "siTrackerMultiRecHitUpdator"
kind = "SiTrackerMultiRecHitUpdatorESProducer"
[module.record.fields]
ComponentName = "SiTrackerMultiRecHitUpdator"
TTRHBuilder = "WithTrackAngle"
HitPropagator = "trackerHitPropagator"
AnnealingProgram = [80.0, 9.0, 4.0, 1.0, 1.0, 1.0]

[[module.record]]
binding = "trackerHitPropagator"
kind = "PropagatorWithMaterialESProducer"
[module.record.fields]
ComponentName = "trackerHitPropagator"
Mass = 0.105
MaxDPhi = 1.6
PropagationDirection = "anyDirection"
useRungeKutta = false

# Local reconstruction

[[module]]
path = "RecoLocalTracker.SiStripRecHitConverter.StripCPEfromTrackAngle"

[[module.record]]
binding = "StripCPEfromTrackAngleESProducer"
kind = "StripCPEESProducer"
[module.record.fields]
ComponentName = "StripCPEfromTrackAngle"

[[module]]
path = "RecoLocalTracker.SiStripRecHitConverter.SiStripRecHitMatcher"

[[module.record]]
binding = "SiStripRecHitMatcherESProducer"
kind = "SiStripRecHitMatcherESProducer"
[module.record.fields]
ComponentName = "StandardMatcher"
NSigmaInside = 3.0

[[module]]
path = "RecoLocalTracker.SiPixelRecHits.PixelCPEParmError"

[[module.record]]
binding = "PixelCPEParmErrorESProducer"
kind = "PixelCPEParmErrorESProducer"
[module.record.fields]
ComponentName = "PixelCPEParmError"
PixelErrorParametrization = "NOTcmsim"

[[module]]
path = "RecoTracker.TransientTrackingRecHit.TransientTrackingRecHitBuilder"

[[module.record]]
binding = "TTRHBuilderAngle"
kind = "TkTransientTrackingRecHitBuilderESProducer"
[module.record.fields]
ComponentName = "WithTrackAngle"
StripCPE = "StripCPEfromTrackAngle"
PixelCPE = "PixelCPEParmError"
Matcher = "StandardMatcher"

# Track producers

[[module]]
path = "RecoTracker.TrackProducer.CTFFinalFitWithMaterial"

[[module.record]]
binding = "ctfWithMaterialTracks"
kind = "TrackProducer"
[module.record.fields]
src = "ckfTrackCandidates"
producer = ""
Fitter = "KFFittingSmoother"
Propagator = "PropagatorWithMaterial"
TTRHBuilder = "WithTrackAngle"
TrajectoryInEvent = false

[[module]]
path = "RecoTracker.TrackProducer.CTFFinalFitWithMaterialDAF"

[[module.record]]
binding = "ctfWithMaterialTracksDAF"
kind = "DAFTrackProducer"
[module.record.fields]
src = "ckfTrackCandidates"
producer = ""
Fitter = "DAFFittingSmoother"
Propagator = "RungeKuttaTrackerPropagator"
TTRHBuilder = "WithTrackAngle"
UpdatorName = "SiTrackerMultiRecHitUpdator"
MeasurementCollector = "groupedMultiRecHitCollector"
TrajectoryInEvent = false

[[module]]
path = "RecoTracker.TrackProducer.TrackRefitter"

[[module.record]]
binding = "TrackRefitter"
kind = "TrackRefitter"
[module.record.fields]
src = "ctfWithMaterialTracks"
producer = ""
Fitter = "KFFittingSmoother"
Propagator = "PropagatorWithMaterial"
TTRHBuilder = "WithTrackAngle"
TrajectoryInEvent = false
"##;

/// A set of template modules in definition order
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    modules: Vec<TemplateModule>,
}

impl TemplateLibrary {
    /// Load a library from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, LibraryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a library from a TOML string
    pub fn from_str(content: &str) -> Result<Self, LibraryError> {
        let parsed: TomlLibrary = toml::from_str(content)?;

        let mut modules = Vec::with_capacity(parsed.modules.len());
        for m in parsed.modules {
            let mut module = TemplateModule::new(m.path);
            for r in m.records {
                let mut record = ParameterRecord::new(r.kind);
                for (field, value) in r.fields {
                    record.set_field(field, value);
                }
                module.add_record(r.binding, record)?;
            }
            modules.push(module);
        }
        Ok(TemplateLibrary { modules })
    }

    /// A library without any modules
    pub fn empty() -> Self {
        TemplateLibrary {
            modules: Vec::new(),
        }
    }

    /// Layer `other` over this library; a module in `other` replaces one with the same path
    pub fn merge(mut self, other: TemplateLibrary) -> Self {
        for module in other.modules {
            match self.modules.iter_mut().find(|m| m.path() == module.path()) {
                Some(existing) => {
                    tracing::debug!(module = module.path(), "library module overridden");
                    *existing = module;
                }
                None => self.modules.push(module),
            }
        }
        self
    }

    pub fn modules(&self) -> &[TemplateModule] {
        &self.modules
    }

    pub fn get(&self, path: &str) -> Option<&TemplateModule> {
        self.modules.iter().find(|m| m.path() == path)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Register every module in a fresh catalog
    pub fn into_catalog(self) -> Result<ModuleCatalog, LibraryError> {
        let mut catalog = ModuleCatalog::new();
        for module in self.modules {
            catalog.register_module(module)?;
        }
        Ok(catalog)
    }
}

impl Default for TemplateLibrary {
    fn default() -> Self {
        Self::from_str(DEFAULT_LIBRARY).expect("Default template library should be valid TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::COMPONENT_NAME;

    #[test]
    fn test_default_library_loads() {
        let library = TemplateLibrary::default();
        assert!(library.get("TrackingTools.MaterialEffects.MaterialPropagator").is_some());
        assert!(library.get("RecoTracker.TrackProducer.CTFFinalFitWithMaterialDAF").is_some());
        let catalog = library.into_catalog().expect("Default modules should have unique paths");
        assert!(catalog.contains("TrackingTools.TrackFitters.KFFittingSmootherESProducer"));
    }

    #[test]
    fn test_value_types_from_toml() {
        let library = TemplateLibrary::default();
        let propagator = library
            .get("TrackingTools.MaterialEffects.MaterialPropagator")
            .and_then(|m| m.get("MaterialPropagator"))
            .unwrap();
        assert_eq!(propagator.kind(), "PropagatorWithMaterialESProducer");
        assert_eq!(propagator.get_double("Mass"), Ok(0.105));
        assert_eq!(propagator.get_bool("useRungeKutta"), Ok(false));

        let smoother = library
            .get("TrackingTools.TrackFitters.KFFittingSmootherESProducer")
            .and_then(|m| m.get("KFFittingSmoother"))
            .unwrap();
        assert_eq!(smoother.get_int("MinNumberOfHits"), Ok(5));
        assert_eq!(smoother.get("EstimateCut"), Some(&Value::Double(-1.0)));
    }

    #[test]
    fn test_reference_inline_table() {
        let library = TemplateLibrary::from_str(
            r#"
            [[module]]
            path = "Local.Producer"

            [[module.record]]
            binding = "tracks"
            kind = "TrackProducer"
            [module.record.fields]
            src = "candidates"
            Fitter = { ref = "KFFittingSmoother" }
            "#,
        )
        .unwrap();
        let record = library.get("Local.Producer").unwrap().get("tracks").unwrap();
        assert_eq!(record.get("Fitter"), Some(&Value::reference("KFFittingSmoother")));
        assert_eq!(record.get_ref("Fitter"), Ok("KFFittingSmoother"));
    }

    #[test]
    fn test_merge_replaces_by_path() {
        let user = TemplateLibrary::from_str(
            r#"
            [[module]]
            path = "TrackingTools.KalmanUpdators.KFUpdatorESProducer"

            [[module.record]]
            binding = "KFUpdatorESProducer"
            kind = "KFUpdatorESProducer"
            fields = { ComponentName = "MyUpdator" }

            [[module]]
            path = "Local.Extra"
            "#,
        )
        .unwrap();
        let base_len = TemplateLibrary::default().len();
        let merged = TemplateLibrary::default().merge(user);
        assert_eq!(merged.len(), base_len + 1);
        let updator = merged
            .get("TrackingTools.KalmanUpdators.KFUpdatorESProducer")
            .and_then(|m| m.get("KFUpdatorESProducer"))
            .unwrap();
        assert_eq!(updator.get_str(COMPONENT_NAME), Ok("MyUpdator"));
    }

    #[test]
    fn test_duplicate_binding_rejected() {
        let result = TemplateLibrary::from_str(
            r#"
            [[module]]
            path = "Local.Dup"

            [[module.record]]
            binding = "x"
            kind = "A"

            [[module.record]]
            binding = "x"
            kind = "B"
            "#,
        );
        assert!(matches!(
            result,
            Err(LibraryError::Registry(RegistryError::DuplicateBinding { .. }))
        ));
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            TemplateLibrary::from_str("[[module]]\npath = 3"),
            Err(LibraryError::Parse(_))
        ));
    }
}
