//! Typed views over parameter records
//!
//! Each well-known component kind has a config struct listing the options it
//! recognises, with the defaults the downstream component would apply. Names of
//! other components become [`ComponentRef`]s so they can be checked against the
//! assembled process.

mod builder;
mod fitter;
mod multirechit;
mod producer;
mod propagator;

use std::fmt;

use thiserror::Error;

use crate::record::{FieldError, ParameterRecord};

pub use builder::RecHitBuilderConfig;
pub use fitter::{FittingSmootherConfig, TrajectoryFitterConfig};
pub use multirechit::{CollectorMode, MultiRecHitCollectorConfig, MultiRecHitUpdatorConfig};
pub use producer::{DafSettings, TrackProducerConfig};
pub use propagator::{PropagationDirection, PropagatorConfig};

/// What a component does, as far as reference checking is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentRole {
    Propagator,
    /// Trajectory fitters and fitting smoothers
    TrajectoryFitter,
    TrajectorySmoother,
    Updator,
    MultiRecHitUpdator,
    Estimator,
    RecHitBuilder,
    StripCpe,
    PixelCpe,
    HitMatcher,
    MeasurementCollector,
    Producer,
    Other,
}

impl ComponentRole {
    /// Role of a record of the given plugin kind
    pub fn of(kind: &str) -> Self {
        match kind {
            "PropagatorWithMaterialESProducer" | "AnalyticalPropagatorESProducer" => {
                ComponentRole::Propagator
            }
            "KFTrajectoryFitterESProducer"
            | "DAFTrajectoryFitterESProducer"
            | "KFFittingSmootherESProducer"
            | "DAFFittingSmootherESProducer" => ComponentRole::TrajectoryFitter,
            "KFTrajectorySmootherESProducer" | "DAFTrajectorySmootherESProducer" => {
                ComponentRole::TrajectorySmoother
            }
            "KFUpdatorESProducer" => ComponentRole::Updator,
            "SiTrackerMultiRecHitUpdatorESProducer" => ComponentRole::MultiRecHitUpdator,
            "Chi2MeasurementEstimatorESProducer" | "MRHChi2MeasurementEstimatorESProducer" => {
                ComponentRole::Estimator
            }
            "TkTransientTrackingRecHitBuilderESProducer" => ComponentRole::RecHitBuilder,
            "StripCPEESProducer" => ComponentRole::StripCpe,
            "PixelCPEParmErrorESProducer" | "PixelCPEGenericESProducer" => ComponentRole::PixelCpe,
            "SiStripRecHitMatcherESProducer" => ComponentRole::HitMatcher,
            "MultiRecHitCollectorESProducer" => ComponentRole::MeasurementCollector,
            "TrackProducer" | "DAFTrackProducer" | "TrackRefitter" => ComponentRole::Producer,
            _ => ComponentRole::Other,
        }
    }
}

impl fmt::Display for ComponentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComponentRole::Propagator => "propagator",
            ComponentRole::TrajectoryFitter => "trajectory fitter",
            ComponentRole::TrajectorySmoother => "trajectory smoother",
            ComponentRole::Updator => "updator",
            ComponentRole::MultiRecHitUpdator => "multi rec-hit updator",
            ComponentRole::Estimator => "estimator",
            ComponentRole::RecHitBuilder => "rec-hit builder",
            ComponentRole::StripCpe => "strip CPE",
            ComponentRole::PixelCpe => "pixel CPE",
            ComponentRole::HitMatcher => "hit matcher",
            ComponentRole::MeasurementCollector => "measurement collector",
            ComponentRole::Producer => "producer",
            ComponentRole::Other => "component",
        };
        write!(f, "{}", name)
    }
}

/// Name of another component, as published in its `ComponentName`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentRef(String);

impl ComponentRef {
    pub fn new(name: impl Into<String>) -> Self {
        ComponentRef(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ComponentRef {
    fn from(s: &str) -> Self {
        ComponentRef(s.to_string())
    }
}

/// One outgoing reference of a component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Field holding the reference
    pub field: &'static str,
    pub target: ComponentRef,
    /// Role the referenced component must play
    pub role: ComponentRole,
}

impl Reference {
    fn new(field: &'static str, target: &ComponentRef, role: ComponentRole) -> Self {
        Reference {
            field,
            target: target.clone(),
            role,
        }
    }
}

/// Errors converting a record into its typed config
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComponentError {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("field '{field}' has invalid value {value} (expected {expected})")]
    InvalidValue {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// A config struct that can be read from a record
pub trait TypedComponent: Sized {
    fn from_record(record: &ParameterRecord) -> Result<Self, ComponentError>;

    /// References to other components, in field order
    fn references(&self) -> Vec<Reference>;
}

pub(crate) fn component_ref(record: &ParameterRecord, field: &str) -> Result<ComponentRef, FieldError> {
    record.get_ref(field).map(ComponentRef::from)
}

/// A record viewed through the config of its kind
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentConfig {
    Propagator(PropagatorConfig),
    TrajectoryFitter(TrajectoryFitterConfig),
    FittingSmoother(FittingSmootherConfig),
    RecHitBuilder(RecHitBuilderConfig),
    MultiRecHitCollector(MultiRecHitCollectorConfig),
    MultiRecHitUpdator(MultiRecHitUpdatorConfig),
    TrackProducer(TrackProducerConfig),
    /// Kind without a typed config; kept as-is
    Opaque(ParameterRecord),
}

impl ComponentConfig {
    /// Dispatch on the record's kind
    pub fn from_record(record: &ParameterRecord) -> Result<Self, ComponentError> {
        Ok(match record.kind() {
            "PropagatorWithMaterialESProducer" => {
                ComponentConfig::Propagator(PropagatorConfig::from_record(record)?)
            }
            "KFTrajectoryFitterESProducer"
            | "KFTrajectorySmootherESProducer"
            | "DAFTrajectoryFitterESProducer"
            | "DAFTrajectorySmootherESProducer" => {
                ComponentConfig::TrajectoryFitter(TrajectoryFitterConfig::from_record(record)?)
            }
            "KFFittingSmootherESProducer" | "DAFFittingSmootherESProducer" => {
                ComponentConfig::FittingSmoother(FittingSmootherConfig::from_record(record)?)
            }
            "TkTransientTrackingRecHitBuilderESProducer" => {
                ComponentConfig::RecHitBuilder(RecHitBuilderConfig::from_record(record)?)
            }
            "MultiRecHitCollectorESProducer" => ComponentConfig::MultiRecHitCollector(
                MultiRecHitCollectorConfig::from_record(record)?,
            ),
            "SiTrackerMultiRecHitUpdatorESProducer" => {
                ComponentConfig::MultiRecHitUpdator(MultiRecHitUpdatorConfig::from_record(record)?)
            }
            "TrackProducer" | "DAFTrackProducer" | "TrackRefitter" => {
                ComponentConfig::TrackProducer(TrackProducerConfig::from_record(record)?)
            }
            _ => ComponentConfig::Opaque(record.clone()),
        })
    }

    pub fn references(&self) -> Vec<Reference> {
        match self {
            ComponentConfig::Propagator(c) => c.references(),
            ComponentConfig::TrajectoryFitter(c) => c.references(),
            ComponentConfig::FittingSmoother(c) => c.references(),
            ComponentConfig::RecHitBuilder(c) => c.references(),
            ComponentConfig::MultiRecHitCollector(c) => c.references(),
            ComponentConfig::MultiRecHitUpdator(c) => c.references(),
            ComponentConfig::TrackProducer(c) => c.references(),
            ComponentConfig::Opaque(_) => Vec::new(),
        }
    }

    /// The name this component is published under, if any
    pub fn component_name(&self) -> Option<&str> {
        match self {
            ComponentConfig::Propagator(c) => Some(c.component_name.as_str()),
            ComponentConfig::TrajectoryFitter(c) => Some(c.component_name.as_str()),
            ComponentConfig::FittingSmoother(c) => Some(c.component_name.as_str()),
            ComponentConfig::RecHitBuilder(c) => Some(c.component_name.as_str()),
            ComponentConfig::MultiRecHitCollector(c) => Some(c.component_name.as_str()),
            ComponentConfig::MultiRecHitUpdator(c) => Some(c.component_name.as_str()),
            ComponentConfig::TrackProducer(_) => None,
            ComponentConfig::Opaque(record) => record.component_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::COMPONENT_NAME;

    #[test]
    fn test_role_of_kind() {
        assert_eq!(
            ComponentRole::of("KFFittingSmootherESProducer"),
            ComponentRole::TrajectoryFitter
        );
        assert_eq!(ComponentRole::of("DAFTrackProducer"), ComponentRole::Producer);
        assert_eq!(ComponentRole::of("TrackRefitter"), ComponentRole::Producer);
        assert_eq!(ComponentRole::of("XMLIdealGeometryESSource"), ComponentRole::Other);
    }

    #[test]
    fn test_unknown_kind_is_opaque() {
        let record = ParameterRecord::new("KFUpdatorESProducer").with_field(COMPONENT_NAME, "KFUpdator");
        let config = ComponentConfig::from_record(&record).unwrap();
        assert_eq!(config, ComponentConfig::Opaque(record));
        assert_eq!(config.component_name(), Some("KFUpdator"));
        assert!(config.references().is_empty());
    }

    #[test]
    fn test_refitter_reads_producer_fields() {
        let record = ParameterRecord::new("TrackRefitter")
            .with_field("src", "ctfWithMaterialTracks")
            .with_field("Fitter", "KFFittingSmoother")
            .with_field("Propagator", "PropagatorWithMaterial")
            .with_field("TTRHBuilder", "WithTrackAngle");
        match ComponentConfig::from_record(&record).unwrap() {
            ComponentConfig::TrackProducer(c) => {
                assert_eq!(c.src, "ctfWithMaterialTracks");
                assert!(c.daf.is_none());
                assert_eq!(c.references().len(), 3);
            }
            other => panic!("Expected track producer, got {:?}", other),
        }
    }

    #[test]
    fn test_field_error_propagates() {
        let record = ParameterRecord::new("KFFittingSmootherESProducer")
            .with_field(COMPONENT_NAME, "KFFittingSmoother")
            .with_field("Fitter", 7);
        let err = ComponentConfig::from_record(&record).unwrap_err();
        assert_eq!(
            err,
            ComponentError::Field(FieldError::WrongType {
                field: "Fitter".to_string(),
                expected: "reference",
                found: "int",
            })
        );
    }
}
