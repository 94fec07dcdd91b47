use crate::record::{optional, ParameterRecord, COMPONENT_NAME};

use super::{component_ref, ComponentError, ComponentRef, ComponentRole, Reference, TypedComponent};

/// Kalman and DAF trajectory fitters and smoothers
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryFitterConfig {
    pub component_name: String,
    pub propagator: ComponentRef,
    pub updator: ComponentRef,
    pub estimator: ComponentRef,
    pub min_hits: i64,
    /// Only set for smoothers
    pub error_rescaling: Option<f64>,
}

pub const DEFAULT_MIN_HITS: i64 = 3;
pub const DEFAULT_ERROR_RESCALING: f64 = 100.0;

impl TypedComponent for TrajectoryFitterConfig {
    fn from_record(record: &ParameterRecord) -> Result<Self, ComponentError> {
        let is_smoother = record.kind().ends_with("SmootherESProducer");
        let error_rescaling = if is_smoother {
            Some(optional(record.get_double("errorRescaling"))?.unwrap_or(DEFAULT_ERROR_RESCALING))
        } else {
            None
        };

        Ok(TrajectoryFitterConfig {
            component_name: record.get_str(COMPONENT_NAME)?.to_string(),
            propagator: component_ref(record, "Propagator")?,
            updator: component_ref(record, "Updator")?,
            estimator: component_ref(record, "Estimator")?,
            min_hits: optional(record.get_int("minHits"))?.unwrap_or(DEFAULT_MIN_HITS),
            error_rescaling,
        })
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::new("Propagator", &self.propagator, ComponentRole::Propagator),
            Reference::new("Updator", &self.updator, ComponentRole::Updator),
            Reference::new("Estimator", &self.estimator, ComponentRole::Estimator),
        ]
    }
}

/// A fitter followed by a smoother, with outlier rejection
#[derive(Debug, Clone, PartialEq)]
pub struct FittingSmootherConfig {
    pub component_name: String,
    pub fitter: ComponentRef,
    pub smoother: ComponentRef,
    /// Negative disables outlier rejection
    pub estimate_cut: f64,
    pub min_number_of_hits: i64,
}

impl TypedComponent for FittingSmootherConfig {
    fn from_record(record: &ParameterRecord) -> Result<Self, ComponentError> {
        Ok(FittingSmootherConfig {
            component_name: record.get_str(COMPONENT_NAME)?.to_string(),
            fitter: component_ref(record, "Fitter")?,
            smoother: component_ref(record, "Smoother")?,
            estimate_cut: optional(record.get_double("EstimateCut"))?.unwrap_or(-1.0),
            min_number_of_hits: optional(record.get_int("MinNumberOfHits"))?.unwrap_or(5),
        })
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::new("Fitter", &self.fitter, ComponentRole::TrajectoryFitter),
            Reference::new("Smoother", &self.smoother, ComponentRole::TrajectorySmoother),
        ]
    }
}
