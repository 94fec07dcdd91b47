use crate::record::{optional, ParameterRecord};

use super::{component_ref, ComponentError, ComponentRef, ComponentRole, Reference, TypedComponent};

/// Extra wiring of the deterministic annealing track producer
#[derive(Debug, Clone, PartialEq)]
pub struct DafSettings {
    pub updator: ComponentRef,
    pub measurement_collector: ComponentRef,
}

/// `TrackProducer`, `DAFTrackProducer` and `TrackRefitter`
///
/// Producers are event-data modules: they do not publish a `ComponentName` and
/// are known by their binding name.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackProducerConfig {
    /// Label of the track-candidate collection to fit
    pub src: String,
    /// Instance label of the input collection
    pub producer: String,
    pub fitter: ComponentRef,
    pub propagator: ComponentRef,
    pub builder: ComponentRef,
    pub trajectory_in_event: bool,
    pub daf: Option<DafSettings>,
}

impl TypedComponent for TrackProducerConfig {
    fn from_record(record: &ParameterRecord) -> Result<Self, ComponentError> {
        let src = record.get_str("src")?;
        if src.is_empty() {
            return Err(ComponentError::InvalidValue {
                field: "src",
                value: "\"\"".to_string(),
                expected: "a collection label",
            });
        }

        let daf = if record.kind() == "DAFTrackProducer" {
            Some(DafSettings {
                updator: component_ref(record, "UpdatorName")?,
                measurement_collector: component_ref(record, "MeasurementCollector")?,
            })
        } else {
            None
        };

        Ok(TrackProducerConfig {
            src: src.to_string(),
            producer: optional(record.get_str("producer"))?
                .unwrap_or_default()
                .to_string(),
            fitter: component_ref(record, "Fitter")?,
            propagator: component_ref(record, "Propagator")?,
            builder: component_ref(record, "TTRHBuilder")?,
            trajectory_in_event: optional(record.get_bool("TrajectoryInEvent"))?.unwrap_or(false),
            daf,
        })
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = vec![
            Reference::new("Fitter", &self.fitter, ComponentRole::TrajectoryFitter),
            Reference::new("Propagator", &self.propagator, ComponentRole::Propagator),
            Reference::new("TTRHBuilder", &self.builder, ComponentRole::RecHitBuilder),
        ];
        if let Some(daf) = &self.daf {
            refs.push(Reference::new(
                "UpdatorName",
                &daf.updator,
                ComponentRole::MultiRecHitUpdator,
            ));
            refs.push(Reference::new(
                "MeasurementCollector",
                &daf.measurement_collector,
                ComponentRole::MeasurementCollector,
            ));
        }
        refs
    }
}
