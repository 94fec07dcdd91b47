use std::str::FromStr;

use crate::record::{optional, ParameterRecord, Value, COMPONENT_NAME};

use super::{component_ref, ComponentError, ComponentRef, ComponentRole, Reference, TypedComponent};

/// How a collector groups compatible hits on a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorMode {
    Grouped,
    Simple,
}

impl FromStr for CollectorMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Grouped" => Ok(CollectorMode::Grouped),
            "Simple" => Ok(CollectorMode::Simple),
            _ => Err(()),
        }
    }
}

/// `MultiRecHitCollectorESProducer`
#[derive(Debug, Clone, PartialEq)]
pub struct MultiRecHitCollectorConfig {
    pub component_name: String,
    pub mode: CollectorMode,
    pub propagator_along: ComponentRef,
    /// Only the grouped collector propagates backwards
    pub propagator_opposite: Option<ComponentRef>,
    pub updator: ComponentRef,
}

impl TypedComponent for MultiRecHitCollectorConfig {
    fn from_record(record: &ParameterRecord) -> Result<Self, ComponentError> {
        let mode = record.get_str("Mode")?;
        let mode = mode.parse().map_err(|_| ComponentError::InvalidValue {
            field: "Mode",
            value: format!("{:?}", mode),
            expected: "Grouped or Simple",
        })?;
        let propagator_opposite = match mode {
            CollectorMode::Grouped => Some(component_ref(record, "propagatorOppositeName")?),
            CollectorMode::Simple => {
                optional(component_ref(record, "propagatorOppositeName"))?
            }
        };

        Ok(MultiRecHitCollectorConfig {
            component_name: record.get_str(COMPONENT_NAME)?.to_string(),
            mode,
            propagator_along: component_ref(record, "propagatorAlongName")?,
            propagator_opposite,
            updator: component_ref(record, "MultiRecHitUpdator")?,
        })
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = vec![Reference::new(
            "propagatorAlongName",
            &self.propagator_along,
            ComponentRole::Propagator,
        )];
        if let Some(opposite) = &self.propagator_opposite {
            refs.push(Reference::new(
                "propagatorOppositeName",
                opposite,
                ComponentRole::Propagator,
            ));
        }
        refs.push(Reference::new(
            "MultiRecHitUpdator",
            &self.updator,
            ComponentRole::MultiRecHitUpdator,
        ));
        refs
    }
}

/// `SiTrackerMultiRecHitUpdatorESProducer`
#[derive(Debug, Clone, PartialEq)]
pub struct MultiRecHitUpdatorConfig {
    pub component_name: String,
    pub builder: ComponentRef,
    pub hit_propagator: ComponentRef,
    /// Annealing temperatures, one per iteration
    pub annealing_program: Vec<f64>,
}

impl TypedComponent for MultiRecHitUpdatorConfig {
    fn from_record(record: &ParameterRecord) -> Result<Self, ComponentError> {
        let annealing_program = match optional(record.get_list("AnnealingProgram"))? {
            Some(items) => items
                .iter()
                .map(|item| match item {
                    Value::Double(d) if *d > 0.0 => Ok(*d),
                    Value::Int(n) if *n > 0 => Ok(*n as f64),
                    other => Err(ComponentError::InvalidValue {
                        field: "AnnealingProgram",
                        value: other.to_string(),
                        expected: "positive temperatures",
                    }),
                })
                .collect::<Result<_, _>>()?,
            None => Vec::new(),
        };

        Ok(MultiRecHitUpdatorConfig {
            component_name: record.get_str(COMPONENT_NAME)?.to_string(),
            builder: component_ref(record, "TTRHBuilder")?,
            hit_propagator: component_ref(record, "HitPropagator")?,
            annealing_program,
        })
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::new("TTRHBuilder", &self.builder, ComponentRole::RecHitBuilder),
            Reference::new("HitPropagator", &self.hit_propagator, ComponentRole::Propagator),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldError;

    fn grouped() -> ParameterRecord {
        ParameterRecord::new("MultiRecHitCollectorESProducer")
            .with_field(COMPONENT_NAME, "groupedMultiRecHitCollector")
            .with_field("Mode", "Grouped")
            .with_field("propagatorAlongName", "RungeKuttaTrackerPropagator")
            .with_field("propagatorOppositeName", "OppositeRungeKuttaTrackerPropagator")
            .with_field("MultiRecHitUpdator", "SiTrackerMultiRecHitUpdator")
    }

    #[test]
    fn test_grouped_collector_references() {
        let config = MultiRecHitCollectorConfig::from_record(&grouped()).unwrap();
        let fields: Vec<_> = config.references().iter().map(|r| r.field).collect();
        assert_eq!(
            fields,
            vec!["propagatorAlongName", "propagatorOppositeName", "MultiRecHitUpdator"]
        );
    }

    #[test]
    fn test_grouped_collector_needs_opposite_propagator() {
        let mut record = ParameterRecord::new("MultiRecHitCollectorESProducer");
        for (field, value) in grouped().fields() {
            if field != "propagatorOppositeName" {
                record.set_field(field, value.clone());
            }
        }
        assert_eq!(
            MultiRecHitCollectorConfig::from_record(&record),
            Err(ComponentError::Field(FieldError::Missing {
                field: "propagatorOppositeName".to_string(),
            }))
        );

        record.set_field("Mode", "Simple");
        let config = MultiRecHitCollectorConfig::from_record(&record).unwrap();
        assert_eq!(config.propagator_opposite, None);
        assert_eq!(config.references().len(), 2);
    }

    #[test]
    fn test_unknown_mode() {
        let record = grouped().with_field("Mode", "Clustered");
        assert!(matches!(
            MultiRecHitCollectorConfig::from_record(&record),
            Err(ComponentError::InvalidValue { field: "Mode", .. })
        ));
    }

    #[test]
    fn test_updator_annealing_program() {
        let record = ParameterRecord::new("SiTrackerMultiRecHitUpdatorESProducer")
            .with_field(COMPONENT_NAME, "SiTrackerMultiRecHitUpdator")
            .with_field("TTRHBuilder", "WithTrackAngle")
            .with_field("HitPropagator", "trackerHitPropagator")
            .with_field(
                "AnnealingProgram",
                vec![Value::Double(80.0), Value::Int(9), Value::Double(1.0)],
            );
        let config = MultiRecHitUpdatorConfig::from_record(&record).unwrap();
        assert_eq!(config.annealing_program, vec![80.0, 9.0, 1.0]);
        assert_eq!(config.references()[1].target.as_str(), "trackerHitPropagator");

        let record = record.with_field("AnnealingProgram", vec![Value::Double(0.0)]);
        assert!(matches!(
            MultiRecHitUpdatorConfig::from_record(&record),
            Err(ComponentError::InvalidValue {
                field: "AnnealingProgram",
                ..
            })
        ));
    }
}
