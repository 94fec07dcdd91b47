use std::fmt;
use std::str::FromStr;

use crate::record::{optional, ParameterRecord, COMPONENT_NAME};

use super::{ComponentError, Reference, TypedComponent};

/// Direction a propagator extrapolates in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropagationDirection {
    #[default]
    AlongMomentum,
    OppositeToMomentum,
    AnyDirection,
}

impl FromStr for PropagationDirection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alongMomentum" => Ok(PropagationDirection::AlongMomentum),
            "oppositeToMomentum" => Ok(PropagationDirection::OppositeToMomentum),
            "anyDirection" => Ok(PropagationDirection::AnyDirection),
            _ => Err(()),
        }
    }
}

impl fmt::Display for PropagationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropagationDirection::AlongMomentum => write!(f, "alongMomentum"),
            PropagationDirection::OppositeToMomentum => write!(f, "oppositeToMomentum"),
            PropagationDirection::AnyDirection => write!(f, "anyDirection"),
        }
    }
}

/// `PropagatorWithMaterialESProducer`
#[derive(Debug, Clone, PartialEq)]
pub struct PropagatorConfig {
    pub component_name: String,
    /// Particle mass hypothesis in GeV
    pub mass: f64,
    pub max_dphi: f64,
    pub direction: PropagationDirection,
    pub use_runge_kutta: bool,
}

impl Default for PropagatorConfig {
    fn default() -> Self {
        Self {
            component_name: String::new(),
            mass: 0.105,
            max_dphi: 1.6,
            direction: PropagationDirection::default(),
            use_runge_kutta: false,
        }
    }
}

impl TypedComponent for PropagatorConfig {
    fn from_record(record: &ParameterRecord) -> Result<Self, ComponentError> {
        let defaults = Self::default();
        let direction = match optional(record.get_str("PropagationDirection"))? {
            Some(s) => s.parse().map_err(|_| ComponentError::InvalidValue {
                field: "PropagationDirection",
                value: format!("{:?}", s),
                expected: "alongMomentum, oppositeToMomentum or anyDirection",
            })?,
            None => defaults.direction,
        };
        let mass = optional(record.get_double("Mass"))?.unwrap_or(defaults.mass);
        if mass <= 0.0 {
            return Err(ComponentError::InvalidValue {
                field: "Mass",
                value: mass.to_string(),
                expected: "a positive mass",
            });
        }

        Ok(PropagatorConfig {
            component_name: record.get_str(COMPONENT_NAME)?.to_string(),
            mass,
            max_dphi: optional(record.get_double("MaxDPhi"))?.unwrap_or(defaults.max_dphi),
            direction,
            use_runge_kutta: optional(record.get_bool("useRungeKutta"))?
                .unwrap_or(defaults.use_runge_kutta),
        })
    }

    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }
}
