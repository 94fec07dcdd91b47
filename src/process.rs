//! The assembled process handed to the downstream wiring step

use std::fmt;

use serde::Serialize;

use crate::record::ParameterRecord;

/// Where a binding's record came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum Origin {
    /// Bound by importing a template module
    Imported { module: String },
    /// Produced by copying another binding
    Specialized { template: String },
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Imported { module } => write!(f, "imported from {}", module),
            Origin::Specialized { template } => write!(f, "copy of {}", template),
        }
    }
}

/// A named record in a process
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub name: String,
    #[serde(flatten)]
    pub origin: Origin,
    pub record: ParameterRecord,
}

/// A fully assembled, named set of records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Process {
    name: String,
    #[serde(rename = "binding")]
    bindings: Vec<Binding>,
}

impl Process {
    pub fn new(name: impl Into<String>, bindings: Vec<Binding>) -> Self {
        Self {
            name: name.into(),
            bindings,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a binding by its local name
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.name == name)
    }

    /// Shorthand for the record bound to `name`
    pub fn record(&self, name: &str) -> Option<&ParameterRecord> {
        self.get(name).map(|b| &b.record)
    }

    /// First binding whose record publishes `component_name`
    pub fn component(&self, component_name: &str) -> Option<&Binding> {
        self.bindings
            .iter()
            .find(|b| b.record.component_name() == Some(component_name))
    }

    /// Bindings in the order they were first bound
    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    /// Bindings produced by copying a template
    pub fn specialized(&self) -> impl Iterator<Item = &Binding> {
        self.bindings
            .iter()
            .filter(|b| matches!(b.origin, Origin::Specialized { .. }))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Serialize the process as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "process {}", self.name)?;
        for binding in &self.bindings {
            writeln!(f)?;
            writeln!(f, "// {}", binding.origin)?;
            writeln!(f, "{} = {}", binding.name, binding.record)?;
        }
        Ok(())
    }
}
