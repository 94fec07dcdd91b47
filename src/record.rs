//! Parameter records: the flat key/value sets that configure one component
//!
//! A [`ParameterRecord`] is a plain value. Copying it (via [`ParameterRecord::specialize`]
//! or `Clone`) yields a fully independent record, so a template and the variants
//! derived from it never alias each other.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field under which a component publishes the name downstream consumers look it up by
pub const COMPONENT_NAME: &str = "ComponentName";

/// A single field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    List(Vec<Value>),
    /// Reference to another record by its component name
    Ref {
        #[serde(rename = "ref")]
        target: String,
    },
}

impl Value {
    /// Build a reference value
    pub fn reference(target: impl Into<String>) -> Self {
        Value::Ref {
            target: target.into(),
        }
    }

    /// Human-readable name of the value's type, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Ref { .. } => "reference",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            // Debug keeps the trailing ".0" so doubles stay distinguishable from ints
            Value::Double(d) => write!(f, "{:?}", d),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Ref { target } => write!(f, "@{}", target),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// Errors raised by the typed field accessors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("missing field '{field}'")]
    Missing { field: String },

    #[error("field '{field}' is a {found}, expected {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl FieldError {
    fn wrong_type(field: &str, expected: &'static str, found: &Value) -> Self {
        FieldError::WrongType {
            field: field.to_string(),
            expected,
            found: found.type_name(),
        }
    }
}

/// A mutable, schema-less parameter set for one component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    /// Plugin type of the component this record parameterises
    kind: String,
    #[serde(default)]
    fields: BTreeMap<String, Value>,
}

impl ParameterRecord {
    /// Create an empty record for the given plugin kind
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The name this component is registered under, if it publishes one
    pub fn component_name(&self) -> Option<&str> {
        match self.fields.get(COMPONENT_NAME) {
            Some(Value::Str(name)) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Produce an independent copy to be adjusted
    pub fn specialize(&self) -> Self {
        self.clone()
    }

    /// Create or overwrite a field in place, returning the previous value
    pub fn set_field(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Consume the record and return it with one field overridden
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_field(field, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Fields in name order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn require(&self, field: &str) -> Result<&Value, FieldError> {
        self.fields.get(field).ok_or_else(|| FieldError::Missing {
            field: field.to_string(),
        })
    }

    pub fn get_str(&self, field: &str) -> Result<&str, FieldError> {
        match self.require(field)? {
            Value::Str(s) => Ok(s),
            other => Err(FieldError::wrong_type(field, "string", other)),
        }
    }

    pub fn get_bool(&self, field: &str) -> Result<bool, FieldError> {
        match self.require(field)? {
            Value::Bool(b) => Ok(*b),
            other => Err(FieldError::wrong_type(field, "bool", other)),
        }
    }

    pub fn get_int(&self, field: &str) -> Result<i64, FieldError> {
        match self.require(field)? {
            Value::Int(n) => Ok(*n),
            other => Err(FieldError::wrong_type(field, "int", other)),
        }
    }

    /// Read a double; integer values are widened
    pub fn get_double(&self, field: &str) -> Result<f64, FieldError> {
        match self.require(field)? {
            Value::Double(d) => Ok(*d),
            Value::Int(n) => Ok(*n as f64),
            other => Err(FieldError::wrong_type(field, "double", other)),
        }
    }

    /// Read a component reference, written either as a plain string or as `@Name`
    pub fn get_ref(&self, field: &str) -> Result<&str, FieldError> {
        match self.require(field)? {
            Value::Str(s) => Ok(s),
            Value::Ref { target } => Ok(target),
            other => Err(FieldError::wrong_type(field, "reference", other)),
        }
    }

    pub fn get_list(&self, field: &str) -> Result<&[Value], FieldError> {
        match self.require(field)? {
            Value::List(items) => Ok(items),
            other => Err(FieldError::wrong_type(field, "list", other)),
        }
    }
}

impl fmt::Display for ParameterRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fields.is_empty() {
            return write!(f, "{}()", self.kind);
        }
        writeln!(f, "{}(", self.kind)?;
        for (name, value) in &self.fields {
            writeln!(f, "    {} = {},", name, value)?;
        }
        write!(f, ")")
    }
}

/// Turn a `Missing` error into `None`, keeping type errors
pub fn optional<T>(result: Result<T, FieldError>) -> Result<Option<T>, FieldError> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(FieldError::Missing { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}
