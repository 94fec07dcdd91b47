//! The set of bindings visible while one process is being assembled

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::process::{Binding, Origin, Process};
use crate::record::{ParameterRecord, Value};
use crate::suggest::find_similar;

use super::registry::{RegistryError, TemplateModule};

/// What happens when an import rebinds a name that is already bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowPolicy {
    /// Rebind silently
    Allow,
    /// Rebind, log a warning and keep a record of the shadowing
    #[default]
    Warn,
    /// Refuse the import
    Deny,
}

#[derive(Debug, Error)]
#[error("unknown shadowing policy '{0}' (expected allow, warn or deny)")]
pub struct UnknownShadowPolicy(String);

impl FromStr for ShadowPolicy {
    type Err = UnknownShadowPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(ShadowPolicy::Allow),
            "warn" => Ok(ShadowPolicy::Warn),
            "deny" => Ok(ShadowPolicy::Deny),
            other => Err(UnknownShadowPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for ShadowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShadowPolicy::Allow => write!(f, "allow"),
            ShadowPolicy::Warn => write!(f, "warn"),
            ShadowPolicy::Deny => write!(f, "deny"),
        }
    }
}

/// An import that replaced an existing binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shadowing {
    pub name: String,
    pub previous: Origin,
    pub replacement: Origin,
}

impl fmt::Display for Shadowing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' ({}) is shadowed by the binding {}",
            self.name, self.previous, self.replacement
        )
    }
}

/// Ordered name -> record bindings for one process
#[derive(Debug, Default)]
pub struct Namespace {
    policy: ShadowPolicy,
    bindings: Vec<Binding>,
    index: HashMap<String, usize>,
    shadowed: Vec<Shadowing>,
}

impl Namespace {
    pub fn new(policy: ShadowPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> ShadowPolicy {
        self.policy
    }

    /// Bind every record of `module`
    pub fn import_all(&mut self, module: &TemplateModule) -> Result<Vec<Shadowing>, RegistryError> {
        let names: Vec<&str> = module.binding_names().collect();
        self.import_names(module, &names)
    }

    /// Bind only the named records of `module`
    pub fn import_only(
        &mut self,
        module: &TemplateModule,
        names: &[&str],
    ) -> Result<Vec<Shadowing>, RegistryError> {
        for name in names {
            module.export(name)?;
        }
        self.import_names(module, names)
    }

    fn import_names(
        &mut self,
        module: &TemplateModule,
        names: &[&str],
    ) -> Result<Vec<Shadowing>, RegistryError> {
        let origin = Origin::Imported {
            module: module.path().to_string(),
        };

        // Deny is all-or-nothing: check every name before binding any
        if self.policy == ShadowPolicy::Deny {
            for name in names {
                if let Some(existing) = self.rebinding(name, &origin) {
                    return Err(RegistryError::Shadowed {
                        name: name.to_string(),
                        module: module.path().to_string(),
                        previous: existing.origin.to_string(),
                    });
                }
            }
        }

        let mut shadowed = Vec::new();
        for name in names {
            let record = module.export(name)?;
            if let Some(shadowing) = self.bind(name, origin.clone(), record.clone()) {
                shadowed.push(shadowing);
            }
        }
        tracing::debug!(module = module.path(), bindings = names.len(), "imported template module");
        Ok(shadowed)
    }

    /// The existing binding an import of `name` from `origin` would replace.
    /// Re-importing from the same module keeps the current binding.
    fn rebinding(&self, name: &str, origin: &Origin) -> Option<&Binding> {
        self.index
            .get(name)
            .map(|&i| &self.bindings[i])
            .filter(|existing| existing.origin != *origin)
    }

    fn bind(&mut self, name: &str, origin: Origin, record: ParameterRecord) -> Option<Shadowing> {
        let Some(&i) = self.index.get(name) else {
            self.index.insert(name.to_string(), self.bindings.len());
            self.bindings.push(Binding {
                name: name.to_string(),
                origin,
                record,
            });
            return None;
        };

        if self.bindings[i].origin == origin {
            tracing::debug!(name, "already imported from the same module");
            return None;
        }

        let previous = std::mem::replace(&mut self.bindings[i].origin, origin.clone());
        self.bindings[i].record = record;

        let shadowing = Shadowing {
            name: name.to_string(),
            previous,
            replacement: origin,
        };
        match self.policy {
            ShadowPolicy::Allow => None,
            ShadowPolicy::Warn | ShadowPolicy::Deny => {
                tracing::warn!("{}", shadowing);
                self.shadowed.push(shadowing.clone());
                Some(shadowing)
            }
        }
    }

    /// The record bound to `name`
    pub fn resolve(&self, name: &str) -> Result<&ParameterRecord, RegistryError> {
        self.index
            .get(name)
            .map(|&i| &self.bindings[i].record)
            .ok_or_else(|| self.unresolved(name))
    }

    fn unresolved(&self, name: &str) -> RegistryError {
        RegistryError::Unresolved {
            name: name.to_string(),
            suggestions: find_similar(self.names(), name, 3),
        }
    }

    /// Bind `target` to an independent copy of the record bound to `source`
    pub fn specialize(&mut self, source: &str, target: &str) -> Result<&mut ParameterRecord, RegistryError> {
        let record = self.resolve(source)?.specialize();
        let origin = Origin::Specialized {
            template: source.to_string(),
        };

        let i = match self.index.get(target) {
            Some(&i) => {
                tracing::debug!(binding = target, source, "rebinding existing name to a copy");
                self.bindings[i] = Binding {
                    name: target.to_string(),
                    origin,
                    record,
                };
                i
            }
            None => {
                self.index.insert(target.to_string(), self.bindings.len());
                self.bindings.push(Binding {
                    name: target.to_string(),
                    origin,
                    record,
                });
                self.bindings.len() - 1
            }
        };
        tracing::debug!(binding = target, source, "specialized template");
        Ok(&mut self.bindings[i].record)
    }

    /// Create or overwrite `field` on the record bound to `target`
    pub fn set_field(
        &mut self,
        target: &str,
        field: &str,
        value: Value,
    ) -> Result<Option<Value>, RegistryError> {
        let Some(&i) = self.index.get(target) else {
            return Err(self.unresolved(target));
        };
        tracing::debug!(binding = target, field, value = %value, "set field");
        Ok(self.bindings[i].record.set_field(field, value))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Bound names in binding order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.name.as_str())
    }

    /// Every shadowing recorded so far
    pub fn shadowed(&self) -> &[Shadowing] {
        &self.shadowed
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Finish assembly, handing the bindings over as a process
    pub fn into_process(self, name: impl Into<String>) -> (Process, Vec<Shadowing>) {
        (Process::new(name, self.bindings), self.shadowed)
    }
}
