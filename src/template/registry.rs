//! Template modules and the catalog they are registered in

use std::collections::HashMap;

use thiserror::Error;

use crate::record::ParameterRecord;
use crate::suggest::{find_similar, format_suggestions};

/// Errors that can occur during template registration and resolution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Name not bound in the namespace
    #[error("unresolved name '{name}'{}", format_suggestions(.suggestions))]
    Unresolved {
        name: String,
        suggestions: Vec<String>,
    },

    /// No template module registered under this path
    #[error("template module not found: {path}{}", format_suggestions(.suggestions))]
    ModuleNotFound {
        path: String,
        suggestions: Vec<String>,
    },

    /// Two modules registered under the same path
    #[error("duplicate template module: {path}")]
    DuplicateModule { path: String },

    /// Two records bound to the same name inside one module
    #[error("duplicate binding '{binding}' in template module {module}")]
    DuplicateBinding { module: String, binding: String },

    /// Explicit import of a name the module does not define
    #[error("'{name}' is not defined by template module {module}{}", format_suggestions(.suggestions))]
    NotExported {
        module: String,
        name: String,
        suggestions: Vec<String>,
    },

    /// Import would rebind an existing name and shadowing is denied
    #[error("'{name}' from {module} would shadow the existing binding ({previous})")]
    Shadowed {
        name: String,
        module: String,
        previous: String,
    },
}

/// A named collection of template records, imported as a unit
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateModule {
    path: String,
    records: Vec<(String, ParameterRecord)>,
}

impl TemplateModule {
    /// Create an empty module under a dotted path such as
    /// `TrackingTools.MaterialEffects.MaterialPropagator`
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Bind a record inside this module
    pub fn add_record(
        &mut self,
        binding: impl Into<String>,
        record: ParameterRecord,
    ) -> Result<(), RegistryError> {
        let binding = binding.into();
        if self.get(&binding).is_some() {
            return Err(RegistryError::DuplicateBinding {
                module: self.path.clone(),
                binding,
            });
        }
        self.records.push((binding, record));
        Ok(())
    }

    /// Builder form of [`add_record`](Self::add_record); a repeated binding replaces the earlier one
    pub fn with_record(mut self, binding: impl Into<String>, record: ParameterRecord) -> Self {
        let binding = binding.into();
        match self.records.iter_mut().find(|(name, _)| *name == binding) {
            Some(slot) => slot.1 = record,
            None => self.records.push((binding, record)),
        }
        self
    }

    pub fn get(&self, binding: &str) -> Option<&ParameterRecord> {
        self.records
            .iter()
            .find(|(name, _)| name == binding)
            .map(|(_, record)| record)
    }

    /// Lookup that reports a `NotExported` error with suggestions
    pub fn export(&self, binding: &str) -> Result<&ParameterRecord, RegistryError> {
        self.get(binding)
            .ok_or_else(|| RegistryError::NotExported {
                module: self.path.clone(),
                name: binding.to_string(),
                suggestions: find_similar(self.binding_names(), binding, 3),
            })
    }

    /// Records in definition order
    pub fn records(&self) -> impl Iterator<Item = (&str, &ParameterRecord)> {
        self.records.iter().map(|(name, record)| (name.as_str(), record))
    }

    pub fn binding_names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Catalog of template modules available for import
#[derive(Debug, Default, Clone)]
pub struct ModuleCatalog {
    modules: HashMap<String, TemplateModule>,
}

impl ModuleCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module under its path
    pub fn register_module(&mut self, module: TemplateModule) -> Result<(), RegistryError> {
        if self.modules.contains_key(module.path()) {
            return Err(RegistryError::DuplicateModule {
                path: module.path().to_string(),
            });
        }
        tracing::debug!(module = module.path(), records = module.len(), "registered template module");
        self.modules.insert(module.path().to_string(), module);
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&TemplateModule> {
        self.modules.get(path)
    }

    /// Lookup that reports a `ModuleNotFound` error with suggestions
    pub fn module(&self, path: &str) -> Result<&TemplateModule, RegistryError> {
        self.modules
            .get(path)
            .ok_or_else(|| RegistryError::ModuleNotFound {
                path: path.to_string(),
                suggestions: find_similar(self.modules.keys().map(String::as_str), path, 4),
            })
    }

    pub fn contains(&self, path: &str) -> bool {
        self.modules.contains_key(path)
    }

    /// Module paths in sorted order
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Modules in path order
    pub fn modules(&self) -> impl Iterator<Item = &TemplateModule> {
        self.paths().into_iter().filter_map(|p| self.modules.get(p))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::COMPONENT_NAME;

    fn updator_module() -> TemplateModule {
        TemplateModule::new("TrackingTools.KalmanUpdators.KFUpdatorESProducer").with_record(
            "KFUpdator",
            ParameterRecord::new("KFUpdatorESProducer").with_field(COMPONENT_NAME, "KFUpdator"),
        )
    }

    #[test]
    fn test_register_and_get() {
        let mut catalog = ModuleCatalog::new();
        catalog.register_module(updator_module()).expect("Should register");
        assert!(catalog.contains("TrackingTools.KalmanUpdators.KFUpdatorESProducer"));
        let module = catalog
            .module("TrackingTools.KalmanUpdators.KFUpdatorESProducer")
            .expect("Should find module");
        assert_eq!(module.len(), 1);
        assert!(module.get("KFUpdator").is_some());
    }

    #[test]
    fn test_duplicate_module_error() {
        let mut catalog = ModuleCatalog::new();
        catalog.register_module(updator_module()).expect("First register should succeed");
        let result = catalog.register_module(updator_module());
        assert!(matches!(result, Err(RegistryError::DuplicateModule { .. })));
    }

    #[test]
    fn test_duplicate_binding_error() {
        let mut module = updator_module();
        let result = module.add_record("KFUpdator", ParameterRecord::new("KFUpdatorESProducer"));
        assert!(matches!(result, Err(RegistryError::DuplicateBinding { .. })));
    }

    #[test]
    fn test_module_not_found_suggests() {
        let mut catalog = ModuleCatalog::new();
        catalog.register_module(updator_module()).unwrap();
        let err = catalog
            .module("TrackingTools.KalmanUpdators.KFUpdatorESProduce")
            .unwrap_err();
        match err {
            RegistryError::ModuleNotFound { suggestions, .. } => {
                assert_eq!(
                    suggestions,
                    vec!["TrackingTools.KalmanUpdators.KFUpdatorESProducer".to_string()]
                );
            }
            other => panic!("Expected ModuleNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_not_exported_message() {
        let module = updator_module();
        let err = module.export("KFUpdater").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'KFUpdater' is not defined by template module \
             TrackingTools.KalmanUpdators.KFUpdatorESProducer (did you mean: KFUpdator?)"
        );
    }

    #[test]
    fn test_paths_sorted() {
        let mut catalog = ModuleCatalog::new();
        catalog.register_module(TemplateModule::new("b.module")).unwrap();
        catalog.register_module(TemplateModule::new("a.module")).unwrap();
        assert_eq!(catalog.paths(), vec!["a.module", "b.module"]);
    }
}
