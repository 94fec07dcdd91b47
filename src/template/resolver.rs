//! Process assembly - runs a parsed script against the template catalog

use thiserror::Error;

use crate::error::report;
use crate::parser::ast::{ImportItems, Script, Span, Statement};
use crate::process::Process;

use super::namespace::{Namespace, ShadowPolicy, Shadowing};
use super::registry::{ModuleCatalog, RegistryError};

/// Process name used when a script has no `process` header
pub const DEFAULT_PROCESS_NAME: &str = "process";

/// A registry failure tied to the script statement that caused it
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error}")]
pub struct AssemblyError {
    #[source]
    pub error: RegistryError,
    pub span: Span,
}

impl AssemblyError {
    fn at(span: &Span) -> impl FnOnce(RegistryError) -> Self + '_ {
        move |error| Self {
            error,
            span: span.clone(),
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let message = self.error.to_string();
        report(source, filename, &self.span, &message, &message)
    }
}

/// Result of running a script
#[derive(Debug, Clone)]
pub struct AssemblyOutcome {
    pub process: Process,
    /// Imports that replaced an existing binding
    pub shadowed: Vec<Shadowing>,
}

/// Run every statement of `script` in order against a fresh namespace
pub fn assemble(
    script: &Script,
    catalog: &ModuleCatalog,
    policy: ShadowPolicy,
) -> Result<AssemblyOutcome, AssemblyError> {
    let name = script
        .process_name
        .as_ref()
        .map(|n| n.node.as_str())
        .unwrap_or(DEFAULT_PROCESS_NAME);
    let mut ns = Namespace::new(policy);

    for stmt in &script.statements {
        let at = AssemblyError::at(&stmt.span);
        match &stmt.node {
            Statement::Import(decl) => {
                let path = decl.module.node.to_string();
                let module = catalog
                    .module(&path)
                    .map_err(AssemblyError::at(&decl.module.span))?;
                match &decl.items {
                    ImportItems::All => ns.import_all(module).map_err(at)?,
                    ImportItems::Only(names) => {
                        let names: Vec<&str> = names.iter().map(|n| n.node.as_str()).collect();
                        ns.import_only(module, &names).map_err(at)?
                    }
                };
            }
            Statement::Copy(decl) => {
                let record = ns
                    .specialize(decl.source.node.as_str(), decl.target.node.as_str())
                    .map_err(AssemblyError::at(&decl.source.span))?;
                for ov in &decl.overrides {
                    record.set_field(ov.field.node.as_str(), ov.value.node.clone());
                }
            }
            Statement::Assign(decl) => {
                ns.set_field(
                    decl.target.node.as_str(),
                    decl.assignment.field.node.as_str(),
                    decl.assignment.value.node.clone(),
                )
                .map_err(AssemblyError::at(&decl.target.span))?;
            }
        }
    }

    let (process, shadowed) = ns.into_process(name);
    tracing::info!(
        process = process.name(),
        bindings = process.len(),
        shadowed = shadowed.len(),
        "assembled process"
    );
    Ok(AssemblyOutcome { process, shadowed })
}

/// Convenience for resolving a single name after assembly
pub fn resolve<'a>(
    process: &'a Process,
    name: &str,
) -> Result<&'a crate::record::ParameterRecord, RegistryError> {
    process.record(name).ok_or_else(|| RegistryError::Unresolved {
        name: name.to_string(),
        suggestions: crate::suggest::find_similar(process.bindings().map(|b| b.name.as_str()), name, 3),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::record::{ParameterRecord, Value, COMPONENT_NAME};
    use crate::template::TemplateModule;

    fn catalog() -> ModuleCatalog {
        let mut catalog = ModuleCatalog::new();
        catalog
            .register_module(TemplateModule::new("TrackingTools.MaterialEffects.MaterialPropagator").with_record(
                "MaterialPropagator",
                ParameterRecord::new("PropagatorWithMaterialESProducer")
                    .with_field(COMPONENT_NAME, "PropagatorWithMaterial")
                    .with_field("useRungeKutta", false),
            ))
            .unwrap();
        catalog
    }

    fn run(source: &str) -> Result<AssemblyOutcome, AssemblyError> {
        let script = parse(source).expect("Should parse");
        assemble(&script, &catalog(), ShadowPolicy::Warn)
    }

    #[test]
    fn test_default_process_name() {
        let outcome = run("").unwrap();
        assert_eq!(outcome.process.name(), DEFAULT_PROCESS_NAME);
        assert!(outcome.process.is_empty());
    }

    #[test]
    fn test_copy_with_overrides() {
        let outcome = run(
            r#"
            process rk
            import TrackingTools.MaterialEffects.MaterialPropagator
            RK = copy(MaterialPropagator) { ComponentName = "RK", useRungeKutta = true }
            "#,
        )
        .unwrap();
        let rk = outcome.process.record("RK").unwrap();
        assert_eq!(rk.component_name(), Some("RK"));
        assert_eq!(rk.get_bool("useRungeKutta"), Ok(true));
        let template = outcome.process.record("MaterialPropagator").unwrap();
        assert_eq!(template.get_bool("useRungeKutta"), Ok(false));
    }

    #[test]
    fn test_copy_before_import_fails_with_span() {
        let source = "RK = copy(MaterialPropagator)";
        let err = run(source).unwrap_err();
        assert!(matches!(err.error, RegistryError::Unresolved { .. }));
        assert_eq!(&source[err.span.clone()], "MaterialPropagator");
    }

    #[test]
    fn test_unknown_module_span() {
        let source = "import TrackingTools.Nope";
        let err = run(source).unwrap_err();
        assert!(matches!(err.error, RegistryError::ModuleNotFound { .. }));
        assert_eq!(&source[err.span.clone()], "TrackingTools.Nope");
    }

    #[test]
    fn test_assign_appends_new_field() {
        let outcome = run(
            "import TrackingTools.MaterialEffects.MaterialPropagator\nMaterialPropagator.Mass = 0.139",
        )
        .unwrap();
        assert_eq!(
            outcome.process.record("MaterialPropagator").unwrap().get("Mass"),
            Some(&Value::Double(0.139))
        );
    }

    #[test]
    fn test_resolve_after_assembly() {
        let outcome = run("import TrackingTools.MaterialEffects.MaterialPropagator").unwrap();
        assert!(resolve(&outcome.process, "MaterialPropagator").is_ok());
        assert!(matches!(
            resolve(&outcome.process, "MaterialPropagatorr"),
            Err(RegistryError::Unresolved { .. })
        ));
    }

    #[test]
    fn test_error_format_points_at_statement() {
        let source = "x.src = \"a\"";
        let err = run(source).unwrap_err();
        let rendered = err.format(source, "bad.tcfg");
        assert!(rendered.contains("unresolved name 'x'"));
    }
}
