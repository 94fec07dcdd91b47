//! Consistency checks over an assembled process
//!
//! Runs after assembly to catch what the downstream framework would only
//! report at run time: fields of the wrong type, references to components
//! the process never defines, components published twice under one name and
//! inconsistent hit thresholds.

use std::collections::BTreeMap;
use std::fmt;

use crate::components::{ComponentConfig, ComponentRole};
use crate::process::Process;
use crate::suggest::{find_similar, format_suggestions};
use crate::template::Shadowing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Category of consistency defect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Shadowing,
    FieldType,
    DanglingReference,
    DuplicateComponent,
    Threshold,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Shadowing => write!(f, "shadowing"),
            DiagnosticCategory::FieldType => write!(f, "field-type"),
            DiagnosticCategory::DanglingReference => write!(f, "dangling-reference"),
            DiagnosticCategory::DuplicateComponent => write!(f, "duplicate-component"),
            DiagnosticCategory::Threshold => write!(f, "threshold"),
        }
    }
}

/// A consistency problem found in a process
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub category: DiagnosticCategory,
    /// Binding the problem was found on
    pub binding: Option<String>,
    pub message: String,
}

impl Diagnostic {
    fn error(category: DiagnosticCategory, binding: &str, message: String) -> Self {
        Diagnostic {
            severity: Severity::Error,
            category,
            binding: Some(binding.to_string()),
            message,
        }
    }

    fn warning(category: DiagnosticCategory, binding: &str, message: String) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            category,
            binding: Some(binding.to_string()),
            message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.severity, self.category)?;
        if let Some(binding) = &self.binding {
            write!(f, " {}", binding)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// A binding whose record converted to its typed config
struct Typed<'a> {
    binding: &'a str,
    config: ComponentConfig,
}

/// Run all consistency checks on an assembled process.
pub fn check(process: &Process, shadowed: &[Shadowing]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    check_shadowing(shadowed, &mut diagnostics);
    let typed = check_field_types(process, &mut diagnostics);
    check_references(process, &typed, &mut diagnostics);
    check_duplicates(process, &mut diagnostics);
    check_thresholds(&typed, &mut diagnostics);
    tracing::debug!(
        process = process.name(),
        diagnostics = diagnostics.len(),
        "validated process"
    );
    diagnostics
}

// ── Shadowing ─────────────────────────────────────────────────────

fn check_shadowing(shadowed: &[Shadowing], diagnostics: &mut Vec<Diagnostic>) {
    for s in shadowed {
        diagnostics.push(Diagnostic::warning(
            DiagnosticCategory::Shadowing,
            &s.name,
            format!("binding ({}) was replaced by an import ({})", s.previous, s.replacement),
        ));
    }
}

// ── Field types ───────────────────────────────────────────────────

fn check_field_types<'a>(process: &'a Process, diagnostics: &mut Vec<Diagnostic>) -> Vec<Typed<'a>> {
    let mut typed = Vec::new();
    for binding in process.bindings() {
        match ComponentConfig::from_record(&binding.record) {
            Ok(config) => typed.push(Typed {
                binding: &binding.name,
                config,
            }),
            Err(e) => diagnostics.push(Diagnostic::error(
                DiagnosticCategory::FieldType,
                &binding.name,
                format!("{}: {}", binding.record.kind(), e),
            )),
        }
    }
    typed
}

// ── References ────────────────────────────────────────────────────

fn check_references(process: &Process, typed: &[Typed<'_>], diagnostics: &mut Vec<Diagnostic>) {
    // Ill-typed records still publish their name
    let mut published: BTreeMap<&str, Vec<ComponentRole>> = BTreeMap::new();
    for b in process.bindings() {
        if let Some(name) = b.record.component_name() {
            published
                .entry(name)
                .or_default()
                .push(ComponentRole::of(b.record.kind()));
        }
    }

    for t in typed {
        for reference in t.config.references() {
            let target = reference.target.as_str();
            let Some(roles) = published.get(target) else {
                let suggestions = find_similar(published.keys().copied(), target, 4);
                diagnostics.push(Diagnostic::error(
                    DiagnosticCategory::DanglingReference,
                    t.binding,
                    format!(
                        "{} refers to {} '{}', which no component in the process publishes{}",
                        reference.field,
                        reference.role,
                        target,
                        format_suggestions(&suggestions)
                    ),
                ));
                continue;
            };

            if roles
                .iter()
                .any(|&role| role == reference.role || role == ComponentRole::Other)
            {
                continue;
            }
            let found = roles
                .iter()
                .map(|role| role.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            diagnostics.push(Diagnostic::error(
                DiagnosticCategory::DanglingReference,
                t.binding,
                format!(
                    "{} refers to '{}', published with role {} (expected {})",
                    reference.field, target, found, reference.role
                ),
            ));
        }
    }
}

// ── Duplicate components ──────────────────────────────────────────

fn check_duplicates(process: &Process, diagnostics: &mut Vec<Diagnostic>) {
    let mut first_by_name: BTreeMap<&str, &crate::process::Binding> = BTreeMap::new();
    for binding in process.bindings() {
        let Some(name) = binding.record.component_name() else {
            continue;
        };
        match first_by_name.get(name) {
            None => {
                first_by_name.insert(name, binding);
            }
            Some(first) if first.record != binding.record => {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticCategory::DuplicateComponent,
                    &binding.name,
                    format!(
                        "publishes ComponentName '{}' already published by '{}' with different parameters",
                        name, first.name
                    ),
                ));
            }
            Some(_) => {}
        }
    }
}

// ── Thresholds ────────────────────────────────────────────────────

fn check_thresholds(typed: &[Typed<'_>], diagnostics: &mut Vec<Diagnostic>) {
    let fitter_min_hits: BTreeMap<&str, i64> = typed
        .iter()
        .filter_map(|t| match &t.config {
            ComponentConfig::TrajectoryFitter(c) => Some((c.component_name.as_str(), c.min_hits)),
            _ => None,
        })
        .collect();

    for t in typed {
        match &t.config {
            ComponentConfig::TrajectoryFitter(c) if c.min_hits < 1 => {
                diagnostics.push(Diagnostic::error(
                    DiagnosticCategory::Threshold,
                    t.binding,
                    format!("minHits must be at least 1, got {}", c.min_hits),
                ));
            }
            ComponentConfig::FittingSmoother(c) => {
                if c.min_number_of_hits < 1 {
                    diagnostics.push(Diagnostic::error(
                        DiagnosticCategory::Threshold,
                        t.binding,
                        format!("MinNumberOfHits must be at least 1, got {}", c.min_number_of_hits),
                    ));
                } else if let Some(&fitter_hits) = fitter_min_hits.get(c.fitter.as_str()) {
                    if c.min_number_of_hits < fitter_hits {
                        diagnostics.push(Diagnostic::warning(
                            DiagnosticCategory::Threshold,
                            t.binding,
                            format!(
                                "MinNumberOfHits {} is below the minHits {} of fitter '{}'",
                                c.min_number_of_hits, fitter_hits, c.fitter
                            ),
                        ));
                    }
                }
            }
            _ => {}
        }
    }
}
