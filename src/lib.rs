//! trackcfg - template registry and process assembly for track-reconstruction configs
//!
//! This library provides a parser for assembly scripts, a catalog of template
//! modules, the assembler that turns a script into a named process, and a
//! validation pass over the result.
//!
//! # Example
//!
//! ```rust
//! use trackcfg::load;
//!
//! let loaded = load(r#"
//!     import TrackingTools.MaterialEffects.MaterialPropagator
//!     RungeKuttaTrackerPropagator = copy(MaterialPropagator)
//!     RungeKuttaTrackerPropagator.ComponentName = "RungeKuttaTrackerPropagator"
//!     RungeKuttaTrackerPropagator.useRungeKutta = true
//! "#).unwrap();
//!
//! let rk = loaded.process.record("RungeKuttaTrackerPropagator").unwrap();
//! assert_eq!(rk.get_bool("useRungeKutta"), Ok(true));
//! ```

pub mod components;
pub mod error;
pub mod library;
pub mod parser;
pub mod process;
pub mod record;
mod suggest;
pub mod template;
pub mod validate;

pub use error::ParseError;
pub use library::{LibraryError, TemplateLibrary};
pub use parser::{parse, Script};
pub use process::{Binding, Origin, Process};
pub use record::{FieldError, ParameterRecord, Value, COMPONENT_NAME};
pub use template::{
    assemble, AssemblyError, AssemblyOutcome, ModuleCatalog, Namespace, RegistryError,
    ShadowPolicy, TemplateModule,
};
pub use validate::{Diagnostic, DiagnosticCategory, Severity};

use thiserror::Error;

/// Errors that can occur while loading a process
#[derive(Debug, Error)]
pub enum LoadError {
    /// Error during parsing
    #[error("parse errors: {}", format_parse_errors(.0))]
    Parse(Vec<ParseError>),

    /// A statement could not be executed
    #[error("assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("library error: {0}")]
    Library(#[from] LibraryError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Validation found errors and strict mode is on
    #[error("process is invalid: {}", format_diagnostics(.0))]
    Invalid(Vec<Diagnostic>),
}

impl From<Vec<ParseError>> for LoadError {
    fn from(errors: Vec<ParseError>) -> Self {
        LoadError::Parse(errors)
    }
}

impl LoadError {
    /// Render the error against the script source; script errors get an ariadne report
    pub fn format(&self, source: &str, filename: &str) -> String {
        match self {
            LoadError::Parse(errors) => errors
                .iter()
                .map(|e| e.format(source, filename))
                .collect::<Vec<_>>()
                .join("\n"),
            LoadError::Assembly(e) => e.format(source, filename),
            LoadError::Invalid(diagnostics) => diagnostics
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
            other => other.to_string(),
        }
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Configuration for loading a process
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Template modules available for import
    pub library: TemplateLibrary,
    /// How imports that rebind a name are treated
    pub shadowing: ShadowPolicy,
    /// Run the validation pass
    pub validate: bool,
    /// Fail when validation reports an error
    pub strict: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            library: TemplateLibrary::default(),
            shadowing: ShadowPolicy::default(),
            validate: true,
            strict: false,
        }
    }
}

impl LoadConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the template library
    pub fn with_library(mut self, library: TemplateLibrary) -> Self {
        self.library = library;
        self
    }

    /// Set the shadowing policy
    pub fn with_shadowing(mut self, policy: ShadowPolicy) -> Self {
        self.shadowing = policy;
        self
    }

    /// Enable or disable validation
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Enable or disable strict mode
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// An assembled process and what validation had to say about it
#[derive(Debug, Clone)]
pub struct Loaded {
    pub process: Process,
    pub diagnostics: Vec<Diagnostic>,
}

impl Loaded {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Load a process from script source with the built-in template library
pub fn load(source: &str) -> Result<Loaded, LoadError> {
    load_with_config(source, LoadConfig::default())
}

/// Load a process from script source with custom configuration
///
/// # Example
///
/// ```rust
/// use trackcfg::{load_with_config, LoadConfig, ShadowPolicy};
///
/// let config = LoadConfig::new()
///     .with_shadowing(ShadowPolicy::Deny)
///     .with_strict(true);
///
/// let loaded = load_with_config(
///     "process fit\nimport TrackingTools.TrackFitters.KFFittingSmootherESProducer",
///     config,
/// );
/// // The smoother references a fitter that was never imported
/// assert!(loaded.is_err());
/// ```
pub fn load_with_config(source: &str, config: LoadConfig) -> Result<Loaded, LoadError> {
    let script = parse(source)?;
    let catalog = config.library.into_catalog()?;
    let outcome = assemble(&script, &catalog, config.shadowing)?;

    let diagnostics = if config.validate {
        validate::check(&outcome.process, &outcome.shadowed)
    } else {
        Vec::new()
    };

    for diagnostic in unlogged(&diagnostics) {
        match diagnostic.severity {
            Severity::Error => tracing::error!("{}", diagnostic),
            Severity::Warning => tracing::warn!("{}", diagnostic),
        }
    }

    if config.strict && diagnostics.iter().any(Diagnostic::is_error) {
        return Err(LoadError::Invalid(diagnostics));
    }

    Ok(Loaded {
        process: outcome.process,
        diagnostics,
    })
}

/// Diagnostics not yet logged; shadowing is logged by the import that caused it
fn unlogged(diagnostics: &[Diagnostic]) -> impl Iterator<Item = &Diagnostic> {
    diagnostics
        .iter()
        .filter(|d| d.category != DiagnosticCategory::Shadowing)
}
