//! Abstract Syntax Tree types for process assembly scripts

use std::fmt;

use crate::record::Value;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Valid identifier (alphanumeric + underscore, starts with letter/_)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dotted template module path, e.g. `TrackingTools.KalmanUpdators.KFUpdatorESProducer`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePath(pub Vec<Identifier>);

impl ModulePath {
    pub fn segments(&self) -> &[Identifier] {
        &self.0
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Root AST node - one assembly script
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    /// Name from the `process` header, if present
    pub process_name: Option<Spanned<Identifier>>,
    pub statements: Vec<Spanned<Statement>>,
}

/// What an import statement brings into scope
#[derive(Debug, Clone, PartialEq)]
pub enum ImportItems {
    /// `import a.b.c` or `from a.b.c import *`
    All,
    /// `from a.b.c import X, Y`
    Only(Vec<Spanned<Identifier>>),
}

/// `import ...` / `from ... import ...`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub module: Spanned<ModulePath>,
    pub items: ImportItems,
}

/// One `field = value` override
#[derive(Debug, Clone, PartialEq)]
pub struct FieldOverride {
    pub field: Spanned<Identifier>,
    pub value: Spanned<Value>,
}

/// `Target = copy(Source) { field = value, ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct CopyDecl {
    pub target: Spanned<Identifier>,
    pub source: Spanned<Identifier>,
    pub overrides: Vec<FieldOverride>,
}

/// `Target.field = value`
#[derive(Debug, Clone, PartialEq)]
pub struct AssignDecl {
    pub target: Spanned<Identifier>,
    pub assignment: FieldOverride,
}

/// Top-level statement in a script
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Import(ImportDecl),
    Copy(CopyDecl),
    Assign(AssignDecl),
}
