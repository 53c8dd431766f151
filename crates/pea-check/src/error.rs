//! Error types of the checker.
//!
//! User mistakes are never errors here: they are [`Diagnostic`]s,
//! accumulated while checking continues. This module holds the two other
//! kinds of failure:
//!
//! - [`Defect`]: a broken contract between components, such as a malformed
//!   checked-module stream or a value that does not fit the wire format.
//! - [`ImportError`]: why an import statement produced no definitions.

use std::fmt;

use pea_syntax::{Diagnostic, Loc};

/// A contract violation. Defects are returned through `Result` and never
/// reported as diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Defect {
    /// A state the data model rules out.
    Unreachable(&'static str),

    /// An integer outside the `i32` range of the wire format.
    IntRange { what: &'static str, value: i64 },

    /// The input stream does not follow the record layout.
    Malformed { offset: usize, message: String },

    /// A record was referenced but never read.
    Dangling { kind: &'static str, id: i32 },
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Defect::Unreachable(what) => write!(f, "unreachable: {what}"),
            Defect::IntRange { what, value } => write!(f, "{what} {value} out of range"),
            Defect::Malformed { offset, message } => write!(f, "malformed input at {offset}: {message}"),
            Defect::Dangling { kind, id } => write!(f, "dangling {kind} reference {id}"),
        }
    }
}

impl std::error::Error for Defect {}

pub type Result<T, E = Defect> = std::result::Result<T, E>;

/// Why an import failed.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportError {
    /// The import path list, ending with the repeated path.
    Cycle(Vec<String>),

    /// No module at the path.
    NotFound(String),

    /// The module's sources could not be read.
    Io { path: String, message: String },

    /// The module failed before; failures are cached.
    Failed(String),

    /// The module was read but has errors.
    Check(Vec<Diagnostic>),
}

impl ImportError {
    /// Turns the error into the diagnostics reported at the import.
    #[must_use]
    pub fn into_diagnostics(self, loc: Option<Loc>) -> Vec<Diagnostic> {
        match self {
            ImportError::Check(diags) => diags,
            other => vec![Diagnostic::error(loc, other.to_string())],
        }
    }
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Cycle(paths) => write!(f, "import cycle: [{}]", paths.join(", ")),
            ImportError::NotFound(path) => write!(f, "import \"{path}\" not found"),
            ImportError::Io { path, message } => write!(f, "cannot read \"{path}\": {message}"),
            ImportError::Failed(path) => write!(f, "failed to import \"{path}\""),
            ImportError::Check(diags) => write!(f, "{} errors", diags.len()),
        }
    }
}

impl std::error::Error for ImportError {}
