//! Diagnostics reported by the parser and the checker.
//!
//! Everything the user can get wrong ends up as a [`Diagnostic`]: a level, a
//! message, the location it is about, and any number of notes pointing at
//! related locations (the previous definition of a redefined name, every
//! participant of a cycle). Checking accumulates diagnostics instead of
//! stopping at the first one.
//!
//! # Examples
//!
//! ```
//! use pea_syntax::diagnostic::{Diagnostic, DiagnosticBuilder, Level};
//! use pea_syntax::span::{Loc, Span};
//!
//! let here = Loc::new("m/a.pea", Span::new(20, 23, 3, 1, 3, 4));
//! let there = Loc::new("m/a.pea", Span::new(0, 3, 1, 1, 1, 4));
//!
//! let diag = DiagnosticBuilder::new(Level::Error, "x redefined")
//!     .at(here)
//!     .note("previous definition", Some(there))
//!     .build();
//!
//! assert_eq!(diag.notes.len(), 1);
//! assert_eq!(diag.to_string(), "m/a.pea:3:1: error: x redefined\n  note: m/a.pea:1:1: previous definition");
//! ```

use std::fmt;

use crate::error::SyntaxError;
use crate::span::Loc;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// The module is rejected.
    Error,
    /// Suspicious but accepted.
    Warning,
}

impl Level {
    const fn color_code(self) -> &'static str {
        match self {
            Self::Error => "\x1b[31m",
            Self::Warning => "\x1b[33m",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A located message with optional notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    /// `None` for diagnostics about synthesized or imported definitions
    /// that have no source text.
    pub loc: Option<Loc>,
    pub notes: Vec<Note>,
}

/// Secondary message attached to a [`Diagnostic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub message: String,
    pub loc: Option<Loc>,
}

impl Diagnostic {
    /// Shorthand for an error with no notes.
    #[must_use]
    pub fn error(loc: Option<Loc>, message: impl Into<String>) -> Self {
        DiagnosticBuilder::new(Level::Error, message).at_opt(loc).build()
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(loc) = &self.loc {
            write!(f, "{loc}: ")?;
        }
        write!(f, "{}: {}", self.level, self.message)?;
        for note in &self.notes {
            write!(f, "\n  note: ")?;
            if let Some(loc) = &note.loc {
                write!(f, "{loc}: ")?;
            }
            write!(f, "{}", note.message)?;
        }
        Ok(())
    }
}

impl From<SyntaxError> for Diagnostic {
    fn from(err: SyntaxError) -> Self {
        Diagnostic::error(Some(err.loc()), err.to_string())
    }
}

/// Builder for diagnostics with notes.
pub struct DiagnosticBuilder {
    diagnostic: Diagnostic,
}

impl DiagnosticBuilder {
    #[must_use]
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            diagnostic: Diagnostic {
                level,
                message: message.into(),
                loc: None,
                notes: Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn at(mut self, loc: Loc) -> Self {
        self.diagnostic.loc = Some(loc);
        self
    }

    #[must_use]
    pub fn at_opt(mut self, loc: Option<Loc>) -> Self {
        self.diagnostic.loc = loc;
        self
    }

    #[must_use]
    pub fn note(mut self, message: impl Into<String>, loc: Option<Loc>) -> Self {
        self.diagnostic.notes.push(Note {
            message: message.into(),
            loc,
        });
        self
    }

    #[must_use]
    pub fn build(self) -> Diagnostic {
        self.diagnostic
    }
}

/// Renders diagnostics for a terminal, with the offending source line
/// underlined when the source text is at hand.
pub struct Emitter {
    use_colors: bool,
}

impl Emitter {
    #[must_use]
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Renders one diagnostic. `source` is the text of the file the
    /// diagnostic's primary location points into.
    #[must_use]
    pub fn render(&self, diagnostic: &Diagnostic, source: Option<&str>) -> String {
        let mut out = String::new();
        let level = if self.use_colors {
            format!("{}{}\x1b[0m", diagnostic.level.color_code(), diagnostic.level)
        } else {
            diagnostic.level.to_string()
        };
        match &diagnostic.loc {
            Some(loc) => out.push_str(&format!("{loc}: {level}: {}\n", diagnostic.message)),
            None => out.push_str(&format!("{level}: {}\n", diagnostic.message)),
        }
        if let (Some(loc), Some(source)) = (&diagnostic.loc, source)
            && let Some(line) = source.lines().nth(loc.span.start_line.saturating_sub(1))
        {
            let width = if loc.span.end_line == loc.span.start_line {
                loc.span.end_col.saturating_sub(loc.span.start_col).max(1)
            } else {
                line.len().saturating_sub(loc.span.start_col.saturating_sub(1)).max(1)
            };
            out.push_str(&format!("{:4} | {line}\n", loc.span.start_line));
            out.push_str(&format!(
                "     | {}{}\n",
                " ".repeat(loc.span.start_col.saturating_sub(1)),
                "^".repeat(width)
            ));
        }
        for note in &diagnostic.notes {
            match &note.loc {
                Some(loc) => out.push_str(&format!("   note: {loc}: {}\n", note.message)),
                None => out.push_str(&format!("   note: {}\n", note.message)),
            }
        }
        out
    }

    /// Writes a rendered diagnostic to standard error.
    pub fn emit(&self, diagnostic: &Diagnostic, source: Option<&str>) {
        eprint!("{}", self.render(diagnostic, source));
    }
}
