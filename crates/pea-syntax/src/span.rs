//! Source location tracking for tokens, AST nodes and diagnostics.
//!
//! A [`Span`] locates text within one file; a [`Loc`] pairs a span with the
//! path of the file it belongs to. Modules span several files, so everything
//! that outlives the parser (AST nodes, checked definitions, diagnostics)
//! carries a `Loc`.
//!
//! # Examples
//!
//! ```
//! use pea_syntax::span::{Loc, Span};
//!
//! let left = Span::new(0, 4, 1, 1, 1, 5);
//! let right = Span::new(10, 12, 2, 3, 2, 5);
//! let both = Span::merge(left, right);
//! assert_eq!((both.start, both.end), (0, 12));
//!
//! let loc = Loc::new("list/list.pea", both);
//! assert_eq!(loc.to_string(), "list/list.pea:1:1");
//! ```

use std::fmt;
use std::rc::Rc;

/// Byte offsets plus 1-based line/column positions of a run of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset of the first byte.
    pub start: usize,
    /// Byte offset one past the last byte.
    pub end: usize,
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Span {
    #[must_use]
    pub const fn new(
        start: usize,
        end: usize,
        start_line: usize,
        start_col: usize,
        end_line: usize,
        end_col: usize,
    ) -> Self {
        Self {
            start,
            end,
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Covers everything from the start of `left` to the end of `right`.
    #[must_use]
    pub const fn merge(left: Span, right: Span) -> Self {
        Self {
            start: left.start,
            end: right.end,
            start_line: left.start_line,
            start_col: left.start_col,
            end_line: right.end_line,
            end_col: right.end_col,
        }
    }

    /// A zero-length span, used for end of input.
    #[must_use]
    pub const fn point(offset: usize, line: usize, col: usize) -> Self {
        Self {
            start: offset,
            end: offset,
            start_line: line,
            start_col: col,
            end_line: line,
            end_col: col,
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// A span within a named source file.
///
/// The path is shared, so cloning a `Loc` never copies the file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Loc {
    pub path: Rc<str>,
    pub span: Span,
}

impl Loc {
    #[must_use]
    pub fn new(path: impl Into<Rc<str>>, span: Span) -> Self {
        Loc {
            path: path.into(),
            span,
        }
    }

    /// Covers both locations; `self` and `end` must be in the same file.
    #[must_use]
    pub fn to(&self, end: &Loc) -> Loc {
        debug_assert_eq!(self.path, end.path);
        Loc {
            path: Rc::clone(&self.path),
            span: Span::merge(self.span, end.span),
        }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.span)
    }
}

/// Implemented by everything that knows where it came from.
pub trait Located {
    fn loc(&self) -> &Loc;
}

impl Located for Loc {
    fn loc(&self) -> &Loc {
        self
    }
}
