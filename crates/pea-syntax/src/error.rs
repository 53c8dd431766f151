//! Error types for the lexer and parser.
//!
//! Lexer and parser errors carry a [`Span`] only; the file they occurred in
//! is attached when they are lifted into a [`SyntaxError`].

use std::fmt;
use std::rc::Rc;

use crate::span::{Loc, Span};

/// Errors raised while splitting source text into tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexerError {
    /// A character that starts no token.
    ///
    /// ```text
    /// val x := 1 $ 2
    ///            ^
    /// error: unknown character '$'
    /// ```
    UnknownChar { ch: char, span: Span },

    /// A string literal still open at end of input.
    UnterminatedString { start: Span },

    /// A `/* ... */` comment still open at end of input.
    UnterminatedComment { start: Span },

    /// A backslash escape the language does not define.
    InvalidEscape { ch: char, span: Span },
}

impl LexerError {
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::UnknownChar { span, .. } | Self::InvalidEscape { span, .. } => *span,
            Self::UnterminatedString { start } | Self::UnterminatedComment { start } => *start,
        }
    }
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownChar { ch, .. } => write!(f, "unknown character '{ch}'"),
            Self::UnterminatedString { .. } => write!(f, "unterminated string literal"),
            Self::UnterminatedComment { .. } => write!(f, "unterminated block comment"),
            Self::InvalidEscape { ch, .. } => write!(f, "invalid escape '\\{ch}'"),
        }
    }
}

impl std::error::Error for LexerError {}

/// Errors raised while building the AST from tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    /// ```text
    /// func [foo ^Int | ^1
    ///                    ^
    /// error: expected ']', found end of input
    /// ```
    UnexpectedToken {
        expected: Vec<String>,
        found: String,
        span: Span,
    },

    ExpectedIdentifier { span: Span },

    ExpectedType { span: Span },

    ExpectedExpression { span: Span },

    /// A definition keyword was expected at the top level of a file.
    ExpectedDefinition { span: Span },

    /// Keyword parts of a signature or message need an argument each.
    MissingArgument { part: String, span: Span },
}

impl ParserError {
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::UnexpectedToken { span, .. }
            | Self::ExpectedIdentifier { span }
            | Self::ExpectedType { span }
            | Self::ExpectedExpression { span }
            | Self::ExpectedDefinition { span }
            | Self::MissingArgument { span, .. } => *span,
        }
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken {
                expected, found, ..
            } => {
                write!(f, "expected ")?;
                if expected.len() == 1 {
                    write!(f, "{}", expected[0])?;
                } else {
                    write!(f, "one of {}", expected.join(", "))?;
                }
                write!(f, ", found {found}")
            }
            Self::ExpectedIdentifier { .. } => write!(f, "expected identifier"),
            Self::ExpectedType { .. } => write!(f, "expected type name"),
            Self::ExpectedExpression { .. } => write!(f, "expected expression"),
            Self::ExpectedDefinition { .. } => {
                write!(f, "expected import, val, func, meth or type")
            }
            Self::MissingArgument { part, .. } => write!(f, "missing argument after {part}"),
        }
    }
}

impl std::error::Error for ParserError {}

/// Lexer or parser failure, with the file it happened in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub path: Rc<str>,
    pub kind: SyntaxErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    Lexer(LexerError),
    Parser(ParserError),
}

impl SyntaxError {
    #[must_use]
    pub fn new(path: Rc<str>, kind: impl Into<SyntaxErrorKind>) -> Self {
        SyntaxError {
            path,
            kind: kind.into(),
        }
    }

    /// Location of the offending text.
    #[must_use]
    pub fn loc(&self) -> Loc {
        let span = match &self.kind {
            SyntaxErrorKind::Lexer(err) => err.span(),
            SyntaxErrorKind::Parser(err) => err.span(),
        };
        Loc::new(Rc::clone(&self.path), span)
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SyntaxErrorKind::Lexer(err) => write!(f, "{err}"),
            SyntaxErrorKind::Parser(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SyntaxError {}

impl From<LexerError> for SyntaxErrorKind {
    fn from(err: LexerError) -> Self {
        Self::Lexer(err)
    }
}

impl From<ParserError> for SyntaxErrorKind {
    fn from(err: ParserError) -> Self {
        Self::Parser(err)
    }
}

pub type LexerResult<T> = Result<T, LexerError>;

pub type ParserResult<T> = Result<T, ParserError>;

pub type SyntaxResult<T> = Result<T, SyntaxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexer_error_display() {
        let err = LexerError::UnknownChar {
            ch: '$',
            span: Span::new(10, 11, 1, 11, 1, 12),
        };
        assert_eq!(err.to_string(), "unknown character '$'");
        assert_eq!(err.span().start, 10);

        let err = LexerError::InvalidEscape {
            ch: 'q',
            span: Span::point(0, 1, 1),
        };
        assert_eq!(err.to_string(), "invalid escape '\\q'");
    }

    #[test]
    fn test_parser_error_display() {
        let err = ParserError::UnexpectedToken {
            expected: vec!["']'".to_string()],
            found: "'.'".to_string(),
            span: Span::point(5, 1, 6),
        };
        assert_eq!(err.to_string(), "expected ']', found '.'");

        let err = ParserError::UnexpectedToken {
            expected: vec!["identifier".to_string(), "'('".to_string()],
            found: "end of input".to_string(),
            span: Span::point(5, 1, 6),
        };
        assert_eq!(err.to_string(), "expected one of identifier, '(', found end of input");
    }

    #[test]
    fn test_syntax_error_loc() {
        let err = SyntaxError::new(
            "m/a.pea".into(),
            ParserError::ExpectedType {
                span: Span::new(4, 5, 2, 3, 2, 4),
            },
        );
        assert_eq!(err.loc().to_string(), "m/a.pea:2:3");
        assert_eq!(err.to_string(), "expected type name");
    }
}
