//! Token definitions.
//!
//! Pea's lexical grammar is small: identifiers, keyword parts (`at:`),
//! operator runs (`<=`), three literal kinds, a handful of punctuation
//! marks and six reserved words.

use std::fmt;

use crate::span::Span;

/// A token and where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Reserved words
    Import,
    Val,
    Func,
    Meth,
    Type,
    Priv,

    /// `foo`, `List`
    Ident(String),
    /// `at:`; the text includes the colon.
    Keyword(String),
    /// A maximal run of operator characters, `+` or `<=`.
    Op(String),

    /// Digits as written.
    Int(String),
    /// Digits, fraction and exponent as written.
    Float(String),
    /// String contents with escapes already processed.
    Str(String),

    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semi,
    Colon,
    Caret,
    Hash,
    Bar,
    /// `:=`
    Define,

    Eof,
}

impl TokenKind {
    /// Maps a reserved word to its token.
    #[must_use]
    pub fn reserved(word: &str) -> Option<TokenKind> {
        Some(match word {
            "import" => TokenKind::Import,
            "val" => TokenKind::Val,
            "func" => TokenKind::Func,
            "meth" => TokenKind::Meth,
            "type" => TokenKind::Type,
            "priv" => TokenKind::Priv,
            _ => return None,
        })
    }

    /// Identifier starting with an upper-case letter, as type names do.
    #[must_use]
    pub fn is_type_ident(&self) -> bool {
        matches!(self, TokenKind::Ident(name) if name.starts_with(|c: char| c.is_ascii_uppercase()))
    }

    /// The `&` operator, which also names the reference type.
    #[must_use]
    pub fn is_amp(&self) -> bool {
        matches!(self, TokenKind::Op(op) if op == "&")
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Import => write!(f, "'import'"),
            TokenKind::Val => write!(f, "'val'"),
            TokenKind::Func => write!(f, "'func'"),
            TokenKind::Meth => write!(f, "'meth'"),
            TokenKind::Type => write!(f, "'type'"),
            TokenKind::Priv => write!(f, "'priv'"),
            TokenKind::Ident(name) => write!(f, "identifier '{name}'"),
            TokenKind::Keyword(kw) => write!(f, "keyword '{kw}'"),
            TokenKind::Op(op) => write!(f, "operator '{op}'"),
            TokenKind::Int(text) | TokenKind::Float(text) => write!(f, "number {text}"),
            TokenKind::Str(_) => write!(f, "string literal"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::Semi => write!(f, "';'"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Caret => write!(f, "'^'"),
            TokenKind::Hash => write!(f, "'#'"),
            TokenKind::Bar => write!(f, "'|'"),
            TokenKind::Define => write!(f, "':='"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}
