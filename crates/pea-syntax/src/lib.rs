//! Pea syntax: lexer, parser, AST and module loader.
//!
//! This crate turns `.pea` source text into the AST consumed by
//! `pea-check`. Everything here is purely syntactic; names are resolved and
//! types checked downstream.
//!
//! # Modules
//!
//! - [`span`] - source locations
//! - [`diagnostic`] - diagnostics shared with the checker
//! - [`token`] and [`lexer`] - tokenization
//! - [`ast`] and [`parser`] - the syntax tree
//! - [`loader`] - module paths to parsed modules
//!
//! # Examples
//!
//! ```
//! use pea_syntax::ast::Def;
//!
//! let file = pea_syntax::parse_source(
//!     "pt.pea",
//!     "type Point { x: Int y: Int }
//!      meth Point [x ^Int | ^1]",
//! )
//! .unwrap();
//!
//! assert!(matches!(&file.defs[1], Def::Fun(f) if f.recv.is_some()));
//! ```

pub mod ast;
pub mod diagnostic;
pub mod error;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod span;
pub mod token;

pub use diagnostic::{Diagnostic, DiagnosticBuilder, Level, Note};
pub use error::{LexerError, ParserError, SyntaxError, SyntaxResult};
pub use lexer::Lexer;
pub use parser::{Parser, parse_source};
pub use span::{Loc, Located, Span};
pub use token::{Token, TokenKind};
