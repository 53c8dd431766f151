//! Lexical analysis for Pea source.
//!
//! # Examples
//!
//! ```
//! use pea_syntax::lexer::Lexer;
//! use pea_syntax::token::TokenKind;
//!
//! let tokens = Lexer::new("x at: 1 put: y").lex().unwrap();
//! let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
//!
//! assert_eq!(kinds[1], TokenKind::Keyword("at:".into()));
//! assert_eq!(kinds[3], TokenKind::Keyword("put:".into()));
//! assert_eq!(kinds.last(), Some(&TokenKind::Eof));
//! ```

use std::iter::Peekable;
use std::str::Chars;

use crate::error::{LexerError, LexerResult};
use crate::span::Span;
use crate::token::{Token, TokenKind};

const OP_CHARS: &str = "+-*/%<>=!~@?&";

/// Splits source text into tokens, tracking byte offset, line and column.
pub struct Lexer<'input> {
    chars: Peekable<Chars<'input>>,
    position: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl<'input> Lexer<'input> {
    #[must_use]
    pub fn new(input: &'input str) -> Self {
        Self {
            chars: input.chars().peekable(),
            position: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    /// Tokenizes the whole input. The returned vector always ends in
    /// [`TokenKind::Eof`].
    ///
    /// # Errors
    ///
    /// Returns the first [`LexerError`] encountered.
    pub fn lex(mut self) -> LexerResult<Vec<Token>> {
        loop {
            self.skip_trivia()?;
            if self.peek().is_none() {
                break;
            }
            let token = self.next_token()?;
            self.tokens.push(token);
        }
        let eof = Span::point(self.position, self.line, self.column);
        self.tokens.push(Token::new(TokenKind::Eof, eof));
        Ok(self.tokens)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek2(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.position += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn here(&self) -> Span {
        Span::point(self.position, self.line, self.column)
    }

    fn span_from(&self, start: Span) -> Span {
        Span::merge(start, self.here())
    }

    /// Skips whitespace and comments.
    fn skip_trivia(&mut self) -> LexerResult<()> {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek2() == Some('/') => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek2() == Some('*') => {
                    let start = self.here();
                    self.bump();
                    self.bump();
                    loop {
                        match self.bump() {
                            Some('*') if self.peek() == Some('/') => {
                                self.bump();
                                break;
                            }
                            Some(_) => {}
                            None => return Err(LexerError::UnterminatedComment { start }),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> LexerResult<Token> {
        let start = self.here();
        let Some(ch) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, start));
        };

        let kind = match ch {
            'a'..='z' | 'A'..='Z' | '_' => self.read_word(),
            '0'..='9' => self.read_number(),
            '"' => self.read_string(start)?,
            ':' => {
                self.bump();
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::Define
                } else {
                    TokenKind::Colon
                }
            }
            '(' | ')' | '[' | ']' | '{' | '}' | ',' | '.' | ';' | '^' | '#' | '|' => {
                self.bump();
                match ch {
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '[' => TokenKind::LBracket,
                    ']' => TokenKind::RBracket,
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    ',' => TokenKind::Comma,
                    '.' => TokenKind::Dot,
                    ';' => TokenKind::Semi,
                    '^' => TokenKind::Caret,
                    '#' => TokenKind::Hash,
                    _ => TokenKind::Bar,
                }
            }
            c if OP_CHARS.contains(c) => self.read_op(),
            other => {
                self.bump();
                return Err(LexerError::UnknownChar {
                    ch: other,
                    span: self.span_from(start),
                });
            }
        };

        Ok(Token::new(kind, self.span_from(start)))
    }

    /// Reads an identifier, keyword part or reserved word.
    fn read_word(&mut self) -> TokenKind {
        let mut word = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                word.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        if self.peek() == Some(':') && self.peek2() != Some('=') {
            self.bump();
            word.push(':');
            return TokenKind::Keyword(word);
        }
        TokenKind::reserved(&word).unwrap_or(TokenKind::Ident(word))
    }

    fn read_number(&mut self) -> TokenKind {
        let mut text = String::new();
        self.read_digits(&mut text);

        // A dot followed by a non-digit ends the statement instead.
        let mut float = false;
        if self.peek() == Some('.') && self.peek2().is_some_and(|c| c.is_ascii_digit()) {
            float = true;
            text.push('.');
            self.bump();
            self.read_digits(&mut text);
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let mut ahead = self.chars.clone();
            ahead.next();
            let sign = ahead.peek().copied();
            let digit_follows = match sign {
                Some('+' | '-') => {
                    ahead.next();
                    ahead.peek().is_some_and(char::is_ascii_digit)
                }
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if digit_follows {
                float = true;
                text.extend(self.bump());
                if matches!(self.peek(), Some('+' | '-')) {
                    text.extend(self.bump());
                }
                self.read_digits(&mut text);
            }
        }

        if float {
            TokenKind::Float(text)
        } else {
            TokenKind::Int(text)
        }
    }

    fn read_digits(&mut self, text: &mut String) {
        while let Some(ch) = self.peek() {
            if !ch.is_ascii_digit() {
                break;
            }
            text.push(ch);
            self.bump();
        }
    }

    fn read_string(&mut self, start: Span) -> LexerResult<TokenKind> {
        self.bump();
        let mut text = String::new();
        loop {
            let escape_at = self.here();
            match self.bump() {
                Some('"') => return Ok(TokenKind::Str(text)),
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('"') => text.push('"'),
                    Some('\\') => text.push('\\'),
                    Some(ch) => {
                        return Err(LexerError::InvalidEscape {
                            ch,
                            span: self.span_from(escape_at),
                        });
                    }
                    None => return Err(LexerError::UnterminatedString { start }),
                },
                Some(ch) => text.push(ch),
                None => return Err(LexerError::UnterminatedString { start }),
            }
        }
    }

    fn read_op(&mut self) -> TokenKind {
        let mut op = String::new();
        while let Some(ch) = self.peek() {
            if !OP_CHARS.contains(ch) {
                break;
            }
            // Comments win over operator characters.
            if ch == '/' && matches!(self.peek2(), Some('/' | '*')) {
                break;
            }
            op.push(ch);
            self.bump();
        }
        TokenKind::Op(op)
    }
}

/// Convenience wrapper returning only the token kinds.
///
/// # Errors
///
/// Returns the first [`LexerError`].
pub fn kinds(source: &str) -> LexerResult<Vec<TokenKind>> {
    Ok(Lexer::new(source).lex()?.into_iter().map(|t| t.kind).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::*;

    fn ident(s: &str) -> TokenKind {
        Ident(s.to_string())
    }

    #[test]
    fn test_reserved_and_idents() {
        assert_eq!(
            kinds("priv type List val x").unwrap(),
            vec![Priv, Type, ident("List"), Val, ident("x"), Eof]
        );
    }

    #[test]
    fn test_keyword_vs_define() {
        assert_eq!(
            kinds("x := y at: 1").unwrap(),
            vec![ident("x"), Define, ident("y"), Keyword("at:".into()), Int("1".into()), Eof]
        );
        assert_eq!(kinds("x:=1").unwrap()[1], Define);
    }

    #[test]
    fn test_block_params() {
        assert_eq!(
            kinds("[:x Int | x]").unwrap(),
            vec![LBracket, Colon, ident("x"), ident("Int"), Bar, ident("x"), RBracket, Eof]
        );
    }

    #[test]
    fn test_numbers_and_statement_dots() {
        assert_eq!(
            kinds("1.5 2. 3e4 7e").unwrap(),
            vec![
                Float("1.5".into()),
                Int("2".into()),
                Dot,
                Float("3e4".into()),
                Int("7".into()),
                ident("e"),
                Eof
            ]
        );
        assert_eq!(kinds("1.0e-3").unwrap()[0], Float("1.0e-3".into()));
    }

    #[test]
    fn test_operators_and_amp() {
        assert_eq!(
            kinds("a <= b. Int& x").unwrap(),
            vec![
                ident("a"),
                Op("<=".into()),
                ident("b"),
                Dot,
                ident("Int"),
                Op("&".into()),
                ident("x"),
                Eof
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            kinds("a // line\n/* block\n */ b /").unwrap(),
            vec![ident("a"), ident("b"), Op("/".into()), Eof]
        );
        assert!(matches!(
            Lexer::new("/* open").lex(),
            Err(LexerError::UnterminatedComment { .. })
        ));
    }

    #[test]
    fn test_strings() {
        assert_eq!(kinds(r#""a\n\"b\"""#).unwrap()[0], Str("a\n\"b\"".into()));
        assert!(matches!(
            Lexer::new("\"abc").lex(),
            Err(LexerError::UnterminatedString { .. })
        ));
        assert!(matches!(
            Lexer::new(r#""\q""#).lex(),
            Err(LexerError::InvalidEscape { ch: 'q', .. })
        ));
    }

    #[test]
    fn test_unknown_char() {
        let err = Lexer::new("x $").lex().unwrap_err();
        assert_eq!(err, LexerError::UnknownChar { ch: '$', span: Span::new(2, 3, 1, 3, 1, 4) });
    }

    #[test]
    fn test_spans_track_lines() {
        let tokens = Lexer::new("a\n  bc").lex().unwrap();
        assert_eq!(tokens[1].span, Span::new(4, 6, 2, 3, 2, 5));
        assert_eq!(tokens[2].span, Span::point(6, 2, 5));
    }
}
