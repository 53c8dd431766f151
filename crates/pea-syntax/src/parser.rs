//! Recursive-descent parser.
//!
//! Message sends follow Smalltalk precedence: unary binds tighter than
//! binary, binary tighter than keyword, and binary operators associate left
//! to right without priorities among themselves. A `;` cascades further
//! messages to the receiver of the last send.
//!
//! # Examples
//!
//! ```
//! use pea_syntax::ast::{Def, TypeBody};
//! use pea_syntax::parser::parse_source;
//!
//! let file = parse_source("opt.pea", "type (T) Opt { none | some: T }").unwrap();
//! let Def::Type(def) = &file.defs[0] else { panic!() };
//!
//! assert_eq!(def.name, "Opt");
//! assert!(matches!(&def.body, TypeBody::Cases(cases) if cases.len() == 2));
//! ```

use std::rc::Rc;

use crate::ast::{
    Assign, Block, BlockParam, Call, Case, Ctor, Def, Expr, Field, File, FunDef, FunSig, Ident,
    Import, Lit, Msg, Param, Recv, Ret, Stmt, TypeBody, TypeDef, TypeName, TypeParam, ValDef,
};
use crate::error::{ParserError, ParserResult, SyntaxError, SyntaxResult};
use crate::lexer::Lexer;
use crate::span::{Loc, Span};
use crate::token::{Token, TokenKind};

/// Parses one file of source text.
///
/// # Errors
///
/// Returns the first lexer or parser error.
pub fn parse_source(path: &str, source: &str) -> SyntaxResult<File> {
    let path: Rc<str> = Rc::from(path);
    let tokens = Lexer::new(source)
        .lex()
        .map_err(|err| SyntaxError::new(Rc::clone(&path), err))?;
    Parser::new(tokens, Rc::clone(&path))
        .parse_file()
        .map_err(|err| SyntaxError::new(path, err))
}

/// Parser over a token stream that ends in [`TokenKind::Eof`].
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    path: Rc<str>,
}

impl Parser {
    #[must_use]
    pub fn new(tokens: Vec<Token>, path: Rc<str>) -> Self {
        Self {
            tokens,
            pos: 0,
            path,
        }
    }

    fn peek(&self) -> &TokenKind {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .or_else(|| self.tokens.last())
            .map_or(&TokenKind::Eof, |t| &t.kind)
    }

    fn span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or_else(Span::default, |t| t.span)
    }

    fn prev_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or_else(|| self.span(), |t| t.span)
    }

    fn bump(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        kind
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        let found = self.check(kind);
        if found {
            self.bump();
        }
        found
    }

    fn expect(&mut self, kind: TokenKind) -> ParserResult<Span> {
        if self.check(&kind) {
            let span = self.span();
            self.bump();
            Ok(span)
        } else {
            Err(self.unexpected(&[&kind.to_string()]))
        }
    }

    fn expect_ident(&mut self) -> ParserResult<String> {
        match self.peek() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.bump();
                Ok(name)
            }
            _ => Err(ParserError::ExpectedIdentifier { span: self.span() }),
        }
    }

    fn unexpected(&self, expected: &[&str]) -> ParserError {
        ParserError::UnexpectedToken {
            expected: expected.iter().map(ToString::to_string).collect(),
            found: self.peek().to_string(),
            span: self.span(),
        }
    }

    fn loc(&self, span: Span) -> Loc {
        Loc::new(Rc::clone(&self.path), span)
    }

    /// Location from `start` to the end of the last consumed token.
    fn loc_from(&self, start: Span) -> Loc {
        self.loc(Span::merge(start, self.prev_span()))
    }

    fn at_type_name(&self) -> bool {
        let next = self.peek();
        next.is_type_ident() || matches!(next, TokenKind::LParen | TokenKind::Hash)
    }

    // ===== Definitions =====

    /// Parses every definition up to end of input.
    ///
    /// # Errors
    ///
    /// Returns the first syntax error.
    pub fn parse_file(mut self) -> ParserResult<File> {
        let mut defs = Vec::new();
        while !self.check(&TokenKind::Eof) {
            defs.push(self.parse_def()?);
        }
        Ok(File {
            path: self.path,
            defs,
        })
    }

    fn parse_def(&mut self) -> ParserResult<Def> {
        let start = self.span();
        if self.eat(&TokenKind::Import) {
            let TokenKind::Str(path) = self.peek().clone() else {
                return Err(self.unexpected(&["import path"]));
            };
            self.bump();
            return Ok(Def::Import(Import {
                loc: self.loc_from(start),
                path,
            }));
        }

        let private = self.eat(&TokenKind::Priv);
        match self.peek() {
            TokenKind::Val => self.parse_val(start, private).map(|d| Def::Val(Rc::new(d))),
            TokenKind::Func | TokenKind::Meth => {
                self.parse_fun(start, private).map(|d| Def::Fun(Rc::new(d)))
            }
            TokenKind::Type => self.parse_type_def(start, private).map(|d| Def::Type(Rc::new(d))),
            _ => Err(ParserError::ExpectedDefinition { span: self.span() }),
        }
    }

    fn parse_val(&mut self, start: Span, private: bool) -> ParserResult<ValDef> {
        self.expect(TokenKind::Val)?;
        let name = self.expect_ident()?;
        let ty = if self.check(&TokenKind::Define) {
            None
        } else {
            Some(self.parse_type_name()?)
        };
        self.expect(TokenKind::Define)?;
        self.expect(TokenKind::LBracket)?;
        let init = self.parse_stmts()?;
        self.expect(TokenKind::RBracket)?;
        Ok(ValDef {
            loc: self.loc_from(start),
            private,
            name,
            ty,
            init,
        })
    }

    fn parse_fun(&mut self, start: Span, private: bool) -> ParserResult<FunDef> {
        let is_meth = self.bump() == TokenKind::Meth;
        let tparams = if self.check(&TokenKind::LParen) {
            self.parse_type_params()?
        } else {
            Vec::new()
        };

        let (recv, tparams) = if is_meth {
            let recv_start = self.span();
            let module = if self.eat(&TokenKind::Hash) {
                Some(self.expect_ident()?)
            } else {
                None
            };
            let name = self.parse_type_ident()?;
            let recv = Recv {
                loc: self.loc_from(recv_start),
                params: tparams,
                module,
                name,
            };
            (Some(recv), Vec::new())
        } else {
            (None, tparams)
        };

        self.expect(TokenKind::LBracket)?;
        let sig = self.parse_sig()?;
        let body = if self.eat(&TokenKind::Bar) {
            Some(self.parse_stmts()?)
        } else {
            None
        };
        self.expect(TokenKind::RBracket)?;

        Ok(FunDef {
            loc: self.loc_from(start),
            private,
            recv,
            tparams,
            sig,
            body,
        })
    }

    fn parse_type_def(&mut self, start: Span, private: bool) -> ParserResult<TypeDef> {
        self.expect(TokenKind::Type)?;
        let params = if self.check(&TokenKind::LParen) {
            self.parse_type_params()?
        } else {
            Vec::new()
        };
        let name = self.parse_type_ident()?;

        let body = if self.eat(&TokenKind::Define) {
            TypeBody::Alias(self.parse_type_name()?)
        } else if self.eat(&TokenKind::LBrace) {
            let body = self.parse_type_body()?;
            self.expect(TokenKind::RBrace)?;
            body
        } else {
            TypeBody::Opaque
        };

        Ok(TypeDef {
            loc: self.loc_from(start),
            private,
            params,
            name,
            body,
        })
    }

    /// A defined type's name: an identifier, or `&` for the reference type.
    fn parse_type_ident(&mut self) -> ParserResult<String> {
        if self.peek().is_amp() {
            self.bump();
            return Ok("&".to_string());
        }
        self.expect_ident()
    }

    fn parse_type_params(&mut self) -> ParserResult<Vec<TypeParam>> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        loop {
            let start = self.span();
            let name = self.expect_ident()?;
            let mut bounds = Vec::new();
            if self.at_type_name() {
                bounds.push(self.parse_type_name()?);
            }
            params.push(TypeParam {
                loc: self.loc_from(start),
                name,
                bounds,
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    fn parse_type_body(&mut self) -> ParserResult<TypeBody> {
        if self.check(&TokenKind::RBrace) {
            return Ok(TypeBody::Fields(Vec::new()));
        }

        if self.check(&TokenKind::LBracket) {
            let mut sigs = Vec::new();
            while self.eat(&TokenKind::LBracket) {
                sigs.push(self.parse_sig()?);
                self.expect(TokenKind::RBracket)?;
            }
            return Ok(TypeBody::Virts(sigs));
        }

        let first = self.parse_case()?;
        if self.check(&TokenKind::Bar) || first.ty.is_none() {
            let mut cases = vec![first];
            while self.eat(&TokenKind::Bar) {
                if self.check(&TokenKind::RBrace) {
                    break;
                }
                cases.push(self.parse_case()?);
            }
            return Ok(TypeBody::Cases(cases));
        }

        let mut fields = vec![into_field(first)?];
        loop {
            self.eat(&TokenKind::Comma);
            if self.check(&TokenKind::RBrace) {
                break;
            }
            let case = self.parse_case()?;
            fields.push(into_field(case)?);
        }
        Ok(TypeBody::Fields(fields))
    }

    /// `name` or `name: Type`; fields share the second form.
    fn parse_case(&mut self) -> ParserResult<Case> {
        let start = self.span();
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.bump();
                Ok(Case {
                    loc: self.loc_from(start),
                    name,
                    ty: None,
                })
            }
            TokenKind::Keyword(kw) => {
                self.bump();
                let ty = self.parse_type_name()?;
                Ok(Case {
                    loc: self.loc_from(start),
                    name: kw.trim_end_matches(':').to_string(),
                    ty: Some(ty),
                })
            }
            _ => Err(self.unexpected(&["field", "case"])),
        }
    }

    fn parse_sig(&mut self) -> ParserResult<FunSig> {
        let start = self.span();
        let mut params = Vec::new();
        let sel = match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.bump();
                name
            }
            TokenKind::Op(op) => {
                self.bump();
                params.push(self.parse_param()?);
                op
            }
            TokenKind::Keyword(_) => {
                let mut sel = String::new();
                while let TokenKind::Keyword(kw) = self.peek().clone() {
                    self.bump();
                    if !matches!(self.peek(), TokenKind::Ident(_)) {
                        return Err(ParserError::MissingArgument {
                            part: kw,
                            span: self.span(),
                        });
                    }
                    sel.push_str(&kw);
                    params.push(self.parse_param()?);
                }
                sel
            }
            _ => return Err(self.unexpected(&["method selector"])),
        };

        let ret = if self.eat(&TokenKind::Caret) {
            Some(self.parse_type_name()?)
        } else {
            None
        };

        Ok(FunSig {
            loc: self.loc_from(start),
            sel,
            params,
            ret,
        })
    }

    fn parse_param(&mut self) -> ParserResult<Param> {
        let start = self.span();
        let name = self.expect_ident()?;
        let ty = self.parse_type_name()?;
        Ok(Param {
            loc: self.loc_from(start),
            name,
            ty,
        })
    }

    // ===== Type names =====

    /// Parses `["(" tname {"," tname} ")"] ["#" IDENT] IDENT {"&" | IDENT}`.
    pub fn parse_type_name(&mut self) -> ParserResult<TypeName> {
        let start = self.span();
        let mut args = Vec::new();
        if self.eat(&TokenKind::LParen) {
            loop {
                args.push(self.parse_type_name()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
        }

        let mut tn = self.parse_type_head(start, args)?;
        loop {
            if self.peek().is_amp() {
                self.bump();
                tn = TypeName::applied(self.loc_from(start), "&", vec![tn]);
            } else if self.peek().is_type_ident() || self.check(&TokenKind::Hash) {
                tn = self.parse_type_head(start, vec![tn])?;
            } else {
                return Ok(tn);
            }
        }
    }

    fn parse_type_head(&mut self, start: Span, args: Vec<TypeName>) -> ParserResult<TypeName> {
        let module = if self.eat(&TokenKind::Hash) {
            Some(self.expect_ident()?)
        } else {
            None
        };
        let name = match self.peek().clone() {
            TokenKind::Ident(name) if self.peek().is_type_ident() => {
                self.bump();
                name
            }
            TokenKind::Op(op) if op == "&" && !args.is_empty() => {
                self.bump();
                op
            }
            _ => return Err(ParserError::ExpectedType { span: self.span() }),
        };
        Ok(TypeName {
            loc: self.loc_from(start),
            module,
            name,
            args,
        })
    }

    // ===== Statements =====

    fn parse_stmts(&mut self) -> ParserResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !matches!(self.peek(), TokenKind::RBracket | TokenKind::Eof) {
            stmts.push(self.parse_stmt()?);
            if !self.eat(&TokenKind::Dot) {
                break;
            }
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> ParserResult<Stmt> {
        let start = self.span();
        if self.eat(&TokenKind::Caret) {
            let expr = self.parse_expr()?;
            return Ok(Stmt::Ret(Ret {
                loc: self.loc_from(start),
                expr,
            }));
        }

        if let TokenKind::Ident(name) = self.peek().clone() {
            let saved = self.pos;
            self.bump();
            let ty = if self.at_type_name() {
                self.parse_type_name().ok()
            } else {
                None
            };
            if self.eat(&TokenKind::Define) {
                let expr = self.parse_expr()?;
                return Ok(Stmt::Assign(Assign {
                    loc: self.loc_from(start),
                    name,
                    ty,
                    expr,
                }));
            }
            self.pos = saved;
        }

        Ok(Stmt::Expr(self.parse_expr()?))
    }

    // ===== Expressions =====

    /// Parses an expression including cascades.
    pub fn parse_expr(&mut self) -> ParserResult<Expr> {
        let start = self.span();
        let expr = self.parse_kw_expr()?;
        if !self.check(&TokenKind::Semi) {
            return Ok(expr);
        }

        let mut call = match expr {
            Expr::Call(call) if call.recv.is_some() => call,
            _ => return Err(self.unexpected(&["message send before ';'"])),
        };
        while self.eat(&TokenKind::Semi) {
            call.msgs.push(self.parse_msg()?);
        }
        call.loc = self.loc_from(start);
        Ok(Expr::Call(call))
    }

    /// One unary, binary or keyword message, as found after `;`.
    fn parse_msg(&mut self) -> ParserResult<Msg> {
        let start = self.span();
        match self.peek().clone() {
            TokenKind::Ident(sel) => {
                self.bump();
                Ok(Msg {
                    loc: self.loc_from(start),
                    sel,
                    args: Vec::new(),
                })
            }
            TokenKind::Op(sel) => {
                self.bump();
                let arg = self.parse_unary_expr()?;
                Ok(Msg {
                    loc: self.loc_from(start),
                    sel,
                    args: vec![arg],
                })
            }
            TokenKind::Keyword(_) => self.parse_kw_msg(),
            _ => Err(self.unexpected(&["message"])),
        }
    }

    fn parse_kw_msg(&mut self) -> ParserResult<Msg> {
        let start = self.span();
        let mut sel = String::new();
        let mut args = Vec::new();
        while let TokenKind::Keyword(kw) = self.peek().clone() {
            self.bump();
            sel.push_str(&kw);
            args.push(self.parse_bin_expr()?);
        }
        Ok(Msg {
            loc: self.loc_from(start),
            sel,
            args,
        })
    }

    fn parse_kw_expr(&mut self) -> ParserResult<Expr> {
        let start = self.span();
        if matches!(self.peek(), TokenKind::Keyword(_)) {
            let msg = self.parse_kw_msg()?;
            return Ok(Expr::Call(Call {
                loc: self.loc_from(start),
                recv: None,
                msgs: vec![msg],
            }));
        }

        let recv = self.parse_bin_expr()?;
        if !matches!(self.peek(), TokenKind::Keyword(_)) {
            return Ok(recv);
        }
        let msg = self.parse_kw_msg()?;
        Ok(Expr::Call(Call {
            loc: self.loc_from(start),
            recv: Some(Box::new(recv)),
            msgs: vec![msg],
        }))
    }

    fn parse_bin_expr(&mut self) -> ParserResult<Expr> {
        let start = self.span();
        let mut left = self.parse_unary_expr()?;
        while let TokenKind::Op(sel) = self.peek().clone() {
            let op_start = self.span();
            self.bump();
            let right = self.parse_unary_expr()?;
            let msg = Msg {
                loc: self.loc_from(op_start),
                sel,
                args: vec![right],
            };
            left = Expr::Call(Call {
                loc: self.loc_from(start),
                recv: Some(Box::new(left)),
                msgs: vec![msg],
            });
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> ParserResult<Expr> {
        let start = self.span();
        let mut expr = self.parse_primary()?;
        while let TokenKind::Ident(sel) = self.peek().clone() {
            let sel_span = self.span();
            self.bump();
            let msg = Msg {
                loc: self.loc(sel_span),
                sel,
                args: Vec::new(),
            };
            expr = Expr::Call(Call {
                loc: self.loc_from(start),
                recv: Some(Box::new(expr)),
                msgs: vec![msg],
            });
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParserResult<Expr> {
        let start = self.span();
        let lit = |p: &Self, text: String| Lit {
            loc: p.loc(start),
            text,
        };
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.bump();
                Ok(Expr::Ident(Ident {
                    loc: self.loc(start),
                    name,
                }))
            }
            TokenKind::Int(text) => {
                self.bump();
                Ok(Expr::Int(lit(self, text)))
            }
            TokenKind::Float(text) => {
                self.bump();
                Ok(Expr::Float(lit(self, text)))
            }
            TokenKind::Str(text) => {
                self.bump();
                Ok(Expr::Str(lit(self, text)))
            }
            TokenKind::LParen => {
                self.bump();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_block(),
            TokenKind::LBrace => self.parse_ctor(),
            _ => Err(ParserError::ExpectedExpression { span: start }),
        }
    }

    fn parse_block(&mut self) -> ParserResult<Expr> {
        let start = self.expect(TokenKind::LBracket)?;
        let mut params = Vec::new();
        if self.check(&TokenKind::Colon) {
            while self.check(&TokenKind::Colon) {
                let param_start = self.span();
                self.bump();
                let name = self.expect_ident()?;
                let ty = if self.at_type_name() {
                    Some(self.parse_type_name()?)
                } else {
                    None
                };
                params.push(BlockParam {
                    loc: self.loc_from(param_start),
                    name,
                    ty,
                });
            }
            self.expect(TokenKind::Bar)?;
        }
        let stmts = self.parse_stmts()?;
        self.expect(TokenKind::RBracket)?;
        Ok(Expr::Block(Block {
            loc: self.loc_from(start),
            params,
            stmts,
        }))
    }

    fn parse_ctor(&mut self) -> ParserResult<Expr> {
        let start = self.expect(TokenKind::LBrace)?;
        let ty = self.parse_type_name()?;
        self.expect(TokenKind::Bar)?;

        let mut case = None;
        let mut args = Vec::new();
        if let TokenKind::Keyword(kw) = self.peek().clone() {
            self.bump();
            case = Some(kw.trim_end_matches(':').to_string());
            args.push(self.parse_expr()?);
        } else if !self.check(&TokenKind::RBrace) {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace)?;

        Ok(Expr::Ctor(Ctor {
            loc: self.loc_from(start),
            ty,
            case,
            args,
        }))
    }
}

/// And-type members must all be `name: Type`.
fn into_field(case: Case) -> ParserResult<Field> {
    match case.ty {
        Some(ty) => Ok(Field {
            loc: case.loc,
            name: case.name,
            ty,
        }),
        None => Err(ParserError::UnexpectedToken {
            expected: vec!["field".into()],
            found: format!("identifier '{}'", case.name),
            span: case.loc.span,
        }),
    }
}
