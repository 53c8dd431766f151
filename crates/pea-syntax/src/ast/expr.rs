//! Statements and expressions.

use super::ty::TypeName;
use crate::span::{Loc, Located};

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `^expr`
    Ret(Ret),
    /// `x := expr` or `x Int := expr`
    Assign(Assign),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ret {
    pub loc: Loc,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub loc: Loc,
    pub name: String,
    pub ty: Option<TypeName>,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Call(Call),
    Ctor(Ctor),
    Block(Block),
    Ident(Ident),
    Int(Lit),
    Float(Lit),
    Str(Lit),
}

/// Messages sent to one receiver; more than one message is a cascade.
/// A call without a receiver is a free function call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub loc: Loc,
    pub recv: Option<Box<Expr>>,
    pub msgs: Vec<Msg>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Msg {
    pub loc: Loc,
    pub sel: String,
    pub args: Vec<Expr>,
}

/// `{Point | 1, 2}`, `{Int Opt | some: 5}`, `{Int Array | 1, 2, 3}`
#[derive(Debug, Clone, PartialEq)]
pub struct Ctor {
    pub loc: Loc,
    pub ty: TypeName,
    /// Case keyword, for `{T | case: value}`.
    pub case: Option<String>,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub loc: Loc,
    pub params: Vec<BlockParam>,
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockParam {
    pub loc: Loc,
    pub name: String,
    pub ty: Option<TypeName>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub loc: Loc,
    pub name: String,
}

/// Literal text as written (string literals already unescaped).
#[derive(Debug, Clone, PartialEq)]
pub struct Lit {
    pub loc: Loc,
    pub text: String,
}

impl Located for Expr {
    fn loc(&self) -> &Loc {
        match self {
            Expr::Call(e) => &e.loc,
            Expr::Ctor(e) => &e.loc,
            Expr::Block(e) => &e.loc,
            Expr::Ident(e) => &e.loc,
            Expr::Int(e) | Expr::Float(e) | Expr::Str(e) => &e.loc,
        }
    }
}

impl Located for Stmt {
    fn loc(&self) -> &Loc {
        match self {
            Stmt::Ret(s) => &s.loc,
            Stmt::Assign(s) => &s.loc,
            Stmt::Expr(e) => e.loc(),
        }
    }
}
