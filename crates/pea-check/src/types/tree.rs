//! Checked statements and expressions.
//!
//! The same shapes as the AST, with every name resolved: identifiers carry
//! their [`Var`](super::Var), messages their target [`Fun`](super::Fun),
//! and every expression its type. A `None` type marks an expression whose
//! error has already been reported.

use pea_syntax::Loc;

use super::{FunId, TypeId, TypeName, VarId};

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Ret(Ret),
    Assign(Assign),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ret {
    pub loc: Option<Loc>,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub loc: Option<Loc>,
    pub var: VarId,
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

impl Expr {
    #[must_use]
    pub fn ty(&self) -> Option<TypeId> {
        match self {
            Expr::Call(e) => e.ty,
            Expr::Ctor(e) => e.ty,
            Expr::Block(e) => e.ty,
            Expr::Ident(e) => e.ty,
            Expr::Int(e) | Expr::Float(e) | Expr::Str(e) => e.ty,
        }
    }

    #[must_use]
    pub fn loc(&self) -> Option<&Loc> {
        match self {
            Expr::Call(e) => e.loc.as_ref(),
            Expr::Ctor(e) => e.loc.as_ref(),
            Expr::Block(e) => e.loc.as_ref(),
            Expr::Ident(e) => e.loc.as_ref(),
            Expr::Int(e) | Expr::Float(e) | Expr::Str(e) => e.loc.as_ref(),
        }
    }
}

impl Stmt {
    /// The type of an expression statement; other statements have none.
    #[must_use]
    pub fn expr_ty(&self) -> Option<TypeId> {
        match self {
            Stmt::Expr(expr) => expr.ty(),
            Stmt::Ret(_) | Stmt::Assign(_) => None,
        }
    }
}

/// A cascade of messages to one receiver, or a free function call when
/// `recv` is `None`. The call's type is that of the last message.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub loc: Option<Loc>,
    pub recv: Option<Box<Expr>>,
    pub msgs: Vec<Msg>,
    pub ty: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Msg {
    pub loc: Option<Loc>,
    pub sel: String,
    pub args: Vec<Expr>,
    pub fun: Option<FunId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ctor {
    pub loc: Option<Loc>,
    pub type_name: TypeName,
    /// Index of the case, for or-type constructors.
    pub case: Option<usize>,
    pub args: Vec<Expr>,
    pub ty: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub loc: Option<Loc>,
    pub params: Vec<VarId>,
    pub stmts: Vec<Stmt>,
    pub ty: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub loc: Option<Loc>,
    pub name: String,
    pub var: Option<VarId>,
    pub ty: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lit {
    pub loc: Option<Loc>,
    pub text: String,
    pub ty: Option<TypeId>,
}
