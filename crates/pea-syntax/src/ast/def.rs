//! Module-level definitions.

use std::rc::Rc;

use super::expr::Stmt;
use super::ty::TypeName;
use crate::span::{Loc, Located};

#[derive(Debug, Clone, PartialEq)]
pub enum Def {
    Import(Import),
    Val(Rc<ValDef>),
    Fun(Rc<FunDef>),
    Type(Rc<TypeDef>),
}

impl Located for Def {
    fn loc(&self) -> &Loc {
        match self {
            Def::Import(def) => &def.loc,
            Def::Val(def) => &def.loc,
            Def::Fun(def) => &def.loc,
            Def::Type(def) => &def.loc,
        }
    }
}

/// `import "path"`
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub loc: Loc,
    pub path: String,
}

impl Import {
    /// The name the import is referred to by in `#name` qualifiers: the
    /// last path component.
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// `val name Type := [ statements ]`
#[derive(Debug, Clone, PartialEq)]
pub struct ValDef {
    pub loc: Loc,
    pub private: bool,
    pub name: String,
    pub ty: Option<TypeName>,
    pub init: Vec<Stmt>,
}

/// A `func` or, with a receiver, a `meth`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunDef {
    pub loc: Loc,
    pub private: bool,
    pub recv: Option<Recv>,
    /// The function's own type parameters. Methods written in source only
    /// have receiver parameters; synthesized methods may have both.
    pub tparams: Vec<TypeParam>,
    pub sig: FunSig,
    /// `None` for declarations without a body.
    pub body: Option<Vec<Stmt>>,
}

/// Receiver of a method: `(T) List` in `meth (T) List [...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Recv {
    pub loc: Loc,
    pub params: Vec<TypeParam>,
    pub module: Option<String>,
    pub name: String,
}

/// `type (T) Name ...`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub loc: Loc,
    pub private: bool,
    pub params: Vec<TypeParam>,
    pub name: String,
    pub body: TypeBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeBody {
    /// No body at all; only the universal module's builtin types.
    Opaque,
    /// `:= Target`
    Alias(TypeName),
    /// `{ x: Int y: Int }`
    Fields(Vec<Field>),
    /// `{ none | some: T }`
    Cases(Vec<Case>),
    /// `{ [asString ^String] }`
    Virts(Vec<FunSig>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub loc: Loc,
    pub name: String,
    pub ty: TypeName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub loc: Loc,
    pub name: String,
    pub ty: Option<TypeName>,
}

/// A type parameter with its optional virtual-type bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    pub loc: Loc,
    pub name: String,
    pub bounds: Vec<TypeName>,
}

/// `at: i Int put: x T ^Nil`
#[derive(Debug, Clone, PartialEq)]
pub struct FunSig {
    pub loc: Loc,
    pub sel: String,
    pub params: Vec<Param>,
    pub ret: Option<TypeName>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub loc: Loc,
    pub name: String,
    pub ty: TypeName,
}
