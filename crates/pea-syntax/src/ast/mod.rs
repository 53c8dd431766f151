//! Abstract syntax tree.
//!
//! The tree is plain owned data. A parsed file is a list of [`Def`]s; a
//! module is the files of one directory. The checker keeps each definition
//! behind an `Rc` while it is being gathered, so nodes are `Clone` but are
//! rarely cloned.

pub mod def;
pub mod expr;
pub mod ty;

pub use def::{Case, Def, Field, FunDef, FunSig, Import, Param, Recv, TypeBody, TypeDef, TypeParam, ValDef};
pub use expr::{Assign, Block, BlockParam, Call, Ctor, Expr, Ident, Lit, Msg, Ret, Stmt};
pub use ty::TypeName;

use std::rc::Rc;

/// The definitions of one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub path: Rc<str>,
    pub defs: Vec<Def>,
}

impl File {
    /// Import paths in the order written.
    pub fn imports(&self) -> impl Iterator<Item = &Import> {
        self.defs.iter().filter_map(|def| match def {
            Def::Import(import) => Some(import),
            _ => None,
        })
    }
}

/// A parsed module: the files sharing one module path.
#[derive(Debug, Clone, PartialEq)]
pub struct Mod {
    /// Import path of the module, `""` for the universal module.
    pub path: String,
    pub files: Vec<File>,
}

impl Mod {
    #[must_use]
    pub fn new(path: impl Into<String>, files: Vec<File>) -> Self {
        Mod {
            path: path.into(),
            files,
        }
    }
}
