//! The checked definition graph.
//!
//! Checking turns AST definitions into a graph of [`Type`]s, [`Fun`]s,
//! [`Val`]s and [`Var`]s. The graph is cyclic in every direction (a type's
//! fields mention the type, generics list their instances, instances point
//! back at their generic) so nodes live in the arenas of a [`Store`] and
//! refer to each other by id. Identity is id equality.

pub mod display;
pub mod graph;
pub mod tree;

pub use display::TypeDisplay;
pub use graph::{
    BuiltinMeth, BuiltinType, Def, Fun, FunSig, Mod, Recv, Src, Stage, Type, TypeKind, TypeName,
    TypeVar, Val, Var, VarRole,
};
pub use tree::{Assign, Block, Call, Ctor, Expr, Ident, Lit, Msg, Ret, Stmt};

use std::sync::atomic::{AtomicU64, Ordering};

use pea_mem::{Arena, Id};
use pea_syntax::Loc;

pub type TypeId = Id<Type>;
pub type FunId = Id<Fun>;
pub type ValId = Id<Val>;
pub type VarId = Id<Var>;
pub type TypeVarId = Id<TypeVar>;

/// All nodes of every module checked in one session.
#[derive(Debug, Default)]
pub struct Store {
    pub types: Arena<Type>,
    pub funs: Arena<Fun>,
    pub vals: Arena<Val>,
    pub vars: Arena<Var>,
    pub tvars: Arena<TypeVar>,
}

/// Arena lengths at one point in time; see [`Store::rewind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreMark {
    types: usize,
    funs: usize,
    vals: usize,
    vars: usize,
    tvars: usize,
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mark(&self) -> StoreMark {
        StoreMark {
            types: self.types.len(),
            funs: self.funs.len(),
            vals: self.vals.len(),
            vars: self.vars.len(),
            tvars: self.tvars.len(),
        }
    }

    /// Drops every node allocated since `mark`. Nodes older than the mark
    /// must not refer to the dropped ones.
    pub fn rewind(&mut self, mark: StoreMark) {
        self.types.truncate(mark.types);
        self.funs.truncate(mark.funs);
        self.vals.truncate(mark.vals);
        self.vars.truncate(mark.vars);
        self.tvars.truncate(mark.tvars);
    }

    /// Allocates a type whose `def` is itself.
    pub fn new_type(&mut self, build: impl FnOnce(TypeId) -> Type) -> TypeId {
        let id = self.types.reserve();
        self.types.fill(id, build(id));
        id
    }

    /// Allocates a function whose `def` is itself.
    pub fn new_fun(&mut self, build: impl FnOnce(FunId) -> Fun) -> FunId {
        let id = self.funs.reserve();
        self.funs.fill(id, build(id));
        id
    }

    /// Allocates a type variable together with its placeholder type.
    pub fn new_type_var(&mut self, module: &str, name: &str, loc: Option<Loc>) -> TypeVarId {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);

        let tv = self.tvars.reserve();
        let ty = self.new_type(|id| Type {
            loc: loc.clone(),
            var: Some(tv),
            stage: Stage::Complete,
            ..Type::skeleton(id, module, name, 0)
        });
        self.tvars.fill(
            tv,
            TypeVar {
                loc,
                name: name.to_string(),
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                bounds: Vec::new(),
                ty,
            },
        );
        tv
    }

    /// A type name spelling out `ty`, with the type already resolved.
    #[must_use]
    pub fn type_name(&self, ty: TypeId) -> TypeName {
        let t = &self.types[ty];
        TypeName {
            loc: None,
            module: None,
            name: t.name.clone(),
            args: t.args.clone(),
            ty: Some(ty),
        }
    }

    /// Displays a type the way diagnostics spell it.
    #[must_use]
    pub fn display(&self, ty: TypeId) -> TypeDisplay<'_> {
        TypeDisplay { store: self, ty }
    }

    #[must_use]
    pub fn is_ref(&self, ty: TypeId) -> bool {
        self.types[ty].builtin == Some(BuiltinType::Ref)
    }

    /// The referenced type of a `T&` instance.
    #[must_use]
    pub fn deref(&self, ty: TypeId) -> Option<TypeId> {
        if !self.is_ref(ty) {
            return None;
        }
        self.types[ty].args.first().and_then(|arg| arg.ty)
    }

    /// The generic's type parameter a placeholder type stands for.
    #[must_use]
    pub fn type_var_of(&self, ty: TypeId) -> Option<TypeVarId> {
        self.types[ty].var
    }

    #[must_use]
    pub fn def_loc(&self, def: Def) -> Option<Loc> {
        match def {
            Def::Val(id) => self.vals[id].loc.clone(),
            Def::Fun(id) => self.funs[id].loc.clone(),
            Def::Type(id) => self.types[id].loc.clone(),
        }
    }

    /// The name a definition is referred to by: value name, selector, or
    /// type name.
    #[must_use]
    pub fn def_name(&self, def: Def) -> &str {
        match def {
            Def::Val(id) => &self.vals[id].name,
            Def::Fun(id) => &self.funs[id].sig.sel,
            Def::Type(id) => &self.types[id].name,
        }
    }

    #[must_use]
    pub fn def_private(&self, def: Def) -> bool {
        match def {
            Def::Val(id) => self.vals[id].private,
            Def::Fun(id) => self.funs[id].private,
            Def::Type(id) => self.types[id].private,
        }
    }
}
