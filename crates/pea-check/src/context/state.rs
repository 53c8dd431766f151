//! The mutable checking state.

use std::mem;
use std::rc::Rc;

use pea_log::Tracer;
use pea_syntax::{Diagnostic, Loc};

use super::env::FileScope;
use super::{FxMap, FxSet};
use crate::config::Config;
use crate::import::{ImportState, Loader};
use crate::types::{Def, FunId, Store, TypeId, TypeName, TypeVarId};

/// Structural identity of a type, used to memoize instances.
///
/// Two type names with equal keys denote the same type no matter which
/// aliases they were written through. Generics and type variables key by
/// identity, so a redeclared generic never meets the instances of the
/// definition it replaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Var(TypeVarId),
    Named { def: TypeId, args: Vec<TypeKey> },
    /// A name whose resolution failed.
    Invalid,
}

impl TypeKey {
    #[must_use]
    pub fn of(store: &Store, ty: TypeId) -> Self {
        let t = &store.types[ty];
        if let Some(tv) = t.var {
            return TypeKey::Var(tv);
        }
        TypeKey::Named {
            def: t.def,
            args: t.args.iter().map(|arg| TypeKey::of_name(store, arg)).collect(),
        }
    }

    #[must_use]
    pub fn of_name(store: &Store, name: &TypeName) -> Self {
        name.ty.map_or(TypeKey::Invalid, |ty| TypeKey::of(store, ty))
    }

    /// Whether the key mentions a type for which `stale` holds.
    pub(crate) fn mentions(&self, store: &Store, stale: &impl Fn(TypeId) -> bool) -> bool {
        match self {
            TypeKey::Var(tv) => stale(store.tvars[*tv].ty),
            TypeKey::Named { def, args } => stale(*def) || args.iter().any(|arg| arg.mentions(store, stale)),
            TypeKey::Invalid => false,
        }
    }
}

/// Universal types the checker needs by identity.
#[derive(Debug, Clone)]
pub struct Builtins {
    pub nil: TypeId,
    pub bool: TypeId,
    /// The configured `Int`, alias already followed.
    pub int: TypeId,
    pub float: TypeId,
    pub string: TypeId,
    pub ref_: TypeId,
    pub array: TypeId,
    /// `Fun` generics, by arity minus one.
    pub funs: Vec<TypeId>,
}

impl Builtins {
    /// The `Fun` generic taking `params` parameters.
    #[must_use]
    pub fn fun(&self, params: usize) -> Option<TypeId> {
        self.funs.get(params).copied()
    }
}

/// Everything checking mutates, threaded by `&mut` through every
/// checking function.
pub struct State {
    pub store: Store,
    pub(crate) int_bits: u32,
    pub(crate) float_bits: u32,
    pub(crate) tracer: Tracer,
    pub(crate) diags: Vec<Diagnostic>,
    /// Definitions of the universal module; empty while it is checked.
    pub(crate) universe: Rc<[Def]>,
    pub(crate) builtins: Option<Builtins>,
    pub(crate) loader: Box<dyn Loader>,
    pub(crate) imports: ImportState,
    pub(crate) type_insts: FxMap<TypeKey, TypeId>,
    /// Receiver instances, by generic method and receiver type.
    pub(crate) recv_insts: FxMap<(FunId, TypeKey), FunId>,
    pub(crate) fun_insts: FxMap<(FunId, Vec<TypeKey>), FunId>,
    /// Aliases being resolved, outermost first.
    pub(crate) alias_stack: Vec<TypeId>,
    /// Instances created while their generic was still being gathered.
    pub(crate) pending: Vec<TypeId>,
    pub(crate) used_tvars: FxSet<TypeVarId>,
    /// Values and functions each definition of the current module uses.
    pub(crate) deps: FxMap<Def, Vec<Def>>,
    /// Bounds to enforce once every signature of the module is gathered.
    pub(crate) bound_checks: Vec<BoundCheck>,
}

/// A type argument that must implement the virtual type bounding its
/// parameter.
#[derive(Debug)]
pub(crate) struct BoundCheck {
    pub arg: TypeId,
    pub bound: TypeId,
    pub loc: Option<Loc>,
    pub scope: Rc<FileScope>,
}

impl State {
    #[must_use]
    pub fn new(config: Config) -> Self {
        State {
            store: Store::new(),
            int_bits: config.int_size.bits(),
            float_bits: config.float_size.bits(),
            tracer: Tracer::new(config.trace),
            diags: Vec::new(),
            universe: Rc::from(Vec::new()),
            builtins: None,
            loader: config.loader,
            imports: ImportState::default(),
            type_insts: FxMap::default(),
            recv_insts: FxMap::default(),
            fun_insts: FxMap::default(),
            alias_stack: Vec::new(),
            pending: Vec::new(),
            used_tvars: FxSet::default(),
            deps: FxMap::default(),
            bound_checks: Vec::new(),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn universe(&self) -> &[Def] {
        &self.universe
    }

    #[must_use]
    pub fn builtins(&self) -> Option<&Builtins> {
        self.builtins.as_ref()
    }

    pub(crate) fn error(&mut self, loc: Option<Loc>, message: impl Into<String>) {
        self.diags.push(Diagnostic::error(loc, message));
    }

    pub(crate) fn report(&mut self, diag: Diagnostic) {
        self.diags.push(diag);
    }

    /// Position in the diagnostic list, for [`State::diags_since`].
    pub(crate) fn mark(&self) -> usize {
        self.diags.len()
    }

    /// Removes and returns the diagnostics reported after `mark`.
    pub(crate) fn diags_since(&mut self, mark: usize) -> Vec<Diagnostic> {
        self.diags.split_off(mark.min(self.diags.len()))
    }

    /// Starts a fresh diagnostic list, returning the current one.
    pub(crate) fn swap_diags(&mut self, diags: Vec<Diagnostic>) -> Vec<Diagnostic> {
        mem::replace(&mut self.diags, diags)
    }

    pub(crate) fn use_def(&mut self, owner: Option<Def>, used: Def) {
        if let Some(owner) = owner {
            let deps = self.deps.entry(owner).or_default();
            if !deps.contains(&used) {
                deps.push(used);
            }
        }
    }

    /// Spells `ty` as a resolved type name located at `loc`.
    pub(crate) fn name_at(&self, ty: TypeId, loc: Option<&Loc>) -> TypeName {
        let mut name = self.store.type_name(ty);
        name.loc = loc.cloned();
        name
    }
}
