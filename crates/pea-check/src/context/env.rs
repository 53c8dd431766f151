//! Lookup scopes.
//!
//! Names resolve innermost first:
//!
//! 1. type variables of the enclosing definitions, innermost first
//! 2. definitions of the module being checked, private ones included
//! 3. public definitions of the file's imports (a `#name` qualifier
//!    restricts the search to that import)
//! 4. the universal module
//!
//! Scopes are immutable once built. A [`FileScope`] is shared by every
//! definition of its file through an `Rc`, so a definition can be gathered
//! lazily, from anywhere, in the scope it was written in.

use std::rc::Rc;

use pea_syntax::Loc;

use super::state::State;
use crate::types::{Def, Store, TypeId, TypeVarId};

/// The definitions of one module.
#[derive(Debug)]
pub struct ModScope {
    pub path: String,
    pub defs: Vec<Def>,
}

/// An import statement of a file, resolved.
#[derive(Debug, Clone)]
pub struct Imported {
    /// The name used in `#name` qualifiers.
    pub name: String,
    pub path: String,
    pub loc: Loc,
    pub defs: Rc<[Def]>,
}

/// What a file sees: its module and its own imports.
#[derive(Debug)]
pub struct FileScope {
    pub module: Rc<ModScope>,
    pub imports: Vec<Imported>,
}

impl FileScope {
    #[must_use]
    pub fn new(module: Rc<ModScope>, imports: Vec<Imported>) -> Self {
        FileScope { module, imports }
    }

    fn import(&self, name: &str) -> Option<&Imported> {
        self.imports.iter().find(|import| import.name == name)
    }
}

/// A lookup context: a file scope plus the type variables in scope.
#[derive(Clone, Copy)]
pub struct Env<'a> {
    pub file: &'a Rc<FileScope>,
    parent: Option<&'a Env<'a>>,
    tvars: &'a [TypeVarId],
}

impl<'a> Env<'a> {
    #[must_use]
    pub fn new(file: &'a Rc<FileScope>) -> Self {
        Env {
            file,
            parent: None,
            tvars: &[],
        }
    }

    /// A child scope binding `tvars`.
    #[must_use]
    pub fn with_tvars(&'a self, tvars: &'a [TypeVarId]) -> Env<'a> {
        Env {
            file: self.file,
            parent: Some(self),
            tvars,
        }
    }

    /// Path of the module being checked.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.file.module.path
    }

    pub fn lookup_tvar(&self, store: &Store, name: &str) -> Option<TypeVarId> {
        let mut env = Some(self);
        while let Some(e) = env {
            if let Some(&tv) = e.tvars.iter().rev().find(|&&tv| store.tvars[tv].name == name) {
                return Some(tv);
            }
            env = e.parent;
        }
        None
    }

    /// Whether `tv` is bound by this scope or an enclosing one.
    pub fn binds_tvar(&self, tv: TypeVarId) -> bool {
        let mut env = Some(self);
        while let Some(e) = env {
            if e.tvars.contains(&tv) {
                return true;
            }
            env = e.parent;
        }
        false
    }

    /// The first visible definition accepted by `pred`, honoring a module
    /// qualifier. `Err` means the qualifier names no import of this file.
    ///
    /// # Errors
    ///
    /// Returns the unknown qualifier.
    pub fn find<'m>(
        &self,
        state: &State,
        module: Option<&'m str>,
        pred: impl Fn(&Store, Def) -> bool,
    ) -> Result<Option<Def>, &'m str> {
        let store = &state.store;
        if let Some(name) = module {
            let import = self.file.import(name).ok_or(name)?;
            return Ok(import
                .defs
                .iter()
                .copied()
                .find(|&def| !store.def_private(def) && pred(store, def)));
        }
        Ok(self.visible(state).find(|&def| pred(store, def)))
    }

    /// Every definition visible without a qualifier, in lookup order.
    pub fn visible<'s>(&'s self, state: &'s State) -> impl Iterator<Item = Def> + 's {
        let store = &state.store;
        let local = self.file.module.defs.iter().copied();
        let imported = self
            .file
            .imports
            .iter()
            .flat_map(|import| import.defs.iter().copied())
            .filter(move |&def| !store.def_private(def));
        local.chain(imported).chain(state.universe.iter().copied())
    }

    /// Finds a type by name and arity.
    ///
    /// # Errors
    ///
    /// Returns the unknown qualifier.
    pub fn find_type<'m>(
        &self,
        state: &State,
        module: Option<&'m str>,
        name: &str,
        arity: usize,
    ) -> Result<Option<TypeId>, &'m str> {
        let found = self.find(state, module, |store, def| match def {
            Def::Type(ty) => {
                let t = &store.types[ty];
                t.name == name && t.arity == arity
            }
            _ => false,
        })?;
        Ok(match found {
            Some(Def::Type(ty)) => Some(ty),
            _ => None,
        })
    }

    /// A type of the universal module. While the universal module itself is
    /// being checked its definitions are the module's own.
    pub fn universe_type(&self, state: &State, name: &str, arity: usize) -> Option<TypeId> {
        let defs: &[Def] = if state.universe.is_empty() {
            &self.file.module.defs
        } else {
            &state.universe
        };
        defs.iter().find_map(|&def| match def {
            Def::Type(ty) => {
                let t = &state.store.types[ty];
                (t.name == name && t.arity == arity).then_some(ty)
            }
            _ => None,
        })
    }
}
