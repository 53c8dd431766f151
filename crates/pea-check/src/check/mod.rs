//! The checker driver.
//!
//! Checking one module runs these passes in order:
//!
//! 1. resolve the imports of every file
//! 2. declare a `Reserved` node per definition, synthesized methods included
//! 3. report duplicate definitions
//! 4. gather types, then function signatures, then values, then bodies
//! 5. enforce the type-parameter bounds queued while gathering
//! 6. order the values for initialization
//!
//! Gathering is lazy, so step 4 only visits what earlier steps did not
//! already reach. A module with any error produces no [`Mod`].

pub(crate) mod decl;
pub(crate) mod expr;
pub(crate) mod order;
pub(crate) mod stmt;
pub(crate) mod ty;

use std::mem;
use std::rc::Rc;

use pea_syntax::{Diagnostic, ast, loader};

use self::decl::{check_duplicates, check_fun_body, declare_module, gather_fun_sig, gather_type, gather_val};
use self::order::sort_vals;
use self::ty::run_bound_checks;
use crate::builtin::{canonical_int, resolve_builtins, universe_source};
use crate::config::Config;
use crate::context::{Imported, State};
use crate::import::{import_module, strip_sources};
use crate::types::{Def, FunId, Mod, Store, TypeId};

/// Checks `module` with the session's universal module and imports.
pub(crate) fn check_module(state: &mut State, module: &ast::Mod) -> Result<Mod, Vec<Diagnostic>> {
    let _trace = state
        .tracer
        .enabled()
        .then(|| state.tracer.enter(format_args!("check module {:?}", module.path)));

    let types_from = state.store.types.len();
    let funs_from = state.store.funs.len();
    let pending_from = state.pending.len();
    let saved_diags = state.swap_diags(Vec::new());
    let saved_deps = mem::take(&mut state.deps);
    let saved_bounds = mem::take(&mut state.bound_checks);

    let mut imports = Vec::with_capacity(module.files.len());
    for file in &module.files {
        let mut resolved = Vec::new();
        for import in file.imports() {
            match import_module(state, &import.path) {
                Ok(defs) => resolved.push(Imported {
                    name: import.name().to_string(),
                    path: import.path.clone(),
                    loc: import.loc.clone(),
                    defs,
                }),
                Err(err) => {
                    for diag in err.into_diagnostics(Some(import.loc.clone())) {
                        state.report(diag);
                    }
                }
            }
        }
        imports.push(resolved);
    }

    let defs = declare_module(state, module, imports);
    check_duplicates(state, &defs);

    for &def in &defs {
        if let Def::Type(ty) = def {
            gather_type(state, ty);
        }
    }
    for &def in &defs {
        if let Def::Fun(fun) = def {
            gather_fun_sig(state, fun);
        }
    }
    for &def in &defs {
        if let Def::Val(val) = def {
            gather_val(state, val);
        }
    }
    for &def in &defs {
        if let Def::Fun(fun) = def {
            check_fun_body(state, fun);
        }
    }
    run_bound_checks(state);

    let int = canonical_int(state, &defs);
    let vals: Vec<_> = defs
        .iter()
        .filter_map(|&def| match def {
            Def::Val(val) => Some(val),
            _ => None,
        })
        .collect();
    let vals = sort_vals(state, &vals);

    state.deps = saved_deps;
    state.bound_checks = saved_bounds;
    let diags = state.swap_diags(saved_diags);
    if diags.iter().any(Diagnostic::is_error) {
        pea_log::debug!("{:?}: {} errors", module.path, diags.len());
        state.pending.truncate(pending_from);
        discard_instances(state, &module.path, types_from, funs_from);
        return Err(diags);
    }

    pea_log::debug!("checked {:?} ({} definitions)", module.path, defs.len());
    Ok(Mod {
        path: module.path.clone(),
        ast: Some(module.clone()),
        defs,
        vals,
        int,
    })
}

/// Forgets every memoized instance that mentions a definition the failed
/// module `path` declared, and unlinks those instances from the generics
/// of other modules. Nodes from `types_from`/`funs_from` on are this
/// check's.
fn discard_instances(state: &mut State, path: &str, types_from: usize, funs_from: usize) {
    let store = &state.store;
    let stale_ty = |ty: TypeId| ty.index() >= types_from && store.types[ty].module == path;
    let stale_fun = |fun: FunId| fun.index() >= funs_from && store.funs[fun].module == path;

    let mut types = Vec::new();
    state.type_insts.retain(|key, &mut inst| {
        let stale = key.mentions(store, &stale_ty);
        if stale {
            types.push(inst);
        }
        !stale
    });
    let mut funs = Vec::new();
    state.recv_insts.retain(|(generic, key), &mut inst| {
        let stale = stale_fun(*generic) || key.mentions(store, &stale_ty);
        if stale {
            funs.push(inst);
        }
        !stale
    });
    state.fun_insts.retain(|(generic, keys), &mut inst| {
        let stale = stale_fun(*generic) || keys.iter().any(|key| key.mentions(store, &stale_ty));
        if stale {
            funs.push(inst);
        }
        !stale
    });
    pea_log::trace!("{path:?}: discarded {} type and {} function instances", types.len(), funs.len());

    for inst in types {
        let def = state.store.types[inst].def;
        state.store.types[def].insts.retain(|&other| other != inst);
    }
    for inst in funs {
        let def = state.store.funs[inst].def;
        state.store.funs[def].insts.retain(|&other| other != inst);
    }
}

/// A checking session: the universal module, the node store shared by
/// every module checked, and the import cache.
///
/// # Examples
///
/// ```
/// use pea_check::{Config, Session};
///
/// let mut session = Session::new(Config::default()).expect("universe");
/// let module = session
///     .check_source("point", "type Point { x: Int y: Int }\nfunc [origin ^Point | ^{Point | 0, 0}]")
///     .expect("checks");
/// assert_eq!(module.defs.len(), 2);
///
/// let errors = session.check_source("bad", "val x Int := [\"one\"]").unwrap_err();
/// assert_eq!(errors[0].message, "type mismatch: expected Int64, got String");
/// ```
pub struct Session {
    state: State,
}

impl Session {
    /// Builds the universal module for `config`'s widths.
    ///
    /// # Errors
    ///
    /// Fails only if the universal module itself does not check.
    pub fn new(config: Config) -> Result<Self, Vec<Diagnostic>> {
        let source = universe_source(config.int_size, config.float_size);
        let mut state = State::new(config);

        let ast = loader::parse_mod("", &[("universe.pea", &source)])
            .map_err(|err| vec![Diagnostic::from(err)])?;
        let traced = state.tracer.set_enabled(false);
        let universe = check_module(&mut state, &ast);
        state.tracer.set_enabled(traced);
        let universe = universe?;

        strip_sources(&mut state.store, &universe.defs);
        let defs: Rc<[Def]> = Rc::from(universe.defs);
        state.builtins = resolve_builtins(&mut state, &defs);
        if state.builtins.is_none() {
            return Err(vec![Diagnostic::error(None, "incomplete universal module")]);
        }
        state.universe = Rc::clone(&defs);
        state.imports.cache.insert(String::new(), Some(defs));

        pea_log::debug!("universal module ready ({} definitions)", state.universe.len());
        Ok(Session { state })
    }

    /// Checks a parsed module under import path `path`.
    ///
    /// # Errors
    ///
    /// Returns every diagnostic if the module has any error.
    pub fn check(&mut self, path: &str, mut module: ast::Mod) -> Result<Mod, Vec<Diagnostic>> {
        module.path = path.to_string();
        pea_log::info!("checking {:?}", path);
        self.state.imports.stack.push(path.to_string());
        let checked = check_module(&mut self.state, &module);
        self.state.imports.stack.pop();
        checked
    }

    /// Parses `source` as the single file `<path>.pea`, then checks it.
    ///
    /// # Errors
    ///
    /// Returns the syntax error, or every diagnostic of the check.
    pub fn check_source(&mut self, path: &str, source: &str) -> Result<Mod, Vec<Diagnostic>> {
        let file = format!("{path}.pea");
        let module = loader::parse_mod(path, &[(&file, source)]).map_err(|err| vec![Diagnostic::from(err)])?;
        self.check(path, module)
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.state.store
    }

    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// The state the instantiation entry points take.
    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    /// Definitions of the universal module.
    #[must_use]
    pub fn universe(&self) -> &[Def] {
        self.state.universe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BuiltinType, TypeKind};

    fn session() -> Session {
        Session::new(Config::default()).expect("universal module checks")
    }

    fn messages(result: Result<Mod, Vec<Diagnostic>>) -> Vec<String> {
        match result {
            Ok(_) => Vec::new(),
            Err(diags) => diags.into_iter().map(|d| d.message).collect(),
        }
    }

    #[test]
    fn test_universe_builtins() {
        let session = session();
        let builtins = session.state().builtins().expect("builtins");
        let store = session.store();
        assert_eq!(store.types[builtins.int].builtin, Some(BuiltinType::Int(64)));
        assert_eq!(store.types[builtins.float].builtin, Some(BuiltinType::Float(64)));
        assert_eq!(builtins.funs.len(), crate::builtin::MAX_FUN_ARITY);
        assert!(matches!(store.types[builtins.bool].kind, TypeKind::Cases(_)));
    }

    #[test]
    fn test_int_width_follows_config() {
        let session = Session::new(Config::default().with_int_size(crate::IntSize::I16)).expect("universe");
        let int = session.state().builtins().expect("builtins").int;
        assert_eq!(session.store().types[int].name, "Int16");
    }

    #[test]
    fn test_empty_module() {
        let module = session().check_source("empty", "").expect("checks");
        assert!(module.defs.is_empty());
        assert!(module.int.is_some());
    }

    #[test]
    fn test_errors_accumulate() {
        let errors = messages(session().check_source(
            "m",
            "func [f ^Nope | ^1]\nfunc [g ^Int | ^missing]\nval x := [1]\nval x := [2]",
        ));
        assert!(errors.contains(&"undefined type: Nope".to_string()), "{errors:?}");
        assert!(errors.contains(&"undefined: missing".to_string()), "{errors:?}");
        assert!(errors.contains(&"x redefined".to_string()), "{errors:?}");
    }

    #[test]
    fn test_method_call_and_literal_width() {
        let mut session = session();
        let module = session
            .check_source("m", "val small Int8 := [100]\nfunc [double: x Int ^Int | ^x + x]")
            .expect("checks");
        assert_eq!(module.vals.len(), 1);

        let errors = messages(session.check_source("n", "val small Int8 := [300]"));
        assert_eq!(errors, ["300 overflows Int8"]);
    }

    #[test]
    fn test_failed_module_is_not_adopted() {
        let mut session = session();
        assert!(session.check_source("m", "val x := [y]").is_err());
        assert!(session.check_source("m", "val x := [1]").is_ok());
    }
}
