//! Type names and relations between types.
//!
//! This module implements the type-level queries of checking:
//! - Resolving written type names to canonical types
//! - Method lookup by receiver type and selector
//! - Virtual-type conformance and bound enforcement
//! - Argument compatibility

use std::mem;
use std::rc::Rc;

use pea_syntax::{Loc, ast};

use super::decl::{gather_fun_sig, gather_type};
use crate::context::state::BoundCheck;
use crate::context::subst::{Seen, bind, substitute_type};
use crate::context::{Env, State};
use crate::infer::inst::inst_type;
use crate::types::{BuiltinMeth, Def, Fun, FunId, Store, TypeId, TypeKind, TypeName};

fn head(name: &ast::TypeName) -> String {
    match &name.module {
        Some(module) => format!("#{module} {}", name.name),
        None => name.name.clone(),
    }
}

/// Resolves a written type name in `env`.
///
/// Errors are reported and leave `ty` empty; a name with an unresolved
/// argument is left unresolved without a further report.
pub(crate) fn resolve_type_name(state: &mut State, env: &Env<'_>, name: &ast::TypeName) -> TypeName {
    let loc = Some(name.loc.clone());
    let args: Vec<TypeName> = name
        .args
        .iter()
        .map(|arg| resolve_type_name(state, env, arg))
        .collect();
    let mut resolved = TypeName {
        loc: loc.clone(),
        module: name.module.clone(),
        name: name.name.clone(),
        args,
        ty: None,
    };

    if name.module.is_none() && resolved.args.is_empty() {
        if let Some(tv) = env.lookup_tvar(&state.store, &name.name) {
            state.used_tvars.insert(tv);
            resolved.ty = Some(state.store.tvars[tv].ty);
            return resolved;
        }
    }

    let def = match env.find_type(state, name.module.as_deref(), &name.name, resolved.args.len()) {
        Ok(Some(def)) => def,
        Ok(None) => {
            state.error(loc, format!("undefined type: {}", head(name)));
            return resolved;
        }
        Err(module) => {
            state.error(loc, format!("undefined module: #{module}"));
            return resolved;
        }
    };
    if resolved.args.iter().any(|arg| arg.ty.is_none()) {
        return resolved;
    }

    resolved.ty = inst_type(state, def, resolved.args.clone(), loc.as_ref());
    if resolved.ty.is_some() {
        defer_bounds(state, env, def, &resolved.args, loc.as_ref());
    }
    resolved
}

/// Queues the bounds of `def`'s parameters for checking against `args`.
fn defer_bounds(state: &mut State, env: &Env<'_>, def: TypeId, args: &[TypeName], loc: Option<&Loc>) {
    let params = state.store.types[def].params.clone();
    if params.is_empty() {
        return;
    }
    let binding = bind(&params, args);
    for (&tv, arg) in params.iter().zip(args) {
        let Some(arg) = arg.ty else { continue };
        for bound in state.store.tvars[tv].bounds.clone() {
            let Some(bound) = bound.ty else { continue };
            if let Some(bound) = substitute_type(state, &mut Seen::default(), &binding, bound) {
                state.bound_checks.push(BoundCheck {
                    arg,
                    bound,
                    loc: loc.cloned(),
                    scope: Rc::clone(env.file),
                });
            }
        }
    }
}

/// Enforces the queued bounds.
pub(crate) fn run_bound_checks(state: &mut State) {
    for check in mem::take(&mut state.bound_checks) {
        let env = Env::new(&check.scope);
        check_bound(state, &env, check.arg, check.bound, check.loc.as_ref());
    }
}

/// Reports `arg` if it does not implement `bound`.
pub(crate) fn check_bound(state: &mut State, env: &Env<'_>, arg: TypeId, bound: TypeId, loc: Option<&Loc>) {
    if let Some(sel) = missing_method(state, env, arg, bound) {
        let message = format!(
            "{} does not implement {}: missing {sel}",
            state.store.display(arg),
            state.store.display(bound)
        );
        state.error(loc.cloned(), message);
    }
}

/// The first selector of virtual type `virt` that `ty` has no method for.
/// `None` when `ty` implements `virt`, or `virt` is not virtual.
pub(crate) fn missing_method(state: &mut State, env: &Env<'_>, ty: TypeId, virt: TypeId) -> Option<String> {
    gather_type(state, virt);
    let TypeKind::Virts(sigs) = &state.store.types[virt].kind else {
        return None;
    };
    if ty == virt {
        return None;
    }
    let sels: Vec<String> = sigs.iter().map(|sig| sig.sel.clone()).collect();

    if let Some(tv) = state.store.types[ty].var {
        let store = &state.store;
        let provided: Vec<&str> = store.tvars[tv]
            .bounds
            .iter()
            .filter_map(|bound| bound.ty)
            .filter_map(|bound| match &store.types[bound].kind {
                TypeKind::Virts(sigs) => Some(sigs),
                _ => None,
            })
            .flatten()
            .map(|sig| sig.sel.as_str())
            .collect();
        return sels.into_iter().find(|sel| !provided.contains(&sel.as_str()));
    }

    sels.into_iter().find(|sel| {
        lookup_method(state, env, ty, sel).is_none()
            && state
                .store
                .deref(ty)
                .is_none_or(|inner| lookup_method(state, env, inner, sel).is_none())
    })
}

/// Whether calling `fun` with selector `sel` reaches it. Case methods
/// are matched ignoring colons: a case without a payload still takes its
/// handler as a keyword argument.
pub(crate) fn sel_matches(fun: &Fun, sel: &str) -> bool {
    if fun.sig.sel == sel {
        return true;
    }
    fun.builtin == Some(BuiltinMeth::Case)
        && fun.sig.sel.chars().filter(|&c| c != ':').eq(sel.chars().filter(|&c| c != ':'))
}

pub(crate) fn is_method(store: &Store, fun: FunId) -> bool {
    let f = &store.funs[fun];
    f.recv.is_some() || f.src.as_ref().is_some_and(|src| src.ast.recv.is_some())
}

/// Whether a method declared for receiver type `decl` accepts `recv_ty`:
/// the same type, or for generic receivers, an instance of the same
/// generic.
fn accepts(store: &Store, fun: FunId, recv_ty: TypeId) -> bool {
    let Some(recv) = &store.funs[fun].recv else {
        return false;
    };
    match recv.ty {
        Some(decl) if recv.params.is_empty() => decl == recv_ty,
        Some(decl) => store.types[decl].def == store.types[recv_ty].def,
        None => false,
    }
}

/// Finds the visible method `sel` of `recv_ty`. The result is the generic
/// method; instantiate it for the receiver before use.
pub(crate) fn lookup_method(state: &mut State, env: &Env<'_>, recv_ty: TypeId, sel: &str) -> Option<FunId> {
    let candidates: Vec<FunId> = env
        .visible(state)
        .filter_map(|def| match def {
            Def::Fun(fun) => Some(fun),
            _ => None,
        })
        .filter(|&fun| is_method(&state.store, fun) && sel_matches(&state.store.funs[fun], sel))
        .collect();

    for fun in candidates {
        gather_fun_sig(state, fun);
        if accepts(&state.store, fun, recv_ty) {
            return Some(fun);
        }
    }
    None
}

/// Whether a value of type `from` can be passed where `to` is expected.
pub(crate) fn convertible(state: &mut State, env: &Env<'_>, from: TypeId, to: TypeId) -> bool {
    if from == to {
        return true;
    }
    let store = &state.store;
    if store.deref(to) == Some(from) || store.deref(from) == Some(to) {
        return true;
    }
    if !matches!(store.types[to].kind, TypeKind::Virts(_)) {
        return false;
    }
    missing_method(state, env, from, to).is_none()
}

/// Reports a mismatch unless `got` converts to `expected`. Unknown types
/// have already been reported.
pub(crate) fn expect_type(
    state: &mut State,
    env: &Env<'_>,
    got: Option<TypeId>,
    expected: Option<TypeId>,
    loc: Option<&Loc>,
) {
    let (Some(got), Some(expected)) = (got, expected) else {
        return;
    };
    if !convertible(state, env, got, expected) {
        let message = format!(
            "type mismatch: expected {}, got {}",
            state.store.display(expected),
            state.store.display(got)
        );
        state.error(loc.cloned(), message);
    }
}
