//! The substitution engine.
//!
//! Substitution copies part of the definition graph with type variables
//! replaced by type names, sharing everything that does not change.
//!
//! # Design
//!
//! - **Binding**: type variable → type name. A bound variable's whole type
//!   name is replaced, so the module qualifier and arguments come from the
//!   binding too, not just the resolved type.
//! - **Seen**: type → the copy standing for it. A recursive generic is
//!   registered as its own instance before its body is substituted, so
//!   references back to it inside the body resolve to the copy instead of
//!   descending again.
//! - **No memo**: changed type names are re-instantiated through
//!   [`inst_type`], which owns the memo tables.

use super::state::State;
use super::FxMap;
use crate::infer::inst::inst_type;
use crate::types::{FunSig, TypeId, TypeKind, TypeName, TypeVarId, Var, VarId};

pub type Binding = FxMap<TypeVarId, TypeName>;

pub type Seen = FxMap<TypeId, TypeId>;

/// Substitutes a type name.
pub fn substitute_type_name(
    state: &mut State,
    seen: &mut Seen,
    binding: &Binding,
    name: &TypeName,
) -> TypeName {
    let Some(ty) = name.ty else {
        return name.clone();
    };

    if let Some(tv) = state.store.types[ty].var {
        return match binding.get(&tv) {
            Some(bound) => TypeName {
                loc: name.loc.clone(),
                ..bound.clone()
            },
            None => name.clone(),
        };
    }

    let args: Vec<TypeName> = name
        .args
        .iter()
        .map(|arg| substitute_type_name(state, seen, binding, arg))
        .collect();

    if let Some(&copy) = seen.get(&ty) {
        return TypeName {
            args,
            ty: Some(copy),
            ..name.clone()
        };
    }
    if args == name.args {
        return name.clone();
    }

    let def = state.store.types[ty].def;
    let ty = if args.iter().any(|arg| arg.ty.is_none()) {
        None
    } else {
        inst_type(state, def, args.clone(), name.loc.as_ref())
    };
    TypeName {
        loc: name.loc.clone(),
        module: name.module.clone(),
        name: name.name.clone(),
        args,
        ty,
    }
}

/// Substitutes a resolved type.
pub fn substitute_type(
    state: &mut State,
    seen: &mut Seen,
    binding: &Binding,
    ty: TypeId,
) -> Option<TypeId> {
    if let Some(&copy) = seen.get(&ty) {
        return Some(copy);
    }
    let name = state.store.type_name(ty);
    substitute_type_name(state, seen, binding, &name).ty
}

/// Substitutes a variable's type. The variable is shared when its type
/// does not change.
pub fn substitute_var(state: &mut State, seen: &mut Seen, binding: &Binding, var: VarId) -> VarId {
    let v = &state.store.vars[var];
    let Some(name) = v.type_name.clone().or_else(|| v.ty.map(|ty| state.store.type_name(ty)))
    else {
        return var;
    };
    let substituted = substitute_type_name(state, seen, binding, &name);
    if substituted == name {
        return var;
    }

    let v = &state.store.vars[var];
    let copy = Var {
        loc: v.loc.clone(),
        name: v.name.clone(),
        ty: substituted.ty,
        type_name: Some(substituted),
        role: v.role,
        index: v.index,
    };
    state.store.vars.alloc(copy)
}

pub fn substitute_sig(state: &mut State, seen: &mut Seen, binding: &Binding, sig: &FunSig) -> FunSig {
    let params = sig
        .params
        .iter()
        .map(|&param| substitute_var(state, seen, binding, param))
        .collect();
    let ret = sig
        .ret
        .as_ref()
        .map(|ret| substitute_type_name(state, seen, binding, ret));
    FunSig {
        loc: sig.loc.clone(),
        sel: sig.sel.clone(),
        params,
        ret,
    }
}

/// Substitutes the body of a type: alias target, fields, cases or
/// virtual signatures.
pub fn substitute_kind(
    state: &mut State,
    seen: &mut Seen,
    binding: &Binding,
    kind: &TypeKind,
) -> TypeKind {
    match kind {
        TypeKind::Opaque => TypeKind::Opaque,
        TypeKind::Alias(target) => TypeKind::Alias(
            target
                .as_ref()
                .map(|target| substitute_type_name(state, seen, binding, target)),
        ),
        TypeKind::Fields(vars) => TypeKind::Fields(
            vars.iter()
                .map(|&var| substitute_var(state, seen, binding, var))
                .collect(),
        ),
        TypeKind::Cases(vars) => TypeKind::Cases(
            vars.iter()
                .map(|&var| substitute_var(state, seen, binding, var))
                .collect(),
        ),
        TypeKind::Virts(sigs) => TypeKind::Virts(
            sigs.iter()
                .map(|sig| substitute_sig(state, seen, binding, sig))
                .collect(),
        ),
    }
}

/// A binding of `params` to `args`, position by position.
#[must_use]
pub fn bind(params: &[TypeVarId], args: &[TypeName]) -> Binding {
    params.iter().copied().zip(args.iter().cloned()).collect()
}
