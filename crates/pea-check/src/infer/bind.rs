//! Inferring type arguments at call sites.

use crate::context::subst::Binding;
use crate::types::{Store, TypeId, TypeVarId};

/// Binds the type variables in `tparams` that occur in `param` by matching
/// it against the argument type `arg`.
///
/// Matching is structural: a variable binds to whatever stands in its
/// position, instances of the same generic match argument by argument, and
/// a reference on either side is looked through when the other side has
/// none. The first binding of a variable wins; conflicts surface later as
/// argument mismatches.
pub fn bind_type(
    store: &Store,
    binding: &mut Binding,
    tparams: &[TypeVarId],
    param: TypeId,
    arg: TypeId,
) {
    if let Some(tv) = store.types[param].var {
        if tparams.contains(&tv) && !binding.contains_key(&tv) {
            binding.insert(tv, store.type_name(arg));
        }
        return;
    }

    match (store.deref(param), store.deref(arg)) {
        (None, Some(inner)) => return bind_type(store, binding, tparams, param, inner),
        (Some(inner), None) => return bind_type(store, binding, tparams, inner, arg),
        _ => {}
    }

    let (p, a) = (&store.types[param], &store.types[arg]);
    if p.def != a.def || p.args.len() != a.args.len() {
        return;
    }
    for (p_arg, a_arg) in p.args.iter().zip(&a.args) {
        if let (Some(p_ty), Some(a_ty)) = (p_arg.ty, a_arg.ty) {
            bind_type(store, binding, tparams, p_ty, a_ty);
        }
    }
}

/// Whether `ty` mentions one of `tparams`.
#[must_use]
pub fn mentions(store: &Store, ty: TypeId, tparams: &[TypeVarId]) -> bool {
    let t = &store.types[ty];
    if let Some(tv) = t.var {
        return tparams.contains(&tv);
    }
    t.args
        .iter()
        .filter_map(|arg| arg.ty)
        .any(|arg| mentions(store, arg, tparams))
}
