//! The instantiator.
//!
//! Three entry points produce canonical specializations:
//!
//! - [`instantiate_type`]: a generic type applied to type arguments
//! - [`instantiate_receiver`]: a method of a generic type, for one
//!   receiver instance
//! - [`instantiate_fun`]: a function or method applied to its own type
//!   arguments
//!
//! Each memoizes under a structural key, so equal requests yield the same
//! node. Instances are registered in the memo table and in their generic's
//! `insts` *before* anything is substituted into them: substituting a
//! recursive type reaches the instance again and must find it.

use pea_syntax::{Diagnostic, Loc};

use crate::check::decl::{gather_fun_sig, gather_type, gathering_alias_target};
use crate::context::State;
use crate::context::TypeKey;
use crate::context::subst::{Seen, bind, substitute_sig, substitute_kind, substitute_type_name};
use crate::types::{Fun, FunId, Recv, Stage, Type, TypeId, TypeKind, TypeName, TypeVarId};

/// Instantiates `ty` with `args`, following aliases.
///
/// Returns the instance, `ty` itself when there is nothing to apply, or
/// `None` when an error prevents it; the errors are returned alongside.
pub fn instantiate_type(
    state: &mut State,
    ty: TypeId,
    args: &[TypeName],
    loc: Option<&Loc>,
) -> (Option<TypeId>, Vec<Diagnostic>) {
    let mark = state.mark();
    let inst = inst_type(state, ty, args.to_vec(), loc);
    (inst, state.diags_since(mark))
}

/// Binds the parameters of the type declaring `fun` to the arguments of
/// `recv_ty` and returns the method specialized for that receiver.
pub fn instantiate_receiver(
    state: &mut State,
    recv_ty: TypeId,
    fun: FunId,
    loc: Option<&Loc>,
) -> (Option<FunId>, Vec<Diagnostic>) {
    let mark = state.mark();
    let inst = inst_recv(state, recv_ty, fun, loc);
    (inst, state.diags_since(mark))
}

/// Applies `fun` to type arguments for its own type parameters.
pub fn instantiate_fun(
    state: &mut State,
    fun: FunId,
    args: &[TypeName],
    loc: Option<&Loc>,
) -> (Option<FunId>, Vec<Diagnostic>) {
    let mark = state.mark();
    let inst = inst_fun(state, fun, args.to_vec(), loc);
    (inst, state.diags_since(mark))
}

fn spell(args: &[TypeName]) -> String {
    args.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Whether `args` are exactly the placeholders of `params`.
fn is_identity(state: &State, params: &[TypeVarId], args: &[TypeName]) -> bool {
    params.len() == args.len()
        && params
            .iter()
            .zip(args)
            .all(|(&tv, arg)| arg.ty == Some(state.store.tvars[tv].ty))
}

pub(crate) fn inst_type(
    state: &mut State,
    ty: TypeId,
    args: Vec<TypeName>,
    loc: Option<&Loc>,
) -> Option<TypeId> {
    let _trace = state.tracer.enabled().then(|| {
        let name = &state.store.types[ty].name;
        state.tracer.enter(format_args!("instantiate ({}) {name}", spell(&args)))
    });

    gather_type(state, ty);

    let t = &state.store.types[ty];
    let target = match &t.kind {
        TypeKind::Alias(target) => Some(target.clone()),
        // Re-entered from a type its own target reaches.
        _ if t.is_alias() => None,
        _ => return inst_generic(state, ty, args, loc),
    };
    let target = match target {
        Some(target) => target,
        None => gathering_alias_target(state, ty),
    };
    let target = target?;
    if args.is_empty() {
        return target.ty;
    }
    let binding = bind(&state.store.types[ty].params, &args);
    let target = substitute_type_name(state, &mut Seen::default(), &binding, &target);
    target.ty
}

/// Instantiates a generic that is not an alias.
fn inst_generic(state: &mut State, ty: TypeId, args: Vec<TypeName>, loc: Option<&Loc>) -> Option<TypeId> {
    let t = &state.store.types[ty];
    if args.is_empty() {
        return Some(ty);
    }
    if args.len() != t.params.len() {
        let message = format!(
            "wrong argument count: expected {}, got {}",
            t.params.len(),
            args.len()
        );
        state.error(loc.cloned(), message);
        return None;
    }
    if is_identity(state, &t.params, &args) {
        return Some(ty);
    }

    let key = TypeKey::Named {
        def: ty,
        args: args.iter().map(|arg| TypeKey::of_name(&state.store, arg)).collect(),
    };
    if let Some(&inst) = state.type_insts.get(&key) {
        return Some(inst);
    }

    let shell = Type {
        loc: t.loc.clone(),
        private: t.private,
        builtin: t.builtin,
        ref_def: t.ref_def,
        args,
        ..Type::skeleton(ty, &t.module, &t.name, t.arity)
    };
    let generic_stage = t.stage;
    let inst = state.store.types.alloc(shell);
    state.store.types[ty].insts.push(inst);
    state.type_insts.insert(key, inst);

    if generic_stage == Stage::Complete {
        fill_instance(state, inst);
    } else {
        state.pending.push(inst);
    }
    Some(inst)
}

/// Substitutes the generic's body into an instance shell.
pub(crate) fn fill_instance(state: &mut State, inst: TypeId) {
    let def = state.store.types[inst].def;
    let generic = &state.store.types[def];
    let binding = bind(&generic.params, &state.store.types[inst].args);
    let kind = generic.kind.clone();
    let tag = generic.tag;

    let mut seen = Seen::default();
    seen.insert(def, inst);
    let kind = substitute_kind(state, &mut seen, &binding, &kind);

    let t = &mut state.store.types[inst];
    t.kind = kind;
    t.tag = tag;
    t.stage = Stage::Complete;
}

/// Fills the instances of `def` created while it was being gathered.
pub(crate) fn fill_pending(state: &mut State, def: TypeId) {
    let (ready, waiting): (Vec<TypeId>, Vec<TypeId>) = state
        .pending
        .iter()
        .partition(|&&inst| state.store.types[inst].def == def);
    state.pending = waiting;
    for inst in ready {
        fill_instance(state, inst);
    }
}

fn mismatch(state: &mut State, expected: TypeId, got: TypeId, loc: Option<&Loc>) {
    let message = format!(
        "type mismatch: expected {}, got {}",
        state.store.display(expected),
        state.store.display(got)
    );
    state.error(loc.cloned(), message);
}

pub(crate) fn inst_recv(
    state: &mut State,
    recv_ty: TypeId,
    fun: FunId,
    loc: Option<&Loc>,
) -> Option<FunId> {
    gather_fun_sig(state, fun);

    let f = &state.store.funs[fun];
    let Some(recv) = f.recv.clone() else {
        return Some(fun);
    };
    let decl_ty = recv.ty?;
    if recv.params.is_empty() {
        if decl_ty != recv_ty {
            mismatch(state, decl_ty, recv_ty, loc);
            return None;
        }
        return Some(fun);
    }

    let _trace = state.tracer.enabled().then(|| {
        state.tracer.enter(format_args!(
            "instantiate {} for {}",
            f.sig.sel,
            state.store.display(recv_ty)
        ))
    });

    let actual = &state.store.types[recv_ty];
    if actual.def != state.store.types[decl_ty].def {
        mismatch(state, decl_ty, recv_ty, loc);
        return None;
    }
    let args: Vec<TypeName> = if actual.args.is_empty() {
        actual
            .params
            .iter()
            .map(|&tv| state.store.type_name(state.store.tvars[tv].ty))
            .collect()
    } else {
        actual.args.clone()
    };
    if args.len() != recv.params.len() {
        mismatch(state, decl_ty, recv_ty, loc);
        return None;
    }
    if is_identity(state, &recv.params, &args) {
        return Some(fun);
    }

    let generic = f.def;
    let key = (generic, TypeKey::of(&state.store, recv_ty));
    if let Some(&inst) = state.recv_insts.get(&key) {
        return Some(inst);
    }

    let sig = f.sig.clone();
    let shell = Fun {
        loc: f.loc.clone(),
        private: f.private,
        recv: Some(Recv {
            params: Vec::new(),
            ty: Some(recv_ty),
            ..recv.clone()
        }),
        tparams: f.tparams.clone(),
        builtin: f.builtin,
        stage: Stage::Complete,
        body_stage: Stage::Complete,
        ..Fun::skeleton(generic, &f.module, &f.sig.sel)
    };
    let inst = state.store.funs.alloc(shell);
    state.store.funs[generic].insts.push(inst);
    state.recv_insts.insert(key, inst);

    let binding = bind(&recv.params, &args);
    let sig = substitute_sig(state, &mut Seen::default(), &binding, &sig);
    state.store.funs[inst].sig = sig;
    Some(inst)
}

pub(crate) fn inst_fun(
    state: &mut State,
    fun: FunId,
    args: Vec<TypeName>,
    loc: Option<&Loc>,
) -> Option<FunId> {
    gather_fun_sig(state, fun);

    let f = &state.store.funs[fun];
    if f.tparams.is_empty() && args.is_empty() {
        return Some(fun);
    }
    if args.len() != f.tparams.len() {
        let message = format!(
            "wrong argument count: expected {}, got {}",
            f.tparams.len(),
            args.len()
        );
        state.error(loc.cloned(), message);
        return None;
    }
    if is_identity(state, &f.tparams, &args) {
        return Some(fun);
    }

    let _trace = state.tracer.enabled().then(|| {
        state
            .tracer
            .enter(format_args!("instantiate {} with ({})", f.sig.sel, spell(&args)))
    });

    let key = (
        fun,
        args.iter().map(|arg| TypeKey::of_name(&state.store, arg)).collect(),
    );
    if let Some(&inst) = state.fun_insts.get(&key) {
        return Some(inst);
    }

    let generic = f.def;
    let sig = f.sig.clone();
    let binding = bind(&f.tparams, &args);
    let shell = Fun {
        loc: f.loc.clone(),
        private: f.private,
        recv: f.recv.clone(),
        builtin: f.builtin,
        stage: Stage::Complete,
        body_stage: Stage::Complete,
        ..Fun::skeleton(generic, &f.module, &f.sig.sel)
    };
    let inst = state.store.funs.alloc(shell);
    state.store.funs[generic].insts.push(inst);
    state.fun_insts.insert(key, inst);

    let sig = substitute_sig(state, &mut Seen::default(), &binding, &sig);
    state.store.funs[inst].sig = sig;
    Some(inst)
}
