//! Expression checking.
//!
//! Expressions are checked against an optional expected type. The
//! expectation never makes an expression fail by itself; it only guides
//! literals (`x Int8 := 5`) and block parameters (`[:x | x + 1]` passed
//! where an `(Int, Int) Fun` is expected). Compatibility with the expected
//! type is checked by the caller.

use std::mem;

use pea_syntax::{Loc, ast};

use super::decl::{gather_fun_sig, gather_type, gather_val};
use super::stmt::check_stmts;
use super::ty::{check_bound, expect_type, is_method, lookup_method, resolve_type_name};
use crate::context::subst::Binding;
use crate::context::{Env, State};
use crate::infer::bind::{bind_type, mentions};
use crate::infer::inst::{inst_fun, inst_recv, inst_type};
use crate::types::{
    Block, BuiltinType, Call, Ctor, Def, Expr, FunId, Ident, Lit, Msg, Stmt, TypeId, TypeKind,
    TypeName, TypeVarId, ValId, Var, VarId, VarRole,
};

/// Per-body checking state: the lexical scopes of locals and what the
/// body returns.
pub(crate) struct BodyCx<'e> {
    pub env: &'e Env<'e>,
    scopes: Vec<Vec<VarId>>,
    /// Every variable the body declares, in order.
    pub locals: Vec<VarId>,
    /// Expected type of `^` statements; `None` when unknown.
    pub ret: Option<TypeId>,
    /// The definition whose dependencies are recorded.
    pub owner: Option<Def>,
    /// Type parameters of the callee whose arguments are being checked.
    inferring: Vec<TypeVarId>,
}

impl<'e> BodyCx<'e> {
    pub fn new(env: &'e Env<'e>, ret: Option<TypeId>, owner: Option<Def>) -> Self {
        BodyCx {
            env,
            scopes: vec![Vec::new()],
            locals: Vec::new(),
            ret,
            owner,
            inferring: Vec::new(),
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Brings `var` into the innermost scope.
    pub fn bind(&mut self, var: VarId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.push(var);
        }
    }

    /// Declares a new local or block parameter.
    pub fn declare(&mut self, var: VarId) {
        self.bind(var);
        self.locals.push(var);
    }

    pub fn lookup(&self, state: &State, name: &str) -> Option<VarId> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .copied()
            .find(|&var| state.store.vars[var].name == name)
    }

    /// Number of declared variables with `role`, the index of the next.
    pub fn count(&self, state: &State, role: VarRole) -> usize {
        self.locals
            .iter()
            .filter(|&&var| state.store.vars[var].role == role)
            .count()
    }
}

pub(crate) fn check_expr(
    state: &mut State,
    cx: &mut BodyCx<'_>,
    expr: &ast::Expr,
    expected: Option<TypeId>,
) -> Expr {
    match expr {
        ast::Expr::Int(lit) => Expr::Int(check_int(state, lit, expected)),
        ast::Expr::Float(lit) => {
            let ty = expected
                .filter(|&ty| matches!(state.store.types[ty].builtin, Some(BuiltinType::Float(_))))
                .or_else(|| state.builtins.as_ref().map(|b| b.float));
            Expr::Float(Lit {
                loc: Some(lit.loc.clone()),
                text: lit.text.clone(),
                ty,
            })
        }
        ast::Expr::Str(lit) => Expr::Str(Lit {
            loc: Some(lit.loc.clone()),
            text: lit.text.clone(),
            ty: state.builtins.as_ref().map(|b| b.string),
        }),
        ast::Expr::Ident(ident) => check_ident(state, cx, ident),
        ast::Expr::Call(call) => check_call(state, cx, call, expected),
        ast::Expr::Ctor(ctor) => check_ctor(state, cx, ctor),
        ast::Expr::Block(block) => check_block(state, cx, block, expected),
    }
}

fn check_int(state: &mut State, lit: &ast::Lit, expected: Option<TypeId>) -> Lit {
    let is_int = |state: &State, ty: TypeId| {
        matches!(
            state.store.types[ty].builtin,
            Some(BuiltinType::Int(_) | BuiltinType::UInt(_))
        )
    };
    let ty = expected
        .filter(|&ty| is_int(state, ty))
        .or_else(|| state.builtins.as_ref().map(|b| b.int));
    let loc = Some(lit.loc.clone());

    if let Some(ty) = ty {
        let max: u128 = match state.store.types[ty].builtin {
            Some(BuiltinType::Int(bits)) => (1 << (bits - 1)) - 1,
            Some(BuiltinType::UInt(bits)) => (1 << bits) - 1,
            _ => u128::MAX,
        };
        if lit.text.parse::<u128>().map_or(true, |value| value > max) {
            let message = format!("{} overflows {}", lit.text, state.store.display(ty));
            state.error(loc.clone(), message);
        }
    }
    Lit {
        loc,
        text: lit.text.clone(),
        ty,
    }
}

fn check_ident(state: &mut State, cx: &mut BodyCx<'_>, ident: &ast::Ident) -> Expr {
    let loc = Some(ident.loc.clone());
    let resolved = |var: Option<VarId>, ty: Option<TypeId>| {
        Expr::Ident(Ident {
            loc: loc.clone(),
            name: ident.name.clone(),
            var,
            ty,
        })
    };

    if let Some(var) = cx.lookup(state, &ident.name) {
        return resolved(Some(var), state.store.vars[var].ty);
    }
    if let Some(val) = find_val(state, cx.env, &ident.name) {
        gather_val(state, val);
        state.use_def(cx.owner, Def::Val(val));
        let var = state.store.vals[val].var;
        return resolved(Some(var), state.store.vars[var].ty);
    }
    if find_free_fun(state, cx.env, &ident.name).is_some() {
        let call = ast::Call {
            loc: ident.loc.clone(),
            recv: None,
            msgs: vec![ast::Msg {
                loc: ident.loc.clone(),
                sel: ident.name.clone(),
                args: Vec::new(),
            }],
        };
        return check_call(state, cx, &call, None);
    }

    state.error(loc.clone(), format!("undefined: {}", ident.name));
    resolved(None, None)
}

pub(crate) fn find_val(state: &State, env: &Env<'_>, name: &str) -> Option<ValId> {
    match env.find(state, None, |store, def| matches!(def, Def::Val(v) if store.vals[v].name == name)) {
        Ok(Some(Def::Val(val))) => Some(val),
        _ => None,
    }
}

fn find_free_fun(state: &State, env: &Env<'_>, sel: &str) -> Option<FunId> {
    let found = env.find(state, None, |store, def| {
        matches!(def, Def::Fun(f) if store.funs[f].sig.sel == sel && !is_method(store, f))
    });
    match found {
        Ok(Some(Def::Fun(fun))) => Some(fun),
        _ => None,
    }
}

/// Checks arguments with nothing to check them against, so that their own
/// errors are still found.
fn check_blind(state: &mut State, cx: &mut BodyCx<'_>, args: &[ast::Expr]) -> Vec<Expr> {
    args.iter().map(|arg| check_expr(state, cx, arg, None)).collect()
}

fn check_call(state: &mut State, cx: &mut BodyCx<'_>, call: &ast::Call, expected: Option<TypeId>) -> Expr {
    let recv = call
        .recv
        .as_ref()
        .map(|recv| Box::new(check_expr(state, cx, recv, None)));
    let recv_ty = recv.as_ref().and_then(|recv| recv.ty());

    let mut msgs = Vec::with_capacity(call.msgs.len());
    let mut ty = None;
    for (i, msg) in call.msgs.iter().enumerate() {
        let expected = if i + 1 == call.msgs.len() { expected } else { None };
        let (checked, msg_ty) = match (&recv, recv_ty) {
            (None, _) => check_free_call(state, cx, msg, expected),
            (Some(_), Some(recv_ty)) => check_send(state, cx, recv_ty, msg, expected),
            (Some(_), None) => (blind_msg(state, cx, msg), None),
        };
        msgs.push(checked);
        ty = msg_ty;
    }

    Expr::Call(Call {
        loc: Some(call.loc.clone()),
        recv,
        msgs,
        ty,
    })
}

fn blind_msg(state: &mut State, cx: &mut BodyCx<'_>, msg: &ast::Msg) -> Msg {
    Msg {
        loc: Some(msg.loc.clone()),
        sel: msg.sel.clone(),
        args: check_blind(state, cx, &msg.args),
        fun: None,
    }
}

fn check_free_call(
    state: &mut State,
    cx: &mut BodyCx<'_>,
    msg: &ast::Msg,
    expected: Option<TypeId>,
) -> (Msg, Option<TypeId>) {
    let Some(fun) = find_free_fun(state, cx.env, &msg.sel) else {
        state.error(Some(msg.loc.clone()), format!("undefined: {}", msg.sel));
        return (blind_msg(state, cx, msg), None);
    };
    gather_fun_sig(state, fun);
    state.use_def(cx.owner, Def::Fun(fun));
    apply(state, cx, fun, msg, expected)
}

/// What a message to a receiver reaches.
enum Target {
    Method(FunId),
    Field(Option<TypeId>),
}

fn check_send(
    state: &mut State,
    cx: &mut BodyCx<'_>,
    recv_ty: TypeId,
    msg: &ast::Msg,
    expected: Option<TypeId>,
) -> (Msg, Option<TypeId>) {
    let loc = Some(msg.loc.clone());
    match resolve_send(state, cx, recv_ty, &msg.sel, loc.as_ref()) {
        Some(Target::Method(fun)) => apply(state, cx, fun, msg, expected),
        Some(Target::Field(ty)) => {
            let args = check_blind(state, cx, &msg.args);
            (
                Msg {
                    loc,
                    sel: msg.sel.clone(),
                    args,
                    fun: None,
                },
                ty,
            )
        }
        None => (blind_msg(state, cx, msg), None),
    }
}

/// Finds what `sel` sent to `recv_ty` reaches: a method (instantiated for
/// the receiver), or for unary selectors a field. References without a
/// matching method are looked through.
fn resolve_send(
    state: &mut State,
    cx: &mut BodyCx<'_>,
    recv_ty: TypeId,
    sel: &str,
    loc: Option<&Loc>,
) -> Option<Target> {
    let mut ty = recv_ty;
    loop {
        if let Some(tv) = state.store.types[ty].var {
            for bound in state.store.tvars[tv].bounds.clone() {
                let Some(bound) = bound.ty else { continue };
                if let Some(fun) = lookup_method(state, cx.env, bound, sel) {
                    return inst_recv(state, bound, fun, loc).map(Target::Method);
                }
            }
            break;
        }

        if let Some(fun) = lookup_method(state, cx.env, ty, sel) {
            let generic = state.store.funs[fun].def;
            state.use_def(cx.owner, Def::Fun(generic));
            return inst_recv(state, ty, fun, loc).map(Target::Method);
        }
        if let TypeKind::Fields(fields) = &state.store.types[ty].kind {
            if let Some(&field) = fields.iter().find(|&&f| state.store.vars[f].name == sel) {
                return Some(Target::Field(state.store.vars[field].ty));
            }
        }
        match state.store.deref(ty) {
            Some(inner) => ty = inner,
            None => break,
        }
    }

    let message = format!("{} has no method {sel}", state.store.display(recv_ty));
    state.error(loc.cloned(), message);
    None
}

/// Checks the arguments of a call of `fun`, infers its type arguments,
/// and returns the message with its result type.
fn apply(
    state: &mut State,
    cx: &mut BodyCx<'_>,
    fun: FunId,
    msg: &ast::Msg,
    expected: Option<TypeId>,
) -> (Msg, Option<TypeId>) {
    let loc = Some(msg.loc.clone());
    let f = &state.store.funs[fun];
    let skip = usize::from(f.recv.is_some());
    let params: Vec<VarId> = f.sig.params.iter().skip(skip).copied().collect();
    let tparams = f.tparams.clone();

    if params.len() != msg.args.len() {
        let message = format!(
            "wrong argument count: expected {}, got {}",
            params.len(),
            msg.args.len()
        );
        state.error(loc, message);
        return (blind_msg(state, cx, msg), None);
    }

    let saved = mem::replace(&mut cx.inferring, tparams.clone());
    let mut binding = Binding::default();
    let mut args = Vec::with_capacity(params.len());
    for (arg, &param) in msg.args.iter().zip(&params) {
        let param_ty = state.store.vars[param].ty;
        let checked = check_expr(state, cx, arg, param_ty);
        if let (Some(p), Some(a)) = (param_ty, checked.ty()) {
            bind_type(&state.store, &mut binding, &tparams, p, a);
        }
        args.push(checked);
    }
    if let Some(ret) = state.store.funs[fun].sig.ret.as_ref().and_then(|ret| ret.ty) {
        if let Some(expected) = expected {
            bind_type(&state.store, &mut binding, &tparams, ret, expected);
        }
    }
    cx.inferring = saved;

    let inst = if tparams.is_empty() {
        Some(fun)
    } else {
        infer(state, cx.env, fun, &tparams, &binding, loc.as_ref())
    };

    let ty = match inst {
        Some(inst) => {
            let sig = state.store.funs[inst].sig.clone();
            for (arg, &param) in args.iter().zip(sig.params.iter().skip(skip)) {
                let param_ty = state.store.vars[param].ty;
                expect_type(state, cx.env, arg.ty(), param_ty, arg.loc());
            }
            match &sig.ret {
                Some(ret) => ret.ty,
                None => state.builtins.as_ref().map(|b| b.nil),
            }
        }
        None => None,
    };

    let msg = Msg {
        loc,
        sel: msg.sel.clone(),
        args,
        fun: inst,
    };
    (msg, ty)
}

/// Instantiates `fun` with the inferred type arguments, enforcing bounds.
fn infer(
    state: &mut State,
    env: &Env<'_>,
    fun: FunId,
    tparams: &[TypeVarId],
    binding: &Binding,
    loc: Option<&Loc>,
) -> Option<FunId> {
    let mut args = Vec::with_capacity(tparams.len());
    for &tv in tparams {
        match binding.get(&tv) {
            Some(arg) => args.push(arg.clone()),
            None => {
                let message = format!("cannot infer {}", state.store.tvars[tv].name);
                state.error(loc.cloned(), message);
                return None;
            }
        }
    }

    for (&tv, arg) in tparams.iter().zip(&args) {
        let Some(arg) = arg.ty else { continue };
        for bound in state.store.tvars[tv].bounds.clone() {
            if let Some(bound) = bound.ty {
                check_bound(state, env, arg, bound, loc);
            }
        }
    }
    inst_fun(state, fun, args, loc)
}

fn check_ctor(state: &mut State, cx: &mut BodyCx<'_>, ctor: &ast::Ctor) -> Expr {
    let loc = Some(ctor.loc.clone());
    let type_name = resolve_type_name(state, cx.env, &ctor.ty);
    let Some(ty) = type_name.ty else {
        let args = check_blind(state, cx, &ctor.args);
        return Expr::Ctor(Ctor {
            loc,
            type_name,
            case: None,
            args,
            ty: None,
        });
    };
    gather_type(state, ty);

    let t = &state.store.types[ty];
    let (case, args) = if t.builtin == Some(BuiltinType::Array) {
        let elem = t.args.first().and_then(|arg| arg.ty);
        let args = check_each(state, cx, &ctor.args, &vec![elem; ctor.args.len()]);
        (None, args)
    } else {
        match (&t.kind, &ctor.case) {
            (TypeKind::Fields(fields), None) => {
                let expected: Vec<Option<TypeId>> =
                    fields.iter().map(|&f| state.store.vars[f].ty).collect();
                if expected.len() == ctor.args.len() {
                    (None, check_each(state, cx, &ctor.args, &expected))
                } else {
                    let message = format!(
                        "wrong argument count: expected {}, got {}",
                        expected.len(),
                        ctor.args.len()
                    );
                    state.error(loc.clone(), message);
                    (None, check_blind(state, cx, &ctor.args))
                }
            }
            (TypeKind::Cases(cases), Some(name)) => {
                let cases = cases.clone();
                match cases.iter().position(|&c| state.store.vars[c].name == *name) {
                    Some(index) if state.store.vars[cases[index]].type_name.is_some() => {
                        let payload = state.store.vars[cases[index]].ty;
                        (Some(index), check_each(state, cx, &ctor.args, &[payload]))
                    }
                    Some(_) => {
                        state.error(loc.clone(), format!("case {name} has no value"));
                        (None, check_blind(state, cx, &ctor.args))
                    }
                    None => {
                        let message = format!("{} has no case {name}", state.store.display(ty));
                        state.error(loc.clone(), message);
                        (None, check_blind(state, cx, &ctor.args))
                    }
                }
            }
            (TypeKind::Cases(cases), None) => {
                let bare = match ctor.args.as_slice() {
                    [ast::Expr::Ident(ident)] => cases.iter().position(|&c| {
                        let case = &state.store.vars[c];
                        case.name == ident.name && case.type_name.is_none()
                    }),
                    _ => None,
                };
                match bare {
                    Some(index) => (Some(index), Vec::new()),
                    None => {
                        let message = format!("cannot construct {}", state.store.display(ty));
                        state.error(loc.clone(), message);
                        (None, check_blind(state, cx, &ctor.args))
                    }
                }
            }
            _ => {
                let message = format!("cannot construct {}", state.store.display(ty));
                state.error(loc.clone(), message);
                (None, check_blind(state, cx, &ctor.args))
            }
        }
    };

    Expr::Ctor(Ctor {
        loc,
        type_name,
        case,
        args,
        ty: Some(ty),
    })
}

/// Checks `args` against `expected`, position by position.
fn check_each(
    state: &mut State,
    cx: &mut BodyCx<'_>,
    args: &[ast::Expr],
    expected: &[Option<TypeId>],
) -> Vec<Expr> {
    args.iter()
        .zip(expected)
        .map(|(arg, &expected)| {
            let checked = check_expr(state, cx, arg, expected);
            expect_type(state, cx.env, checked.ty(), expected, checked.loc());
            checked
        })
        .collect()
}

/// Parameter and result types an expected `Fun` instance suggests for a
/// block with `params` parameters. Types still being inferred suggest
/// nothing.
fn suggested(state: &State, cx: &BodyCx<'_>, expected: Option<TypeId>, params: usize) -> Vec<Option<TypeId>> {
    let Some(expected) = expected else {
        return vec![None; params + 1];
    };
    let t = &state.store.types[expected];
    if t.builtin != Some(BuiltinType::Fun) || t.args.len() != params + 1 {
        return vec![None; params + 1];
    }
    t.args
        .iter()
        .map(|arg| arg.ty.filter(|&ty| !mentions(&state.store, ty, &cx.inferring)))
        .collect()
}

fn check_block(
    state: &mut State,
    cx: &mut BodyCx<'_>,
    block: &ast::Block,
    expected: Option<TypeId>,
) -> Expr {
    let loc = Some(block.loc.clone());
    let suggested = suggested(state, cx, expected, block.params.len());

    cx.push_scope();
    let mut params = Vec::with_capacity(block.params.len());
    let mut param_tys = Vec::with_capacity(block.params.len());
    for (i, param) in block.params.iter().enumerate() {
        let type_name = param
            .ty
            .as_ref()
            .map(|ty| resolve_type_name(state, cx.env, ty));
        let ty = match &type_name {
            Some(name) => name.ty,
            None => suggested[i],
        };
        if type_name.is_none() && ty.is_none() {
            state.error(Some(param.loc.clone()), format!("cannot infer type of {}", param.name));
        }
        let var = state.store.vars.alloc(Var {
            loc: Some(param.loc.clone()),
            name: param.name.clone(),
            type_name,
            ty,
            role: VarRole::BlockParam,
            index: i,
        });
        cx.declare(var);
        params.push(var);
        param_tys.push(ty);
    }
    let stmts = check_stmts(state, cx, &block.stmts, suggested[block.params.len()]);
    cx.pop_scope();

    let result = match stmts.last() {
        Some(Stmt::Expr(expr)) => expr.ty(),
        _ => state.builtins.as_ref().map(|b| b.nil),
    };
    let ty = block_type(state, &param_tys, result, loc.as_ref());
    Expr::Block(Block {
        loc,
        params,
        stmts,
        ty,
    })
}

/// The `(P1, ..., Pn, R) Fun` instance of a block.
fn block_type(
    state: &mut State,
    params: &[Option<TypeId>],
    result: Option<TypeId>,
    loc: Option<&Loc>,
) -> Option<TypeId> {
    let fun = state.builtins.as_ref()?.fun(params.len())?;
    let args: Vec<TypeName> = params
        .iter()
        .chain(std::iter::once(&result))
        .map(|&ty| ty.map(|ty| state.name_at(ty, loc)))
        .collect::<Option<_>>()?;
    inst_type(state, fun, args, loc)
}
