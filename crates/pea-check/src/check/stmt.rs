//! Statement checking.

use pea_syntax::ast;

use super::decl::gather_val;
use super::expr::{BodyCx, check_expr, find_val};
use super::ty::{expect_type, resolve_type_name};
use crate::context::State;
use crate::types::{Assign, Def, Ret, Stmt, TypeId, Var, VarId, VarRole};

/// Checks a statement sequence. Only the last statement is checked
/// against `last_expected`.
pub(crate) fn check_stmts(
    state: &mut State,
    cx: &mut BodyCx<'_>,
    stmts: &[ast::Stmt],
    last_expected: Option<TypeId>,
) -> Vec<Stmt> {
    let last = stmts.len().saturating_sub(1);
    stmts
        .iter()
        .enumerate()
        .map(|(i, stmt)| {
            let expected = if i == last { last_expected } else { None };
            check_stmt(state, cx, stmt, expected)
        })
        .collect()
}

fn check_stmt(
    state: &mut State,
    cx: &mut BodyCx<'_>,
    stmt: &ast::Stmt,
    expected: Option<TypeId>,
) -> Stmt {
    match stmt {
        ast::Stmt::Ret(ret) => {
            let expected = cx.ret;
            let expr = check_expr(state, cx, &ret.expr, expected);
            expect_type(state, cx.env, expr.ty(), expected, expr.loc());
            Stmt::Ret(Ret {
                loc: Some(ret.loc.clone()),
                expr,
            })
        }
        ast::Stmt::Assign(assign) => Stmt::Assign(check_assign(state, cx, assign)),
        ast::Stmt::Expr(expr) => Stmt::Expr(check_expr(state, cx, expr, expected)),
    }
}

/// The variable an untyped assignment to `name` writes: a local in scope,
/// or a module value.
fn existing(state: &mut State, cx: &BodyCx<'_>, name: &str) -> Option<VarId> {
    if let Some(var) = cx.lookup(state, name) {
        return Some(var);
    }
    let val = find_val(state, cx.env, name)?;
    gather_val(state, val);
    state.use_def(cx.owner, Def::Val(val));
    Some(state.store.vals[val].var)
}

/// `x := e` assigns an existing variable; `x T := e`, or `x := e` with
/// nothing named `x` in scope, defines a local.
fn check_assign(state: &mut State, cx: &mut BodyCx<'_>, assign: &ast::Assign) -> Assign {
    let loc = Some(assign.loc.clone());

    if assign.ty.is_none() {
        if let Some(var) = existing(state, cx, &assign.name) {
            let target = state.store.vars[var].ty;
            let expr = check_expr(state, cx, &assign.expr, target);
            expect_type(state, cx.env, expr.ty(), target, expr.loc());
            return Assign { loc, var, expr };
        }
    }

    let type_name = assign
        .ty
        .as_ref()
        .map(|ty| resolve_type_name(state, cx.env, ty));
    let declared = type_name.as_ref().and_then(|name| name.ty);
    let expr = check_expr(state, cx, &assign.expr, declared);
    let ty = match &type_name {
        Some(_) => {
            expect_type(state, cx.env, expr.ty(), declared, expr.loc());
            declared
        }
        None => expr.ty(),
    };

    let index = cx.count(state, VarRole::Local);
    let var = state.store.vars.alloc(Var {
        loc: loc.clone(),
        name: assign.name.clone(),
        type_name,
        ty,
        role: VarRole::Local,
        index,
    });
    cx.declare(var);
    Assign { loc, var, expr }
}
