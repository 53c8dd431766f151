//! Declaring and gathering module-level definitions.
//!
//! # Design
//!
//! - **Declare**: every definition of a module gets a `Reserved` node
//!   before anything is resolved, so definitions can refer to each other
//!   in any order. Or-types and virtual types also declare their
//!   synthesized methods here, as ordinary method ASTs.
//! - **Gather**: nodes are filled in lazily, on first use or by the
//!   module driver, whichever comes first. A definition re-entered while
//!   `Gathering` is returned as is. Re-entry is an error only when every
//!   definition between the two entries is an alias.
//! - **Signatures before bodies**: gathering a function resolves only its
//!   signature; [`check_fun_body`] checks the statements.

use std::mem;
use std::rc::Rc;

use pea_syntax::{DiagnosticBuilder, Level, ast};

use super::expr::BodyCx;
use super::stmt::check_stmts;
use super::ty::{expect_type, is_method, resolve_type_name};
use crate::builtin::tag_bits;
use crate::context::{Env, FileScope, FxMap, Imported, ModScope, State};
use crate::infer::inst::{fill_pending, inst_type};
use crate::types::{
    BuiltinMeth, BuiltinType, Def, Fun, FunId, FunSig, Recv, Src, Stage, Stmt, Type, TypeId,
    TypeKind, TypeName, TypeVarId, Val, ValId, Var, VarRole,
};

/// A declared node waiting for its file scope.
enum Declared {
    Val(ValId, Rc<ast::ValDef>),
    Fun(FunId, Rc<ast::FunDef>),
    Type(TypeId, Rc<ast::TypeDef>),
}

/// Creates the `Reserved` nodes of every definition of `module`.
///
/// `imports` holds the resolved imports of each file, in file order.
pub(crate) fn declare_module(
    state: &mut State,
    module: &ast::Mod,
    imports: Vec<Vec<Imported>>,
) -> Vec<Def> {
    let path = module.path.as_str();
    let mut defs = Vec::new();
    let mut declared: Vec<(usize, Declared)> = Vec::new();
    let mut vals = 0;

    for (file, ast_file) in module.files.iter().enumerate() {
        for def in &ast_file.defs {
            match def {
                ast::Def::Import(_) => {}
                ast::Def::Val(val) => {
                    let id = declare_val(state, path, val, vals);
                    vals += 1;
                    defs.push(Def::Val(id));
                    declared.push((file, Declared::Val(id, Rc::clone(val))));
                }
                ast::Def::Fun(fun) => {
                    let id = declare_fun(state, path, fun, None);
                    defs.push(Def::Fun(id));
                    declared.push((file, Declared::Fun(id, Rc::clone(fun))));
                }
                ast::Def::Type(ty) => {
                    let id = declare_type(state, path, ty);
                    defs.push(Def::Type(id));
                    declared.push((file, Declared::Type(id, Rc::clone(ty))));

                    for (fun, builtin) in synthesize_methods(ty) {
                        let fun = Rc::new(fun);
                        let id = declare_fun(state, path, &fun, Some(builtin));
                        defs.push(Def::Fun(id));
                        declared.push((file, Declared::Fun(id, fun)));
                    }
                }
            }
        }
    }

    let scope = Rc::new(ModScope {
        path: path.to_string(),
        defs: defs.clone(),
    });
    let files: Vec<Rc<FileScope>> = imports
        .into_iter()
        .map(|imports| Rc::new(FileScope::new(Rc::clone(&scope), imports)))
        .collect();

    for (file, node) in declared {
        let Some(scope) = files.get(file) else { continue };
        let scope = Rc::clone(scope);
        match node {
            Declared::Val(id, ast) => state.store.vals[id].src = Some(Src { ast, scope }),
            Declared::Fun(id, ast) => state.store.funs[id].src = Some(Src { ast, scope }),
            Declared::Type(id, ast) => state.store.types[id].src = Some(Src { ast, scope }),
        }
    }
    defs
}

fn declare_val(state: &mut State, module: &str, val: &ast::ValDef, index: usize) -> ValId {
    let loc = Some(val.loc.clone());
    let var = state.store.vars.alloc(Var {
        loc: loc.clone(),
        name: val.name.clone(),
        type_name: None,
        ty: None,
        role: VarRole::Val,
        index,
    });
    state.store.vals.alloc(Val {
        loc,
        module: module.to_string(),
        private: val.private,
        name: val.name.clone(),
        init: Vec::new(),
        locals: Vec::new(),
        var,
        stage: Stage::Reserved,
        src: None,
    })
}

fn declare_fun(
    state: &mut State,
    module: &str,
    fun: &ast::FunDef,
    synthesized: Option<BuiltinMeth>,
) -> FunId {
    let builtin = synthesized.or_else(|| {
        (module.is_empty() && fun.body.is_none())
            .then(|| BuiltinMeth::from_selector(&fun.sig.sel))
            .flatten()
    });
    state.store.new_fun(|id| Fun {
        loc: Some(fun.loc.clone()),
        private: fun.private,
        builtin,
        ..Fun::skeleton(id, module, &fun.sig.sel)
    })
}

fn declare_type(state: &mut State, module: &str, ty: &ast::TypeDef) -> TypeId {
    let arity = ty.params.len();
    let builtin = (module.is_empty() && ty.body == ast::TypeBody::Opaque)
        .then(|| BuiltinType::from_name(&ty.name, arity))
        .flatten();
    state.store.new_type(|id| Type {
        loc: Some(ty.loc.clone()),
        private: ty.private,
        builtin,
        ..Type::skeleton(id, module, &ty.name, arity)
    })
}

/// The receiver of a method synthesized for `ty`. Bounds stay on the
/// type's own parameters.
fn synthetic_recv(ty: &ast::TypeDef) -> ast::Recv {
    ast::Recv {
        loc: ty.loc.clone(),
        params: ty
            .params
            .iter()
            .map(|param| ast::TypeParam {
                bounds: Vec::new(),
                ..param.clone()
            })
            .collect(),
        module: None,
        name: ty.name.clone(),
    }
}

/// `ifSome:` for `some: T`, `ifNone` for `none`.
fn case_keyword(case: &ast::Case) -> String {
    let mut chars = case.name.chars();
    let upper: String = chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default();
    let colon = if case.ty.is_some() { ":" } else { "" };
    format!("if{upper}{colon}")
}

/// A name for the case method's result variable that no parameter of the
/// type already uses.
fn fresh_result_name(params: &[ast::TypeParam]) -> String {
    std::iter::once("R".to_string())
        .chain((0..).map(|i| format!("R{i}")))
        .find(|name| params.iter().all(|param| param.name != *name))
        .unwrap_or_default()
}

/// Methods implied by a type definition: the case dispatch method of an
/// or-type, and one declaration per virtual method.
fn synthesize_methods(ty: &ast::TypeDef) -> Vec<(ast::FunDef, BuiltinMeth)> {
    let loc = &ty.loc;
    match &ty.body {
        ast::TypeBody::Cases(cases) if !cases.is_empty() => {
            let result = fresh_result_name(&ty.params);
            let result_name = || ast::TypeName::simple(loc.clone(), result.clone());

            let sel: String = cases.iter().map(case_keyword).collect();
            let params = cases
                .iter()
                .map(|case| {
                    let mut args = Vec::with_capacity(2);
                    if let Some(payload) = &case.ty {
                        args.push(ast::TypeName::applied(
                            case.loc.clone(),
                            "&",
                            vec![payload.clone()],
                        ));
                    }
                    args.push(result_name());
                    ast::Param {
                        loc: case.loc.clone(),
                        name: case.name.clone(),
                        ty: ast::TypeName::applied(case.loc.clone(), "Fun", args),
                    }
                })
                .collect();

            let fun = ast::FunDef {
                loc: loc.clone(),
                private: ty.private,
                recv: Some(synthetic_recv(ty)),
                tparams: vec![ast::TypeParam {
                    loc: loc.clone(),
                    name: result.clone(),
                    bounds: Vec::new(),
                }],
                sig: ast::FunSig {
                    loc: loc.clone(),
                    sel,
                    params,
                    ret: Some(result_name()),
                },
                body: None,
            };
            vec![(fun, BuiltinMeth::Case)]
        }
        ast::TypeBody::Virts(sigs) => sigs
            .iter()
            .map(|sig| {
                let fun = ast::FunDef {
                    loc: sig.loc.clone(),
                    private: ty.private,
                    recv: Some(synthetic_recv(ty)),
                    tparams: Vec::new(),
                    sig: sig.clone(),
                    body: None,
                };
                (fun, BuiltinMeth::Virt)
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Reports definitions that share a key with an earlier one: the name of
/// a value, the selector of a free function, `(arity)Name` of a type.
/// Methods are keyed by their receiver and are not checked here.
pub(crate) fn check_duplicates(state: &mut State, defs: &[Def]) {
    let mut seen: FxMap<String, Def> = FxMap::default();
    for &def in defs {
        let key = match def {
            Def::Val(val) => state.store.vals[val].name.clone(),
            Def::Fun(fun) if is_method(&state.store, fun) => continue,
            Def::Fun(fun) => state.store.funs[fun].sig.sel.clone(),
            Def::Type(ty) => {
                let t = &state.store.types[ty];
                format!("({}){}", t.arity, t.name)
            }
        };
        match seen.get(&key) {
            Some(&first) => {
                let store = &state.store;
                let diag = DiagnosticBuilder::new(Level::Error, format!("{} redefined", store.def_name(def)))
                    .at_opt(store.def_loc(def))
                    .note("previous definition", store.def_loc(first))
                    .build();
                state.report(diag);
            }
            None => {
                seen.insert(key, def);
            }
        }
    }
}

/// Allocates type variables for `params`; bounds are resolved separately,
/// once the variables are in scope.
fn declare_type_vars(state: &mut State, module: &str, params: &[ast::TypeParam]) -> Vec<TypeVarId> {
    params
        .iter()
        .map(|param| state.store.new_type_var(module, &param.name, Some(param.loc.clone())))
        .collect()
}

fn resolve_bounds(state: &mut State, env: &Env<'_>, tvars: &[TypeVarId], params: &[ast::TypeParam]) {
    for (&tv, param) in tvars.iter().zip(params) {
        let mut bounds = Vec::with_capacity(param.bounds.len());
        for bound in &param.bounds {
            let name = resolve_type_name(state, env, bound);
            if let Some(ty) = name.ty {
                gather_type(state, ty);
                let t = &state.store.types[ty];
                if t.stage == Stage::Complete && !matches!(t.kind, TypeKind::Virts(_)) {
                    let message = format!("{name} is not a virtual type");
                    state.error(name.loc.clone(), message);
                }
            }
            bounds.push(name);
        }
        state.store.tvars[tv].bounds = bounds;
    }
}

/// Reports type variables that nothing referred to. Variables named `_`
/// and those of the universal module are exempt.
fn report_unused(state: &mut State, module: &str, tvars: &[TypeVarId]) {
    if module.is_empty() {
        return;
    }
    for &tv in tvars {
        let var = &state.store.tvars[tv];
        if var.name != "_" && !state.used_tvars.contains(&tv) {
            let message = format!("{} defined and not used", var.name);
            state.error(var.loc.clone(), message);
        }
    }
}

/// Reports the alias cycle closing at `alias_stack[start]` and marks every
/// alias in it unresolved.
fn report_alias_cycle(state: &mut State, start: usize) {
    let cycle: Vec<TypeId> = state.alias_stack[start..].to_vec();
    let mut diag = DiagnosticBuilder::new(Level::Error, "type alias cycle")
        .at_opt(cycle.first().and_then(|&ty| state.store.types[ty].loc.clone()));
    for &ty in &cycle {
        let t = &state.store.types[ty];
        diag = diag.note(t.name.clone(), t.loc.clone());
    }
    state.report(diag.build());

    for ty in cycle {
        let t = &mut state.store.types[ty];
        t.kind = TypeKind::Alias(None);
        t.stage = Stage::Complete;
    }
}

/// Gathers a type definition: its parameters, body and discriminant.
pub(crate) fn gather_type(state: &mut State, ty: TypeId) {
    let t = &state.store.types[ty];
    match t.stage {
        Stage::Complete => return,
        Stage::Gathering => {
            if let Some(start) = state.alias_stack.iter().position(|&alias| alias == ty) {
                report_alias_cycle(state, start);
            }
            return;
        }
        Stage::Reserved => {}
    }
    let Some(src) = t.src.clone() else {
        state.store.types[ty].stage = Stage::Complete;
        return;
    };
    let module = t.module.clone();

    let _trace = state
        .tracer
        .enabled()
        .then(|| state.tracer.enter(format_args!("gather type {}", src.ast.name)));

    state.store.types[ty].stage = Stage::Gathering;
    // Any other kind of type breaks the chain of aliases being resolved.
    let outer_aliases = if matches!(src.ast.body, ast::TypeBody::Alias(_)) {
        state.alias_stack.push(ty);
        None
    } else {
        Some(mem::take(&mut state.alias_stack))
    };

    let file_env = Env::new(&src.scope);
    let params = declare_type_vars(state, &module, &src.ast.params);
    state.store.types[ty].params = params.clone();
    let env = file_env.with_tvars(&params);
    resolve_bounds(state, &env, &params, &src.ast.params);
    let ref_def = env.universe_type(state, "&", 1);

    let kind = match &src.ast.body {
        ast::TypeBody::Opaque => TypeKind::Opaque,
        ast::TypeBody::Alias(target) => {
            let target = resolve_type_name(state, &env, target);
            TypeKind::Alias(target.ty.is_some().then_some(target))
        }
        ast::TypeBody::Fields(fields) => TypeKind::Fields(
            fields
                .iter()
                .enumerate()
                .map(|(index, field)| {
                    let name = resolve_type_name(state, &env, &field.ty);
                    state.store.vars.alloc(Var {
                        loc: Some(field.loc.clone()),
                        name: field.name.clone(),
                        ty: name.ty,
                        type_name: Some(name),
                        role: VarRole::Field,
                        index,
                    })
                })
                .collect(),
        ),
        ast::TypeBody::Cases(cases) => TypeKind::Cases(
            cases
                .iter()
                .enumerate()
                .map(|(index, case)| {
                    let name = case.ty.as_ref().map(|ty| resolve_type_name(state, &env, ty));
                    state.store.vars.alloc(Var {
                        loc: Some(case.loc.clone()),
                        name: case.name.clone(),
                        ty: name.as_ref().and_then(|name| name.ty),
                        type_name: name,
                        role: VarRole::Case,
                        index,
                    })
                })
                .collect(),
        ),
        ast::TypeBody::Virts(sigs) => TypeKind::Virts(
            sigs.iter()
                .map(|sig| gather_sig(state, &env, sig, None))
                .collect(),
        ),
    };

    let tag = match &kind {
        TypeKind::Cases(cases) => match tag_bits(cases.len()) {
            Some(bits) => env.universe_type(state, &format!("UInt{bits}"), 0),
            None => {
                let message = format!("too many cases: {}", cases.len());
                state.error(Some(src.ast.loc.clone()), message);
                None
            }
        },
        _ => None,
    };

    match outer_aliases {
        Some(outer) => state.alias_stack = outer,
        None => {
            state.alias_stack.pop();
        }
    }
    if state.store.types[ty].stage == Stage::Complete {
        // Closed an alias cycle; already marked unresolved.
        return;
    }

    if !matches!(kind, TypeKind::Opaque) {
        report_unused(state, &module, &params);
    }
    let t = &mut state.store.types[ty];
    t.kind = kind;
    t.tag = tag;
    t.ref_def = ref_def;
    t.stage = Stage::Complete;
    fill_pending(state, ty);
}

/// The target of alias `ty` while `ty` itself is still gathering, resolved
/// again from its source. A type the alias's target reaches can refer back
/// to the alias before the alias is complete.
pub(crate) fn gathering_alias_target(state: &mut State, ty: TypeId) -> Option<TypeName> {
    let t = &state.store.types[ty];
    let src = t.src.clone()?;
    let ast::TypeBody::Alias(target) = &src.ast.body else {
        return None;
    };
    let params = t.params.clone();
    if params.len() != src.ast.params.len() {
        return None;
    }

    let file_env = Env::new(&src.scope);
    let env = file_env.with_tvars(&params);
    state.alias_stack.push(ty);
    let target = resolve_type_name(state, &env, target);
    state.alias_stack.pop();
    target.ty.is_some().then_some(target)
}

/// Resolves a written signature. With `self_ty`, a `self` parameter of
/// that type is prepended.
pub(crate) fn gather_sig(
    state: &mut State,
    env: &Env<'_>,
    sig: &ast::FunSig,
    self_ty: Option<TypeName>,
) -> FunSig {
    let mut params = Vec::with_capacity(sig.params.len() + 1);
    if let Some(self_ty) = self_ty {
        params.push(state.store.vars.alloc(Var {
            loc: self_ty.loc.clone(),
            name: "self".to_string(),
            ty: self_ty.ty,
            type_name: Some(self_ty),
            role: VarRole::Param,
            index: 0,
        }));
    }
    for param in &sig.params {
        let name = resolve_type_name(state, env, &param.ty);
        let index = params.len();
        params.push(state.store.vars.alloc(Var {
            loc: Some(param.loc.clone()),
            name: param.name.clone(),
            ty: name.ty,
            type_name: Some(name),
            role: VarRole::Param,
            index,
        }));
    }
    let ret = sig.ret.as_ref().map(|ret| resolve_type_name(state, env, ret));
    FunSig {
        loc: Some(sig.loc.clone()),
        sel: sig.sel.clone(),
        params,
        ret,
    }
}

/// Resolves the receiver of a method: its type variables, and the
/// receiver type instantiated over them.
fn gather_recv(state: &mut State, env: &Env<'_>, module: &str, recv: &ast::Recv) -> Recv {
    let params = declare_type_vars(state, module, &recv.params);
    let env = env.with_tvars(&params);
    resolve_bounds(state, &env, &params, &recv.params);

    let loc = Some(recv.loc.clone());
    let arity = params.len();
    let ty = match env.find_type(state, recv.module.as_deref(), &recv.name, arity) {
        Ok(Some(def)) => {
            let args = params
                .iter()
                .map(|&tv| state.name_at(state.store.tvars[tv].ty, loc.as_ref()))
                .collect();
            inst_type(state, def, args, loc.as_ref())
        }
        Ok(None) => {
            state.error(loc.clone(), format!("undefined type: {}", recv.name));
            None
        }
        Err(qualifier) => {
            state.error(loc.clone(), format!("undefined module: #{qualifier}"));
            None
        }
    };

    Recv {
        loc,
        params,
        module: recv.module.clone(),
        name: recv.name.clone(),
        arity,
        ty,
    }
}

/// Gathers the signature of a function or method.
pub(crate) fn gather_fun_sig(state: &mut State, fun: FunId) {
    let f = &state.store.funs[fun];
    if f.stage != Stage::Reserved {
        return;
    }
    let Some(src) = f.src.clone() else {
        state.store.funs[fun].stage = Stage::Complete;
        return;
    };
    let module = f.module.clone();

    let _trace = state
        .tracer
        .enabled()
        .then(|| state.tracer.enter(format_args!("gather fun {}", src.ast.sig.sel)));

    state.store.funs[fun].stage = Stage::Gathering;
    let file_env = Env::new(&src.scope);
    let recv = src
        .ast
        .recv
        .as_ref()
        .map(|recv| gather_recv(state, &file_env, &module, recv));

    let recv_params = recv.as_ref().map(|recv| recv.params.clone()).unwrap_or_default();
    let recv_env = file_env.with_tvars(&recv_params);
    let tparams = declare_type_vars(state, &module, &src.ast.tparams);
    let env = recv_env.with_tvars(&tparams);
    resolve_bounds(state, &env, &tparams, &src.ast.tparams);

    let self_ty = recv.as_ref().map(|recv| TypeName {
        loc: recv.loc.clone(),
        module: recv.module.clone(),
        name: recv.name.clone(),
        args: recv
            .params
            .iter()
            .map(|&tv| state.name_at(state.store.tvars[tv].ty, recv.loc.as_ref()))
            .collect(),
        ty: recv.ty,
    });
    let sig = gather_sig(state, &env, &src.ast.sig, self_ty);

    let f = &mut state.store.funs[fun];
    f.recv = recv;
    f.tparams = tparams;
    f.sig = sig;
    f.stage = Stage::Complete;
}

/// Checks the body of a function, after its signature. Synthesized
/// methods have no body and skip the unused type variable check.
pub(crate) fn check_fun_body(state: &mut State, fun: FunId) {
    gather_fun_sig(state, fun);
    let f = &state.store.funs[fun];
    if f.body_stage != Stage::Reserved {
        return;
    }
    let Some(src) = f.src.clone() else {
        state.store.funs[fun].body_stage = Stage::Complete;
        return;
    };
    let module = f.module.clone();
    let recv_params = f.recv.as_ref().map(|recv| recv.params.clone()).unwrap_or_default();
    let tparams = f.tparams.clone();
    let params = f.sig.params.clone();
    let synthesized = matches!(f.builtin, Some(BuiltinMeth::Case | BuiltinMeth::Virt));
    let ret = match &f.sig.ret {
        Some(ret) => ret.ty,
        None => state.builtins.as_ref().map(|b| b.nil),
    };
    state.store.funs[fun].body_stage = Stage::Gathering;

    if let Some(body) = &src.ast.body {
        let _trace = state
            .tracer
            .enabled()
            .then(|| state.tracer.enter(format_args!("check body {}", src.ast.sig.sel)));

        let file_env = Env::new(&src.scope);
        let recv_env = file_env.with_tvars(&recv_params);
        let env = recv_env.with_tvars(&tparams);
        let mut cx = BodyCx::new(&env, ret, Some(Def::Fun(fun)));
        for &param in &params {
            cx.bind(param);
        }
        let stmts = check_stmts(state, &mut cx, body, None);

        let f = &mut state.store.funs[fun];
        f.body = Some(stmts);
        f.locals = cx.locals;
    }

    if !synthesized {
        let mut tvars = recv_params;
        tvars.extend(tparams);
        report_unused(state, &module, &tvars);
    }
    state.store.funs[fun].body_stage = Stage::Complete;
}

/// Gathers a module value: its declared type, then its initializer. A
/// value without a declared type takes the type of its initializer's last
/// expression.
pub(crate) fn gather_val(state: &mut State, val: ValId) {
    let v = &state.store.vals[val];
    if v.stage != Stage::Reserved {
        return;
    }
    let Some(src) = v.src.clone() else {
        state.store.vals[val].stage = Stage::Complete;
        return;
    };
    let var = v.var;
    state.store.vals[val].stage = Stage::Gathering;

    let _trace = state
        .tracer
        .enabled()
        .then(|| state.tracer.enter(format_args!("gather val {}", src.ast.name)));

    let env = Env::new(&src.scope);
    if let Some(ty) = &src.ast.ty {
        let name = resolve_type_name(state, &env, ty);
        let v = &mut state.store.vars[var];
        v.ty = name.ty;
        v.type_name = Some(name);
    }
    let declared = state.store.vars[var].ty;

    let mark = state.mark();
    let mut cx = BodyCx::new(&env, None, Some(Def::Val(val)));
    let init = check_stmts(state, &mut cx, &src.ast.init, declared);
    let got = init.last().and_then(Stmt::expr_ty);

    if src.ast.ty.is_some() {
        let loc = init
            .last()
            .and_then(|stmt| match stmt {
                Stmt::Expr(expr) => expr.loc().cloned(),
                _ => None,
            })
            .unwrap_or_else(|| src.ast.loc.clone());
        expect_type(state, &env, got, declared, Some(&loc));
    } else if got.is_some() {
        state.store.vars[var].ty = got;
    } else if state.mark() == mark {
        state.error(Some(src.ast.loc.clone()), format!("cannot infer type of {}", src.ast.name));
    }

    let v = &mut state.store.vals[val];
    v.init = init;
    v.locals = cx.locals;
    v.stage = Stage::Complete;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pea_syntax::parse_source;

    fn type_def(src: &str) -> Rc<ast::TypeDef> {
        let file = parse_source("t.pea", src).expect("parses");
        match file.defs.into_iter().next() {
            Some(ast::Def::Type(ty)) => ty,
            other => panic!("not a type: {other:?}"),
        }
    }

    #[test]
    fn test_case_method_selector() {
        let ty = type_def("type (T) Option { none | some: T }");
        let methods = synthesize_methods(&ty);
        assert_eq!(methods.len(), 1);
        let (fun, builtin) = &methods[0];
        assert_eq!(*builtin, BuiltinMeth::Case);
        assert_eq!(fun.sig.sel, "ifNoneifSome:");
        assert_eq!(fun.tparams[0].name, "R");
        assert_eq!(fun.sig.params[0].ty.to_string(), "R Fun");
        assert_eq!(fun.sig.params[1].ty.to_string(), "(T&, R) Fun");
    }

    #[test]
    fn test_case_method_result_avoids_params() {
        let ty = type_def("type (R, R0) Either { left: R | right: R0 }");
        let (fun, _) = &synthesize_methods(&ty)[0];
        assert_eq!(fun.tparams[0].name, "R1");
        assert_eq!(fun.sig.ret.as_ref().map(ToString::to_string).as_deref(), Some("R1"));
    }

    #[test]
    fn test_virtual_methods() {
        let ty = type_def("type (T Eq) Printer { [print: x T] [flush] }");
        let methods = synthesize_methods(&ty);
        let sels: Vec<&str> = methods.iter().map(|(f, _)| f.sig.sel.as_str()).collect();
        assert_eq!(sels, ["print:", "flush"]);
        assert!(methods.iter().all(|(_, b)| *b == BuiltinMeth::Virt));
        let recv = methods[0].0.recv.as_ref().expect("receiver");
        assert!(recv.params[0].bounds.is_empty());
    }

    #[test]
    fn test_no_methods_for_and_types() {
        assert!(synthesize_methods(&type_def("type Point { x: Int y: Int }")).is_empty());
        assert!(synthesize_methods(&type_def("type Empty { }")).is_empty());
    }
}
