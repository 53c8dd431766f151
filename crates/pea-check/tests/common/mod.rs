// Common test utilities for integration tests
//
// Sessions, lookup by name in a checked module, and a structural
// comparison of two checked graphs that may live in different stores.

#![allow(dead_code)]

use std::collections::HashMap;

use pea_check::types::{
    Expr, FunId, FunSig, Recv, Stage, Stmt, TypeId, TypeKind, TypeName, TypeVarId, ValId, VarId,
};
use pea_check::{Config, Def, MemLoader, Mod, Session, Store};

/// A session with the default widths and no importable modules.
pub fn session() -> Session {
    Session::new(Config::default()).expect("universal module checks")
}

/// A session importing from `loader`.
pub fn session_with(loader: MemLoader) -> Session {
    Session::new(Config::default().with_loader(loader)).expect("universal module checks")
}

/// Checks `source` as module `m`, failing the test on any diagnostic.
pub fn check(source: &str) -> (Session, Mod) {
    let mut session = session();
    let module = match session.check_source("m", source) {
        Ok(module) => module,
        Err(diags) => panic!("expected no errors, got {:?}", messages(&diags)),
    };
    (session, module)
}

/// The error messages of checking `source` as module `m`.
pub fn errors(source: &str) -> Vec<String> {
    match session().check_source("m", source) {
        Ok(_) => Vec::new(),
        Err(diags) => messages(&diags),
    }
}

pub fn messages(diags: &[pea_syntax::Diagnostic]) -> Vec<String> {
    diags.iter().map(|d| d.message.clone()).collect()
}

pub fn find_type(store: &Store, module: &Mod, name: &str) -> TypeId {
    module
        .defs
        .iter()
        .find_map(|&def| match def {
            Def::Type(ty) if store.types[ty].name == name => Some(ty),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no type {name} in {}", module.path))
}

pub fn find_fun(store: &Store, module: &Mod, sel: &str) -> FunId {
    module
        .defs
        .iter()
        .find_map(|&def| match def {
            Def::Fun(fun) if store.funs[fun].sig.sel == sel => Some(fun),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no function {sel} in {}", module.path))
}

pub fn find_val(store: &Store, module: &Mod, name: &str) -> ValId {
    module
        .defs
        .iter()
        .find_map(|&def| match def {
            Def::Val(val) if store.vals[val].name == name => Some(val),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no value {name} in {}", module.path))
}

/// The type of module value `name`.
pub fn val_type(store: &Store, module: &Mod, name: &str) -> TypeId {
    let val = find_val(store, module, name);
    store.vars[store.vals[val].var].ty.expect("typed value")
}

/// Walks two graphs in step, pairing nodes by position and asserting that
/// paired nodes agree field by field. Each node is paired at most once, so
/// a node reached twice must meet the same partner both times.
pub struct Iso<'a> {
    a: &'a Store,
    b: &'a Store,
    types: HashMap<TypeId, TypeId>,
    funs: HashMap<FunId, FunId>,
    vals: HashMap<ValId, ValId>,
    vars: HashMap<VarId, VarId>,
    tvars: HashMap<TypeVarId, TypeVarId>,
}

impl<'a> Iso<'a> {
    pub fn new(a: &'a Store, b: &'a Store) -> Self {
        Iso {
            a,
            b,
            types: HashMap::new(),
            funs: HashMap::new(),
            vals: HashMap::new(),
            vars: HashMap::new(),
            tvars: HashMap::new(),
        }
    }

    /// Compares two modules, then checks that every generic's instance
    /// list on the `b` side is drawn from its partner's on the `a` side.
    /// Generics defined in the module itself must list the same number.
    pub fn module(&mut self, a: &Mod, b: &Mod) {
        assert_eq!(a.path, b.path);
        assert_eq!(a.defs.len(), b.defs.len());
        for (&da, &db) in a.defs.iter().zip(&b.defs) {
            self.def(da, db);
        }
        assert_eq!(a.vals.len(), b.vals.len());
        for (&va, &vb) in a.vals.iter().zip(&b.vals) {
            assert_eq!(self.vals.get(&va), Some(&vb), "initialization order differs");
        }
        match (a.int, b.int) {
            (Some(ia), Some(ib)) => self.ty(ia, ib),
            (None, None) => {}
            other => panic!("int types differ: {other:?}"),
        }
        self.insts(&a.path);
    }

    fn insts(&mut self, path: &str) {
        let pairs: Vec<(TypeId, TypeId)> = self.types.iter().map(|(&a, &b)| (a, b)).collect();
        for (ta, tb) in pairs {
            let (ga, gb) = (&self.a.types[ta], &self.b.types[tb]);
            if ga.def != ta {
                continue;
            }
            for ib in &gb.insts {
                assert!(
                    ga.insts.iter().any(|ia| self.types.get(ia) == Some(ib)),
                    "{} has an instance with no counterpart",
                    ga.name
                );
            }
            if ga.module == path {
                assert_eq!(ga.insts.len(), gb.insts.len(), "instances of {}", ga.name);
            }
        }

        let pairs: Vec<(FunId, FunId)> = self.funs.iter().map(|(&a, &b)| (a, b)).collect();
        for (fa, fb) in pairs {
            let (ga, gb) = (&self.a.funs[fa], &self.b.funs[fb]);
            if ga.def != fa {
                continue;
            }
            for ib in &gb.insts {
                assert!(
                    ga.insts.iter().any(|ia| self.funs.get(ia) == Some(ib)),
                    "{} has an instance with no counterpart",
                    ga.sig.sel
                );
            }
            if ga.module == path {
                assert_eq!(ga.insts.len(), gb.insts.len(), "instances of {}", ga.sig.sel);
            }
        }
    }

    pub fn def(&mut self, a: Def, b: Def) {
        match (a, b) {
            (Def::Val(a), Def::Val(b)) => self.val(a, b),
            (Def::Fun(a), Def::Fun(b)) => self.fun(a, b),
            (Def::Type(a), Def::Type(b)) => self.ty(a, b),
            other => panic!("definition kinds differ: {other:?}"),
        }
    }

    fn opt_ty(&mut self, a: Option<TypeId>, b: Option<TypeId>) {
        match (a, b) {
            (Some(a), Some(b)) => self.ty(a, b),
            (None, None) => {}
            other => panic!("type refs differ: {other:?}"),
        }
    }

    pub fn ty(&mut self, a: TypeId, b: TypeId) {
        if let Some(&seen) = self.types.get(&a) {
            assert_eq!(seen, b, "type {} paired twice", self.a.types[a].name);
            return;
        }
        self.types.insert(a, b);

        let (ta, tb) = (&self.a.types[a], &self.b.types[b]);
        assert_eq!(ta.loc, tb.loc);
        assert_eq!(ta.module, tb.module);
        assert_eq!(ta.private, tb.private);
        assert_eq!(ta.name, tb.name);
        assert_eq!(ta.arity, tb.arity);
        assert_eq!(ta.builtin, tb.builtin);
        assert_eq!(tb.stage, Stage::Complete, "stage of {}", tb.name);
        assert_eq!(ta.params.len(), tb.params.len());
        assert_eq!(ta.args.len(), tb.args.len());

        let (ta, tb) = (ta.clone(), tb.clone());
        for (&pa, &pb) in ta.params.iter().zip(&tb.params) {
            self.tvar(pa, pb);
        }
        for (na, nb) in ta.args.iter().zip(&tb.args) {
            self.type_name(na, nb);
        }
        self.opt_ty(ta.ref_def, tb.ref_def);
        self.opt_ty(ta.tag, tb.tag);
        self.ty(ta.def, tb.def);
        match (ta.var, tb.var) {
            (Some(va), Some(vb)) => self.tvar(va, vb),
            (None, None) => {}
            other => panic!("type variables differ: {other:?}"),
        }
        match (&ta.kind, &tb.kind) {
            (TypeKind::Opaque, TypeKind::Opaque) => {}
            (TypeKind::Alias(na), TypeKind::Alias(nb)) => self.opt_type_name(na.as_ref(), nb.as_ref()),
            (TypeKind::Fields(va), TypeKind::Fields(vb)) | (TypeKind::Cases(va), TypeKind::Cases(vb)) => {
                self.var_list(va, vb);
            }
            (TypeKind::Virts(sa), TypeKind::Virts(sb)) => {
                assert_eq!(sa.len(), sb.len());
                for (a, b) in sa.iter().zip(sb) {
                    self.sig(a, b);
                }
            }
            other => panic!("kinds of {} differ: {other:?}", ta.name),
        }
    }

    fn tvar(&mut self, a: TypeVarId, b: TypeVarId) {
        if let Some(&seen) = self.tvars.get(&a) {
            assert_eq!(seen, b);
            return;
        }
        self.tvars.insert(a, b);

        let (va, vb) = (self.a.tvars[a].clone(), self.b.tvars[b].clone());
        assert_eq!(va.loc, vb.loc);
        assert_eq!(va.name, vb.name);
        assert_eq!(va.id, vb.id);
        assert_eq!(va.bounds.len(), vb.bounds.len());
        for (na, nb) in va.bounds.iter().zip(&vb.bounds) {
            self.type_name(na, nb);
        }
        self.ty(va.ty, vb.ty);
    }

    fn type_name(&mut self, a: &TypeName, b: &TypeName) {
        assert_eq!(a.loc, b.loc);
        assert_eq!(a.module, b.module);
        assert_eq!(a.name, b.name);
        assert_eq!(a.args.len(), b.args.len());
        for (na, nb) in a.args.iter().zip(&b.args) {
            self.type_name(na, nb);
        }
        self.opt_ty(a.ty, b.ty);
    }

    fn opt_type_name(&mut self, a: Option<&TypeName>, b: Option<&TypeName>) {
        match (a, b) {
            (Some(a), Some(b)) => self.type_name(a, b),
            (None, None) => {}
            other => panic!("type names differ: {other:?}"),
        }
    }

    fn var_list(&mut self, a: &[VarId], b: &[VarId]) {
        assert_eq!(a.len(), b.len());
        for (&va, &vb) in a.iter().zip(b) {
            self.var(va, vb);
        }
    }

    fn var(&mut self, a: VarId, b: VarId) {
        if let Some(&seen) = self.vars.get(&a) {
            assert_eq!(seen, b, "variable {} paired twice", self.a.vars[a].name);
            return;
        }
        self.vars.insert(a, b);

        let (va, vb) = (&self.a.vars[a], &self.b.vars[b]);
        assert_eq!(va.loc, vb.loc);
        assert_eq!(va.name, vb.name);
        assert_eq!(va.role, vb.role);
        assert_eq!(va.index, vb.index);
        let (ta, tb) = (va.ty, vb.ty);
        self.opt_ty(ta, tb);
    }

    fn sig(&mut self, a: &FunSig, b: &FunSig) {
        assert_eq!(a.loc, b.loc);
        assert_eq!(a.sel, b.sel);
        self.var_list(&a.params, &b.params);
        self.opt_type_name(a.ret.as_ref(), b.ret.as_ref());
    }

    fn recv(&mut self, a: &Recv, b: &Recv) {
        assert_eq!(a.loc, b.loc);
        assert_eq!(a.module, b.module);
        assert_eq!(a.name, b.name);
        assert_eq!(a.arity, b.arity);
        assert_eq!(a.params.len(), b.params.len());
        for (&pa, &pb) in a.params.iter().zip(&b.params) {
            self.tvar(pa, pb);
        }
        self.opt_ty(a.ty, b.ty);
    }

    pub fn fun(&mut self, a: FunId, b: FunId) {
        if let Some(&seen) = self.funs.get(&a) {
            assert_eq!(seen, b, "function {} paired twice", self.a.funs[a].sig.sel);
            return;
        }
        self.funs.insert(a, b);

        let (fa, fb) = (self.a.funs[a].clone(), self.b.funs[b].clone());
        assert_eq!(fa.loc, fb.loc);
        assert_eq!(fa.module, fb.module);
        assert_eq!(fa.private, fb.private);
        assert_eq!(fa.builtin, fb.builtin);
        assert_eq!(fb.stage, Stage::Complete);
        assert_eq!(fb.body_stage, Stage::Complete);
        match (&fa.recv, &fb.recv) {
            (Some(ra), Some(rb)) => self.recv(ra, rb),
            (None, None) => {}
            other => panic!("receivers of {} differ: {other:?}", fa.sig.sel),
        }
        assert_eq!(fa.tparams.len(), fb.tparams.len());
        for (&pa, &pb) in fa.tparams.iter().zip(&fb.tparams) {
            self.tvar(pa, pb);
        }
        self.sig(&fa.sig, &fb.sig);
        self.var_list(&fa.locals, &fb.locals);
        match (&fa.body, &fb.body) {
            (Some(sa), Some(sb)) => self.stmts(sa, sb),
            (None, None) => {}
            _ => panic!("bodies of {} differ", fa.sig.sel),
        }
        self.fun(fa.def, fb.def);
    }

    pub fn val(&mut self, a: ValId, b: ValId) {
        if let Some(&seen) = self.vals.get(&a) {
            assert_eq!(seen, b);
            return;
        }
        self.vals.insert(a, b);

        let (va, vb) = (self.a.vals[a].clone(), self.b.vals[b].clone());
        assert_eq!(va.loc, vb.loc);
        assert_eq!(va.module, vb.module);
        assert_eq!(va.private, vb.private);
        assert_eq!(va.name, vb.name);
        assert_eq!(vb.stage, Stage::Complete);
        self.var(va.var, vb.var);
        self.var_list(&va.locals, &vb.locals);
        self.stmts(&va.init, &vb.init);
    }

    fn stmts(&mut self, a: &[Stmt], b: &[Stmt]) {
        assert_eq!(a.len(), b.len());
        for (sa, sb) in a.iter().zip(b) {
            match (sa, sb) {
                (Stmt::Ret(ra), Stmt::Ret(rb)) => {
                    assert_eq!(ra.loc, rb.loc);
                    self.expr(&ra.expr, &rb.expr);
                }
                (Stmt::Assign(aa), Stmt::Assign(ab)) => {
                    assert_eq!(aa.loc, ab.loc);
                    self.var(aa.var, ab.var);
                    self.expr(&aa.expr, &ab.expr);
                }
                (Stmt::Expr(ea), Stmt::Expr(eb)) => self.expr(ea, eb),
                other => panic!("statements differ: {other:?}"),
            }
        }
    }

    fn exprs(&mut self, a: &[Expr], b: &[Expr]) {
        assert_eq!(a.len(), b.len());
        for (ea, eb) in a.iter().zip(b) {
            self.expr(ea, eb);
        }
    }

    fn expr(&mut self, a: &Expr, b: &Expr) {
        assert_eq!(a.loc(), b.loc());
        self.opt_ty(a.ty(), b.ty());
        match (a, b) {
            (Expr::Call(ca), Expr::Call(cb)) => {
                match (&ca.recv, &cb.recv) {
                    (Some(ra), Some(rb)) => self.expr(ra, rb),
                    (None, None) => {}
                    _ => panic!("call receivers differ"),
                }
                assert_eq!(ca.msgs.len(), cb.msgs.len());
                for (ma, mb) in ca.msgs.iter().zip(&cb.msgs) {
                    assert_eq!(ma.loc, mb.loc);
                    assert_eq!(ma.sel, mb.sel);
                    self.exprs(&ma.args, &mb.args);
                    match (ma.fun, mb.fun) {
                        (Some(fa), Some(fb)) => self.fun(fa, fb),
                        (None, None) => {}
                        other => panic!("message targets differ: {other:?}"),
                    }
                }
            }
            (Expr::Ctor(ca), Expr::Ctor(cb)) => {
                self.type_name(&ca.type_name, &cb.type_name);
                assert_eq!(ca.case, cb.case);
                self.exprs(&ca.args, &cb.args);
            }
            (Expr::Block(ba), Expr::Block(bb)) => {
                self.var_list(&ba.params, &bb.params);
                self.stmts(&ba.stmts, &bb.stmts);
            }
            (Expr::Ident(ia), Expr::Ident(ib)) => {
                assert_eq!(ia.name, ib.name);
                match (ia.var, ib.var) {
                    (Some(va), Some(vb)) => self.var(va, vb),
                    (None, None) => {}
                    other => panic!("identifier variables differ: {other:?}"),
                }
            }
            (Expr::Int(la), Expr::Int(lb)) | (Expr::Float(la), Expr::Float(lb)) | (Expr::Str(la), Expr::Str(lb)) => {
                assert_eq!(la.text, lb.text);
            }
            other => panic!("expressions differ: {other:?}"),
        }
    }
}
