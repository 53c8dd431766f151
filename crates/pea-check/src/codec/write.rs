use pea_syntax::Loc;

use super::*;
use crate::context::FxMap;
use crate::error::Defect;
use crate::types::{BuiltinMeth, Expr, FunSig, Lit, Stmt, TypeKind, TypeName, TypeVarId, VarRole};

pub(super) struct Writer<'s> {
    store: &'s Store,
    /// Path of the module being written; its generics bring their
    /// instances along.
    module: &'s str,
    buf: Vec<u8>,
    ids: FxMap<Obj, i32>,
    objs: Vec<Obj>,
    written: Vec<bool>,
}

fn range(what: &'static str, value: usize) -> Defect {
    Defect::IntRange {
        what,
        value: i64::try_from(value).unwrap_or(i64::MAX),
    }
}

fn tag_of<T: PartialEq>(all: &[T], value: &T, what: &'static str) -> Result<i32> {
    all.iter()
        .position(|v| v == value)
        .and_then(|i| i32::try_from(i).ok())
        .ok_or(Defect::Unreachable(what))
}

impl<'s> Writer<'s> {
    pub(super) fn new(store: &'s Store, module: &'s str) -> Self {
        Writer {
            store,
            module,
            buf: Vec::new(),
            ids: FxMap::default(),
            objs: Vec::new(),
            written: Vec::new(),
        }
    }

    pub(super) fn module(mut self, module: &Mod) -> Result<Vec<u8>> {
        self.str(&module.path)?;
        self.usize("definition count", module.defs.len())?;
        for &def in &module.defs {
            self.record(Obj::from(def))?;
        }
        self.type_ref(module.int)?;

        loop {
            let pending: Vec<Obj> = self
                .objs
                .iter()
                .zip(&self.written)
                .filter(|&(_, &written)| !written)
                .map(|(&obj, _)| obj)
                .collect();
            self.usize("pending count", pending.len())?;
            if pending.is_empty() {
                break;
            }
            pea_log::trace!("codec pass: {} records", pending.len());
            for obj in pending {
                self.record(obj)?;
            }
        }
        Ok(self.buf)
    }

    fn int(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn usize(&mut self, what: &'static str, value: usize) -> Result<()> {
        let value = i32::try_from(value).map_err(|_| range(what, value))?;
        self.int(value);
        Ok(())
    }

    fn bool(&mut self, value: bool) {
        self.int(i32::from(value));
    }

    fn str(&mut self, s: &str) -> Result<()> {
        self.usize("string length", s.len())?;
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }

    fn opt_str(&mut self, s: Option<&str>) -> Result<()> {
        self.bool(s.is_some());
        match s {
            Some(s) => self.str(s),
            None => Ok(()),
        }
    }

    fn loc(&mut self, loc: Option<&Loc>) -> Result<()> {
        self.bool(loc.is_some());
        let Some(loc) = loc else {
            return Ok(());
        };
        self.str(&loc.path)?;
        let span = loc.span;
        self.usize("offset", span.start)?;
        self.usize("offset", span.end)?;
        self.usize("line", span.start_line)?;
        self.usize("column", span.start_col)?;
        self.usize("line", span.end_line)?;
        self.usize("column", span.end_col)
    }

    /// The id of `obj`, numbering it on first mention.
    fn number(&mut self, obj: Obj) -> Result<i32> {
        if let Some(&id) = self.ids.get(&obj) {
            return Ok(id);
        }
        let id = i32::try_from(self.objs.len()).map_err(|_| range("object count", self.objs.len()))?;
        self.ids.insert(obj, id);
        self.objs.push(obj);
        self.written.push(false);
        Ok(id)
    }

    fn obj_ref(&mut self, obj: Option<Obj>) -> Result<()> {
        let id = match obj {
            Some(obj) => self.number(obj)?,
            None => -1,
        };
        self.int(id);
        Ok(())
    }

    fn type_ref(&mut self, ty: Option<TypeId>) -> Result<()> {
        self.obj_ref(ty.map(Obj::Type))
    }

    fn var_ref(&mut self, var: Option<VarId>) -> Result<()> {
        self.obj_ref(var.map(Obj::Var))
    }

    fn fun_ref(&mut self, fun: Option<FunId>) -> Result<()> {
        self.obj_ref(fun.map(Obj::Fun))
    }

    fn var_refs(&mut self, vars: &[VarId]) -> Result<()> {
        self.usize("variable count", vars.len())?;
        vars.iter().try_for_each(|&var| self.var_ref(Some(var)))
    }

    /// Type variables travel as their placeholder types.
    fn tvar_refs(&mut self, tvars: &[TypeVarId]) -> Result<()> {
        let store = self.store;
        self.usize("type parameter count", tvars.len())?;
        tvars
            .iter()
            .try_for_each(|&tv| self.type_ref(Some(store.tvars[tv].ty)))
    }

    fn type_name(&mut self, name: &TypeName) -> Result<()> {
        self.loc(name.loc.as_ref())?;
        self.opt_str(name.module.as_deref())?;
        self.str(&name.name)?;
        self.type_names(&name.args)?;
        self.type_ref(name.ty)
    }

    fn opt_type_name(&mut self, name: Option<&TypeName>) -> Result<()> {
        self.bool(name.is_some());
        match name {
            Some(name) => self.type_name(name),
            None => Ok(()),
        }
    }

    fn type_names(&mut self, names: &[TypeName]) -> Result<()> {
        self.usize("type argument count", names.len())?;
        names.iter().try_for_each(|name| self.type_name(name))
    }

    fn sig(&mut self, sig: &FunSig) -> Result<()> {
        self.loc(sig.loc.as_ref())?;
        self.str(&sig.sel)?;
        self.var_refs(&sig.params)?;
        self.opt_type_name(sig.ret.as_ref())
    }

    fn record(&mut self, obj: Obj) -> Result<()> {
        let id = self.number(obj)?;
        if let Some(written) = usize::try_from(id).ok().and_then(|i| self.written.get_mut(i)) {
            *written = true;
        }
        self.int(obj.tag());
        self.int(id);
        match obj {
            Obj::Val(val) => self.val(val),
            Obj::Fun(fun) => self.fun(fun),
            Obj::Type(ty) => self.ty(ty),
            Obj::Var(var) => self.var(var),
        }
    }

    fn val(&mut self, id: ValId) -> Result<()> {
        let store = self.store;
        let val = &store.vals[id];
        self.str(&val.module)?;
        self.bool(val.private);
        self.loc(val.loc.as_ref())?;
        self.str(&val.name)?;
        self.opt_type_name(store.vars[val.var].type_name.as_ref())?;
        self.stmts(&val.init)?;
        self.var_refs(&val.locals)?;
        self.var_ref(Some(val.var))
    }

    fn fun(&mut self, id: FunId) -> Result<()> {
        let store = self.store;
        let fun = &store.funs[id];
        self.str(&fun.module)?;
        self.bool(fun.private);
        self.loc(fun.loc.as_ref())?;

        self.bool(fun.recv.is_some());
        if let Some(recv) = &fun.recv {
            self.loc(recv.loc.as_ref())?;
            self.tvar_refs(&recv.params)?;
            self.opt_str(recv.module.as_deref())?;
            self.str(&recv.name)?;
            self.usize("arity", recv.arity)?;
            self.type_ref(recv.ty)?;
        }
        self.tvar_refs(&fun.tparams)?;
        self.sig(&fun.sig)?;

        self.bool(fun.body.is_some());
        if let Some(body) = &fun.body {
            self.stmts(body)?;
        }
        match &fun.builtin {
            Some(builtin) => {
                let tag = tag_of(&BuiltinMeth::ALL, builtin, "builtin method without a tag")?;
                self.int(tag);
            }
            None => self.int(-1),
        }
        self.var_refs(&fun.locals)?;
        self.fun_ref(Some(fun.def))?;

        if fun.def == id && fun.module == self.module {
            for &inst in &fun.insts {
                self.number(Obj::Fun(inst))?;
            }
        }
        Ok(())
    }

    fn ty(&mut self, id: TypeId) -> Result<()> {
        let store = self.store;
        let ty = &store.types[id];
        self.str(&ty.module)?;
        self.bool(ty.private);
        self.loc(ty.loc.as_ref())?;
        self.str(&ty.name)?;
        self.usize("arity", ty.arity)?;
        self.tvar_refs(&ty.params)?;
        self.type_names(&ty.args)?;

        match &ty.kind {
            TypeKind::Opaque => self.int(KIND_OPAQUE),
            TypeKind::Alias(target) => {
                self.int(KIND_ALIAS);
                self.opt_type_name(target.as_ref())?;
            }
            TypeKind::Fields(fields) => {
                self.int(KIND_FIELDS);
                self.var_refs(fields)?;
            }
            TypeKind::Cases(cases) => {
                self.int(KIND_CASES);
                self.var_refs(cases)?;
            }
            TypeKind::Virts(sigs) => {
                self.int(KIND_VIRTS);
                self.usize("virtual method count", sigs.len())?;
                for sig in sigs {
                    self.sig(sig)?;
                }
            }
        }
        self.int(ty.builtin.map_or(-1, |b| b.code()));
        self.type_ref(ty.ref_def)?;
        self.type_ref(ty.tag)?;
        self.type_ref(Some(ty.def))?;

        self.bool(ty.var.is_some());
        if let Some(tv) = ty.var {
            let tv = &store.tvars[tv];
            self.str(&tv.name)?;
            let var_id = i32::try_from(tv.id).map_err(|_| Defect::IntRange {
                what: "type variable id",
                value: i64::try_from(tv.id).unwrap_or(i64::MAX),
            })?;
            self.int(var_id);
            self.type_names(&tv.bounds)?;
        }

        if ty.def == id && ty.module == self.module {
            for &inst in &ty.insts {
                self.number(Obj::Type(inst))?;
            }
        }
        Ok(())
    }

    fn var(&mut self, id: VarId) -> Result<()> {
        let var = &self.store.vars[id];
        self.loc(var.loc.as_ref())?;
        self.str(&var.name)?;
        self.type_ref(var.ty)?;
        let role = tag_of(&VarRole::ALL, &var.role, "variable role without a tag")?;
        self.int(role);
        self.usize("variable index", var.index)
    }

    fn stmts(&mut self, stmts: &[Stmt]) -> Result<()> {
        self.usize("statement count", stmts.len())?;
        for stmt in stmts {
            match stmt {
                Stmt::Ret(ret) => {
                    self.int(STMT_RET);
                    self.loc(ret.loc.as_ref())?;
                    self.expr(&ret.expr)?;
                }
                Stmt::Assign(assign) => {
                    self.int(STMT_ASSIGN);
                    self.loc(assign.loc.as_ref())?;
                    self.var_ref(Some(assign.var))?;
                    self.expr(&assign.expr)?;
                }
                Stmt::Expr(expr) => {
                    self.int(STMT_EXPR);
                    self.expr(expr)?;
                }
            }
        }
        Ok(())
    }

    fn exprs(&mut self, exprs: &[Expr]) -> Result<()> {
        self.usize("argument count", exprs.len())?;
        exprs.iter().try_for_each(|expr| self.expr(expr))
    }

    fn expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Call(call) => {
                self.int(EXPR_CALL);
                self.loc(call.loc.as_ref())?;
                self.bool(call.recv.is_some());
                if let Some(recv) = &call.recv {
                    self.expr(recv)?;
                }
                self.usize("message count", call.msgs.len())?;
                for msg in &call.msgs {
                    self.loc(msg.loc.as_ref())?;
                    self.str(&msg.sel)?;
                    self.exprs(&msg.args)?;
                    self.fun_ref(msg.fun)?;
                }
                self.type_ref(call.ty)
            }
            Expr::Ctor(ctor) => {
                self.int(EXPR_CTOR);
                self.loc(ctor.loc.as_ref())?;
                self.type_name(&ctor.type_name)?;
                match ctor.case {
                    Some(case) => self.usize("case index", case)?,
                    None => self.int(-1),
                }
                self.exprs(&ctor.args)?;
                self.type_ref(ctor.ty)
            }
            Expr::Block(block) => {
                self.int(EXPR_BLOCK);
                self.loc(block.loc.as_ref())?;
                self.var_refs(&block.params)?;
                self.stmts(&block.stmts)?;
                self.type_ref(block.ty)
            }
            Expr::Ident(ident) => {
                self.int(EXPR_IDENT);
                self.loc(ident.loc.as_ref())?;
                self.str(&ident.name)?;
                self.var_ref(ident.var)?;
                self.type_ref(ident.ty)
            }
            Expr::Int(lit) => self.lit(EXPR_INT, lit),
            Expr::Float(lit) => self.lit(EXPR_FLOAT, lit),
            Expr::Str(lit) => self.lit(EXPR_STR, lit),
        }
    }

    fn lit(&mut self, tag: i32, lit: &Lit) -> Result<()> {
        self.int(tag);
        self.loc(lit.loc.as_ref())?;
        self.str(&lit.text)?;
        self.type_ref(lit.ty)
    }
}
