use std::rc::Rc;

use pea_syntax::{Loc, Span};

use super::*;
use crate::check::order::{toposort, tree_deps};
use crate::context::FxMap;
use crate::error::Defect;
use crate::types::{
    Assign, Block, BuiltinMeth, BuiltinType, Call, Ctor, Expr, Fun, FunSig, Ident, Lit, Msg, Recv,
    Ret, Stage, Stmt, Type, TypeKind, TypeName, TypeVar, TypeVarId, Val, Var, VarRole,
};

pub(super) struct Reader<'b, 's> {
    bytes: &'b [u8],
    pos: usize,
    store: &'s mut Store,
    /// Stream id to the slot reserved for it.
    objs: FxMap<i32, Obj>,
    /// Placeholder type id to its type variable.
    tvars: FxMap<i32, TypeVarId>,
    /// Records in stream order.
    read: Vec<Obj>,
    /// Value annotations, applied once every variable is read.
    annotations: Vec<(VarId, TypeName)>,
    paths: FxMap<String, Rc<str>>,
}

impl<'b, 's> Reader<'b, 's> {
    pub(super) fn new(store: &'s mut Store, bytes: &'b [u8]) -> Self {
        Reader {
            bytes,
            pos: 0,
            store,
            objs: FxMap::default(),
            tvars: FxMap::default(),
            read: Vec::new(),
            annotations: Vec::new(),
            paths: FxMap::default(),
        }
    }

    fn malformed(&self, message: impl Into<String>) -> Defect {
        Defect::Malformed {
            offset: self.pos,
            message: message.into(),
        }
    }

    pub(super) fn module(mut self) -> Result<Mod> {
        let path = self.str()?;
        let count = self.usize()?;
        let mut defs = Vec::new();
        for _ in 0..count {
            let def = match self.record()? {
                Obj::Val(id) => Def::Val(id),
                Obj::Fun(id) => Def::Fun(id),
                Obj::Type(id) => Def::Type(id),
                Obj::Var(_) => return Err(self.malformed("variable record among definitions")),
            };
            defs.push(def);
        }
        let int = self.type_ref()?;

        loop {
            let pending = self.usize()?;
            if pending == 0 {
                break;
            }
            for _ in 0..pending {
                self.record()?;
            }
        }
        if self.pos != self.bytes.len() {
            return Err(self.malformed("trailing bytes"));
        }

        self.finish()?;

        let vals: Vec<ValId> = defs
            .iter()
            .filter_map(|&def| match def {
                Def::Val(val) => Some(val),
                _ => None,
            })
            .collect();
        let deps = tree_deps(&*self.store, &defs);
        let (vals, cycles) = toposort(&deps, &vals);
        if !cycles.is_empty() {
            return Err(self.malformed("initialization cycle"));
        }

        Ok(Mod {
            path,
            ast: None,
            defs,
            vals,
            int,
        })
    }

    /// Checks every mention was read, then rebuilds what the stream omits.
    fn finish(&mut self) -> Result<()> {
        let mut mentioned: Vec<(i32, Obj)> = self.objs.iter().map(|(&id, &obj)| (id, obj)).collect();
        mentioned.sort_unstable_by_key(|&(id, _)| id);
        for (id, obj) in mentioned {
            let filled = match obj {
                Obj::Val(v) => self.store.vals.is_filled(v),
                Obj::Fun(f) => self.store.funs.is_filled(f),
                Obj::Type(t) => self.store.types.is_filled(t),
                Obj::Var(v) => self.store.vars.is_filled(v),
            };
            if !filled {
                return Err(Defect::Dangling {
                    kind: Obj::kind(obj.tag()),
                    id,
                });
            }
        }
        let mut tvars: Vec<(i32, TypeVarId)> = self.tvars.iter().map(|(&id, &tv)| (id, tv)).collect();
        tvars.sort_unstable_by_key(|&(id, _)| id);
        for (id, tv) in tvars {
            if !self.store.tvars.is_filled(tv) {
                return Err(Defect::Dangling {
                    kind: "type variable",
                    id,
                });
            }
        }

        let store = &mut *self.store;
        for &obj in &self.read {
            match obj {
                Obj::Var(var) => {
                    if let Some(ty) = store.vars[var].ty {
                        store.vars[var].type_name = Some(store.type_name(ty));
                    }
                }
                Obj::Type(ty) => {
                    let def = store.types[ty].def;
                    if def != ty {
                        store.types[def].insts.push(ty);
                    }
                }
                Obj::Fun(fun) => {
                    let def = store.funs[fun].def;
                    if def != fun {
                        store.funs[def].insts.push(fun);
                    }
                }
                Obj::Val(_) => {}
            }
        }
        for (var, name) in self.annotations.drain(..) {
            store.vars[var].type_name = Some(name);
        }
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<&'b [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| self.malformed("unexpected end of input"))?;
        let bytes: &'b [u8] = self.bytes;
        let taken = &bytes[self.pos..end];
        self.pos = end;
        Ok(taken)
    }

    fn int(&mut self) -> Result<i32> {
        let bytes = self.take(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn usize(&mut self) -> Result<usize> {
        let value = self.int()?;
        usize::try_from(value).map_err(|_| self.malformed(format!("negative count {value}")))
    }

    fn bool(&mut self) -> Result<bool> {
        match self.int()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(self.malformed(format!("invalid flag {other}"))),
        }
    }

    fn str(&mut self) -> Result<String> {
        let len = self.usize()?;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| self.malformed("invalid utf-8"))
    }

    fn opt_str(&mut self) -> Result<Option<String>> {
        if self.bool()? { self.str().map(Some) } else { Ok(None) }
    }

    fn loc(&mut self) -> Result<Option<Loc>> {
        if !self.bool()? {
            return Ok(None);
        }
        let path = self.str()?;
        let path = match self.paths.get(&path) {
            Some(shared) => Rc::clone(shared),
            None => {
                let shared: Rc<str> = Rc::from(path.as_str());
                self.paths.insert(path, Rc::clone(&shared));
                shared
            }
        };
        let span = Span::new(
            self.usize()?,
            self.usize()?,
            self.usize()?,
            self.usize()?,
            self.usize()?,
            self.usize()?,
        );
        Ok(Some(Loc { path, span }))
    }

    /// The slot for stream id `id`, reserved on first mention.
    fn slot(&mut self, id: i32, tag: i32) -> Result<Obj> {
        if let Some(&obj) = self.objs.get(&id) {
            if obj.tag() != tag {
                return Err(self.malformed(format!(
                    "{} {id} referenced as a {}",
                    Obj::kind(obj.tag()),
                    Obj::kind(tag)
                )));
            }
            return Ok(obj);
        }
        let obj = match tag {
            VAL => Obj::Val(self.store.vals.reserve()),
            FUN => Obj::Fun(self.store.funs.reserve()),
            TYPE => Obj::Type(self.store.types.reserve()),
            VAR => Obj::Var(self.store.vars.reserve()),
            other => return Err(self.malformed(format!("unknown record tag {other}"))),
        };
        self.objs.insert(id, obj);
        Ok(obj)
    }

    fn obj_ref(&mut self, tag: i32) -> Result<Option<(i32, Obj)>> {
        match self.int()? {
            -1 => Ok(None),
            id if id < 0 => Err(self.malformed(format!("invalid reference {id}"))),
            id => Ok(Some((id, self.slot(id, tag)?))),
        }
    }

    fn type_ref(&mut self) -> Result<Option<TypeId>> {
        Ok(match self.obj_ref(TYPE)? {
            Some((_, Obj::Type(id))) => Some(id),
            _ => None,
        })
    }

    fn var_ref(&mut self) -> Result<Option<VarId>> {
        Ok(match self.obj_ref(VAR)? {
            Some((_, Obj::Var(id))) => Some(id),
            _ => None,
        })
    }

    fn fun_ref(&mut self) -> Result<Option<FunId>> {
        Ok(match self.obj_ref(FUN)? {
            Some((_, Obj::Fun(id))) => Some(id),
            _ => None,
        })
    }

    fn some<T>(&self, value: Option<T>, what: &str) -> Result<T> {
        value.ok_or_else(|| self.malformed(format!("missing {what}")))
    }

    fn var_refs(&mut self) -> Result<Vec<VarId>> {
        let count = self.usize()?;
        (0..count)
            .map(|_| {
                let var = self.var_ref()?;
                self.some(var, "variable")
            })
            .collect()
    }

    fn tvar(&mut self, id: i32) -> TypeVarId {
        let tvars = &mut self.tvars;
        let store = &mut *self.store;
        *tvars.entry(id).or_insert_with(|| store.tvars.reserve())
    }

    fn tvar_refs(&mut self) -> Result<Vec<TypeVarId>> {
        let count = self.usize()?;
        (0..count)
            .map(|_| match self.obj_ref(TYPE)? {
                Some((id, _)) => Ok(self.tvar(id)),
                None => Err(self.malformed("missing type variable")),
            })
            .collect()
    }

    fn type_name(&mut self) -> Result<TypeName> {
        Ok(TypeName {
            loc: self.loc()?,
            module: self.opt_str()?,
            name: self.str()?,
            args: self.type_names()?,
            ty: self.type_ref()?,
        })
    }

    fn opt_type_name(&mut self) -> Result<Option<TypeName>> {
        if self.bool()? { self.type_name().map(Some) } else { Ok(None) }
    }

    fn type_names(&mut self) -> Result<Vec<TypeName>> {
        let count = self.usize()?;
        (0..count).map(|_| self.type_name()).collect()
    }

    fn sig(&mut self) -> Result<FunSig> {
        Ok(FunSig {
            loc: self.loc()?,
            sel: self.str()?,
            params: self.var_refs()?,
            ret: self.opt_type_name()?,
        })
    }

    fn record(&mut self) -> Result<Obj> {
        let tag = self.int()?;
        if !(VAL..=VAR).contains(&tag) {
            return Err(self.malformed(format!("unknown record tag {tag}")));
        }
        let id = self.int()?;
        if id < 0 {
            return Err(self.malformed(format!("invalid record id {id}")));
        }
        let obj = self.slot(id, tag)?;
        let duplicate = match obj {
            Obj::Val(v) => self.store.vals.is_filled(v),
            Obj::Fun(f) => self.store.funs.is_filled(f),
            Obj::Type(t) => self.store.types.is_filled(t),
            Obj::Var(v) => self.store.vars.is_filled(v),
        };
        if duplicate {
            return Err(self.malformed(format!("duplicate {} record {id}", Obj::kind(tag))));
        }

        match obj {
            Obj::Val(val) => self.val(val)?,
            Obj::Fun(fun) => self.fun(fun)?,
            Obj::Type(ty) => self.ty(id, ty)?,
            Obj::Var(var) => self.var(var)?,
        }
        self.read.push(obj);
        Ok(obj)
    }

    fn val(&mut self, id: ValId) -> Result<()> {
        let module = self.str()?;
        let private = self.bool()?;
        let loc = self.loc()?;
        let name = self.str()?;
        let annotation = self.opt_type_name()?;
        let init = self.stmts()?;
        let locals = self.var_refs()?;
        let var = self.var_ref()?;
        let var = self.some(var, "value variable")?;

        if let Some(annotation) = annotation {
            self.annotations.push((var, annotation));
        }
        self.store.vals.fill(
            id,
            Val {
                loc,
                module,
                private,
                name,
                init,
                locals,
                var,
                stage: Stage::Complete,
                src: None,
            },
        );
        Ok(())
    }

    fn fun(&mut self, id: FunId) -> Result<()> {
        let module = self.str()?;
        let private = self.bool()?;
        let loc = self.loc()?;

        let recv = if self.bool()? {
            Some(Recv {
                loc: self.loc()?,
                params: self.tvar_refs()?,
                module: self.opt_str()?,
                name: self.str()?,
                arity: self.usize()?,
                ty: self.type_ref()?,
            })
        } else {
            None
        };
        let tparams = self.tvar_refs()?;
        let sig = self.sig()?;
        let body = if self.bool()? { Some(self.stmts()?) } else { None };
        let builtin = match self.int()? {
            -1 => None,
            tag => {
                let meth = usize::try_from(tag).ok().and_then(|i| BuiltinMeth::ALL.get(i).copied());
                Some(self.some(meth, "builtin method")?)
            }
        };
        let locals = self.var_refs()?;
        let def = self.fun_ref()?;
        let def = self.some(def, "function definition")?;

        self.store.funs.fill(
            id,
            Fun {
                loc,
                module,
                private,
                recv,
                tparams,
                sig,
                body,
                builtin,
                locals,
                def,
                insts: Vec::new(),
                stage: Stage::Complete,
                body_stage: Stage::Complete,
                src: None,
            },
        );
        Ok(())
    }

    fn ty(&mut self, stream_id: i32, id: TypeId) -> Result<()> {
        let module = self.str()?;
        let private = self.bool()?;
        let loc = self.loc()?;
        let name = self.str()?;
        let arity = self.usize()?;
        let params = self.tvar_refs()?;
        let args = self.type_names()?;

        let kind = match self.int()? {
            KIND_OPAQUE => TypeKind::Opaque,
            KIND_ALIAS => TypeKind::Alias(self.opt_type_name()?),
            KIND_FIELDS => TypeKind::Fields(self.var_refs()?),
            KIND_CASES => TypeKind::Cases(self.var_refs()?),
            KIND_VIRTS => {
                let count = self.usize()?;
                TypeKind::Virts((0..count).map(|_| self.sig()).collect::<Result<_>>()?)
            }
            other => return Err(self.malformed(format!("unknown type kind {other}"))),
        };
        let builtin = match self.int()? {
            -1 => None,
            code => Some(self.some(BuiltinType::from_code(code), "builtin type")?),
        };
        let ref_def = self.type_ref()?;
        let tag = self.type_ref()?;
        let def = self.type_ref()?;
        let def = self.some(def, "type definition")?;

        let var = if self.bool()? {
            let var_name = self.str()?;
            let var_id = self.int()?;
            let var_id = u64::try_from(var_id)
                .map_err(|_| self.malformed(format!("invalid type variable id {var_id}")))?;
            let bounds = self.type_names()?;
            let tv = self.tvar(stream_id);
            self.store.tvars.fill(
                tv,
                TypeVar {
                    loc: loc.clone(),
                    name: var_name,
                    id: var_id,
                    bounds,
                    ty: id,
                },
            );
            Some(tv)
        } else {
            None
        };

        self.store.types.fill(
            id,
            Type {
                loc,
                module,
                private,
                name,
                arity,
                params,
                args,
                kind,
                builtin,
                ref_def,
                tag,
                def,
                insts: Vec::new(),
                var,
                stage: Stage::Complete,
                src: None,
            },
        );
        Ok(())
    }

    fn var(&mut self, id: VarId) -> Result<()> {
        let loc = self.loc()?;
        let name = self.str()?;
        let ty = self.type_ref()?;
        let role = self.int()?;
        let role = usize::try_from(role).ok().and_then(|i| VarRole::ALL.get(i).copied());
        let role = self.some(role, "variable role")?;
        let index = self.usize()?;
        self.store.vars.fill(
            id,
            Var {
                loc,
                name,
                type_name: None,
                ty,
                role,
                index,
            },
        );
        Ok(())
    }

    fn stmts(&mut self) -> Result<Vec<Stmt>> {
        let count = self.usize()?;
        (0..count).map(|_| self.stmt()).collect()
    }

    fn stmt(&mut self) -> Result<Stmt> {
        Ok(match self.int()? {
            STMT_RET => Stmt::Ret(Ret {
                loc: self.loc()?,
                expr: self.expr()?,
            }),
            STMT_ASSIGN => {
                let loc = self.loc()?;
                let var = self.var_ref()?;
                let var = self.some(var, "assigned variable")?;
                Stmt::Assign(Assign {
                    loc,
                    var,
                    expr: self.expr()?,
                })
            }
            STMT_EXPR => Stmt::Expr(self.expr()?),
            other => return Err(self.malformed(format!("unknown statement tag {other}"))),
        })
    }

    fn exprs(&mut self) -> Result<Vec<Expr>> {
        let count = self.usize()?;
        (0..count).map(|_| self.expr()).collect()
    }

    fn expr(&mut self) -> Result<Expr> {
        Ok(match self.int()? {
            EXPR_CALL => {
                let loc = self.loc()?;
                let recv = if self.bool()? { Some(Box::new(self.expr()?)) } else { None };
                let count = self.usize()?;
                let msgs = (0..count)
                    .map(|_| -> Result<Msg> {
                        Ok(Msg {
                            loc: self.loc()?,
                            sel: self.str()?,
                            args: self.exprs()?,
                            fun: self.fun_ref()?,
                        })
                    })
                    .collect::<Result<_>>()?;
                Expr::Call(Call {
                    loc,
                    recv,
                    msgs,
                    ty: self.type_ref()?,
                })
            }
            EXPR_CTOR => {
                let loc = self.loc()?;
                let type_name = self.type_name()?;
                let case = match self.int()? {
                    -1 => None,
                    case => Some(
                        usize::try_from(case)
                            .map_err(|_| self.malformed(format!("invalid case index {case}")))?,
                    ),
                };
                Expr::Ctor(Ctor {
                    loc,
                    type_name,
                    case,
                    args: self.exprs()?,
                    ty: self.type_ref()?,
                })
            }
            EXPR_BLOCK => Expr::Block(Block {
                loc: self.loc()?,
                params: self.var_refs()?,
                stmts: self.stmts()?,
                ty: self.type_ref()?,
            }),
            EXPR_IDENT => Expr::Ident(Ident {
                loc: self.loc()?,
                name: self.str()?,
                var: self.var_ref()?,
                ty: self.type_ref()?,
            }),
            tag @ (EXPR_INT | EXPR_FLOAT | EXPR_STR) => {
                let lit = Lit {
                    loc: self.loc()?,
                    text: self.str()?,
                    ty: self.type_ref()?,
                };
                match tag {
                    EXPR_INT => Expr::Int(lit),
                    EXPR_FLOAT => Expr::Float(lit),
                    _ => Expr::Str(lit),
                }
            }
            other => return Err(self.malformed(format!("unknown expression tag {other}"))),
        })
    }
}
