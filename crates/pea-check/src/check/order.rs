//! Initialization order of module values.
//!
//! Checking records which values and functions each definition uses. A
//! value depends on the values it uses directly and on those used by any
//! function it calls, transitively. Values are initialized dependencies
//! first; a cycle is an error.

use std::collections::VecDeque;

use pea_syntax::{DiagnosticBuilder, Level};

use crate::context::{FxMap, FxSet, State};
use crate::types::{Def, Expr, Msg, Stmt, Store, ValId, VarId, VarRole};

/// Definitions used by each definition, in order of first use.
pub(crate) type Deps = FxMap<Def, Vec<Def>>;

/// The values `def` needs initialized before it runs.
pub(crate) fn val_deps(deps: &Deps, def: Def) -> Vec<ValId> {
    let mut vals = Vec::new();
    let mut seen: FxSet<Def> = FxSet::default();
    let mut queue = VecDeque::from([def]);
    seen.insert(def);

    while let Some(next) = queue.pop_front() {
        for &used in deps.get(&next).into_iter().flatten() {
            match used {
                Def::Val(val) if !vals.contains(&val) => vals.push(val),
                Def::Fun(_) if seen.insert(used) => queue.push_back(used),
                _ => {}
            }
        }
    }
    vals
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Active,
    Done,
}

struct Sort {
    deps: FxMap<ValId, Vec<ValId>>,
    marks: FxMap<ValId, Mark>,
    stack: Vec<ValId>,
    order: Vec<ValId>,
    cycles: Vec<Vec<ValId>>,
}

/// Orders `vals` dependencies first. Returns the order and every cycle
/// found, each listed from the value where it was entered.
pub(crate) fn toposort(deps: &Deps, vals: &[ValId]) -> (Vec<ValId>, Vec<Vec<ValId>>) {
    let deps = vals
        .iter()
        .map(|&val| {
            let mut direct = val_deps(deps, Def::Val(val));
            direct.retain(|dep| vals.contains(dep));
            (val, direct)
        })
        .collect();
    let mut sort = Sort {
        deps,
        marks: FxMap::default(),
        stack: Vec::new(),
        order: Vec::with_capacity(vals.len()),
        cycles: Vec::new(),
    };
    for &val in vals {
        visit(&mut sort, val);
    }
    (sort.order, sort.cycles)
}

fn visit(sort: &mut Sort, val: ValId) {
    match sort.marks.get(&val) {
        Some(Mark::Done) => return,
        Some(Mark::Active) => {
            if let Some(start) = sort.stack.iter().position(|&v| v == val) {
                sort.cycles.push(sort.stack[start..].to_vec());
            }
            return;
        }
        None => {}
    }

    sort.marks.insert(val, Mark::Active);
    sort.stack.push(val);
    let deps = sort.deps.get(&val).cloned().unwrap_or_default();
    for dep in deps {
        visit(sort, dep);
    }
    sort.stack.pop();
    sort.marks.insert(val, Mark::Done);
    sort.order.push(val);
}

/// Orders the module's values, reporting each initialization cycle.
pub(crate) fn sort_vals(state: &mut State, vals: &[ValId]) -> Vec<ValId> {
    let (order, cycles) = toposort(&state.deps, vals);
    for cycle in cycles {
        let store = &state.store;
        let mut diag = DiagnosticBuilder::new(Level::Error, "initialization cycle")
            .at_opt(cycle.first().and_then(|&val| store.vals[val].loc.clone()));
        for val in cycle {
            let v = &store.vals[val];
            diag = diag.note(v.name.clone(), v.loc.clone());
        }
        state.report(diag.build());
    }
    order
}

/// Recomputes the dependencies of `defs` from their checked trees, for
/// modules read back without their checking state.
pub(crate) fn tree_deps(store: &Store, defs: &[Def]) -> Deps {
    let val_of: FxMap<VarId, ValId> = defs
        .iter()
        .filter_map(|&def| match def {
            Def::Val(val) => Some((store.vals[val].var, val)),
            _ => None,
        })
        .collect();

    let mut deps = Deps::default();
    for &def in defs {
        let mut walk = Walk {
            store,
            val_of: &val_of,
            used: Vec::new(),
        };
        match def {
            Def::Val(val) => walk.stmts(&store.vals[val].init),
            Def::Fun(fun) => {
                if let Some(body) = &store.funs[fun].body {
                    walk.stmts(body);
                }
            }
            Def::Type(_) => continue,
        }
        if !walk.used.is_empty() {
            deps.insert(def, walk.used);
        }
    }
    deps
}

struct Walk<'a> {
    store: &'a Store,
    val_of: &'a FxMap<VarId, ValId>,
    used: Vec<Def>,
}

impl Walk<'_> {
    fn use_def(&mut self, def: Def) {
        if !self.used.contains(&def) {
            self.used.push(def);
        }
    }

    fn var(&mut self, var: VarId) {
        if self.store.vars[var].role == VarRole::Val {
            if let Some(&val) = self.val_of.get(&var) {
                self.use_def(Def::Val(val));
            }
        }
    }

    fn stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            match stmt {
                Stmt::Ret(ret) => self.expr(&ret.expr),
                Stmt::Assign(assign) => {
                    self.var(assign.var);
                    self.expr(&assign.expr);
                }
                Stmt::Expr(expr) => self.expr(expr),
            }
        }
    }

    fn msg(&mut self, msg: &Msg) {
        if let Some(fun) = msg.fun {
            let generic = self.store.funs[fun].def;
            self.use_def(Def::Fun(generic));
        }
        for arg in &msg.args {
            self.expr(arg);
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Call(call) => {
                if let Some(recv) = &call.recv {
                    self.expr(recv);
                }
                for msg in &call.msgs {
                    self.msg(msg);
                }
            }
            Expr::Ctor(ctor) => {
                for arg in &ctor.args {
                    self.expr(arg);
                }
            }
            Expr::Block(block) => self.stmts(&block.stmts),
            Expr::Ident(ident) => {
                if let Some(var) = ident.var {
                    self.var(var);
                }
            }
            Expr::Int(_) | Expr::Float(_) | Expr::Str(_) => {}
        }
    }
}
