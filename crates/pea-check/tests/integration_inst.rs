//! Canonical instances: equal requests, however they are spelled, reach
//! the same node.

mod common;

use common::{check, find_fun, find_type, messages, session, session_with, val_type};
use pea_check::inst::{instantiate_fun, instantiate_receiver, instantiate_type};
use pea_check::MemLoader;
use pea_check::types::TypeKind;

const BOXES: &str = "type (T) Box { v: T }
type IntBox := Int Box
type IntBox2 := IntBox
val a Int Box := [{Int Box | 1}]
val b IntBox2 := [{IntBox2 | 2}]
val c Int64 Box := [{Int64 Box | 3}]
";

#[test]
fn test_spellings_share_one_instance() {
    let (session, module) = check(BOXES);
    let store = session.store();

    let a = val_type(store, &module, "a");
    assert_eq!(val_type(store, &module, "b"), a);
    assert_eq!(val_type(store, &module, "c"), a);

    let generic = find_type(store, &module, "Box");
    assert_eq!(store.types[generic].insts, [a]);
    assert_eq!(store.types[a].def, generic);
    assert_eq!(store.display(a).to_string(), "Int64 Box");
}

#[test]
fn test_instantiate_type_is_memoized() {
    let (mut session, module) = check(BOXES);
    let generic = find_type(session.store(), &module, "Box");
    let expected = val_type(session.store(), &module, "a");
    let int = session.state().builtins().expect("builtins").int;
    let arg = session.store().type_name(int);

    let (inst, diags) = instantiate_type(session.state_mut(), generic, &[arg], None);
    assert!(diags.is_empty());
    assert_eq!(inst, Some(expected));
}

#[test]
fn test_instantiate_type_arity_mismatch() {
    let (mut session, module) = check(BOXES);
    let generic = find_type(session.store(), &module, "Box");
    let int = session.state().builtins().expect("builtins").int;
    let arg = session.store().type_name(int);

    let (inst, diags) = instantiate_type(session.state_mut(), generic, &[arg.clone(), arg], None);
    assert_eq!(inst, None);
    assert_eq!(diags.len(), 1);
}

#[test]
fn test_recursive_instance() {
    let (mut session, module) = check("type (T) Chain { head: T tail: T Chain& }");
    let generic = find_type(session.store(), &module, "Chain");
    let int = session.state().builtins().expect("builtins").int;
    let arg = session.store().type_name(int);

    let (inst, diags) = instantiate_type(session.state_mut(), generic, &[arg], None);
    assert!(diags.is_empty());
    let inst = inst.expect("instance");

    let store = session.store();
    let TypeKind::Fields(fields) = &store.types[inst].kind else {
        panic!("expected fields");
    };
    assert_eq!(store.vars[fields[0]].ty, Some(int));
    let tail = store.vars[fields[1]].ty.expect("tail type");
    assert_eq!(store.deref(tail), Some(inst));
}

#[test]
fn test_receiver_instances_are_memoized() {
    let (mut session, module) = check(
        "type (T) Box { v: T }
meth (T) Box [get ^T | ^self v]
val a := [{Int Box | 1}]
func [first ^Int | ^a get]",
    );
    let get = find_fun(session.store(), &module, "get");
    let recv = val_type(session.store(), &module, "a");

    let (first, diags) = instantiate_receiver(session.state_mut(), recv, get, None);
    assert!(diags.is_empty());
    let (second, _) = instantiate_receiver(session.state_mut(), recv, get, None);
    assert_eq!(first, second);

    let store = session.store();
    let first = first.expect("instance");
    assert_eq!(store.funs[get].insts, [first]);
    assert_eq!(store.funs[first].def, get);
    let int = session.state().builtins().expect("builtins").int;
    assert_eq!(store.funs[first].sig.ret.as_ref().and_then(|r| r.ty), Some(int));
}

#[test]
fn test_function_instances_are_memoized() {
    let (mut session, module) = check(
        "func (T) [pick: a T or: b T ^T | ^a]
func [one ^Int | ^pick: 1 or: 2]",
    );
    let pick = find_fun(session.store(), &module, "pick:or:");
    let int = session.state().builtins().expect("builtins").int;
    let int_name = session.store().type_name(int);

    let (inst, diags) = instantiate_fun(session.state_mut(), pick, &[int_name], None);
    assert!(diags.is_empty());
    let inst = inst.expect("instance");
    assert_eq!(session.store().funs[pick].insts, [inst]);

    let string = session.state().builtins().expect("builtins").string;
    let string_name = session.store().type_name(string);
    let (other, _) = instantiate_fun(session.state_mut(), pick, &[string_name], None);
    assert_ne!(other, Some(inst));
    assert_eq!(session.store().funs[pick].insts.len(), 2);
}

#[test]
fn test_inference_failure() {
    let errors = common::errors("func (T) [make: x Int ^T Box | ^make: x]\ntype (T) Box { v: T }\nfunc [g | make: 1]");
    assert!(errors.contains(&"cannot infer T".to_string()), "{errors:?}");
}

#[test]
fn test_failed_check_leaves_no_instances() {
    let mut session = session();
    let errors = session
        .check_source("m", "type (T) Box { v: T }\nval a Int Box := [{Int Box | 1}]\nval bad := [nope]")
        .map(|_| Vec::new())
        .unwrap_or_else(|diags| messages(&diags));
    assert_eq!(errors, ["undefined: nope"]);

    let module = session
        .check_source("m", "type (T) Box { v: T u: String }\nval a Int Box := [{Int Box | 1, \"x\"}]")
        .unwrap_or_else(|diags| panic!("{:?}", messages(&diags)));
    let store = session.store();
    let a = val_type(store, &module, "a");
    let TypeKind::Fields(fields) = &store.types[a].kind else {
        panic!("expected fields");
    };
    assert_eq!(fields.len(), 2);
    assert_eq!(store.types[find_type(store, &module, "Box")].insts, [a]);
}

#[test]
fn test_failed_check_unlinks_imported_generic_instances() {
    let loader = MemLoader::new().with_module("opt", &[("opt.pea", "type (T) Option { none | some: T }")]);
    let mut session = session_with(loader);
    let source = "import \"opt\"\ntype Foo { x: Int }\nfunc [get: o Foo #opt Option ^Int | ^0]";

    let errors = session
        .check_source("main", &format!("{source}\nval bad := [nope]"))
        .map(|_| Vec::new())
        .unwrap_or_else(|diags| messages(&diags));
    assert_eq!(errors, ["undefined: nope"]);

    let local_insts = |store: &pea_check::Store| {
        let option = store
            .types
            .iter()
            .find(|(_, t)| t.name == "Option" && t.module == "opt" && t.args.is_empty())
            .map(|(id, _)| id)
            .expect("generic");
        store.types[option]
            .insts
            .iter()
            .filter(|&&inst| {
                store.types[inst]
                    .args
                    .iter()
                    .any(|arg| arg.ty.is_some_and(|ty| store.types[ty].module == "main"))
            })
            .count()
    };
    assert_eq!(local_insts(session.store()), 0);

    session
        .check_source("main", source)
        .unwrap_or_else(|diags| panic!("{:?}", messages(&diags)));
    assert_eq!(local_insts(session.store()), 1);
}
