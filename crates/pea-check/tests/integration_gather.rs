//! Gathering whole modules: declarations, synthesized methods, and the
//! errors reported while resolving them.

mod common;

use common::{check, errors, find_fun, find_type, val_type};
use pea_check::types::{BuiltinMeth, TypeKind};

// ============================================================================
// Aliases
// ============================================================================

#[test]
fn test_alias_cycle_reported_once() {
    let diags = common::session()
        .check_source("m", "type A := B\ntype B := C\ntype C := A")
        .unwrap_err();
    assert_eq!(common::messages(&diags), ["type alias cycle"]);

    let notes: Vec<_> = diags[0].notes.iter().map(|n| n.message.as_str()).collect();
    assert_eq!(notes, ["A", "B", "C"]);
}

#[test]
fn test_alias_chain_resolves() {
    let (session, module) = check("type A := B\ntype B := Int\nval x A := [1]");
    let store = session.store();
    let int = session.state().builtins().expect("builtins").int;
    assert_eq!(val_type(store, &module, "x"), int);
}

#[test]
fn test_alias_through_record_is_not_a_cycle() {
    for source in ["type A := B\ntype B { x: A& }", "type B { x: A& }\ntype A := B"] {
        let (session, module) = check(source);
        let store = session.store();
        let b = find_type(store, &module, "B");
        let TypeKind::Fields(fields) = &store.types[b].kind else {
            panic!("expected fields");
        };
        let x = store.vars[fields[0]].ty.expect("field type");
        assert_eq!(store.deref(x), Some(b), "{source}");
    }
}

#[test]
fn test_alias_cycle_through_record_chain() {
    assert_eq!(
        errors("type A := B\ntype B := A\ntype C { x: A& }"),
        ["type alias cycle"]
    );
    assert!(errors("type A := B\ntype B { x: C& }\ntype C := A").is_empty());
}

// ============================================================================
// Redefinition
// ============================================================================

#[test]
fn test_redefined_value() {
    let mut session = common::session();
    let diags = session.check_source("m", "val x := [1]\nval x := [2]").unwrap_err();
    assert_eq!(common::messages(&diags), ["x redefined"]);
    assert_eq!(diags[0].notes[0].message, "previous definition");
}

#[test]
fn test_types_keyed_by_arity() {
    assert!(errors("type Box { v: Int }\ntype (T) Box { v: T }").is_empty());
    assert_eq!(
        errors("type (T) Box { v: T }\ntype (U) Box { w: U }"),
        ["Box redefined"]
    );
}

#[test]
fn test_redefined_function() {
    assert_eq!(errors("func [f ^Int | ^1]\nfunc [f ^Int | ^2]"), ["f redefined"]);
    assert_eq!(errors("val f := [1]\nfunc [f ^Int | ^2]"), ["f redefined"]);
}

// ============================================================================
// Type parameters
// ============================================================================

#[test]
fn test_unused_type_parameters() {
    assert_eq!(errors("type (T) Phantom { x: Int }"), ["T defined and not used"]);
    assert_eq!(errors("func (T) [make ^Int | ^1]"), ["T defined and not used"]);
    assert_eq!(
        errors("type (T) Box { v: T }\nmeth (T) Box [one ^Int | ^1]"),
        ["T defined and not used"]
    );
}

#[test]
fn test_used_type_parameters() {
    assert!(errors("type (T) Box { v: T }\nmeth (T) Box [get ^T | ^self v]").is_empty());
    assert!(errors("type (_) Tagged { x: Int }").is_empty());
    assert!(errors("type (T) Handle").is_empty());
}

#[test]
fn test_synthesized_methods_on_generics_check() {
    assert!(errors("type (T) Opt { none | some: T }\ntype (T) Sink { [put: x T] }").is_empty());
}

// ============================================================================
// Or-types
// ============================================================================

fn cases(n: usize) -> String {
    let cases: Vec<String> = (0..n).map(|i| format!("c{i}")).collect();
    format!("type Big {{ {} }}", cases.join(" | "))
}

#[test]
fn test_tag_width_follows_case_count() {
    let (session, module) = check(&cases(255));
    let store = session.store();
    let big = find_type(store, &module, "Big");
    let tag = store.types[big].tag.expect("tag");
    assert_eq!(store.types[tag].name, "UInt8");

    let (session, module) = check(&cases(256));
    let store = session.store();
    let big = find_type(store, &module, "Big");
    let tag = store.types[big].tag.expect("tag");
    assert_eq!(store.types[tag].name, "UInt16");
}

#[test]
fn test_case_method_signature() {
    let (session, module) = check("type IntOrString { int: Int | string: String }");
    let store = session.store();
    let fun = find_fun(store, &module, "ifInt:ifString:");
    let f = &store.funs[fun];

    assert_eq!(f.builtin, Some(BuiltinMeth::Case));
    assert_eq!(f.tparams.len(), 1);
    let params: Vec<String> = f.sig.params[1..]
        .iter()
        .map(|&p| store.vars[p].type_name.as_ref().expect("written type").to_string())
        .collect();
    assert_eq!(params, ["(Int&, R) Fun", "(String&, R) Fun"]);
    assert_eq!(f.sig.ret.as_ref().map(ToString::to_string).as_deref(), Some("R"));
}

#[test]
fn test_case_call_infers_result() {
    let (session, module) = check(
        "type IntOrString { int: Int | string: String }\n\
         func [pick: x IntOrString ^Int | ^x ifInt: [:i | 1] ifString: [:s | 2]]",
    );
    let store = session.store();
    let pick = find_fun(store, &module, "pick:");
    let int = session.state().builtins().expect("builtins").int;
    assert_eq!(store.funs[pick].sig.ret.as_ref().and_then(|r| r.ty), Some(int));
}

#[test]
fn test_case_without_payload_matches_keyword() {
    assert!(
        errors(
            "type (T) Opt { none | some: T }\n\
             func [get: o Int Opt ^Int | ^o ifNone: [0] ifSome: [:x | 1]]"
        )
        .is_empty()
    );
}

#[test]
fn test_case_result_name_avoids_parameters() {
    let (session, module) = check("type (R) Res { ok: R | err: String }");
    let store = session.store();
    let fun = find_fun(store, &module, "ifOk:ifErr:");
    let tv = store.funs[fun].tparams[0];
    assert_eq!(store.tvars[tv].name, "R0");
}

#[test]
fn test_constructor_errors() {
    assert_eq!(
        errors("type (T) Opt { none | some: T }\nval o := [{Int Opt | other: 1}]"),
        ["Int64 Opt has no case other"]
    );
    assert_eq!(
        errors("type (T) Opt { none | some: T }\nval o := [{Int Opt | none: 1}]"),
        ["case none has no value"]
    );
}

// ============================================================================
// Virtual types
// ============================================================================

const SHAPES: &str = "type Shape { [area ^Int] }
type Sq { s: Int }
meth Sq [area ^Int | ^self s]
func [measure: x Shape ^Int | ^x area]
";

#[test]
fn test_virtual_conversion() {
    let source = format!("{SHAPES}func [use ^Int | ^measure: {{Sq | 2}}]");
    let (session, module) = check(&source);
    let store = session.store();
    let shape = find_type(store, &module, "Shape");
    assert!(matches!(&store.types[shape].kind, TypeKind::Virts(sigs) if sigs.len() == 1));

    let area = module
        .defs
        .iter()
        .filter_map(|&def| match def {
            pea_check::Def::Fun(fun) => Some(fun),
            _ => None,
        })
        .find(|&fun| store.funs[fun].builtin == Some(BuiltinMeth::Virt))
        .expect("virtual method");
    assert_eq!(store.funs[area].sig.sel, "area");
}

#[test]
fn test_virtual_conversion_requires_methods() {
    let source = format!("{SHAPES}type Circle {{ r: Int }}\nfunc [use ^Int | ^measure: {{Circle | 1}}]");
    assert_eq!(errors(&source), ["type mismatch: expected Shape, got Circle"]);
}

#[test]
fn test_bound_enforced_at_instantiation() {
    let source = format!(
        "{SHAPES}type (T Shape) Holder {{ v: T }}\ntype Circle {{ r: Int }}\nval h := [{{Circle Holder | {{Circle | 1}}}}]"
    );
    assert_eq!(errors(&source), ["Circle does not implement Shape: missing area"]);
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_call_errors() {
    assert_eq!(errors("func [f ^Int | ^1 frob]"), ["Int64 has no method frob"]);
    assert_eq!(
        errors("func [f: x Int ^Int | ^x]\nfunc [g ^Int | ^f: 1]\nval y := [undefinedThing]"),
        ["undefined: undefinedThing"]
    );
    assert_eq!(errors("val x Int8 := [128]"), ["128 overflows Int8"]);
}

#[test]
fn test_assignment_defines_or_assigns() {
    assert!(errors("val total := [0]\nfunc [bump ^Int | total := total + 1. ^total]").is_empty());
    assert_eq!(
        errors("func [f ^Int | x String := 1. ^0]"),
        ["type mismatch: expected String, got Int64"]
    );
}

#[test]
fn test_initialization_cycle() {
    let mut session = common::session();
    let diags = session
        .check_source("m", "val a := [b]\nval b := [f]\nfunc [f ^Int | ^a]")
        .unwrap_err();
    assert_eq!(common::messages(&diags), ["initialization cycle"]);
    assert_eq!(diags[0].notes.len(), 2);
}

#[test]
fn test_initialization_order() {
    let (session, module) = check("val a := [b + 1]\nval b := [f]\nfunc [f ^Int | ^2]");
    let store = session.store();
    let order: Vec<_> = module.vals.iter().map(|&v| store.vals[v].name.as_str()).collect();
    assert_eq!(order, ["b", "a"]);
}
