//! Export then import: the copy is the same graph, node for node.

mod common;

use common::{Iso, check, find_type, find_val, session_with};
use pea_check::types::TypeKind;
use pea_check::{Defect, MemLoader, Store, codec};

const MODULE: &str = "type (T) Pair { first: T second: T }
type (T) Opt { none | some: T }
type Sized { [size ^Int] }

val origin := [{Int Pair | 0, 0}]
val count Int := [3]
val total := [count + 1]

func [zero ^Int | ^0]
func [add: a Int to: b Int ^Int | ^a + b]

meth (T) Pair [swap ^T Pair | ^{T Pair | self second, self first}]
meth (T) Pair [+ other T Pair ^T Pair | ^other]
meth (T) Pair [with: a T and: b T ^T Pair | ^{T Pair | a, b}]
meth (T) Pair [size ^Int | x T := self first. ^2]

func [swapped ^Int Pair | ^origin swap]
func [get: o Int Opt ^Int | ^o ifNone: [0] ifSome: [:x | 1]]
func [measure: s Sized ^Int | ^s size]
func [pairSize ^Int | ^measure: origin]
";

#[test]
fn test_round_trip_is_isomorphic() {
    let (session, module) = check(MODULE);
    let bytes = codec::export(session.store(), &module).expect("exports");

    let mut store = Store::new();
    let copy = codec::import(&mut store, &bytes).expect("imports");
    assert!(copy.ast.is_none());

    Iso::new(session.store(), &store).module(&module, &copy);
}

#[test]
fn test_value_order_is_rebuilt() {
    let (session, module) = check("val b := [a + 1]\nval a := [2]");
    let bytes = codec::export(session.store(), &module).expect("exports");

    let mut store = Store::new();
    let copy = codec::import(&mut store, &bytes).expect("imports");
    let order: Vec<_> = copy.vals.iter().map(|&v| store.vals[v].name.as_str()).collect();
    assert_eq!(order, ["a", "b"]);
}

#[test]
fn test_annotations_survive() {
    let (session, module) = check(MODULE);
    let bytes = codec::export(session.store(), &module).expect("exports");

    let mut store = Store::new();
    let copy = codec::import(&mut store, &bytes).expect("imports");

    let count = find_val(&store, &copy, "count");
    let name = store.vars[store.vals[count].var].type_name.as_ref().expect("annotation");
    assert_eq!(name.name, "Int");

    let origin = find_val(&store, &copy, "origin");
    let var = &store.vars[store.vals[origin].var];
    let name = var.type_name.as_ref().expect("rebuilt name");
    assert_eq!(name.name, "Pair");
    assert_eq!(name.ty, var.ty);
}

#[test]
fn test_generic_instances_travel_with_generic() {
    let (session, module) = check(MODULE);
    let bytes = codec::export(session.store(), &module).expect("exports");

    let mut store = Store::new();
    let copy = codec::import(&mut store, &bytes).expect("imports");

    let pair = find_type(&store, &copy, "Pair");
    let original = find_type(session.store(), &module, "Pair");
    assert_eq!(store.types[pair].insts.len(), session.store().types[original].insts.len());
    for &inst in &store.types[pair].insts {
        assert_eq!(store.types[inst].def, pair);
        assert!(matches!(store.types[inst].kind, TypeKind::Fields(_)));
    }
}

#[test]
fn test_import_into_populated_store() {
    let (mut session, module) = check(MODULE);
    let bytes = codec::export(session.store(), &module).expect("exports");
    let before = session.store().types.len();

    let store = &mut session.state_mut().store;
    let copy = codec::import(store, &bytes).expect("imports");
    assert!(store.types.len() > before);
    assert_eq!(copy.defs.len(), module.defs.len());
    assert_ne!(copy.defs, module.defs);
}

#[test]
fn test_exported_module_with_imports() {
    let loader = MemLoader::new().with_module("geo", &[("geo.pea", "type Point { x: Int y: Int }")]);
    let mut session = session_with(loader);
    let module = session
        .check_source("main", "import \"geo\"\nfunc [origin ^#geo Point | ^{#geo Point | 0, 0}]")
        .expect("checks");
    let bytes = codec::export(session.store(), &module).expect("exports");

    let mut store = Store::new();
    let copy = codec::import(&mut store, &bytes).expect("imports");
    Iso::new(session.store(), &store).module(&module, &copy);

    let points: Vec<_> = store.types.iter().filter(|(_, t)| t.name == "Point").collect();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].1.module, "geo");
}

#[test]
fn test_every_truncation_is_rejected() {
    let (session, module) = check("type (T) Box { v: T }\nval b := [{Int Box | 1}]");
    let bytes = codec::export(session.store(), &module).expect("exports");
    for len in 0..bytes.len() {
        let err = codec::import(&mut Store::new(), &bytes[..len]).unwrap_err();
        assert!(
            matches!(err, Defect::Malformed { .. } | Defect::Dangling { .. }),
            "prefix {len}: {err}"
        );
    }
}

#[test]
fn test_failed_import_leaves_store_untouched() {
    let (session, module) = check("type (T) Box { v: T }\nfunc [f: b Int Box ^Int | ^b v]");
    let bytes = codec::export(session.store(), &module).expect("exports");

    let mut store = Store::new();
    let copy = codec::import(&mut store, &bytes).expect("imports");
    let mark = store.mark();
    for len in 0..bytes.len() {
        assert!(codec::import(&mut store, &bytes[..len]).is_err(), "prefix {len}");
        assert_eq!(store.mark(), mark, "prefix {len}");
    }

    assert_eq!(store.types.iter().count(), store.types.len());
    assert_eq!(store.funs.iter().count(), store.funs.len());
    assert_eq!(store.vars.iter().count(), store.vars.len());
    Iso::new(session.store(), &store).module(&module, &copy);
}
