//! Imports through a loader: qualified names, privacy, caching and cycles.

mod common;

use common::{messages, session_with, val_type};
use pea_check::MemLoader;

fn geo() -> MemLoader {
    MemLoader::new()
        .with_module(
            "geo",
            &[
                ("point.pea", "type Point { x: Int y: Int }\nfunc [origin ^Point | ^{Point | 0, 0}]"),
                ("secret.pea", "priv val secret := [42]"),
            ],
        )
        .with_module("shapes", &[("shapes.pea", "import \"geo\"\ntype Line { a: #geo Point b: #geo Point }")])
}

#[test]
fn test_qualified_type() {
    let mut session = session_with(geo());
    let module = session
        .check_source("main", "import \"geo\"\nval p := [origin]\nval q #geo Point := [p]")
        .unwrap_or_else(|diags| panic!("{:?}", messages(&diags)));

    let store = session.store();
    let p = val_type(store, &module, "p");
    assert_eq!(val_type(store, &module, "q"), p);
    assert_eq!(store.types[p].module, "geo");
    assert_eq!(store.types[p].name, "Point");
}

#[test]
fn test_private_definitions_stay_hidden() {
    let mut session = session_with(geo());
    let errors = session
        .check_source("main", "import \"geo\"\nval s := [secret]")
        .map(|_| Vec::new())
        .unwrap_or_else(|diags| messages(&diags));
    assert_eq!(errors, ["undefined: secret"]);
}

#[test]
fn test_undefined_module_qualifier() {
    let mut session = session_with(geo());
    let errors = session
        .check_source("main", "val p #geo Point := [1]")
        .map(|_| Vec::new())
        .unwrap_or_else(|diags| messages(&diags));
    assert_eq!(errors, ["undefined module: #geo"]);
}

#[test]
fn test_imports_are_shared() {
    let mut session = session_with(geo());
    let module = session
        .check_source("main", "import \"geo\"\nimport \"shapes\"\nfunc [p ^#geo Point | ^origin]")
        .unwrap_or_else(|diags| panic!("{:?}", messages(&diags)));
    assert_eq!(module.defs.len(), 1);

    // geo reached directly and through shapes is the same module.
    let store = session.store();
    let points: Vec<_> = store
        .types
        .iter()
        .filter(|(_, t)| t.name == "Point" && t.module == "geo")
        .collect();
    assert_eq!(points.len(), 1);
    let (point, _) = points[0];
    assert!(store.types[point].src.is_none());
}

#[test]
fn test_missing_import() {
    let mut session = session_with(geo());
    let errors = session
        .check_source("main", "import \"nope\"")
        .map(|_| Vec::new())
        .unwrap_or_else(|diags| messages(&diags));
    assert_eq!(errors, ["import \"nope\" not found"]);
}

#[test]
fn test_import_errors_pass_through() {
    let loader = MemLoader::new().with_module("bad", &[("bad.pea", "val x := [y]")]);
    let mut session = session_with(loader);
    let errors = session
        .check_source("main", "import \"bad\"")
        .map(|_| Vec::new())
        .unwrap_or_else(|diags| messages(&diags));
    assert_eq!(errors, ["undefined: y"]);
}

#[test]
fn test_import_cycle() {
    let loader = MemLoader::new()
        .with_module("foo", &[("foo.pea", "import \"bar\"\nval a := [1]")])
        .with_module("bar", &[("bar.pea", "import \"foo\"\nval b := [2]")]);
    let mut session = session_with(loader);

    let errors = session
        .check_source("main", "import \"foo\"")
        .map(|_| Vec::new())
        .unwrap_or_else(|diags| messages(&diags));
    assert_eq!(errors, ["import cycle: [main, foo, bar, foo]"]);

    let errors = session
        .check_source("other", "import \"bar\"")
        .map(|_| Vec::new())
        .unwrap_or_else(|diags| messages(&diags));
    assert_eq!(errors, ["failed to import \"bar\""]);
}

#[test]
fn test_imported_generic_instantiated_locally() {
    let loader = MemLoader::new().with_module("opt", &[("opt.pea", "type (T) Option { none | some: T }")]);
    let mut session = session_with(loader);
    let module = session
        .check_source(
            "main",
            "import \"opt\"\nfunc [get: o Int #opt Option ^Int | ^o ifNone: [0] ifSome: [:x | 1]]",
        )
        .unwrap_or_else(|diags| panic!("{:?}", messages(&diags)));
    assert_eq!(module.defs.len(), 1);

    let store = session.store();
    let option = store
        .types
        .iter()
        .find(|(_, t)| t.name == "Option" && t.module == "opt" && t.args.is_empty())
        .map(|(id, _)| id)
        .expect("generic");
    assert!(store.types[option].insts.iter().any(|&inst| store.display(inst).to_string() == "Int64 Option"));
}

#[test]
fn test_import_cycle_from_member() {
    let loader = MemLoader::new().with_module("bar", &[("bar.pea", "import \"foo\"\nval b := [2]")]);
    let mut session = session_with(loader);
    let errors = session
        .check_source("foo", "import \"bar\"\nval a := [1]")
        .map(|_| Vec::new())
        .unwrap_or_else(|diags| messages(&diags));
    assert_eq!(errors, ["import cycle: [foo, bar, foo]"]);
}
