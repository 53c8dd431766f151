//! End-to-end parsing: source → lexer → parser → AST.

use pea_syntax::ast::{Def, Expr, Stmt, TypeBody};
use pea_syntax::loader::{parse_mod, scan_imports};
use pea_syntax::{Diagnostic, parse_source};

const LIST: &str = r#"
// A singly linked list.
import "fmt"

type (T) List { node: T Node | empty }
priv type (T) Node { head: T tail: T List }

meth (T) List [push: x T ^T List |
    ^{T List | node: {T Node | x, self}}
]

meth (T) List [size ^Int |
    n := 0.
    self ifNode: [:nd T Node& | n := nd tail size + 1] ifEmpty: [0].
    ^n
]

func [empty ^Int List | ^{Int List | empty}]

val three Int List := [
    empty push: 1; push: 2; push: 3
]
"#;

#[test]
fn test_parse_list_module() {
    let file = parse_source("list.pea", LIST).unwrap();
    assert_eq!(file.defs.len(), 7);
    assert_eq!(file.imports().count(), 1);

    let Def::Type(list) = &file.defs[1] else {
        panic!("expected a type")
    };
    assert_eq!(list.params.len(), 1);
    assert!(matches!(&list.body, TypeBody::Cases(cases) if cases[0].name == "node"));

    let Def::Type(node) = &file.defs[2] else {
        panic!("expected a type")
    };
    assert!(node.private);

    let Def::Fun(size) = &file.defs[4] else {
        panic!("expected a method")
    };
    assert_eq!(size.sig.sel, "size");
    assert_eq!(size.body.as_ref().map(Vec::len), Some(3));

    let Def::Val(three) = &file.defs[6] else {
        panic!("expected a value")
    };
    let Stmt::Expr(Expr::Call(call)) = &three.init[0] else {
        panic!("expected a cascade")
    };
    assert_eq!(call.msgs.len(), 3);
}

#[test]
fn test_parse_empty_file() {
    let file = parse_source("empty.pea", "  // nothing here\n").unwrap();
    assert!(file.defs.is_empty());
}

#[test]
fn test_module_from_several_files() {
    let module = parse_mod(
        "shapes",
        &[
            ("shapes/circle.pea", "import \"math\"\ntype Circle { r: Float }"),
            ("shapes/square.pea", "type Square { side: Float }"),
        ],
    )
    .unwrap();
    assert_eq!(module.path, "shapes");
    assert_eq!(module.files[1].path.as_ref(), "shapes/square.pea");
    assert_eq!(scan_imports(&module), ["math"]);
}

#[test]
fn test_syntax_error_as_diagnostic() {
    let err = parse_source("bad.pea", "type Point { x: Int y }").unwrap_err();
    let diag = Diagnostic::from(err);
    assert_eq!(
        diag.to_string(),
        "bad.pea:1:21: error: expected field, found identifier 'y'"
    );
}
