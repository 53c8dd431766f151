//! The universal module.
//!
//! Builtin types and methods are ordinary Pea source, expanded from
//! [`TEMPLATE`] and checked like any other module. Expansion fills in the
//! configured `Int` and `Float` widths and repeats the numeric methods for
//! every numeric type and the `value` methods for every `Fun` arity.
//! Declarations without a body are recognized as builtins by name (types)
//! and selector (methods).

use std::rc::Rc;

use crate::config::{FloatSize, IntSize};
use crate::context::{Builtins, State};
use crate::infer::inst::inst_type;
use crate::types::{Def, TypeId};

/// Highest `Fun` arity: eight parameters and a result.
pub const MAX_FUN_ARITY: usize = 9;

const INTS: [&str; 8] = [
    "Int8", "Int16", "Int32", "Int64", "UInt8", "UInt16", "UInt32", "UInt64",
];

const FLOATS: [&str; 2] = ["Float32", "Float64"];

const TEMPLATE: &str = r"// The universal module.

type Nil {}
type Bool { false | true }

type Int8
type Int16
type Int32
type Int64
type UInt8
type UInt16
type UInt32
type UInt64
type Float32
type Float64
type String
type (T) &
type (T) Array

type Int := Int{{int}}
type UInt := UInt{{int}}
type Float := Float{{float}}

meth String [= x String ^Bool]
meth String [!= x String ^Bool]
meth String [size ^Int]
meth String [print]

meth (T) Array [size ^Int]
meth (T) Array [at: i Int ^T&]
meth (T) Array [at: i Int put: x T]

{{numeric}}
{{funs}}";

/// Bits of the discriminant of an or-type with `cases` cases, or `None`
/// when no discriminant is wide enough.
///
/// ```
/// use pea_check::builtin::tag_bits;
///
/// assert_eq!(tag_bits(255), Some(8));
/// assert_eq!(tag_bits(256), Some(16));
/// assert_eq!(tag_bits(65_536), Some(32));
/// ```
#[must_use]
pub fn tag_bits(cases: usize) -> Option<u32> {
    let cases = cases as u64;
    if cases < 1 << 8 {
        Some(8)
    } else if cases < 1 << 16 {
        Some(16)
    } else if cases < 1 << 32 {
        Some(32)
    } else {
        None
    }
}

fn numeric_methods(out: &mut String, ty: &str, integer: bool) {
    let mut ops = vec!["+", "-", "*", "/"];
    if integer {
        ops.push("%");
    }
    for op in ops {
        out.push_str(&format!("meth {ty} [{op} x {ty} ^{ty}]\n"));
    }
    out.push_str(&format!("meth {ty} [neg ^{ty}]\n"));
    for op in ["=", "!=", "<", "<=", ">", ">="] {
        out.push_str(&format!("meth {ty} [{op} x {ty} ^Bool]\n"));
    }
    out.push_str(&format!("meth {ty} [print]\n"));
}

fn fun_types(out: &mut String) {
    for arity in 1..=MAX_FUN_ARITY {
        let params: Vec<String> = (0..arity - 1).map(|i| format!("T{i}")).collect();
        let mut tparams = params.clone();
        tparams.push("R".to_string());
        let tparams = tparams.join(", ");

        out.push_str(&format!("type ({tparams}) Fun\n"));
        let sig = if params.is_empty() {
            "value".to_string()
        } else {
            params
                .iter()
                .enumerate()
                .map(|(i, p)| format!("value: x{i} {p}"))
                .collect::<Vec<_>>()
                .join(" ")
        };
        out.push_str(&format!("meth ({tparams}) Fun [{sig} ^R]\n"));
    }
}

/// The source of the universal module for the given widths.
#[must_use]
pub fn universe_source(int_size: IntSize, float_size: FloatSize) -> String {
    let mut numeric = String::new();
    for ty in INTS {
        numeric_methods(&mut numeric, ty, true);
    }
    for ty in FLOATS {
        numeric_methods(&mut numeric, ty, false);
    }
    let mut funs = String::new();
    fun_types(&mut funs);

    TEMPLATE
        .replace("{{int}}", &int_size.bits().to_string())
        .replace("{{float}}", &float_size.bits().to_string())
        .replace("{{numeric}}", &numeric)
        .replace("{{funs}}", &funs)
}

fn find_type(state: &State, defs: &[Def], name: &str, arity: usize) -> Option<TypeId> {
    defs.iter().find_map(|&def| match def {
        Def::Type(ty) => {
            let t = &state.store.types[ty];
            (t.name == name && t.arity == arity).then_some(ty)
        }
        _ => None,
    })
}

/// Finds the types the checker needs by identity among the checked
/// universal definitions.
pub(crate) fn resolve_builtins(state: &mut State, defs: &[Def]) -> Option<Builtins> {
    let mut funs = Vec::with_capacity(MAX_FUN_ARITY);
    for arity in 1..=MAX_FUN_ARITY {
        funs.push(find_type(state, defs, "Fun", arity)?);
    }
    let int = find_type(state, defs, "Int", 0)?;
    let float = find_type(state, defs, "Float", 0)?;
    Some(Builtins {
        nil: find_type(state, defs, "Nil", 0)?,
        bool: find_type(state, defs, "Bool", 0)?,
        int: inst_type(state, int, Vec::new(), None)?,
        float: inst_type(state, float, Vec::new(), None)?,
        string: find_type(state, defs, "String", 0)?,
        ref_: find_type(state, defs, "&", 1)?,
        array: find_type(state, defs, "Array", 1)?,
        funs,
    })
}

/// The module's canonical `Int`: the universal alias, followed.
pub(crate) fn canonical_int(state: &mut State, defs: &[Def]) -> Option<TypeId> {
    let universe = Rc::clone(&state.universe);
    let defs = if universe.is_empty() { defs } else { &universe };
    let int = find_type(state, defs, "Int", 0)?;
    inst_type(state, int, Vec::new(), None)
}
