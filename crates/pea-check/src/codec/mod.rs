//! Binary form of a checked module.
//!
//! The stream holds the module's definitions plus every node they reach:
//!
//! ```text
//! string   module path
//! i32      definition count
//! ...      definition records
//! i32      id of the module's Int type, -1 if none
//! repeat:
//!   i32    pending count
//!   ...    pending records
//! until pending count == 0
//! ```
//!
//! Each record starts with its tag (`VAL=1`, `FUN=2`, `TYPE=3`, `VAR=4`)
//! and its id. Ids are handed out the first time a node is mentioned, so a
//! record may refer to nodes written later, or never written before the
//! pass that picks them up. Integers are `i32` little-endian; strings are a
//! length then raw bytes; a missing reference is `-1`.
//!
//! Reading reserves an arena slot on the first mention of an id and fills it
//! when the record arrives. Generic `insts` lists, variable type names and
//! the value initialization order are rebuilt rather than stored. The
//! result is self-contained: the types of the universal module it uses are
//! read into the target store like any other node.
//!
//! # Examples
//!
//! ```
//! use pea_check::types::Store;
//! use pea_check::{Config, Session, codec};
//!
//! let mut session = Session::new(Config::default()).expect("universe");
//! let module = session.check_source("geo", "type Point { x: Int y: Int }").expect("checks");
//!
//! let bytes = codec::export(session.store(), &module).expect("exports");
//! let mut store = Store::new();
//! let copy = codec::import(&mut store, &bytes).expect("imports");
//! assert_eq!(copy.path, "geo");
//! assert_eq!(store.def_name(copy.defs[0]), "Point");
//! ```

mod read;
mod write;

use crate::error::Result;
use crate::types::{Def, FunId, Mod, Store, TypeId, ValId, VarId};

const VAL: i32 = 1;
const FUN: i32 = 2;
const TYPE: i32 = 3;
const VAR: i32 = 4;

const KIND_OPAQUE: i32 = 0;
const KIND_ALIAS: i32 = 1;
const KIND_FIELDS: i32 = 2;
const KIND_CASES: i32 = 3;
const KIND_VIRTS: i32 = 4;

const STMT_RET: i32 = 0;
const STMT_ASSIGN: i32 = 1;
const STMT_EXPR: i32 = 2;

const EXPR_CALL: i32 = 0;
const EXPR_CTOR: i32 = 1;
const EXPR_BLOCK: i32 = 2;
const EXPR_IDENT: i32 = 3;
const EXPR_INT: i32 = 4;
const EXPR_FLOAT: i32 = 5;
const EXPR_STR: i32 = 6;

/// A node with a record of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Obj {
    Val(ValId),
    Fun(FunId),
    Type(TypeId),
    Var(VarId),
}

impl Obj {
    fn tag(self) -> i32 {
        match self {
            Obj::Val(_) => VAL,
            Obj::Fun(_) => FUN,
            Obj::Type(_) => TYPE,
            Obj::Var(_) => VAR,
        }
    }

    fn kind(tag: i32) -> &'static str {
        match tag {
            VAL => "value",
            FUN => "function",
            TYPE => "type",
            _ => "variable",
        }
    }
}

impl From<Def> for Obj {
    fn from(def: Def) -> Self {
        match def {
            Def::Val(id) => Obj::Val(id),
            Def::Fun(id) => Obj::Fun(id),
            Def::Type(id) => Obj::Type(id),
        }
    }
}

/// Serializes `module` and everything its definitions reach.
///
/// # Errors
///
/// [`Defect::IntRange`](crate::Defect::IntRange) when a count, index or
/// location does not fit an `i32`.
pub fn export(store: &Store, module: &Mod) -> Result<Vec<u8>> {
    let bytes = write::Writer::new(store, &module.path).module(module)?;
    pea_log::debug!("exported {:?}: {} bytes", module.path, bytes.len());
    Ok(bytes)
}

/// Reads a module written by [`export`] into `store`.
///
/// On error `store` is left as it was.
///
/// # Errors
///
/// [`Defect::Malformed`](crate::Defect::Malformed) for an unknown tag, a
/// truncated stream or trailing bytes, and
/// [`Defect::Dangling`](crate::Defect::Dangling) for a reference to a
/// record the stream never holds.
pub fn import(store: &mut Store, bytes: &[u8]) -> Result<Mod> {
    let mark = store.mark();
    let module = read::Reader::new(store, bytes)
        .module()
        .inspect_err(|_| store.rewind(mark))?;
    pea_log::debug!("imported {:?}: {} definitions", module.path, module.defs.len());
    Ok(module)
}
