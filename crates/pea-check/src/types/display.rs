//! Rendering resolved types for diagnostics.

use std::fmt;

use super::{Store, TypeId, TypeName};

/// A resolved type in postfix notation: `Int`, `Int List`, `Int&`,
/// `(String, Int) Map`. Type variables print as their name.
pub struct TypeDisplay<'a> {
    pub(crate) store: &'a Store,
    pub(crate) ty: TypeId,
}

impl TypeDisplay<'_> {
    fn arg(&self, f: &mut fmt::Formatter<'_>, arg: &TypeName) -> fmt::Result {
        match arg.ty {
            Some(ty) => write!(f, "{}", self.store.display(ty)),
            None => write!(f, "{arg}"),
        }
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.store.types[self.ty];
        match t.args.as_slice() {
            [] => {}
            [arg] if t.name == "&" => {
                self.arg(f, arg)?;
                return write!(f, "&");
            }
            [arg] if arg.args.len() < 2 => {
                self.arg(f, arg)?;
                write!(f, " ")?;
            }
            args => {
                write!(f, "(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    self.arg(f, arg)?;
                }
                write!(f, ") ")?;
            }
        }
        write!(f, "{}", t.name)
    }
}
