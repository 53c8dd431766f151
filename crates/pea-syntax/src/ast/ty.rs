//! Type names as written.

use std::fmt;

use crate::span::{Loc, Located};

/// A reference to a type: `Int`, `Int List`, `(String, Int) Map`, `Int&`,
/// or a module-qualified `#geo Point`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeName {
    pub loc: Loc,
    /// Import name after `#`, when qualified.
    pub module: Option<String>,
    pub name: String,
    pub args: Vec<TypeName>,
}

impl TypeName {
    /// An unqualified name without arguments.
    #[must_use]
    pub fn simple(loc: Loc, name: impl Into<String>) -> Self {
        TypeName {
            loc,
            module: None,
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// `name` applied to `args`.
    #[must_use]
    pub fn applied(loc: Loc, name: impl Into<String>, args: Vec<TypeName>) -> Self {
        TypeName {
            loc,
            module: None,
            name: name.into(),
            args,
        }
    }
}

impl Located for TypeName {
    fn loc(&self) -> &Loc {
        &self.loc
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.args.as_slice() {
            [] => {}
            [arg] if self.name == "&" => return write!(f, "{arg}&"),
            [arg] if arg.args.len() < 2 => write!(f, "{arg} ")?,
            args => {
                write!(f, "(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ") ")?;
            }
        }
        if let Some(module) = &self.module {
            write!(f, "#{module} ")?;
        }
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    fn loc() -> Loc {
        Loc::new("t.pea", Span::default())
    }

    #[test]
    fn test_display_postfix_forms() {
        let int = TypeName::simple(loc(), "Int");
        let list = TypeName::applied(loc(), "List", vec![int.clone()]);
        assert_eq!(list.to_string(), "Int List");

        let r = TypeName::applied(loc(), "&", vec![list.clone()]);
        assert_eq!(r.to_string(), "Int List&");

        let map = TypeName::applied(loc(), "Map", vec![int.clone(), list]);
        assert_eq!(map.to_string(), "(Int, Int List) Map");

        let mut qualified = TypeName::simple(loc(), "Point");
        qualified.module = Some("geo".into());
        assert_eq!(qualified.to_string(), "#geo Point");
    }
}
