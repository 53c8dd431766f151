//! Definition-graph nodes.

use std::fmt;
use std::rc::Rc;

use pea_syntax::{Loc, ast};

use super::tree::Stmt;
use super::{FunId, TypeId, TypeVarId, ValId, VarId};
use crate::context::env::FileScope;

/// A module-level definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Def {
    Val(ValId),
    Fun(FunId),
    Type(TypeId),
}

/// Lifecycle of a lazily gathered definition.
///
/// A definition is allocated `Reserved` as soon as its module is scanned,
/// moves to `Gathering` while its AST is being resolved, and ends
/// `Complete`. Re-entering a definition that is `Gathering` is how
/// recursion is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Reserved,
    Gathering,
    Complete,
}

/// The AST a definition is gathered from, and the file scope its names
/// resolve in. Dropped once the defining module is imported.
pub struct Src<T> {
    pub ast: Rc<T>,
    pub scope: Rc<FileScope>,
}

impl<T> Clone for Src<T> {
    fn clone(&self) -> Self {
        Src {
            ast: Rc::clone(&self.ast),
            scope: Rc::clone(&self.scope),
        }
    }
}

impl<T> fmt::Debug for Src<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Src({})", self.scope.module.path)
    }
}

/// A reference to a type as written, plus the type it resolved to.
///
/// `ty` is `None` when resolution failed; the failure has already been
/// reported and anything built from this name stays silent about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    pub loc: Option<Loc>,
    pub module: Option<String>,
    pub name: String,
    pub args: Vec<TypeName>,
    pub ty: Option<TypeId>,
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

/// Type definitions, generic instances, and type-variable placeholders.
#[derive(Debug, Clone)]
pub struct Type {
    pub loc: Option<Loc>,
    /// Path of the defining module, `""` for the universal module.
    pub module: String,
    pub private: bool,
    pub name: String,
    pub arity: usize,
    /// Type parameters; empty on instances.
    pub params: Vec<TypeVarId>,
    /// Type arguments; empty on generics.
    pub args: Vec<TypeName>,
    pub kind: TypeKind,
    pub builtin: Option<BuiltinType>,
    /// The universal reference template `(T) &`.
    pub ref_def: Option<TypeId>,
    /// Discriminant type of an or-type.
    pub tag: Option<TypeId>,
    /// The generic this is an instance of; itself otherwise.
    pub def: TypeId,
    /// Instances of this generic.
    pub insts: Vec<TypeId>,
    /// Set when this type is the placeholder of a type variable.
    pub var: Option<TypeVarId>,
    pub stage: Stage,
    pub src: Option<Src<ast::TypeDef>>,
}

impl Type {
    /// A `Reserved` type with nothing resolved yet.
    #[must_use]
    pub fn skeleton(def: TypeId, module: &str, name: &str, arity: usize) -> Self {
        Type {
            loc: None,
            module: module.to_string(),
            private: false,
            name: name.to_string(),
            arity,
            params: Vec::new(),
            args: Vec::new(),
            kind: TypeKind::Opaque,
            builtin: None,
            ref_def: None,
            tag: None,
            def,
            insts: Vec::new(),
            var: None,
            stage: Stage::Reserved,
            src: None,
        }
    }

    #[must_use]
    pub fn is_alias(&self) -> bool {
        matches!(self.kind, TypeKind::Alias(_))
            || self
                .src
                .as_ref()
                .is_some_and(|src| matches!(src.ast.body, ast::TypeBody::Alias(_)))
    }
}

/// The shape of a type. Exactly one applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// Builtin types, and type-variable placeholders.
    Opaque,
    /// `None` once the target failed to resolve, or the alias is cyclic.
    Alias(Option<TypeName>),
    /// And-type fields.
    Fields(Vec<VarId>),
    /// Or-type cases.
    Cases(Vec<VarId>),
    /// Virtual-type method signatures.
    Virts(Vec<FunSig>),
}

/// Builtin types of the universal module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Int(u32),
    UInt(u32),
    Float(u32),
    String,
    Ref,
    Array,
    Fun,
}

impl BuiltinType {
    /// Recognizes universal opaque types by name and arity.
    #[must_use]
    pub fn from_name(name: &str, arity: usize) -> Option<Self> {
        let bits = |digits: &str| digits.parse::<u32>().ok();
        match (name, arity) {
            ("String", 0) => Some(BuiltinType::String),
            ("&", 1) => Some(BuiltinType::Ref),
            ("Array", 1) => Some(BuiltinType::Array),
            ("Fun", n) if n >= 1 => Some(BuiltinType::Fun),
            (_, 0) => {
                if let Some(digits) = name.strip_prefix("UInt") {
                    bits(digits).map(BuiltinType::UInt)
                } else if let Some(digits) = name.strip_prefix("Int") {
                    bits(digits).map(BuiltinType::Int)
                } else if let Some(digits) = name.strip_prefix("Float") {
                    bits(digits).map(BuiltinType::Float)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Wire code; widths are folded into the code.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            BuiltinType::Int(bits) => 100 + bits as i32,
            BuiltinType::UInt(bits) => 200 + bits as i32,
            BuiltinType::Float(bits) => 300 + bits as i32,
            BuiltinType::String => 1,
            BuiltinType::Ref => 2,
            BuiltinType::Array => 3,
            BuiltinType::Fun => 4,
        }
    }

    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        let bits = |b: i32| u32::try_from(b).ok().filter(|b| matches!(b, 8 | 16 | 32 | 64));
        match code {
            1 => Some(BuiltinType::String),
            2 => Some(BuiltinType::Ref),
            3 => Some(BuiltinType::Array),
            4 => Some(BuiltinType::Fun),
            100..=199 => bits(code - 100).map(BuiltinType::Int),
            200..=299 => bits(code - 200).map(BuiltinType::UInt),
            300..=399 => bits(code - 300).map(BuiltinType::Float),
            _ => None,
        }
    }
}

/// A type parameter.
#[derive(Debug, Clone)]
pub struct TypeVar {
    pub loc: Option<Loc>,
    pub name: String,
    /// Unique across the process; tells same-named variables apart.
    pub id: u64,
    /// Virtual types the argument must implement.
    pub bounds: Vec<TypeName>,
    /// The placeholder type standing for this variable.
    pub ty: TypeId,
}

/// What a [`Var`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarRole {
    Val,
    Param,
    BlockParam,
    Local,
    Field,
    Case,
}

impl VarRole {
    pub(crate) const ALL: [VarRole; 6] = [
        VarRole::Val,
        VarRole::Param,
        VarRole::BlockParam,
        VarRole::Local,
        VarRole::Field,
        VarRole::Case,
    ];
}

/// A named, typed slot: a value, parameter, local, field or case.
#[derive(Debug, Clone)]
pub struct Var {
    pub loc: Option<Loc>,
    pub name: String,
    /// As written, when it was.
    pub type_name: Option<TypeName>,
    pub ty: Option<TypeId>,
    pub role: VarRole,
    /// Position among the variables of the same role in the owner.
    pub index: usize,
}

/// A method or function signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunSig {
    pub loc: Option<Loc>,
    pub sel: String,
    /// For methods, `params[0]` is `self`.
    pub params: Vec<VarId>,
    /// `None` means `Nil`.
    pub ret: Option<TypeName>,
}

/// Receiver of a method.
#[derive(Debug, Clone)]
pub struct Recv {
    pub loc: Option<Loc>,
    /// Type variables of the receiver, `(T)` in `meth (T) List`.
    pub params: Vec<TypeVarId>,
    pub module: Option<String>,
    pub name: String,
    pub arity: usize,
    /// The receiver type; for a generic receiver, the instance over
    /// `params`.
    pub ty: Option<TypeId>,
}

/// Methods synthesized by the checker or implemented by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinMeth {
    /// Or-type case dispatch.
    Case,
    /// Virtual-type method.
    Virt,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Neg,
    Eq,
    Neq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Print,
    Size,
    At,
    AtPut,
    Value,
}

impl BuiltinMeth {
    pub(crate) const ALL: [BuiltinMeth; 19] = [
        BuiltinMeth::Case,
        BuiltinMeth::Virt,
        BuiltinMeth::Add,
        BuiltinMeth::Sub,
        BuiltinMeth::Mul,
        BuiltinMeth::Div,
        BuiltinMeth::Rem,
        BuiltinMeth::Neg,
        BuiltinMeth::Eq,
        BuiltinMeth::Neq,
        BuiltinMeth::Less,
        BuiltinMeth::LessEq,
        BuiltinMeth::Greater,
        BuiltinMeth::GreaterEq,
        BuiltinMeth::Print,
        BuiltinMeth::Size,
        BuiltinMeth::At,
        BuiltinMeth::AtPut,
        BuiltinMeth::Value,
    ];

    /// The operation a universal declaration implements, by selector.
    #[must_use]
    pub fn from_selector(sel: &str) -> Option<Self> {
        Some(match sel {
            "+" => BuiltinMeth::Add,
            "-" => BuiltinMeth::Sub,
            "*" => BuiltinMeth::Mul,
            "/" => BuiltinMeth::Div,
            "%" => BuiltinMeth::Rem,
            "neg" => BuiltinMeth::Neg,
            "=" => BuiltinMeth::Eq,
            "!=" => BuiltinMeth::Neq,
            "<" => BuiltinMeth::Less,
            "<=" => BuiltinMeth::LessEq,
            ">" => BuiltinMeth::Greater,
            ">=" => BuiltinMeth::GreaterEq,
            "print" => BuiltinMeth::Print,
            "size" => BuiltinMeth::Size,
            "at:" => BuiltinMeth::At,
            "at:put:" => BuiltinMeth::AtPut,
            "value" => BuiltinMeth::Value,
            s if s.starts_with("value:") => BuiltinMeth::Value,
            _ => return None,
        })
    }
}

/// A function or method: definition or instance.
#[derive(Debug, Clone)]
pub struct Fun {
    pub loc: Option<Loc>,
    pub module: String,
    pub private: bool,
    pub recv: Option<Recv>,
    /// The function's own type parameters.
    pub tparams: Vec<TypeVarId>,
    pub sig: FunSig,
    /// `None` for declarations and for instances, which share the body of
    /// `def`.
    pub body: Option<Vec<Stmt>>,
    pub builtin: Option<BuiltinMeth>,
    pub locals: Vec<VarId>,
    /// The generic this is an instance of; itself otherwise.
    pub def: FunId,
    pub insts: Vec<FunId>,
    /// Stage of the signature.
    pub stage: Stage,
    /// Stage of the body.
    pub body_stage: Stage,
    pub src: Option<Src<ast::FunDef>>,
}

impl Fun {
    #[must_use]
    pub fn skeleton(def: FunId, module: &str, sel: &str) -> Self {
        Fun {
            loc: None,
            module: module.to_string(),
            private: false,
            recv: None,
            tparams: Vec::new(),
            sig: FunSig {
                loc: None,
                sel: sel.to_string(),
                params: Vec::new(),
                ret: None,
            },
            body: None,
            builtin: None,
            locals: Vec::new(),
            def,
            insts: Vec::new(),
            stage: Stage::Reserved,
            body_stage: Stage::Reserved,
            src: None,
        }
    }
}

/// A module-level value.
#[derive(Debug, Clone)]
pub struct Val {
    pub loc: Option<Loc>,
    pub module: String,
    pub private: bool,
    pub name: String,
    pub init: Vec<Stmt>,
    pub locals: Vec<VarId>,
    /// Companion variable with role [`VarRole::Val`]; carries the type.
    pub var: VarId,
    pub stage: Stage,
    pub src: Option<Src<ast::ValDef>>,
}

/// A checked module.
#[derive(Debug, Clone)]
pub struct Mod {
    pub path: String,
    pub ast: Option<ast::Mod>,
    pub defs: Vec<Def>,
    /// Values in initialization order.
    pub vals: Vec<ValId>,
    /// The module's canonical `Int`.
    pub int: Option<TypeId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_type_from_name() {
        assert_eq!(BuiltinType::from_name("Int32", 0), Some(BuiltinType::Int(32)));
        assert_eq!(BuiltinType::from_name("UInt8", 0), Some(BuiltinType::UInt(8)));
        assert_eq!(BuiltinType::from_name("Float64", 0), Some(BuiltinType::Float(64)));
        assert_eq!(BuiltinType::from_name("&", 1), Some(BuiltinType::Ref));
        assert_eq!(BuiltinType::from_name("Fun", 4), Some(BuiltinType::Fun));
        assert_eq!(BuiltinType::from_name("Int", 0), None);
        assert_eq!(BuiltinType::from_name("Array", 0), None);
    }

    #[test]
    fn test_builtin_type_codes() {
        for ty in [
            BuiltinType::Int(8),
            BuiltinType::UInt(64),
            BuiltinType::Float(32),
            BuiltinType::String,
            BuiltinType::Fun,
        ] {
            assert_eq!(BuiltinType::from_code(ty.code()), Some(ty));
        }
        assert_eq!(BuiltinType::from_code(112), None);
        assert_eq!(BuiltinType::from_code(0), None);
    }

    #[test]
    fn test_builtin_meth_from_selector() {
        assert_eq!(BuiltinMeth::from_selector("<="), Some(BuiltinMeth::LessEq));
        assert_eq!(BuiltinMeth::from_selector("value:value:"), Some(BuiltinMeth::Value));
        assert_eq!(BuiltinMeth::from_selector("ifSome:"), None);
    }

    #[test]
    fn test_type_name_display() {
        let leaf = |name: &str| TypeName {
            loc: None,
            module: None,
            name: name.into(),
            args: Vec::new(),
            ty: None,
        };
        let mut map = leaf("Map");
        map.args = vec![leaf("String"), leaf("Int")];
        let mut r = leaf("&");
        r.args = vec![map];
        assert_eq!(r.to_string(), "(String, Int) Map&");
    }
}
