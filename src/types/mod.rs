//! The checker's type representation
//!
//! Two worlds coexist here: concrete types (`Type`), which correspond to the
//! language's runtime types, and untyped constant kinds (`ConstKind`), which
//! classify compile-time constants before they are committed to a concrete
//! type. `ExprType` is the sum of the two and is what the checker assigns to
//! every expression.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A concrete (runtime) type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Type {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    Array { len: usize, elem: Box<Type> },
    Slice(#[serde(serialize_with = "serialize_boxed_type")] Box<Type>),
    Map { key: Box<Type>, elem: Box<Type> },
    Struct(StructType),
    Ptr(#[serde(serialize_with = "serialize_boxed_type")] Box<Type>),
    Chan(#[serde(serialize_with = "serialize_boxed_type")] Box<Type>),
    Func(FuncType),
    Interface(InterfaceType),
}

/// Serialize a recursive `Box<Type>` field through an intermediate
/// `serde_json::Value`. The internally tagged derive would otherwise wrap the
/// serializer type once per nesting level, which does not compile (E0275);
/// routing through a concrete serializer keeps the output identical while
/// bounding the instantiation depth.
fn serialize_boxed_type<S: serde::Serializer>(ty: &Type, ser: S) -> Result<S::Ok, S::Error> {
    serde_json::to_value(ty)
        .map_err(serde::ser::Error::custom)?
        .serialize(ser)
}

/// A struct type: named or anonymous, with fields and a method set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructType {
    pub name: Option<String>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
}

/// A struct field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

/// A method in a type's method set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub sig: FuncType,
}

/// A function signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncType {
    pub params: Vec<Type>,
    pub results: Vec<Type>,
    pub variadic: bool,
}

/// An interface type; an empty method set is the empty interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceType {
    pub name: Option<String>,
    pub methods: Vec<Method>,
}

impl Type {
    /// Look up a predeclared type by name
    pub fn builtin(name: &str) -> Option<Type> {
        Some(match name {
            "bool" => Type::Bool,
            "int" => Type::Int,
            "int8" => Type::Int8,
            "int16" => Type::Int16,
            "int32" | "rune" => Type::Int32,
            "int64" => Type::Int64,
            "uint" => Type::Uint,
            "uint8" | "byte" => Type::Uint8,
            "uint16" => Type::Uint16,
            "uint32" => Type::Uint32,
            "uint64" => Type::Uint64,
            "uintptr" => Type::Uintptr,
            "float32" => Type::Float32,
            "float64" => Type::Float64,
            "complex64" => Type::Complex64,
            "complex128" => Type::Complex128,
            "string" => Type::String,
            _ => return None,
        })
    }

    /// Bit width and signedness for integer types. The implementation-defined
    /// `int`, `uint`, and `uintptr` are 64 bits wide here.
    pub fn int_bits(&self) -> Option<(u32, bool)> {
        Some(match self {
            Type::Int => (64, true),
            Type::Int8 => (8, true),
            Type::Int16 => (16, true),
            Type::Int32 => (32, true),
            Type::Int64 => (64, true),
            Type::Uint => (64, false),
            Type::Uint8 => (8, false),
            Type::Uint16 => (16, false),
            Type::Uint32 => (32, false),
            Type::Uint64 => (64, false),
            Type::Uintptr => (64, false),
            _ => return None,
        })
    }

    pub fn is_integer(&self) -> bool {
        self.int_bits().is_some()
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(self.int_bits(), Some((_, false)))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float32 | Type::Float64)
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Type::Complex64 | Type::Complex128)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float() || self.is_complex()
    }

    /// Types whose zero value is nil
    pub fn is_nillable(&self) -> bool {
        matches!(
            self,
            Type::Ptr(_)
                | Type::Slice(_)
                | Type::Map { .. }
                | Type::Chan(_)
                | Type::Func(_)
                | Type::Interface(_)
        )
    }

    pub fn is_empty_interface(&self) -> bool {
        matches!(self, Type::Interface(i) if i.methods.is_empty())
    }

    /// Method set of this type, following one pointer indirection
    pub fn methods(&self) -> &[Method] {
        match self {
            Type::Struct(s) => &s.methods,
            Type::Interface(i) => &i.methods,
            Type::Ptr(inner) => inner.methods(),
            _ => &[],
        }
    }

    /// Check that this type's method set covers `iface`; on failure returns
    /// the name of the first missing method.
    pub fn implements(&self, iface: &InterfaceType) -> Result<(), String> {
        for want in &iface.methods {
            let found = self
                .methods()
                .iter()
                .any(|m| m.name == want.name && m.sig == want.sig);
            if !found {
                return Err(want.name.clone());
            }
        }
        Ok(())
    }

    /// A typed value of type `self` is assignable to `to`
    pub fn assignable_to(&self, to: &Type) -> bool {
        if self == to {
            return true;
        }
        if let Type::Interface(i) = to {
            return self.implements(i).is_ok();
        }
        false
    }

    /// A typed value of type `self` is convertible to `to`
    pub fn convertible_to(&self, to: &Type) -> bool {
        if self.assignable_to(to) {
            return true;
        }
        // Numeric conversions
        if self.is_numeric() && to.is_numeric() {
            return true;
        }
        // Integer <-> string, string <-> []byte / []rune
        match (self, to) {
            (f, Type::String) if f.is_integer() => true,
            (Type::String, Type::Slice(e)) => matches!(**e, Type::Uint8 | Type::Int32),
            (Type::Slice(e), Type::String) => matches!(**e, Type::Uint8 | Type::Int32),
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Int8 => write!(f, "int8"),
            Type::Int16 => write!(f, "int16"),
            Type::Int32 => write!(f, "int32"),
            Type::Int64 => write!(f, "int64"),
            Type::Uint => write!(f, "uint"),
            Type::Uint8 => write!(f, "uint8"),
            Type::Uint16 => write!(f, "uint16"),
            Type::Uint32 => write!(f, "uint32"),
            Type::Uint64 => write!(f, "uint64"),
            Type::Uintptr => write!(f, "uintptr"),
            Type::Float32 => write!(f, "float32"),
            Type::Float64 => write!(f, "float64"),
            Type::Complex64 => write!(f, "complex64"),
            Type::Complex128 => write!(f, "complex128"),
            Type::String => write!(f, "string"),
            Type::Array { len, elem } => write!(f, "[{}]{}", len, elem),
            Type::Slice(elem) => write!(f, "[]{}", elem),
            Type::Map { key, elem } => write!(f, "map[{}]{}", key, elem),
            Type::Struct(s) => match &s.name {
                Some(name) => write!(f, "{}", name),
                None => {
                    write!(f, "struct {{")?;
                    for (i, field) in s.fields.iter().enumerate() {
                        if i > 0 {
                            write!(f, ";")?;
                        }
                        write!(f, " {} {}", field.name, field.ty)?;
                    }
                    write!(f, " }}")
                }
            },
            Type::Ptr(elem) => write!(f, "*{}", elem),
            Type::Chan(elem) => write!(f, "chan {}", elem),
            Type::Func(sig) => {
                write!(f, "func(")?;
                for (i, p) in sig.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if sig.variadic && i == sig.params.len() - 1 {
                        write!(f, "...")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ")")?;
                match sig.results.len() {
                    0 => Ok(()),
                    1 => write!(f, " {}", sig.results[0]),
                    _ => {
                        write!(f, " (")?;
                        for (i, r) in sig.results.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{}", r)?;
                        }
                        write!(f, ")")
                    }
                }
            }
            Type::Interface(i) => match &i.name {
                Some(name) => write!(f, "{}", name),
                None if i.methods.is_empty() => write!(f, "interface {{}}"),
                None => {
                    write!(f, "interface {{")?;
                    for (i, m) in i.methods.iter().enumerate() {
                        if i > 0 {
                            write!(f, ";")?;
                        }
                        write!(f, " {}", m.name)?;
                    }
                    write!(f, " }}")
                }
            },
        }
    }
}

/// Classification of an untyped constant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstKind {
    Int,
    Rune,
    Float,
    Complex,
    String,
    Bool,
    Nil,
}

impl ConstKind {
    /// Display name: the name of the kind's default type
    pub fn name(&self) -> &'static str {
        match self {
            ConstKind::Int => "int",
            ConstKind::Rune => "rune",
            ConstKind::Float => "float64",
            ConstKind::Complex => "complex128",
            ConstKind::String => "string",
            ConstKind::Bool => "bool",
            ConstKind::Nil => "<T>",
        }
    }

    /// The name used in error messages
    pub fn error_type(&self) -> &'static str {
        match self {
            ConstKind::Int | ConstKind::Rune | ConstKind::Float | ConstKind::Complex => {
                "untyped number"
            }
            ConstKind::String => "untyped string",
            ConstKind::Bool => "untyped bool",
            ConstKind::Nil => "nil",
        }
    }

    /// The concrete type this kind defaults to when one is needed
    pub fn default_promotion(&self) -> Option<Type> {
        Some(match self {
            ConstKind::Int => Type::Int,
            ConstKind::Rune => Type::Int32,
            ConstKind::Float => Type::Float64,
            ConstKind::Complex => Type::Complex128,
            ConstKind::String => Type::String,
            ConstKind::Bool => Type::Bool,
            ConstKind::Nil => return None,
        })
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ConstKind::Int | ConstKind::Rune | ConstKind::Float | ConstKind::Complex
        )
    }

    /// Integer-valued kinds
    pub fn is_integral(&self) -> bool {
        matches!(self, ConstKind::Int | ConstKind::Rune)
    }

    pub fn is_real(&self) -> bool {
        matches!(self, ConstKind::Int | ConstKind::Rune | ConstKind::Float)
    }

    /// Position in the numeric promotion ladder int < rune < float < complex
    fn rank(&self) -> Option<u8> {
        Some(match self {
            ConstKind::Int => 0,
            ConstKind::Rune => 1,
            ConstKind::Float => 2,
            ConstKind::Complex => 3,
            _ => return None,
        })
    }

    /// The common kind two untyped constants promote to, or None when the
    /// pairing is invalid (mixed numeric and non-numeric, or distinct
    /// non-numeric kinds).
    pub fn promote(self, other: ConstKind) -> Option<ConstKind> {
        if self == other {
            return Some(self);
        }
        match (self.rank(), other.rank()) {
            (Some(a), Some(b)) => Some(if a >= b { self } else { other }),
            _ => None,
        }
    }
}

impl fmt::Display for ConstKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The type assigned to a checked expression: either a concrete type or an
/// untyped constant kind. The distinction is enforced structurally; no
/// concrete type ever doubles as "untyped".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "world")]
pub enum ExprType {
    Concrete(Type),
    Const(ConstKind),
}

impl ExprType {
    pub fn is_const(&self) -> bool {
        matches!(self, ExprType::Const(_))
    }

    pub fn as_concrete(&self) -> Option<&Type> {
        match self {
            ExprType::Concrete(t) => Some(t),
            ExprType::Const(_) => None,
        }
    }

    pub fn const_kind(&self) -> Option<ConstKind> {
        match self {
            ExprType::Const(k) => Some(*k),
            ExprType::Concrete(_) => None,
        }
    }

    /// Rendering used in "type X" positions of error messages
    pub fn error_type(&self) -> String {
        match self {
            ExprType::Concrete(t) => t.to_string(),
            ExprType::Const(k) => k.error_type().to_string(),
        }
    }
}

impl fmt::Display for ExprType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprType::Concrete(t) => write!(f, "{}", t),
            ExprType::Const(k) => write!(f, "{}", k),
        }
    }
}

impl From<Type> for ExprType {
    fn from(t: Type) -> Self {
        ExprType::Concrete(t)
    }
}

impl From<ConstKind> for ExprType {
    fn from(k: ConstKind) -> Self {
        ExprType::Const(k)
    }
}
