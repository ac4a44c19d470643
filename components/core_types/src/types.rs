//! The closed set of types known to the compiler.

use std::fmt;

/// A value or function type.
///
/// Scalars are limited to `int`, `double` and `void`; functions carry their
/// parameter types and return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Double,
    /// No value
    Void,
    /// Function signature
    Func {
        /// Parameter types in declaration order
        params: Vec<Type>,
        /// Declared return type
        ret: Box<Type>,
    },
}

impl Type {
    /// Resolve a scalar type name as written in source.
    ///
    /// Returns `None` for anything other than `int`, `double` or `void`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Type::Int),
            "double" => Some(Type::Double),
            "void" => Some(Type::Void),
            _ => None,
        }
    }

    /// Whether a variable, constant or parameter may have this type
    pub fn is_storable(&self) -> bool {
        matches!(self, Type::Int | Type::Double)
    }

    /// Number of return slots a function with this return type reserves.
    ///
    /// Only `int` occupies a slot.
    pub fn return_slots(&self) -> u32 {
        match self {
            Type::Int => 1,
            Type::Double | Type::Void | Type::Func { .. } => 0,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Double => write!(f, "double"),
            Type::Void => write!(f, "void"),
            Type::Func { params, ret } => {
                write!(f, "fn(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, ") -> {}", ret)
            }
        }
    }
}
