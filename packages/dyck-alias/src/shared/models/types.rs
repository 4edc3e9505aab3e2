//! IR type model
//!
//! Pointers are opaque: the analysis never needs the pointee type, only
//! whether a value is pointer-shaped and how call signatures line up.

use serde::{Deserialize, Serialize};
use std::fmt;

/// First-class IR types
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    Integer(u32),
    Float(u32),
    Pointer,
    Struct(Vec<Type>),
    Array(u64, Box<Type>),
    Function(Box<Signature>),
}

impl Type {
    #[inline]
    pub fn ptr() -> Self {
        Type::Pointer
    }

    #[inline]
    pub fn i32() -> Self {
        Type::Integer(32)
    }

    #[inline]
    pub fn i64() -> Self {
        Type::Integer(64)
    }

    #[inline]
    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer)
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Integer(bits) => write!(f, "i{}", bits),
            Type::Float(bits) => write!(f, "f{}", bits),
            Type::Pointer => write!(f, "ptr"),
            Type::Struct(fields) => {
                write!(f, "{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", field)?;
                }
                write!(f, "}}")
            }
            Type::Array(len, elem) => write!(f, "[{} x {}]", len, elem),
            Type::Function(sig) => write!(f, "{}", sig),
        }
    }
}

/// Function signature (formal parameter types, return type, variadic flag)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<Type>,
    pub ret: Type,
    pub variadic: bool,
}

impl Signature {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Self {
            params,
            ret,
            variadic: false,
        }
    }

    /// Variadic signature with the given fixed parameters
    pub fn variadic(params: Vec<Type>, ret: Type) -> Self {
        Self {
            params,
            ret,
            variadic: true,
        }
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.ret)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p)?;
        }
        if self.variadic {
            if !self.params.is_empty() {
                write!(f, ", ")?;
            }
            write!(f, "...")?;
        }
        write!(f, ")")
    }
}
