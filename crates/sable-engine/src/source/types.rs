//! Type references of the semantic model
//!
//! Type references are structural: a named type is identified by its full
//! metadata-style name (`Namespace.Outer+Inner`1`) plus its type arguments, and
//! generic type parameters are identified by owner kind and position only.
//! Two generic definitions that call their first parameter `T` and `TKey`
//! therefore produce equal references for it.

use std::fmt;

/// Well-known type names
pub mod known {
    /// `void`
    pub const VOID: &str = "System.Void";
    /// `object`
    pub const OBJECT: &str = "System.Object";
    /// `bool`
    pub const BOOLEAN: &str = "System.Boolean";
    /// `char`
    pub const CHAR: &str = "System.Char";
    /// `int`
    pub const INT32: &str = "System.Int32";
    /// `long`
    pub const INT64: &str = "System.Int64";
    /// `float`
    pub const SINGLE: &str = "System.Single";
    /// `double`
    pub const DOUBLE: &str = "System.Double";
    /// `string`
    pub const STRING: &str = "System.String";
    /// `System.Type`
    pub const TYPE: &str = "System.Type";
}

/// Which kind of generic definition declares a type parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeParameterOwner {
    /// Declared by the enclosing type
    Type,
    /// Declared by the method
    Method,
}

/// A structural reference to a type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A named type, possibly constructed with type arguments
    Named {
        /// Full structural name including generic arity suffix
        full_name: String,
        /// Type arguments (empty for non-generic types)
        arguments: Vec<TypeRef>,
    },
    /// A generic type parameter, identified by position
    TypeParameter {
        /// Owner of the parameter
        owner: TypeParameterOwner,
        /// Position in the owner's parameter list
        index: u32,
    },
    /// An array type
    Array {
        /// Element type
        element: Box<TypeRef>,
        /// Number of dimensions
        rank: u32,
    },
    /// A managed reference (`ref`/`out` parameter type)
    ByRef(Box<TypeRef>),
    /// An unmanaged pointer
    Pointer(Box<TypeRef>),
}

impl TypeRef {
    /// Reference a non-generic named type
    pub fn named(full_name: impl Into<String>) -> Self {
        TypeRef::Named {
            full_name: full_name.into(),
            arguments: Vec::new(),
        }
    }

    /// Reference a constructed generic type
    pub fn generic(full_name: impl Into<String>, arguments: Vec<TypeRef>) -> Self {
        TypeRef::Named {
            full_name: full_name.into(),
            arguments,
        }
    }

    /// Reference a type parameter of the enclosing type
    pub fn type_parameter(index: u32) -> Self {
        TypeRef::TypeParameter {
            owner: TypeParameterOwner::Type,
            index,
        }
    }

    /// Reference a type parameter of the method
    pub fn method_parameter(index: u32) -> Self {
        TypeRef::TypeParameter {
            owner: TypeParameterOwner::Method,
            index,
        }
    }

    /// Single-dimensional array of `element`
    pub fn array(element: TypeRef) -> Self {
        TypeRef::Array {
            element: Box::new(element),
            rank: 1,
        }
    }

    /// `void`
    pub fn void() -> Self {
        Self::named(known::VOID)
    }

    /// `int`
    pub fn int32() -> Self {
        Self::named(known::INT32)
    }

    /// `string`
    pub fn string() -> Self {
        Self::named(known::STRING)
    }

    /// `bool`
    pub fn boolean() -> Self {
        Self::named(known::BOOLEAN)
    }

    /// `object`
    pub fn object() -> Self {
        Self::named(known::OBJECT)
    }

    /// Full name of a named type, `None` for anything else
    pub fn full_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named { full_name, .. } => Some(full_name),
            _ => None,
        }
    }

    /// Check whether this is the named, non-generic type `full_name`
    pub fn is(&self, name: &str) -> bool {
        matches!(self, TypeRef::Named { full_name, arguments } if full_name == name && arguments.is_empty())
    }

    /// Check whether this is `int`
    pub fn is_int32(&self) -> bool {
        self.is(known::INT32)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named {
                full_name,
                arguments,
            } => {
                write!(f, "{}", full_name)?;
                if !arguments.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in arguments.iter().enumerate() {
                        if i > 0 {
                            write!(f, ",")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeRef::TypeParameter { owner, index } => match owner {
                TypeParameterOwner::Type => write!(f, "!{}", index),
                TypeParameterOwner::Method => write!(f, "!!{}", index),
            },
            TypeRef::Array { element, rank } => {
                write!(f, "{}[", element)?;
                for _ in 1..*rank {
                    write!(f, ",")?;
                }
                write!(f, "]")
            }
            TypeRef::ByRef(inner) => write!(f, "{}&", inner),
            TypeRef::Pointer(inner) => write!(f, "{}*", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_parameters_compare_by_position() {
        let a = TypeRef::generic("Acme.IStore`1", vec![TypeRef::type_parameter(0)]);
        let b = TypeRef::generic("Acme.IStore`1", vec![TypeRef::type_parameter(0)]);
        let c = TypeRef::generic("Acme.IStore`1", vec![TypeRef::method_parameter(0)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display() {
        let ty = TypeRef::array(TypeRef::generic(
            "System.Collections.Generic.Dictionary`2",
            vec![TypeRef::string(), TypeRef::method_parameter(1)],
        ));
        assert_eq!(
            ty.to_string(),
            "System.Collections.Generic.Dictionary`2<System.String,!!1>[]"
        );
        assert_eq!(TypeRef::ByRef(Box::new(TypeRef::int32())).to_string(), "System.Int32&");
    }

    #[test]
    fn test_is_int32() {
        assert!(TypeRef::int32().is_int32());
        assert!(!TypeRef::string().is_int32());
        assert!(!TypeRef::array(TypeRef::int32()).is_int32());
    }
}
