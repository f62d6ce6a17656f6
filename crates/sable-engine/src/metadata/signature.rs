//! Type and member signatures
//!
//! Signatures are the metadata-side spelling of types. Generic parameters are
//! recorded by position only, so matching a signature against a semantic
//! [`TypeRef`] never depends on the names either side gave its parameters.

use super::constants::ConstantPool;
use super::encoder::{BinaryReader, BinaryWriter, DecodeError};
use crate::source::types::{TypeParameterOwner, TypeRef};
use std::fmt;

mod tag {
    pub const NAMED: u8 = 0x01;
    pub const TYPE_PARAMETER: u8 = 0x02;
    pub const METHOD_PARAMETER: u8 = 0x03;
    pub const ARRAY: u8 = 0x04;
    pub const BY_REF: u8 = 0x05;
    pub const POINTER: u8 = 0x06;
}

/// A type as recorded in metadata
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSig {
    /// Named type with optional generic arguments
    Named {
        /// Full name including arity suffix and `+` for nesting
        full_name: String,
        /// Generic arguments
        arguments: Vec<TypeSig>,
    },
    /// `!n`: type parameter of the declaring type
    TypeParameter(u32),
    /// `!!n`: type parameter of the method
    MethodParameter(u32),
    /// Array
    Array {
        /// Element type
        element: Box<TypeSig>,
        /// Number of dimensions
        rank: u32,
    },
    /// Managed reference
    ByRef(Box<TypeSig>),
    /// Unmanaged pointer
    Pointer(Box<TypeSig>),
}

impl TypeSig {
    /// Non-generic named type
    pub fn named(full_name: impl Into<String>) -> Self {
        TypeSig::Named {
            full_name: full_name.into(),
            arguments: Vec::new(),
        }
    }

    /// Constructed generic type
    pub fn generic(full_name: impl Into<String>, arguments: Vec<TypeSig>) -> Self {
        TypeSig::Named {
            full_name: full_name.into(),
            arguments,
        }
    }

    /// Single-dimensional array
    pub fn array(element: TypeSig) -> Self {
        TypeSig::Array {
            element: Box::new(element),
            rank: 1,
        }
    }

    /// Full name of a named type
    pub fn full_name(&self) -> Option<&str> {
        match self {
            TypeSig::Named { full_name, .. } => Some(full_name),
            _ => None,
        }
    }

    /// Structural comparison with a semantic type reference
    pub fn matches(&self, ty: &TypeRef) -> bool {
        match (self, ty) {
            (
                TypeSig::Named {
                    full_name,
                    arguments,
                },
                TypeRef::Named {
                    full_name: other_name,
                    arguments: other_args,
                },
            ) => {
                full_name == other_name
                    && arguments.len() == other_args.len()
                    && arguments.iter().zip(other_args).all(|(a, b)| a.matches(b))
            }
            (
                TypeSig::TypeParameter(i),
                TypeRef::TypeParameter {
                    owner: TypeParameterOwner::Type,
                    index,
                },
            )
            | (
                TypeSig::MethodParameter(i),
                TypeRef::TypeParameter {
                    owner: TypeParameterOwner::Method,
                    index,
                },
            ) => i == index,
            (
                TypeSig::Array { element, rank },
                TypeRef::Array {
                    element: other_element,
                    rank: other_rank,
                },
            ) => rank == other_rank && element.matches(other_element),
            (TypeSig::ByRef(a), TypeRef::ByRef(b)) | (TypeSig::Pointer(a), TypeRef::Pointer(b)) => {
                a.matches(b)
            }
            _ => false,
        }
    }

    /// Encode, interning names into `pool`
    pub fn encode(&self, writer: &mut BinaryWriter, pool: &mut ConstantPool) {
        match self {
            TypeSig::Named {
                full_name,
                arguments,
            } => {
                writer.emit_u8(tag::NAMED);
                writer.emit_u32(pool.intern(full_name));
                writer.emit_u32(arguments.len() as u32);
                for arg in arguments {
                    arg.encode(writer, pool);
                }
            }
            TypeSig::TypeParameter(index) => {
                writer.emit_u8(tag::TYPE_PARAMETER);
                writer.emit_u32(*index);
            }
            TypeSig::MethodParameter(index) => {
                writer.emit_u8(tag::METHOD_PARAMETER);
                writer.emit_u32(*index);
            }
            TypeSig::Array { element, rank } => {
                writer.emit_u8(tag::ARRAY);
                element.encode(writer, pool);
                writer.emit_u32(*rank);
            }
            TypeSig::ByRef(inner) => {
                writer.emit_u8(tag::BY_REF);
                inner.encode(writer, pool);
            }
            TypeSig::Pointer(inner) => {
                writer.emit_u8(tag::POINTER);
                inner.encode(writer, pool);
            }
        }
    }

    /// Decode, resolving names through `pool`
    pub fn decode(reader: &mut BinaryReader<'_>, pool: &ConstantPool) -> Result<Self, DecodeError> {
        let offset = reader.position();
        match reader.read_u8()? {
            tag::NAMED => {
                let full_name = pool.get(reader.read_u32()?)?.to_string();
                let count = reader.read_u32()? as usize;
                let mut arguments = Vec::with_capacity(count.min(reader.remaining()));
                for _ in 0..count {
                    arguments.push(TypeSig::decode(reader, pool)?);
                }
                Ok(TypeSig::Named {
                    full_name,
                    arguments,
                })
            }
            tag::TYPE_PARAMETER => Ok(TypeSig::TypeParameter(reader.read_u32()?)),
            tag::METHOD_PARAMETER => Ok(TypeSig::MethodParameter(reader.read_u32()?)),
            tag::ARRAY => {
                let element = Box::new(TypeSig::decode(reader, pool)?);
                let rank = reader.read_u32()?;
                Ok(TypeSig::Array { element, rank })
            }
            tag::BY_REF => Ok(TypeSig::ByRef(Box::new(TypeSig::decode(reader, pool)?))),
            tag::POINTER => Ok(TypeSig::Pointer(Box::new(TypeSig::decode(reader, pool)?))),
            other => Err(DecodeError::InvalidTag(other, offset)),
        }
    }
}

impl From<&TypeRef> for TypeSig {
    fn from(ty: &TypeRef) -> Self {
        match ty {
            TypeRef::Named {
                full_name,
                arguments,
            } => TypeSig::Named {
                full_name: full_name.clone(),
                arguments: arguments.iter().map(TypeSig::from).collect(),
            },
            TypeRef::TypeParameter {
                owner: TypeParameterOwner::Type,
                index,
            } => TypeSig::TypeParameter(*index),
            TypeRef::TypeParameter {
                owner: TypeParameterOwner::Method,
                index,
            } => TypeSig::MethodParameter(*index),
            TypeRef::Array { element, rank } => TypeSig::Array {
                element: Box::new(TypeSig::from(&**element)),
                rank: *rank,
            },
            TypeRef::ByRef(inner) => TypeSig::ByRef(Box::new(TypeSig::from(&**inner))),
            TypeRef::Pointer(inner) => TypeSig::Pointer(Box::new(TypeSig::from(&**inner))),
        }
    }
}

impl fmt::Display for TypeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSig::Named {
                full_name,
                arguments,
            } => {
                write!(f, "{}", full_name)?;
                if !arguments.is_empty() {
                    let args: Vec<String> = arguments.iter().map(|a| a.to_string()).collect();
                    write!(f, "<{}>", args.join(","))?;
                }
                Ok(())
            }
            TypeSig::TypeParameter(i) => write!(f, "!{}", i),
            TypeSig::MethodParameter(i) => write!(f, "!!{}", i),
            TypeSig::Array { element, rank } => {
                write!(f, "{}[{}]", element, ",".repeat(rank.saturating_sub(1) as usize))
            }
            TypeSig::ByRef(inner) => write!(f, "{}&", inner),
            TypeSig::Pointer(inner) => write!(f, "{}*", inner),
        }
    }
}

/// Reference to a member by declaring type, name and signature
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberRefSig {
    /// Declaring type (constructed for members of generic instantiations)
    pub declaring_type: TypeSig,
    /// Member name as stored in metadata
    pub name: String,
    /// Parameter types
    pub parameters: Vec<TypeSig>,
    /// Return type
    pub return_type: TypeSig,
}

impl MemberRefSig {
    /// Encode, interning names into `pool`
    pub fn encode(&self, writer: &mut BinaryWriter, pool: &mut ConstantPool) {
        self.declaring_type.encode(writer, pool);
        writer.emit_u32(pool.intern(&self.name));
        encode_signatures(&self.parameters, writer, pool);
        self.return_type.encode(writer, pool);
    }

    /// Decode, resolving names through `pool`
    pub fn decode(reader: &mut BinaryReader<'_>, pool: &ConstantPool) -> Result<Self, DecodeError> {
        let declaring_type = TypeSig::decode(reader, pool)?;
        let name = pool.get(reader.read_u32()?)?.to_string();
        let parameters = decode_signatures(reader, pool)?;
        let return_type = TypeSig::decode(reader, pool)?;
        Ok(Self {
            declaring_type,
            name,
            parameters,
            return_type,
        })
    }
}

impl fmt::Display for MemberRefSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.parameters.iter().map(|p| p.to_string()).collect();
        write!(
            f,
            "{} {}::{}({})",
            self.return_type,
            self.declaring_type,
            self.name,
            params.join(",")
        )
    }
}

/// Encode a counted list of signatures
pub fn encode_signatures(sigs: &[TypeSig], writer: &mut BinaryWriter, pool: &mut ConstantPool) {
    writer.emit_u32(sigs.len() as u32);
    for sig in sigs {
        sig.encode(writer, pool);
    }
}

/// Decode a counted list of signatures
pub fn decode_signatures(
    reader: &mut BinaryReader<'_>,
    pool: &ConstantPool,
) -> Result<Vec<TypeSig>, DecodeError> {
    let count = reader.read_u32()? as usize;
    let mut sigs = Vec::with_capacity(count.min(reader.remaining()));
    for _ in 0..count {
        sigs.push(TypeSig::decode(reader, pool)?);
    }
    Ok(sigs)
}
