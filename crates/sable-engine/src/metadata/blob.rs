//! Custom attribute value blobs
//!
//! Layout of an attribute blob:
//! - Prolog `0x0001` (u16)
//! - One fixed argument per constructor parameter, encoded according to the
//!   parameter's type
//! - Named argument count (u16)
//! - For each named argument: `0x53` (field) or `0x54` (property), the
//!   element type descriptor, the name, then the value
//!
//! Primitive parameters carry their value only. Parameters of type `object`
//! and of any other named type (enums) carry a self-describing boxed value:
//! element type descriptor followed by the value. Strings, `System.Type`
//! values and arrays may be null.

use super::encoder::{BinaryReader, BinaryWriter, DecodeError, NULL_LENGTH};
use super::signature::TypeSig;
use std::fmt;
use thiserror::Error;

/// Blob prolog
pub const PROLOG: u16 = 0x0001;

mod element {
    pub const BOOLEAN: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const I1: u8 = 0x04;
    pub const U1: u8 = 0x05;
    pub const I2: u8 = 0x06;
    pub const U2: u8 = 0x07;
    pub const I4: u8 = 0x08;
    pub const U4: u8 = 0x09;
    pub const I8: u8 = 0x0a;
    pub const U8: u8 = 0x0b;
    pub const R4: u8 = 0x0c;
    pub const R8: u8 = 0x0d;
    pub const STRING: u8 = 0x0e;
    pub const SZARRAY: u8 = 0x1d;
    pub const TYPE: u8 = 0x50;
    pub const BOXED: u8 = 0x51;
    pub const FIELD: u8 = 0x53;
    pub const PROPERTY: u8 = 0x54;
    pub const ENUM: u8 = 0x55;
}

/// Attribute blob errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlobError {
    /// Underlying decode error
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Blob does not start with the prolog
    #[error("Invalid attribute blob prolog: {0:#06x}")]
    InvalidProlog(u16),

    /// Unknown element type tag
    #[error("Unknown element type {0:#04x} at offset {1}")]
    UnknownElementType(u8, usize),

    /// Named argument kind is neither field nor property
    #[error("Invalid named argument kind {0:#04x} at offset {1}")]
    InvalidNamedArgumentKind(u8, usize),

    /// Character value is not a Unicode scalar value
    #[error("Invalid char value {0:#x}")]
    InvalidChar(u32),

    /// Constructor parameter type cannot carry attribute values
    #[error("Unsupported attribute parameter type: {0}")]
    UnsupportedParameterType(String),

    /// Value does not fit the declared element type
    #[error("Expected {expected} value, found {found}")]
    ValueMismatch {
        /// Declared element type
        expected: String,
        /// Element type of the supplied value
        found: String,
    },

    /// Fixed argument count differs from the constructor's parameter count
    #[error("Expected {expected} fixed arguments, got {actual}")]
    ArgumentCountMismatch {
        /// Constructor parameter count
        expected: usize,
        /// Supplied argument count
        actual: usize,
    },

    /// Bytes left after the last named argument
    #[error("{0} trailing bytes after attribute arguments")]
    TrailingBytes(usize),
}

// ============================================================================
// Element types
// ============================================================================

/// Type descriptor of an attribute value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// `bool`
    Boolean,
    /// `char`
    Char,
    /// `sbyte`
    I8,
    /// `byte`
    U8,
    /// `short`
    I16,
    /// `ushort`
    U16,
    /// `int`
    I32,
    /// `uint`
    U32,
    /// `long`
    I64,
    /// `ulong`
    U64,
    /// `float`
    F32,
    /// `double`
    F64,
    /// `string`
    String,
    /// `System.Type`
    Type,
    /// `object`: value prefixed with its own descriptor
    Boxed,
    /// Enum with an integral underlying type
    Enum {
        /// Full name of the enum type
        type_name: String,
        /// Underlying integral type
        underlying: Box<ElementType>,
    },
    /// Single-dimensional array
    SzArray(Box<ElementType>),
}

impl ElementType {
    /// Element type used to encode a constructor parameter of type `sig`
    pub fn for_parameter(sig: &TypeSig) -> Result<Self, BlobError> {
        match sig {
            TypeSig::Named {
                full_name,
                arguments,
            } if arguments.is_empty() => Ok(match full_name.as_str() {
                "System.Boolean" => ElementType::Boolean,
                "System.Char" => ElementType::Char,
                "System.SByte" => ElementType::I8,
                "System.Byte" => ElementType::U8,
                "System.Int16" => ElementType::I16,
                "System.UInt16" => ElementType::U16,
                "System.Int32" => ElementType::I32,
                "System.UInt32" => ElementType::U32,
                "System.Int64" => ElementType::I64,
                "System.UInt64" => ElementType::U64,
                "System.Single" => ElementType::F32,
                "System.Double" => ElementType::F64,
                "System.String" => ElementType::String,
                "System.Type" => ElementType::Type,
                _ => ElementType::Boxed,
            }),
            TypeSig::Array { element, rank: 1 } => Ok(ElementType::SzArray(Box::new(
                ElementType::for_parameter(element)?,
            ))),
            other => Err(BlobError::UnsupportedParameterType(other.to_string())),
        }
    }

    fn encode(&self, writer: &mut BinaryWriter) {
        match self {
            ElementType::Boolean => writer.emit_u8(element::BOOLEAN),
            ElementType::Char => writer.emit_u8(element::CHAR),
            ElementType::I8 => writer.emit_u8(element::I1),
            ElementType::U8 => writer.emit_u8(element::U1),
            ElementType::I16 => writer.emit_u8(element::I2),
            ElementType::U16 => writer.emit_u8(element::U2),
            ElementType::I32 => writer.emit_u8(element::I4),
            ElementType::U32 => writer.emit_u8(element::U4),
            ElementType::I64 => writer.emit_u8(element::I8),
            ElementType::U64 => writer.emit_u8(element::U8),
            ElementType::F32 => writer.emit_u8(element::R4),
            ElementType::F64 => writer.emit_u8(element::R8),
            ElementType::String => writer.emit_u8(element::STRING),
            ElementType::Type => writer.emit_u8(element::TYPE),
            ElementType::Boxed => writer.emit_u8(element::BOXED),
            ElementType::Enum {
                type_name,
                underlying,
            } => {
                writer.emit_u8(element::ENUM);
                writer.emit_string(Some(type_name));
                underlying.encode(writer);
            }
            ElementType::SzArray(inner) => {
                writer.emit_u8(element::SZARRAY);
                inner.encode(writer);
            }
        }
    }

    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, BlobError> {
        let offset = reader.position();
        Ok(match reader.read_u8()? {
            element::BOOLEAN => ElementType::Boolean,
            element::CHAR => ElementType::Char,
            element::I1 => ElementType::I8,
            element::U1 => ElementType::U8,
            element::I2 => ElementType::I16,
            element::U2 => ElementType::U16,
            element::I4 => ElementType::I32,
            element::U4 => ElementType::U32,
            element::I8 => ElementType::I64,
            element::U8 => ElementType::U64,
            element::R4 => ElementType::F32,
            element::R8 => ElementType::F64,
            element::STRING => ElementType::String,
            element::TYPE => ElementType::Type,
            element::BOXED => ElementType::Boxed,
            element::ENUM => {
                let type_name = reader.read_string()?;
                let underlying = Box::new(ElementType::decode(reader)?);
                ElementType::Enum {
                    type_name,
                    underlying,
                }
            }
            element::SZARRAY => ElementType::SzArray(Box::new(ElementType::decode(reader)?)),
            other => return Err(BlobError::UnknownElementType(other, offset)),
        })
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Boolean => write!(f, "bool"),
            ElementType::Char => write!(f, "char"),
            ElementType::I8 => write!(f, "sbyte"),
            ElementType::U8 => write!(f, "byte"),
            ElementType::I16 => write!(f, "short"),
            ElementType::U16 => write!(f, "ushort"),
            ElementType::I32 => write!(f, "int"),
            ElementType::U32 => write!(f, "uint"),
            ElementType::I64 => write!(f, "long"),
            ElementType::U64 => write!(f, "ulong"),
            ElementType::F32 => write!(f, "float"),
            ElementType::F64 => write!(f, "double"),
            ElementType::String => write!(f, "string"),
            ElementType::Type => write!(f, "System.Type"),
            ElementType::Boxed => write!(f, "object"),
            ElementType::Enum { type_name, .. } => write!(f, "{}", type_name),
            ElementType::SzArray(inner) => write!(f, "{}[]", inner),
        }
    }
}

// ============================================================================
// Values
// ============================================================================

/// A constant attribute argument value
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Null string, type or array
    Null,
    /// `bool`
    Boolean(bool),
    /// `char`
    Char(char),
    /// `sbyte`
    I8(i8),
    /// `byte`
    U8(u8),
    /// `short`
    I16(i16),
    /// `ushort`
    U16(u16),
    /// `int`
    I32(i32),
    /// `uint`
    U32(u32),
    /// `long`
    I64(i64),
    /// `ulong`
    U64(u64),
    /// `float`
    F32(f32),
    /// `double`
    F64(f64),
    /// `string`
    String(String),
    /// `typeof(T)`, by full name
    Type(String),
    /// Enum member, by underlying value
    Enum {
        /// Full name of the enum type
        type_name: String,
        /// Underlying integral value
        value: Box<AttributeValue>,
    },
    /// Single-dimensional array
    Array {
        /// Declared element type
        element_type: ElementType,
        /// Elements
        values: Vec<AttributeValue>,
    },
}

impl AttributeValue {
    /// Element type that describes this value when boxed
    pub fn element_type(&self) -> ElementType {
        match self {
            AttributeValue::Null | AttributeValue::String(_) => ElementType::String,
            AttributeValue::Boolean(_) => ElementType::Boolean,
            AttributeValue::Char(_) => ElementType::Char,
            AttributeValue::I8(_) => ElementType::I8,
            AttributeValue::U8(_) => ElementType::U8,
            AttributeValue::I16(_) => ElementType::I16,
            AttributeValue::U16(_) => ElementType::U16,
            AttributeValue::I32(_) => ElementType::I32,
            AttributeValue::U32(_) => ElementType::U32,
            AttributeValue::I64(_) => ElementType::I64,
            AttributeValue::U64(_) => ElementType::U64,
            AttributeValue::F32(_) => ElementType::F32,
            AttributeValue::F64(_) => ElementType::F64,
            AttributeValue::Type(_) => ElementType::Type,
            AttributeValue::Enum { type_name, value } => ElementType::Enum {
                type_name: type_name.clone(),
                underlying: Box::new(value.element_type()),
            },
            AttributeValue::Array { element_type, .. } => {
                ElementType::SzArray(Box::new(element_type.clone()))
            }
        }
    }

    /// String content, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean content, if this is a bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integral content widened to `i64` (enums yield their underlying value)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::I8(v) => Some(i64::from(*v)),
            AttributeValue::U8(v) => Some(i64::from(*v)),
            AttributeValue::I16(v) => Some(i64::from(*v)),
            AttributeValue::U16(v) => Some(i64::from(*v)),
            AttributeValue::I32(v) => Some(i64::from(*v)),
            AttributeValue::U32(v) => Some(i64::from(*v)),
            AttributeValue::I64(v) => Some(*v),
            AttributeValue::U64(v) => i64::try_from(*v).ok(),
            AttributeValue::Enum { value, .. } => value.as_i64(),
            _ => None,
        }
    }
}

/// Whether a named argument sets a field or a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedArgumentKind {
    /// Field assignment
    Field,
    /// Property assignment
    Property,
}

/// A named attribute argument
#[derive(Debug, Clone, PartialEq)]
pub struct NamedArgument {
    /// Field or property
    pub kind: NamedArgumentKind,
    /// Member name
    pub name: String,
    /// Assigned value
    pub value: AttributeValue,
}

impl NamedArgument {
    /// Property assignment
    pub fn property(name: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            kind: NamedArgumentKind::Property,
            name: name.into(),
            value,
        }
    }

    /// Field assignment
    pub fn field(name: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            kind: NamedArgumentKind::Field,
            name: name.into(),
            value,
        }
    }
}

/// Arguments decoded from an attribute blob
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedAttribute {
    /// Constructor arguments in parameter order
    pub fixed_arguments: Vec<AttributeValue>,
    /// Named arguments in blob order
    pub named_arguments: Vec<NamedArgument>,
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode the arguments of an attribute applied through a constructor with
/// the given parameter types
pub fn encode_attribute_blob(
    parameters: &[TypeSig],
    fixed_arguments: &[AttributeValue],
    named_arguments: &[NamedArgument],
) -> Result<Vec<u8>, BlobError> {
    if parameters.len() != fixed_arguments.len() {
        return Err(BlobError::ArgumentCountMismatch {
            expected: parameters.len(),
            actual: fixed_arguments.len(),
        });
    }

    let mut writer = BinaryWriter::new();
    writer.emit_u16(PROLOG);
    for (param, value) in parameters.iter().zip(fixed_arguments) {
        let ty = ElementType::for_parameter(param)?;
        write_value(&mut writer, &ty, value)?;
    }

    writer.emit_u16(named_arguments.len() as u16);
    for named in named_arguments {
        writer.emit_u8(match named.kind {
            NamedArgumentKind::Field => element::FIELD,
            NamedArgumentKind::Property => element::PROPERTY,
        });
        let ty = named.value.element_type();
        ty.encode(&mut writer);
        writer.emit_string(Some(&named.name));
        write_value(&mut writer, &ty, &named.value)?;
    }

    Ok(writer.into_bytes())
}

fn mismatch(expected: &ElementType, value: &AttributeValue) -> BlobError {
    BlobError::ValueMismatch {
        expected: expected.to_string(),
        found: value.element_type().to_string(),
    }
}

fn write_value(
    writer: &mut BinaryWriter,
    ty: &ElementType,
    value: &AttributeValue,
) -> Result<(), BlobError> {
    match (ty, value) {
        (ElementType::Boolean, AttributeValue::Boolean(b)) => writer.emit_u8(u8::from(*b)),
        (ElementType::Char, AttributeValue::Char(c)) => {
            let code = u16::try_from(u32::from(*c)).map_err(|_| BlobError::InvalidChar(u32::from(*c)))?;
            writer.emit_u16(code);
        }
        (ElementType::I8, AttributeValue::I8(v)) => writer.emit_u8(*v as u8),
        (ElementType::U8, AttributeValue::U8(v)) => writer.emit_u8(*v),
        (ElementType::I16, AttributeValue::I16(v)) => writer.emit_u16(*v as u16),
        (ElementType::U16, AttributeValue::U16(v)) => writer.emit_u16(*v),
        (ElementType::I32, AttributeValue::I32(v)) => writer.emit_u32(*v as u32),
        (ElementType::U32, AttributeValue::U32(v)) => writer.emit_u32(*v),
        (ElementType::I64, AttributeValue::I64(v)) => writer.emit_u64(*v as u64),
        (ElementType::U64, AttributeValue::U64(v)) => writer.emit_u64(*v),
        (ElementType::F32, AttributeValue::F32(v)) => writer.emit_f32(*v),
        (ElementType::F64, AttributeValue::F64(v)) => writer.emit_f64(*v),
        (ElementType::String, AttributeValue::String(s))
        | (ElementType::Type, AttributeValue::Type(s)) => writer.emit_string(Some(s)),
        (ElementType::String | ElementType::Type, AttributeValue::Null) => writer.emit_string(None),
        (ElementType::Boxed, value) => {
            let actual = value.element_type();
            actual.encode(writer);
            write_value(writer, &actual, value)?;
        }
        (
            ElementType::Enum {
                type_name,
                underlying,
            },
            AttributeValue::Enum {
                type_name: value_type,
                value,
            },
        ) if type_name == value_type => write_value(writer, underlying, value)?,
        (
            ElementType::SzArray(element),
            AttributeValue::Array {
                element_type,
                values,
            },
        ) if **element == *element_type => {
            writer.emit_u32(values.len() as u32);
            for v in values {
                write_value(writer, element, v)?;
            }
        }
        (ElementType::SzArray(_), AttributeValue::Null) => writer.emit_u32(NULL_LENGTH),
        (expected, value) => return Err(mismatch(expected, value)),
    }
    Ok(())
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode an attribute blob for a constructor with the given parameter types
pub fn decode_attribute_blob(
    blob: &[u8],
    parameters: &[TypeSig],
) -> Result<DecodedAttribute, BlobError> {
    if blob.is_empty() && parameters.is_empty() {
        return Ok(DecodedAttribute::default());
    }

    let mut reader = BinaryReader::new(blob);
    let prolog = reader.read_u16()?;
    if prolog != PROLOG {
        return Err(BlobError::InvalidProlog(prolog));
    }

    let mut fixed_arguments = Vec::with_capacity(parameters.len());
    for param in parameters {
        let ty = ElementType::for_parameter(param)?;
        fixed_arguments.push(read_value(&mut reader, &ty)?);
    }

    let named_count = if reader.has_more() { reader.read_u16()? } else { 0 };
    let mut named_arguments = Vec::with_capacity(usize::from(named_count));
    for _ in 0..named_count {
        let offset = reader.position();
        let kind = match reader.read_u8()? {
            element::FIELD => NamedArgumentKind::Field,
            element::PROPERTY => NamedArgumentKind::Property,
            other => return Err(BlobError::InvalidNamedArgumentKind(other, offset)),
        };
        let ty = ElementType::decode(&mut reader)?;
        let name = reader.read_string()?;
        let value = read_value(&mut reader, &ty)?;
        named_arguments.push(NamedArgument { kind, name, value });
    }

    if reader.has_more() {
        return Err(BlobError::TrailingBytes(reader.remaining()));
    }

    Ok(DecodedAttribute {
        fixed_arguments,
        named_arguments,
    })
}

fn read_value(reader: &mut BinaryReader<'_>, ty: &ElementType) -> Result<AttributeValue, BlobError> {
    Ok(match ty {
        ElementType::Boolean => AttributeValue::Boolean(reader.read_u8()? != 0),
        ElementType::Char => {
            let code = u32::from(reader.read_u16()?);
            AttributeValue::Char(char::from_u32(code).ok_or(BlobError::InvalidChar(code))?)
        }
        ElementType::I8 => AttributeValue::I8(reader.read_u8()? as i8),
        ElementType::U8 => AttributeValue::U8(reader.read_u8()?),
        ElementType::I16 => AttributeValue::I16(reader.read_u16()? as i16),
        ElementType::U16 => AttributeValue::U16(reader.read_u16()?),
        ElementType::I32 => AttributeValue::I32(reader.read_u32()? as i32),
        ElementType::U32 => AttributeValue::U32(reader.read_u32()?),
        ElementType::I64 => AttributeValue::I64(reader.read_u64()? as i64),
        ElementType::U64 => AttributeValue::U64(reader.read_u64()?),
        ElementType::F32 => AttributeValue::F32(reader.read_f32()?),
        ElementType::F64 => AttributeValue::F64(reader.read_f64()?),
        ElementType::String => match reader.read_nullable_string()? {
            Some(s) => AttributeValue::String(s),
            None => AttributeValue::Null,
        },
        ElementType::Type => match reader.read_nullable_string()? {
            Some(s) => AttributeValue::Type(s),
            None => AttributeValue::Null,
        },
        ElementType::Boxed => {
            let actual = ElementType::decode(reader)?;
            read_value(reader, &actual)?
        }
        ElementType::Enum {
            type_name,
            underlying,
        } => AttributeValue::Enum {
            type_name: type_name.clone(),
            value: Box::new(read_value(reader, underlying)?),
        },
        ElementType::SzArray(element) => {
            let count = reader.read_u32()?;
            if count == NULL_LENGTH {
                AttributeValue::Null
            } else {
                let mut values = Vec::with_capacity((count as usize).min(reader.remaining()));
                for _ in 0..count {
                    values.push(read_value(reader, element)?);
                }
                AttributeValue::Array {
                    element_type: (**element).clone(),
                    values,
                }
            }
        }
    })
}
