//! Compiled metadata
//!
//! The binary form produced by a first compilation of a program: type and
//! member tables with their custom attributes. The resolver maps semantic
//! entities onto these tables; the write-back engine decodes their attribute
//! blobs.

pub mod blob;
pub mod constants;
pub mod encoder;
pub mod module;
pub mod reader;
pub mod signature;
pub mod tables;

pub use blob::{
    decode_attribute_blob, encode_attribute_blob, AttributeValue, BlobError, DecodedAttribute,
    ElementType, NamedArgument, NamedArgumentKind,
};
pub use constants::ConstantPool;
pub use encoder::{BinaryReader, BinaryWriter, DecodeError};
pub use module::{MetadataModule, ModuleError};
pub use reader::{EntityHandle, LoadedMetadata, MetadataReader, TypeIndex};
pub use signature::{MemberRefSig, TypeSig};
pub use tables::{member_flags, type_flags, CustomAttribute, EventDef, FieldDef, MethodDef, PropertyDef, TypeDef};
