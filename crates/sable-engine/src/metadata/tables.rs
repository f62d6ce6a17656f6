//! Metadata tables
//!
//! Types own their members directly; a member is addressed by its type's index
//! plus its position in the owning list. Property and event accessors are
//! stored as indices into the declaring type's method list.

use super::constants::ConstantPool;
use super::encoder::{BinaryReader, BinaryWriter, DecodeError};
use super::signature::{decode_signatures, encode_signatures, MemberRefSig, TypeSig};

/// Type attribute flags
pub mod type_flags {
    /// Interface type
    pub const INTERFACE: u32 = 1 << 0;
    /// Value type
    pub const VALUE_TYPE: u32 = 1 << 1;
    /// Enumeration
    pub const ENUM: u32 = 1 << 2;
    /// Abstract type
    pub const ABSTRACT: u32 = 1 << 3;
}

/// Member attribute flags
pub mod member_flags {
    /// Static member
    pub const STATIC: u32 = 1 << 0;
    /// Name has special meaning (accessors, operators, constructors)
    pub const SPECIAL_NAME: u32 = 1 << 1;
    /// Virtual method
    pub const VIRTUAL: u32 = 1 << 2;
    /// Abstract method
    pub const ABSTRACT: u32 = 1 << 3;
}

/// An attribute applied to a metadata entity
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAttribute {
    /// Attribute constructor that was invoked
    pub constructor: MemberRefSig,
    /// Encoded constructor arguments and named arguments
    pub blob: Vec<u8>,
}

impl CustomAttribute {
    /// Full name of the attribute type
    pub fn attribute_type(&self) -> &str {
        self.constructor.declaring_type.full_name().unwrap_or("")
    }

    fn encode(&self, writer: &mut BinaryWriter, pool: &mut ConstantPool) {
        self.constructor.encode(writer, pool);
        writer.emit_blob(&self.blob);
    }

    fn decode(reader: &mut BinaryReader<'_>, pool: &ConstantPool) -> Result<Self, DecodeError> {
        Ok(Self {
            constructor: MemberRefSig::decode(reader, pool)?,
            blob: reader.read_blob()?,
        })
    }
}

fn encode_attributes(attrs: &[CustomAttribute], writer: &mut BinaryWriter, pool: &mut ConstantPool) {
    writer.emit_u32(attrs.len() as u32);
    for attr in attrs {
        attr.encode(writer, pool);
    }
}

fn decode_attributes(
    reader: &mut BinaryReader<'_>,
    pool: &ConstantPool,
) -> Result<Vec<CustomAttribute>, DecodeError> {
    let count = reader.read_u32()? as usize;
    let mut attrs = Vec::with_capacity(count.min(reader.remaining()));
    for _ in 0..count {
        attrs.push(CustomAttribute::decode(reader, pool)?);
    }
    Ok(attrs)
}

fn read_name(reader: &mut BinaryReader<'_>, pool: &ConstantPool) -> Result<String, DecodeError> {
    Ok(pool.get(reader.read_u32()?)?.to_string())
}

// ============================================================================
// Fields
// ============================================================================

/// Field definition
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Field type
    pub signature: TypeSig,
    /// Member flags
    pub flags: u32,
    /// Applied attributes
    pub custom_attributes: Vec<CustomAttribute>,
}

impl FieldDef {
    /// Create a field
    pub fn new(name: impl Into<String>, signature: TypeSig) -> Self {
        Self {
            name: name.into(),
            signature,
            flags: 0,
            custom_attributes: Vec::new(),
        }
    }

    fn encode(&self, writer: &mut BinaryWriter, pool: &mut ConstantPool) {
        writer.emit_u32(pool.intern(&self.name));
        self.signature.encode(writer, pool);
        writer.emit_u32(self.flags);
        encode_attributes(&self.custom_attributes, writer, pool);
    }

    fn decode(reader: &mut BinaryReader<'_>, pool: &ConstantPool) -> Result<Self, DecodeError> {
        Ok(Self {
            name: read_name(reader, pool)?,
            signature: TypeSig::decode(reader, pool)?,
            flags: reader.read_u32()?,
            custom_attributes: decode_attributes(reader, pool)?,
        })
    }
}

// ============================================================================
// Methods
// ============================================================================

/// Method definition (including constructors, operators and accessors)
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    /// Method name; explicit implementations carry the interface-qualified
    /// name (`Ns.IFace<T>.Member`)
    pub name: String,
    /// Parameter types
    pub parameters: Vec<TypeSig>,
    /// Return type
    pub return_type: TypeSig,
    /// Number of generic method parameters
    pub generic_parameter_count: u32,
    /// Member flags
    pub flags: u32,
    /// Interface members this method explicitly implements
    pub implements: Vec<MemberRefSig>,
    /// Applied attributes
    pub custom_attributes: Vec<CustomAttribute>,
}

impl MethodDef {
    /// Create a method
    pub fn new(name: impl Into<String>, parameters: Vec<TypeSig>, return_type: TypeSig) -> Self {
        Self {
            name: name.into(),
            parameters,
            return_type,
            generic_parameter_count: 0,
            flags: 0,
            implements: Vec::new(),
            custom_attributes: Vec::new(),
        }
    }

    /// Check whether the method is static
    pub fn is_static(&self) -> bool {
        self.flags & member_flags::STATIC != 0
    }

    fn encode(&self, writer: &mut BinaryWriter, pool: &mut ConstantPool) {
        writer.emit_u32(pool.intern(&self.name));
        encode_signatures(&self.parameters, writer, pool);
        self.return_type.encode(writer, pool);
        writer.emit_u32(self.generic_parameter_count);
        writer.emit_u32(self.flags);
        writer.emit_u32(self.implements.len() as u32);
        for member in &self.implements {
            member.encode(writer, pool);
        }
        encode_attributes(&self.custom_attributes, writer, pool);
    }

    fn decode(reader: &mut BinaryReader<'_>, pool: &ConstantPool) -> Result<Self, DecodeError> {
        let name = read_name(reader, pool)?;
        let parameters = decode_signatures(reader, pool)?;
        let return_type = TypeSig::decode(reader, pool)?;
        let generic_parameter_count = reader.read_u32()?;
        let flags = reader.read_u32()?;
        let implements_count = reader.read_u32()? as usize;
        let mut implements = Vec::with_capacity(implements_count.min(reader.remaining()));
        for _ in 0..implements_count {
            implements.push(MemberRefSig::decode(reader, pool)?);
        }
        Ok(Self {
            name,
            parameters,
            return_type,
            generic_parameter_count,
            flags,
            implements,
            custom_attributes: decode_attributes(reader, pool)?,
        })
    }
}

// ============================================================================
// Properties and events
// ============================================================================

/// Property or indexer definition
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    /// Property name (`Item` for indexers, qualified for explicit
    /// implementations)
    pub name: String,
    /// Property type
    pub property_type: TypeSig,
    /// Index parameter types (empty for plain properties)
    pub parameters: Vec<TypeSig>,
    /// Getter method index
    pub getter: Option<u32>,
    /// Setter method index
    pub setter: Option<u32>,
    /// Applied attributes
    pub custom_attributes: Vec<CustomAttribute>,
}

impl PropertyDef {
    /// Create a property without accessors
    pub fn new(name: impl Into<String>, property_type: TypeSig, parameters: Vec<TypeSig>) -> Self {
        Self {
            name: name.into(),
            property_type,
            parameters,
            getter: None,
            setter: None,
            custom_attributes: Vec::new(),
        }
    }

    fn encode(&self, writer: &mut BinaryWriter, pool: &mut ConstantPool) {
        writer.emit_u32(pool.intern(&self.name));
        self.property_type.encode(writer, pool);
        encode_signatures(&self.parameters, writer, pool);
        writer.emit_optional_index(self.getter);
        writer.emit_optional_index(self.setter);
        encode_attributes(&self.custom_attributes, writer, pool);
    }

    fn decode(reader: &mut BinaryReader<'_>, pool: &ConstantPool) -> Result<Self, DecodeError> {
        Ok(Self {
            name: read_name(reader, pool)?,
            property_type: TypeSig::decode(reader, pool)?,
            parameters: decode_signatures(reader, pool)?,
            getter: reader.read_optional_index()?,
            setter: reader.read_optional_index()?,
            custom_attributes: decode_attributes(reader, pool)?,
        })
    }
}

/// Event definition
#[derive(Debug, Clone, PartialEq)]
pub struct EventDef {
    /// Event name
    pub name: String,
    /// Delegate type of the event
    pub event_type: TypeSig,
    /// Adder method index
    pub adder: Option<u32>,
    /// Remover method index
    pub remover: Option<u32>,
    /// Applied attributes
    pub custom_attributes: Vec<CustomAttribute>,
}

impl EventDef {
    /// Create an event without accessors
    pub fn new(name: impl Into<String>, event_type: TypeSig) -> Self {
        Self {
            name: name.into(),
            event_type,
            adder: None,
            remover: None,
            custom_attributes: Vec::new(),
        }
    }

    fn encode(&self, writer: &mut BinaryWriter, pool: &mut ConstantPool) {
        writer.emit_u32(pool.intern(&self.name));
        self.event_type.encode(writer, pool);
        writer.emit_optional_index(self.adder);
        writer.emit_optional_index(self.remover);
        encode_attributes(&self.custom_attributes, writer, pool);
    }

    fn decode(reader: &mut BinaryReader<'_>, pool: &ConstantPool) -> Result<Self, DecodeError> {
        Ok(Self {
            name: read_name(reader, pool)?,
            event_type: TypeSig::decode(reader, pool)?,
            adder: reader.read_optional_index()?,
            remover: reader.read_optional_index()?,
            custom_attributes: decode_attributes(reader, pool)?,
        })
    }
}

// ============================================================================
// Types
// ============================================================================

/// Type definition
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeDef {
    /// Namespace (empty for nested types)
    pub namespace: String,
    /// Name including the `` `N `` arity suffix
    pub name: String,
    /// Number of generic parameters declared by this type
    pub generic_parameter_count: u32,
    /// Index of the enclosing type for nested types
    pub enclosing_type: Option<u32>,
    /// Type flags
    pub flags: u32,
    /// Fields
    pub fields: Vec<FieldDef>,
    /// Methods
    pub methods: Vec<MethodDef>,
    /// Properties and indexers
    pub properties: Vec<PropertyDef>,
    /// Events
    pub events: Vec<EventDef>,
    /// Attributes applied to the type
    pub custom_attributes: Vec<CustomAttribute>,
}

impl TypeDef {
    /// Create an empty top-level type
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a method and return its index
    pub fn add_method(&mut self, method: MethodDef) -> u32 {
        self.methods.push(method);
        (self.methods.len() - 1) as u32
    }

    /// Encode the type
    pub fn encode(&self, writer: &mut BinaryWriter, pool: &mut ConstantPool) {
        writer.emit_u32(pool.intern(&self.namespace));
        writer.emit_u32(pool.intern(&self.name));
        writer.emit_u32(self.generic_parameter_count);
        writer.emit_optional_index(self.enclosing_type);
        writer.emit_u32(self.flags);

        writer.emit_u32(self.fields.len() as u32);
        for field in &self.fields {
            field.encode(writer, pool);
        }
        writer.emit_u32(self.methods.len() as u32);
        for method in &self.methods {
            method.encode(writer, pool);
        }
        writer.emit_u32(self.properties.len() as u32);
        for property in &self.properties {
            property.encode(writer, pool);
        }
        writer.emit_u32(self.events.len() as u32);
        for event in &self.events {
            event.encode(writer, pool);
        }
        encode_attributes(&self.custom_attributes, writer, pool);
    }

    /// Decode a type
    pub fn decode(reader: &mut BinaryReader<'_>, pool: &ConstantPool) -> Result<Self, DecodeError> {
        let namespace = read_name(reader, pool)?;
        let name = read_name(reader, pool)?;
        let generic_parameter_count = reader.read_u32()?;
        let enclosing_type = reader.read_optional_index()?;
        let flags = reader.read_u32()?;

        let field_count = reader.read_u32()? as usize;
        let mut fields = Vec::with_capacity(field_count.min(reader.remaining()));
        for _ in 0..field_count {
            fields.push(FieldDef::decode(reader, pool)?);
        }
        let method_count = reader.read_u32()? as usize;
        let mut methods = Vec::with_capacity(method_count.min(reader.remaining()));
        for _ in 0..method_count {
            methods.push(MethodDef::decode(reader, pool)?);
        }
        let property_count = reader.read_u32()? as usize;
        let mut properties = Vec::with_capacity(property_count.min(reader.remaining()));
        for _ in 0..property_count {
            properties.push(PropertyDef::decode(reader, pool)?);
        }
        let event_count = reader.read_u32()? as usize;
        let mut events = Vec::with_capacity(event_count.min(reader.remaining()));
        for _ in 0..event_count {
            events.push(EventDef::decode(reader, pool)?);
        }

        let def = Self {
            namespace,
            name,
            generic_parameter_count,
            enclosing_type,
            flags,
            fields,
            methods,
            properties,
            events,
            custom_attributes: decode_attributes(reader, pool)?,
        };
        def.check_accessor_indices()?;
        Ok(def)
    }

    fn check_accessor_indices(&self) -> Result<(), DecodeError> {
        let len = self.methods.len();
        let accessors = self
            .properties
            .iter()
            .flat_map(|p| [p.getter, p.setter])
            .chain(self.events.iter().flat_map(|e| [e.adder, e.remover]))
            .flatten();
        for index in accessors {
            if index as usize >= len {
                return Err(DecodeError::IndexOutOfRange {
                    table: "method table",
                    index,
                    len,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int() -> TypeSig {
        TypeSig::named("System.Int32")
    }

    #[test]
    fn test_type_encode_decode() {
        let mut ty = TypeDef::new("Acme", "Grid`1");
        ty.generic_parameter_count = 1;
        let getter = ty.add_method(MethodDef::new(
            "get_Item",
            vec![int(), int()],
            TypeSig::TypeParameter(0),
        ));
        let mut indexer = PropertyDef::new("Item", TypeSig::TypeParameter(0), vec![int(), int()]);
        indexer.getter = Some(getter);
        ty.properties.push(indexer);
        ty.fields.push(FieldDef::new("cells", TypeSig::array(TypeSig::TypeParameter(0))));

        let mut pool = ConstantPool::new();
        let mut writer = BinaryWriter::new();
        ty.encode(&mut writer, &mut pool);
        let bytes = writer.into_bytes();
        let decoded = TypeDef::decode(&mut BinaryReader::new(&bytes), &pool).unwrap();
        assert_eq!(decoded, ty);
    }

    #[test]
    fn test_accessor_index_out_of_range() {
        let mut ty = TypeDef::new("Acme", "Broken");
        let mut property = PropertyDef::new("P", int(), vec![]);
        property.setter = Some(3);
        ty.properties.push(property);

        let mut pool = ConstantPool::new();
        let mut writer = BinaryWriter::new();
        ty.encode(&mut writer, &mut pool);
        let bytes = writer.into_bytes();
        let result = TypeDef::decode(&mut BinaryReader::new(&bytes), &pool);
        assert!(matches!(
            result,
            Err(DecodeError::IndexOutOfRange { index: 3, len: 0, .. })
        ));
    }
}
