//! Metadata module format
//!
//! Header: magic (4 bytes) + version (u32) + crc32 (u32) + SHA-256 (32 bytes),
//! both checksums computed over the payload that follows. Payload: string
//! pool, module name, type table.

use super::constants::ConstantPool;
use super::encoder::{BinaryReader, BinaryWriter, DecodeError};
use super::tables::TypeDef;
use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;

/// Magic number for metadata files: "SBLM"
pub const MAGIC: [u8; 4] = *b"SBLM";

/// Current format version
pub const VERSION: u32 = 1;

const HEADER_LEN: usize = 4 + 4 + 4 + 32;

/// Module encoding/decoding errors
#[derive(Debug, Error)]
pub enum ModuleError {
    /// Decode error
    #[error("Decode error: {0}")]
    DecodeError(#[from] DecodeError),

    /// Invalid magic number
    #[error("Invalid magic number: expected SBLM, got {0:?}")]
    InvalidMagic([u8; 4]),

    /// Unsupported version
    #[error("Unsupported version: {0} (current: {VERSION})")]
    UnsupportedVersion(u32),

    /// CRC32 mismatch
    #[error("Checksum mismatch: expected {expected:#x}, got {actual:#x}")]
    ChecksumMismatch {
        /// Stored checksum
        expected: u32,
        /// Computed checksum
        actual: u32,
    },

    /// SHA-256 mismatch
    #[error("Content hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        /// Stored hash (hex)
        expected: String,
        /// Computed hash (hex)
        actual: String,
    },

    /// Nested type refers to a missing enclosing type, or its enclosing
    /// chain loops back on itself
    #[error("Type {type_name} has invalid enclosing type {index}")]
    InvalidEnclosingType {
        /// Name of the nested type
        type_name: String,
        /// Enclosing type index
        index: u32,
    },

    /// I/O error while reading or writing a module file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A compiled metadata module
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataModule {
    /// Module name
    pub name: String,
    /// Type definitions; nested types reference their enclosing type by index
    pub types: Vec<TypeDef>,
    /// SHA-256 of the payload, filled in by [`MetadataModule::decode`]
    pub checksum: [u8; 32],
}

impl MetadataModule {
    /// Create an empty module
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
            checksum: [0; 32],
        }
    }

    /// Add a type and return its index
    pub fn add_type(&mut self, def: TypeDef) -> u32 {
        self.types.push(def);
        (self.types.len() - 1) as u32
    }

    /// Full structural name of a type (`Ns.Outer`1+Inner`)
    ///
    /// Returns `None` for a missing index or an enclosing chain that loops.
    pub fn full_name(&self, index: u32) -> Option<String> {
        let mut def = self.types.get(index as usize)?;
        let mut nested = vec![def.name.as_str()];
        while let Some(outer) = def.enclosing_type {
            if nested.len() > self.types.len() {
                return None;
            }
            def = self.types.get(outer as usize)?;
            nested.push(def.name.as_str());
        }
        nested.reverse();
        let path = nested.join("+");
        if def.namespace.is_empty() {
            Some(path)
        } else {
            Some(format!("{}.{}", def.namespace, path))
        }
    }

    /// Hex form of the content hash
    pub fn checksum_hex(&self) -> String {
        hex::encode(self.checksum)
    }

    /// Encode the module
    pub fn encode(&self) -> Vec<u8> {
        // Tables go to a separate buffer first so the pool is complete
        // before it is written
        let mut pool = ConstantPool::new();
        let mut tables = BinaryWriter::new();
        tables.emit_u32(pool.intern(&self.name));
        tables.emit_u32(self.types.len() as u32);
        for def in &self.types {
            def.encode(&mut tables, &mut pool);
        }

        let mut payload = BinaryWriter::new();
        pool.encode(&mut payload);
        payload.emit_bytes(tables.buffer());
        let payload = payload.into_bytes();

        let mut writer = BinaryWriter::new();
        writer.emit_bytes(&MAGIC);
        writer.emit_u32(VERSION);
        writer.emit_u32(crc32fast::hash(&payload));
        let hash: [u8; 32] = Sha256::digest(&payload).into();
        writer.emit_bytes(&hash);
        writer.emit_bytes(&payload);
        writer.into_bytes()
    }

    /// Decode a module
    pub fn decode(data: &[u8]) -> Result<Self, ModuleError> {
        let mut reader = BinaryReader::new(data);

        let mut magic = [0u8; 4];
        magic.copy_from_slice(reader.read_bytes(4)?);
        if magic != MAGIC {
            return Err(ModuleError::InvalidMagic(magic));
        }

        let version = reader.read_u32()?;
        if version != VERSION {
            return Err(ModuleError::UnsupportedVersion(version));
        }

        let stored_crc32 = reader.read_u32()?;
        let mut checksum = [0u8; 32];
        checksum.copy_from_slice(reader.read_bytes(32)?);

        let payload = &data[HEADER_LEN..];
        let calculated_crc32 = crc32fast::hash(payload);
        if stored_crc32 != calculated_crc32 {
            return Err(ModuleError::ChecksumMismatch {
                expected: stored_crc32,
                actual: calculated_crc32,
            });
        }
        let calculated: [u8; 32] = Sha256::digest(payload).into();
        if checksum != calculated {
            return Err(ModuleError::HashMismatch {
                expected: hex::encode(checksum),
                actual: hex::encode(calculated),
            });
        }

        let pool = ConstantPool::decode(&mut reader)?;
        let name = pool.get(reader.read_u32()?)?.to_string();
        let type_count = reader.read_u32()? as usize;
        let mut types = Vec::with_capacity(type_count.min(reader.remaining()));
        for _ in 0..type_count {
            types.push(TypeDef::decode(&mut reader, &pool)?);
        }

        for def in &types {
            let mut steps = 0;
            let mut current = def;
            while let Some(index) = current.enclosing_type {
                steps += 1;
                match types.get(index as usize) {
                    Some(outer) if steps <= types.len() => current = outer,
                    _ => {
                        return Err(ModuleError::InvalidEnclosingType {
                            type_name: def.name.clone(),
                            index,
                        })
                    }
                }
            }
        }

        Ok(Self {
            name,
            types,
            checksum,
        })
    }

    /// Read and decode a module file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModuleError> {
        let bytes = std::fs::read(path)?;
        Self::decode(&bytes)
    }

    /// Encode and write a module file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModuleError> {
        std::fs::write(path, self.encode())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::{FieldDef, MethodDef};
    use crate::metadata::signature::TypeSig;

    fn sample() -> MetadataModule {
        let mut module = MetadataModule::new("Acme.Core");
        let mut outer = TypeDef::new("Acme", "Outer`1");
        outer.generic_parameter_count = 1;
        outer.fields.push(FieldDef::new("value", TypeSig::TypeParameter(0)));
        let outer = module.add_type(outer);
        let mut inner = TypeDef::new("", "Inner");
        inner.enclosing_type = Some(outer);
        inner.methods.push(MethodDef::new(".ctor", vec![], TypeSig::named("System.Void")));
        module.add_type(inner);
        module
    }

    #[test]
    fn test_encode_decode() {
        let module = sample();
        let bytes = module.encode();
        let decoded = MetadataModule::decode(&bytes).unwrap();
        assert_eq!(decoded.name, "Acme.Core");
        assert_eq!(decoded.types, module.types);
        assert_eq!(decoded.full_name(1).as_deref(), Some("Acme.Outer`1+Inner"));
        assert_eq!(decoded.checksum_hex().len(), 64);
    }

    #[test]
    fn test_checksum_validation() {
        let mut bytes = sample().encode();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let result = MetadataModule::decode(&bytes);
        assert!(matches!(result, Err(ModuleError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_invalid_magic_number() {
        let mut bytes = sample().encode();
        bytes[0] = b'X';
        let result = MetadataModule::decode(&bytes);
        assert!(matches!(result, Err(ModuleError::InvalidMagic(_))));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"SBLM");
        bytes.extend_from_slice(&999u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        let result = MetadataModule::decode(&bytes);
        assert!(matches!(result, Err(ModuleError::UnsupportedVersion(999))));
    }

    #[test]
    fn test_truncated_header() {
        let result = MetadataModule::decode(b"SB");
        assert!(matches!(result, Err(ModuleError::DecodeError(DecodeError::UnexpectedEnd(0)))));
    }

    #[test]
    fn test_missing_enclosing_type() {
        let mut module = MetadataModule::new("broken");
        let mut inner = TypeDef::new("", "Inner");
        inner.enclosing_type = Some(5);
        module.add_type(inner);
        let result = MetadataModule::decode(&module.encode());
        assert!(matches!(
            result,
            Err(ModuleError::InvalidEnclosingType { index: 5, .. })
        ));
    }

    #[test]
    fn test_enclosing_type_cycle() {
        let mut module = MetadataModule::new("broken");
        let mut looped = TypeDef::new("Acme", "Self");
        looped.enclosing_type = Some(0);
        module.add_type(looped);
        assert!(module.full_name(0).is_none());
        let result = MetadataModule::decode(&module.encode());
        assert!(matches!(result, Err(ModuleError::InvalidEnclosingType { .. })));

        let mut module = MetadataModule::new("broken");
        let mut a = TypeDef::new("Acme", "A");
        a.enclosing_type = Some(1);
        let mut b = TypeDef::new("", "B");
        b.enclosing_type = Some(0);
        module.add_type(a);
        module.add_type(b);
        assert!(module.full_name(1).is_none());
        let result = MetadataModule::decode(&module.encode());
        assert!(matches!(result, Err(ModuleError::InvalidEnclosingType { .. })));
    }

    #[test]
    fn test_deeply_nested_full_name() {
        let mut module = MetadataModule::new("nested");
        let outer = module.add_type(TypeDef::new("Acme", "Outer"));
        let mut middle = TypeDef::new("", "Middle");
        middle.enclosing_type = Some(outer);
        let middle = module.add_type(middle);
        let mut inner = TypeDef::new("", "Inner");
        inner.enclosing_type = Some(middle);
        let inner = module.add_type(inner);
        assert_eq!(module.full_name(inner).as_deref(), Some("Acme.Outer+Middle+Inner"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acme.sblm");
        let module = sample();
        module.save(&path).unwrap();
        let loaded = MetadataModule::load(&path).unwrap();
        assert_eq!(loaded.types, module.types);
    }
}
