//! String pool for metadata modules
//!
//! Every name and signature string in the tables is stored once here and
//! referenced by index.

use super::encoder::{BinaryReader, BinaryWriter, DecodeError};
use rustc_hash::FxHashMap;

/// Interned string constants
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    /// String constants in index order
    pub strings: Vec<String>,
    lookup: FxHashMap<String, u32>,
}

impl ConstantPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string and return its index
    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(&index) = self.lookup.get(s) {
            return index;
        }
        let index = self.strings.len() as u32;
        self.strings.push(s.to_string());
        self.lookup.insert(s.to_string(), index);
        index
    }

    /// Get a string by index
    pub fn get(&self, index: u32) -> Result<&str, DecodeError> {
        self.strings
            .get(index as usize)
            .map(|s| s.as_str())
            .ok_or(DecodeError::IndexOutOfRange {
                table: "string pool",
                index,
                len: self.strings.len(),
            })
    }

    /// Number of strings
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if the pool is empty
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Encode the pool
    ///
    /// Format:
    /// - String count (u32)
    /// - For each string: length (u32) + UTF-8 bytes
    pub fn encode(&self, writer: &mut BinaryWriter) {
        writer.emit_u32(self.strings.len() as u32);
        for s in &self.strings {
            writer.emit_string(Some(s));
        }
    }

    /// Decode a pool
    pub fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, DecodeError> {
        let mut pool = ConstantPool::new();
        let count = reader.read_u32()? as usize;
        pool.strings.reserve(count);
        for index in 0..count {
            let s = reader.read_string()?;
            pool.lookup.entry(s.clone()).or_insert(index as u32);
            pool.strings.push(s);
        }
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning() {
        let mut pool = ConstantPool::new();
        let a = pool.intern("System.Int32");
        let b = pool.intern("get_Item");
        let c = pool.intern("System.Int32");
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(b).unwrap(), "get_Item");
        assert!(matches!(
            pool.get(5),
            Err(DecodeError::IndexOutOfRange { index: 5, len: 2, .. })
        ));
    }

    #[test]
    fn test_encode_decode() {
        let mut pool = ConstantPool::new();
        pool.intern("a");
        pool.intern("");
        let mut writer = BinaryWriter::new();
        pool.encode(&mut writer);
        let bytes = writer.into_bytes();
        let decoded = ConstantPool::decode(&mut BinaryReader::new(&bytes)).unwrap();
        assert_eq!(decoded.strings, vec!["a".to_string(), String::new()]);
    }
}
