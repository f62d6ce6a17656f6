//! Metadata reader
//!
//! The read-side interface the resolver and the write-back engine consume,
//! and its implementation over a decoded [`MetadataModule`].

use super::module::{MetadataModule, ModuleError};
use super::tables::{CustomAttribute, TypeDef};
use rustc_hash::FxHashMap;
use std::path::Path;

/// Index of a type in a metadata module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIndex(pub u32);

/// Handle of an attributable metadata entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityHandle {
    /// Type definition
    Type(TypeIndex),
    /// Field, by position in the type's field list
    Field(TypeIndex, u32),
    /// Method, by position in the type's method list
    Method(TypeIndex, u32),
    /// Property or indexer, by position in the type's property list
    Property(TypeIndex, u32),
    /// Event, by position in the type's event list
    Event(TypeIndex, u32),
}

impl EntityHandle {
    /// Type that owns this entity
    pub fn type_index(&self) -> TypeIndex {
        match *self {
            EntityHandle::Type(ty)
            | EntityHandle::Field(ty, _)
            | EntityHandle::Method(ty, _)
            | EntityHandle::Property(ty, _)
            | EntityHandle::Event(ty, _) => ty,
        }
    }
}

/// Read access to compiled metadata
pub trait MetadataReader: Send + Sync {
    /// Find a type by full structural name (`Ns.Outer`1+Inner`)
    fn find_type(&self, full_name: &str) -> Option<TypeIndex>;

    /// Get a type definition
    fn type_def(&self, index: TypeIndex) -> Option<&TypeDef>;

    /// Attributes applied to an entity; empty when the handle has none or is
    /// out of range
    fn custom_attributes(&self, handle: EntityHandle) -> &[CustomAttribute];
}

/// A decoded metadata module indexed for lookup
#[derive(Debug, Clone)]
pub struct LoadedMetadata {
    module: MetadataModule,
    by_name: FxHashMap<String, TypeIndex>,
}

impl LoadedMetadata {
    /// Index a decoded module
    pub fn new(module: MetadataModule) -> Self {
        let by_name = (0..module.types.len() as u32)
            .filter_map(|i| module.full_name(i).map(|name| (name, TypeIndex(i))))
            .collect();
        Self { module, by_name }
    }

    /// Decode and index a module from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ModuleError> {
        Ok(Self::new(MetadataModule::decode(bytes)?))
    }

    /// Read, decode and index a module file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModuleError> {
        let module = MetadataModule::load(path)?;
        tracing::debug!(module = %module.name, types = module.types.len(), "loaded metadata module");
        Ok(Self::new(module))
    }

    /// The underlying module
    pub fn module(&self) -> &MetadataModule {
        &self.module
    }
}

impl MetadataReader for LoadedMetadata {
    fn find_type(&self, full_name: &str) -> Option<TypeIndex> {
        self.by_name.get(full_name).copied()
    }

    fn type_def(&self, index: TypeIndex) -> Option<&TypeDef> {
        self.module.types.get(index.0 as usize)
    }

    fn custom_attributes(&self, handle: EntityHandle) -> &[CustomAttribute] {
        let Some(def) = self.type_def(handle.type_index()) else {
            return &[];
        };
        let attrs = match handle {
            EntityHandle::Type(_) => Some(&def.custom_attributes),
            EntityHandle::Field(_, i) => def.fields.get(i as usize).map(|f| &f.custom_attributes),
            EntityHandle::Method(_, i) => def.methods.get(i as usize).map(|m| &m.custom_attributes),
            EntityHandle::Property(_, i) => {
                def.properties.get(i as usize).map(|p| &p.custom_attributes)
            }
            EntityHandle::Event(_, i) => def.events.get(i as usize).map(|e| &e.custom_attributes),
        };
        attrs.map(|a| a.as_slice()).unwrap_or(&[])
    }
}
