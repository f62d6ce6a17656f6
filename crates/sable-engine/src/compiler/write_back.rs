//! Attribute write-back
//!
//! Reads the attributes of semantic entities back out of the compiled
//! metadata. Argument values come from the metadata's own encoding; source
//! expressions are never re-evaluated.

use super::resolver::{parameters_match, MetadataEntityResolver, ResolveError};
use crate::metadata::{
    decode_attribute_blob, AttributeValue, BlobError, CustomAttribute, MemberRefSig, MetadataReader,
    NamedArgument,
};
use crate::source::{Entity, MemberId, MemberKind, SemanticModel};
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors while reading attributes back
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WriteBackError {
    /// The entity could not be located in the metadata
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// An attribute blob could not be decoded
    #[error("Invalid attribute arguments: {0}")]
    Blob(#[from] BlobError),

    /// No semantic constructor matches an attribute's constructor reference
    #[error("Constructor '{constructor}' not found in the semantic model")]
    ConstructorNotFound {
        /// Constructor reference
        constructor: String,
    },
}

/// One attribute applied to an entity
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeRecord {
    /// Full name of the attribute type
    pub attribute_type: String,
    /// Constructor the attribute was applied through
    pub constructor: MemberRefSig,
    /// Constructor arguments
    pub positional_arguments: Vec<AttributeValue>,
    /// Field and property assignments
    pub named_arguments: Vec<NamedArgument>,
}

impl AttributeRecord {
    fn decode(attribute: &CustomAttribute) -> Result<Self, BlobError> {
        let decoded = decode_attribute_blob(&attribute.blob, &attribute.constructor.parameters)?;
        Ok(Self {
            attribute_type: attribute.attribute_type().to_string(),
            constructor: attribute.constructor.clone(),
            positional_arguments: decoded.fixed_arguments,
            named_arguments: decoded.named_arguments,
        })
    }

    /// Value of a named argument
    pub fn named_argument(&self, name: &str) -> Option<&AttributeValue> {
        self.named_arguments
            .iter()
            .find(|argument| argument.name == name)
            .map(|argument| &argument.value)
    }
}

/// Serves attribute queries for a compilation session
pub struct MetadataWriteBackEngine {
    resolver: MetadataEntityResolver,
    cache: DashMap<Entity, Arc<[AttributeRecord]>>,
}

impl MetadataWriteBackEngine {
    /// Create an engine over a model and the metadata compiled from it
    pub fn new(model: Arc<SemanticModel>, reader: Arc<dyn MetadataReader>) -> Self {
        Self {
            resolver: MetadataEntityResolver::new(model, reader),
            cache: DashMap::new(),
        }
    }

    /// The entity resolver
    pub fn resolver(&self) -> &MetadataEntityResolver {
        &self.resolver
    }

    /// Attributes applied to `entity`, in metadata order
    ///
    /// An entity without attributes yields an empty list. Repeated queries
    /// return the same shared list.
    pub fn get_attributes(&self, entity: Entity) -> Result<Arc<[AttributeRecord]>, WriteBackError> {
        if let Some(records) = self.cache.get(&entity).map(|r| r.value().clone()) {
            return Ok(records);
        }

        let handle = self.resolver.resolve(entity)?;
        let records = self
            .resolver
            .reader()
            .custom_attributes(handle)
            .iter()
            .map(AttributeRecord::decode)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(?handle, count = records.len(), "decoded attributes");

        let records: Arc<[AttributeRecord]> = records.into();
        Ok(self.cache.entry(entity).or_insert(records).value().clone())
    }

    /// Check whether `entity` carries an attribute of type `attribute_type`
    pub fn has_attribute(&self, entity: Entity, attribute_type: &str) -> Result<bool, WriteBackError> {
        Ok(self
            .get_attributes(entity)?
            .iter()
            .any(|record| record.attribute_type == attribute_type))
    }

    /// Find the semantic constructor an attribute was applied through
    pub fn resolve_attribute_constructor(&self, record: &AttributeRecord) -> Result<MemberId, WriteBackError> {
        let model = self.resolver.model();
        let not_found = || WriteBackError::ConstructorNotFound {
            constructor: record.constructor.to_string(),
        };
        let ty = model.find_type(&record.attribute_type).ok_or_else(not_found)?;
        model
            .type_def(ty)
            .members
            .iter()
            .copied()
            .find(|&m| {
                let def = model.member(m);
                def.kind == MemberKind::Constructor
                    && !def.is_static
                    && parameters_match(&record.constructor.parameters, &def.parameters)
            })
            .ok_or_else(not_found)
    }
}
