//! Metadata entity resolver
//!
//! Maps entities of the semantic model onto the tables of a compiled
//! metadata module. The two sides are built independently, so nothing is
//! matched by identity:
//!
//! - types by full structural name (`Ns.Outer`1+Inner`);
//! - members by name within their declaring type, then by parameter
//!   signature, with generic parameters compared by position;
//! - conversion operators additionally by return type;
//! - explicit interface implementations by their mangled stored name
//!   (`Ns.IFace<T>.Member`), confirmed against the implemented interface
//!   recorded on the method or accessor;
//! - indexers by signature only;
//! - accessors through their already-resolved property or event.
//!
//! Results are cached per entity for the lifetime of the resolver.

use crate::metadata::{EntityHandle, MemberRefSig, MetadataReader, MethodDef, TypeDef, TypeIndex, TypeSig};
use crate::source::{
    AccessorRole, Entity, MemberDefinition, MemberId, MemberKind, Parameter, ParameterMode,
    SemanticModel, TypeDefId, TypeRef,
};
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

/// Resolution failures
///
/// The metadata is the compiled form of the same program, so every failure
/// indicates a compiler defect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Declaring type missing from the metadata
    #[error("Type '{name}' not found in metadata")]
    TypeNotFound {
        /// Full structural name
        name: String,
    },

    /// No member matched
    #[error("Member '{member}' not found in metadata type '{type_name}'")]
    MemberNotFound {
        /// Member description
        member: String,
        /// Declaring type name
        type_name: String,
    },

    /// More than one member matched
    #[error("Member '{member}' matches {candidates} metadata members")]
    AmbiguousMatch {
        /// Member description
        member: String,
        /// Number of matching candidates
        candidates: usize,
    },

    /// The owning property or event has no such accessor
    #[error("Accessor '{accessor}' not found in metadata")]
    AccessorNotFound {
        /// Accessor description
        accessor: String,
    },
}

/// Resolves semantic entities to metadata handles
pub struct MetadataEntityResolver {
    model: Arc<SemanticModel>,
    reader: Arc<dyn MetadataReader>,
    cache: DashMap<Entity, EntityHandle>,
}

impl MetadataEntityResolver {
    /// Create a resolver over a model and the metadata compiled from it
    pub fn new(model: Arc<SemanticModel>, reader: Arc<dyn MetadataReader>) -> Self {
        Self {
            model,
            reader,
            cache: DashMap::new(),
        }
    }

    /// The semantic model
    pub fn model(&self) -> &SemanticModel {
        &self.model
    }

    /// The metadata reader
    pub fn reader(&self) -> &dyn MetadataReader {
        &*self.reader
    }

    /// Number of cached resolutions
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Resolve an entity to its metadata handle
    pub fn resolve(&self, entity: Entity) -> Result<EntityHandle, ResolveError> {
        if let Some(handle) = self.cache.get(&entity).map(|h| *h) {
            tracing::trace!(?entity, ?handle, "resolution cache hit");
            return Ok(handle);
        }

        let handle = match entity {
            Entity::Type(ty) => EntityHandle::Type(self.find_type(ty)?),
            Entity::Member(member) => self.resolve_member(member)?,
        };
        tracing::debug!(entity = %self.model.describe(entity), ?handle, "resolved metadata entity");
        self.cache.insert(entity, handle);
        Ok(handle)
    }

    /// Resolve a type to its metadata index
    pub fn resolve_type(&self, ty: TypeDefId) -> Result<TypeIndex, ResolveError> {
        self.resolve(Entity::Type(ty)).map(|handle| handle.type_index())
    }

    fn find_type(&self, ty: TypeDefId) -> Result<TypeIndex, ResolveError> {
        let name = self.model.full_name(ty);
        self.reader
            .find_type(&name)
            .ok_or(ResolveError::TypeNotFound { name })
    }

    fn type_def(&self, index: TypeIndex, ty: TypeDefId) -> Result<&TypeDef, ResolveError> {
        self.reader.type_def(index).ok_or_else(|| ResolveError::TypeNotFound {
            name: self.model.full_name(ty),
        })
    }

    fn resolve_member(&self, member: MemberId) -> Result<EntityHandle, ResolveError> {
        let def = self.model.member(member);
        if let MemberKind::Accessor { owner, role } = def.kind {
            return self.resolve_accessor(member, owner, role);
        }
        self.resolve_declared_member(member, def)
    }

    fn resolve_declared_member(&self, member: MemberId, def: &MemberDefinition) -> Result<EntityHandle, ResolveError> {
        let ty = self.resolve_type(def.declaring_type)?;
        let type_def = self.type_def(ty, def.declaring_type)?;

        match def.kind {
            MemberKind::Field => {
                let candidates = type_def
                    .fields
                    .iter()
                    .enumerate()
                    .filter(|(_, field)| field.name == def.name)
                    .map(|(i, _)| i);
                self.single(member, candidates).map(|i| EntityHandle::Field(ty, i))
            }
            MemberKind::Method | MemberKind::Operator | MemberKind::Constructor => {
                let name = match def.kind {
                    MemberKind::Constructor if def.is_static => ".cctor",
                    MemberKind::Constructor => ".ctor",
                    _ => def.name.as_str(),
                };
                let candidates = type_def
                    .methods
                    .iter()
                    .enumerate()
                    .filter(|(_, method)| self.method_matches(method, def, name))
                    .map(|(i, _)| i);
                self.single(member, candidates).map(|i| EntityHandle::Method(ty, i))
            }
            MemberKind::Property | MemberKind::Indexer => {
                let indexer = def.kind == MemberKind::Indexer;
                let candidates = type_def
                    .properties
                    .iter()
                    .enumerate()
                    .filter(|(_, property)| {
                        let named = if indexer && def.explicit_implementation.is_none() {
                            !property.parameters.is_empty() && split_explicit_name(&property.name).is_none()
                        } else {
                            name_matches(&property.name, def)
                        };
                        named
                            && parameters_match(&property.parameters, &def.parameters)
                            && self.accessors_confirm(type_def, [property.getter, property.setter], def)
                    })
                    .map(|(i, _)| i);
                self.single(member, candidates).map(|i| EntityHandle::Property(ty, i))
            }
            MemberKind::Event => {
                let candidates = type_def
                    .events
                    .iter()
                    .enumerate()
                    .filter(|(_, event)| {
                        name_matches(&event.name, def)
                            && self.accessors_confirm(type_def, [event.adder, event.remover], def)
                    })
                    .map(|(i, _)| i);
                self.single(member, candidates).map(|i| EntityHandle::Event(ty, i))
            }
            MemberKind::Accessor { owner, role } => self.resolve_accessor(member, owner, role),
        }
    }

    fn method_matches(&self, method: &MethodDef, def: &MemberDefinition, name: &str) -> bool {
        let named = match &def.explicit_implementation {
            None => method.name == name,
            Some(_) => name_matches(&method.name, def),
        };
        named
            && method.generic_parameter_count == def.type_parameter_count
            && method.is_static() == def.is_static
            && parameters_match(&method.parameters, &def.parameters)
            && (!def.is_conversion_operator() || method.return_type.matches(&def.return_type))
            && implements_confirm(&method.implements, def, true)
    }

    /// Confirm an explicit property or event implementation through any of
    /// its accessor methods
    fn accessors_confirm(&self, type_def: &TypeDef, accessors: [Option<u32>; 2], def: &MemberDefinition) -> bool {
        if def.explicit_implementation.is_none() {
            return true;
        }
        let methods: Vec<&MethodDef> = accessors
            .iter()
            .flatten()
            .filter_map(|&i| type_def.methods.get(i as usize))
            .collect();
        methods.is_empty()
            || methods
                .iter()
                .any(|method| implements_confirm(&method.implements, def, false))
    }

    fn resolve_accessor(
        &self,
        accessor: MemberId,
        owner: MemberId,
        role: AccessorRole,
    ) -> Result<EntityHandle, ResolveError> {
        let not_found = || ResolveError::AccessorNotFound {
            accessor: self.model.describe(Entity::Member(accessor)),
        };
        let owner_handle = self.resolve(Entity::Member(owner))?;
        let declaring = self.model.member(owner).declaring_type;
        let type_def = self.type_def(owner_handle.type_index(), declaring)?;

        let method = match (owner_handle, role) {
            (EntityHandle::Property(_, i), AccessorRole::Getter) => {
                type_def.properties.get(i as usize).and_then(|p| p.getter)
            }
            (EntityHandle::Property(_, i), AccessorRole::Setter) => {
                type_def.properties.get(i as usize).and_then(|p| p.setter)
            }
            (EntityHandle::Event(_, i), AccessorRole::Adder) => type_def.events.get(i as usize).and_then(|e| e.adder),
            (EntityHandle::Event(_, i), AccessorRole::Remover) => {
                type_def.events.get(i as usize).and_then(|e| e.remover)
            }
            _ => None,
        };
        method
            .map(|m| EntityHandle::Method(owner_handle.type_index(), m))
            .ok_or_else(not_found)
    }

    fn single(&self, member: MemberId, candidates: impl Iterator<Item = usize>) -> Result<u32, ResolveError> {
        let candidates: Vec<usize> = candidates.collect();
        match candidates.as_slice() {
            [index] => Ok(*index as u32),
            [] => {
                let declaring = self.model.member(member).declaring_type;
                Err(ResolveError::MemberNotFound {
                    member: self.model.describe(Entity::Member(member)),
                    type_name: self.model.full_name(declaring),
                })
            }
            many => Err(ResolveError::AmbiguousMatch {
                member: self.model.describe(Entity::Member(member)),
                candidates: many.len(),
            }),
        }
    }
}

/// Match a stored member name against a semantic member
fn name_matches(stored: &str, def: &MemberDefinition) -> bool {
    match &def.explicit_implementation {
        None => stored == def.name,
        Some(explicit) => match split_explicit_name(stored) {
            Some((interface, member)) => {
                member == explicit.member_name && interface_names_match(interface, &explicit.interface)
            }
            None => false,
        },
    }
}

/// Confirm an explicit implementation against the interface members a
/// method records as implemented. Methods without records are accepted on
/// their name alone.
fn implements_confirm(implements: &[MemberRefSig], def: &MemberDefinition, compare_name: bool) -> bool {
    let Some(explicit) = &def.explicit_implementation else {
        return true;
    };
    implements.is_empty()
        || implements.iter().any(|implemented| {
            implemented.declaring_type.matches(&explicit.interface)
                && (!compare_name || implemented.name == explicit.member_name)
        })
}

pub(crate) fn parameters_match(signatures: &[TypeSig], parameters: &[Parameter]) -> bool {
    signatures.len() == parameters.len()
        && signatures
            .iter()
            .zip(parameters)
            .all(|(signature, parameter)| match parameter.mode {
                ParameterMode::Ref | ParameterMode::Out => {
                    matches!(signature, TypeSig::ByRef(inner) if inner.matches(&parameter.ty))
                }
                ParameterMode::Value | ParameterMode::Params => signature.matches(&parameter.ty),
            })
}

/// Split `Ns.IFace<A.B>.Member` into the interface and member parts at the
/// last `.` outside angle brackets
pub fn split_explicit_name(name: &str) -> Option<(&str, &str)> {
    let mut depth = 0i32;
    let mut split = None;
    for (i, c) in name.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            '.' if depth == 0 => split = Some(i),
            _ => {}
        }
    }
    let i = split?;
    if i == 0 {
        return None;
    }
    Some((&name[..i], &name[i + 1..]))
}

/// Compare the interface part of a mangled name with a semantic interface
/// reference, ignoring type arguments
fn interface_names_match(stored: &str, interface: &TypeRef) -> bool {
    let Some(full_name) = interface.full_name() else {
        return false;
    };
    normalize_interface_name(stored) == normalize_interface_name(full_name)
}

/// Drop type argument lists and arity suffixes; nested types use `.`
fn normalize_interface_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut depth = 0u32;
    let mut in_arity = false;
    for c in name.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            '`' => in_arity = true,
            c if in_arity && c.is_ascii_digit() => {}
            '+' => {
                in_arity = false;
                out.push('.');
            }
            c => {
                in_arity = false;
                out.push(c);
            }
        }
    }
    out
}
