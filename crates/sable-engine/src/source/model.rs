//! Semantic model
//!
//! Type and member definitions of the program being compiled, stored in two
//! arenas and addressed by index. This is the view of the program built from
//! source; the compiled binary has its own, independently numbered tables
//! (see [`crate::metadata`]).

use super::types::TypeRef;
use rustc_hash::FxHashMap;
use std::fmt;

/// Index of a type definition in the semantic model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeDefId(pub u32);

/// Index of a member definition in the semantic model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(pub u32);

/// A logical program entity that can carry attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    /// A type definition
    Type(TypeDefId),
    /// A member (including accessors)
    Member(MemberId),
}

impl From<TypeDefId> for Entity {
    fn from(id: TypeDefId) -> Self {
        Entity::Type(id)
    }
}

impl From<MemberId> for Entity {
    fn from(id: MemberId) -> Self {
        Entity::Member(id)
    }
}

/// Kind of a type definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// Reference type
    Class,
    /// Value type
    Struct,
    /// Interface
    Interface,
    /// Enumeration
    Enum,
    /// Delegate type
    Delegate,
}

/// A type definition
#[derive(Debug, Clone)]
pub struct TypeDefinition {
    /// Namespace (empty for the global namespace and for nested types)
    pub namespace: String,
    /// Simple name without generic arity
    pub name: String,
    /// Number of generic type parameters declared by this type
    pub type_parameter_count: u32,
    /// Kind of type
    pub kind: TypeKind,
    /// Enclosing type for nested types
    pub declaring_type: Option<TypeDefId>,
    /// Members in declaration order
    pub members: Vec<MemberId>,
}

impl TypeDefinition {
    /// Create a new top-level type definition
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            type_parameter_count: 0,
            kind,
            declaring_type: None,
            members: Vec::new(),
        }
    }

    /// Set the number of generic type parameters
    pub fn with_type_parameters(mut self, count: u32) -> Self {
        self.type_parameter_count = count;
        self
    }

    /// Make this a nested type of `outer`
    pub fn nested_in(mut self, outer: TypeDefId) -> Self {
        self.declaring_type = Some(outer);
        self.namespace.clear();
        self
    }

    /// Name as stored in metadata (`Name` or `Name`N`)
    pub fn metadata_name(&self) -> String {
        if self.type_parameter_count == 0 {
            self.name.clone()
        } else {
            format!("{}`{}", self.name, self.type_parameter_count)
        }
    }
}

/// Role of an accessor relative to its owning property or event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorRole {
    /// Property/indexer getter
    Getter,
    /// Property/indexer setter
    Setter,
    /// Event adder
    Adder,
    /// Event remover
    Remover,
}

impl fmt::Display for AccessorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessorRole::Getter => write!(f, "getter"),
            AccessorRole::Setter => write!(f, "setter"),
            AccessorRole::Adder => write!(f, "adder"),
            AccessorRole::Remover => write!(f, "remover"),
        }
    }
}

/// Kind of a member definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Field
    Field,
    /// Named property without parameters
    Property,
    /// Indexer (parameterized property)
    Indexer,
    /// Event
    Event,
    /// Ordinary method
    Method,
    /// Instance or static constructor
    Constructor,
    /// User-defined operator or conversion (`op_*` name)
    Operator,
    /// Accessor of a property, indexer or event
    Accessor {
        /// Owning property, indexer or event
        owner: MemberId,
        /// Accessor role
        role: AccessorRole,
    },
}

/// How an argument is passed to a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterMode {
    /// By value
    #[default]
    Value,
    /// `ref` parameter
    Ref,
    /// `out` parameter
    Out,
    /// `params` array
    Params,
}

/// A parameter of a method, constructor, operator or indexer
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Declared type (element type for `ref`/`out`)
    pub ty: TypeRef,
    /// Passing mode
    pub mode: ParameterMode,
}

impl Parameter {
    /// By-value parameter
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            mode: ParameterMode::Value,
        }
    }

    /// Parameter with an explicit passing mode
    pub fn with_mode(name: impl Into<String>, ty: TypeRef, mode: ParameterMode) -> Self {
        Self {
            name: name.into(),
            ty,
            mode,
        }
    }
}

/// The interface member a member explicitly implements
#[derive(Debug, Clone, PartialEq)]
pub struct ExplicitImplementation {
    /// The implemented interface, possibly constructed over the implementing
    /// type's own type parameters
    pub interface: TypeRef,
    /// Simple name of the implemented interface member
    pub member_name: String,
}

/// A member definition
#[derive(Debug, Clone)]
pub struct MemberDefinition {
    /// Simple name as written in source (`Item` for indexers, `op_Addition`
    /// for operators, `.ctor`/`.cctor` for constructors)
    pub name: String,
    /// Declaring type
    pub declaring_type: TypeDefId,
    /// Kind of member
    pub kind: MemberKind,
    /// Parameters (methods, constructors, operators, indexers)
    pub parameters: Vec<Parameter>,
    /// Return type, field type, property type or event type
    pub return_type: TypeRef,
    /// Whether the member is static
    pub is_static: bool,
    /// Number of generic method type parameters
    pub type_parameter_count: u32,
    /// Set when this member explicitly implements an interface member
    pub explicit_implementation: Option<ExplicitImplementation>,
}

impl MemberDefinition {
    /// Create a member with no parameters, returning `return_type`
    pub fn new(
        declaring_type: TypeDefId,
        kind: MemberKind,
        name: impl Into<String>,
        return_type: TypeRef,
    ) -> Self {
        Self {
            name: name.into(),
            declaring_type,
            kind,
            parameters: Vec::new(),
            return_type,
            is_static: false,
            type_parameter_count: 0,
            explicit_implementation: None,
        }
    }

    /// Set the parameters
    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Mark the member as static
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Set the number of generic method type parameters
    pub fn with_type_parameters(mut self, count: u32) -> Self {
        self.type_parameter_count = count;
        self
    }

    /// Mark the member as an explicit implementation of `interface.member_name`
    pub fn implementing(mut self, interface: TypeRef, member_name: impl Into<String>) -> Self {
        self.explicit_implementation = Some(ExplicitImplementation {
            interface,
            member_name: member_name.into(),
        });
        self
    }

    /// Check whether this is a user-defined conversion operator
    pub fn is_conversion_operator(&self) -> bool {
        self.kind == MemberKind::Operator
            && (self.name == "op_Implicit" || self.name == "op_Explicit")
    }
}

/// The semantic model of the program being compiled
#[derive(Debug, Clone, Default)]
pub struct SemanticModel {
    types: Vec<TypeDefinition>,
    members: Vec<MemberDefinition>,
    by_full_name: FxHashMap<String, TypeDefId>,
}

impl SemanticModel {
    /// Create an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type definition
    pub fn add_type(&mut self, definition: TypeDefinition) -> TypeDefId {
        let id = TypeDefId(self.types.len() as u32);
        self.types.push(definition);
        let full_name = self.full_name(id);
        self.by_full_name.insert(full_name, id);
        id
    }

    /// Add a member to its declaring type
    pub fn add_member(&mut self, definition: MemberDefinition) -> MemberId {
        let id = MemberId(self.members.len() as u32);
        let declaring = definition.declaring_type;
        self.members.push(definition);
        self.types[declaring.0 as usize].members.push(id);
        id
    }

    /// Get a type definition
    pub fn type_def(&self, id: TypeDefId) -> &TypeDefinition {
        &self.types[id.0 as usize]
    }

    /// Get a member definition
    pub fn member(&self, id: MemberId) -> &MemberDefinition {
        &self.members[id.0 as usize]
    }

    /// Number of type definitions
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Full structural name: `Namespace.Name`N`, nested types joined by `+`
    pub fn full_name(&self, id: TypeDefId) -> String {
        let def = self.type_def(id);
        match def.declaring_type {
            Some(outer) => format!("{}+{}", self.full_name(outer), def.metadata_name()),
            None if def.namespace.is_empty() => def.metadata_name(),
            None => format!("{}.{}", def.namespace, def.metadata_name()),
        }
    }

    /// Look up a type by full structural name
    pub fn find_type(&self, full_name: &str) -> Option<TypeDefId> {
        self.by_full_name.get(full_name).copied()
    }

    /// Members of a type with the given simple name
    pub fn members_named<'a>(
        &'a self,
        ty: TypeDefId,
        name: &'a str,
    ) -> impl Iterator<Item = MemberId> + 'a {
        self.type_def(ty)
            .members
            .iter()
            .copied()
            .filter(move |&m| self.member(m).name == name)
    }

    /// Find the accessor with `role` belonging to a property, indexer or event
    pub fn accessor(&self, owner: MemberId, role: AccessorRole) -> Option<MemberId> {
        let declaring = self.member(owner).declaring_type;
        self.type_def(declaring).members.iter().copied().find(|&m| {
            matches!(self.member(m).kind, MemberKind::Accessor { owner: o, role: r } if o == owner && r == role)
        })
    }

    /// Add an accessor for an existing property, indexer or event
    pub fn add_accessor(&mut self, owner: MemberId, role: AccessorRole) -> MemberId {
        let owner_def = self.member(owner).clone();
        let prefix = match role {
            AccessorRole::Getter => "get_",
            AccessorRole::Setter => "set_",
            AccessorRole::Adder => "add_",
            AccessorRole::Remover => "remove_",
        };
        let mut parameters = owner_def.parameters.clone();
        let return_type = match role {
            AccessorRole::Getter => owner_def.return_type.clone(),
            AccessorRole::Setter | AccessorRole::Adder | AccessorRole::Remover => {
                parameters.push(Parameter::new("value", owner_def.return_type.clone()));
                TypeRef::void()
            }
        };
        self.add_member(MemberDefinition {
            name: format!("{}{}", prefix, owner_def.name),
            declaring_type: owner_def.declaring_type,
            kind: MemberKind::Accessor { owner, role },
            parameters,
            return_type,
            is_static: owner_def.is_static,
            type_parameter_count: 0,
            explicit_implementation: None,
        })
    }

    /// Human-readable description of an entity for diagnostics
    pub fn describe(&self, entity: Entity) -> String {
        match entity {
            Entity::Type(id) => self.full_name(id),
            Entity::Member(id) => {
                let member = self.member(id);
                let owner = self.full_name(member.declaring_type);
                match member.kind {
                    MemberKind::Accessor { owner: prop, role } => {
                        format!("{}.{} {}", owner, self.member(prop).name, role)
                    }
                    _ if member.parameters.is_empty()
                        && !matches!(
                            member.kind,
                            MemberKind::Method | MemberKind::Constructor | MemberKind::Operator
                        ) =>
                    {
                        format!("{}.{}", owner, member.name)
                    }
                    _ => {
                        let params: Vec<String> =
                            member.parameters.iter().map(|p| p.ty.to_string()).collect();
                        format!("{}.{}({})", owner, member.name, params.join(","))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_names() {
        let mut model = SemanticModel::new();
        let outer = model.add_type(
            TypeDefinition::new("Acme.Widgets", "Outer", TypeKind::Class).with_type_parameters(1),
        );
        let inner = model.add_type(TypeDefinition::new("", "Inner", TypeKind::Class).nested_in(outer));
        let global = model.add_type(TypeDefinition::new("", "Loose", TypeKind::Struct));

        assert_eq!(model.full_name(outer), "Acme.Widgets.Outer`1");
        assert_eq!(model.full_name(inner), "Acme.Widgets.Outer`1+Inner");
        assert_eq!(model.full_name(global), "Loose");
        assert_eq!(model.find_type("Acme.Widgets.Outer`1+Inner"), Some(inner));
    }

    #[test]
    fn test_accessors() {
        let mut model = SemanticModel::new();
        let ty = model.add_type(TypeDefinition::new("Acme", "Thing", TypeKind::Class));
        let prop = model.add_member(MemberDefinition::new(
            ty,
            MemberKind::Property,
            "Size",
            TypeRef::int32(),
        ));
        let getter = model.add_accessor(prop, AccessorRole::Getter);
        let setter = model.add_accessor(prop, AccessorRole::Setter);

        assert_eq!(model.accessor(prop, AccessorRole::Getter), Some(getter));
        assert_eq!(model.accessor(prop, AccessorRole::Setter), Some(setter));
        assert_eq!(model.accessor(prop, AccessorRole::Adder), None);
        assert_eq!(model.member(setter).name, "set_Size");
        assert_eq!(model.member(setter).parameters.len(), 1);
        assert_eq!(model.describe(Entity::Member(getter)), "Acme.Thing.Size getter");
    }
}
