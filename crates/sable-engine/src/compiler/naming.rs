//! Naming conventions
//!
//! The expression compiler never invents script names itself. It asks a
//! [`NamingConventionResolver`] how each type and member is spelled and
//! implemented in script.

use crate::source::{MemberId, MemberKind, SemanticModel, TypeDefId};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// How a member is implemented in script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberImpl {
    /// Plain field `target.name`
    Field {
        /// Script name
        name: String,
    },
    /// Method `target.name(args)`
    Method {
        /// Script name
        name: String,
    },
    /// Property or indexer implemented by accessor methods
    Property {
        /// Getter method name
        getter: String,
        /// Setter method name
        setter: String,
    },
    /// Property stored directly in a field
    FieldProperty {
        /// Script name
        name: String,
    },
    /// Indexer mapped onto native `target[index]`
    NativeIndexer,
    /// Event implemented by add/remove methods
    Event {
        /// Adder method name
        adder: String,
        /// Remover method name
        remover: String,
    },
    /// Constructor; `None` is the unnamed `new T(args)` form
    Constructor {
        /// Named constructor function, invoked as `new T.name(args)`
        name: Option<String>,
    },
}

/// Supplies script names for semantic entities
pub trait NamingConventionResolver: Send + Sync {
    /// Dotted script name of a type
    fn type_name(&self, ty: TypeDefId) -> String;

    /// Implementation of a member
    fn member(&self, member: MemberId) -> MemberImpl;
}

/// Convention used when nothing else is configured
///
/// Types keep their namespace-qualified name with nested types joined by `$`.
/// Members are lower-camel-cased; overloads after the first get a `$n`
/// suffix; properties and events go through `get_`/`set_`/`add_`/`remove_`
/// accessor methods; secondary constructors are named `$ctorN`. Individual
/// entries can be overridden.
pub struct DefaultNamingConvention {
    model: Arc<SemanticModel>,
    type_overrides: FxHashMap<TypeDefId, String>,
    member_overrides: FxHashMap<MemberId, MemberImpl>,
}

impl DefaultNamingConvention {
    /// Create the convention over `model`
    pub fn new(model: Arc<SemanticModel>) -> Self {
        Self {
            model,
            type_overrides: FxHashMap::default(),
            member_overrides: FxHashMap::default(),
        }
    }

    /// Use `name` for a type
    pub fn override_type(&mut self, ty: TypeDefId, name: impl Into<String>) {
        self.type_overrides.insert(ty, name.into());
    }

    /// Use `implementation` for a member
    pub fn override_member(&mut self, member: MemberId, implementation: MemberImpl) {
        self.member_overrides.insert(member, implementation);
    }

    /// Position of `member` among same-named, same-kind members of its type
    fn overload_index(&self, member: MemberId) -> usize {
        let def = self.model.member(member);
        self.model
            .members_named(def.declaring_type, &def.name)
            .filter(|&m| self.model.member(m).kind == def.kind)
            .position(|m| m == member)
            .unwrap_or(0)
    }
}

impl NamingConventionResolver for DefaultNamingConvention {
    fn type_name(&self, ty: TypeDefId) -> String {
        if let Some(name) = self.type_overrides.get(&ty) {
            return name.clone();
        }
        let def = self.model.type_def(ty);
        let simple = if def.type_parameter_count == 0 {
            def.name.clone()
        } else {
            format!("{}${}", def.name, def.type_parameter_count)
        };
        match def.declaring_type {
            Some(outer) => format!("{}${}", self.type_name(outer), simple),
            None if def.namespace.is_empty() => simple,
            None => format!("{}.{}", def.namespace, simple),
        }
    }

    fn member(&self, member: MemberId) -> MemberImpl {
        if let Some(implementation) = self.member_overrides.get(&member) {
            return implementation.clone();
        }
        let def = self.model.member(member);
        match def.kind {
            MemberKind::Field => MemberImpl::Field {
                name: lower_camel(&def.name),
            },
            MemberKind::Property => MemberImpl::Property {
                getter: format!("get_{}", def.name),
                setter: format!("set_{}", def.name),
            },
            MemberKind::Indexer => MemberImpl::Property {
                getter: "get_item".to_string(),
                setter: "set_item".to_string(),
            },
            MemberKind::Event => MemberImpl::Event {
                adder: format!("add_{}", def.name),
                remover: format!("remove_{}", def.name),
            },
            MemberKind::Constructor => match self.overload_index(member) {
                0 => MemberImpl::Constructor { name: None },
                n => MemberImpl::Constructor {
                    name: Some(format!("$ctor{}", n)),
                },
            },
            MemberKind::Method | MemberKind::Operator | MemberKind::Accessor { .. } => {
                let base = lower_camel(&def.name);
                match self.overload_index(member) {
                    0 => MemberImpl::Method { name: base },
                    n => MemberImpl::Method {
                        name: format!("{}${}", base, n),
                    },
                }
            }
        }
    }
}

fn lower_camel(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
