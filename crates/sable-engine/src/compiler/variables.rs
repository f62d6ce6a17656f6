//! Variable and nested function descriptors
//!
//! Produced by the pre-pass that analyses a member body before lowering.
//! Nested functions arrive as a tree; [`NestedFunctionTable`] flattens it into
//! an arena indexed by [`LambdaId`].

use crate::source::LambdaId;
use rustc_hash::FxHashMap;

/// Script-side facts about a local variable or parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableData {
    /// Script identifier
    pub name: String,
    /// Whether the variable lives in a one-field container (captured and
    /// mutated, or passed by reference)
    pub uses_reference_semantics: bool,
}

impl VariableData {
    /// A plain variable
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uses_reference_semantics: false,
        }
    }

    /// A variable stored in a reference container
    pub fn by_ref(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uses_reference_semantics: true,
        }
    }
}

/// Pre-pass facts about one lambda and the lambdas it contains
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedFunctionData {
    /// Identity of the lambda in the source tree
    pub id: LambdaId,
    /// Whether the lambda body itself reads `this`
    pub directly_uses_this: bool,
    /// Lambdas nested directly inside this one
    pub nested: Vec<NestedFunctionData>,
}

impl NestedFunctionData {
    /// A leaf lambda
    pub fn new(id: LambdaId) -> Self {
        Self {
            id,
            directly_uses_this: false,
            nested: Vec::new(),
        }
    }

    /// Mark the lambda as reading `this`
    pub fn using_this(mut self) -> Self {
        self.directly_uses_this = true;
        self
    }

    /// Add a directly nested lambda
    pub fn with_nested(mut self, child: NestedFunctionData) -> Self {
        self.nested.push(child);
        self
    }
}

/// Flattened nested function entry
#[derive(Debug, Clone)]
pub struct NestedFunctionEntry {
    /// Lambda identity
    pub id: LambdaId,
    /// Whether this lambda or any lambda inside it reads `this`
    pub uses_this: bool,
}

/// All nested functions of one member body
#[derive(Debug, Clone, Default)]
pub struct NestedFunctionTable {
    entries: Vec<NestedFunctionEntry>,
    index: FxHashMap<LambdaId, usize>,
}

impl NestedFunctionTable {
    /// Flatten the pre-pass trees of a body
    pub fn build(roots: &[NestedFunctionData]) -> Self {
        let mut table = Self::default();
        for root in roots {
            table.insert(root);
        }
        table
    }

    fn insert(&mut self, data: &NestedFunctionData) -> bool {
        let slot = self.entries.len();
        self.entries.push(NestedFunctionEntry {
            id: data.id,
            uses_this: data.directly_uses_this,
        });
        self.index.insert(data.id, slot);

        let mut uses_this = data.directly_uses_this;
        for child in &data.nested {
            uses_this |= self.insert(child);
        }
        self.entries[slot].uses_this = uses_this;
        uses_this
    }

    /// Look up a lambda
    pub fn get(&self, id: LambdaId) -> Option<&NestedFunctionEntry> {
        self.index.get(&id).map(|&slot| &self.entries[slot])
    }

    /// Number of lambdas
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the body has no lambdas
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_this_usage_propagates_outward() {
        let tree = NestedFunctionData::new(LambdaId(0))
            .with_nested(NestedFunctionData::new(LambdaId(1)).with_nested(NestedFunctionData::new(LambdaId(2)).using_this()))
            .with_nested(NestedFunctionData::new(LambdaId(3)));
        let table = NestedFunctionTable::build(&[tree, NestedFunctionData::new(LambdaId(4))]);

        assert_eq!(table.len(), 5);
        assert!(table.get(LambdaId(0)).unwrap().uses_this);
        assert!(table.get(LambdaId(1)).unwrap().uses_this);
        assert!(table.get(LambdaId(2)).unwrap().uses_this);
        assert!(!table.get(LambdaId(3)).unwrap().uses_this);
        assert!(!table.get(LambdaId(4)).unwrap().uses_this);
        assert_eq!(table.get(LambdaId(2)).unwrap().id, LambdaId(2));
        assert!(table.get(LambdaId(9)).is_none());
    }
}
