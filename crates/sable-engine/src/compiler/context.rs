//! Per-body compilation state shared by the statement and expression compilers

use super::naming::NamingConventionResolver;
use super::options::CompilerOptions;
use super::variables::{NestedFunctionTable, VariableData};
use crate::source::{Location, SemanticModel, Span, VariableId};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::{Cell, RefCell};
use std::sync::Arc;

/// Everything the compilers of one member body read, plus the temporary
/// counter nested compilers share
pub struct CompileContext<'a> {
    /// Semantic model of the program
    pub model: &'a SemanticModel,
    /// Script naming collaborator
    pub naming: &'a dyn NamingConventionResolver,
    /// Session options
    pub options: &'a CompilerOptions,
    /// Descriptors of every local and parameter of the body
    pub variables: &'a FxHashMap<VariableId, VariableData>,
    /// Descriptors of every lambda of the body
    pub nested_functions: &'a NestedFunctionTable,
    /// File the body comes from
    pub file: Arc<str>,
    next_temporary: Cell<u32>,
    temporaries: RefCell<FxHashSet<String>>,
}

impl<'a> CompileContext<'a> {
    /// Create the context for one body
    pub fn new(
        model: &'a SemanticModel,
        naming: &'a dyn NamingConventionResolver,
        options: &'a CompilerOptions,
        variables: &'a FxHashMap<VariableId, VariableData>,
        nested_functions: &'a NestedFunctionTable,
        file: Arc<str>,
    ) -> Self {
        Self {
            model,
            naming,
            options,
            variables,
            nested_functions,
            file,
            next_temporary: Cell::new(1),
            temporaries: RefCell::new(FxHashSet::default()),
        }
    }

    /// Allocate a fresh temporary name
    pub fn new_temporary(&self) -> String {
        let n = self.next_temporary.get();
        self.next_temporary.set(n + 1);
        let name = format!("{}{}", self.options.temporary_prefix, n);
        self.temporaries.borrow_mut().insert(name.clone());
        name
    }

    /// Check whether `name` was allocated by [`Self::new_temporary`]
    pub fn is_temporary(&self, name: &str) -> bool {
        self.temporaries.borrow().contains(name)
    }

    /// Location of `span` in this body's file
    pub fn location(&self, span: Span) -> Location {
        Location::new(self.file.clone(), span)
    }
}
