//! Compilation session
//!
//! Wires the options, the semantic model, the naming collaborator and the
//! compiled metadata together. A session is shared by every member body of
//! a compilation; bodies can be compiled on separate threads, each with its
//! own reporter.

use super::context::CompileContext;
use super::naming::NamingConventionResolver;
use super::options::CompilerOptions;
use super::reporter::{CollectingErrorReporter, ErrorReporter};
use super::statement::StatementCompiler;
use super::variables::{NestedFunctionData, NestedFunctionTable, VariableData};
use super::write_back::{AttributeRecord, MetadataWriteBackEngine};
use crate::metadata::MetadataReader;
use crate::script::{JsBlockStatement, JsOutputFormatter};
use crate::source::{Entity, SemanticModel, Statement, VariableId};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A member body with its pre-pass results
#[derive(Debug, Clone)]
pub struct MethodBody {
    /// Source file path
    pub file: Arc<str>,
    /// Body statement, usually a block
    pub body: Statement,
    /// Descriptors of every local and parameter
    pub variables: FxHashMap<VariableId, VariableData>,
    /// Lambdas of the body, outermost first
    pub nested_functions: Vec<NestedFunctionData>,
}

impl MethodBody {
    /// A body without locals or lambdas
    pub fn new(file: impl Into<Arc<str>>, body: Statement) -> Self {
        Self {
            file: file.into(),
            body,
            variables: FxHashMap::default(),
            nested_functions: Vec::new(),
        }
    }

    /// Add a variable descriptor
    pub fn with_variable(mut self, id: VariableId, data: VariableData) -> Self {
        self.variables.insert(id, data);
        self
    }

    /// Add an outermost lambda
    pub fn with_nested_function(mut self, data: NestedFunctionData) -> Self {
        self.nested_functions.push(data);
        self
    }
}

/// Shared state of one compilation
pub struct Session {
    options: CompilerOptions,
    model: Arc<SemanticModel>,
    naming: Arc<dyn NamingConventionResolver>,
    write_back: MetadataWriteBackEngine,
}

impl Session {
    /// Create a session
    pub fn new(
        options: CompilerOptions,
        model: Arc<SemanticModel>,
        naming: Arc<dyn NamingConventionResolver>,
        metadata: Arc<dyn MetadataReader>,
    ) -> Self {
        let write_back = MetadataWriteBackEngine::new(model.clone(), metadata);
        Self {
            options,
            model,
            naming,
            write_back,
        }
    }

    /// Session options
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Semantic model
    pub fn model(&self) -> &SemanticModel {
        &self.model
    }

    /// Attribute write-back engine
    pub fn write_back(&self) -> &MetadataWriteBackEngine {
        &self.write_back
    }

    /// A collecting reporter configured from the options
    pub fn new_reporter(&self) -> CollectingErrorReporter {
        CollectingErrorReporter::new().with_warnings_as_errors(self.options.warnings_as_errors)
    }

    /// Lower a member body
    pub fn compile_body(&self, body: &MethodBody, reporter: &mut dyn ErrorReporter) -> JsBlockStatement {
        let nested_functions = NestedFunctionTable::build(&body.nested_functions);
        let ctx = CompileContext::new(
            &self.model,
            &*self.naming,
            &self.options,
            &body.variables,
            &nested_functions,
            body.file.clone(),
        );
        let block = StatementCompiler::new(&ctx).compile(&body.body, reporter);
        tracing::debug!(file = %body.file, statements = block.statements.len(), "compiled member body");
        block
    }

    /// Attributes of `entity`; failures are reported as internal errors and
    /// yield an empty list
    pub fn attributes(&self, entity: Entity, reporter: &mut dyn ErrorReporter) -> Arc<[AttributeRecord]> {
        match self.write_back.get_attributes(entity) {
            Ok(records) => records,
            Err(e) => {
                let context = format!("reading attributes of {}", self.model.describe(entity));
                reporter.internal_error_from(&e, Some(&context));
                Vec::new().into()
            }
        }
    }

    /// Check whether `entity` carries an attribute of type `attribute_type`
    pub fn has_attribute(&self, entity: Entity, attribute_type: &str, reporter: &mut dyn ErrorReporter) -> bool {
        self.attributes(entity, reporter)
            .iter()
            .any(|record| record.attribute_type == attribute_type)
    }

    /// Printer configured from the options
    pub fn formatter(&self) -> JsOutputFormatter {
        JsOutputFormatter::new(self.options.indent.clone(), self.options.line_separator.as_str())
    }
}
