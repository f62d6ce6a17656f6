//! Sable Compiler Engine
//!
//! This crate provides the semantic core of the Sable source-to-script compiler:
//! - **Source**: Resolved source tree and semantic model handed over by the front end (`source` module)
//! - **Script**: Target AST for the dynamic script language and its printer (`script` module)
//! - **Metadata**: Compiled binary form, attribute blobs and the metadata reader (`metadata` module)
//! - **Compiler**: Statement/expression lowering, metadata entity resolution and
//!   attribute write-back (`compiler` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use sable_engine::{CompilerOptions, Session, CollectingErrorReporter};
//!
//! let session = Session::new(CompilerOptions::default(), model, naming, metadata);
//! let mut reporter = CollectingErrorReporter::new();
//! let block = session.compile_body(&body, &mut reporter);
//! let attributes = session.attributes(entity, &mut reporter);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Source module: resolved statement/expression tree and semantic model
pub mod source;

/// Script module: target AST and printer
pub mod script;

/// Metadata module: compiled binary tables, attribute blobs and reader
pub mod metadata;

/// Compiler module: lowering, entity resolution and attribute write-back
pub mod compiler;

// ============================================================================
// Re-exports
// ============================================================================

pub use compiler::{
    AttributeRecord, CollectingErrorReporter, CompilerOptions, ErrorReporter, MethodBody,
    MetadataEntityResolver, MetadataWriteBackEngine, NestedFunctionData, Session,
    StatementCompiler, TextErrorReporter, VariableData,
};
pub use metadata::{LoadedMetadata, MetadataModule, MetadataReader};
pub use script::{JsBlockStatement, JsExpression, JsStatement};
pub use source::{Entity, Expression, SemanticModel, Statement};
