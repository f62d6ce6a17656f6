//! Compiler
//!
//! Lowering of member bodies to the script AST, resolution of semantic
//! entities against compiled metadata, attribute write-back, and the
//! diagnostics plumbing they share.

pub mod context;
pub mod diagnostics;
pub mod expression;
pub mod messages;
pub mod naming;
pub mod options;
pub mod reporter;
pub mod resolver;
pub mod session;
pub mod statement;
pub mod variables;
pub mod write_back;

pub use context::CompileContext;
pub use diagnostics::{render_diagnostics, to_diagnostic, SourceFiles};
pub use expression::{ExpressionCompileResult, ExpressionCompiler};
pub use messages::{Message, Severity};
pub use naming::{DefaultNamingConvention, MemberImpl, NamingConventionResolver};
pub use options::{CompilerOptions, LineSeparator, OptionsError};
pub use reporter::{
    error_chain, CollectingErrorReporter, ErrorReporter, ReportedMessage, SharedErrorReporter,
    TextErrorReporter,
};
pub use resolver::{split_explicit_name, MetadataEntityResolver, ResolveError};
pub use session::{MethodBody, Session};
pub use statement::{reformat_multiline_comment, StatementCompiler};
pub use variables::{NestedFunctionData, NestedFunctionEntry, NestedFunctionTable, VariableData};
pub use write_back::{AttributeRecord, MetadataWriteBackEngine, WriteBackError};
