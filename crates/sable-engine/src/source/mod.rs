//! Resolved source tree
//!
//! The front end parses and type-checks a source program and hands the core a
//! fully resolved tree: every expression knows its inferred type and bound
//! symbol, every declarator knows its semantic variable. The core only reads
//! these structures.

pub mod ast;
pub mod model;
pub mod span;
pub mod types;

pub use ast::{
    Argument, ArgumentMode, BinaryOperator, BlockStatement, Comment, CommentType, ConstantValue,
    Expression, ExpressionKind, ExpressionStatement, IfStatement, IncrementKind,
    InvalidCommentType, LambdaBody, LambdaId, LoopStatement, ReturnStatement, Statement,
    ThrowStatement, UnaryOperator, VariableDeclarationStatement, VariableDeclarator, VariableId,
};
pub use model::{
    AccessorRole, Entity, ExplicitImplementation, MemberDefinition, MemberId, MemberKind,
    Parameter, ParameterMode, SemanticModel, TypeDefId, TypeDefinition, TypeKind,
};
pub use span::{Location, Span};
pub use types::{TypeParameterOwner, TypeRef};
