//! Target script language
//!
//! The AST the compiler emits and a printer that renders it as source text.

pub mod ast;
pub mod printer;

pub use ast::{
    JsBinaryOperator, JsBlockStatement, JsExpression, JsFunctionDefinition,
    JsObjectLiteralProperty, JsPostfixOperator, JsStatement, JsUnaryOperator,
    JsVariableDeclaration,
};
pub use printer::JsOutputFormatter;
