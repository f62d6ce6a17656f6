//! Statement compiler
//!
//! Walks a resolved statement tree and produces the equivalent script block.
//! Statements the core does not lower are reported and skipped so the rest
//! of the body still surfaces its diagnostics.

use super::context::CompileContext;
use super::expression::{ExpressionCompileResult, ExpressionCompiler};
use super::messages;
use super::reporter::ErrorReporter;
use crate::script::{JsBlockStatement, JsExpression, JsStatement, JsUnaryOperator, JsVariableDeclaration};
use crate::source::{
    Comment, CommentType, Expression, LoopStatement, Statement, VariableDeclarationStatement,
};

/// Lowers the statements of one member body
pub struct StatementCompiler<'c, 'a> {
    ctx: &'c CompileContext<'a>,
    expressions: ExpressionCompiler<'c, 'a>,
    result: Vec<JsStatement>,
}

impl<'c, 'a> StatementCompiler<'c, 'a> {
    /// Create a compiler over a body context
    pub fn new(ctx: &'c CompileContext<'a>) -> Self {
        Self {
            ctx,
            expressions: ExpressionCompiler::new(ctx),
            result: Vec::new(),
        }
    }

    /// Compile `statement`; a block's statements become the result's
    /// statements directly
    pub fn compile(&mut self, statement: &Statement, reporter: &mut dyn ErrorReporter) -> JsBlockStatement {
        match statement {
            Statement::Block(block) => self.compile_statements(&block.statements, reporter),
            other => self.compile_statements(std::slice::from_ref(other), reporter),
        }
    }

    /// Compile a statement list into one block
    pub fn compile_statements(
        &mut self,
        statements: &[Statement],
        reporter: &mut dyn ErrorReporter,
    ) -> JsBlockStatement {
        let outer = std::mem::take(&mut self.result);
        for statement in statements {
            self.visit(statement, reporter);
        }
        JsBlockStatement::new(std::mem::replace(&mut self.result, outer))
    }

    fn visit(&mut self, statement: &Statement, r: &mut dyn ErrorReporter) {
        r.set_location(self.ctx.location(statement.span()));
        match statement {
            Statement::Comment(comment) => self.comment(comment),
            Statement::VariableDeclaration(declaration) => self.variable_declaration(declaration, r),
            Statement::Expression(statement) => {
                let expression = self.expression(&statement.expression, false, r);
                self.result.push(JsStatement::Expression(expression));
            }
            Statement::Block(block) | Statement::Checked(block) | Statement::Unchecked(block) => {
                let block = self.compile_statements(&block.statements, r);
                self.result.push(JsStatement::Block(block));
            }
            Statement::Return(statement) => {
                let value = statement.value.as_ref().map(|value| self.expression(value, true, r));
                self.result.push(JsStatement::Return(value));
            }
            Statement::If(statement) => {
                let condition = self.expression(&statement.condition, true, r);
                let then_branch = self.nested(&statement.then_branch, r);
                let else_branch = statement
                    .else_branch
                    .as_ref()
                    .map(|branch| Box::new(self.nested(branch, r)));
                self.result.push(JsStatement::If {
                    condition,
                    then_branch: Box::new(then_branch),
                    else_branch,
                });
            }
            Statement::While(statement) => self.while_loop(statement, r),
            Statement::DoWhile(statement) => self.do_while_loop(statement, r),
            Statement::Break(_) => self.result.push(JsStatement::Break),
            Statement::Continue(_) => self.result.push(JsStatement::Continue),
            Statement::Empty(_) => self.result.push(JsStatement::Empty),
            Statement::Throw(statement) => match &statement.value {
                Some(value) => {
                    let value = self.expression(value, true, r);
                    self.result.push(JsStatement::Throw(value));
                }
                None => self.unsupported("rethrow", r),
            },
            other => self.unsupported(other.construct_name(), r),
        }
    }

    /// Compile an embedded expression, splicing its additional statements
    /// into the output first
    fn expression(&mut self, expression: &Expression, important: bool, r: &mut dyn ErrorReporter) -> JsExpression {
        let ExpressionCompileResult {
            expression,
            additional_statements,
        } = self.expressions.compile(expression, important, r);
        self.result.extend(additional_statements);
        expression
    }

    fn nested(&mut self, statement: &Statement, r: &mut dyn ErrorReporter) -> JsStatement {
        JsStatement::Block(self.compile(statement, r))
    }

    fn unsupported(&mut self, construct: &str, r: &mut dyn ErrorReporter) {
        tracing::debug!(construct, location = %r.location(), "skipping unsupported construct");
        r.message(&messages::UNSUPPORTED_CONSTRUCT, &[construct.to_string()]);
    }

    // ========================================================================
    // Comments
    // ========================================================================

    fn comment(&mut self, comment: &Comment) {
        match comment.comment_type {
            CommentType::SingleLine => self.result.push(JsStatement::Comment(comment.content.clone())),
            CommentType::MultiLine => {
                let separator = self.ctx.options.line_separator.as_str();
                if let Some(text) = reformat_multiline_comment(&comment.content, separator) {
                    self.result.push(JsStatement::Comment(text));
                }
            }
            CommentType::Documentation | CommentType::MultiLineDocumentation | CommentType::InactiveCode => {}
        }
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn variable_declaration(&mut self, declaration: &VariableDeclarationStatement, r: &mut dyn ErrorReporter) {
        let mut batch: Vec<JsVariableDeclaration> = Vec::new();
        for declarator in &declaration.declarators {
            r.set_location(self.ctx.location(declarator.span));
            let Some(data) = self.ctx.variables.get(&declarator.variable) else {
                r.internal_error(&messages::missing_variable_descriptor(&declarator.name));
                continue;
            };

            let initializer = match &declarator.initializer {
                Some(initializer) => {
                    let compiled = self.expressions.compile(initializer, true, r);
                    if !compiled.additional_statements.is_empty() {
                        if !batch.is_empty() {
                            tracing::debug!(
                                declarations = batch.len(),
                                variable = %data.name,
                                "flushing declarations before hoisted statements"
                            );
                            self.result.push(JsStatement::VariableDeclaration(std::mem::take(&mut batch)));
                        }
                        self.result.extend(compiled.additional_statements);
                    }
                    Some(if data.uses_reference_semantics {
                        self.container(compiled.expression)
                    } else {
                        compiled.expression
                    })
                }
                None if data.uses_reference_semantics => Some(self.container(JsExpression::Null)),
                None => None,
            };
            batch.push(JsVariableDeclaration::new(data.name.clone(), initializer));
        }
        if !batch.is_empty() {
            self.result.push(JsStatement::VariableDeclaration(batch));
        }
    }

    /// `{ $: value }`
    fn container(&self, value: JsExpression) -> JsExpression {
        JsExpression::object(vec![(self.ctx.options.reference_field.clone(), value)])
    }

    // ========================================================================
    // Loops
    // ========================================================================

    fn while_loop(&mut self, statement: &LoopStatement, r: &mut dyn ErrorReporter) {
        let condition = self.expressions.compile(&statement.condition, true, r);
        let body = self.compile(&statement.body, r);

        if condition.additional_statements.is_empty() {
            self.result.push(JsStatement::While {
                condition: condition.expression,
                body: Box::new(JsStatement::Block(body)),
            });
            return;
        }

        // The condition's statements must run before every test
        let mut statements = condition.additional_statements;
        statements.push(JsStatement::If {
            condition: JsExpression::unary(JsUnaryOperator::Not, condition.expression),
            then_branch: Box::new(JsStatement::Break),
            else_branch: None,
        });
        statements.extend(body.statements);
        self.result.push(JsStatement::While {
            condition: JsExpression::Boolean(true),
            body: Box::new(JsStatement::Block(JsBlockStatement::new(statements))),
        });
    }

    fn do_while_loop(&mut self, statement: &LoopStatement, r: &mut dyn ErrorReporter) {
        let body = self.compile(&statement.body, r);
        r.set_location(self.ctx.location(statement.condition.span));
        let condition = self.expressions.compile(&statement.condition, true, r);

        if condition.additional_statements.is_empty() {
            self.result.push(JsStatement::DoWhile {
                body: Box::new(JsStatement::Block(body)),
                condition: condition.expression,
            });
            return;
        }

        // Rewrite the condition's statements as one comma expression
        let mut declared = Vec::new();
        let mut parts = Vec::new();
        for hoisted in condition.additional_statements {
            match hoisted {
                JsStatement::Expression(expression) => parts.push(expression),
                JsStatement::VariableDeclaration(mut declarations) if declarations.len() == 1 => {
                    let Some(declaration) = declarations.pop() else {
                        continue;
                    };
                    if let Some(initializer) = declaration.initializer {
                        parts.push(JsExpression::assign(
                            JsExpression::identifier(declaration.name.clone()),
                            initializer,
                        ));
                    }
                    declared.push(JsVariableDeclaration::new(declaration.name, None));
                }
                _ => {
                    self.unsupported("do-while condition with conditional side effects", r);
                    return;
                }
            }
        }
        parts.push(condition.expression);

        if !declared.is_empty() {
            self.result.push(JsStatement::VariableDeclaration(declared));
        }
        self.result.push(JsStatement::DoWhile {
            body: Box::new(JsStatement::Block(body)),
            condition: JsExpression::Comma(parts),
        });
    }
}

/// Reformat the text of a multi-line comment
///
/// The indentation in front of the first non-blank line becomes the prefix
/// of every kept line; each line is trimmed before the prefix is applied.
/// Blank lines at either end are dropped. Returns `None` when nothing is
/// left.
pub fn reformat_multiline_comment(content: &str, separator: &str) -> Option<String> {
    let leading = &content[..content.len() - content.trim_start().len()];
    let prefix: String = match leading.rfind('\n') {
        Some(newline) => &leading[newline + 1..],
        None => leading,
    }
    .chars()
    .filter(|&c| c != '\r')
    .collect();

    let lines: Vec<&str> = content.split('\n').map(str::trim).collect();
    let first = lines.iter().position(|line| !line.is_empty())?;
    let last = lines.iter().rposition(|line| !line.is_empty())?;

    let kept: Vec<String> = lines[first..=last]
        .iter()
        .map(|line| format!("{}{}", prefix, line))
        .collect();
    Some(kept.join(separator))
}
