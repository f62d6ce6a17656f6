//! Source printer for the target AST
//!
//! Produces readable source text: one statement per line, blocks indented,
//! and parentheses inserted only where operator precedence requires them.

use super::ast::*;

/// Formats target AST nodes as source text
#[derive(Debug, Clone)]
pub struct JsOutputFormatter {
    indent: String,
    newline: String,
}

impl Default for JsOutputFormatter {
    fn default() -> Self {
        Self::new("    ", "\n")
    }
}

impl JsOutputFormatter {
    /// Create a formatter with the given indentation unit and line separator
    pub fn new(indent: impl Into<String>, newline: impl Into<String>) -> Self {
        Self {
            indent: indent.into(),
            newline: newline.into(),
        }
    }

    /// Format the statements of a block without surrounding braces
    pub fn format_block_body(&self, block: &JsBlockStatement) -> String {
        let mut printer = Printer::new(self);
        for statement in &block.statements {
            printer.statement(statement);
        }
        printer.out
    }

    /// Format one statement, terminated by a line separator
    pub fn format_statement(&self, statement: &JsStatement) -> String {
        let mut printer = Printer::new(self);
        printer.statement(statement);
        printer.out
    }

    /// Format one expression
    pub fn format_expression(&self, expression: &JsExpression) -> String {
        let mut printer = Printer::new(self);
        printer.expression(expression, 0);
        printer.out
    }
}

struct Printer<'a> {
    config: &'a JsOutputFormatter,
    out: String,
    level: usize,
}

impl<'a> Printer<'a> {
    fn new(config: &'a JsOutputFormatter) -> Self {
        Self {
            config,
            out: String::new(),
            level: 0,
        }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.level {
            self.out.push_str(&self.config.indent);
        }
    }

    fn newline(&mut self) {
        self.out.push_str(&self.config.newline);
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn statement(&mut self, statement: &JsStatement) {
        self.write_indent();
        self.statement_inline(statement);
        self.newline();
    }

    /// Print a statement starting at the current position, without the
    /// trailing line separator
    fn statement_inline(&mut self, statement: &JsStatement) {
        match statement {
            JsStatement::Comment(text) => {
                if text.contains('\n') {
                    self.out.push_str("/*");
                    self.out.push_str(text);
                    self.out.push_str("*/");
                } else {
                    self.out.push_str("//");
                    self.out.push_str(text);
                }
            }
            JsStatement::VariableDeclaration(declarations) => {
                self.out.push_str("var ");
                for (i, decl) in declarations.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.out.push_str(&decl.name);
                    if let Some(init) = &decl.initializer {
                        self.out.push_str(" = ");
                        // Comma expressions would split the declaration
                        self.expression(init, 2);
                    }
                }
                self.out.push(';');
            }
            JsStatement::Expression(expr) => {
                if starts_with_ambiguous_token(expr) {
                    self.out.push('(');
                    self.expression(expr, 0);
                    self.out.push(')');
                } else {
                    self.expression(expr, 0);
                }
                self.out.push(';');
            }
            JsStatement::Block(block) => self.block(block),
            JsStatement::Return(value) => {
                self.out.push_str("return");
                if let Some(value) = value {
                    self.out.push(' ');
                    self.expression(value, 0);
                }
                self.out.push(';');
            }
            JsStatement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.out.push_str("if (");
                self.expression(condition, 0);
                self.out.push(')');
                self.body(then_branch);
                if let Some(else_branch) = else_branch {
                    if matches!(**then_branch, JsStatement::Block(_)) {
                        self.out.push(' ');
                    } else {
                        self.newline();
                        self.write_indent();
                    }
                    self.out.push_str("else");
                    match &**else_branch {
                        JsStatement::If { .. } => {
                            self.out.push(' ');
                            self.statement_inline(else_branch);
                        }
                        other => self.body(other),
                    }
                }
            }
            JsStatement::While { condition, body } => {
                self.out.push_str("while (");
                self.expression(condition, 0);
                self.out.push(')');
                self.body(body);
            }
            JsStatement::DoWhile { body, condition } => {
                self.out.push_str("do");
                self.body(body);
                if matches!(**body, JsStatement::Block(_)) {
                    self.out.push(' ');
                } else {
                    self.newline();
                    self.write_indent();
                }
                self.out.push_str("while (");
                self.expression(condition, 0);
                self.out.push_str(");");
            }
            JsStatement::Break => self.out.push_str("break;"),
            JsStatement::Continue => self.out.push_str("continue;"),
            JsStatement::Throw(value) => {
                self.out.push_str("throw ");
                self.expression(value, 0);
                self.out.push(';');
            }
            JsStatement::Empty => self.out.push(';'),
        }
    }

    /// Print a loop or branch body: blocks stay on the header line, anything
    /// else goes on its own indented line
    fn body(&mut self, statement: &JsStatement) {
        match statement {
            JsStatement::Block(block) => {
                self.out.push(' ');
                self.block(block);
            }
            other => {
                self.newline();
                self.level += 1;
                self.write_indent();
                self.statement_inline(other);
                self.level -= 1;
            }
        }
    }

    fn block(&mut self, block: &JsBlockStatement) {
        if block.statements.is_empty() {
            self.out.push_str("{}");
            return;
        }
        self.out.push('{');
        self.newline();
        self.level += 1;
        for statement in &block.statements {
            self.statement(statement);
        }
        self.level -= 1;
        self.write_indent();
        self.out.push('}');
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Print `expr`, parenthesized when it binds looser than `min_precedence`
    fn expression(&mut self, expr: &JsExpression, min_precedence: u8) {
        if expr.precedence() < min_precedence {
            self.out.push('(');
            self.expression_unparenthesized(expr);
            self.out.push(')');
        } else {
            self.expression_unparenthesized(expr);
        }
    }

    fn expression_unparenthesized(&mut self, expr: &JsExpression) {
        match expr {
            JsExpression::Null => self.out.push_str("null"),
            JsExpression::Boolean(b) => self.out.push_str(if *b { "true" } else { "false" }),
            JsExpression::Number(n) => self.out.push_str(&format_number(*n)),
            JsExpression::String(s) => {
                self.out
                    .push_str(&serde_json::Value::String(s.clone()).to_string());
            }
            JsExpression::Identifier(name) => self.out.push_str(name),
            JsExpression::This => self.out.push_str("this"),
            JsExpression::Member { target, name } => {
                self.member_target(target);
                self.out.push('.');
                self.out.push_str(name);
            }
            JsExpression::Index { target, index } => {
                self.member_target(target);
                self.out.push('[');
                self.expression(index, 0);
                self.out.push(']');
            }
            JsExpression::Invocation { target, arguments } => {
                self.member_target(target);
                self.arguments(arguments);
            }
            JsExpression::New {
                constructor,
                arguments,
            } => {
                self.out.push_str("new ");
                // `new f()(x)` vs `new (f())(x)`
                let needs_parens = contains_call(constructor);
                if needs_parens {
                    self.out.push('(');
                }
                self.expression(constructor, 18);
                if needs_parens {
                    self.out.push(')');
                }
                self.arguments(arguments);
            }
            JsExpression::ObjectLiteral(properties) => {
                if properties.is_empty() {
                    self.out.push_str("{}");
                    return;
                }
                self.out.push('{');
                for (i, property) in properties.iter().enumerate() {
                    if i > 0 {
                        self.out.push(',');
                    }
                    self.out.push(' ');
                    if is_identifier(&property.name) {
                        self.out.push_str(&property.name);
                    } else {
                        self.out.push_str(
                            &serde_json::Value::String(property.name.clone()).to_string(),
                        );
                    }
                    self.out.push_str(": ");
                    self.expression(&property.value, 2);
                }
                self.out.push_str(" }");
            }
            JsExpression::ArrayLiteral(elements) => {
                self.out.push('[');
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.expression(element, 2);
                }
                self.out.push(']');
            }
            JsExpression::Binary { op, left, right } => {
                let precedence = op.precedence();
                let left_min = if mixes_coalescing(*op, left) { 21 } else { precedence };
                let right_min = if mixes_coalescing(*op, right) { 21 } else { precedence + 1 };
                self.expression(left, left_min);
                self.out.push(' ');
                self.out.push_str(op.as_str());
                self.out.push(' ');
                self.expression(right, right_min);
            }
            JsExpression::Unary { op, operand } => {
                self.out.push_str(op.as_str());
                // Keep `- -x` and `+ +x` from turning into `--x`/`++x`
                let clash = matches!(
                    (op, &**operand),
                    (
                        JsUnaryOperator::Negate | JsUnaryOperator::PreDecrement,
                        JsExpression::Unary {
                            op: JsUnaryOperator::Negate | JsUnaryOperator::PreDecrement,
                            ..
                        }
                    ) | (
                        JsUnaryOperator::Plus | JsUnaryOperator::PreIncrement,
                        JsExpression::Unary {
                            op: JsUnaryOperator::Plus | JsUnaryOperator::PreIncrement,
                            ..
                        }
                    )
                ) || matches!((op, &**operand), (JsUnaryOperator::Negate, JsExpression::Number(n)) if n.is_sign_negative());
                if clash {
                    self.out.push(' ');
                }
                self.expression(operand, 15);
            }
            JsExpression::Postfix { op, operand } => {
                self.expression(operand, 17);
                self.out.push_str(match op {
                    JsPostfixOperator::Increment => "++",
                    JsPostfixOperator::Decrement => "--",
                });
            }
            JsExpression::Assign { op, target, value } => {
                self.expression(target, 16);
                self.out.push(' ');
                if let Some(op) = op {
                    self.out.push_str(op.as_str());
                }
                self.out.push_str("= ");
                self.expression(value, 2);
            }
            JsExpression::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                self.expression(condition, 4);
                self.out.push_str(" ? ");
                self.expression(when_true, 2);
                self.out.push_str(" : ");
                self.expression(when_false, 2);
            }
            JsExpression::Function(function) => {
                self.out.push_str("function");
                if let Some(name) = &function.name {
                    self.out.push(' ');
                    self.out.push_str(name);
                }
                self.out.push('(');
                self.out.push_str(&function.parameters.join(", "));
                self.out.push_str(") ");
                self.block(&function.body);
            }
            JsExpression::Comma(expressions) => {
                for (i, e) in expressions.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.expression(e, 2);
                }
            }
        }
    }

    fn member_target(&mut self, target: &JsExpression) {
        match target {
            // `1.toString()` does not parse
            JsExpression::Number(_) => {
                self.out.push('(');
                self.expression_unparenthesized(target);
                self.out.push(')');
            }
            // Calling a function expression directly
            JsExpression::Function(_) => {
                self.out.push('(');
                self.expression_unparenthesized(target);
                self.out.push(')');
            }
            other => self.expression(other, 18),
        }
    }

    fn arguments(&mut self, arguments: &[JsExpression]) {
        self.out.push('(');
        for (i, arg) in arguments.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.expression(arg, 2);
        }
        self.out.push(')');
    }
}

/// `a ?? b` cannot be mixed with `&&`/`||` without parentheses
fn mixes_coalescing(op: JsBinaryOperator, operand: &JsExpression) -> bool {
    let JsExpression::Binary { op: inner, .. } = operand else {
        return false;
    };
    let logical = |o: JsBinaryOperator| {
        matches!(o, JsBinaryOperator::LogicalAnd | JsBinaryOperator::LogicalOr)
    };
    (op == JsBinaryOperator::NullCoalescing && logical(*inner))
        || (logical(op) && *inner == JsBinaryOperator::NullCoalescing)
}

/// Whether the leftmost token of `expr` would be read as the start of a
/// function declaration or a block when it begins a statement
fn starts_with_ambiguous_token(expr: &JsExpression) -> bool {
    match expr {
        JsExpression::Function(_) | JsExpression::ObjectLiteral(_) => true,
        JsExpression::Member { target, .. }
        | JsExpression::Index { target, .. }
        | JsExpression::Invocation { target, .. } => {
            !matches!(**target, JsExpression::Function(_)) && starts_with_ambiguous_token(target)
        }
        JsExpression::Binary { left, .. } => starts_with_ambiguous_token(left),
        JsExpression::Assign { target, .. } => starts_with_ambiguous_token(target),
        JsExpression::Postfix { operand, .. } => starts_with_ambiguous_token(operand),
        JsExpression::Conditional { condition, .. } => starts_with_ambiguous_token(condition),
        JsExpression::Comma(items) => items.first().is_some_and(starts_with_ambiguous_token),
        _ => false,
    }
}

fn contains_call(expr: &JsExpression) -> bool {
    match expr {
        JsExpression::Invocation { .. } => true,
        JsExpression::Member { target, .. } | JsExpression::Index { target, .. } => {
            contains_call(target)
        }
        _ => false,
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{}", n)
    }
}
