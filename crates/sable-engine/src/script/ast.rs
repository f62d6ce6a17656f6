//! Target language AST
//!
//! An immutable tree of statements and expressions of the dynamic,
//! prototype-based target language. Nodes are plain data; the compiler builds
//! them bottom-up and [`super::JsOutputFormatter`] turns them into text.

// ============================================================================
// Statements
// ============================================================================

/// A list of statements in its own scope
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsBlockStatement {
    /// Statements in emission order
    pub statements: Vec<JsStatement>,
}

impl JsBlockStatement {
    /// Create a block from statements
    pub fn new(statements: Vec<JsStatement>) -> Self {
        Self { statements }
    }

    /// Check if the block has no statements
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// One binding of a `var` statement
#[derive(Debug, Clone, PartialEq)]
pub struct JsVariableDeclaration {
    /// Binding name
    pub name: String,
    /// Initial value
    pub initializer: Option<JsExpression>,
}

impl JsVariableDeclaration {
    /// Create a binding
    pub fn new(name: impl Into<String>, initializer: Option<JsExpression>) -> Self {
        Self {
            name: name.into(),
            initializer,
        }
    }
}

/// A statement
#[derive(Debug, Clone, PartialEq)]
pub enum JsStatement {
    /// Comment; text containing a line separator is a block comment
    Comment(String),
    /// `var a = 1, b;`
    VariableDeclaration(Vec<JsVariableDeclaration>),
    /// `expr;`
    Expression(JsExpression),
    /// `{ ... }`
    Block(JsBlockStatement),
    /// `return expr;`
    Return(Option<JsExpression>),
    /// `if (cond) then else otherwise`
    If {
        /// Condition
        condition: JsExpression,
        /// Then branch
        then_branch: Box<JsStatement>,
        /// Else branch
        else_branch: Option<Box<JsStatement>>,
    },
    /// `while (cond) body`
    While {
        /// Condition
        condition: JsExpression,
        /// Body
        body: Box<JsStatement>,
    },
    /// `do body while (cond);`
    DoWhile {
        /// Body
        body: Box<JsStatement>,
        /// Condition
        condition: JsExpression,
    },
    /// `break;`
    Break,
    /// `continue;`
    Continue,
    /// `throw expr;`
    Throw(JsExpression),
    /// `;`
    Empty,
}

impl JsStatement {
    /// `var name = initializer;`
    pub fn var(name: impl Into<String>, initializer: Option<JsExpression>) -> Self {
        JsStatement::VariableDeclaration(vec![JsVariableDeclaration::new(name, initializer)])
    }

    /// `expr;`
    pub fn expression(expression: JsExpression) -> Self {
        JsStatement::Expression(expression)
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// Binary operators of the target language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsBinaryOperator {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Modulo,
    /// `&`
    BitwiseAnd,
    /// `|`
    BitwiseOr,
    /// `^`
    BitwiseXor,
    /// `<<`
    LeftShift,
    /// `>>`
    RightShift,
    /// `>>>`
    UnsignedRightShift,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `===`
    StrictEqual,
    /// `!==`
    StrictNotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterEqual,
    /// `&&`
    LogicalAnd,
    /// `||`
    LogicalOr,
    /// `??`
    NullCoalescing,
}

impl JsBinaryOperator {
    /// Operator token
    pub fn as_str(&self) -> &'static str {
        match self {
            JsBinaryOperator::Add => "+",
            JsBinaryOperator::Subtract => "-",
            JsBinaryOperator::Multiply => "*",
            JsBinaryOperator::Divide => "/",
            JsBinaryOperator::Modulo => "%",
            JsBinaryOperator::BitwiseAnd => "&",
            JsBinaryOperator::BitwiseOr => "|",
            JsBinaryOperator::BitwiseXor => "^",
            JsBinaryOperator::LeftShift => "<<",
            JsBinaryOperator::RightShift => ">>",
            JsBinaryOperator::UnsignedRightShift => ">>>",
            JsBinaryOperator::Equal => "==",
            JsBinaryOperator::NotEqual => "!=",
            JsBinaryOperator::StrictEqual => "===",
            JsBinaryOperator::StrictNotEqual => "!==",
            JsBinaryOperator::LessThan => "<",
            JsBinaryOperator::LessEqual => "<=",
            JsBinaryOperator::GreaterThan => ">",
            JsBinaryOperator::GreaterEqual => ">=",
            JsBinaryOperator::LogicalAnd => "&&",
            JsBinaryOperator::LogicalOr => "||",
            JsBinaryOperator::NullCoalescing => "??",
        }
    }

    /// Binding strength; higher binds tighter
    pub fn precedence(&self) -> u8 {
        match self {
            JsBinaryOperator::NullCoalescing | JsBinaryOperator::LogicalOr => 4,
            JsBinaryOperator::LogicalAnd => 5,
            JsBinaryOperator::BitwiseOr => 6,
            JsBinaryOperator::BitwiseXor => 7,
            JsBinaryOperator::BitwiseAnd => 8,
            JsBinaryOperator::Equal
            | JsBinaryOperator::NotEqual
            | JsBinaryOperator::StrictEqual
            | JsBinaryOperator::StrictNotEqual => 9,
            JsBinaryOperator::LessThan
            | JsBinaryOperator::LessEqual
            | JsBinaryOperator::GreaterThan
            | JsBinaryOperator::GreaterEqual => 10,
            JsBinaryOperator::LeftShift
            | JsBinaryOperator::RightShift
            | JsBinaryOperator::UnsignedRightShift => 11,
            JsBinaryOperator::Add | JsBinaryOperator::Subtract => 12,
            JsBinaryOperator::Multiply | JsBinaryOperator::Divide | JsBinaryOperator::Modulo => 13,
        }
    }
}

/// Prefix operators of the target language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsUnaryOperator {
    /// `-x`
    Negate,
    /// `+x`
    Plus,
    /// `!x`
    Not,
    /// `~x`
    BitwiseNot,
    /// `++x`
    PreIncrement,
    /// `--x`
    PreDecrement,
    /// `typeof x`
    TypeOf,
}

impl JsUnaryOperator {
    /// Operator token
    pub fn as_str(&self) -> &'static str {
        match self {
            JsUnaryOperator::Negate => "-",
            JsUnaryOperator::Plus => "+",
            JsUnaryOperator::Not => "!",
            JsUnaryOperator::BitwiseNot => "~",
            JsUnaryOperator::PreIncrement => "++",
            JsUnaryOperator::PreDecrement => "--",
            JsUnaryOperator::TypeOf => "typeof ",
        }
    }
}

/// Postfix operators of the target language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsPostfixOperator {
    /// `x++`
    Increment,
    /// `x--`
    Decrement,
}

/// One `name: value` entry of an object literal
#[derive(Debug, Clone, PartialEq)]
pub struct JsObjectLiteralProperty {
    /// Property name
    pub name: String,
    /// Property value
    pub value: JsExpression,
}

/// A function expression
#[derive(Debug, Clone, PartialEq)]
pub struct JsFunctionDefinition {
    /// Optional function name
    pub name: Option<String>,
    /// Parameter names
    pub parameters: Vec<String>,
    /// Body
    pub body: JsBlockStatement,
}

/// An expression
#[derive(Debug, Clone, PartialEq)]
pub enum JsExpression {
    /// `null`
    Null,
    /// `true` / `false`
    Boolean(bool),
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// Identifier reference
    Identifier(String),
    /// `this`
    This,
    /// `target.name`
    Member {
        /// Object
        target: Box<JsExpression>,
        /// Member name
        name: String,
    },
    /// `target[index]`
    Index {
        /// Object
        target: Box<JsExpression>,
        /// Index
        index: Box<JsExpression>,
    },
    /// `target(args)`
    Invocation {
        /// Callee
        target: Box<JsExpression>,
        /// Arguments
        arguments: Vec<JsExpression>,
    },
    /// `new constructor(args)`
    New {
        /// Constructor
        constructor: Box<JsExpression>,
        /// Arguments
        arguments: Vec<JsExpression>,
    },
    /// `{ a: 1, b: 2 }`
    ObjectLiteral(Vec<JsObjectLiteralProperty>),
    /// `[a, b]`
    ArrayLiteral(Vec<JsExpression>),
    /// Binary operation
    Binary {
        /// Operator
        op: JsBinaryOperator,
        /// Left operand
        left: Box<JsExpression>,
        /// Right operand
        right: Box<JsExpression>,
    },
    /// Prefix operation
    Unary {
        /// Operator
        op: JsUnaryOperator,
        /// Operand
        operand: Box<JsExpression>,
    },
    /// Postfix operation
    Postfix {
        /// Operator
        op: JsPostfixOperator,
        /// Operand
        operand: Box<JsExpression>,
    },
    /// `target = value` or `target op= value`
    Assign {
        /// Compound operator
        op: Option<JsBinaryOperator>,
        /// Assigned location
        target: Box<JsExpression>,
        /// Value
        value: Box<JsExpression>,
    },
    /// `cond ? a : b`
    Conditional {
        /// Condition
        condition: Box<JsExpression>,
        /// Value when true
        when_true: Box<JsExpression>,
        /// Value when false
        when_false: Box<JsExpression>,
    },
    /// Function expression
    Function(JsFunctionDefinition),
    /// `a, b, c`
    Comma(Vec<JsExpression>),
}

impl JsExpression {
    /// Identifier reference
    pub fn identifier(name: impl Into<String>) -> Self {
        JsExpression::Identifier(name.into())
    }

    /// String literal
    pub fn string(value: impl Into<String>) -> Self {
        JsExpression::String(value.into())
    }

    /// `target.name`
    pub fn member(target: JsExpression, name: impl Into<String>) -> Self {
        JsExpression::Member {
            target: Box::new(target),
            name: name.into(),
        }
    }

    /// `target[index]`
    pub fn index(target: JsExpression, index: JsExpression) -> Self {
        JsExpression::Index {
            target: Box::new(target),
            index: Box::new(index),
        }
    }

    /// `target(arguments)`
    pub fn invoke(target: JsExpression, arguments: Vec<JsExpression>) -> Self {
        JsExpression::Invocation {
            target: Box::new(target),
            arguments,
        }
    }

    /// `new constructor(arguments)`
    pub fn new_object(constructor: JsExpression, arguments: Vec<JsExpression>) -> Self {
        JsExpression::New {
            constructor: Box::new(constructor),
            arguments,
        }
    }

    /// `target = value`
    pub fn assign(target: JsExpression, value: JsExpression) -> Self {
        JsExpression::Assign {
            op: None,
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    /// `left op right`
    pub fn binary(op: JsBinaryOperator, left: JsExpression, right: JsExpression) -> Self {
        JsExpression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// `op operand`
    pub fn unary(op: JsUnaryOperator, operand: JsExpression) -> Self {
        JsExpression::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// `cond ? when_true : when_false`
    pub fn conditional(condition: JsExpression, when_true: JsExpression, when_false: JsExpression) -> Self {
        JsExpression::Conditional {
            condition: Box::new(condition),
            when_true: Box::new(when_true),
            when_false: Box::new(when_false),
        }
    }

    /// `{ field: value }`
    pub fn object(properties: Vec<(String, JsExpression)>) -> Self {
        JsExpression::ObjectLiteral(
            properties
                .into_iter()
                .map(|(name, value)| JsObjectLiteralProperty { name, value })
                .collect(),
        )
    }

    /// Check whether evaluating the expression has no side effects and does
    /// not observe any mutable state
    pub fn is_pure(&self) -> bool {
        matches!(
            self,
            JsExpression::Null
                | JsExpression::Boolean(_)
                | JsExpression::Number(_)
                | JsExpression::String(_)
                | JsExpression::This
                | JsExpression::Function(_)
        )
    }

    /// Check whether evaluating this expression assigns the identifier `name`
    ///
    /// Function bodies are not entered; they do not run when the expression
    /// is evaluated.
    pub fn writes_identifier(&self, name: &str) -> bool {
        let is_target = |target: &JsExpression| matches!(target, JsExpression::Identifier(n) if n == name);
        match self {
            JsExpression::Assign { target, value, .. } => {
                is_target(target) || target.writes_identifier(name) || value.writes_identifier(name)
            }
            JsExpression::Unary { op, operand } => {
                (matches!(op, JsUnaryOperator::PreIncrement | JsUnaryOperator::PreDecrement) && is_target(operand))
                    || operand.writes_identifier(name)
            }
            JsExpression::Postfix { operand, .. } => is_target(operand) || operand.writes_identifier(name),
            JsExpression::Member { target, .. } => target.writes_identifier(name),
            JsExpression::Index { target, index } => target.writes_identifier(name) || index.writes_identifier(name),
            JsExpression::Invocation { target, arguments } => {
                target.writes_identifier(name) || arguments.iter().any(|a| a.writes_identifier(name))
            }
            JsExpression::New { constructor, arguments } => {
                constructor.writes_identifier(name) || arguments.iter().any(|a| a.writes_identifier(name))
            }
            JsExpression::ObjectLiteral(properties) => properties.iter().any(|p| p.value.writes_identifier(name)),
            JsExpression::ArrayLiteral(values) | JsExpression::Comma(values) => {
                values.iter().any(|v| v.writes_identifier(name))
            }
            JsExpression::Binary { left, right, .. } => left.writes_identifier(name) || right.writes_identifier(name),
            JsExpression::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                condition.writes_identifier(name)
                    || when_true.writes_identifier(name)
                    || when_false.writes_identifier(name)
            }
            JsExpression::Null
            | JsExpression::Boolean(_)
            | JsExpression::Number(_)
            | JsExpression::String(_)
            | JsExpression::Identifier(_)
            | JsExpression::This
            | JsExpression::Function(_) => false,
        }
    }

    /// Binding strength of the outermost node; higher binds tighter
    pub fn precedence(&self) -> u8 {
        match self {
            JsExpression::Comma(_) => 1,
            JsExpression::Assign { .. } => 2,
            JsExpression::Conditional { .. } => 3,
            JsExpression::Binary { op, .. } => op.precedence(),
            JsExpression::Unary { .. } => 15,
            JsExpression::Number(n) if n.is_sign_negative() && *n != 0.0 => 15,
            JsExpression::Postfix { .. } => 16,
            JsExpression::New { .. } => 17,
            JsExpression::Invocation { .. } | JsExpression::Member { .. } | JsExpression::Index { .. } => 18,
            JsExpression::Function(_) => 19,
            _ => 20,
        }
    }
}
