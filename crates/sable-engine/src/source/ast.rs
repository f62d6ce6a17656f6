//! Resolved statement and expression nodes
//!
//! Nodes arrive fully resolved from the front end:
//! - Every expression carries its inferred type
//! - Locals and parameters are bound to a semantic [`VariableId`]
//! - Member accesses are bound to a [`MemberId`] of the semantic model
//! - Lambdas carry the [`LambdaId`] keying their nested function descriptor

use super::model::MemberId;
use super::span::Span;
use super::types::TypeRef;
use thiserror::Error;

/// Semantic identity of a local variable or parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(pub u32);

/// Semantic identity of a lambda or local function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LambdaId(pub u32);

// ============================================================================
// Comments
// ============================================================================

/// Kind of a source comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentType {
    /// `// ...`
    SingleLine,
    /// `/* ... */`
    MultiLine,
    /// `/// ...`
    Documentation,
    /// `/** ... */`
    MultiLineDocumentation,
    /// Code excluded by a false preprocessor condition
    InactiveCode,
}

/// Raw comment tag outside the known range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid comment type: {0}")]
pub struct InvalidCommentType(pub u8);

impl TryFrom<u8> for CommentType {
    type Error = InvalidCommentType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CommentType::SingleLine),
            1 => Ok(CommentType::MultiLine),
            2 => Ok(CommentType::Documentation),
            3 => Ok(CommentType::MultiLineDocumentation),
            4 => Ok(CommentType::InactiveCode),
            other => Err(InvalidCommentType(other)),
        }
    }
}

/// A comment preserved in the statement tree
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Comment kind
    pub comment_type: CommentType,
    /// Text between the delimiters, delimiters excluded
    pub content: String,
    /// Source span
    pub span: Span,
}

// ============================================================================
// Statements
// ============================================================================

/// One declarator of a variable declaration statement
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    /// Declared variable
    pub variable: VariableId,
    /// Name as written in source (for diagnostics)
    pub name: String,
    /// Optional initializer
    pub initializer: Option<Expression>,
    /// Source span
    pub span: Span,
}

/// `T a = 1, b;`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarationStatement {
    /// Declarators in source order
    pub declarators: Vec<VariableDeclarator>,
    /// Source span
    pub span: Span,
}

/// Expression evaluated for its side effects
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    /// The expression
    pub expression: Expression,
    /// Source span
    pub span: Span,
}

/// `{ ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    /// Statements in source order
    pub statements: Vec<Statement>,
    /// Source span
    pub span: Span,
}

/// `return expr;`
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    /// Returned value
    pub value: Option<Expression>,
    /// Source span
    pub span: Span,
}

/// `if (cond) then else otherwise`
#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    /// Condition
    pub condition: Expression,
    /// Then branch
    pub then_branch: Box<Statement>,
    /// Else branch
    pub else_branch: Option<Box<Statement>>,
    /// Source span
    pub span: Span,
}

/// `while (cond) body` and `do body while (cond);`
#[derive(Debug, Clone, PartialEq)]
pub struct LoopStatement {
    /// Loop condition
    pub condition: Expression,
    /// Loop body
    pub body: Box<Statement>,
    /// Source span
    pub span: Span,
}

/// `throw expr;` (rethrow when `value` is `None`)
#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStatement {
    /// Thrown value
    pub value: Option<Expression>,
    /// Source span
    pub span: Span,
}

/// A statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Preserved comment
    Comment(Comment),
    /// Local variable declaration
    VariableDeclaration(VariableDeclarationStatement),
    /// Expression statement
    Expression(ExpressionStatement),
    /// Block
    Block(BlockStatement),
    /// Return
    Return(ReturnStatement),
    /// If/else
    If(IfStatement),
    /// While loop
    While(LoopStatement),
    /// Do/while loop
    DoWhile(LoopStatement),
    /// Break
    Break(Span),
    /// Continue
    Continue(Span),
    /// Throw
    Throw(ThrowStatement),
    /// `;`
    Empty(Span),
    /// `checked { ... }`
    Checked(BlockStatement),
    /// `unchecked { ... }`
    Unchecked(BlockStatement),
    /// `for (...) ...`
    For(Span),
    /// `foreach (...) ...`
    Foreach(Span),
    /// `switch (...) { ... }`
    Switch(Span),
    /// `try { ... } catch ... finally ...`
    Try(Span),
    /// `lock (...) ...`
    Lock(Span),
    /// `using (...) ...`
    Using(Span),
    /// `goto label;`
    Goto(Span),
    /// `label: statement`
    Labeled(Span),
    /// `yield return` / `yield break`
    Yield(Span),
    /// `unsafe { ... }`
    Unsafe(Span),
    /// `fixed (...) ...`
    Fixed(Span),
}

impl Statement {
    /// Get the span of this statement
    pub fn span(&self) -> Span {
        match self {
            Statement::Comment(c) => c.span,
            Statement::VariableDeclaration(d) => d.span,
            Statement::Expression(e) => e.span,
            Statement::Block(b) | Statement::Checked(b) | Statement::Unchecked(b) => b.span,
            Statement::Return(r) => r.span,
            Statement::If(i) => i.span,
            Statement::While(l) | Statement::DoWhile(l) => l.span,
            Statement::Throw(t) => t.span,
            Statement::Break(span)
            | Statement::Continue(span)
            | Statement::Empty(span)
            | Statement::For(span)
            | Statement::Foreach(span)
            | Statement::Switch(span)
            | Statement::Try(span)
            | Statement::Lock(span)
            | Statement::Using(span)
            | Statement::Goto(span)
            | Statement::Labeled(span)
            | Statement::Yield(span)
            | Statement::Unsafe(span)
            | Statement::Fixed(span) => *span,
        }
    }

    /// Source keyword naming the construct, for diagnostics
    pub fn construct_name(&self) -> &'static str {
        match self {
            Statement::Comment(_) => "comment",
            Statement::VariableDeclaration(_) => "variable declaration",
            Statement::Expression(_) => "expression statement",
            Statement::Block(_) => "block",
            Statement::Return(_) => "return",
            Statement::If(_) => "if",
            Statement::While(_) => "while",
            Statement::DoWhile(_) => "do",
            Statement::Break(_) => "break",
            Statement::Continue(_) => "continue",
            Statement::Throw(_) => "throw",
            Statement::Empty(_) => "empty statement",
            Statement::Checked(_) => "checked",
            Statement::Unchecked(_) => "unchecked",
            Statement::For(_) => "for",
            Statement::Foreach(_) => "foreach",
            Statement::Switch(_) => "switch",
            Statement::Try(_) => "try",
            Statement::Lock(_) => "lock",
            Statement::Using(_) => "using",
            Statement::Goto(_) => "goto",
            Statement::Labeled(_) => "labeled statement",
            Statement::Yield(_) => "yield",
            Statement::Unsafe(_) => "unsafe",
            Statement::Fixed(_) => "fixed",
        }
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// Compile-time constant
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    /// `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Any integral constant
    Int(i64),
    /// Any floating point constant
    Float(f64),
    /// String constant
    String(String),
    /// Character constant
    Char(char),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
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
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
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

impl BinaryOperator {
    /// Check whether the right operand is evaluated conditionally
    pub fn is_short_circuit(&self) -> bool {
        matches!(
            self,
            BinaryOperator::LogicalAnd | BinaryOperator::LogicalOr | BinaryOperator::NullCoalescing
        )
    }
}

/// Unary prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// `-x`
    Negate,
    /// `+x`
    Plus,
    /// `!x`
    Not,
    /// `~x`
    BitwiseNot,
}

/// Increment/decrement forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncrementKind {
    /// `++x`
    PreIncrement,
    /// `--x`
    PreDecrement,
    /// `x++`
    PostIncrement,
    /// `x--`
    PostDecrement,
}

impl IncrementKind {
    /// Check whether the expression yields the value before the update
    pub fn is_postfix(&self) -> bool {
        matches!(self, IncrementKind::PostIncrement | IncrementKind::PostDecrement)
    }

    /// Check whether the update adds one
    pub fn is_increment(&self) -> bool {
        matches!(self, IncrementKind::PreIncrement | IncrementKind::PostIncrement)
    }
}

/// How an argument is passed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgumentMode {
    /// By value
    #[default]
    Value,
    /// `ref x`
    Ref,
    /// `out x`
    Out,
}

/// An invocation argument
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    /// Passing mode
    pub mode: ArgumentMode,
    /// Argument expression
    pub expression: Expression,
}

impl Argument {
    /// By-value argument
    pub fn value(expression: Expression) -> Self {
        Self {
            mode: ArgumentMode::Value,
            expression,
        }
    }
}

/// Body of a lambda
#[derive(Debug, Clone, PartialEq)]
pub enum LambdaBody {
    /// `x => expr`
    Expression(Box<Expression>),
    /// `x => { ... }`
    Block(BlockStatement),
}

/// Expression kinds
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    /// Constant value
    Constant(ConstantValue),
    /// Local variable or parameter
    Local(VariableId),
    /// `this`
    This,
    /// Field access (`target` is `None` for static fields)
    Field {
        /// Instance expression
        target: Option<Box<Expression>>,
        /// Accessed field
        member: MemberId,
    },
    /// Property access (`target` is `None` for static properties)
    Property {
        /// Instance expression
        target: Option<Box<Expression>>,
        /// Accessed property
        member: MemberId,
    },
    /// Indexer access `target[args]`
    Indexer {
        /// Instance expression
        target: Box<Expression>,
        /// Accessed indexer
        member: MemberId,
        /// Index arguments
        arguments: Vec<Argument>,
    },
    /// Array element `array[index]`
    ArrayElement {
        /// Array expression
        array: Box<Expression>,
        /// Index expression
        index: Box<Expression>,
    },
    /// Method invocation (`target` is `None` for static methods)
    Invocation {
        /// Instance expression
        target: Option<Box<Expression>>,
        /// Invoked method
        method: MemberId,
        /// Arguments
        arguments: Vec<Argument>,
    },
    /// Delegate invocation `d(args)`
    DelegateInvocation {
        /// Delegate expression
        target: Box<Expression>,
        /// Arguments
        arguments: Vec<Argument>,
    },
    /// `new T(args)`
    ObjectCreation {
        /// Invoked constructor
        constructor: MemberId,
        /// Arguments
        arguments: Vec<Argument>,
    },
    /// `new[] { ... }`
    ArrayCreation {
        /// Elements
        elements: Vec<Expression>,
    },
    /// Binary operation
    Binary {
        /// Operator
        op: BinaryOperator,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },
    /// Unary operation
    Unary {
        /// Operator
        op: UnaryOperator,
        /// Operand
        operand: Box<Expression>,
    },
    /// Simple (`op` is `None`) or compound assignment
    Assignment {
        /// Compound operator
        op: Option<BinaryOperator>,
        /// Assigned location
        target: Box<Expression>,
        /// Assigned value
        value: Box<Expression>,
    },
    /// `++`/`--`
    Increment {
        /// Form
        kind: IncrementKind,
        /// Updated location
        target: Box<Expression>,
    },
    /// `cond ? a : b`
    Conditional {
        /// Condition
        condition: Box<Expression>,
        /// Value when true
        when_true: Box<Expression>,
        /// Value when false
        when_false: Box<Expression>,
    },
    /// Lambda or anonymous method
    Lambda {
        /// Resolve-result identity
        id: LambdaId,
        /// Parameters in order
        parameters: Vec<VariableId>,
        /// Body
        body: LambdaBody,
    },
}

/// A resolved expression
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    /// Expression kind
    pub kind: ExpressionKind,
    /// Inferred type
    pub ty: TypeRef,
    /// Source span
    pub span: Span,
}

impl Expression {
    /// Create a new expression
    pub fn new(kind: ExpressionKind, ty: TypeRef, span: Span) -> Self {
        Self { kind, ty, span }
    }

    /// Integer constant
    pub fn int(value: i64) -> Self {
        Self::new(
            ExpressionKind::Constant(ConstantValue::Int(value)),
            TypeRef::int32(),
            Span::default(),
        )
    }

    /// String constant
    pub fn string(value: impl Into<String>) -> Self {
        Self::new(
            ExpressionKind::Constant(ConstantValue::String(value.into())),
            TypeRef::string(),
            Span::default(),
        )
    }

    /// Local variable read
    pub fn local(variable: VariableId, ty: TypeRef) -> Self {
        Self::new(ExpressionKind::Local(variable), ty, Span::default())
    }

    /// Check whether evaluating this expression can have no side effects and
    /// yields the same value at any point of a statement
    pub fn is_constant(&self) -> bool {
        matches!(self.kind, ExpressionKind::Constant(_))
    }
}
