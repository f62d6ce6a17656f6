//! Expression compiler
//!
//! Lowers one resolved expression into a script expression plus the
//! statements that must run before it. Executing the additional statements in
//! order and then evaluating the expression has the same effects, in the same
//! order, as evaluating the source expression once.
//!
//! Decomposition happens when a source construct has no single-expression
//! equivalent: property setters used as values, read-modify-write through
//! accessors, and short-circuit or conditional operators whose later operand
//! itself needs statements. Whenever an operand produces statements, every
//! earlier operand with observable evaluation is first captured in a
//! temporary so it is still evaluated first.

use super::context::CompileContext;
use super::naming::MemberImpl;
use super::reporter::ErrorReporter;
use super::statement::StatementCompiler;
use crate::script::{
    JsBinaryOperator, JsBlockStatement, JsExpression, JsFunctionDefinition, JsPostfixOperator,
    JsStatement, JsUnaryOperator,
};
use crate::source::types::known;
use crate::source::{
    Argument, ArgumentMode, BinaryOperator, ConstantValue, Expression, ExpressionKind,
    IncrementKind, LambdaBody, LambdaId, MemberId, TypeDefId, UnaryOperator, VariableId,
};

/// Output of [`ExpressionCompiler::compile`]
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionCompileResult {
    /// Expression yielding the value
    pub expression: JsExpression,
    /// Statements to execute first, in order
    pub additional_statements: Vec<JsStatement>,
}

/// An operand evaluated left to right with its siblings
enum Operand<'e> {
    /// Evaluated for its value
    Value(&'e Expression),
    /// Passed by reference: yields the variable's container
    Reference(&'e Expression),
}

/// An assignable location after its sub-expressions were evaluated
enum Place {
    /// Local variable (or its container field)
    Local(JsExpression),
    /// Field, array element or field-backed property
    Direct(JsExpression),
    /// Property or indexer implemented by accessor methods
    Accessor {
        object: JsExpression,
        member: MemberId,
        arguments: Vec<JsExpression>,
    },
}

/// Lowers expressions of one member body
pub struct ExpressionCompiler<'c, 'a> {
    ctx: &'c CompileContext<'a>,
}

impl<'c, 'a> ExpressionCompiler<'c, 'a> {
    /// Create a compiler over a body context
    pub fn new(ctx: &'c CompileContext<'a>) -> Self {
        Self { ctx }
    }

    /// Lower `expression`
    ///
    /// When `value_is_important` is false the caller discards the value,
    /// which lets assignments through accessors skip the temporary that
    /// would otherwise hold the assigned value.
    pub fn compile(
        &self,
        expression: &Expression,
        value_is_important: bool,
        reporter: &mut dyn ErrorReporter,
    ) -> ExpressionCompileResult {
        let mut additional_statements = Vec::new();
        let expression = self.lower(expression, value_is_important, &mut additional_statements, reporter);
        ExpressionCompileResult {
            expression,
            additional_statements,
        }
    }

    fn lower(
        &self,
        expression: &Expression,
        important: bool,
        out: &mut Vec<JsStatement>,
        r: &mut dyn ErrorReporter,
    ) -> JsExpression {
        match &expression.kind {
            ExpressionKind::Constant(value) => constant(value),
            ExpressionKind::Local(variable) => self.read_local(*variable, r),
            ExpressionKind::This => JsExpression::This,

            ExpressionKind::Field { target, member } => {
                let object = self.instance(target.as_deref(), *member, out, r);
                JsExpression::member(object, self.field_name(*member, r))
            }

            ExpressionKind::Property { target, member } => {
                let object = self.instance(target.as_deref(), *member, out, r);
                self.property_get(object, *member, Vec::new(), r)
            }

            ExpressionKind::Indexer {
                target,
                member,
                arguments,
            } => {
                let mut operands = vec![Operand::Value(target)];
                operands.extend(argument_operands(arguments));
                let mut values = self.operands(&operands, out, r).into_iter();
                let object = values.next().unwrap_or(JsExpression::Null);
                self.property_get(object, *member, values.collect(), r)
            }

            ExpressionKind::ArrayElement { array, index } => {
                let (array, index) =
                    pair(self.operands(&[Operand::Value(array), Operand::Value(index)], out, r));
                JsExpression::index(array, index)
            }

            ExpressionKind::Invocation {
                target,
                method,
                arguments,
            } => self.invocation(target.as_deref(), *method, arguments, out, r),

            ExpressionKind::DelegateInvocation { target, arguments } => {
                let mut operands = vec![Operand::Value(target)];
                operands.extend(argument_operands(arguments));
                let mut values = self.operands(&operands, out, r).into_iter();
                let callee = values.next().unwrap_or(JsExpression::Null);
                JsExpression::invoke(callee, values.collect())
            }

            ExpressionKind::ObjectCreation {
                constructor,
                arguments,
            } => {
                let operands: Vec<Operand<'_>> = argument_operands(arguments).collect();
                let values = self.operands(&operands, out, r);
                let declaring = self.ctx.model.member(*constructor).declaring_type;
                let ty = self.type_reference(declaring);
                match self.ctx.naming.member(*constructor) {
                    MemberImpl::Constructor { name: None } => JsExpression::new_object(ty, values),
                    MemberImpl::Constructor { name: Some(name) } => {
                        JsExpression::new_object(JsExpression::member(ty, name), values)
                    }
                    other => {
                        self.unexpected_impl(*constructor, &other, r);
                        JsExpression::new_object(ty, values)
                    }
                }
            }

            ExpressionKind::ArrayCreation { elements } => {
                let operands: Vec<Operand<'_>> = elements.iter().map(Operand::Value).collect();
                JsExpression::ArrayLiteral(self.operands(&operands, out, r))
            }

            ExpressionKind::Binary { op, left, right } => self.binary(*op, left, right, out, r),

            ExpressionKind::Unary { op, operand } => {
                let operand = self.lower(operand, true, out, r);
                JsExpression::unary(unary_operator(*op), operand)
            }

            ExpressionKind::Assignment { op, target, value } => {
                self.assignment(*op, target, value, important, out, r)
            }

            ExpressionKind::Increment { kind, target } => self.increment(*kind, target, important, out, r),

            ExpressionKind::Conditional {
                condition,
                when_true,
                when_false,
            } => self.conditional(condition, when_true, when_false, out, r),

            ExpressionKind::Lambda {
                id,
                parameters,
                body,
            } => self.lambda(*id, parameters, body, r),
        }
    }

    // ========================================================================
    // Operand ordering
    // ========================================================================

    /// Lower operands left to right, keeping evaluation order when a later
    /// operand needs additional statements
    fn operands(
        &self,
        operands: &[Operand<'_>],
        out: &mut Vec<JsStatement>,
        r: &mut dyn ErrorReporter,
    ) -> Vec<JsExpression> {
        let mut values: Vec<JsExpression> = Vec::with_capacity(operands.len());
        for operand in operands {
            let mut hoisted = Vec::new();
            let value = match operand {
                Operand::Value(expression) => self.lower(expression, true, &mut hoisted, r),
                Operand::Reference(expression) => self.reference(expression, r),
            };
            if !hoisted.is_empty() {
                for earlier in values.iter_mut() {
                    self.spill(earlier, out);
                }
                out.extend(hoisted);
            }
            values.push(value);
        }
        values
    }

    /// Check whether re-evaluating `expression` later yields the same value
    /// without side effects
    fn is_stable(&self, expression: &JsExpression) -> bool {
        match expression {
            JsExpression::Identifier(name) => self.ctx.is_temporary(name),
            other => other.is_pure(),
        }
    }

    /// Capture `expression` in a temporary unless it is stable
    fn spill(&self, expression: &mut JsExpression, out: &mut Vec<JsStatement>) {
        if self.is_stable(expression) {
            return;
        }
        let temporary = self.ctx.new_temporary();
        let value = std::mem::replace(expression, JsExpression::identifier(temporary.clone()));
        out.push(JsStatement::var(temporary, Some(value)));
    }

    /// Capture `expression` ahead of `later` when evaluating `later` first
    /// could change its value
    ///
    /// A plain local keeps its value unless `later` assigns it; anything else
    /// that is not stable is captured.
    fn spill_before(&self, expression: &mut JsExpression, later: &JsExpression, out: &mut Vec<JsStatement>) {
        if let JsExpression::Identifier(name) = expression {
            if !later.writes_identifier(name) {
                return;
            }
        }
        self.spill(expression, out);
    }

    // ========================================================================
    // Variables and members
    // ========================================================================

    fn read_local(&self, variable: VariableId, r: &mut dyn ErrorReporter) -> JsExpression {
        match self.ctx.variables.get(&variable) {
            Some(data) if data.uses_reference_semantics => JsExpression::member(
                JsExpression::identifier(data.name.clone()),
                self.ctx.options.reference_field.clone(),
            ),
            Some(data) => JsExpression::identifier(data.name.clone()),
            None => {
                r.internal_error(&format!("No variable descriptor for local #{}", variable.0));
                JsExpression::identifier(format!("$local{}", variable.0))
            }
        }
    }

    /// A `ref`/`out` argument: the variable's container itself
    fn reference(&self, expression: &Expression, r: &mut dyn ErrorReporter) -> JsExpression {
        let ExpressionKind::Local(variable) = expression.kind else {
            r.internal_error("Only local variables can be passed by reference");
            return JsExpression::Null;
        };
        match self.ctx.variables.get(&variable) {
            Some(data) => {
                if !data.uses_reference_semantics {
                    r.internal_error(&format!(
                        "Variable '{}' is passed by reference but does not use reference semantics",
                        data.name
                    ));
                }
                JsExpression::identifier(data.name.clone())
            }
            None => {
                r.internal_error(&format!("No variable descriptor for local #{}", variable.0));
                JsExpression::identifier(format!("$local{}", variable.0))
            }
        }
    }

    /// Script expression naming a type
    fn type_reference(&self, ty: TypeDefId) -> JsExpression {
        let name = self.ctx.naming.type_name(ty);
        let mut parts = name.split('.');
        let first = JsExpression::identifier(parts.next().unwrap_or_default());
        parts.fold(first, JsExpression::member)
    }

    /// Receiver of a member access; static members are accessed on their type
    fn instance(
        &self,
        target: Option<&Expression>,
        member: MemberId,
        out: &mut Vec<JsStatement>,
        r: &mut dyn ErrorReporter,
    ) -> JsExpression {
        match target {
            Some(target) => self.lower(target, true, out, r),
            None => self.implicit_receiver(member),
        }
    }

    fn implicit_receiver(&self, member: MemberId) -> JsExpression {
        let def = self.ctx.model.member(member);
        if def.is_static {
            self.type_reference(def.declaring_type)
        } else {
            JsExpression::This
        }
    }

    fn unexpected_impl(&self, member: MemberId, implementation: &MemberImpl, r: &mut dyn ErrorReporter) {
        r.internal_error(&format!(
            "Unexpected implementation {:?} for {}",
            implementation,
            self.ctx.model.describe(member.into())
        ));
    }

    fn field_name(&self, member: MemberId, r: &mut dyn ErrorReporter) -> String {
        match self.ctx.naming.member(member) {
            MemberImpl::Field { name } | MemberImpl::FieldProperty { name } => name,
            other => {
                self.unexpected_impl(member, &other, r);
                self.ctx.model.member(member).name.clone()
            }
        }
    }

    fn property_get(
        &self,
        object: JsExpression,
        member: MemberId,
        arguments: Vec<JsExpression>,
        r: &mut dyn ErrorReporter,
    ) -> JsExpression {
        match self.ctx.naming.member(member) {
            MemberImpl::Property { getter, .. } => {
                JsExpression::invoke(JsExpression::member(object, getter), arguments)
            }
            MemberImpl::Field { name } | MemberImpl::FieldProperty { name } => JsExpression::member(object, name),
            MemberImpl::NativeIndexer => {
                let index = arguments.into_iter().next().unwrap_or(JsExpression::Null);
                JsExpression::index(object, index)
            }
            other => {
                self.unexpected_impl(member, &other, r);
                JsExpression::Null
            }
        }
    }

    fn invocation(
        &self,
        target: Option<&Expression>,
        method: MemberId,
        arguments: &[Argument],
        out: &mut Vec<JsStatement>,
        r: &mut dyn ErrorReporter,
    ) -> JsExpression {
        let mut operands = Vec::with_capacity(arguments.len() + 1);
        if let Some(target) = target {
            operands.push(Operand::Value(target));
        }
        operands.extend(argument_operands(arguments));
        let mut values = self.operands(&operands, out, r).into_iter();
        let object = match target {
            Some(_) => values.next().unwrap_or(JsExpression::Null),
            None => self.implicit_receiver(method),
        };
        let name = match self.ctx.naming.member(method) {
            MemberImpl::Method { name } => name,
            other => {
                self.unexpected_impl(method, &other, r);
                self.ctx.model.member(method).name.clone()
            }
        };
        JsExpression::invoke(JsExpression::member(object, name), values.collect())
    }

    // ========================================================================
    // Operators
    // ========================================================================

    fn binary(
        &self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
        out: &mut Vec<JsStatement>,
        r: &mut dyn ErrorReporter,
    ) -> JsExpression {
        if op.is_short_circuit() {
            let left_value = self.lower(left, true, out, r);
            let mut hoisted = Vec::new();
            let right_value = self.lower(right, true, &mut hoisted, r);
            if hoisted.is_empty() {
                return JsExpression::binary(binary_operator(op), left_value, right_value);
            }

            // The right operand's statements may only run when it is evaluated
            let temporary = self.ctx.new_temporary();
            out.push(JsStatement::var(temporary.clone(), Some(left_value)));
            let current = JsExpression::identifier(temporary.clone());
            let condition = match op {
                BinaryOperator::LogicalAnd => current.clone(),
                BinaryOperator::LogicalOr => JsExpression::unary(JsUnaryOperator::Not, current.clone()),
                _ => JsExpression::binary(JsBinaryOperator::Equal, current.clone(), JsExpression::Null),
            };
            hoisted.push(JsStatement::expression(JsExpression::assign(current.clone(), right_value)));
            out.push(JsStatement::If {
                condition,
                then_branch: Box::new(JsStatement::Block(JsBlockStatement::new(hoisted))),
                else_branch: None,
            });
            return current;
        }

        let (left_value, right_value) =
            pair(self.operands(&[Operand::Value(left), Operand::Value(right)], out, r));
        let result = JsExpression::binary(binary_operator(op), left_value, right_value);
        if is_integer_division(op, left, right) {
            truncate(result)
        } else {
            result
        }
    }

    fn conditional(
        &self,
        condition: &Expression,
        when_true: &Expression,
        when_false: &Expression,
        out: &mut Vec<JsStatement>,
        r: &mut dyn ErrorReporter,
    ) -> JsExpression {
        let condition = self.lower(condition, true, out, r);
        let mut true_statements = Vec::new();
        let true_value = self.lower(when_true, true, &mut true_statements, r);
        let mut false_statements = Vec::new();
        let false_value = self.lower(when_false, true, &mut false_statements, r);

        if true_statements.is_empty() && false_statements.is_empty() {
            return JsExpression::conditional(condition, true_value, false_value);
        }

        let temporary = self.ctx.new_temporary();
        let result = JsExpression::identifier(temporary.clone());
        out.push(JsStatement::var(temporary, None));
        true_statements.push(JsStatement::expression(JsExpression::assign(result.clone(), true_value)));
        false_statements.push(JsStatement::expression(JsExpression::assign(result.clone(), false_value)));
        out.push(JsStatement::If {
            condition,
            then_branch: Box::new(JsStatement::Block(JsBlockStatement::new(true_statements))),
            else_branch: Some(Box::new(JsStatement::Block(JsBlockStatement::new(false_statements)))),
        });
        result
    }

    // ========================================================================
    // Assignment
    // ========================================================================

    /// Evaluate the sub-expressions of an assignable `target`, followed by
    /// `value` when given
    fn place(
        &self,
        target: &Expression,
        value: Option<&Expression>,
        out: &mut Vec<JsStatement>,
        r: &mut dyn ErrorReporter,
    ) -> (Place, JsExpression) {
        let mut operands = Vec::new();
        match &target.kind {
            ExpressionKind::Local(_) => {}
            ExpressionKind::Field { target: object, .. } | ExpressionKind::Property { target: object, .. } => {
                if let Some(object) = object {
                    operands.push(Operand::Value(object));
                }
            }
            ExpressionKind::Indexer {
                target: object,
                arguments,
                ..
            } => {
                operands.push(Operand::Value(object));
                operands.extend(argument_operands(arguments));
            }
            ExpressionKind::ArrayElement { array, index } => {
                operands.push(Operand::Value(array));
                operands.push(Operand::Value(index));
            }
            _ => {
                r.internal_error("Assignment target is not assignable");
                let value = value.map_or(JsExpression::Null, |v| self.lower(v, true, out, r));
                return (Place::Direct(JsExpression::Null), value);
            }
        }
        if let Some(value) = value {
            operands.push(Operand::Value(value));
        }

        let mut values = self.operands(&operands, out, r);
        let value = match value {
            Some(_) => values.pop().unwrap_or(JsExpression::Null),
            None => JsExpression::Null,
        };
        let mut values = values.into_iter();

        let place = match &target.kind {
            ExpressionKind::Local(variable) => Place::Local(self.read_local(*variable, r)),
            ExpressionKind::Field {
                target: object,
                member,
            } => {
                let object = match object {
                    Some(_) => values.next().unwrap_or(JsExpression::Null),
                    None => self.implicit_receiver(*member),
                };
                Place::Direct(JsExpression::member(object, self.field_name(*member, r)))
            }
            ExpressionKind::Property {
                target: object,
                member,
            } => {
                let object = match object {
                    Some(_) => values.next().unwrap_or(JsExpression::Null),
                    None => self.implicit_receiver(*member),
                };
                self.property_place(object, *member, Vec::new(), r)
            }
            ExpressionKind::Indexer { member, .. } => {
                let object = values.next().unwrap_or(JsExpression::Null);
                self.property_place(object, *member, values.collect(), r)
            }
            _ => {
                let (array, index) = pair(values.collect());
                Place::Direct(JsExpression::index(array, index))
            }
        };
        (place, value)
    }

    fn property_place(
        &self,
        object: JsExpression,
        member: MemberId,
        arguments: Vec<JsExpression>,
        r: &mut dyn ErrorReporter,
    ) -> Place {
        match self.ctx.naming.member(member) {
            MemberImpl::Property { .. } => Place::Accessor {
                object,
                member,
                arguments,
            },
            MemberImpl::Field { name } | MemberImpl::FieldProperty { name } => {
                Place::Direct(JsExpression::member(object, name))
            }
            MemberImpl::NativeIndexer => {
                let index = arguments.into_iter().next().unwrap_or(JsExpression::Null);
                Place::Direct(JsExpression::index(object, index))
            }
            other => {
                self.unexpected_impl(member, &other, r);
                Place::Direct(JsExpression::member(object, self.ctx.model.member(member).name.clone()))
            }
        }
    }

    /// Make a place safe to read and then write
    fn stabilize(&self, place: Place, out: &mut Vec<JsStatement>) -> Place {
        match place {
            Place::Local(location) => Place::Local(location),
            Place::Direct(JsExpression::Member { mut target, name }) => {
                self.spill(&mut target, out);
                Place::Direct(JsExpression::Member { target, name })
            }
            Place::Direct(JsExpression::Index { mut target, mut index }) => {
                self.spill(&mut target, out);
                self.spill(&mut index, out);
                Place::Direct(JsExpression::Index { target, index })
            }
            Place::Direct(other) => Place::Direct(other),
            Place::Accessor {
                mut object,
                member,
                mut arguments,
            } => {
                self.spill(&mut object, out);
                for argument in arguments.iter_mut() {
                    self.spill(argument, out);
                }
                Place::Accessor {
                    object,
                    member,
                    arguments,
                }
            }
        }
    }

    fn load(&self, place: &Place, r: &mut dyn ErrorReporter) -> JsExpression {
        match place {
            Place::Local(location) | Place::Direct(location) => location.clone(),
            Place::Accessor {
                object,
                member,
                arguments,
            } => self.property_get(object.clone(), *member, arguments.clone(), r),
        }
    }

    /// Write `value` to `place`, yielding the written value when `important`
    fn store(
        &self,
        place: Place,
        value: JsExpression,
        important: bool,
        out: &mut Vec<JsStatement>,
        r: &mut dyn ErrorReporter,
    ) -> JsExpression {
        match place {
            Place::Local(location) | Place::Direct(location) => JsExpression::assign(location, value),
            Place::Accessor {
                object,
                member,
                mut arguments,
            } => {
                let setter = match self.ctx.naming.member(member) {
                    MemberImpl::Property { setter, .. } => setter,
                    other => {
                        self.unexpected_impl(member, &other, r);
                        self.ctx.model.member(member).name.clone()
                    }
                };
                if !important {
                    arguments.push(value);
                    return JsExpression::invoke(JsExpression::member(object, setter), arguments);
                }
                let mut object = object;
                let mut value = value;
                if !self.is_stable(&value) {
                    // The receiver and arguments were evaluated before the value
                    self.spill_before(&mut object, &value, out);
                    for argument in arguments.iter_mut() {
                        self.spill_before(argument, &value, out);
                    }
                    self.spill(&mut value, out);
                }
                arguments.push(value.clone());
                let callee = JsExpression::member(object, setter);
                out.push(JsStatement::expression(JsExpression::invoke(callee, arguments)));
                value
            }
        }
    }

    fn assignment(
        &self,
        op: Option<BinaryOperator>,
        target: &Expression,
        value: &Expression,
        important: bool,
        out: &mut Vec<JsStatement>,
        r: &mut dyn ErrorReporter,
    ) -> JsExpression {
        let (place, value_js) = self.place(target, Some(value), out, r);
        let Some(op) = op else {
            return self.store(place, value_js, important, out, r);
        };

        let integer_division = is_integer_division(op, target, value);
        match place {
            Place::Local(location) | Place::Direct(location) if !integer_division => JsExpression::Assign {
                op: Some(binary_operator(op)),
                target: Box::new(location),
                value: Box::new(value_js),
            },
            place => {
                let place = self.stabilize(place, out);
                let current = self.load(&place, r);
                let mut combined = JsExpression::binary(binary_operator(op), current, value_js);
                if integer_division {
                    combined = truncate(combined);
                }
                self.store(place, combined, important, out, r)
            }
        }
    }

    fn increment(
        &self,
        kind: IncrementKind,
        target: &Expression,
        important: bool,
        out: &mut Vec<JsStatement>,
        r: &mut dyn ErrorReporter,
    ) -> JsExpression {
        let (place, _) = self.place(target, None, out, r);
        let place = match place {
            Place::Local(location) | Place::Direct(location) => {
                let operand = Box::new(location);
                return match (kind.is_postfix(), kind.is_increment()) {
                    (true, true) => JsExpression::Postfix {
                        op: JsPostfixOperator::Increment,
                        operand,
                    },
                    (true, false) => JsExpression::Postfix {
                        op: JsPostfixOperator::Decrement,
                        operand,
                    },
                    (false, true) => JsExpression::Unary {
                        op: JsUnaryOperator::PreIncrement,
                        operand,
                    },
                    (false, false) => JsExpression::Unary {
                        op: JsUnaryOperator::PreDecrement,
                        operand,
                    },
                };
            }
            accessor => self.stabilize(accessor, out),
        };

        let op = if kind.is_increment() {
            JsBinaryOperator::Add
        } else {
            JsBinaryOperator::Subtract
        };
        let current = self.load(&place, r);

        if kind.is_postfix() && important {
            let temporary = self.ctx.new_temporary();
            out.push(JsStatement::var(temporary.clone(), Some(current)));
            let old = JsExpression::identifier(temporary);
            let updated = JsExpression::binary(op, old.clone(), JsExpression::Number(1.0));
            let call = self.store(place, updated, false, out, r);
            out.push(JsStatement::expression(call));
            return old;
        }

        let updated = JsExpression::binary(op, current, JsExpression::Number(1.0));
        self.store(place, updated, important, out, r)
    }

    // ========================================================================
    // Lambdas
    // ========================================================================

    fn lambda(
        &self,
        id: LambdaId,
        parameters: &[VariableId],
        body: &LambdaBody,
        r: &mut dyn ErrorReporter,
    ) -> JsExpression {
        let entry = self.ctx.nested_functions.get(id);
        if entry.is_none() {
            r.internal_error(&format!("No nested function data for lambda #{}", id.0));
        }

        let mut names = Vec::with_capacity(parameters.len());
        let mut statements = Vec::new();
        for parameter in parameters {
            match self.ctx.variables.get(parameter) {
                Some(data) => {
                    names.push(data.name.clone());
                    if data.uses_reference_semantics {
                        let name = JsExpression::identifier(data.name.clone());
                        let container =
                            JsExpression::object(vec![(self.ctx.options.reference_field.clone(), name.clone())]);
                        statements.push(JsStatement::expression(JsExpression::assign(name, container)));
                    }
                }
                None => {
                    r.internal_error(&format!("No variable descriptor for parameter #{}", parameter.0));
                    names.push(format!("$local{}", parameter.0));
                }
            }
        }

        let location = r.location().clone();
        match body {
            LambdaBody::Block(block) => {
                let compiled = StatementCompiler::new(self.ctx).compile_statements(&block.statements, r);
                statements.extend(compiled.statements);
            }
            LambdaBody::Expression(expression) => {
                let returns_value = !expression.ty.is(known::VOID);
                let compiled = self.compile(expression, returns_value, r);
                statements.extend(compiled.additional_statements);
                statements.push(if returns_value {
                    JsStatement::Return(Some(compiled.expression))
                } else {
                    JsStatement::expression(compiled.expression)
                });
            }
        }
        r.set_location(location);

        let function = JsExpression::Function(JsFunctionDefinition {
            name: None,
            parameters: names,
            body: JsBlockStatement::new(statements),
        });
        if entry.is_some_and(|entry| entry.uses_this) {
            JsExpression::invoke(JsExpression::member(function, "bind"), vec![JsExpression::This])
        } else {
            function
        }
    }
}

fn argument_operands(arguments: &[Argument]) -> impl Iterator<Item = Operand<'_>> {
    arguments.iter().map(|argument| match argument.mode {
        ArgumentMode::Value => Operand::Value(&argument.expression),
        ArgumentMode::Ref | ArgumentMode::Out => Operand::Reference(&argument.expression),
    })
}

fn pair(values: Vec<JsExpression>) -> (JsExpression, JsExpression) {
    let mut values = values.into_iter();
    let first = values.next().unwrap_or(JsExpression::Null);
    let second = values.next().unwrap_or(JsExpression::Null);
    (first, second)
}

fn constant(value: &ConstantValue) -> JsExpression {
    match value {
        ConstantValue::Null => JsExpression::Null,
        ConstantValue::Bool(b) => JsExpression::Boolean(*b),
        ConstantValue::Int(i) => JsExpression::Number(*i as f64),
        ConstantValue::Float(f) => JsExpression::Number(*f),
        ConstantValue::String(s) => JsExpression::String(s.clone()),
        ConstantValue::Char(c) => JsExpression::Number(u32::from(*c) as f64),
    }
}

fn is_integer_division(op: BinaryOperator, left: &Expression, right: &Expression) -> bool {
    op == BinaryOperator::Divide && left.ty.is_int32() && right.ty.is_int32()
}

/// `value | 0`
fn truncate(value: JsExpression) -> JsExpression {
    JsExpression::binary(JsBinaryOperator::BitwiseOr, value, JsExpression::Number(0.0))
}

fn binary_operator(op: BinaryOperator) -> JsBinaryOperator {
    match op {
        BinaryOperator::Add => JsBinaryOperator::Add,
        BinaryOperator::Subtract => JsBinaryOperator::Subtract,
        BinaryOperator::Multiply => JsBinaryOperator::Multiply,
        BinaryOperator::Divide => JsBinaryOperator::Divide,
        BinaryOperator::Modulo => JsBinaryOperator::Modulo,
        BinaryOperator::BitwiseAnd => JsBinaryOperator::BitwiseAnd,
        BinaryOperator::BitwiseOr => JsBinaryOperator::BitwiseOr,
        BinaryOperator::BitwiseXor => JsBinaryOperator::BitwiseXor,
        BinaryOperator::LeftShift => JsBinaryOperator::LeftShift,
        BinaryOperator::RightShift => JsBinaryOperator::RightShift,
        BinaryOperator::Equal => JsBinaryOperator::StrictEqual,
        BinaryOperator::NotEqual => JsBinaryOperator::StrictNotEqual,
        BinaryOperator::LessThan => JsBinaryOperator::LessThan,
        BinaryOperator::LessEqual => JsBinaryOperator::LessEqual,
        BinaryOperator::GreaterThan => JsBinaryOperator::GreaterThan,
        BinaryOperator::GreaterEqual => JsBinaryOperator::GreaterEqual,
        BinaryOperator::LogicalAnd => JsBinaryOperator::LogicalAnd,
        BinaryOperator::LogicalOr => JsBinaryOperator::LogicalOr,
        BinaryOperator::NullCoalescing => JsBinaryOperator::NullCoalescing,
    }
}

fn unary_operator(op: UnaryOperator) -> JsUnaryOperator {
    match op {
        UnaryOperator::Negate => JsUnaryOperator::Negate,
        UnaryOperator::Plus => JsUnaryOperator::Plus,
        UnaryOperator::Not => JsUnaryOperator::Not,
        UnaryOperator::BitwiseNot => JsUnaryOperator::BitwiseNot,
    }
}
