use script::ast::{BinaryOperator, Expr, UnaryOperator};

use crate::builtins::{self, Builtin};
use crate::error::{Fault, RuntimeError};
use crate::executor::Interpreter;
use crate::runtime_value::RuntimeValue;

impl Interpreter<'_> {
    /// Evaluate an expression AST node to produce a RuntimeValue.
    pub(crate) fn evaluate(&mut self, expr: &Expr) -> Result<RuntimeValue, Fault> {
        self.enter()?;
        let value = self.evaluate_expr(expr);
        self.leave();
        value
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<RuntimeValue, Fault> {
        match expr {
            // --- Literals ---
            Expr::NumberLiteral(n) => Ok(RuntimeValue::Number(*n)),
            Expr::StringLiteral(s) => Ok(RuntimeValue::String(s.clone())),
            Expr::BooleanLiteral(b) => Ok(RuntimeValue::Boolean(*b)),
            Expr::UndefinedLiteral => Ok(RuntimeValue::Undefined),
            Expr::ListLiteral(items) => {
                let items = items
                    .iter()
                    .map(|item| self.evaluate(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(RuntimeValue::list(items))
            }

            // --- References ---
            Expr::Identifier(name, span) => match self.env.get_variable(name) {
                Some(value) => Ok(value.clone()),
                None => Err(self.fault(RuntimeError::ReferenceError(name.clone()), span.clone())),
            },

            // --- Operations ---
            Expr::UnaryOperation { operator, operand } => {
                let value = self.evaluate(operand)?;
                match operator {
                    UnaryOperator::Negation => match value {
                        RuntimeValue::Number(n) => Ok(RuntimeValue::Number(-n)),
                        other => Err(self.located(
                            RuntimeError::type_error(format!("cannot negate a {} value", other.type_name())),
                            expr,
                        )),
                    },
                    UnaryOperator::LogicalNot => Ok(RuntimeValue::Boolean(value.is_falsy())),
                }
            }

            Expr::BinaryOperation { operator, left, right } => {
                let l = self.evaluate(left)?;
                // `&&` and `||` short-circuit and yield one of their operands.
                match operator {
                    BinaryOperator::LogicalAnd if l.is_falsy() => return Ok(l),
                    BinaryOperator::LogicalOr if l.is_truthy() => return Ok(l),
                    BinaryOperator::LogicalAnd | BinaryOperator::LogicalOr => return self.evaluate(right),
                    _ => {}
                }
                let r = self.evaluate(right)?;
                eval_binary_op(*operator, &l, &r).map_err(|e| self.located(e, expr))
            }

            // --- Postfix ---
            Expr::Call { callee, arguments, span } => {
                let function = self.evaluate(callee)?;
                let arguments = arguments
                    .iter()
                    .map(|argument| self.evaluate(argument))
                    .collect::<Result<Vec<_>, _>>()?;

                let result = match function {
                    RuntimeValue::Function(decl) => return self.call_function(decl, arguments, span),
                    RuntimeValue::Builtin(builtin) => self.call_builtin(builtin, arguments),
                    RuntimeValue::Method(receiver, method) => builtins::call_method(&receiver, method, arguments),
                    _ => Err(RuntimeError::NotAFunction(describe(callee))),
                };
                result.map_err(|e| self.fault(e, span.clone()))
            }

            Expr::Member { object, property, span } => {
                let object = self.evaluate(object)?;
                builtins::member(&object, property).map_err(|e| self.fault(e, span.clone()))
            }

            Expr::Index { object, index, span } => {
                let object = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                builtins::index(&object, &index).map_err(|e| self.fault(e, span.clone()))
            }
        }
    }

    fn call_builtin(&mut self, builtin: Builtin, arguments: Vec<RuntimeValue>) -> Result<RuntimeValue, RuntimeError> {
        let first = arguments.first().cloned();
        let message = || first.as_ref().map(ToString::to_string).unwrap_or_default();

        let value = match builtin {
            Builtin::Print => {
                let line = first.as_ref().map_or_else(|| "undefined".to_string(), ToString::to_string);
                self.effects.output_lines.push(line);
                RuntimeValue::Undefined
            }
            Builtin::SetAnswer => {
                let answer = match first {
                    Some(RuntimeValue::Number(n)) => n,
                    other => {
                        let found = other.as_ref().map_or("undefined", RuntimeValue::type_name);
                        tracing::warn!(found, "declared answer is not a number; recording NaN");
                        f64::NAN
                    }
                };
                self.effects.declared_answer = Some(answer);
                RuntimeValue::Undefined
            }
            Builtin::Prompt => match self.ambient.prompt(&message()) {
                Some(response) => RuntimeValue::String(response),
                None => RuntimeValue::Undefined,
            },
            Builtin::Alert => {
                self.ambient.alert(&message());
                RuntimeValue::Undefined
            }
            Builtin::Confirm => RuntimeValue::Boolean(self.ambient.confirm(&message())),
            Builtin::ToNumber => RuntimeValue::Number(first.map_or(0.0, |v| v.to_number())),
            Builtin::ToText => RuntimeValue::String(message()),
            Builtin::Math(function) => RuntimeValue::Number(function.apply(&arguments)),
        };
        Ok(value)
    }

    /// Attach the expression's span, if it has one.
    fn located(&self, error: RuntimeError, expr: &Expr) -> Fault {
        match expr.span() {
            Some(span) => self.fault(error, span),
            None => Fault::from(error),
        }
    }
}

/// How a callee reads in an error message: `doble`, `lista.push`.
fn describe(callee: &Expr) -> String {
    match callee {
        Expr::Identifier(name, _) => name.clone(),
        Expr::Member { object, property, .. } => format!("{}.{property}", describe(object)),
        Expr::Call { callee, .. } => format!("{}(...)", describe(callee)),
        _ => "expression".to_string(),
    }
}

pub(crate) fn eval_binary_op(
    op: BinaryOperator,
    left: &RuntimeValue,
    right: &RuntimeValue,
) -> Result<RuntimeValue, RuntimeError> {
    match op {
        BinaryOperator::Addition => match (left, right) {
            (RuntimeValue::Number(a), RuntimeValue::Number(b)) => Ok(RuntimeValue::Number(a + b)),
            // Text (or a list) on either side concatenates.
            (RuntimeValue::String(_) | RuntimeValue::List(_), _) | (_, RuntimeValue::String(_) | RuntimeValue::List(_)) => {
                Ok(RuntimeValue::String(format!("{}{}", left, right)))
            }
            _ => Err(operand_error(op, left, right)),
        },
        BinaryOperator::Subtraction => numeric_binop(op, left, right, |a, b| a - b),
        BinaryOperator::Multiplication => numeric_binop(op, left, right, |a, b| a * b),
        BinaryOperator::Division => {
            let (a, b) = numbers(op, left, right)?;
            if b == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(RuntimeValue::Number(a / b))
        }
        BinaryOperator::Modulo => {
            let (a, b) = numbers(op, left, right)?;
            if b == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(RuntimeValue::Number(a % b))
        }
        BinaryOperator::Equality => Ok(RuntimeValue::Boolean(left == right)),
        BinaryOperator::Inequality => Ok(RuntimeValue::Boolean(left != right)),
        BinaryOperator::GreaterThan => compare(op, left, right, |o| o.is_gt()),
        BinaryOperator::LessThan => compare(op, left, right, |o| o.is_lt()),
        BinaryOperator::GreaterThanOrEqual => compare(op, left, right, |o| o.is_ge()),
        BinaryOperator::LessThanOrEqual => compare(op, left, right, |o| o.is_le()),
        BinaryOperator::LogicalAnd => Ok(if left.is_falsy() { left.clone() } else { right.clone() }),
        BinaryOperator::LogicalOr => Ok(if left.is_truthy() { left.clone() } else { right.clone() }),
    }
}

fn operand_error(op: BinaryOperator, left: &RuntimeValue, right: &RuntimeValue) -> RuntimeError {
    RuntimeError::type_error(format!(
        "cannot apply `{}` to {} and {}",
        op.symbol(),
        left.type_name(),
        right.type_name()
    ))
}

fn numbers(op: BinaryOperator, left: &RuntimeValue, right: &RuntimeValue) -> Result<(f64, f64), RuntimeError> {
    match (left, right) {
        (RuntimeValue::Number(a), RuntimeValue::Number(b)) => Ok((*a, *b)),
        _ => Err(operand_error(op, left, right)),
    }
}

fn numeric_binop(
    op: BinaryOperator,
    left: &RuntimeValue,
    right: &RuntimeValue,
    f: impl Fn(f64, f64) -> f64,
) -> Result<RuntimeValue, RuntimeError> {
    let (a, b) = numbers(op, left, right)?;
    Ok(RuntimeValue::Number(f(a, b)))
}

/// Numbers compare numerically, text lexicographically. Any comparison
/// involving `NaN` is false.
fn compare(
    op: BinaryOperator,
    left: &RuntimeValue,
    right: &RuntimeValue,
    f: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<RuntimeValue, RuntimeError> {
    let ordering = match (left, right) {
        (RuntimeValue::Number(a), RuntimeValue::Number(b)) => a.partial_cmp(b),
        (RuntimeValue::String(a), RuntimeValue::String(b)) => Some(a.cmp(b)),
        _ => return Err(operand_error(op, left, right)),
    };
    Ok(RuntimeValue::Boolean(ordering.is_some_and(f)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> RuntimeValue {
        RuntimeValue::Number(n)
    }

    fn text(s: &str) -> RuntimeValue {
        RuntimeValue::String(s.to_string())
    }

    #[test]
    fn addition_concatenates_text() {
        assert_eq!(eval_binary_op(BinaryOperator::Addition, &num(2.0), &num(3.0)), Ok(num(5.0)));
        assert_eq!(eval_binary_op(BinaryOperator::Addition, &text("n="), &num(3.0)), Ok(text("n=3")));
        assert_eq!(eval_binary_op(BinaryOperator::Addition, &num(1.5), &text("!")), Ok(text("1.5!")));
        assert!(matches!(
            eval_binary_op(BinaryOperator::Addition, &RuntimeValue::Boolean(true), &num(1.0)),
            Err(RuntimeError::TypeError(_))
        ));
    }

    #[test]
    fn division_by_zero_faults() {
        assert_eq!(
            eval_binary_op(BinaryOperator::Division, &num(1.0), &num(0.0)),
            Err(RuntimeError::DivisionByZero)
        );
        assert_eq!(
            eval_binary_op(BinaryOperator::Modulo, &num(1.0), &num(0.0)),
            Err(RuntimeError::DivisionByZero)
        );
        assert_eq!(eval_binary_op(BinaryOperator::Modulo, &num(7.0), &num(3.0)), Ok(num(1.0)));
    }

    #[test]
    fn comparisons() {
        let t = RuntimeValue::Boolean(true);
        let f = RuntimeValue::Boolean(false);
        assert_eq!(eval_binary_op(BinaryOperator::GreaterThan, &num(5.0), &num(3.0)), Ok(t.clone()));
        assert_eq!(eval_binary_op(BinaryOperator::LessThanOrEqual, &num(3.0), &num(3.0)), Ok(t.clone()));
        assert_eq!(eval_binary_op(BinaryOperator::LessThan, &text("abc"), &text("abd")), Ok(t));
        assert_eq!(eval_binary_op(BinaryOperator::GreaterThanOrEqual, &num(f64::NAN), &num(1.0)), Ok(f));
        assert!(eval_binary_op(BinaryOperator::LessThan, &num(1.0), &text("2")).is_err());
    }

    #[test]
    fn describes_callees() {
        let callee = Expr::Member {
            object: Box::new(Expr::Identifier("lista".into(), 0..5)),
            property: "push".into(),
            span: 0..10,
        };
        assert_eq!(describe(&callee), "lista.push");
    }
}
