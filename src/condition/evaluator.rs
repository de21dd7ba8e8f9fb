use super::ast::{Expression, MethodCall};
use super::error::EvalError;
use super::value::{Value, compare};
use crate::event::LogEvent;

/// Evaluate a parsed condition against a single event
///
/// Evaluation never mutates the tree. `and` and `or` skip their right
/// operand once the result is decided.
pub fn evaluate(expression: &Expression, event: &LogEvent) -> Result<Value, EvalError> {
    match expression {
        Expression::Literal(value) => Ok(value.clone()),
        Expression::LayoutText(layout) => Ok(Value::from(layout.render(event))),
        Expression::LevelRef => Ok(Value::Level(event.level)),
        Expression::LoggerNameRef => Ok(Value::from(event.logger_name.as_str())),
        Expression::MessageRef => Ok(Value::from(event.message.as_str())),
        Expression::ExceptionRef => Ok(event
            .exception
            .as_ref()
            .map_or(Value::Null, |e| Value::Exception(e.clone()))),
        Expression::MethodCall(call) => evaluate_call(call, event),
        Expression::Not(inner) => Ok(Value::Bool(!evaluate_bool(inner, event)?)),
        Expression::And(left, right) => {
            let result = evaluate_bool(left, event)? && evaluate_bool(right, event)?;
            Ok(Value::Bool(result))
        }
        Expression::Or(left, right) => {
            let result = evaluate_bool(left, event)? || evaluate_bool(right, event)?;
            Ok(Value::Bool(result))
        }
        Expression::Relational {
            left,
            right,
            operator,
        } => {
            let left = evaluate(left, event)?;
            let right = evaluate(right, event)?;
            compare(&left, &right, *operator).map(Value::Bool)
        }
    }
}

fn evaluate_bool(expression: &Expression, event: &LogEvent) -> Result<bool, EvalError> {
    let value = evaluate(expression, event)?;
    value.as_bool().ok_or_else(|| EvalError::NotBoolean {
        kind: value.kind().name(),
        expression: expression.to_string(),
    })
}

fn evaluate_call(call: &MethodCall, event: &LogEvent) -> Result<Value, EvalError> {
    let args = call
        .args
        .iter()
        .map(|arg| evaluate(arg, event))
        .collect::<Result<Vec<_>, _>>()?;

    call.function
        .call(event, args)
        .map_err(|source| EvalError::Call {
            name: call.name.clone(),
            source,
        })
}

impl Expression {
    pub fn evaluate(&self, event: &LogEvent) -> Result<Value, EvalError> {
        evaluate(self, event)
    }

    /// Evaluate and require a boolean result
    pub fn matches(&self, event: &LogEvent) -> Result<bool, EvalError> {
        evaluate_bool(self, event)
    }
}
