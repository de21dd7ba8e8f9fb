use super::functions::ConditionFunction;
use super::token::TokenKind;
use super::value::{Value, format_float};
use crate::layout::Layout;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationalOperator {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
}

impl RelationalOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            RelationalOperator::Equal => "==",
            RelationalOperator::NotEqual => "!=",
            RelationalOperator::Less => "<",
            RelationalOperator::Greater => ">",
            RelationalOperator::LessOrEqual => "<=",
            RelationalOperator::GreaterOrEqual => ">=",
        }
    }

    pub(crate) fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::EqualTo => Some(RelationalOperator::Equal),
            TokenKind::NotEqual => Some(RelationalOperator::NotEqual),
            TokenKind::Less => Some(RelationalOperator::Less),
            TokenKind::Greater => Some(RelationalOperator::Greater),
            TokenKind::LessOrEqual => Some(RelationalOperator::LessOrEqual),
            TokenKind::GreaterOrEqual => Some(RelationalOperator::GreaterOrEqual),
            _ => None,
        }
    }

    /// Whether an ordering between the operands satisfies this operator
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            RelationalOperator::Equal => ordering == Ordering::Equal,
            RelationalOperator::NotEqual => ordering != Ordering::Equal,
            RelationalOperator::Less => ordering == Ordering::Less,
            RelationalOperator::Greater => ordering == Ordering::Greater,
            RelationalOperator::LessOrEqual => ordering != Ordering::Greater,
            RelationalOperator::GreaterOrEqual => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for RelationalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A call site bound to its implementation at parse time
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub name: String,
    pub args: Vec<Expression>,
    pub function: ConditionFunction,
}

/// Parsed condition expression
///
/// Trees are immutable once built and hold no reference to the parser, so a
/// single tree can be evaluated from many threads at once.
#[derive(Debug, Clone)]
pub enum Expression {
    Literal(Value),
    /// String literal with placeholders, rendered for every event
    LayoutText(Arc<dyn Layout>),
    LevelRef,
    LoggerNameRef,
    MessageRef,
    ExceptionRef,
    MethodCall(MethodCall),
    Not(Box<Expression>),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Relational {
        left: Box<Expression>,
        right: Box<Expression>,
        operator: RelationalOperator,
    },
}

impl Expression {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn not(inner: Expression) -> Self {
        Expression::Not(Box::new(inner))
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::Or(Box::new(left), Box::new(right))
    }

    pub fn relational(left: Expression, operator: RelationalOperator, right: Expression) -> Self {
        Expression::Relational {
            left: Box::new(left),
            right: Box::new(right),
            operator,
        }
    }
}

/// Structural equality; layouts compare by template and calls by name and arguments
impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        use Expression::*;
        match (self, other) {
            (Literal(a), Literal(b)) => a == b,
            (LayoutText(a), LayoutText(b)) => a.template() == b.template(),
            (LevelRef, LevelRef)
            | (LoggerNameRef, LoggerNameRef)
            | (MessageRef, MessageRef)
            | (ExceptionRef, ExceptionRef) => true,
            (MethodCall(a), MethodCall(b)) => a.name == b.name && a.args == b.args,
            (Not(a), Not(b)) => a == b,
            (And(a1, a2), And(b1, b2)) | (Or(a1, a2), Or(b1, b2)) => a1 == b1 && a2 == b2,
            (
                Relational {
                    left: a1,
                    right: a2,
                    operator: op_a,
                },
                Relational {
                    left: b1,
                    right: b2,
                    operator: op_b,
                },
            ) => op_a == op_b && a1 == b1 && a2 == b2,
            _ => false,
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    write!(f, "'{}'", text.replace('\'', "''"))
}

/// Canonical text form; parsing it again gives an equal tree
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(value) => match value {
                Value::Null => f.write_str("null"),
                Value::String(s) => write_quoted(f, s),
                Value::Float(x) => f.write_str(&format_float(*x)),
                Value::Level(level) => write!(f, "loglevel.{}", level),
                other => write!(f, "{}", other),
            },
            Expression::LayoutText(layout) => write_quoted(f, layout.template()),
            Expression::LevelRef => f.write_str("level"),
            Expression::LoggerNameRef => f.write_str("logger"),
            Expression::MessageRef => f.write_str("message"),
            Expression::ExceptionRef => f.write_str("exception"),
            Expression::MethodCall(call) => {
                write!(f, "{}(", call.name)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Expression::Not(inner) => write!(f, "(not {})", inner),
            Expression::And(left, right) => write!(f, "({} and {})", left, right),
            Expression::Or(left, right) => write!(f, "({} or {})", left, right),
            Expression::Relational {
                left,
                right,
                operator,
            } => write!(f, "({} {} {})", left, operator, right),
        }
    }
}
