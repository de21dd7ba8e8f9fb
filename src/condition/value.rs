use super::ast::RelationalOperator;
use super::error::EvalError;
use crate::event::{EventException, LogLevel};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Dynamically typed value produced by evaluating a condition
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Arc<str>),
    Date(NaiveDateTime),
    Level(LogLevel),
    Exception(Arc<EventException>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Date,
    Level,
    Exception,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "Null",
            ValueKind::Bool => "Boolean",
            ValueKind::Int => "Int64",
            ValueKind::Float => "Double",
            ValueKind::String => "String",
            ValueKind::Date => "DateTime",
            ValueKind::Level => "LogLevel",
            ValueKind::Exception => "Exception",
        }
    }

    /// Position in the promotion order; lower ranks are the more general types
    fn rank(self) -> usize {
        match self {
            ValueKind::Date => 0,
            ValueKind::Float => 1,
            ValueKind::Int => 2,
            ValueKind::Bool => 3,
            ValueKind::Level => 4,
            ValueKind::String => 5,
            ValueKind::Null | ValueKind::Exception => usize::MAX,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Date(_) => ValueKind::Date,
            Value::Level(_) => ValueKind::Level,
            Value::Exception(_) => ValueKind::Exception,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Invariant text form; null renders as the empty string
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Value::String(s) => Cow::Borrowed(&**s),
            Value::Null => Cow::Borrowed(""),
            other => Cow::Owned(other.to_string()),
        }
    }

    /// Convert this value to another kind, if the conversion is defined
    pub fn convert_to(&self, target: ValueKind) -> Option<Value> {
        if self.kind() == target {
            return Some(self.clone());
        }

        let converted = match (self, target) {
            (Value::String(s), ValueKind::Date) => parse_date(s).map(Value::Date),
            (Value::Int(i), ValueKind::Float) => Some(Value::Float(*i as f64)),
            (Value::Bool(b), ValueKind::Float) => Some(Value::Float(if *b { 1.0 } else { 0.0 })),
            (Value::Level(l), ValueKind::Float) => Some(Value::Float(f64::from(l.ordinal()))),
            (Value::String(s), ValueKind::Float) => s.trim().parse().ok().map(Value::Float),
            (Value::Float(x), ValueKind::Int) => float_to_int(*x).map(Value::Int),
            (Value::Bool(b), ValueKind::Int) => Some(Value::Int(i64::from(*b))),
            (Value::Level(l), ValueKind::Int) => Some(Value::Int(i64::from(l.ordinal()))),
            (Value::String(s), ValueKind::Int) => s.trim().parse().ok().map(Value::Int),
            (Value::Int(i), ValueKind::Bool) => Some(Value::Bool(*i != 0)),
            (Value::Float(x), ValueKind::Bool) => Some(Value::Bool(*x != 0.0)),
            (Value::String(s), ValueKind::Bool) => parse_bool(s).map(Value::Bool),
            (Value::String(s), ValueKind::Level) => s.trim().parse().ok().map(Value::Level),
            (Value::Int(i), ValueKind::Level) => LogLevel::from_ordinal(*i).map(Value::Level),
            (Value::Null, _) => None,
            (other, ValueKind::String) => {
                debug!("using string comparison for {}", other.kind());
                Some(Value::from(other.to_string()))
            }
            _ => None,
        };

        if converted.is_none() {
            debug!("conversion of {:?} to {} failed", self, target);
        }
        converted
    }
}

/// Float text with at least one fractional digit, so it reads back as a float
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_string()
    } else if x == f64::INFINITY {
        "Infinity".to_string()
    } else if x == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if x.fract() == 0.0 {
        format!("{x:.1}")
    } else {
        x.to_string()
    }
}

fn float_to_int(x: f64) -> Option<i64> {
    if x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 {
        Some(x as i64)
    } else {
        None
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::String(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
            Value::Level(l) => write!(f, "{}", l),
            Value::Exception(e) => write!(f, "{}", e),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        i64::try_from(n).map_or(Value::Float(n as f64), Value::Int)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<LogLevel> for Value {
    fn from(level: LogLevel) -> Self {
        Value::Level(level)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(d: NaiveDateTime) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Apply a relational operator to two values
///
/// Null orders before every other value and equals only null. Values of
/// different kinds are first promoted to a common kind.
pub fn compare(
    left: &Value,
    right: &Value,
    operator: RelationalOperator,
) -> Result<bool, EvalError> {
    let ordering = match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => {
            let (left, right) = promote(left, right)?;
            return compare_same_kind(&left, &right, operator);
        }
    };
    Ok(operator.holds(ordering))
}

/// Bring two non-null values to a common kind
///
/// The value whose kind ranks later in the promotion order is converted
/// first; if that fails the other direction is tried.
pub fn promote<'a>(
    left: &'a Value,
    right: &'a Value,
) -> Result<(Cow<'a, Value>, Cow<'a, Value>), EvalError> {
    let (left_kind, right_kind) = (left.kind(), right.kind());
    if left_kind == right_kind {
        return Ok((Cow::Borrowed(left), Cow::Borrowed(right)));
    }

    let convert_right = || {
        right
            .convert_to(left_kind)
            .map(|r| (Cow::Borrowed(left), Cow::Owned(r)))
    };
    let convert_left = || {
        left.convert_to(right_kind)
            .map(|l| (Cow::Owned(l), Cow::Borrowed(right)))
    };

    let promoted = if left_kind.rank() < right_kind.rank() {
        convert_right().or_else(convert_left)
    } else {
        convert_left().or_else(convert_right)
    };

    promoted.ok_or(EvalError::NoCommonType {
        left: left_kind.name(),
        right: right_kind.name(),
    })
}

fn compare_same_kind(
    left: &Value,
    right: &Value,
    operator: RelationalOperator,
) -> Result<bool, EvalError> {
    let ordering = match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Float(a), Value::Float(b)) => compare_floats(*a, *b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Date(a), Value::Date(b)) => a.cmp(b),
        (Value::Level(a), Value::Level(b)) => a.cmp(b),
        (Value::Exception(a), Value::Exception(b)) => {
            let same = Arc::ptr_eq(a, b) || a == b;
            return match operator {
                RelationalOperator::Equal => Ok(same),
                RelationalOperator::NotEqual => Ok(!same),
                _ => Err(EvalError::NotComparable {
                    kind: ValueKind::Exception.name(),
                    operator,
                }),
            };
        }
        _ => {
            return Err(EvalError::NoCommonType {
                left: left.kind().name(),
                right: right.kind().name(),
            });
        }
    };
    Ok(operator.holds(ordering))
}

/// NaN orders before every number and equals itself
fn compare_floats(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}
