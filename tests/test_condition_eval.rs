use chrono::NaiveDate;
use log_conditions::condition::{
    ConditionFunction, EvalError, Expression, FunctionError, FunctionRegistry, Value, ValueKind,
    parse_expression_with,
};
use log_conditions::event::{EventException, LogEvent, LogLevel};
use log_conditions::layout::SimpleLayoutCompiler;
use std::sync::Arc;

fn event() -> LogEvent {
    LogEvent::new(LogLevel::Info, "app.db", "connection timeout after 30s")
}

fn eval_with(text: &str, event: &LogEvent) -> Result<Value, EvalError> {
    let expression: Expression = text.parse().expect("condition should parse");
    expression.evaluate(event)
}

fn eval(text: &str) -> Value {
    eval_with(text, &event()).expect("evaluation should succeed")
}

fn is_true(text: &str) -> bool {
    match eval(text) {
        Value::Bool(b) => b,
        other => panic!("'{}' evaluated to non-boolean {:?}", text, other),
    }
}

#[test]
fn test_null_orders_before_everything() {
    let non_null = ["0", "-1", "1.5", "''", "'abc'", "true", "false", "loglevel.Trace"];
    for x in non_null {
        assert!(is_true(&format!("null < {}", x)), "null < {}", x);
        assert!(!is_true(&format!("{} < null", x)), "{} < null", x);
        assert!(!is_true(&format!("null > {}", x)), "null > {}", x);
        assert!(is_true(&format!("{} > null", x)), "{} > null", x);
        assert!(!is_true(&format!("null == {}", x)), "null == {}", x);
        assert!(is_true(&format!("{} != null", x)), "{} != null", x);
    }
    assert!(is_true("null == null"));
    assert!(!is_true("null != null"));
    assert!(is_true("null <= null"));
}

#[test]
fn test_type_promotion() {
    assert!(is_true("'42' == 42"));
    assert!(is_true("42 == '42'"));
    assert!(is_true("true == 1"));
    assert!(is_true("false == 0"));
    assert!(is_true("1 == 1.0"));
    assert!(is_true("2 > 1.5"));
    assert!(is_true("'1e3' == 1000.0"));
    assert!(is_true("'TRUE' == true"));
    assert!(is_true("loglevel.Warn == 3"));
    assert!(is_true("loglevel.Warn > 'Info'"));
}

#[test]
fn test_unparseable_string_compares_as_text() {
    assert!(is_true("'abc' != 42"));
    assert!(is_true("'abc' > 42"));
    assert!(is_true("'yes' != true"));
}

#[test]
fn test_numeric_function_result_promotes() {
    let mut registry = FunctionRegistry::with_standard_methods();
    registry.register(
        "todouble",
        ConditionFunction::one_arg(|_, value| {
            value
                .convert_to(ValueKind::Float)
                .ok_or_else(|| FunctionError::new(format!("'{}' is not a number", value)))
        }),
    );

    let expression =
        parse_expression_with("todouble(3) == 3", &registry, &SimpleLayoutCompiler).unwrap();
    assert_eq!(expression.evaluate(&event()).unwrap(), Value::Bool(true));

    let failing =
        parse_expression_with("todouble('x') == 3", &registry, &SimpleLayoutCompiler).unwrap();
    match failing.evaluate(&event()).unwrap_err() {
        EvalError::Call { name, source } => {
            assert_eq!(name, "todouble");
            assert_eq!(source.message(), "'x' is not a number");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_dates_compare_chronologically() {
    let mut registry = FunctionRegistry::new();
    registry.register(
        "date",
        ConditionFunction::no_args(|_| {
            let date = NaiveDate::from_ymd_opt(2024, 3, 1)
                .and_then(|d| d.and_hms_opt(12, 0, 0))
                .ok_or_else(|| FunctionError::new("invalid date"))?;
            Ok(Value::from(date))
        }),
    );
    let check = |text: &str| {
        parse_expression_with(text, &registry, &SimpleLayoutCompiler)
            .unwrap()
            .matches(&event())
            .unwrap()
    };

    assert!(check("date() > '2024-02-29'"));
    assert!(check("date() == '2024-03-01 12:00:00'"));
    assert!(check("date() < '2024-03-01T12:00:01'"));
    // not a date, so compared as text
    assert!(check("date() != 'tomorrow'"));
}

#[test]
fn test_contains_scenario() {
    assert!(is_true("contains('foobar','ooba')"));
    assert!(is_true("contains(message, 'TIMEOUT')"));
    assert!(!is_true("contains(message, 'TIMEOUT', false)"));
}

#[test]
fn test_scope_property_threshold_scenario() {
    let condition = "level >= '${scopeproperty:filterlevel}'";
    for (level, expected) in [
        (LogLevel::Debug, false),
        (LogLevel::Info, false),
        (LogLevel::Warn, true),
        (LogLevel::Fatal, true),
    ] {
        let event = LogEvent::new(level, "app", "msg").with_scope_property("filterlevel", "Warn");
        assert_eq!(
            eval_with(condition, &event).unwrap(),
            Value::Bool(expected),
            "{:?}",
            level
        );
    }
}

#[test]
fn test_exception_presence_scenario() {
    let without = event();
    let with = event().with_exception(EventException::new("TimeoutException", "30s elapsed"));

    assert_eq!(
        eval_with("exception != null", &without).unwrap(),
        Value::Bool(false)
    );
    assert_eq!(
        eval_with("exception != null", &with).unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        eval_with("exception == 'TimeoutException: 30s elapsed'", &with).unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn test_incompatible_types_fail() {
    let with = event().with_exception(EventException::new("IoError", "reset"));
    match eval_with("exception == 1", &with).unwrap_err() {
        EvalError::NoCommonType { left, right } => {
            assert_eq!((left, right), ("Exception", "Int64"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(matches!(
        eval_with("exception < exception", &with),
        Err(EvalError::NotComparable { .. })
    ));
    assert_eq!(
        eval_with("exception == exception", &with).unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn test_logical_operators_require_booleans() {
    assert!(matches!(
        eval_with("message and true", &event()),
        Err(EvalError::NotBoolean { kind: "String", .. })
    ));
    assert!(matches!(
        eval_with("not 1", &event()),
        Err(EvalError::NotBoolean { .. })
    ));
    // decided by the left operand, the right one is never evaluated
    assert_eq!(
        eval_with("false and message", &event()).unwrap(),
        Value::Bool(false)
    );
    assert_eq!(
        eval_with("true or message", &event()).unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn test_references_evaluate_to_event_fields() {
    assert_eq!(eval("level"), Value::Level(LogLevel::Info));
    assert_eq!(eval("logger"), Value::from("app.db"));
    assert_eq!(eval("message"), Value::from("connection timeout after 30s"));
    assert_eq!(eval("exception"), Value::Null);
    assert_eq!(eval("'${logger}|${level}'"), Value::from("app.db|Info"));
}

#[test]
fn test_shared_expression_across_threads() {
    let expression: Arc<Expression> = Arc::new(
        "level >= loglevel.Warn and contains(message, 'disk')"
            .parse()
            .unwrap(),
    );

    std::thread::scope(|scope| {
        for (i, level) in LogLevel::ALL.into_iter().enumerate() {
            let expression = Arc::clone(&expression);
            scope.spawn(move || {
                let event = LogEvent::new(level, "worker", format!("disk {} full", i));
                let matched = expression.matches(&event).unwrap();
                assert_eq!(matched, level >= LogLevel::Warn);
            });
        }
    });
}
