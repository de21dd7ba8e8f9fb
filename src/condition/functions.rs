//! Condition methods callable from expressions, e.g. `contains(message, 'timeout')`

use super::error::{FunctionError, ResolveError};
use super::value::{Value, ValueKind};
use crate::event::LogEvent;
use regex::RegexBuilder;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

pub type FunctionResult = Result<Value, FunctionError>;

type NoArgsFn = dyn Fn(&LogEvent) -> FunctionResult + Send + Sync;
type OneArgFn = dyn Fn(&LogEvent, Value) -> FunctionResult + Send + Sync;
type TwoArgsFn = dyn Fn(&LogEvent, Value, Value) -> FunctionResult + Send + Sync;
type ThreeArgsFn = dyn Fn(&LogEvent, Value, Value, Value) -> FunctionResult + Send + Sync;
type VariadicFn = dyn Fn(Option<&LogEvent>, &[Value]) -> FunctionResult + Send + Sync;

/// Method accepting any argument count within `[min_args, max_args]`
#[derive(Clone)]
pub struct VariadicFunction {
    pub min_args: usize,
    pub max_args: usize,
    /// Whether the event is passed to the implementation
    pub include_event: bool,
    func: Arc<VariadicFn>,
}

impl VariadicFunction {
    pub fn call(&self, event: &LogEvent, args: &[Value]) -> FunctionResult {
        if !(self.min_args..=self.max_args).contains(&args.len()) {
            return Err(FunctionError::new(format!(
                "expected between {} and {} arguments, got {}",
                self.min_args,
                self.max_args,
                args.len()
            )));
        }
        let event = self.include_event.then_some(event);
        (self.func)(event, args)
    }
}

/// Implementation bound to a call site
#[derive(Clone)]
pub enum ConditionFunction {
    NoArgs(Arc<NoArgsFn>),
    OneArg(Arc<OneArgFn>),
    TwoArgs(Arc<TwoArgsFn>),
    ThreeArgs(Arc<ThreeArgsFn>),
    Variadic(VariadicFunction),
}

impl ConditionFunction {
    pub fn no_args(f: impl Fn(&LogEvent) -> FunctionResult + Send + Sync + 'static) -> Self {
        ConditionFunction::NoArgs(Arc::new(f))
    }

    pub fn one_arg(
        f: impl Fn(&LogEvent, Value) -> FunctionResult + Send + Sync + 'static,
    ) -> Self {
        ConditionFunction::OneArg(Arc::new(f))
    }

    pub fn two_args(
        f: impl Fn(&LogEvent, Value, Value) -> FunctionResult + Send + Sync + 'static,
    ) -> Self {
        ConditionFunction::TwoArgs(Arc::new(f))
    }

    pub fn three_args(
        f: impl Fn(&LogEvent, Value, Value, Value) -> FunctionResult + Send + Sync + 'static,
    ) -> Self {
        ConditionFunction::ThreeArgs(Arc::new(f))
    }

    pub fn variadic(
        min_args: usize,
        max_args: usize,
        include_event: bool,
        f: impl Fn(Option<&LogEvent>, &[Value]) -> FunctionResult + Send + Sync + 'static,
    ) -> Self {
        ConditionFunction::Variadic(VariadicFunction {
            min_args,
            max_args,
            include_event,
            func: Arc::new(f),
        })
    }

    /// Inclusive bounds on the number of arguments this binding accepts
    pub fn arity(&self) -> (usize, usize) {
        match self {
            ConditionFunction::NoArgs(_) => (0, 0),
            ConditionFunction::OneArg(_) => (1, 1),
            ConditionFunction::TwoArgs(_) => (2, 2),
            ConditionFunction::ThreeArgs(_) => (3, 3),
            ConditionFunction::Variadic(v) => (v.min_args, v.max_args),
        }
    }

    /// Invoke with already evaluated arguments
    pub fn call(&self, event: &LogEvent, args: Vec<Value>) -> FunctionResult {
        let arity_error = |args: &[Value]| {
            let (min, max) = self.arity();
            FunctionError::new(format!(
                "expected between {} and {} arguments, got {}",
                min,
                max,
                args.len()
            ))
        };

        match self {
            ConditionFunction::NoArgs(f) if args.is_empty() => f(event),
            ConditionFunction::OneArg(f) => match <[Value; 1]>::try_from(args) {
                Ok([a]) => f(event, a),
                Err(args) => Err(arity_error(&args)),
            },
            ConditionFunction::TwoArgs(f) => match <[Value; 2]>::try_from(args) {
                Ok([a, b]) => f(event, a, b),
                Err(args) => Err(arity_error(&args)),
            },
            ConditionFunction::ThreeArgs(f) => match <[Value; 3]>::try_from(args) {
                Ok([a, b, c]) => f(event, a, b, c),
                Err(args) => Err(arity_error(&args)),
            },
            ConditionFunction::Variadic(v) => v.call(event, &args),
            ConditionFunction::NoArgs(_) => Err(arity_error(&args)),
        }
    }
}

impl fmt::Debug for ConditionFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (min, max) = self.arity();
        f.debug_struct("ConditionFunction")
            .field("min_args", &min)
            .field("max_args", &max)
            .finish_non_exhaustive()
    }
}

/// Looks up condition methods by name and argument count
pub trait FunctionResolver: Send + Sync {
    /// `Ok(None)` when no method of that name exists
    fn resolve(
        &self,
        name: &str,
        arg_count: usize,
    ) -> Result<Option<ConditionFunction>, ResolveError>;
}

#[derive(Clone, Default)]
struct Overloads {
    exact: [Option<ConditionFunction>; 4],
    variadic: Option<VariadicFunction>,
}

impl Overloads {
    /// Accepted argument counts as sorted, disjoint inclusive ranges
    fn accepted(&self) -> Vec<(usize, usize)> {
        let mut ranges: Vec<(usize, usize)> = self
            .exact
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_some())
            .map(|(n, _)| (n, n))
            .chain(self.variadic.as_ref().map(|v| (v.min_args, v.max_args)))
            .collect();
        ranges.sort_unstable();

        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
        for (start, end) in ranges {
            match merged.last_mut() {
                Some((_, last_end)) if start <= *last_end + 1 => *last_end = (*last_end).max(end),
                _ => merged.push((start, end)),
            }
        }
        merged
    }

    fn arity_error(&self, name: &str, actual: usize) -> ResolveError {
        match self.accepted().as_slice() {
            &[(min, max)] => ResolveError::ArityMismatch {
                name: name.to_string(),
                min,
                max,
                actual,
            },
            ranges => ResolveError::UnsupportedArity {
                name: name.to_string(),
                accepted: ranges
                    .iter()
                    .map(|&(min, max)| match min == max {
                        true => min.to_string(),
                        false => format!("{}-{}", min, max),
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
                actual,
            },
        }
    }
}

/// Name-keyed registry of condition methods, built once and shared by parsers
///
/// Names are case-insensitive. A name may carry one binding per exact arity
/// (0 to 3 arguments) plus one variable-arity binding.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    methods: HashMap<String, Overloads>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the standard condition methods
    pub fn with_standard_methods() -> Self {
        let mut registry = Self::new();
        register_standard_methods(&mut registry);
        registry
    }

    /// Shared registry of the standard condition methods
    pub fn standard() -> &'static FunctionRegistry {
        static STANDARD: LazyLock<FunctionRegistry> =
            LazyLock::new(FunctionRegistry::with_standard_methods);
        &STANDARD
    }

    /// Register a binding, replacing any earlier one of the same arity kind
    pub fn register(&mut self, name: &str, function: ConditionFunction) -> &mut Self {
        let overloads = self.methods.entry(name.to_ascii_lowercase()).or_default();
        match function {
            ConditionFunction::NoArgs(_) => overloads.exact[0] = Some(function),
            ConditionFunction::OneArg(_) => overloads.exact[1] = Some(function),
            ConditionFunction::TwoArgs(_) => overloads.exact[2] = Some(function),
            ConditionFunction::ThreeArgs(_) => overloads.exact[3] = Some(function),
            ConditionFunction::Variadic(v) => overloads.variadic = Some(v),
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(&name.to_ascii_lowercase())
    }

    /// Registered method names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl FunctionResolver for FunctionRegistry {
    fn resolve(
        &self,
        name: &str,
        arg_count: usize,
    ) -> Result<Option<ConditionFunction>, ResolveError> {
        let Some(overloads) = self.methods.get(&name.to_ascii_lowercase()) else {
            return Ok(None);
        };

        if let Some(Some(function)) = overloads.exact.get(arg_count) {
            return Ok(Some(function.clone()));
        }

        if let Some(variadic) = &overloads.variadic {
            if (variadic.min_args..=variadic.max_args).contains(&arg_count) {
                return Ok(Some(ConditionFunction::Variadic(variadic.clone())));
            }
        }

        Err(overloads.arity_error(name, arg_count))
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("methods", &self.names())
            .finish()
    }
}

fn register_standard_methods(registry: &mut FunctionRegistry) {
    registry
        .register(
            "equals",
            ConditionFunction::two_args(|_, a, b| Ok(Value::Bool(a == b))),
        )
        .register(
            "strequals",
            string_predicate(false, |a, b, ignore_case| {
                if ignore_case {
                    a.to_lowercase() == b.to_lowercase()
                } else {
                    a == b
                }
            }),
        )
        .register(
            "contains",
            string_predicate(true, |haystack, needle, ignore_case| {
                if ignore_case {
                    haystack.to_lowercase().contains(&needle.to_lowercase())
                } else {
                    haystack.contains(needle)
                }
            }),
        )
        .register(
            "starts-with",
            string_predicate(true, |haystack, needle, ignore_case| {
                if ignore_case {
                    haystack.to_lowercase().starts_with(&needle.to_lowercase())
                } else {
                    haystack.starts_with(needle)
                }
            }),
        )
        .register(
            "ends-with",
            string_predicate(true, |haystack, needle, ignore_case| {
                if ignore_case {
                    haystack.to_lowercase().ends_with(&needle.to_lowercase())
                } else {
                    haystack.ends_with(needle)
                }
            }),
        )
        .register(
            "length",
            ConditionFunction::one_arg(|_, text| Ok(Value::from(text.to_text().chars().count()))),
        )
        .register(
            "regex-matches",
            ConditionFunction::variadic(2, 3, false, |_, args| {
                let input = args[0].to_text();
                let pattern = args[1].to_text();
                let options = args.get(2).map(|o| o.to_text()).unwrap_or_default();
                regex_matches(&input, &pattern, &options).map(Value::Bool)
            }),
        );
}

/// Two string arguments plus an optional `ignoreCase` flag
fn string_predicate(
    ignore_case_default: bool,
    predicate: fn(&str, &str, bool) -> bool,
) -> ConditionFunction {
    ConditionFunction::variadic(2, 3, false, move |_, args| {
        let ignore_case = match args.get(2) {
            Some(flag) => flag_value(flag)?,
            None => ignore_case_default,
        };
        Ok(Value::Bool(predicate(
            &args[0].to_text(),
            &args[1].to_text(),
            ignore_case,
        )))
    })
}

fn flag_value(value: &Value) -> Result<bool, FunctionError> {
    value
        .convert_to(ValueKind::Bool)
        .and_then(|v| v.as_bool())
        .ok_or_else(|| FunctionError::new(format!("'{}' is not a valid boolean flag", value)))
}

fn regex_matches(input: &str, pattern: &str, options: &str) -> Result<bool, FunctionError> {
    let mut builder = RegexBuilder::new(pattern);
    for option in options
        .split([',', ' ', '|'])
        .map(str::trim)
        .filter(|o| !o.is_empty())
    {
        match option.to_ascii_lowercase().as_str() {
            "none" => {}
            "ignorecase" => {
                builder.case_insensitive(true);
            }
            "multiline" => {
                builder.multi_line(true);
            }
            "singleline" => {
                builder.dot_matches_new_line(true);
            }
            "ignorepatternwhitespace" => {
                builder.ignore_whitespace(true);
            }
            other => {
                return Err(FunctionError::new(format!(
                    "Unknown regex option '{}'",
                    other
                )));
            }
        }
    }

    let regex = builder
        .build()
        .map_err(|e| FunctionError::with_source(format!("Invalid regex '{}'", pattern), e))?;
    Ok(regex.is_match(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::LogLevel;

    fn event() -> LogEvent {
        LogEvent::new(LogLevel::Info, "app", "hello")
    }

    fn call(name: &str, args: Vec<Value>) -> FunctionResult {
        let function = FunctionRegistry::standard()
            .resolve(name, args.len())
            .unwrap()
            .unwrap_or_else(|| panic!("{} should be registered", name));
        function.call(&event(), args)
    }

    #[test]
    fn test_resolution_prefers_exact_arity() {
        let mut registry = FunctionRegistry::new();
        registry
            .register("f", ConditionFunction::one_arg(|_, _| Ok(Value::from("one"))))
            .register(
                "f",
                ConditionFunction::variadic(0, 5, false, |_, _| Ok(Value::from("many"))),
            );

        let one = registry.resolve("F", 1).unwrap().unwrap();
        assert!(matches!(one, ConditionFunction::OneArg(_)));
        let many = registry.resolve("f", 3).unwrap().unwrap();
        assert!(matches!(many, ConditionFunction::Variadic(_)));
    }

    #[test]
    fn test_adjacent_arities_report_one_range() {
        let mut registry = FunctionRegistry::new();
        registry
            .register("f", ConditionFunction::one_arg(|_, _| Ok(Value::Null)))
            .register(
                "f",
                ConditionFunction::variadic(2, 3, false, |_, _| Ok(Value::Null)),
            );

        let err = registry.resolve("f", 0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Condition method 'f' requires between 1 and 3 parameters, but passed 0."
        );
    }

    #[test]
    fn test_gapped_arities_list_accepted_counts() {
        let mut registry = FunctionRegistry::new();
        registry
            .register("f", ConditionFunction::no_args(|_| Ok(Value::Null)))
            .register("f", ConditionFunction::two_args(|_, _, _| Ok(Value::Null)));

        match registry.resolve("f", 1).unwrap_err() {
            ResolveError::UnsupportedArity {
                accepted, actual, ..
            } => {
                assert_eq!(accepted, "0, 2");
                assert_eq!(actual, 1);
            }
            other => panic!("unexpected error: {}", other),
        }

        registry.register(
            "f",
            ConditionFunction::variadic(4, 6, false, |_, _| Ok(Value::Null)),
        );
        let err = registry.resolve("f", 3).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Condition method 'f' accepts 0, 2, 4-6 parameters, but passed 3."
        );
    }

    #[test]
    fn test_resolution_arity_mismatch() {
        let err = FunctionRegistry::standard()
            .resolve("starts-with", 1)
            .unwrap_err();
        match err {
            ResolveError::ArityMismatch {
                min, max, actual, ..
            } => assert_eq!((min, max, actual), (2, 3, 1)),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(matches!(
            FunctionRegistry::standard().resolve("length", 2),
            Err(ResolveError::ArityMismatch {
                min: 1,
                max: 1,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_name_resolves_to_none() {
        assert!(
            FunctionRegistry::standard()
                .resolve("no-such-method", 0)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_variadic_receives_event_only_when_requested() {
        let with_event = ConditionFunction::variadic(0, 0, true, |event, _| {
            Ok(Value::Bool(event.is_some()))
        });
        let without_event = ConditionFunction::variadic(0, 0, false, |event, _| {
            Ok(Value::Bool(event.is_some()))
        });
        assert_eq!(with_event.call(&event(), vec![]).unwrap(), Value::Bool(true));
        assert_eq!(
            without_event.call(&event(), vec![]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_string_methods() {
        let s = |x: &str| Value::from(x);
        assert_eq!(call("contains", vec![s("foobar"), s("OOBA")]).unwrap(), Value::Bool(true));
        assert_eq!(
            call("contains", vec![s("foobar"), s("OOBA"), Value::Bool(false)]).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(call("starts-with", vec![s("foobar"), s("foo")]).unwrap(), Value::Bool(true));
        assert_eq!(call("ends-with", vec![s("foobar"), s("BAR")]).unwrap(), Value::Bool(true));
        assert_eq!(call("strequals", vec![s("abc"), s("ABC")]).unwrap(), Value::Bool(false));
        assert_eq!(
            call("strequals", vec![s("abc"), s("ABC"), s("true")]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(call("length", vec![s("héllo")]).unwrap(), Value::Int(5));
        assert_eq!(call("length", vec![Value::Null]).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_equals_does_not_promote() {
        assert_eq!(
            call("equals", vec![Value::Int(1), Value::Int(1)]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            call("equals", vec![Value::Int(1), Value::from("1")]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_regex_matches() {
        let s = |x: &str| Value::from(x);
        assert_eq!(
            call("regex-matches", vec![s("Request 42 failed"), s(r"\d+ failed")]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            call("regex-matches", vec![s("ERROR"), s("^error$"), s("IgnoreCase")]).unwrap(),
            Value::Bool(true)
        );
        assert!(call("regex-matches", vec![s("x"), s("(")]).is_err());
        assert!(call("regex-matches", vec![s("x"), s("x"), s("Bogus")]).is_err());
    }

    #[test]
    fn test_invalid_ignore_case_flag() {
        let err = call(
            "contains",
            vec![Value::from("a"), Value::from("a"), Value::from("maybe")],
        )
        .unwrap_err();
        assert!(err.message().contains("maybe"));
    }
}
