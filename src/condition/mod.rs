//! Condition expressions evaluated against log events
//!
//! A condition is a small boolean expression, parsed once and evaluated for
//! every candidate event. Parsing resolves method names through a
//! [`FunctionResolver`] and compiles string literals as layouts, so the
//! resulting [`Expression`] tree needs nothing else at evaluation time.
//!
//! # Syntax
//!
//! ```text
//! level >= loglevel.Warn                  # level comparison
//! level >= 'Warn'                         # string promoted to a level
//! contains(message, 'timeout')            # condition method
//! logger == 'db' and not (exception == null)
//! starts-with(logger, 'app.') || length(message) > 100
//! ```
//!
//! # Operators
//!
//! - `or` / `||`, then `and` / `&&`, then `not` / `!` (loosest to tightest)
//! - `==` / `=`, `!=` / `<>`, `<`, `>`, `<=`, `>=` (do not chain)
//!
//! # Comparisons
//!
//! Operands of different types are promoted to a common type before
//! comparing. `null` orders before every other value.

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod token;
pub mod value;

pub use ast::{Expression, MethodCall, RelationalOperator};
pub use error::{EvalError, FunctionError, ParseError, ResolveError};
pub use evaluator::evaluate;
pub use functions::{
    ConditionFunction, FunctionRegistry, FunctionResolver, FunctionResult, VariadicFunction,
};
pub use parser::{Parser, parse_expression, parse_expression_with};
pub use token::{Token, TokenKind, Tokenizer};
pub use value::{Value, ValueKind, compare, promote};
