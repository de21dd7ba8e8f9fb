use super::ast::RelationalOperator;
use super::token::TokenKind;
use crate::layout::LayoutError;
use thiserror::Error;

/// Errors raised while tokenizing or parsing a condition
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Expected token of type: {expected}, got {actual} ({text}).")]
    ExpectedToken {
        expected: TokenKind,
        actual: TokenKind,
        text: String,
        position: usize,
    },

    #[error("Unexpected token: {text}")]
    UnexpectedToken { text: String, position: usize },

    #[error("String literal is missing a closing quote character.")]
    UnterminatedString { position: usize },

    #[error("Cannot read past end of stream.")]
    PastEndOfInput,

    #[error("Expected '{expected}' but got '{found}'")]
    IncompleteOperator {
        expected: &'static str,
        found: char,
        position: usize,
    },

    #[error("Invalid punctuation: {found}")]
    InvalidPunctuation { found: char, position: usize },

    #[error("Invalid token: {found:?}")]
    InvalidToken { found: char, position: usize },

    #[error("Identifier expected")]
    IdentifierExpected { position: usize },

    #[error("Number expected, got {0}")]
    NumberExpected(TokenKind),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Unknown log level: {0}")]
    UnknownLevel(String),

    #[error("Invalid layout in string literal '{template}'")]
    Layout {
        template: String,
        #[source]
        source: LayoutError,
    },

    #[error("Cannot resolve function '{name}'")]
    CannotResolveFunction {
        name: String,
        #[source]
        source: ResolveError,
    },
}

/// Errors a function resolver reports for a call site
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Unknown condition method '{0}'")]
    UnknownMethod(String),

    #[error(
        "Condition method '{name}' requires between {min} and {max} parameters, but passed {actual}."
    )]
    ArityMismatch {
        name: String,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("Condition method '{name}' accepts {accepted} parameters, but passed {actual}.")]
    UnsupportedArity {
        name: String,
        /// Accepted counts such as `0, 2-3`
        accepted: String,
        actual: usize,
    },

    #[error("Condition method '{name}' cannot be bound: {reason}")]
    Binding { name: String, reason: String },
}

/// Failure reported by a condition method implementation
#[derive(Debug, Error)]
#[error("{message}")]
pub struct FunctionError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl FunctionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised while evaluating a parsed condition against an event
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Expected a boolean value in '{expression}', got {kind}")]
    NotBoolean {
        kind: &'static str,
        expression: String,
    },

    #[error("Cannot find common type for '{left}' and '{right}'.")]
    NoCommonType {
        left: &'static str,
        right: &'static str,
    },

    #[error("Values of type '{kind}' do not support the '{operator}' operator")]
    NotComparable {
        kind: &'static str,
        operator: RelationalOperator,
    },

    #[error("Condition method '{name}' failed: {source}")]
    Call {
        name: String,
        #[source]
        source: FunctionError,
    },
}
