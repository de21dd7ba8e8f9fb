use super::ast::{Expression, MethodCall, RelationalOperator};
use super::error::{ParseError, ResolveError};
use super::functions::{FunctionRegistry, FunctionResolver};
use super::token::{TokenKind, Tokenizer};
use super::value::Value;
use crate::event::LogLevel;
use crate::layout::{LayoutCompiler, SimpleLayoutCompiler};
use std::str::FromStr;
use tracing::warn;

/// Recursive-descent parser for condition expressions
///
/// Precedence from loosest to tightest: `or`, `and`, `not`, relational
/// operators, primary expressions. A relational operator takes primary
/// operands on both sides, so comparisons do not chain.
pub struct Parser<'a> {
    tokenizer: Tokenizer<'a>,
    functions: &'a dyn FunctionResolver,
    layouts: &'a dyn LayoutCompiler,
}

impl<'a> Parser<'a> {
    pub fn new(
        input: &'a str,
        functions: &'a dyn FunctionResolver,
        layouts: &'a dyn LayoutCompiler,
    ) -> Result<Self, ParseError> {
        Ok(Self {
            tokenizer: Tokenizer::new(input)?,
            functions,
            layouts,
        })
    }

    /// Parse the whole input as a single expression
    pub fn parse(mut self) -> Result<Expression, ParseError> {
        let expression = self.parse_or()?;
        if !self.tokenizer.is_eof() {
            let token = self.tokenizer.token();
            return Err(ParseError::UnexpectedToken {
                text: token.text.clone(),
                position: token.position,
            });
        }
        Ok(expression)
    }

    /// Parse an expression embedded in a larger template
    ///
    /// Parsing stops at the end of input or at a `}` or `:` outside a string;
    /// the returned offset points at that terminator.
    pub fn parse_embedded(mut self) -> Result<(Expression, usize), ParseError> {
        let expression = self.parse_or()?;
        let token = self.tokenizer.token();
        if !self.tokenizer.is_eof() {
            return Err(ParseError::UnexpectedToken {
                text: token.text.clone(),
                position: token.position,
            });
        }
        Ok((expression, token.position))
    }

    fn parse_or(&mut self) -> Result<Expression, ParseError> {
        let mut expression = self.parse_and()?;
        while self.tokenizer.is_keyword("or") || self.tokenizer.is(TokenKind::Or) {
            self.tokenizer.next_token()?;
            expression = Expression::or(expression, self.parse_and()?);
        }
        Ok(expression)
    }

    fn parse_and(&mut self) -> Result<Expression, ParseError> {
        let mut expression = self.parse_not()?;
        while self.tokenizer.is_keyword("and") || self.tokenizer.is(TokenKind::And) {
            self.tokenizer.next_token()?;
            expression = Expression::and(expression, self.parse_not()?);
        }
        Ok(expression)
    }

    fn parse_not(&mut self) -> Result<Expression, ParseError> {
        if self.tokenizer.is_keyword("not") || self.tokenizer.is(TokenKind::Not) {
            self.tokenizer.next_token()?;
            return Ok(Expression::not(self.parse_not()?));
        }
        self.parse_relation()
    }

    fn parse_relation(&mut self) -> Result<Expression, ParseError> {
        let left = self.parse_primary()?;
        match RelationalOperator::from_token(self.tokenizer.kind()) {
            Some(operator) => {
                self.tokenizer.next_token()?;
                let right = self.parse_primary()?;
                Ok(Expression::relational(left, operator, right))
            }
            None => Ok(left),
        }
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        match self.tokenizer.kind() {
            TokenKind::LeftParen => {
                self.tokenizer.next_token()?;
                let expression = self.parse_or()?;
                self.tokenizer.expect(TokenKind::RightParen)?;
                Ok(expression)
            }
            TokenKind::Minus => {
                self.tokenizer.next_token()?;
                if !self.tokenizer.is_number() {
                    return Err(ParseError::NumberExpected(self.tokenizer.kind()));
                }
                self.parse_number(true)
            }
            TokenKind::Number => self.parse_number(false),
            TokenKind::String => self.parse_string(),
            TokenKind::Keyword => self.parse_keyword(),
            _ => {
                let token = self.tokenizer.token();
                Err(ParseError::UnexpectedToken {
                    text: token.text.clone(),
                    position: token.position,
                })
            }
        }
    }

    /// Numbers with a dot are floats, everything else a 64-bit integer
    fn parse_number(&mut self, negative: bool) -> Result<Expression, ParseError> {
        let text = self.tokenizer.token().text.clone();
        self.tokenizer.next_token()?;

        let invalid = || ParseError::InvalidNumber(text.clone());
        if text.contains('.') {
            let value: f64 = text.parse().map_err(|_| invalid())?;
            Ok(Expression::literal(if negative { -value } else { value }))
        } else {
            let signed = if negative {
                format!("-{}", text)
            } else {
                text.clone()
            };
            let value: i64 = signed.parse().map_err(|_| invalid())?;
            Ok(Expression::literal(value))
        }
    }

    /// String literals are layouts; constant ones fold into plain literals
    fn parse_string(&mut self) -> Result<Expression, ParseError> {
        let template = self.tokenizer.string_value();
        self.tokenizer.next_token()?;

        let layout = self
            .layouts
            .compile(&template)
            .map_err(|source| ParseError::Layout {
                template: template.clone(),
                source,
            })?;

        Ok(match layout.fixed_text() {
            Some(text) => Expression::literal(text),
            None => Expression::LayoutText(layout),
        })
    }

    fn parse_keyword(&mut self) -> Result<Expression, ParseError> {
        let position = self.tokenizer.token().position;
        let keyword = self.tokenizer.eat_keyword()?;

        match keyword.to_ascii_lowercase().as_str() {
            "level" => return Ok(Expression::LevelRef),
            "logger" => return Ok(Expression::LoggerNameRef),
            "message" => return Ok(Expression::MessageRef),
            "exception" => return Ok(Expression::ExceptionRef),
            "true" => return Ok(Expression::literal(true)),
            "false" => return Ok(Expression::literal(false)),
            "null" => return Ok(Expression::literal(Value::Null)),
            "loglevel" => {
                self.tokenizer.expect(TokenKind::Dot)?;
                let name = self.tokenizer.eat_keyword()?;
                let level =
                    LogLevel::from_str(&name).map_err(|_| ParseError::UnknownLevel(name))?;
                return Ok(Expression::literal(level));
            }
            _ => {}
        }

        if self.tokenizer.is(TokenKind::LeftParen) {
            self.tokenizer.next_token()?;
            return self.parse_method(keyword);
        }

        Err(ParseError::UnexpectedToken {
            text: keyword,
            position,
        })
    }

    /// Argument list after `name(`, bound to a function once parsed
    fn parse_method(&mut self, name: String) -> Result<Expression, ParseError> {
        let mut args = Vec::new();
        while !self.tokenizer.is_eof() && !self.tokenizer.is(TokenKind::RightParen) {
            args.push(self.parse_or()?);
            if !self.tokenizer.is(TokenKind::Comma) {
                break;
            }
            self.tokenizer.next_token()?;
        }
        self.tokenizer.expect(TokenKind::RightParen)?;

        let resolved = self
            .functions
            .resolve(&name, args.len())
            .and_then(|found| found.ok_or_else(|| ResolveError::UnknownMethod(name.clone())));

        match resolved {
            Ok(function) => Ok(Expression::MethodCall(MethodCall {
                name,
                args,
                function,
            })),
            Err(source) => {
                warn!("Cannot resolve function '{}': {}", name, source);
                Err(ParseError::CannotResolveFunction { name, source })
            }
        }
    }
}

/// Parse a condition using the standard condition methods and layouts
///
/// `None` input yields `Ok(None)`; empty or whitespace-only text is an error.
pub fn parse_expression(text: Option<&str>) -> Result<Option<Expression>, ParseError> {
    text.map(|text| {
        parse_expression_with(text, FunctionRegistry::standard(), &SimpleLayoutCompiler)
    })
    .transpose()
}

/// Parse a condition with caller-supplied function and layout collaborators
pub fn parse_expression_with(
    text: &str,
    functions: &dyn FunctionResolver,
    layouts: &dyn LayoutCompiler,
) -> Result<Expression, ParseError> {
    Parser::new(text, functions, layouts)?.parse()
}

impl FromStr for Expression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_expression_with(s, FunctionRegistry::standard(), &SimpleLayoutCompiler)
    }
}
