//! Layout templates used inside condition string literals
//!
//! A layout is a string with `${...}` placeholders that are rendered against
//! a log event, e.g. `'${logger}: ${message}'`. Conditions only need two
//! things from a layout: render it for an event, and know whether it is
//! constant so it can be folded into a plain string literal.
//!
//! # Renderers
//!
//! - `${level}`, `${logger}`, `${message}`, `${exception}`
//! - `${event-properties:NAME}` / `${event-property:item=NAME}` - event property
//! - `${scopeproperty:NAME}` / `${mdlc:item=NAME}` - scope property
//! - `${literal:text=VALUE}` - constant text

use crate::event::LogEvent;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Layout renderer is missing a closing '}}' in '{0}'")]
    Unterminated(String),

    #[error("Unknown layout renderer: '{0}'")]
    UnknownRenderer(String),

    #[error("Layout renderer '{renderer}' requires option '{option}'")]
    MissingOption {
        renderer: String,
        option: &'static str,
    },
}

/// A compiled layout, shared read-only by every evaluation of a condition
pub trait Layout: fmt::Debug + Send + Sync {
    /// Render this layout for the given event
    fn render(&self, event: &LogEvent) -> String;

    /// The constant text of this layout, when it has no placeholders
    fn fixed_text(&self) -> Option<&str>;

    /// The template this layout was compiled from
    fn template(&self) -> &str;
}

/// Compiles layout templates found in condition string literals
pub trait LayoutCompiler: Send + Sync {
    fn compile(&self, template: &str) -> Result<Arc<dyn Layout>, LayoutError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LayoutPart {
    Literal(String),
    Level,
    Logger,
    Message,
    Exception,
    EventProperty(String),
    ScopeProperty(String),
}

/// Layout made of literal text and the built-in renderers
#[derive(Debug, Clone)]
pub struct SimpleLayout {
    template: String,
    parts: Vec<LayoutPart>,
    fixed: Option<String>,
}

impl SimpleLayout {
    pub fn parse(template: &str) -> Result<Self, LayoutError> {
        let mut parts = Vec::new();
        let mut rest = template;

        while let Some(start) = rest.find("${") {
            if start > 0 {
                push_literal(&mut parts, &rest[..start]);
            }
            let after = &rest[start + 2..];
            let end = after
                .find('}')
                .ok_or_else(|| LayoutError::Unterminated(template.to_string()))?;
            parts.push(parse_renderer(&after[..end])?);
            rest = &after[end + 1..];
        }
        if !rest.is_empty() {
            push_literal(&mut parts, rest);
        }

        let fixed = if parts.iter().all(|p| matches!(p, LayoutPart::Literal(_))) {
            Some(
                parts
                    .iter()
                    .filter_map(|p| match p {
                        LayoutPart::Literal(text) => Some(text.as_str()),
                        _ => None,
                    })
                    .collect(),
            )
        } else {
            None
        };

        Ok(Self {
            template: template.to_string(),
            parts,
            fixed,
        })
    }
}

impl Layout for SimpleLayout {
    fn render(&self, event: &LogEvent) -> String {
        if let Some(fixed) = &self.fixed {
            return fixed.clone();
        }

        let mut out = String::new();
        for part in &self.parts {
            match part {
                LayoutPart::Literal(text) => out.push_str(text),
                LayoutPart::Level => out.push_str(event.level.name()),
                LayoutPart::Logger => out.push_str(&event.logger_name),
                LayoutPart::Message => out.push_str(&event.message),
                LayoutPart::Exception => {
                    if let Some(exception) = &event.exception {
                        out.push_str(&exception.to_string());
                    }
                }
                LayoutPart::EventProperty(name) => {
                    out.push_str(&event.property_text(name).unwrap_or_default())
                }
                LayoutPart::ScopeProperty(name) => {
                    out.push_str(&event.scope_property_text(name).unwrap_or_default())
                }
            }
        }
        out
    }

    fn fixed_text(&self) -> Option<&str> {
        self.fixed.as_deref()
    }

    fn template(&self) -> &str {
        &self.template
    }
}

/// Compiler for [`SimpleLayout`] templates
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleLayoutCompiler;

impl LayoutCompiler for SimpleLayoutCompiler {
    fn compile(&self, template: &str) -> Result<Arc<dyn Layout>, LayoutError> {
        Ok(Arc::new(SimpleLayout::parse(template)?))
    }
}

fn push_literal(parts: &mut Vec<LayoutPart>, text: &str) {
    if let Some(LayoutPart::Literal(prev)) = parts.last_mut() {
        prev.push_str(text);
    } else {
        parts.push(LayoutPart::Literal(text.to_string()));
    }
}

fn parse_renderer(body: &str) -> Result<LayoutPart, LayoutError> {
    let (name, options) = match body.split_once(':') {
        Some((name, options)) => (name.trim(), Some(options.trim())),
        None => (body.trim(), None),
    };

    match name.to_ascii_lowercase().as_str() {
        "level" => Ok(LayoutPart::Level),
        "logger" => Ok(LayoutPart::Logger),
        "message" => Ok(LayoutPart::Message),
        "exception" => Ok(LayoutPart::Exception),
        "event-properties" | "event-property" => Ok(LayoutPart::EventProperty(
            required_option(name, options, "item")?,
        )),
        "scopeproperty" | "mdlc" => Ok(LayoutPart::ScopeProperty(required_option(
            name, options, "item",
        )?)),
        "literal" => Ok(LayoutPart::Literal(required_option(name, options, "text")?)),
        _ => Err(LayoutError::UnknownRenderer(name.to_string())),
    }
}

/// Reads `key=value`, or a bare value standing for the default option
fn required_option(
    renderer: &str,
    options: Option<&str>,
    key: &'static str,
) -> Result<String, LayoutError> {
    let missing = || LayoutError::MissingOption {
        renderer: renderer.to_string(),
        option: key,
    };
    let options = options.filter(|o| !o.is_empty()).ok_or_else(missing)?;

    match options.split_once('=') {
        Some((k, v)) if k.trim().eq_ignore_ascii_case(key) => Ok(v.trim().to_string()),
        Some(_) => Err(missing()),
        None => Ok(options.to_string()),
    }
}
