use super::level::LogLevel;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Exception attached to a log event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventException {
    /// Exception type name (e.g., "TimeoutException")
    #[serde(rename = "type", default = "default_exception_type")]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

fn default_exception_type() -> String {
    "Exception".to_string()
}

impl EventException {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Parse "Type: message" text; text without a type prefix gets the generic type
    pub fn from_text(text: &str) -> Self {
        match text.split_once(": ") {
            Some((kind, message)) if !kind.is_empty() && !kind.contains(' ') => {
                Self::new(kind, message)
            }
            _ => Self::new(default_exception_type(), text),
        }
    }
}

impl fmt::Display for EventException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// A single log event as seen by conditions and layouts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub level: LogLevel,
    /// Name of the logger that produced the event (e.g., "app.db")
    #[serde(rename = "logger", default)]
    pub logger_name: String,
    /// Formatted message
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<Arc<EventException>>,
    #[serde(default = "Local::now")]
    pub timestamp: DateTime<Local>,
    /// Properties attached to this event
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, JsonValue>,
    /// Properties of the logical scope the event was written in
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scope_properties: BTreeMap<String, JsonValue>,
}

impl LogEvent {
    pub fn new(level: LogLevel, logger_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            logger_name: logger_name.into(),
            message: message.into(),
            exception: None,
            timestamp: Local::now(),
            properties: BTreeMap::new(),
            scope_properties: BTreeMap::new(),
        }
    }

    pub fn with_exception(mut self, exception: EventException) -> Self {
        self.exception = Some(Arc::new(exception));
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_scope_property(
        mut self,
        name: impl Into<String>,
        value: impl Into<JsonValue>,
    ) -> Self {
        self.scope_properties.insert(name.into(), value.into());
        self
    }

    /// Text form of an event property, if present
    pub fn property_text(&self, name: &str) -> Option<String> {
        self.properties.get(name).map(json_text)
    }

    /// Text form of a scope property, if present
    pub fn scope_property_text(&self, name: &str) -> Option<String> {
        self.scope_properties.get(name).map(json_text)
    }
}

fn json_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_from_text() {
        let ex = EventException::from_text("TimeoutException: request timed out");
        assert_eq!(ex.kind, "TimeoutException");
        assert_eq!(ex.message, "request timed out");

        let ex = EventException::from_text("something broke: badly");
        assert_eq!(ex.kind, "Exception");
        assert_eq!(ex.message, "something broke: badly");
    }

    #[test]
    fn test_property_text() {
        let event = LogEvent::new(LogLevel::Info, "app", "hello")
            .with_property("user", "alice")
            .with_property("attempt", 3)
            .with_scope_property("filterlevel", "Warn");

        assert_eq!(event.property_text("user").as_deref(), Some("alice"));
        assert_eq!(event.property_text("attempt").as_deref(), Some("3"));
        assert_eq!(event.property_text("missing"), None);
        assert_eq!(
            event.scope_property_text("filterlevel").as_deref(),
            Some("Warn")
        );
    }
}
