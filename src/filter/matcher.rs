use super::action::FilterResult;
use crate::condition::{Expression, Value};
use crate::event::LogEvent;
use tracing::warn;

/// Filter applying `action` to events matching `condition`
#[derive(Debug, Clone)]
pub struct ConditionFilter {
    pub condition: Expression,
    pub action: FilterResult,
}

impl ConditionFilter {
    pub fn new(condition: Expression, action: FilterResult) -> Self {
        Self { condition, action }
    }

    /// The action when the condition is `true`, otherwise neutral
    ///
    /// A condition that fails to evaluate is logged and counts as not matching.
    pub fn check(&self, event: &LogEvent) -> FilterResult {
        match self.condition.evaluate(event) {
            Ok(Value::Bool(true)) => self.action,
            Ok(_) => FilterResult::Neutral,
            Err(e) => {
                warn!(
                    condition = %self.condition,
                    error = %e,
                    "Exception during filter evaluation"
                );
                FilterResult::Neutral
            }
        }
    }
}

/// Ordered list of filters with a fallback decision
#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    pub filters: Vec<ConditionFilter>,
    /// Result when no filter decides
    pub default_action: FilterResult,
}

impl FilterChain {
    pub fn new(default_action: FilterResult) -> Self {
        Self {
            filters: Vec::new(),
            default_action,
        }
    }

    pub fn with_filter(mut self, filter: ConditionFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// First non-neutral filter result, else the default action
    pub fn decide(&self, event: &LogEvent) -> FilterResult {
        self.filters
            .iter()
            .map(|filter| filter.check(event))
            .find(|result| *result != FilterResult::Neutral)
            .unwrap_or(self.default_action)
    }

    pub fn should_log(&self, event: &LogEvent) -> bool {
        self.decide(event).allows_logging()
    }

    /// Events the chain lets through, in input order
    pub fn apply<'a>(&'a self, events: &'a [LogEvent]) -> impl Iterator<Item = &'a LogEvent> + 'a {
        events.iter().filter(move |event| self.should_log(event))
    }
}
