use super::error::FilterParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decision a filter makes about a log event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterResult {
    /// No decision; later filters or the default action decide
    #[default]
    Neutral,
    Log,
    Ignore,
    /// Log the event and skip any remaining rules
    LogFinal,
    /// Drop the event and skip any remaining rules
    IgnoreFinal,
}

impl FromStr for FilterResult {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "neutral" => Ok(FilterResult::Neutral),
            "log" => Ok(FilterResult::Log),
            "ignore" => Ok(FilterResult::Ignore),
            "log-final" | "logfinal" => Ok(FilterResult::LogFinal),
            "ignore-final" | "ignorefinal" => Ok(FilterResult::IgnoreFinal),
            _ => Err(FilterParseError::UnknownAction(s.to_string())),
        }
    }
}

impl FilterResult {
    /// Get the canonical name of this action
    pub fn canonical_name(&self) -> &'static str {
        match self {
            FilterResult::Neutral => "neutral",
            FilterResult::Log => "log",
            FilterResult::Ignore => "ignore",
            FilterResult::LogFinal => "log-final",
            FilterResult::IgnoreFinal => "ignore-final",
        }
    }

    /// Whether an event with this result is written; neutral events are
    pub fn allows_logging(&self) -> bool {
        !matches!(self, FilterResult::Ignore | FilterResult::IgnoreFinal)
    }
}

impl fmt::Display for FilterResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        assert_eq!("log".parse::<FilterResult>().unwrap(), FilterResult::Log);
        assert_eq!(
            "Ignore-Final".parse::<FilterResult>().unwrap(),
            FilterResult::IgnoreFinal
        );
        assert_eq!(
            "LogFinal".parse::<FilterResult>().unwrap(),
            FilterResult::LogFinal
        );
        assert_eq!(
            "log_final".parse::<FilterResult>().unwrap(),
            FilterResult::LogFinal
        );
        assert!(matches!(
            "drop".parse::<FilterResult>(),
            Err(FilterParseError::UnknownAction(_))
        ));
    }

    #[test]
    fn test_canonical_name_round_trips() {
        for action in [
            FilterResult::Neutral,
            FilterResult::Log,
            FilterResult::Ignore,
            FilterResult::LogFinal,
            FilterResult::IgnoreFinal,
        ] {
            assert_eq!(action.canonical_name().parse::<FilterResult>().unwrap(), action);
        }
    }

    #[test]
    fn test_logging_decision() {
        assert!(FilterResult::Neutral.allows_logging());
        assert!(FilterResult::LogFinal.allows_logging());
        assert!(!FilterResult::Ignore.allows_logging());
        assert!(!FilterResult::IgnoreFinal.allows_logging());
    }
}
