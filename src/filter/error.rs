use thiserror::Error;

/// Errors that can occur when parsing filter settings
#[derive(Debug, Error)]
pub enum FilterParseError {
    #[error(
        "Unknown filter action: '{0}'. Valid actions are: neutral, log, ignore, log-final, ignore-final"
    )]
    UnknownAction(String),
}
