//! Condition-based filters deciding whether an event is logged
//!
//! Each filter pairs a condition with the action taken when the condition
//! holds. A [`FilterChain`] asks its filters in order; the first one that
//! does not answer [`FilterResult::Neutral`] decides.
//!
//! # Actions
//!
//! - `neutral` - no decision, ask the next filter
//! - `log` / `ignore` - log or drop the event
//! - `log-final` / `ignore-final` - as above, and stop processing further rules
//!
//! # Examples
//!
//! ```text
//! level < loglevel.Warn and not contains(message, 'payment')   -> ignore
//! logger == 'audit'                                             -> log-final
//! regex-matches(message, '^health ?check')                      -> ignore
//! ```

pub mod action;
pub mod error;
pub mod matcher;

pub use action::FilterResult;
pub use error::FilterParseError;
pub use matcher::{ConditionFilter, FilterChain};
