use crate::condition::{FunctionResolver, ParseError, parse_expression_with};
use crate::filter::{ConditionFilter, FilterChain, FilterResult};
use crate::layout::LayoutCompiler;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid condition in filter #{index} '{condition}': {source}")]
    Condition {
        index: usize,
        condition: String,
        #[source]
        source: ParseError,
    },
}

/// Filter rules loaded from a TOML file
///
/// ```toml
/// default_action = "neutral"
///
/// [[filters]]
/// condition = "level < loglevel.Warn and not contains(message, 'payment')"
/// action = "ignore"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Result when no filter decides
    pub default_action: FilterResult,
    pub filters: Vec<FilterRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    pub condition: String,
    pub action: FilterResult,
}

impl FilterConfig {
    /// Parse every condition once and build the filter chain
    ///
    /// The first condition that fails to parse aborts the build.
    pub fn build_chain(
        &self,
        functions: &dyn FunctionResolver,
        layouts: &dyn LayoutCompiler,
    ) -> Result<FilterChain, ConfigError> {
        let mut chain = FilterChain::new(self.default_action);
        for (index, rule) in self.filters.iter().enumerate() {
            let condition =
                parse_expression_with(&rule.condition, functions, layouts).map_err(|source| {
                    ConfigError::Condition {
                        index,
                        condition: rule.condition.clone(),
                        source,
                    }
                })?;
            debug!(index, condition = %condition, action = %rule.action, "filter loaded");
            chain = chain.with_filter(ConditionFilter::new(condition, rule.action));
        }
        Ok(chain)
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FilterConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(default_config().clone())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<FilterConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    toml::from_str::<FilterConfig>(&raw).map_err(|source| ConfigError::Parse {
        path: path_display,
        source,
    })
}

pub fn default_config() -> &'static FilterConfig {
    static DEFAULT_CONFIG: LazyLock<FilterConfig> = LazyLock::new(FilterConfig::default);
    &DEFAULT_CONFIG
}
