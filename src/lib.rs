pub mod cli;
pub mod condition;
pub mod config;
pub mod event;
pub mod filter;
pub mod layout;

use anyhow::Context;
use colored::{ColoredString, Colorize};
use std::path::Path;
use tracing_subscriber::EnvFilter;

pub use cli::{ColorMode, Commands, LevelArg, cli_parse};
pub use condition::{
    EvalError, Expression, FunctionRegistry, ParseError, Value, evaluate, parse_expression,
};
pub use config::{ConfigError, FilterConfig, FilterRule, load_config};
pub use event::{EventException, LogEvent, LogLevel, read_events};
pub use filter::{ConditionFilter, FilterChain, FilterResult};
pub use layout::{Layout, LayoutCompiler, SimpleLayoutCompiler};

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = if verbose > 0 {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn apply_color_mode(mode: ColorMode) {
    match mode {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }
}

fn parse_condition(text: &str) -> anyhow::Result<Expression> {
    text.parse::<Expression>()
        .with_context(|| format!("Invalid condition '{}'", text))
}

fn colored_level(level: LogLevel) -> ColoredString {
    let name = format!("{:<5}", level.name().to_uppercase());
    match level {
        LogLevel::Trace | LogLevel::Debug => name.dimmed(),
        LogLevel::Info => name.green(),
        LogLevel::Warn => name.yellow(),
        LogLevel::Error | LogLevel::Fatal => name.red().bold(),
        LogLevel::Off => name.normal(),
    }
}

fn colored_value(value: &Value) -> ColoredString {
    match value {
        Value::Bool(true) => value.to_string().green().bold(),
        Value::Bool(false) => value.to_string().red().bold(),
        Value::Null => "null".dimmed(),
        Value::String(s) => format!("'{}'", s).cyan(),
        other => other.to_string().normal(),
    }
}

fn print_event(event: &LogEvent) {
    println!(
        "{} {} {} {}",
        event.timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string().dimmed(),
        colored_level(event.level),
        event.logger_name.blue(),
        event.message
    );
    if let Some(exception) = &event.exception {
        println!("    {}", exception.to_string().red());
    }
}

fn build_event(
    level: LevelArg,
    logger: &str,
    message: &str,
    exception: Option<&str>,
    properties: &[(String, String)],
    scope_properties: &[(String, String)],
) -> LogEvent {
    let mut event = LogEvent::new(level.into(), logger, message);
    if let Some(text) = exception {
        event = event.with_exception(EventException::from_text(text));
    }
    for (key, value) in properties {
        event = event.with_property(key.as_str(), value.as_str());
    }
    for (key, value) in scope_properties {
        event = event.with_scope_property(key.as_str(), value.as_str());
    }
    event
}

/// Chain for the `filter` command; the config file is only read without `--condition`
fn filter_chain(
    condition: Option<&str>,
    config_path: Option<&Path>,
) -> anyhow::Result<FilterChain> {
    if let Some(text) = condition {
        return Ok(FilterChain::new(FilterResult::Ignore)
            .with_filter(ConditionFilter::new(parse_condition(text)?, FilterResult::Log)));
    }

    let filter_config = load_config(config_path).context("Failed to load config")?;
    if let Some(path) = config_path {
        tracing::debug!(
            path = %path.display(),
            filters = filter_config.filters.len(),
            "config loaded"
        );
    }
    filter_config
        .build_chain(FunctionRegistry::standard(), &SimpleLayoutCompiler)
        .context("Failed to build filter chain")
}

pub fn run() -> anyhow::Result<()> {
    let cli = cli_parse();
    init_tracing(cli.verbose);
    apply_color_mode(cli.color);

    match &cli.command {
        Commands::Parse { condition } => {
            let expression = parse_condition(condition)?;
            println!("{}", expression);
        }
        Commands::Eval {
            condition,
            level,
            logger,
            message,
            exception,
            properties,
            scope_properties,
        } => {
            let expression = parse_condition(condition)?;
            let event = build_event(
                *level,
                logger,
                message,
                exception.as_deref(),
                properties,
                scope_properties,
            );
            let value = expression
                .evaluate(&event)
                .with_context(|| format!("Failed to evaluate '{}'", expression))?;
            println!("{}", colored_value(&value));
        }
        Commands::Filter {
            file,
            condition,
            json,
        } => {
            let chain = filter_chain(condition.as_deref(), cli.config.as_deref())?;

            let events = read_events(file)
                .with_context(|| format!("Failed to read events from '{}'", file.display()))?;

            let mut kept = 0usize;
            for event in chain.apply(&events) {
                kept += 1;
                if *json {
                    println!(
                        "{}",
                        serde_json::to_string(event).context("Failed to serialize event")?
                    );
                } else {
                    print_event(event);
                }
            }

            if !*json {
                println!(
                    "\n{} {} of {} events",
                    "Matched".bold(),
                    kept.to_string().green().bold(),
                    events.len()
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_event_from_arguments() {
        let event = build_event(
            LevelArg::Warn,
            "app.db",
            "slow query",
            Some("TimeoutException: took too long"),
            &[("ms".to_string(), "1200".to_string())],
            &[("filterlevel".to_string(), "Error".to_string())],
        );
        assert_eq!(event.level, LogLevel::Warn);
        let exception = event.exception.as_ref().unwrap();
        assert_eq!(exception.kind, "TimeoutException");
        assert_eq!(event.property_text("ms").as_deref(), Some("1200"));
        assert_eq!(
            event.scope_property_text("filterlevel").as_deref(),
            Some("Error")
        );
    }

    #[test]
    fn test_scope_property_drives_condition() {
        let event = build_event(
            LevelArg::Warn,
            "app",
            "",
            None,
            &[],
            &[("filterlevel".to_string(), "Error".to_string())],
        );
        let expression = parse_condition("level >= '${scopeproperty:filterlevel}'").unwrap();
        assert_eq!(expression.evaluate(&event).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_inline_condition_skips_config_file() {
        let missing = Path::new("/nonexistent/filters.toml");

        let chain = filter_chain(Some("level >= loglevel.Warn"), Some(missing)).unwrap();
        assert!(chain.should_log(&LogEvent::new(LogLevel::Error, "app", "boom")));
        assert!(!chain.should_log(&LogEvent::new(LogLevel::Info, "app", "ok")));

        let err = filter_chain(None, Some(missing)).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
        assert!(filter_chain(None, None).is_ok());
    }
}
