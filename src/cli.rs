mod level;

use clap::{Parser, Subcommand, ValueEnum};
pub use level::LevelArg;
use std::path::PathBuf;

/// Parse, evaluate and apply log filter conditions
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML file with filter rules
    #[arg(long, global = true, env = "LOG_CONDITIONS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase diagnostic output (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// When to use colored output
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a condition and print its canonical form
    Parse {
        /// Condition text, e.g. "level >= 'Warn' and contains(message, 'timeout')"
        condition: String,
    },
    /// Evaluate a condition against an event built from the arguments
    Eval {
        condition: String,

        /// Event level
        #[arg(short, long, value_enum, default_value_t = LevelArg::Info)]
        level: LevelArg,

        /// Logger name
        #[arg(long, default_value = "")]
        logger: String,

        /// Event message
        #[arg(short, long, default_value = "")]
        message: String,

        /// Exception text in "Type: message" form
        #[arg(long)]
        exception: Option<String>,

        /// Event property as key=value (repeatable)
        #[arg(short, long = "property", value_parser = parse_key_value)]
        properties: Vec<(String, String)>,

        /// Scope property as key=value (repeatable)
        #[arg(long = "scope-property", value_parser = parse_key_value)]
        scope_properties: Vec<(String, String)>,
    },
    /// Print the events of a JSON-lines file that pass the filters
    Filter {
        /// JSON-lines file with one event per line
        file: PathBuf,

        /// Keep only events matching this condition instead of the configured rules
        #[arg(short, long)]
        condition: Option<String>,

        /// Print surviving events as JSON lines
        #[arg(long)]
        json: bool,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
