//! Command implementations for the quaero CLI.

pub mod completions;
pub mod config;
pub mod matching;
pub mod parse;
pub mod render;
pub mod repl;

use std::env;

use quaero::{Dialect, OptimizerOptions};

use crate::cli::Cli;
use config::Config;

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Lexing, parsing or rendering failed.
    #[error("filter error: {0}")]
    Filter(#[from] quaero::FilterError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Input was not the expected JSON shape.
    #[error("invalid input: {0}")]
    Input(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Context for command execution, combining flags and the config file.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Whether to output JSON.
    pub json_output: bool,
    /// Whether to use colors.
    pub use_colors: bool,
    /// Whether to be quiet (errors only).
    pub quiet: bool,
    /// REPL prompt.
    pub prompt: String,
    /// Whether to optimize before rendering.
    pub optimize: bool,
    /// Options passed to the optimizer.
    pub optimizer: OptimizerOptions,
    /// Dialects rendered when none are given on the command line.
    pub dialects: Vec<Dialect>,
}

impl CommandContext {
    /// Creates a command context from CLI arguments and loaded config.
    ///
    /// Colors are off if `--no-color` is given, `NO_COLOR` is set, or the
    /// config disables them.
    pub fn new(cli: &Cli, config: &Config) -> Self {
        let no_color_env = env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Self {
            json_output: cli.json,
            use_colors: !cli.no_color && !no_color_env && config.output.color.unwrap_or(true),
            quiet: cli.quiet,
            prompt: config.prompt(),
            optimize: config.render.optimize.unwrap_or(true),
            optimizer: OptimizerOptions {
                collapse_duplicates: config.render.collapse_duplicates.unwrap_or(false),
            },
            dialects: config.dialects(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_context_defaults() {
        let original = env::var_os("NO_COLOR");
        env::remove_var("NO_COLOR");

        let cli = Cli::parse_from(["quaero"]);
        let ctx = CommandContext::new(&cli, &Config::default());

        if let Some(val) = original {
            env::set_var("NO_COLOR", val);
        }

        assert!(ctx.use_colors);
        assert!(ctx.optimize);
        assert!(!ctx.optimizer.collapse_duplicates);
        assert_eq!(ctx.prompt, "query> ");
        assert_eq!(ctx.dialects, Dialect::ALL.to_vec());
    }

    #[test]
    #[serial]
    fn test_colors_disabled_by_flag_env_or_config() {
        let original = env::var_os("NO_COLOR");
        env::remove_var("NO_COLOR");

        let cli = Cli::parse_from(["quaero", "--no-color"]);
        let by_flag = CommandContext::new(&cli, &Config::default());

        let mut config = Config::default();
        config.output.color = Some(false);
        let cli = Cli::parse_from(["quaero"]);
        let by_config = CommandContext::new(&cli, &config);

        env::set_var("NO_COLOR", "1");
        let by_env = CommandContext::new(&cli, &Config::default());

        match original {
            Some(val) => env::set_var("NO_COLOR", val),
            None => env::remove_var("NO_COLOR"),
        }

        assert!(!by_flag.use_colors);
        assert!(!by_config.use_colors);
        assert!(!by_env.use_colors);
    }
}
