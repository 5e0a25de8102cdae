use clap::Parser;
use std::process::ExitCode;
use tracing::Level;

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands, ConfigCommands};
use commands::config::{load_config, Config};
use commands::{CommandContext, CommandError};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                let error_json = serde_json::json!({
                    "error": {
                        "code": error_code(&e),
                        "message": e.to_string(),
                    }
                });
                match serde_json::to_string_pretty(&error_json) {
                    Ok(text) => eprintln!("{text}"),
                    Err(_) => eprintln!("Error: {e}"),
                }
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::from(exit_status(&e))
        }
    }
}

/// Installs the stderr log subscriber at the level the flags ask for.
fn init_tracing(cli: &Cli) {
    tracing_subscriber::fmt()
        .with_max_level(log_level(cli))
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .with_target(false)
        .init();
}

fn log_level(cli: &Cli) -> Level {
    if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::WARN
    }
}

fn run(cli: &Cli) -> commands::Result<()> {
    // These never read the config file, so a broken file can still be repaired.
    match &cli.command {
        Some(Commands::Config { command }) => {
            let ctx = CommandContext::new(cli, &Config::default());
            return dispatch_config(&ctx, command.as_ref());
        }
        Some(Commands::Completions { shell }) => {
            return commands::completions::execute(shell).map_err(CommandError::Io);
        }
        _ => {}
    }

    let config = load_config()?;
    let ctx = CommandContext::new(cli, &config);
    tracing::debug!(?ctx, "starting");

    match &cli.command {
        None | Some(Commands::Repl) => commands::repl::execute(&ctx),
        Some(Commands::Render {
            expression,
            dialect,
            no_optimize,
        }) => {
            let opts = commands::render::RenderOptions {
                expression: expression.clone(),
                dialects: dialect.iter().map(|&d| d.into()).collect(),
                no_optimize: *no_optimize,
            };
            commands::render::execute(&ctx, &opts)
        }
        Some(Commands::Parse {
            expression,
            optimize,
        }) => commands::parse::execute(&ctx, expression, *optimize),
        Some(Commands::Match { expression, input }) => {
            commands::matching::execute(&ctx, expression, input.as_deref())
        }
        // Already handled before loading the config file
        Some(Commands::Config { .. }) | Some(Commands::Completions { .. }) => Ok(()),
    }
}

fn dispatch_config(
    ctx: &CommandContext,
    command: Option<&ConfigCommands>,
) -> commands::Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::execute_show(ctx),
        Some(ConfigCommands::Init { force }) => commands::config::execute_init(ctx, *force),
        Some(ConfigCommands::Set { key, value }) => {
            let opts = commands::config::ConfigSetOptions {
                key: key.clone(),
                value: value.clone(),
            };
            commands::config::execute_set(ctx, &opts)
        }
        Some(ConfigCommands::Path) => commands::config::execute_path(ctx),
    }
}

/// Returns the error code string for JSON output.
fn error_code(e: &CommandError) -> &'static str {
    match e {
        CommandError::Filter(quaero::FilterError::Lex { .. })
        | CommandError::Filter(quaero::FilterError::Parse { .. }) => "SYNTAX_ERROR",
        CommandError::Filter(quaero::FilterError::Construction { .. }) => "INVALID_FILTER",
        CommandError::Filter(quaero::FilterError::Unsupported { .. }) => "UNSUPPORTED",
        CommandError::Config(_) => "CONFIG_ERROR",
        CommandError::Input(_) => "INPUT_ERROR",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
    }
}

/// Returns the process exit status for an error.
fn exit_status(e: &CommandError) -> u8 {
    match e {
        CommandError::Filter(_) | CommandError::Input(_) | CommandError::Json(_) => 1,
        CommandError::Io(_) => 3,
        CommandError::Config(_) => 5,
    }
}
