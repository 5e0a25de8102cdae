//! Interactive shell.
//!
//! Each input line is parsed, optimized and printed in every configured
//! dialect. Errors never end the session.

use std::io::{self, BufRead, Write};

use super::render::{prepare, render_all};
use super::{CommandContext, Result};
use crate::output::{format_error, format_filter_error, format_rendered};

/// Lines that end the session.
const EXIT_COMMANDS: [&str; 2] = ["exit", "quit"];

/// Translates one line of input into the lines to print.
///
/// Returns an empty list for blank input.
pub fn evaluate_line(ctx: &CommandContext, line: &str) -> Vec<String> {
    if line.trim().is_empty() {
        return Vec::new();
    }

    let filter = match prepare(ctx, line, ctx.optimize) {
        Ok(filter) => filter,
        Err(err) => {
            tracing::debug!(error = %err, "rejected input");
            return format_filter_error(&err, ctx.prompt.chars().count(), ctx.use_colors);
        }
    };

    render_all(&filter, &ctx.dialects)
        .into_iter()
        .map(|(dialect, result)| match result {
            Ok(text) => format_rendered(dialect, &text, ctx.use_colors),
            Err(err) => format!(
                "{}: {}",
                dialect.label(),
                format_error(&err.to_string(), ctx.use_colors)
            ),
        })
        .collect()
}

/// Runs the read-eval-print loop until end of input or an exit command.
pub fn run<R: BufRead, W: Write>(ctx: &CommandContext, input: R, mut output: W) -> Result<()> {
    write!(output, "{}", ctx.prompt)?;
    output.flush()?;

    for line in input.lines() {
        let line = line?;
        if EXIT_COMMANDS.contains(&line.trim()) {
            break;
        }

        let printed = evaluate_line(ctx, &line);
        for text in &printed {
            writeln!(output, "{}", text)?;
        }
        if !printed.is_empty() {
            writeln!(output)?;
        }

        write!(output, "{}", ctx.prompt)?;
        output.flush()?;
    }

    writeln!(output)?;
    Ok(())
}

/// Executes the repl command on stdin and stdout.
pub fn execute(ctx: &CommandContext) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run(ctx, stdin.lock(), stdout.lock())
}
