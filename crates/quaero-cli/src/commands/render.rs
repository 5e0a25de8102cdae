//! Render command implementation.
//!
//! Translates one expression into one or more dialects.

use quaero::{render, Dialect, Filter, FilterParser, FilterResult};

use super::{CommandContext, Result};
use crate::output::format_rendered;

/// Options for the render command.
#[derive(Debug, Default)]
pub struct RenderOptions {
    /// Filter expression.
    pub expression: String,
    /// Requested dialects; empty means the configured ones.
    pub dialects: Vec<Dialect>,
    /// Skip the optimizer.
    pub no_optimize: bool,
}

/// Parses an expression and optimizes it if the context asks for it.
pub fn prepare(ctx: &CommandContext, expression: &str, optimize: bool) -> FilterResult<Filter> {
    let filter = FilterParser::parse(expression)?;
    if optimize {
        Ok(filter.optimize_with(ctx.optimizer))
    } else {
        Ok(filter)
    }
}

/// Renders a filter into each dialect, keeping per-dialect failures.
pub fn render_all(filter: &Filter, dialects: &[Dialect]) -> Vec<(Dialect, FilterResult<String>)> {
    dialects
        .iter()
        .map(|&dialect| (dialect, render(filter, dialect)))
        .collect()
}

/// Executes the render command.
///
/// Output is all-or-nothing: if any requested dialect fails, nothing is
/// printed and the first error is returned.
pub fn execute(ctx: &CommandContext, opts: &RenderOptions) -> Result<()> {
    let dialects = if opts.dialects.is_empty() {
        ctx.dialects.clone()
    } else {
        opts.dialects.clone()
    };

    let filter = prepare(ctx, &opts.expression, ctx.optimize && !opts.no_optimize)?;
    let rendered = render_all(&filter, &dialects)
        .into_iter()
        .map(|(dialect, result)| result.map(|text| (dialect, text)))
        .collect::<FilterResult<Vec<_>>>()?;

    if ctx.json_output {
        let mut output = serde_json::Map::new();
        output.insert("filter".to_string(), filter.to_string().into());
        for (dialect, text) in &rendered {
            output.insert(dialect.as_str().to_string(), text.clone().into());
        }
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if rendered.len() == 1 {
        println!("{}", rendered[0].1);
    } else {
        for (dialect, text) in &rendered {
            println!("{}", format_rendered(*dialect, text, ctx.use_colors));
        }
    }

    Ok(())
}
