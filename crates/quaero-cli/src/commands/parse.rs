//! Parse command implementation.

use super::render::prepare;
use super::{CommandContext, Result};

/// Executes the parse command: prints the canonical form, or the tree as JSON.
pub fn execute(ctx: &CommandContext, expression: &str, optimize: bool) -> Result<()> {
    let filter = prepare(ctx, expression, optimize)?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&filter)?);
    } else {
        println!("{}", filter);
    }

    Ok(())
}
