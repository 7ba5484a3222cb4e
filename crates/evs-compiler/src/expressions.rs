use evs_core::{EventScriptError, Expression};
use rhai::Engine;

use crate::context::GenerationContext;

/// Compiles an opaque formula into a target-code fragment. Pure with
/// respect to the context: generation reads it, never mutates it.
/// The formula is validated as a self-contained expression so a
/// malformed one degrades its own instruction instead of corrupting
/// the emitted blob.
pub fn compile_expression(
    engine: &Engine,
    expression: &Expression,
    _context: &GenerationContext,
) -> Result<String, EventScriptError> {
    let source = expression.plain_string().trim();
    if source.is_empty() {
        return Err(EventScriptError::new(
            "EXPR_EMPTY",
            "Expression is empty.",
        ));
    }

    engine.compile_expression(source).map_err(|error| {
        EventScriptError::new(
            "EXPR_COMPILE_ERROR",
            format!("Expression \"{}\" does not compile: {}.", source, error),
        )
    })?;

    Ok(format!("({source})"))
}
