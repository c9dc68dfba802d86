//! Inline format transform: JSON5 sources as ES modules.
//!
//! Unlike the mirror cache, this transform never touches disk: a `.json5`
//! source is parsed in memory and re-emitted as a module whose default
//! export is the parsed value. Everything else is declined and passes
//! through to the host untouched.

use crate::error::PipelineError;
use std::path::PathBuf;

/// Extension handled by the inline transform.
const INLINE_EXTENSION: &str = ".json5";

/// Transform a foreign-inline source into an ES module body.
///
/// Returns `None` for sources the transform does not apply to. A parse
/// failure is fatal to that module's build and carries the offending
/// source id plus the parser's own message.
pub fn transform(source_id: &str, source_text: &str) -> Option<Result<String, PipelineError>> {
    if !source_id.ends_with(INLINE_EXTENSION) {
        return None;
    }

    Some(emit_module(source_id, source_text))
}

fn emit_module(source_id: &str, source_text: &str) -> Result<String, PipelineError> {
    let value = parse(source_id, source_text)?;
    let json = serde_json::to_string(&value)
        .map_err(|e| PipelineError::conversion(source_id, e))?;

    Ok(format!("export default {json};\n"))
}

/// Parse permissive JSON5 text (trailing commas, comments, unquoted keys).
pub fn parse(source_id: &str, source_text: &str) -> Result<serde_json::Value, PipelineError> {
    json5::from_str(source_text)
        .map_err(|e| PipelineError::conversion(PathBuf::from(source_id), e))
}

// ============================================================================
// Tests
// ============================================================================
