//! Injection engine: applies matching rules to a document's markup.
//!
//! Fault containment is the point here: a missing data file, a bad data
//! parse or a throwing renderer affects exactly one placeholder and is
//! logged; the rest of the page always renders.

use crate::{
    config::SiteConfig,
    error::PipelineError,
    inject::{context::RenderContext, registry::InjectionRegistry, render},
    log,
};
use serde_json::Value as JsonValue;
use std::{fs, path::Path};

/// Apply every matching rule to `markup`, in registry order.
///
/// Each successful render replaces the first literal occurrence of the
/// rule's placeholder. Placeholders whose rule fails, and tokens belonging
/// to unrelated rules, are left untouched for later passes.
pub fn inject(
    markup: &str,
    requested_path: &str,
    registry: &InjectionRegistry,
    config: &SiteConfig,
) -> String {
    let ctx = RenderContext::new(config);
    let mut output = markup.to_string();

    for rule in registry.find_matches(requested_path) {
        let data = rule.data.as_deref().and_then(|p| load_data(p, config));

        match render::render(
            &rule.renderer,
            data.as_ref(),
            &ctx,
            config,
            requested_path,
            &rule.placeholder,
        ) {
            Ok(fragment) => substitute_first(&mut output, &rule.placeholder, &fragment),
            // Contained: this one placeholder stays unresolved
            Err(e) => log!("inject"; "{e}"),
        }
    }

    output
}

/// Replace the first literal occurrence of `placeholder` in place.
///
/// Tokens are plain substrings, not patterns. A fragment containing another
/// rule's placeholder text would self-match; registries must be authored so
/// fragments never reproduce a later rule's token.
fn substitute_first(markup: &mut String, placeholder: &str, fragment: &str) {
    if let Some(pos) = markup.find(placeholder) {
        markup.replace_range(pos..pos + placeholder.len(), fragment);
    }
}

// ============================================================================
// Data Loading
// ============================================================================

/// Load a rule's data file, degrading to `None` on any failure.
///
/// Missing file → warning; parse failure → error. Both leave the renderer
/// with no data instead of aborting the page. Strict JSON and permissive
/// JSON5 are selected by extension.
fn load_data(data_path: &Path, config: &SiteConfig) -> Option<JsonValue> {
    let resolved = config.resolve(data_path);

    if !resolved.exists() {
        log!("warn"; "{}", PipelineError::Resolution(resolved));
        return None;
    }

    let Ok(text) = fs::read_to_string(&resolved) else {
        log!("warn"; "{}", PipelineError::Resolution(resolved));
        return None;
    };

    let parsed = if resolved.extension().is_some_and(|ext| ext == "json5") {
        crate::transform::parse(&resolved.to_string_lossy(), &text)
    } else {
        serde_json::from_str(&text).map_err(|e| PipelineError::conversion(&resolved, e))
    };

    match parsed {
        Ok(value) => Some(value),
        Err(e) => {
            log!("error"; "{e}");
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
