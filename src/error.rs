//! Pipeline error taxonomy.
//!
//! Containment policy: an error is confined to the smallest unit possible
//! (one placeholder, one mirror file, one artifact) so a misconfigured data
//! source never takes down an unrelated page. Only `Conversion` raised by the
//! inline module transform is fatal, and only to that single module's build.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the content pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A foreign-format source could not be parsed.
    ///
    /// Fatal for the inline module transform; degrades to "no data"
    /// everywhere else.
    #[error("cannot convert `{path}`: {message}")]
    Conversion { path: PathBuf, message: String },

    /// A referenced data file is missing or unreadable.
    #[error("data file not found: `{0}`")]
    Resolution(PathBuf),

    /// A renderer failed; the placeholder is left unresolved.
    #[error("render failed for `{placeholder}` on `{page}`: {message}")]
    Render {
        page: String,
        placeholder: String,
        message: String,
    },

    /// A required precondition for artifact generation is missing.
    #[error("no site url configured, skipping {artifact}")]
    ArtifactPrecondition { artifact: &'static str },
}

impl PipelineError {
    /// Build a conversion error from any parser failure.
    pub fn conversion(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Conversion {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Build a render error carrying page and placeholder context.
    pub fn render(
        page: impl Into<String>,
        placeholder: impl Into<String>,
        err: impl std::fmt::Display,
    ) -> Self {
        Self::Render {
            page: page.into(),
            placeholder: placeholder.into(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_error_display() {
        let err = PipelineError::conversion("data/faq.yaml", "mapping values are not allowed");
        let display = format!("{err}");
        assert!(display.contains("data/faq.yaml"));
        assert!(display.contains("mapping values"));
    }

    #[test]
    fn test_render_error_carries_context() {
        let err = PipelineError::render("/faq/index.html", "%%FAQ_CONTENT%%", "boom");
        let display = format!("{err}");
        assert!(display.contains("/faq/index.html"));
        assert!(display.contains("%%FAQ_CONTENT%%"));
        assert!(display.contains("boom"));
    }

    #[test]
    fn test_artifact_precondition_display() {
        let err = PipelineError::ArtifactPrecondition {
            artifact: "sitemap.xml",
        };
        assert!(format!("{err}").contains("sitemap.xml"));
    }
}
