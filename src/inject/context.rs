//! Render context: capabilities handed to every renderer.
//!
//! Constructed fresh per document, stateless. Currently exposes a single
//! capability: resolving an image reference under the source tree to a
//! root-relative URL with a placeholder fallback.

use crate::config::SiteConfig;
use std::path::PathBuf;

/// Capability bag passed to renderers.
#[derive(Debug, Clone)]
pub struct RenderContext {
    source_root: PathBuf,
}

impl RenderContext {
    /// Build a context for the current document.
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            source_root: config.source_dir(),
        }
    }

    /// Resolve an image reference to a root-relative URL.
    ///
    /// `target` and `fallback` are paths relative to the source tree.
    /// When the target file does not exist on disk the fallback asset is
    /// referenced instead, so a missing image degrades to a placeholder
    /// rather than a broken link.
    pub fn resolve_image(&self, target: &str, fallback: &str) -> String {
        let target = target.trim_start_matches('/');
        let fallback = fallback.trim_start_matches('/');

        if self.source_root.join(target).is_file() {
            format!("/{target}")
        } else {
            format!("/{fallback}")
        }
    }

}
