//! Injection registry and page matching.
//!
//! The registry is the ordered rule list from `[[inject]]`, read-only after
//! construction. Matching is spelling-insensitive across exactly the three
//! ways the dev server and the production build can name the same document:
//!
//! | target page          | also matches         |
//! |----------------------|----------------------|
//! | `/about/index.html`  | `/about/`            |
//! | `/about/`            | `/about/index.html`  |
//! | `/index.html`        | `/`                  |
//!
//! No other normalization is applied.

use crate::config::{InjectRule, SiteConfig};
use std::path::PathBuf;

/// Ordered, immutable set of injection rules.
#[derive(Debug, Clone, Default)]
pub struct InjectionRegistry {
    rules: Vec<InjectRule>,
}

impl InjectionRegistry {
    /// Build a registry from an explicit rule list.
    pub fn new(rules: Vec<InjectRule>) -> Self {
        Self { rules }
    }

    /// Build a registry from the loaded configuration.
    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(config.inject.clone())
    }

    /// Number of rules in the registry.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the registry holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All rules matching the requested document, in declaration order.
    pub fn find_matches<'a>(
        &'a self,
        requested_path: &'a str,
    ) -> impl Iterator<Item = &'a InjectRule> {
        self.rules
            .iter()
            .filter(move |rule| page_matches(requested_path, &rule.page))
    }

    /// Data files referenced by any rule (for the watcher), root-resolved.
    pub fn data_paths(&self, config: &SiteConfig) -> Vec<PathBuf> {
        self.rules
            .iter()
            .filter_map(|rule| rule.data.as_deref())
            .map(|p| config.resolve(p))
            .collect()
    }

    /// Template files referenced by any rule (for the watcher), root-resolved.
    pub fn template_paths(&self, config: &SiteConfig) -> Vec<PathBuf> {
        self.rules
            .iter()
            .filter_map(|rule| match &rule.renderer {
                crate::config::RendererSpec::Template { template } => Some(config.resolve(template)),
                crate::config::RendererSpec::JsonLd { .. } => None,
            })
            .collect()
    }
}

// ============================================================================
// Matching
// ============================================================================

/// Three-way spelling equivalence between a requested path and a target page.
pub fn page_matches(requested: &str, target: &str) -> bool {
    requested == target
        || with_index(target).is_some_and(|t| requested == t)
        || as_directory(target).is_some_and(|t| requested == t)
}

/// `/about/` → `/about/index.html`
fn with_index(page: &str) -> Option<String> {
    page.strip_suffix('/').map(|base| format!("{base}/index.html"))
}

/// `/about/index.html` → `/about/`
fn as_directory(page: &str) -> Option<String> {
    page.strip_suffix("/index.html").map(|base| format!("{base}/"))
}

// ============================================================================
// Tests
// ============================================================================
