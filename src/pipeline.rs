//! Host-facing pipeline seam.
//!
//! The pieces of this crate plug into a generic bundler/dev-server through
//! five hooks, all bundled on [`ContentPipeline`]:
//!
//! | hook               | host analog                | backed by            |
//! |--------------------|----------------------------|----------------------|
//! | `transform_module` | module transform           | [`crate::transform`] |
//! | `resolve_module`   | module resolution redirect | [`crate::mirror`]    |
//! | `transform_html`   | HTML entry transform       | [`crate::inject`]    |
//! | `on_change`        | file-watch routing         | [`InvalidationDecision`] |
//! | `finalize`         | bundle finalization        | [`crate::generator`] |
//!
//! The in-repo `build`, `serve` and `watch` drivers are the host adapter;
//! they never reach around this seam into the components directly for
//! per-document work.

use crate::{
    config::SiteConfig,
    error::PipelineError,
    inject::{self, InjectionRegistry, TokenTable},
    log, mirror, transform,
};
use anyhow::Result;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

// ============================================================================
// Invalidation Decision
// ============================================================================

/// What the host should do about a changed file.
///
/// Explicit result type instead of implicit side effects: the adapter
/// interprets the flags, the classification logic stays testable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvalidationDecision {
    /// Re-run the format mirror synchronously before any reload signal.
    pub regenerate_mirror: bool,
    /// Push a full reload to the development session.
    pub force_reload: bool,
    /// Suppress the host's default fine-grained update routing.
    pub suppress_default: bool,
}

impl InvalidationDecision {
    /// Nothing to do for this change.
    pub const fn ignore() -> Self {
        Self {
            regenerate_mirror: false,
            force_reload: false,
            suppress_default: false,
        }
    }

    /// True when the change requires no action at all.
    pub const fn is_ignore(&self) -> bool {
        !self.regenerate_mirror && !self.force_reload && !self.suppress_default
    }
}

// ============================================================================
// Content Pipeline
// ============================================================================

/// One coherent snapshot of the pipeline: config plus the injection
/// registry built from it. Cheap to construct; the drivers build a fresh
/// one per request or per watch batch so a hot-reloaded config takes
/// effect immediately.
pub struct ContentPipeline {
    config: Arc<SiteConfig>,
    registry: InjectionRegistry,
}

impl ContentPipeline {
    /// Build a pipeline over the given config snapshot.
    pub fn new(config: Arc<SiteConfig>) -> Self {
        let registry = InjectionRegistry::from_config(&config);
        Self { config, registry }
    }

    /// Config snapshot this pipeline was built from.
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Injection registry built from the config snapshot.
    pub fn registry(&self) -> &InjectionRegistry {
        &self.registry
    }

    /// Reset the mirror cache and sweep the source tree.
    ///
    /// Called once at the start of every build and dev session.
    pub fn start_session(&self) -> Result<()> {
        mirror::reset(&self.config)?;
        let mirrored = mirror::mirror_tree(&self.config);
        if mirrored > 0 {
            log!("mirror"; "{mirrored} files mirrored");
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Hooks
    // ------------------------------------------------------------------------

    /// Module transform hook: foreign-inline sources become ES modules.
    ///
    /// `None` declines; the host keeps its default handling.
    pub fn transform_module(
        &self,
        source_id: &str,
        source_text: &str,
    ) -> Option<Result<String, PipelineError>> {
        transform::transform(source_id, source_text)
    }

    /// Module resolution hook: redirect foreign-format imports to their
    /// JSON mirrors.
    ///
    /// `None` declines (not a mirrorable import, or the file does not
    /// exist). `Some(Err)` means the source exists but cannot be converted;
    /// that failure must reach the host rather than be swallowed.
    pub fn resolve_module(
        &self,
        specifier: &str,
        importer: Option<&Path>,
    ) -> Option<Result<PathBuf, PipelineError>> {
        let (clean, query) = split_query(specifier);

        if !mirror::is_mirrorable(Path::new(clean)) {
            return None;
        }

        let absolute = resolve_specifier(clean, importer, &self.config)?;
        if !absolute.is_file() {
            return None;
        }

        Some(mirror::mirror(&absolute, &self.config).map(|path| match query {
            // Preserve query params (e.g. ?raw, ?t=123) on the redirected id
            Some(query) => PathBuf::from(format!("{}?{query}", path.display())),
            None => path,
        }))
    }

    /// HTML transform hook: injection pass, then the global token pass.
    ///
    /// The token pass always runs strictly after all injections for the
    /// document, so fragments may themselves carry `%%TOKEN%%`s.
    pub fn transform_html(&self, markup: &str, requested_path: &str) -> String {
        let injected = inject::inject(markup, requested_path, &self.registry, &self.config);
        TokenTable::from_config(&self.config)
            .substitute(&injected)
            .into_owned()
    }

    /// File-watch hook: classify a changed path into an explicit decision.
    pub fn on_change(&self, changed: &Path) -> InvalidationDecision {
        let changed = crate::utils::paths::normalize(changed);
        let config = &self.config;

        // Mirror cache writes must never feed back into the watcher
        if changed.starts_with(config.cache_dir()) {
            return InvalidationDecision::ignore();
        }

        // The config file is the registry definition: changes are never
        // partially hot-applied
        if changed == config.config_path {
            return InvalidationDecision {
                regenerate_mirror: false,
                force_reload: true,
                suppress_default: true,
            };
        }

        // Data and template files feed rendered fragments; same policy
        let is_rule_input = self.registry.data_paths(config).contains(&changed)
            || self.registry.template_paths(config).contains(&changed);
        if is_rule_input {
            return InvalidationDecision {
                regenerate_mirror: false,
                force_reload: true,
                suppress_default: true,
            };
        }

        if changed.starts_with(config.source_dir()) {
            if mirror::is_mirrorable(&changed) {
                return InvalidationDecision {
                    regenerate_mirror: true,
                    force_reload: true,
                    suppress_default: true,
                };
            }
            // Ordinary source files reload through default host routing
            return InvalidationDecision {
                regenerate_mirror: false,
                force_reload: true,
                suppress_default: false,
            };
        }

        InvalidationDecision::ignore()
    }

    /// Bundle finalization hook: emit derived artifacts for the final
    /// entry set.
    pub fn finalize(&self, entries: &[String], output: &Path) -> Result<()> {
        crate::generator::write_artifacts(entries, &self.config, output)
    }
}

// ============================================================================
// Specifier Resolution
// ============================================================================

/// Split `path?query` into the path part and the raw query.
fn split_query(specifier: &str) -> (&str, Option<&str>) {
    match specifier.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (specifier, None),
    }
}

/// Resolve an import specifier to an absolute path.
///
/// Relative specifiers resolve against the importer's directory;
/// root-absolute specifiers against the project root. Bare specifiers
/// (package imports) are declined.
fn resolve_specifier(
    specifier: &str,
    importer: Option<&Path>,
    config: &SiteConfig,
) -> Option<PathBuf> {
    if let Some(rel) = specifier.strip_prefix('/') {
        return Some(config.root.join(rel));
    }
    if specifier.starts_with('.') {
        let importer_dir = importer?.parent()?;
        return Some(crate::utils::paths::normalize(&importer_dir.join(specifier)));
    }
    None
}

// ============================================================================
// Tests
// ============================================================================
