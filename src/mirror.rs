//! Format mirror cache: YAML sources mirrored as canonical JSON.
//!
//! The module graph of the host bundler only understands JSON, so every
//! `.yaml`/`.yml` source is re-encoded into a mirror file under the scratch
//! directory and the mirror is consumed in place of the original.
//!
//! # Idempotence
//!
//! A mirror is never rewritten when its content is byte-identical to the
//! fresh serialization. A YAML edit that does not change the parsed meaning
//! (comments, formatting) therefore produces no downstream invalidation.
//!
//! # Lifecycle
//!
//! The whole scratch directory is deleted and recreated by [`reset`] at the
//! start of every build and dev session; mirrors are (re)created by
//! [`mirror`] on first resolution and on every watched change.

use crate::{config::SiteConfig, error::PipelineError, log};
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Extensions recognized as mirrorable foreign formats.
pub const MIRROR_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Check if a path has a mirrorable extension.
pub fn is_mirrorable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| MIRROR_EXTENSIONS.contains(&ext))
}

// ============================================================================
// Cache Lifecycle
// ============================================================================

/// Delete and recreate the scratch directory.
///
/// Guarantees no cross-build staleness; called once per build/session.
pub fn reset(config: &SiteConfig) -> Result<()> {
    let cache = config.cache_dir();

    if cache.exists() {
        fs::remove_dir_all(&cache)
            .with_context(|| format!("Failed to clear mirror cache: {}", cache.display()))?;
    }
    fs::create_dir_all(&cache)
        .with_context(|| format!("Failed to create mirror cache: {}", cache.display()))?;

    Ok(())
}

/// Mirror every foreign-format file under the source tree.
///
/// Parse failures are contained per file: each is logged and the sweep
/// continues, so one broken YAML never takes the whole build down.
/// Returns the number of mirrors written or confirmed fresh.
pub fn mirror_tree(config: &SiteConfig) -> usize {
    let source = config.source_dir();
    let cache = config.cache_dir();
    let mut mirrored = 0;

    for entry in walkdir::WalkDir::new(&source)
        .into_iter()
        .filter_entry(|e| !e.path().starts_with(&cache))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && is_mirrorable(e.path()))
    {
        match mirror(entry.path(), config) {
            Ok(_) => mirrored += 1,
            Err(e) => log!("mirror"; "{e}"),
        }
    }

    mirrored
}

// ============================================================================
// Mirror Generation
// ============================================================================

/// Convert a foreign-format source into its JSON mirror.
///
/// Returns the mirror path. The write is skipped entirely when an existing
/// mirror already holds identical content. Parse failures propagate: the
/// pipeline must never serve a stale or partial mirror for a broken source.
pub fn mirror(source: &Path, config: &SiteConfig) -> Result<PathBuf, PipelineError> {
    let dest = mirror_path(source, config)?;

    let text = fs::read_to_string(source)
        .map_err(|e| PipelineError::conversion(source, e))?;
    let value: serde_json::Value =
        serde_yaml::from_str(&text).map_err(|e| PipelineError::conversion(source, e))?;
    let json = serde_json::to_string(&value)
        .map_err(|e| PipelineError::conversion(source, e))?;

    // Skip the write when content is unchanged, suppressing cascading
    // invalidation for edits that don't change the parsed meaning.
    if let Ok(existing) = fs::read_to_string(&dest)
        && existing == json
    {
        return Ok(dest);
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| PipelineError::conversion(source, e))?;
    }
    fs::write(&dest, &json).map_err(|e| PipelineError::conversion(source, e))?;

    Ok(dest)
}

/// Compute the mirror path for a source file.
///
/// The source's root-relative path is relocated under the scratch directory
/// with the extension rewritten to `.json`:
///
/// `<root>/src/assets/data/faq.yaml` → `<cache>/src/assets/data/faq.json`
pub fn mirror_path(source: &Path, config: &SiteConfig) -> Result<PathBuf, PipelineError> {
    let rel = source.strip_prefix(&config.root).map_err(|_| {
        PipelineError::conversion(source, "source is outside the project root")
    })?;

    Ok(config.cache_dir().join(rel).with_extension("json"))
}

// ============================================================================
// Tests
// ============================================================================
