//! Production build orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── start_session() ──► reset mirror cache, sweep yaml sources
//!     │
//!     ├── discover_entries() ──► final HTML entry set from the source tree
//!     │
//!     ├── render pages (rayon) ──► inject + tokens + minify ──► output
//!     │
//!     ├── copy assets (rayon) ──► everything that isn't a page or a
//!     │                           build-time data source
//!     │
//!     └── finalize() ──► sitemap.xml, robots.txt, site.webmanifest
//! ```

use crate::{
    config::SiteConfig,
    log, mirror,
    pipeline::ContentPipeline,
    utils::{
        minify::{MinifyType, minify},
        paths::rel_forward,
    },
};
use anyhow::{Context, Result, ensure};
use rayon::prelude::*;
use std::{fs, path::Path, sync::Arc};
use walkdir::WalkDir;

/// Build the entire site.
///
/// Returns the final entry set (output-relative document paths) so callers
/// can report on it. Page-level pipeline failures are already contained to
/// single placeholders; an IO failure on any page aborts the build.
pub fn build_site(config: Arc<SiteConfig>) -> Result<Vec<String>> {
    let source = config.source_dir();
    ensure!(
        source.is_dir(),
        "source directory not found: {}",
        source.display()
    );

    let pipeline = ContentPipeline::new(Arc::clone(&config));
    pipeline.start_session()?;

    let output = config.output_dir();
    prepare_output(&output, config.build.clean)?;

    let entries = discover_entries(&config);
    log!("build"; "rendering {} pages", entries.len());

    entries.par_iter().try_for_each(|rel| {
        render_page(rel, &pipeline, &source, &output, config.build.minify)
    })?;

    let copied = copy_assets(&config, &output)?;
    if copied > 0 {
        log!("assets"; "{copied} files copied");
    }

    pipeline.finalize(&entries, &output)?;
    log_build_result(&output)?;

    Ok(entries)
}

// ============================================================================
// Entry Discovery
// ============================================================================

/// Collect the final HTML entry set, as source-relative forward-slash paths.
///
/// Hidden directories and the mirror cache are never entries. Sorted for
/// deterministic build order and artifact output.
pub fn discover_entries(config: &SiteConfig) -> Vec<String> {
    let source = config.source_dir();
    let cache = config.cache_dir();

    let mut entries: Vec<String> = WalkDir::new(&source)
        .into_iter()
        .filter_entry(|e| !is_hidden(e.path()) && !e.path().starts_with(&cache))
        .filter_map(Result::ok)
        .filter(|e| {
            e.file_type().is_file() && e.path().extension().is_some_and(|ext| ext == "html")
        })
        .map(|e| rel_forward(e.path(), &source))
        .collect();

    entries.sort();
    entries
}

/// Hidden files/directories (dotfiles) are invisible to the build.
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

// ============================================================================
// Page Rendering
// ============================================================================

/// Render one HTML entry through the pipeline into the output tree.
fn render_page(
    rel: &str,
    pipeline: &ContentPipeline,
    source: &Path,
    output: &Path,
    minify_enabled: bool,
) -> Result<()> {
    let source_path = source.join(rel);
    let markup = fs::read_to_string(&source_path)
        .with_context(|| format!("Failed to read {}", source_path.display()))?;

    // Pages are addressed root-relative, matching the dev server spelling
    let requested = format!("/{rel}");
    let html = pipeline.transform_html(&markup, &requested);
    let html = minify(MinifyType::Html(&html), minify_enabled);

    let dest = output.join(rel);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&dest, html.as_bytes())
        .with_context(|| format!("Failed to write {}", dest.display()))?;

    Ok(())
}

// ============================================================================
// Asset Copying
// ============================================================================

/// Copy non-page files from the source tree into the output tree.
///
/// Foreign-format data sources (`.yaml`/`.yml`/`.json5`) are build-time
/// inputs consumed through the module graph; they are not shipped.
fn copy_assets(config: &SiteConfig, output: &Path) -> Result<usize> {
    let source = config.source_dir();
    let cache = config.cache_dir();

    let assets: Vec<_> = WalkDir::new(&source)
        .into_iter()
        .filter_entry(|e| !is_hidden(e.path()) && !e.path().starts_with(&cache))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str());
            ext != Some("html") && ext != Some("json5") && !mirror::is_mirrorable(p)
        })
        .collect();

    assets.par_iter().try_for_each(|path| {
        let dest = output.join(rel_forward(path, &source));
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::copy(path, &dest)
            .with_context(|| format!("Failed to copy {}", path.display()))?;
        Ok::<_, anyhow::Error>(())
    })?;

    Ok(assets.len())
}

// ============================================================================
// Output Preparation
// ============================================================================

/// Ensure the output directory exists, emptied first when `clean` is set.
fn prepare_output(output: &Path, clean: bool) -> Result<()> {
    if clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))?;
    Ok(())
}

/// Log build result based on output directory contents
fn log_build_result(output: &Path) -> Result<()> {
    let file_count = fs::read_dir(output)?.filter_map(Result::ok).count();

    if file_count == 0 {
        log!("warn"; "output is empty, check if the source tree has .html entries");
    } else {
        log!("build"; "done");
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
