//! `[build]` section configuration.
//!
//! Paths and switches for the production build: source tree, output
//! directory, mirror cache location, minification and artifact emission.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in infill.toml.
///
/// # Example
/// ```toml
/// [build]
/// source = "src"
/// output = "dist"
/// minify = true
/// artifacts = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Source tree holding HTML entry documents, assets and data files.
    #[serde(default = "defaults::build::source")]
    #[educe(Default = defaults::build::source())]
    pub source: PathBuf,

    /// Output directory for built pages and artifacts.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Scratch directory for format mirrors. Fully deleted and recreated
    /// at the start of every build and dev session.
    #[serde(default = "defaults::build::cache")]
    #[educe(Default = defaults::build::cache())]
    pub cache: PathBuf,

    /// Minify built HTML pages and the sitemap.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub minify: bool,

    /// Emit sitemap.xml, robots.txt and site.webmanifest after the build.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub artifacts: bool,

    /// Base path prefix for `%%BASE_URL%%`, typically set per deployment
    /// via `--base-url` or the `INFILL_BASE_URL` environment variable.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Clean output directory completely before building (CLI only).
    #[serde(skip)]
    pub clean: bool,
}
