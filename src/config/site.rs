//! `[site]` section configuration.
//!
//! Site identity: feeds the global token table, the web manifest and the
//! sitemap/robots generators.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[site]` section in infill.toml - site identity and metadata.
///
/// # Example
/// ```toml
/// [site]
/// name = "My New Site"
/// description = "My Site Description"
/// url = "https://mysite.com"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteSection {
    /// Site name, used for `%%SITE_NAME%%` and the web manifest.
    pub name: String,

    /// Short name for the web manifest. Falls back to `name` when empty.
    #[serde(default)]
    pub short_name: String,

    /// Site description for `%%SITE_DESC%%`.
    #[serde(default)]
    pub description: String,

    /// Absolute site URL. Required for sitemap/robots generation;
    /// trailing slash is stripped wherever the value is inserted.
    #[serde(default = "defaults::site::url")]
    #[educe(Default = defaults::site::url())]
    pub url: Option<String>,

    /// Web manifest theme color.
    #[serde(default = "defaults::site::theme_color")]
    #[educe(Default = defaults::site::theme_color())]
    pub theme_color: String,

    /// Web manifest background color.
    #[serde(default = "defaults::site::background_color")]
    #[educe(Default = defaults::site::background_color())]
    pub background_color: String,
}

impl SiteSection {
    /// Short name with fallback to the full name.
    pub fn short_name(&self) -> &str {
        if self.short_name.is_empty() {
            &self.name
        } else {
            &self.short_name
        }
    }

    /// Site URL without trailing slash, if configured.
    pub fn base_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(|url| url.strip_suffix('/').unwrap_or(url))
    }
}
