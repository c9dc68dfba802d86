//! Sitemap generation.
//!
//! Generates a sitemap.xml listing every derived route for search engine
//! indexing.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/about</loc>
//!     <lastmod>2026-01-01</lastmod>
//!     <priority>0.80</priority>
//!   </url>
//! </urlset>
//! ```

use super::routes::RouteEntry;
use crate::{
    config::SiteConfig,
    log,
    utils::minify::{MinifyType, minify},
};
use anyhow::{Context, Result};
use std::{fs, path::Path};

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

// ============================================================================
// Public API
// ============================================================================

/// Write sitemap.xml into the output directory.
pub fn write(
    routes: &[RouteEntry],
    base_url: &str,
    config: &SiteConfig,
    output: &Path,
) -> Result<()> {
    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let xml = generate(routes, base_url, &today);
    let xml = minify(MinifyType::Xml(&xml), config.build.minify);

    let path = output.join("sitemap.xml");
    fs::write(&path, xml.as_bytes())
        .with_context(|| format!("Failed to write sitemap to {}", path.display()))?;

    log!("sitemap"; "{} routes", routes.len());
    Ok(())
}

/// Generate the sitemap XML document.
///
/// `lastmod` is the same build date for every entry; the pipeline has no
/// per-page modification tracking.
pub fn generate(routes: &[RouteEntry], base_url: &str, lastmod: &str) -> String {
    let mut xml = String::with_capacity(4096);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
    xml.push('\n');

    for entry in routes {
        let loc = if entry.route.is_empty() {
            base_url.to_string()
        } else {
            format!("{base_url}/{}", entry.route)
        };

        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&loc)));
        xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
        xml.push_str(&format!(
            "    <priority>{}</priority>\n",
            entry.priority.as_str()
        ));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ============================================================================
// Tests
// ============================================================================
