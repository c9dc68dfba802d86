//! Crawler policy generation.
//!
//! Emits a robots.txt that welcomes ordinary search engines, explicitly
//! refuses a fixed list of AI-data-harvesting agents, and advertises the
//! sitemap's absolute URL.

use anyhow::{Context, Result};
use std::{fs, path::Path};

/// Agent identifiers refused access site-wide.
const AI_CRAWLERS: &[&str] = &[
    "GPTBot",
    "Google-Extended",
    "CCBot",
    "CommonCrawl",
    "anthropic-ai",
];

/// Write robots.txt into the output directory.
pub fn write(base_url: &str, output: &Path) -> Result<()> {
    let path = output.join("robots.txt");
    fs::write(&path, generate(base_url))
        .with_context(|| format!("Failed to write robots.txt to {}", path.display()))?;

    crate::log!("robots"; "{} agents disallowed", AI_CRAWLERS.len());
    Ok(())
}

/// Generate the robots.txt document.
pub fn generate(base_url: &str) -> String {
    let mut out = String::with_capacity(512);

    out.push_str("# Allow all good search engines by default\n");
    out.push_str("User-agent: *\nAllow: /\n\n");

    out.push_str("# Specifically disallow AI data harvesting bots\n");
    for agent in AI_CRAWLERS {
        out.push_str(&format!("User-agent: {agent}\nDisallow: /\n\n"));
    }

    out.push_str("# Point all crawlers to the auto-generated sitemap\n");
    out.push_str(&format!("Sitemap: {base_url}/sitemap.xml\n"));

    out
}

// ============================================================================
// Tests
// ============================================================================
