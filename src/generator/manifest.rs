//! Web app manifest generation.
//!
//! Emits site.webmanifest from the site identity plus two fixed maskable
//! icon references expected under `/meta-assets/`.

use crate::config::SiteConfig;
use anyhow::{Context, Result};
use serde_json::json;
use std::{fs, path::Path};

/// Fixed icon references baked into the manifest.
const ICONS: &[(&str, &str)] = &[
    ("/meta-assets/web-app-manifest-192x192.png", "192x192"),
    ("/meta-assets/web-app-manifest-512x512.png", "512x512"),
];

/// Write site.webmanifest into the output directory.
pub fn write(config: &SiteConfig, output: &Path) -> Result<()> {
    let path = output.join("site.webmanifest");
    fs::write(&path, generate(config))
        .with_context(|| format!("Failed to write manifest to {}", path.display()))?;

    crate::log!("manifest"; "site.webmanifest");
    Ok(())
}

/// Generate the manifest JSON document.
pub fn generate(config: &SiteConfig) -> String {
    let icons: Vec<_> = ICONS
        .iter()
        .map(|(src, sizes)| {
            json!({
                "src": src,
                "sizes": sizes,
                "type": "image/png",
                "purpose": "maskable",
            })
        })
        .collect();

    let manifest = json!({
        "name": config.site.name,
        "short_name": config.site.short_name(),
        "start_url": "/",
        "icons": icons,
        "theme_color": config.site.theme_color,
        "background_color": config.site.background_color,
        "display": "standalone",
    });

    serde_json::to_string_pretty(&manifest).unwrap_or_else(|_| "{}".to_string())
}

// ============================================================================
// Tests
// ============================================================================
