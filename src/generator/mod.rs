//! Derived site artifacts.
//!
//! Runs once per production build, after the final HTML entry set is
//! known: derives the route list and emits sitemap.xml, robots.txt and
//! site.webmanifest into the output directory. All three are gated on a
//! configured site URL; without one the build completes with a warning
//! and no artifacts.

pub mod manifest;
pub mod robots;
pub mod routes;
pub mod sitemap;

use crate::{config::SiteConfig, error::PipelineError, log};
use anyhow::Result;
use std::path::Path;

/// Emit all derived artifacts for the given entry set.
///
/// `entries` are output-root-relative document paths with forward slashes
/// (e.g. `about/index.html`).
pub fn write_artifacts(entries: &[String], config: &SiteConfig, output: &Path) -> Result<()> {
    if !config.build.artifacts {
        return Ok(());
    }

    let Some(base_url) = config.site.base_url() else {
        log!("warn"; "{}", PipelineError::ArtifactPrecondition {
            artifact: "sitemap.xml, robots.txt, site.webmanifest",
        });
        return Ok(());
    };

    let routes = routes::derive(entries);

    sitemap::write(&routes, base_url, config, output)?;
    robots::write(base_url, output)?;
    manifest::write(config, output)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_skips_everything_without_site_url() {
        let dir = TempDir::new().unwrap();
        let config = SiteConfig::default();
        let entries = vec!["index.html".to_string()];

        write_artifacts(&entries, &config, dir.path()).unwrap();

        assert!(!dir.path().join("sitemap.xml").exists());
        assert!(!dir.path().join("robots.txt").exists());
        assert!(!dir.path().join("site.webmanifest").exists());
    }

    #[test]
    fn test_emits_all_three_with_site_url() {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.site.name = "My Site".into();
        config.site.url = Some("https://example.com/".into());
        let entries = vec!["index.html".to_string(), "about/index.html".to_string()];

        write_artifacts(&entries, &config, dir.path()).unwrap();

        assert!(dir.path().join("sitemap.xml").exists());
        assert!(dir.path().join("robots.txt").exists());
        assert!(dir.path().join("site.webmanifest").exists());
    }

    #[test]
    fn test_disabled_artifacts_flag() {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.site.url = Some("https://example.com".into());
        config.build.artifacts = false;

        write_artifacts(&["index.html".to_string()], &config, dir.path()).unwrap();

        assert!(!dir.path().join("sitemap.xml").exists());
    }
}
