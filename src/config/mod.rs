//! Site configuration management for `infill.toml`.
//!
//! # Sections
//!
//! | Section      | Purpose                                          |
//! |--------------|--------------------------------------------------|
//! | `[site]`     | Site identity (name, description, url, colors)   |
//! | `[build]`    | Paths, mirror cache, minify, artifact emission   |
//! | `[serve]`    | Development server (port, interface, watch)      |
//! | `[tokens]`   | Free-form `%%TOKEN%%` substitution table         |
//! | `[[inject]]` | Ordered injection rules (the registry definition)|
//!
//! # Example
//!
//! ```toml
//! [site]
//! name = "My New Site"
//! description = "My Site Description"
//! url = "https://mysite.com"
//!
//! [build]
//! source = "src"
//! output = "dist"
//!
//! [tokens]
//! EMAIL = "hello@mysite.com"
//! INSTAGRAM = "https://instagram.com/yourhandle"
//!
//! [[inject]]
//! page = "/faq/index.html"
//! placeholder = "%%FAQ_CONTENT%%"
//! data = "src/assets/data/faq.json5"
//! renderer = "template"
//! template = "templates/faq-content.html.j2"
//! ```

mod build;
pub mod defaults;
mod error;
mod handle;
mod inject;
mod serve;
mod site;

// Re-export public types used by other modules
pub use handle::{cfg, init_config, reload_config};
pub use inject::{InjectRule, RendererSpec};

// Internal imports used in this module
use build::BuildConfig;
use error::ConfigError;
use serve::ServeConfig;
use site::SiteSection;

use crate::cli::{Cli, Commands};
use anyhow::Result;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing infill.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// CLI arguments reference
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Absolute project root (set after loading)
    #[serde(skip)]
    #[educe(Default = PathBuf::from("."))]
    pub root: PathBuf,

    /// Site identity
    #[serde(default)]
    pub site: SiteSection,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Free-form token table for `%%TOKEN%%` substitution
    #[serde(default)]
    pub tokens: BTreeMap<String, String>,

    /// Ordered injection rules
    #[serde(default)]
    pub inject: Vec<InjectRule>,
}

impl SiteConfig {
    /// Load configuration for the given CLI invocation.
    ///
    /// A missing config file is not fatal: the pipeline falls back to
    /// defaults with a warning, which still serves plain pages.
    pub fn load(cli: &'static Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let root = crate::utils::paths::normalize(root);
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            crate::log!("warn"; "{} not found, using defaults", cli.config.display());
            Self::default()
        };

        config.cli = Some(cli);
        config.config_path = config_path;
        config.root = root;
        config.update_with_cli(cli);
        config.validate()?;

        Ok(config)
    }

    /// Parse a config file from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self = toml::from_str(&content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Fold CLI overrides into the loaded configuration.
    fn update_with_cli(&mut self, cli: &Cli) {
        let build_args = match &cli.command {
            Commands::Build { build_args } | Commands::Serve { build_args, .. } => build_args,
        };

        self.build.clean = build_args.clean;
        if let Some(minify) = build_args.minify {
            self.build.minify = minify;
        }
        if let Some(artifacts) = build_args.artifacts {
            self.build.artifacts = artifacts;
        }
        if let Some(base_url) = &build_args.base_url {
            self.build.base_url = Some(base_url.clone());
        }

        if let Commands::Serve {
            interface,
            port,
            watch,
            ..
        } = &cli.command
        {
            if let Some(interface) = interface {
                self.serve.interface = interface.clone();
            }
            if let Some(port) = port {
                self.serve.port = *port;
            }
            if let Some(watch) = watch {
                self.serve.watch = *watch;
            }
        }
    }

    /// Reject rule sets that can never match anything.
    fn validate(&self) -> Result<()> {
        for (i, rule) in self.inject.iter().enumerate() {
            if rule.placeholder.is_empty() {
                return Err(
                    ConfigError::Validation(format!("inject rule #{i} has an empty placeholder"))
                        .into(),
                );
            }
            if !rule.page.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "inject rule #{i}: page `{}` must be root-relative (start with `/`)",
                    rule.page
                ))
                .into());
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Path accessors (all absolute)
    // ------------------------------------------------------------------------

    /// Absolute source tree path.
    pub fn source_dir(&self) -> PathBuf {
        self.root.join(&self.build.source)
    }

    /// Absolute output directory path.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.build.output)
    }

    /// Absolute mirror cache path.
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join(&self.build.cache)
    }

    /// Resolve a root-relative config path (data file, template) to absolute.
    pub fn resolve(&self, rel: &Path) -> PathBuf {
        if rel.is_absolute() {
            rel.to_path_buf()
        } else {
            self.root.join(rel)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parse() {
        let config = r#"
            [site]
            name = "My New Site"
            description = "My Site Description"
            url = "https://mysite.com"

            [build]
            source = "src"
            output = "dist"

            [serve]
            port = 4000

            [tokens]
            EMAIL = "hello@mysite.com"
            WHATSAPP = "0123456789"

            [[inject]]
            page = "/faq/index.html"
            placeholder = "%%FAQ_CONTENT%%"
            data = "src/assets/data/faq.json5"
            renderer = "template"
            template = "templates/faq-content.html.j2"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.site.name, "My New Site");
        assert_eq!(config.serve.port, 4000);
        assert_eq!(config.tokens.get("EMAIL").unwrap(), "hello@mysite.com");
        assert_eq!(config.inject.len(), 1);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert_eq!(config.build.source, PathBuf::from("src"));
        assert!(config.tokens.is_empty());
        assert!(config.inject.is_empty());
    }

    #[test]
    fn test_validate_rejects_empty_placeholder() {
        let mut config: SiteConfig = toml::from_str(
            r#"
            [[inject]]
            page = "/index.html"
            placeholder = ""
            renderer = "template"
            template = "a.j2"
            "#,
        )
        .unwrap();
        config.root = PathBuf::from(".");

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_relative_page() {
        let config: SiteConfig = toml::from_str(
            r#"
            [[inject]]
            page = "faq/index.html"
            placeholder = "%%X%%"
            renderer = "template"
            template = "a.j2"
            "#,
        )
        .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_path_accessors_join_root() {
        let mut config = SiteConfig::default();
        config.root = PathBuf::from("/proj");

        assert_eq!(config.source_dir(), PathBuf::from("/proj/src"));
        assert_eq!(config.output_dir(), PathBuf::from("/proj/dist"));
        assert_eq!(config.cache_dir(), PathBuf::from("/proj/.infill-cache"));
        assert_eq!(
            config.resolve(Path::new("src/assets/data/faq.json5")),
            PathBuf::from("/proj/src/assets/data/faq.json5")
        );
        assert_eq!(
            config.resolve(Path::new("/abs/data.json")),
            PathBuf::from("/abs/data.json")
        );
    }
}
