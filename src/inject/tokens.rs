//! Global `%%TOKEN%%` substitution.
//!
//! The second rewrite pass, independent of the injection engine and always
//! run after it, so rendered fragments may themselves carry tokens. Tokens
//! with no table entry are left verbatim: an unconfigured token stays
//! visible in the output instead of silently disappearing.

use crate::config::SiteConfig;
use regex::{Captures, Regex};
use std::{borrow::Cow, collections::BTreeMap, env, sync::LazyLock};

/// Environment variable consulted for `%%BASE_URL%%` when the config
/// carries no explicit base path.
const BASE_URL_ENV: &str = "INFILL_BASE_URL";

/// Token grammar: `%%` + word characters + `%%`.
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%%(\w+)%%").expect("token regex is valid"));

/// Flat key→string table for global token substitution.
#[derive(Debug, Clone, Default)]
pub struct TokenTable {
    entries: BTreeMap<String, String>,
}

impl TokenTable {
    /// Build the table from environment-derived values overlaid with the
    /// site configuration.
    ///
    /// Precedence (later wins): `BASE_URL` env/config, site identity
    /// (`SITE_NAME`, `SITE_URL`, `SITE_DESC`), then the free-form
    /// `[tokens]` table. URL-valued entries lose their trailing slash.
    pub fn from_config(config: &SiteConfig) -> Self {
        let mut entries = BTreeMap::new();

        let base_url = config
            .build
            .base_url
            .clone()
            .or_else(|| env::var(BASE_URL_ENV).ok())
            .unwrap_or_default();
        entries.insert("BASE_URL".to_string(), sanitize(&base_url));

        entries.insert("SITE_NAME".to_string(), config.site.name.clone());
        entries.insert("SITE_DESC".to_string(), config.site.description.clone());
        if let Some(url) = &config.site.url {
            entries.insert("SITE_URL".to_string(), sanitize(url));
        }

        for (key, value) in &config.tokens {
            entries.insert(key.clone(), sanitize(value));
        }

        Self { entries }
    }

    /// Build a table from explicit entries (tests, embedding).
    pub fn from_entries(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    /// Replace every known `%%TOKEN%%`; unknown tokens stay verbatim.
    pub fn substitute<'a>(&self, markup: &'a str) -> Cow<'a, str> {
        TOKEN_RE.replace_all(markup, |caps: &Captures| {
            self.entries
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
    }

    /// Look up a single entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

/// Strip the trailing slash from URL-valued entries.
///
/// Only scheme-prefixed values are treated as URLs; a plain string ending
/// in `/` is kept as written.
fn sanitize(value: &str) -> String {
    if value.starts_with("http://") || value.starts_with("https://") {
        value.strip_suffix('/').unwrap_or(value).to_string()
    } else {
        value.to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, &str)]) -> TokenTable {
        TokenTable::from_entries(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_substitutes_known_tokens() {
        let table = table(&[("SITE_NAME", "My Site"), ("EMAIL", "hi@example.com")]);
        let out = table.substitute("<p>%%SITE_NAME%% / %%EMAIL%%</p>");

        assert_eq!(out, "<p>My Site / hi@example.com</p>");
    }

    #[test]
    fn test_unknown_token_left_verbatim() {
        let table = table(&[("SITE_NAME", "My Site")]);
        let out = table.substitute("<p>%%NOT_CONFIGURED%%</p>");

        assert_eq!(out, "<p>%%NOT_CONFIGURED%%</p>");
    }

    #[test]
    fn test_every_occurrence_replaced() {
        let table = table(&[("X", "y")]);
        assert_eq!(table.substitute("%%X%% %%X%% %%X%%"), "y y y");
    }

    #[test]
    fn test_grammar_word_characters_only() {
        let table = table(&[("A_B1", "ok")]);

        assert_eq!(table.substitute("%%A_B1%%"), "ok");
        // hyphens and spaces are not part of the grammar
        assert_eq!(table.substitute("%%A-B%%"), "%%A-B%%");
        assert_eq!(table.substitute("%% A %%"), "%% A %%");
    }

    #[test]
    fn test_no_tokens_borrows_input() {
        let table = table(&[("X", "y")]);
        let input = "<p>plain markup</p>";

        assert!(matches!(table.substitute(input), Cow::Borrowed(_)));
    }

    #[test]
    fn test_from_config_overlays_sections() {
        let config: SiteConfig = toml::from_str(
            r#"
            [site]
            name = "My New Site"
            description = "Desc"
            url = "https://mysite.com/"

            [tokens]
            EMAIL = "hello@mysite.com"
            INSTAGRAM = "https://instagram.com/yourhandle/"
            "#,
        )
        .unwrap();

        let table = TokenTable::from_config(&config);

        assert_eq!(table.get("SITE_NAME"), Some("My New Site"));
        assert_eq!(table.get("SITE_DESC"), Some("Desc"));
        // trailing slashes stripped from URL-valued entries
        assert_eq!(table.get("SITE_URL"), Some("https://mysite.com"));
        assert_eq!(table.get("INSTAGRAM"), Some("https://instagram.com/yourhandle"));
        assert_eq!(table.get("EMAIL"), Some("hello@mysite.com"));
        assert_eq!(table.get("BASE_URL"), Some(""));
    }

    #[test]
    fn test_user_tokens_override_site_identity() {
        let config: SiteConfig = toml::from_str(
            r#"
            [site]
            name = "From Site"

            [tokens]
            SITE_NAME = "From Tokens"
            "#,
        )
        .unwrap();

        let table = TokenTable::from_config(&config);
        assert_eq!(table.get("SITE_NAME"), Some("From Tokens"));
    }

    #[test]
    fn test_base_url_from_build_config() {
        let config: SiteConfig = toml::from_str(
            r#"
            [build]
            base_url = "https://cdn.example.com/site/"
            "#,
        )
        .unwrap();

        let table = TokenTable::from_config(&config);
        assert_eq!(table.get("BASE_URL"), Some("https://cdn.example.com/site"));
    }

    #[test]
    fn test_tokens_inside_fragments_resolved_by_second_pass() {
        // The JSON-LD renderer leaves %%SITE_NAME%% in its fragment; this
        // pass must resolve it even though it was not in the source page.
        let table = table(&[("SITE_NAME", "My Site")]);
        let fragment = r#"{"name":"FAQ | %%SITE_NAME%%"}"#;

        assert_eq!(table.substitute(fragment), r#"{"name":"FAQ | My Site"}"#);
    }
}
