//! `[[inject]]` rule configuration.
//!
//! Each rule binds a target page, a placeholder token, an optional data
//! file and a renderer. Rules are declared as an ordered array of tables;
//! declaration order is the substitution order within a page.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One injection rule from infill.toml.
///
/// # Example
/// ```toml
/// [[inject]]
/// page = "/about/index.html"
/// placeholder = "%%AGENDA_DAY_1%%"
/// data = "src/assets/data/day-1.json"
/// renderer = "template"
/// template = "templates/agenda.html.j2"
///
/// [[inject]]
/// page = "/faq/index.html"
/// placeholder = "%%FAQ_SCHEMA%%"
/// data = "src/assets/data/faq.json5"
/// renderer = "json-ld"
/// script_id = "faq-schema-script"
/// entity_key = "mainEntity"
/// schema = { "@context" = "https://schema.org", "@type" = "FAQPage", url = "%%SITE_URL%%/faq" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectRule {
    /// Root-relative path of the target document, e.g. `/faq/index.html`.
    pub page: String,

    /// Literal token expected verbatim in the page markup.
    pub placeholder: String,

    /// Optional data file, relative to the project root. Strict JSON or
    /// permissive JSON5 depending on the extension. Absent means the
    /// renderer receives no data.
    #[serde(default)]
    pub data: Option<PathBuf>,

    /// How the fragment is produced from the loaded data.
    #[serde(flatten)]
    pub renderer: RendererSpec,
}

/// Tagged renderer contract: `(data, render context) -> html fragment`.
///
/// Renderers never abort a page; a failure leaves the placeholder
/// unresolved and is logged with page + placeholder context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "renderer", rename_all = "kebab-case")]
pub enum RendererSpec {
    /// Render a MiniJinja template file against the loaded data.
    ///
    /// The template sees `data`, `site` (name/url/description) and the
    /// `resolve_image(path, fallback)` context function.
    Template {
        /// Template path, relative to the project root.
        template: PathBuf,
    },

    /// Emit the loaded data as a `<script type="application/ld+json">`
    /// block, optionally nested inside a wrapper schema.
    JsonLd {
        /// `id` attribute for the emitted script element.
        #[serde(default)]
        script_id: Option<String>,

        /// Wrapper object; the loaded data is inserted under `entity_key`.
        /// Without a wrapper the data is emitted as the whole document.
        #[serde(default)]
        schema: Option<toml::value::Table>,

        /// Key the data is stored under inside `schema` (default `mainEntity`).
        #[serde(default)]
        entity_key: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_template_rule() {
        let config = r#"
            [site]
            name = "Test"

            [[inject]]
            page = "/about/index.html"
            placeholder = "%%AGENDA_DAY_1%%"
            data = "src/assets/data/day-1.json"
            renderer = "template"
            template = "templates/agenda.html.j2"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.inject.len(), 1);
        let rule = &config.inject[0];
        assert_eq!(rule.page, "/about/index.html");
        assert_eq!(rule.placeholder, "%%AGENDA_DAY_1%%");
        assert_eq!(rule.data, Some(PathBuf::from("src/assets/data/day-1.json")));
        assert!(matches!(
            rule.renderer,
            RendererSpec::Template { ref template } if template == &PathBuf::from("templates/agenda.html.j2")
        ));
    }

    #[test]
    fn test_json_ld_rule_with_schema() {
        let config = r#"
            [site]
            name = "Test"

            [[inject]]
            page = "/faq/index.html"
            placeholder = "%%FAQ_SCHEMA%%"
            data = "src/assets/data/faq.json5"
            renderer = "json-ld"
            script_id = "faq-schema-script"
            schema = { "@type" = "FAQPage" }
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        let rule = &config.inject[0];
        match &rule.renderer {
            RendererSpec::JsonLd {
                script_id, schema, entity_key,
            } => {
                assert_eq!(script_id.as_deref(), Some("faq-schema-script"));
                assert!(schema.as_ref().unwrap().contains_key("@type"));
                assert_eq!(*entity_key, None);
            }
            RendererSpec::Template { .. } => panic!("expected json-ld renderer"),
        }
    }

    #[test]
    fn test_rule_without_data() {
        let config = r#"
            [site]
            name = "Test"

            [[inject]]
            page = "/index.html"
            placeholder = "%%HERO%%"
            renderer = "template"
            template = "templates/hero.html.j2"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.inject[0].data, None);
    }

    #[test]
    fn test_declaration_order_preserved() {
        let config = r#"
            [site]
            name = "Test"

            [[inject]]
            page = "/faq/index.html"
            placeholder = "%%FIRST%%"
            renderer = "template"
            template = "a.j2"

            [[inject]]
            page = "/faq/index.html"
            placeholder = "%%SECOND%%"
            renderer = "template"
            template = "b.j2"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.inject[0].placeholder, "%%FIRST%%");
        assert_eq!(config.inject[1].placeholder, "%%SECOND%%");
    }

    #[test]
    fn test_missing_renderer_rejected() {
        let config = r#"
            [site]
            name = "Test"

            [[inject]]
            page = "/index.html"
            placeholder = "%%HERO%%"
        "#;
        let result: Result<SiteConfig, _> = toml::from_str(config);

        assert!(result.is_err());
    }
}
