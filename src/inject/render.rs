//! Fragment renderers.
//!
//! The renderer contract is typed and tagged: each `[[inject]]` rule names
//! one of the variants below, and every variant is a pure function from
//! `(data, render context)` to an HTML fragment. Failures never escape;
//! the engine catches them and leaves the placeholder unresolved.

use crate::{
    config::{RendererSpec, SiteConfig},
    error::PipelineError,
    inject::context::RenderContext,
    utils::convert::toml_to_json,
};
use minijinja::{Environment, context};
use serde_json::Value as JsonValue;
use std::fs;

/// Default key the loaded data is stored under inside a JSON-LD wrapper.
const DEFAULT_ENTITY_KEY: &str = "mainEntity";

/// Render one rule's fragment.
///
/// `page` and `placeholder` are threaded through purely for error context.
pub fn render(
    spec: &RendererSpec,
    data: Option<&JsonValue>,
    ctx: &RenderContext,
    config: &SiteConfig,
    page: &str,
    placeholder: &str,
) -> Result<String, PipelineError> {
    match spec {
        RendererSpec::Template { template } => {
            render_template(&config.resolve(template), data, ctx, config, page, placeholder)
        }
        RendererSpec::JsonLd {
            script_id,
            schema,
            entity_key,
        } => render_json_ld(
            data,
            script_id.as_deref(),
            schema.as_ref(),
            entity_key.as_deref(),
            page,
            placeholder,
        ),
    }
}

// ============================================================================
// Template Renderer
// ============================================================================

/// Render a MiniJinja template with `data`, `site` and `resolve_image` in scope.
fn render_template(
    template_path: &std::path::Path,
    data: Option<&JsonValue>,
    ctx: &RenderContext,
    config: &SiteConfig,
    page: &str,
    placeholder: &str,
) -> Result<String, PipelineError> {
    let source = fs::read_to_string(template_path)
        .map_err(|e| PipelineError::render(page, placeholder, format_args!(
            "cannot read template `{}`: {e}", template_path.display()
        )))?;

    let mut env = Environment::new();
    let ctx = ctx.clone();
    env.add_function("resolve_image", move |target: String, fallback: String| {
        ctx.resolve_image(&target, &fallback)
    });

    env.render_str(
        &source,
        context! {
            data => data,
            site => context! {
                name => config.site.name,
                description => config.site.description,
                url => config.site.base_url(),
            },
        },
    )
    .map_err(|e| PipelineError::render(page, placeholder, e))
}

// ============================================================================
// JSON-LD Renderer
// ============================================================================

/// Emit data as an `application/ld+json` script element.
///
/// With a wrapper schema the data lands under `entity_key`; without one the
/// data is the whole document. Fragment strings may carry `%%TOKEN%%`s that
/// the later global pass resolves (site name inside a schema, for example).
fn render_json_ld(
    data: Option<&JsonValue>,
    script_id: Option<&str>,
    schema: Option<&toml::value::Table>,
    entity_key: Option<&str>,
    page: &str,
    placeholder: &str,
) -> Result<String, PipelineError> {
    let document = match (schema, data) {
        (Some(table), _) => {
            let mut wrapper = toml_to_json(&toml::Value::Table(table.clone()));
            if let (Some(data), Some(object)) = (data, wrapper.as_object_mut()) {
                object.insert(
                    entity_key.unwrap_or(DEFAULT_ENTITY_KEY).to_string(),
                    data.clone(),
                );
            }
            wrapper
        }
        (None, Some(data)) => data.clone(),
        (None, None) => {
            return Err(PipelineError::render(page, placeholder, "no data to embed"));
        }
    };

    let json = serde_json::to_string(&document)
        .map_err(|e| PipelineError::render(page, placeholder, e))?;

    let id_attr = script_id
        .map(|id| format!(r#" id="{id}""#))
        .unwrap_or_default();

    Ok(format!(
        r#"<script{id_attr} type="application/ld+json">{json}</script>"#
    ))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn test_config(root: &std::path::Path) -> SiteConfig {
        let mut config: SiteConfig = toml::from_str(
            r#"
            [site]
            name = "My New Site"
            description = "My Site Description"
            url = "https://mysite.com/"
            "#,
        )
        .unwrap();
        config.root = root.to_path_buf();
        config
    }

    fn write_template(root: &std::path::Path, rel: &str, body: &str) -> PathBuf {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, body).unwrap();
        PathBuf::from(rel)
    }

    #[test]
    fn test_template_renders_data() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        let rel = write_template(
            dir.path(),
            "templates/agenda.html.j2",
            "<ul>{% for item in data %}<li>{{ item.title }}</li>{% endfor %}</ul>",
        );

        let spec = RendererSpec::Template { template: rel };
        let data = json!([{ "title": "Opening" }, { "title": "Closing" }]);
        let out = render(
            &spec,
            Some(&data),
            &RenderContext::new(&config),
            &config,
            "/about/index.html",
            "%%AGENDA%%",
        )
        .unwrap();

        assert_eq!(out, "<ul><li>Opening</li><li>Closing</li></ul>");
    }

    #[test]
    fn test_template_sees_site_metadata() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        let rel = write_template(dir.path(), "templates/t.j2", "{{ site.name }} @ {{ site.url }}");

        let spec = RendererSpec::Template { template: rel };
        let out = render(
            &spec,
            None,
            &RenderContext::new(&config),
            &config,
            "/index.html",
            "%%X%%",
        )
        .unwrap();

        assert_eq!(out, "My New Site @ https://mysite.com");
    }

    #[test]
    fn test_template_resolve_image_function() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        let img = dir.path().join("src/assets/images/hero.png");
        std::fs::create_dir_all(img.parent().unwrap()).unwrap();
        std::fs::write(&img, b"png").unwrap();
        let rel = write_template(
            dir.path(),
            "templates/t.j2",
            r#"{{ resolve_image("assets/images/hero.png", "assets/images/placeholder.png") }}"#,
        );

        let spec = RendererSpec::Template { template: rel };
        let out = render(
            &spec,
            None,
            &RenderContext::new(&config),
            &config,
            "/index.html",
            "%%X%%",
        )
        .unwrap();

        assert_eq!(out, "/assets/images/hero.png");
    }

    #[test]
    fn test_template_error_carries_page_and_placeholder() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        let rel = write_template(dir.path(), "templates/bad.j2", "{{ data.");

        let spec = RendererSpec::Template { template: rel };
        let err = render(
            &spec,
            None,
            &RenderContext::new(&config),
            &config,
            "/faq/index.html",
            "%%FAQ%%",
        )
        .unwrap_err();

        let display = format!("{err}");
        assert!(display.contains("/faq/index.html"));
        assert!(display.contains("%%FAQ%%"));
    }

    #[test]
    fn test_missing_template_is_render_error() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());

        let spec = RendererSpec::Template {
            template: "templates/absent.j2".into(),
        };
        let err = render(
            &spec,
            None,
            &RenderContext::new(&config),
            &config,
            "/index.html",
            "%%X%%",
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::Render { .. }));
    }

    #[test]
    fn test_json_ld_plain_data() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        let spec = RendererSpec::JsonLd {
            script_id: None,
            schema: None,
            entity_key: None,
        };
        let data = json!({ "@type": "Thing" });

        let out = render(
            &spec,
            Some(&data),
            &RenderContext::new(&config),
            &config,
            "/index.html",
            "%%X%%",
        )
        .unwrap();

        assert_eq!(
            out,
            r#"<script type="application/ld+json">{"@type":"Thing"}</script>"#
        );
    }

    #[test]
    fn test_json_ld_wrapper_schema_and_id() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        let schema: toml::value::Table = toml::from_str(
            r#"
            "@context" = "https://schema.org"
            "@type" = "FAQPage"
            name = "FAQ | %%SITE_NAME%%"
            "#,
        )
        .unwrap();
        let spec = RendererSpec::JsonLd {
            script_id: Some("faq-schema-script".into()),
            schema: Some(schema),
            entity_key: None,
        };
        let data = json!([{ "@type": "Question" }]);

        let out = render(
            &spec,
            Some(&data),
            &RenderContext::new(&config),
            &config,
            "/faq/index.html",
            "%%FAQ_SCHEMA%%",
        )
        .unwrap();

        assert!(out.starts_with(r#"<script id="faq-schema-script" type="application/ld+json">"#));
        assert!(out.contains(r#""@type":"FAQPage""#));
        assert!(out.contains(r#""mainEntity":[{"@type":"Question"}]"#));
        // tokens survive for the later global pass
        assert!(out.contains("%%SITE_NAME%%"));
    }

    #[test]
    fn test_json_ld_without_anything_fails() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        let spec = RendererSpec::JsonLd {
            script_id: None,
            schema: None,
            entity_key: None,
        };

        let err = render(
            &spec,
            None,
            &RenderContext::new(&config),
            &config,
            "/index.html",
            "%%X%%",
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::Render { .. }));
    }
}
