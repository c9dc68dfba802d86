//! Output minification for HTML and XML.
//!
//! Minification applies to built pages and the generated sitemap only;
//! it never runs in the dev server path.

use std::borrow::Cow;

/// Content type for minification.
pub enum MinifyType<'a> {
    /// HTML content
    Html(&'a str),
    /// XML content
    Xml(&'a str),
}

/// Minify content when `enabled`, pass through otherwise.
pub fn minify(content: MinifyType<'_>, enabled: bool) -> Cow<'_, str> {
    if !enabled {
        return match content {
            MinifyType::Html(html) => Cow::Borrowed(html),
            MinifyType::Xml(xml) => Cow::Borrowed(xml),
        };
    }

    match content {
        MinifyType::Html(html) => Cow::Owned(minify_html_inner(html)),
        MinifyType::Xml(xml) => Cow::Owned(minify_xml_inner(xml)),
    }
}

/// Minify HTML content using the `minify_html` crate.
fn minify_html_inner(html: &str) -> String {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;

    String::from_utf8(minify_html::minify(html.as_bytes(), &cfg))
        .unwrap_or_else(|_| html.to_string())
}

/// Minify XML by dropping indentation and blank lines.
fn minify_xml_inner(xml: &str) -> String {
    xml.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("")
}
