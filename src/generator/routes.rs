//! Route derivation from the final HTML entry set.
//!
//! One `RouteEntry` per output document, minus error/not-found pages.
//! Routes are what the sitemap speaks: the root document becomes the empty
//! route, directory indexes collapse to their directory, and every other
//! document drops its `.html` suffix.

/// Documents never listed in the sitemap.
const EXCLUDED_DOCUMENTS: &[&str] = &["error.html", "404.html"];

/// Routes containing any of these keywords get the lowest priority.
const LOW_PRIORITY_KEYWORDS: &[&str] = &["privacy-policy", "terms-of-use", "legal"];

/// Crawl priority bucket for a route. First match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// The site root.
    Highest,
    /// Ordinary content pages.
    Mid,
    /// Legal/privacy/terms pages.
    Lowest,
}

impl Priority {
    /// Sitemap representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Highest => "1.00",
            Self::Mid => "0.80",
            Self::Lowest => "0.20",
        }
    }

    /// Assign a priority to a derived route.
    fn for_route(route: &str) -> Self {
        if route.is_empty() {
            Self::Highest
        } else if LOW_PRIORITY_KEYWORDS.iter().any(|kw| route.contains(kw)) {
            Self::Lowest
        } else {
            Self::Mid
        }
    }
}

/// One sitemap-relevant document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// Root-relative document path, forward slashes.
    pub path: String,
    /// Derived URL route (empty for the site root).
    pub route: String,
    /// Crawl priority.
    pub priority: Priority,
}

/// Derive route entries from root-relative document paths.
///
/// Error and not-found documents are excluded entirely.
pub fn derive(paths: &[String]) -> Vec<RouteEntry> {
    paths
        .iter()
        .map(|p| p.replace('\\', "/"))
        .filter(|p| !EXCLUDED_DOCUMENTS.contains(&p.as_str()))
        .map(|path| {
            let route = route_for(&path);
            let priority = Priority::for_route(&route);
            RouteEntry {
                path,
                route,
                priority,
            }
        })
        .collect()
}

/// Map a document path to its URL route.
///
/// `index.html` → `` ; `about/index.html` → `about` ;
/// `legal/terms-of-use.html` → `legal/terms-of-use`
fn route_for(path: &str) -> String {
    if path == "index.html" {
        return String::new();
    }
    if let Some(dir) = path.strip_suffix("/index.html") {
        return dir.to_string();
    }
    path.strip_suffix(".html").unwrap_or(path).to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(paths: &[&str]) -> Vec<RouteEntry> {
        derive(&paths.iter().map(ToString::to_string).collect::<Vec<_>>())
    }

    #[test]
    fn test_root_document() {
        let routes = entries(&["index.html"]);

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].route, "");
        assert_eq!(routes[0].priority, Priority::Highest);
        assert_eq!(routes[0].priority.as_str(), "1.00");
    }

    #[test]
    fn test_directory_index() {
        let routes = entries(&["about/index.html"]);

        assert_eq!(routes[0].route, "about");
        assert_eq!(routes[0].priority, Priority::Mid);
        assert_eq!(routes[0].priority.as_str(), "0.80");
    }

    #[test]
    fn test_plain_document_strips_suffix() {
        let routes = entries(&["legal/terms-of-use.html"]);

        assert_eq!(routes[0].route, "legal/terms-of-use");
        assert_eq!(routes[0].priority, Priority::Lowest);
        assert_eq!(routes[0].priority.as_str(), "0.20");
    }

    #[test]
    fn test_error_pages_excluded() {
        let routes = entries(&["index.html", "error.html", "404.html"]);

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].route, "");
    }

    #[test]
    fn test_legal_keywords_anywhere_in_route() {
        let routes = entries(&[
            "privacy-policy/index.html",
            "about/legal-notes/index.html",
            "terms-of-use.html",
        ]);

        assert!(routes.iter().all(|r| r.priority == Priority::Lowest));
    }

    #[test]
    fn test_backslash_separators_normalized() {
        let routes = entries(&[r"about\index.html"]);

        assert_eq!(routes[0].path, "about/index.html");
        assert_eq!(routes[0].route, "about");
    }

    #[test]
    fn test_nested_directory_index() {
        let routes = entries(&["blog/2026/welcome/index.html"]);

        assert_eq!(routes[0].route, "blog/2026/welcome");
        assert_eq!(routes[0].priority, Priority::Mid);
    }

    #[test]
    fn test_spec_example_table() {
        let routes = entries(&[
            "index.html",
            "about/index.html",
            "legal/terms-of-use.html",
            "error.html",
        ]);

        assert_eq!(routes.len(), 3);
        assert_eq!(
            (routes[0].route.as_str(), routes[0].priority.as_str()),
            ("", "1.00")
        );
        assert_eq!(
            (routes[1].route.as_str(), routes[1].priority.as_str()),
            ("about", "0.80")
        );
        assert_eq!(
            (routes[2].route.as_str(), routes[2].priority.as_str()),
            ("legal/terms-of-use", "0.20")
        );
    }
}
