//! Development server with live reload support.
//!
//! A lightweight HTTP server over the *source* tree, built on `tiny_http`:
//! HTML documents run through the injection pipeline per request, foreign
//! data formats are answered as ES modules, everything else is served
//! as-is. Pairs with the `watch` and `reload` modules for full-reload
//! development.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐   ┌──────────────────┐   ┌─────────────────┐
//! │   Main Thread   │   │  Watcher Thread  │   │  Reload Thread  │
//! │  (HTTP Server)  │   │  (File Monitor)  │   │  (WebSocket)    │
//! └────────┬────────┘   └────────┬─────────┘   └────────┬────────┘
//!          │                     │                      │
//!          ▼                     ▼                      ▼
//!    Serve documents       Classify changes       Push full-reload
//!    through pipeline      regenerate mirrors     to open tabs
//! ```

use crate::{
    config::{SiteConfig, cfg},
    log, mirror,
    pipeline::ContentPipeline,
    reload,
    watch::watch_for_changes_blocking,
};
use anyhow::{Context, Result};
use std::{
    fs,
    io::Cursor,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Start the development server with optional file watching.
///
/// This function:
/// 1. Resets the mirror cache and sweeps the source tree
/// 2. Binds HTTP and reload ports (with auto-retry on conflicts)
/// 3. Sets up Ctrl+C handler for graceful shutdown
/// 4. Spawns the file watcher thread (if enabled)
/// 5. Enters the main request handling loop
///
/// The server blocks until Ctrl+C is received.
pub fn serve_site() -> Result<()> {
    let c = cfg();

    // Fresh mirror cache for this dev session
    ContentPipeline::new(Arc::clone(&c)).start_session()?;

    let interface: std::net::IpAddr = c.serve.interface.parse()?;
    let (server, addr) = try_bind_port(interface, c.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    // Live reload channel; the actual port lands in the injected client
    let reload_port = if c.serve.watch {
        Some(reload::start(c.serve.reload_port)?)
    } else {
        None
    };

    // Set up Ctrl+C handler for graceful shutdown
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{}", addr);

    // Spawn file watcher thread
    if c.serve.watch {
        std::thread::spawn(move || {
            if let Err(err) = watch_for_changes_blocking() {
                log!("watch"; "{err}");
            }
        });
    }

    // Handle requests in main thread (blocks until Ctrl+C)
    for request in server.incoming_requests() {
        // Re-read config per request to pick up hot-reloaded changes
        if let Err(e) = handle_request(request, reload_port) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: std::net::IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < max_retries => continue,
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to bind after {} attempts (ports {}-{}): {}",
                    max_retries,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

// ============================================================================
// Request Handling
// ============================================================================

/// Handle a single HTTP request.
///
/// Resolution order:
/// 1. Foreign-format module (`.json5`, `.yaml`/`.yml`) → transformed module
/// 2. HTML document (file or directory index) → injection pipeline
/// 3. Exact file match → serve file
/// 4. Nothing found → 404
fn handle_request(request: Request, reload_port: Option<u16>) -> Result<()> {
    let config = cfg();
    let pipeline = ContentPipeline::new(Arc::clone(&config));
    let source_root = config.source_dir();

    // Decode URL-encoded characters (e.g., %20 → space)
    let url_path = urlencoding::decode(request.url())
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    // Strip query string (e.g. ?t=123456) before resolving the path
    let path_without_query = url_path.split('?').next().unwrap_or(&url_path);
    let request_path = path_without_query.trim_matches('/');
    let local_path = source_root.join(request_path);

    // Foreign-format sources are answered the way the module graph sees
    // them: as ES modules
    match serve_module(&request, &local_path, &pipeline) {
        ModuleOutcome::NotAModule => {}
        ModuleOutcome::Ok(body) => return serve_js(request, body),
        ModuleOutcome::Failed(message) => return serve_error(request, &message),
    }

    // HTML documents run through the injection pipeline
    if let Some((document, requested)) = resolve_document(&local_path, path_without_query) {
        let markup = fs::read_to_string(&document)
            .with_context(|| format!("Failed to read {}", document.display()))?;

        let mut html = pipeline.transform_html(&markup, &requested);
        if let Some(port) = reload_port {
            html = inject_reload_client(html, port);
        }
        return serve_html(request, html);
    }

    // Plain static file
    if local_path.is_file() {
        return serve_file(request, &local_path);
    }

    serve_not_found(request, &config)
}

/// Resolve a request to an HTML document and its canonical request spelling.
///
/// Directory requests resolve to their `index.html` while keeping the
/// trailing-slash spelling for registry matching; the three-way page
/// equivalence in the registry does the rest.
fn resolve_document(local_path: &Path, url_path: &str) -> Option<(PathBuf, String)> {
    if local_path.is_file()
        && local_path.extension().is_some_and(|e| e == "html")
    {
        return Some((local_path.to_path_buf(), url_path.to_string()));
    }

    if local_path.is_dir() {
        let index = local_path.join("index.html");
        if index.is_file() {
            let requested = if url_path.ends_with('/') {
                url_path.to_string()
            } else {
                format!("{url_path}/")
            };
            return Some((index, requested));
        }
    }

    None
}

/// Answer a foreign-format source request as an ES module.
enum ModuleOutcome {
    /// Not a foreign-format source; fall through to other handlers.
    NotAModule,
    /// Transformed module body.
    Ok(String),
    /// Conversion failed; fatal for this module.
    Failed(String),
}

fn serve_module(request: &Request, local_path: &Path, pipeline: &ContentPipeline) -> ModuleOutcome {
    // Inline transform: .json5 parsed in memory
    if local_path.extension().is_some_and(|e| e == "json5") {
        let Ok(text) = fs::read_to_string(local_path) else {
            return ModuleOutcome::NotAModule;
        };
        return match pipeline.transform_module(&local_path.to_string_lossy(), &text) {
            Some(Ok(body)) => ModuleOutcome::Ok(body),
            Some(Err(e)) => {
                log!("error"; "{e}");
                ModuleOutcome::Failed(e.to_string())
            }
            None => ModuleOutcome::NotAModule,
        };
    }

    // Mirror cache: .yaml/.yml resolved through their JSON mirror. The
    // URL is source-relative; the resolution hook speaks project-root
    // specifiers, so rebase before calling it.
    if mirror::is_mirrorable(local_path) && local_path.is_file() {
        let rel = crate::utils::paths::rel_forward(local_path, &pipeline.config().root);
        let specifier = match request.url().split_once('?') {
            Some((_, query)) => format!("/{rel}?{query}"),
            None => format!("/{rel}"),
        };
        return match pipeline.resolve_module(&specifier, None) {
            Some(Ok(mirror_path)) => {
                let mirror_file = strip_mirror_query(&mirror_path);
                match fs::read_to_string(&mirror_file) {
                    Ok(json) => ModuleOutcome::Ok(format!("export default {json};\n")),
                    Err(e) => ModuleOutcome::Failed(e.to_string()),
                }
            }
            Some(Err(e)) => {
                log!("error"; "{e}");
                ModuleOutcome::Failed(e.to_string())
            }
            None => ModuleOutcome::NotAModule,
        };
    }

    ModuleOutcome::NotAModule
}

/// Drop a preserved `?query` suffix from a resolved mirror id.
fn strip_mirror_query(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    match s.split_once('?') {
        Some((clean, _)) => PathBuf::from(clean),
        None => path.to_path_buf(),
    }
}

/// Insert the live reload client before `</body>` (or append).
fn inject_reload_client(mut html: String, port: u16) -> String {
    let snippet = format!("<script>{}</script>", reload::client_script(port));

    if let Some(pos) = html.rfind("</body>") {
        html.insert_str(pos, &snippet);
        html
    } else {
        html.push_str(&snippet);
        html
    }
}

// ============================================================================
// Response Helpers
// ============================================================================

/// Serve a file with appropriate content type.
fn serve_file(request: Request, path: &Path) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let content_type = guess_content_type(path);

    let response = Response::from_data(content)
        .with_header(Header::from_bytes("Content-Type", content_type).unwrap());

    request.respond(response)?;
    Ok(())
}

/// Serve HTML content.
fn serve_html(request: Request, content: String) -> Result<()> {
    let response = Response::from_string(content)
        .with_header(Header::from_bytes("Content-Type", "text/html; charset=utf-8").unwrap());
    request.respond(response)?;
    Ok(())
}

/// Serve a transformed module body.
fn serve_js(request: Request, content: String) -> Result<()> {
    let response = Response::from_string(content).with_header(
        Header::from_bytes("Content-Type", "application/javascript; charset=utf-8").unwrap(),
    );
    request.respond(response)?;
    Ok(())
}

/// Serve 500 for a module whose conversion failed.
fn serve_error(request: Request, message: &str) -> Result<()> {
    let response = Response::from_string(message.to_string())
        .with_status_code(StatusCode(500))
        .with_header(Header::from_bytes("Content-Type", "text/plain; charset=utf-8").unwrap());
    request.respond(response)?;
    Ok(())
}

/// Serve 404 Not Found, preferring the site's own 404 page when present.
fn serve_not_found(request: Request, config: &SiteConfig) -> Result<()> {
    let custom = config.source_dir().join("404.html");
    if let Ok(content) = fs::read_to_string(&custom) {
        let response = Response::from_string(content)
            .with_status_code(StatusCode(404))
            .with_header(Header::from_bytes("Content-Type", "text/html; charset=utf-8").unwrap());
        request.respond(response)?;
        return Ok(());
    }

    let response = Response::new(
        StatusCode(404),
        vec![Header::from_bytes("Content-Type", "text/plain").unwrap()],
        Cursor::new("404 Not Found"),
        Some(13),
        None,
    );
    request.respond(response)?;
    Ok(())
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        // Web content
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        // Documents
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",

        // Default binary
        _ => "application/octet-stream",
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_content_type() {
        assert_eq!(
            guess_content_type(Path::new("index.html")),
            "text/html; charset=utf-8"
        );
        assert_eq!(guess_content_type(Path::new("a.png")), "image/png");
        assert_eq!(
            guess_content_type(Path::new("unknown.zzz")),
            "application/octet-stream"
        );
        assert_eq!(
            guess_content_type(Path::new("no_extension")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_inject_reload_client_before_body_close() {
        let html = "<html><body><p>hi</p></body></html>".to_string();
        let out = inject_reload_client(html, 35729);

        assert!(out.contains("<script>"));
        assert!(out.contains(":35729"));
        let script_pos = out.find("<script>").unwrap();
        let body_close = out.find("</body>").unwrap();
        assert!(script_pos < body_close);
    }

    #[test]
    fn test_inject_reload_client_appends_without_body() {
        let html = "<p>fragment only</p>".to_string();
        let out = inject_reload_client(html, 35729);

        assert!(out.starts_with("<p>fragment only</p><script>"));
    }

    #[test]
    fn test_resolve_document_html_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let doc = dir.path().join("about.html");
        fs::write(&doc, "<html></html>").unwrap();

        let (path, requested) = resolve_document(&doc, "/about.html").unwrap();
        assert_eq!(path, doc);
        assert_eq!(requested, "/about.html");
    }

    #[test]
    fn test_resolve_document_directory_index() {
        let dir = tempfile::TempDir::new().unwrap();
        let about = dir.path().join("about");
        fs::create_dir_all(&about).unwrap();
        fs::write(about.join("index.html"), "<html></html>").unwrap();

        // Trailing-slash spelling is preserved for registry matching
        let (path, requested) = resolve_document(&about, "/about/").unwrap();
        assert_eq!(path, about.join("index.html"));
        assert_eq!(requested, "/about/");

        // Bare directory spelling gains the slash
        let (_, requested) = resolve_document(&about, "/about").unwrap();
        assert_eq!(requested, "/about/");
    }

    #[test]
    fn test_resolve_document_declines_non_html() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("data.json");
        fs::write(&file, "{}").unwrap();

        assert!(resolve_document(&file, "/data.json").is_none());
    }

    #[test]
    fn test_strip_mirror_query() {
        assert_eq!(
            strip_mirror_query(Path::new("/cache/a.json?t=1")),
            PathBuf::from("/cache/a.json")
        );
        assert_eq!(
            strip_mirror_query(Path::new("/cache/a.json")),
            PathBuf::from("/cache/a.json")
        );
    }
}
