//! Path normalization helpers.
//!
//! The watcher, the mirror cache and the injection registry all compare
//! paths coming from different sources (config, notify events, HTTP
//! requests), so everything is funneled through the same normal forms.

use std::{
    env,
    path::{Path, PathBuf},
};

/// Normalize a path to absolute form for reliable comparison.
///
/// Config paths are canonicalized at load time, so incoming paths (e.g.
/// from the file watcher) are canonicalized before comparison. Falls back
/// to cwd-joining when the file no longer exists.
pub fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Render a path relative to `root` with forward slashes.
///
/// `/proj/src/about/index.html` → `about/index.html`
pub fn rel_forward(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let mut out = String::new();
    for component in rel.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    out
}

/// Check if a path is an editor temp/backup file.
pub fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}
