//! File system watcher for live reload.
//!
//! Monitors the project root for changes, classifies each batch through
//! the pipeline's [`on_change`](crate::pipeline::ContentPipeline::on_change)
//! hook, regenerates mirrors where required, and pushes a full-reload
//! signal to connected clients. Correctness over speed: a data-driven
//! fragment is never patched in place, the whole page class reloads.
//!
//! # Architecture
//!
//! ```text
//! notify events ──▶ Debouncer (300ms) ──▶ handle_changes()
//!                                             │
//!                  config file ──▶ hot-swap config, reload
//!                  yaml source ──▶ regenerate mirror, reload
//!                  data/template ─▶ reload (suppress default routing)
//!                  other source ──▶ reload
//! ```

use crate::{
    config::{cfg, reload_config},
    log,
    logger::WatchStatus,
    mirror,
    pipeline::ContentPipeline,
    reload,
    utils::paths::{is_temp_file, rel_forward},
};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

// =============================================================================
// Constants
// =============================================================================

const DEBOUNCE_MS: u64 = 300;

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events before classification.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
        }
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        self.pending.drain().collect()
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

// =============================================================================
// Event Handler
// =============================================================================

/// Process one debounced batch of changed paths.
fn handle_changes(paths: &[PathBuf], status: &mut WatchStatus) {
    // Fresh snapshot per batch so a hot-reloaded config takes effect
    let config = cfg();
    let pipeline = ContentPipeline::new(Arc::clone(&config));

    let mut reload_needed = false;
    let mut config_changed = false;
    let mut touched: Vec<String> = Vec::new();

    for path in paths {
        let decision = pipeline.on_change(path);
        if decision.is_ignore() {
            continue;
        }

        let path = crate::utils::paths::normalize(path);
        if path == config.config_path {
            config_changed = true;
        }

        // The mirror re-runs synchronously before the reload signal goes
        // out, so the reload serves fresh content
        if decision.regenerate_mirror {
            match mirror::mirror(&path, &config) {
                Ok(_) => {}
                Err(e) => {
                    status.error("mirror failed", &e.to_string());
                    continue;
                }
            }
        }

        if decision.force_reload {
            reload_needed = true;
            touched.push(rel_forward(&path, &config.root));
        }
    }

    if config_changed {
        match reload_config() {
            Ok(true) => log!("watch"; "config reloaded"),
            Ok(false) => {}
            Err(e) => status.error("config reload failed", &format!("{e:#}")),
        }
    }

    if reload_needed {
        touched.sort();
        reload::broadcast(&touched.join(", "));
        status.success(&format!(
            "reload: {} ({} clients)",
            touched.join(", "),
            reload::client_count()
        ));
    }
}

// =============================================================================
// Watcher Setup
// =============================================================================

const fn is_relevant(event: &Event) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
}

/// Log what the watcher covers.
fn log_watch_summary() {
    let config = cfg();
    let pipeline = ContentPipeline::new(Arc::clone(&config));

    let data_count = pipeline.registry().data_paths(&config).len();
    let template_count = pipeline.registry().template_paths(&config).len();

    log!("watch"; "watching {} ({} rules: {} data, {} template files)",
        rel_forward(&config.source_dir(), &config.root),
        pipeline.registry().len(),
        data_count,
        template_count,
    );
}

// =============================================================================
// Public API
// =============================================================================

/// Start the blocking file watcher with debouncing and live reload.
pub fn watch_for_changes_blocking() -> Result<()> {
    let config = cfg();
    if !config.serve.watch {
        return Ok(());
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;

    // Watch the whole project root: source tree, data files, templates and
    // the config file all live under it. Cache writes are filtered out at
    // classification time.
    watcher
        .watch(&config.root, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", config.root.display()))?;

    log_watch_summary();

    let mut debouncer = Debouncer::new();
    let mut status = WatchStatus::new();

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => debouncer.add(event),
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) if debouncer.ready() => {
                handle_changes(&debouncer.take(), &mut status);
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
            // Other cases: irrelevant events, timeout without ready, etc.
            _ => {}
        }
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
