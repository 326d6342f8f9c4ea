//! Source watching for `erd --watch`

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Quiet period that closes a burst of changes
pub const DEBOUNCE: Duration = Duration::from_millis(800);

type WatchEvent = notify::Result<Event>;

/// Recursive watcher over the Java sources of one repository
pub struct SourceWatcher {
    // dropping the watcher stops event delivery
    _watcher: RecommendedWatcher,
    events: UnboundedReceiver<WatchEvent>,
}

impl SourceWatcher {
    pub fn start(root: &Path) -> Result<Self> {
        let (tx, events) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |event: WatchEvent| {
            tx.send(event).ok();
        })
        .context("Failed to create file watcher")?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", root.display()))?;

        Ok(Self {
            _watcher: watcher,
            events,
        })
    }

    /// Wait for the next burst of Java changes
    ///
    /// Returns the changed paths, sorted, or `None` once the watcher is gone.
    pub async fn next_change(&mut self) -> Option<Vec<PathBuf>> {
        next_burst(&mut self.events, DEBOUNCE).await
    }
}

async fn next_burst(events: &mut UnboundedReceiver<WatchEvent>, quiet: Duration) -> Option<Vec<PathBuf>> {
    let mut paths = loop {
        match events.recv().await? {
            Ok(event) => {
                let changed = java_paths(&event);
                if !changed.is_empty() {
                    break changed;
                }
            }
            Err(e) => tracing::warn!(error = %e, "File watch error"),
        }
    };

    loop {
        match tokio::time::timeout(quiet, events.recv()).await {
            Ok(Some(Ok(event))) => paths.extend(java_paths(&event)),
            Ok(Some(Err(e))) => tracing::warn!(error = %e, "File watch error"),
            Ok(None) | Err(_) => break,
        }
    }

    paths.sort();
    paths.dedup();
    tracing::debug!(files = paths.len(), "Java sources changed");
    Some(paths)
}

/// Java files an event created, modified or removed
fn java_paths(event: &Event) -> Vec<PathBuf> {
    if matches!(event.kind, EventKind::Access(_)) {
        return Vec::new();
    }

    event
        .paths
        .iter()
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("java")))
        .cloned()
        .collect()
}
