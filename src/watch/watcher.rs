// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::engine::RuntimeEvent;
use crate::watch::debounce::Debouncer;
use crate::watch::hash::ContentFilter;
use crate::watch::path_utils::{is_within, relative_str};
use crate::watch::patterns::WatchBinding;

/// Watcher behaviour taken from `[config]`.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub debounce: Duration,
    /// Output directory relative to the root; events inside it are ignored.
    pub output_dir: String,
    pub use_hash: bool,
}

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Paths the watcher forwards: outside the output directory and matched by
/// at least one binding.
#[derive(Debug, Clone)]
pub struct PathFilter {
    output_dir: String,
    bindings: Vec<WatchBinding>,
}

impl PathFilter {
    pub fn new(output_dir: impl Into<String>, bindings: Vec<WatchBinding>) -> Self {
        Self {
            output_dir: output_dir.into(),
            bindings,
        }
    }

    pub fn accepts(&self, rel_path: &str) -> bool {
        !is_within(rel_path, &self.output_dir) && self.bindings.iter().any(|b| b.matches(rel_path))
    }
}

/// Only content-affecting events count; access and metadata-only changes
/// are ignored.
pub fn is_content_event(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    }
}

/// Spawn a filesystem watcher that observes `root` recursively and sends
/// debounced `RuntimeEvent::FileChanged` events for paths some binding
/// cares about.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    bindings: Vec<WatchBinding>,
    options: WatchOptions,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("assetflow: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("assetflow: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!(root = %root.display(), bindings = bindings.len(), "file watcher started");

    let filter = PathFilter::new(options.output_dir.clone(), bindings);

    tokio::spawn(async move {
        let mut content = if options.use_hash {
            let (seed_root, seed_filter) = (root.clone(), filter.clone());
            tokio::task::spawn_blocking(move || seeded_content_filter(&seed_root, &seed_filter))
                .await
                .ok()
        } else {
            None
        };

        let mut debouncer = Debouncer::new(options.debounce);

        loop {
            let deadline = debouncer.next_deadline();
            let wake_at = deadline
                .map(Instant::from_std)
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                maybe = event_rx.recv() => {
                    let Some(event) = maybe else { break };
                    if !is_content_event(&event.kind) {
                        continue;
                    }
                    for path in &event.paths {
                        let Some(rel) = relative_str(&root, path) else { continue };
                        if filter.accepts(&rel) {
                            debug!(path = %rel, kind = ?event.kind, "file event");
                            debouncer.record(rel, std::time::Instant::now());
                        }
                    }
                }
                _ = tokio::time::sleep_until(wake_at), if deadline.is_some() => {
                    let mut due = debouncer.take_due(std::time::Instant::now());
                    if let Some(mut hashes) = content.take() {
                        let hash_root = root.clone();
                        let hashed = tokio::task::spawn_blocking(move || {
                            let kept = hashes.retain_changed(&hash_root, due);
                            (hashes, kept)
                        })
                        .await;
                        match hashed {
                            Ok((hashes, kept)) => {
                                content = Some(hashes);
                                due = kept;
                            }
                            Err(err) => {
                                warn!(error = %err, "content hashing failed; hash filter disabled");
                                continue;
                            }
                        }
                    }
                    for rel in due {
                        debug!(path = %rel, "debounce flush");
                        let event = RuntimeEvent::FileChanged { rel_path: rel };
                        if runtime_tx.send(event).await.is_err() {
                            warn!("runtime channel closed; watcher stopping");
                            return;
                        }
                    }
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

fn seeded_content_filter(root: &Path, filter: &PathFilter) -> ContentFilter {
    let files = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            relative_str(root, e.path()).is_some_and(|rel| filter.accepts(&rel))
        })
        .map(|e| e.into_path());

    let mut content = ContentFilter::new();
    content.seed(files);
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind};

    #[test]
    fn output_directory_is_ignored() {
        let bindings = vec![WatchBinding::new("copy:html", "**/*.html", &[]).unwrap()];
        let filter = PathFilter::new("dist", bindings);
        assert!(filter.accepts("src/index.html"));
        assert!(!filter.accepts("dist/index.html"));
        assert!(!filter.accepts("src/app.js"));
    }

    #[test]
    fn only_content_events_count() {
        assert!(is_content_event(&EventKind::Create(CreateKind::File)));
        assert!(is_content_event(&EventKind::Modify(ModifyKind::Data(DataChange::Content))));
        assert!(!is_content_event(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime))));
        assert!(!is_content_event(&EventKind::Access(AccessKind::Read)));
    }
}
