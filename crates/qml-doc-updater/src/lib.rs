//! Re-parses modified open documents and publishes their snapshots.

#![warn(missing_docs)]

mod pending;

pub use pending::PendingSet;

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use qml_dom::DomItem;
use qml_environment::{Environment, LoadOptions, LoadSource};
use qml_registry::DocumentRegistry;
use qml_uri::LookupMode;

/// Upper bound on concurrently running update workers.
const WORKER_BOUND: usize = 1;

struct Inner {
    pending: Mutex<PendingSet>,
    workers: AtomicUsize,
    registry: Arc<DocumentRegistry>,
    current_env: Environment,
    framework_imports: Vec<PathBuf>,
}

/// Drains the pending-URL set, re-parsing each document and publishing the
/// result through the [`DocumentRegistry`].
#[derive(Clone)]
pub struct OpenDocUpdater {
    inner: Arc<Inner>,
}

impl OpenDocUpdater {
    /// Create an updater writing parses into `current_env` and publishing
    /// through `registry`. `framework_imports` are directories always
    /// searched for import targets in addition to each file's resolved
    /// build directories.
    pub fn new(
        registry: Arc<DocumentRegistry>,
        current_env: Environment,
        framework_imports: Vec<PathBuf>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                pending: Mutex::new(PendingSet::new()),
                workers: AtomicUsize::new(0),
                registry,
                current_env,
                framework_imports,
            }),
        }
    }

    /// Mark `url` as needing re-parse (called from `didOpen`/`didChange`).
    pub fn schedule(&self, url: &str) {
        self.inner.pending.lock().schedule(url.to_string());
    }

    /// Spawn a worker if one is not already draining the pending set.
    pub fn kick(&self) {
        if self.inner.pending.lock().is_empty() {
            return;
        }
        if self
            .inner
            .workers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                if n < WORKER_BOUND { Some(n + 1) } else { None }
            })
            .is_err()
        {
            return;
        }
        let updater = self.clone();
        tokio::task::spawn_blocking(move || updater.run_worker());
    }

    fn run_worker(&self) {
        loop {
            let url = { self.inner.pending.lock().next() };
            let Some(url) = url else { break };
            self.update_one(&url);
        }
        self.inner.workers.fetch_sub(1, Ordering::SeqCst);
    }

    /// The four-step unit of work for a single URL.
    fn update_one(&self, url: &str) {
        // Step 1: snapshot version and text; bail if nothing changed.
        let Some(doc) = self.inner.registry.open_document(url) else {
            return; // closed before we got to it
        };
        let Some(r_now) = doc.text_document.version() else {
            return;
        };
        if doc.snapshot.doc_version == Some(r_now) {
            return;
        }
        let text = doc.text_document.text();

        // Step 2: parse off the registry lock, against this file's build
        // directories unioned with the framework import paths.
        let mut search_dirs = self.inner.registry.build_paths_for_file(url);
        search_dirs.extend(self.inner.framework_imports.iter().cloned());

        let path = self
            .inner
            .registry
            .url_to_path(url, LookupMode::Cached)
            .unwrap_or_else(|| PathBuf::from(url));

        let mut staged = self.inner.current_env.stage_copy();
        let tree = match staged.load_file(path, LoadSource::Memory(&text), LoadOptions::default())
        {
            Ok(tree) => tree,
            Err(err) => {
                tracing::warn!(url, %err, "open-document parse failed");
                return;
            }
        };
        if let Err(err) = staged.load_pending_dependencies(&search_dirs) {
            tracing::warn!(url, %err, "dependency load failed for open document");
        }
        let is_valid = tree.is_valid();
        let parsed = DomItem::root(tree);
        self.inner.current_env.commit(staged);

        // Step 3 + 4: publish under the registry's single critical section,
        // then emit `snapshot_updated`. `DocumentRegistry::publish_snapshot`
        // performs all three version comparisons against this same `r_now`.
        self.inner.registry.publish_snapshot(url, r_now, parsed, is_valid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_publishes_snapshot_for_changed_document() {
        let registry = Arc::new(DocumentRegistry::default());
        registry.open("file:///a.qml", 1, "Item {\n}\n");
        let updater = OpenDocUpdater::new(registry.clone(), Environment::new(), Vec::new());
        updater.update_one("file:///a.qml");

        let snapshot = registry.snapshot("file:///a.qml").expect("open");
        assert_eq!(snapshot.doc_version, Some(1));
        assert!(snapshot.doc.is_some());
    }

    #[test]
    fn update_is_a_no_op_when_version_already_published() {
        let registry = Arc::new(DocumentRegistry::default());
        registry.open("file:///a.qml", 1, "Item {\n}\n");
        let updater = OpenDocUpdater::new(registry.clone(), Environment::new(), Vec::new());
        updater.update_one("file:///a.qml");
        let first = registry.snapshot("file:///a.qml").expect("open").doc_version;
        updater.update_one("file:///a.qml");
        let second = registry.snapshot("file:///a.qml").expect("open").doc_version;
        assert_eq!(first, second);
    }
}
