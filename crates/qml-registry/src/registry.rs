//! The process-wide open-document registry.

use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use lsp_types::TextDocumentContentChangeEvent;
use parking_lot::RwLock;
use qml_dom::DomItem;
use qml_text::TextDocument;
use qml_uri::{LookupMode, UrlPathCache};
use rustc_hash::FxHashMap;

use crate::build_dirs::{BuildDirRegistry, SettingsLookup};
use crate::document::{OpenDocument, OpenDocumentSnapshot};
use crate::events::SnapshotBus;

/// Process-wide map from document URL to [`OpenDocument`], plus the URL↔path
/// cache and build-directory registry that live alongside it.
pub struct DocumentRegistry {
    docs: RwLock<FxHashMap<String, OpenDocument>>,
    uri_cache: UrlPathCache,
    build_dirs: BuildDirRegistry,
    snapshot_bus: SnapshotBus,
}

impl DocumentRegistry {
    /// Create an empty registry.
    pub fn new(env_fallback: Vec<PathBuf>, settings_lookup: Option<SettingsLookup>) -> Self {
        Self {
            docs: RwLock::new(FxHashMap::default()),
            uri_cache: UrlPathCache::new(),
            build_dirs: BuildDirRegistry::new(env_fallback, settings_lookup),
            snapshot_bus: SnapshotBus::new(),
        }
    }

    // -- text sync -----------------------------------------------------

    /// `textDocument/didOpen`.
    pub fn open(&self, url: &str, version: i32, text: &str) {
        let text_document = TextDocument::new(text, Some(version));
        self.docs.write().insert(url.to_string(), OpenDocument::new(text_document));
    }

    /// `textDocument/didChange` (incremental).
    ///
    /// Applies each change in order under the document's own lock; a
    /// change carrying a stale version is discarded (logged, not fatal) by
    /// [`qml_text::TextDocument::apply_change`] and simply stops the
    /// sequence.
    pub fn change(&self, url: &str, version: i32, changes: &[TextDocumentContentChangeEvent]) {
        let text_document = {
            let docs = self.docs.read();
            docs.get(url).map(|d| d.text_document.clone())
        };
        let Some(text_document) = text_document else {
            tracing::warn!(url, "didChange for unknown document");
            return;
        };
        for change in changes {
            if let Err(err) = text_document.apply_change(change.range, &change.text, version) {
                tracing::warn!(url, %err, "discarding stale didChange");
                return;
            }
        }
    }

    /// `textDocument/didClose`.
    pub fn close(&self, url: &str) {
        self.docs.write().remove(url);
        self.uri_cache.invalidate(url);
    }

    // -- snapshots -------------------------------------------------------

    /// A copy of the current snapshot for `url`, if the document is open.
    pub fn snapshot(&self, url: &str) -> Option<OpenDocumentSnapshot> {
        self.docs.read().get(url).map(|d| d.snapshot.clone())
    }

    /// A copy of the full open-document record for `url`.
    pub fn open_document(&self, url: &str) -> Option<OpenDocument> {
        self.docs.read().get(url).cloned()
    }

    /// Whether `url` is currently open.
    pub fn is_open(&self, url: &str) -> bool {
        self.docs.read().contains_key(url)
    }

    /// Apply the open-document updater's publish protocol under a single critical section, so readers never see a torn
    /// combination of `doc`/`valid_doc`.
    ///
    /// `r_now` is the text-document version the parse was taken against.
    /// Returns `true` if anything was published (and therefore a
    /// `snapshot_updated` event should fire).
    pub fn publish_snapshot(
        &self,
        url: &str,
        r_now: i32,
        parsed: DomItem,
        is_valid: bool,
    ) -> bool {
        let mut docs = self.docs.write();
        let Some(doc) = docs.get_mut(url) else {
            return false; // closed meanwhile
        };
        if let Some(current) = doc.text_document.version() {
            if current > r_now {
                return false; // superseded by a newer edit already
            }
        }
        let mut changed = false;
        if doc.snapshot.doc_version.is_none_or(|v| v < r_now) {
            doc.snapshot.doc_version = Some(r_now);
            doc.snapshot.doc = Some(parsed.clone());
            changed = true;
        }
        if is_valid && doc.snapshot.valid_doc_version.is_none_or(|v| v < r_now) {
            doc.snapshot.valid_doc_version = Some(r_now);
            doc.snapshot.valid_doc = Some(parsed);
            changed = true;
        }
        drop(docs);
        if changed {
            self.snapshot_bus.publish(url);
        }
        changed
    }

    /// Subscribe to `snapshot_updated(url)` events.
    pub fn subscribe_snapshot_updated(&self) -> Receiver<String> {
        self.snapshot_bus.subscribe()
    }

    /// URLs of every currently open document, for the updater's worklist.
    pub fn open_urls(&self) -> Vec<String> {
        self.docs.read().keys().cloned().collect()
    }

    // -- path canonicalization -------------------------------------------

    /// Resolve `url` to a canonical filesystem path.
    pub fn url_to_path(&self, url: &str, mode: LookupMode) -> Option<PathBuf> {
        self.uri_cache.url_to_path(url, mode)
    }

    /// Resolve `path` to its document URL.
    pub fn path_to_url(&self, path: &Path, mode: LookupMode) -> Option<String> {
        self.uri_cache.path_to_url(path, mode)
    }

    // -- workspace roots & build directories ------------------------------

    /// Register a workspace root URL.
    pub fn add_root(&self, root_url: String) {
        self.build_dirs.add_root(root_url);
    }

    /// Remove a previously registered workspace root URL.
    pub fn remove_root(&self, root_url: &str) {
        self.build_dirs.remove_root(root_url);
    }

    /// Apply a `$/addBuildDirs` payload entry.
    pub fn set_build_dirs(&self, root_url: String, dirs: Vec<PathBuf>) {
        self.build_dirs.set_build_dirs(root_url, dirs);
    }

    /// Resolve the build directories to search when analyzing `url`.
    pub fn build_paths_for_file(&self, url: &str) -> Vec<PathBuf> {
        let path = self
            .url_to_path(url, LookupMode::Cached)
            .unwrap_or_else(|| PathBuf::from(url));
        self.build_dirs.build_paths_for_file(url, &path)
    }
}

impl Default for DocumentRegistry {
    fn default() -> Self {
        Self::new(Vec::new(), None)
    }
}

/// Re-exported for callers that need the `Arc` form to share a registry
/// across the coordinator's background workers.
pub type SharedRegistry = Arc<DocumentRegistry>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_close_reopen_is_indistinguishable_from_a_single_open() {
        let registry = DocumentRegistry::default();
        registry.open("file:///a.qml", 1, "Item {}");
        registry.close("file:///a.qml");
        registry.open("file:///a.qml", 1, "Item {}");
        let doc = registry.open_document("file:///a.qml").expect("open");
        assert_eq!(doc.text_document.version(), Some(1));
        assert_eq!(doc.text_document.text(), "Item {}");
    }

    #[test]
    fn publish_snapshot_enforces_monotonic_doc_version() {
        use qml_dom::{parser, DomItem as _};
        let registry = DocumentRegistry::default();
        registry.open("file:///a.qml", 2, "Item {}");
        let outcome = parser::parse_source(Path::new("a.qml"), "Item {}");
        let item = qml_dom::DomItem::root(outcome.tree);

        assert!(registry.publish_snapshot("file:///a.qml", 2, item.clone(), true));
        assert_eq!(registry.snapshot("file:///a.qml").unwrap().doc_version, Some(2));

        // A stale publish (r_now=1) must not regress the published version.
        assert!(!registry.publish_snapshot("file:///a.qml", 1, item, true));
        assert_eq!(registry.snapshot("file:///a.qml").unwrap().doc_version, Some(2));
    }
}
