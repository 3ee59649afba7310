//! Per-URL open document state.

use qml_dom::DomItem;
use qml_text::TextDocument;

/// An immutable view of an open document at a specific version: the latest
/// parse and the latest *valid* parse, published only by the open-document
/// updater.
///
/// Invariant: `valid_doc_version <= doc_version` whenever both are
/// set.
#[derive(Clone, Default)]
pub struct OpenDocumentSnapshot {
    /// Version of the latest parse, valid or not.
    pub doc_version: Option<i32>,
    /// The latest parse itself.
    pub doc: Option<DomItem>,
    /// Version of the latest *structurally valid* parse.
    pub valid_doc_version: Option<i32>,
    /// The latest structurally valid parse.
    pub valid_doc: Option<DomItem>,
    /// Reserved for future semantic-scope caching.
    pub scope_version: Option<i32>,
}

/// A document the client currently has open.
#[derive(Clone)]
pub struct OpenDocument {
    /// The live, mutable text buffer.
    pub text_document: TextDocument,
    /// The most recently published snapshot (may be stale relative to
    /// `text_document`, until the updater catches up).
    pub snapshot: OpenDocumentSnapshot,
}

impl OpenDocument {
    /// A freshly opened document with no snapshot yet.
    pub fn new(text_document: TextDocument) -> Self {
        Self { text_document, snapshot: OpenDocumentSnapshot::default() }
    }
}
