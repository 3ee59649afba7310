//! Context-aware completion engine: the representative analysis module atop
//! the coordinator.

#![warn(missing_docs)]

mod builtins;
mod context;
mod dedup;
mod dispatch;
mod items;
mod keywords;

use std::sync::Arc;

pub use context::ContextStrings;
pub use items::{CompletionItem, CompletionItemKind};

use lsp_types::Position;
use qml_coordinator::{PendingRequest, RequestCoordinator};
use qml_protocol::LspError;
use qml_registry::DocumentRegistry;

/// A single `textDocument/completion` request's parameters.
#[derive(Debug, Clone)]
pub struct CompletionParams {
    /// The document the request concerns.
    pub url: String,
    /// Cursor position, in LSP `(line, character)` form.
    pub position: Position,
}

/// Computes completion items for a document snapshot and cursor position.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionEngine;

impl CompletionEngine {
    /// A fresh engine. Stateless: all per-request state lives in the
    /// registry snapshot passed to [`Self::complete`].
    pub fn new() -> Self {
        Self
    }

    /// Compute completions for `params` against `registry`'s current state.
    ///
    /// Errors with [`LspError::request_target`] if the document is unknown,
    /// closed, has never produced a parse, or `params.position` falls
    /// outside the document text.
    pub fn complete(
        &self,
        registry: &DocumentRegistry,
        params: &CompletionParams,
    ) -> Result<Vec<CompletionItem>, LspError> {
        let doc = registry
            .open_document(&params.url)
            .ok_or_else(|| LspError::request_target(format!("unknown document: {}", params.url)))?;
        let tree = doc
            .snapshot
            .doc
            .as_ref()
            .or(doc.snapshot.valid_doc.as_ref())
            .map(|item| Arc::clone(item.tree()))
            .ok_or_else(|| LspError::request_target("document has not produced a parse yet"))?;

        let text = doc.text_document.text();
        let offset = doc.text_document.offset_of(params.position);
        if offset > text.len() {
            return Err(LspError::request_target("position outside document"));
        }

        let ctx = context::compute(&text, offset);
        Ok(dispatch::complete(&tree, &text, offset, &ctx))
    }

    /// Build a [`RequestCoordinator`] that answers version-gated completion
    /// requests by calling [`Self::complete`] against `registry`'s snapshot
    /// at dispatch time.
    pub fn coordinator(
        registry: Arc<DocumentRegistry>,
    ) -> RequestCoordinator<CompletionParams, Vec<CompletionItem>> {
        let engine = Self::new();
        RequestCoordinator::new(Arc::clone(&registry), move |req: PendingRequest<CompletionParams, Vec<CompletionItem>>| {
            if req.is_canceled() {
                req.respond_error(LspError::cancelled());
                return;
            }
            match engine.complete(&registry, &req.params) {
                Ok(items) => req.respond(items),
                Err(err) => req.respond_error(err),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(registry: &DocumentRegistry, url: &str, text: &str) {
        registry.open(url, 1, text);
        let tree = qml_dom::parser::parse_source(std::path::Path::new(url), text).tree;
        let valid = tree.is_valid();
        registry.publish_snapshot(url, 1, qml_dom::DomItem::root(tree), valid);
    }

    #[test]
    fn empty_object_body_offers_declarations_and_nested_type() {
        let registry = DocumentRegistry::default();
        let text = "import QtQuick\nRectangle {\n    \n}\n";
        open(&registry, "file:///A.qml", text);

        let engine = CompletionEngine::new();
        let params = CompletionParams { url: "file:///A.qml".to_string(), position: Position { line: 2, character: 4 } };
        let items = engine.complete(&registry, &params).expect("completion succeeds");
        let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();

        for expected in ["property", "function", "signal", "Rectangle", "width"] {
            assert!(labels.contains(&expected), "missing {expected} in {labels:?}");
        }
        for forbidden in ["QtQuick", "vector4d"] {
            assert!(!labels.contains(&forbidden), "unexpected {forbidden} in {labels:?}");
        }
    }

    #[test]
    fn unknown_document_is_a_request_target_error() {
        let registry = DocumentRegistry::default();
        let engine = CompletionEngine::new();
        let params = CompletionParams { url: "file:///missing.qml".to_string(), position: Position::default() };
        let err = engine.complete(&registry, &params).expect_err("unknown document");
        assert_eq!(err.code, qml_protocol::REQUEST_TARGET_ERROR);
    }

    #[test]
    fn no_duplicate_label_kind_pairs_in_a_single_list() {
        let registry = DocumentRegistry::default();
        let text = "Rectangle {\n    \n}\n";
        open(&registry, "file:///B.qml", text);

        let engine = CompletionEngine::new();
        let params = CompletionParams { url: "file:///B.qml".to_string(), position: Position { line: 1, character: 4 } };
        let items = engine.complete(&registry, &params).expect("completion succeeds");
        let mut seen = std::collections::HashSet::new();
        for item in &items {
            assert!(seen.insert((item.label.clone(), item.kind)), "duplicate {:?}", item.label);
        }
    }
}
