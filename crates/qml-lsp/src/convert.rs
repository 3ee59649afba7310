//! Conversions from the core's value types to `lsp_types` wire types.

use lsp_types::{CompletionItem as LspCompletionItem, CompletionItemKind as LspKind};
use qml_completion::{CompletionItem, CompletionItemKind};

/// Translate one core completion item into its LSP wire form.
pub fn completion_item(item: CompletionItem) -> LspCompletionItem {
    let insert_text = Some(item.effective_insert_text().to_string());
    LspCompletionItem {
        label: item.label,
        kind: Some(completion_item_kind(item.kind)),
        detail: item.detail,
        documentation: item.documentation.map(lsp_types::Documentation::String),
        insert_text,
        filter_text: item.filter_text,
        sort_text: item.sort_text,
        ..Default::default()
    }
}

fn completion_item_kind(kind: CompletionItemKind) -> LspKind {
    match kind {
        CompletionItemKind::Keyword => LspKind::KEYWORD,
        CompletionItemKind::Module => LspKind::MODULE,
        CompletionItemKind::Class => LspKind::CLASS,
        CompletionItemKind::Constructor => LspKind::CONSTRUCTOR,
        CompletionItemKind::Property => LspKind::PROPERTY,
        CompletionItemKind::Method => LspKind::METHOD,
        CompletionItemKind::Function => LspKind::FUNCTION,
        CompletionItemKind::Field => LspKind::FIELD,
        CompletionItemKind::Variable => LspKind::VARIABLE,
        CompletionItemKind::Value => LspKind::VALUE,
        CompletionItemKind::Constant => LspKind::CONSTANT,
        CompletionItemKind::Enum => LspKind::ENUM,
        CompletionItemKind::EnumMember => LspKind::ENUM_MEMBER,
        CompletionItemKind::Snippet => LspKind::SNIPPET,
        CompletionItemKind::File => LspKind::FILE,
    }
}

/// Canonicalize a JSON-RPC request id (number or string) into the string
/// form `qml-coordinator` keys in-flight requests by.
pub fn canonical_id(id: &serde_json::Value) -> String {
    match id {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
