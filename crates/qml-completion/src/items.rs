//! Completion item types.

/// The category of a single completion suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CompletionItemKind {
    /// A reserved word (`property`, `readonly`, `import`, `for`, …).
    Keyword,
    /// An importable module.
    Module,
    /// A type name usable as an object or property type.
    Class,
    /// A type name offered where a default-binding child object is legal.
    Constructor,
    /// A bindable property of some prototype.
    Property,
    /// A signal-handler name (`onXyz`).
    Method,
    /// A declared `function`.
    Function,
    /// A member of a resolved type (`a.b`).
    Field,
    /// A local JS variable or `let`/`var`/`const` binding.
    Variable,
    /// A reachable singleton, attached type, or id.
    Value,
    /// An enum member.
    Constant,
    /// An `enum` type name.
    Enum,
    /// A member of a resolved enum type.
    EnumMember,
    /// A multi-token construct with placeholder markers.
    Snippet,
    /// A filesystem path segment.
    File,
}

/// A single completion suggestion.
#[derive(Debug, Clone)]
pub struct CompletionItem {
    /// The text shown to the user and matched against the dedup tracker.
    pub label: String,
    /// The suggestion's category.
    pub kind: CompletionItemKind,
    /// Short descriptive text (e.g. a type signature).
    pub detail: Option<String>,
    /// Longer-form documentation.
    pub documentation: Option<String>,
    /// Text to insert if it differs from `label` (snippets use placeholder
    /// markers `${1:name}`/`$0` here).
    pub insert_text: Option<String>,
    /// Overrides the label for sort ordering.
    pub sort_text: Option<String>,
    /// Overrides the label for client-side fuzzy filtering.
    pub filter_text: Option<String>,
}

impl CompletionItem {
    /// A plain item whose `insert_text` equals its `label`.
    pub fn new(label: impl Into<String>, kind: CompletionItemKind) -> Self {
        Self {
            label: label.into(),
            kind,
            detail: None,
            documentation: None,
            insert_text: None,
            sort_text: None,
            filter_text: None,
        }
    }

    /// Attach detail text.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// A snippet item: `insert_text` carries placeholder markers and differs
    /// from `label`.
    pub fn snippet(label: impl Into<String>, insert_text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: CompletionItemKind::Snippet,
            detail: None,
            documentation: None,
            insert_text: Some(insert_text.into()),
            sort_text: None,
            filter_text: None,
        }
    }

    /// A bindable-property completion: insert text ends with `: ` to prime
    /// the client's next edit for the value.
    pub fn bindable_property(label: impl Into<String>, type_name: &str) -> Self {
        let label = label.into();
        let insert_text = format!("{label}: ");
        Self {
            label,
            kind: CompletionItemKind::Property,
            detail: Some(type_name.to_string()),
            documentation: None,
            insert_text: Some(insert_text),
            sort_text: None,
            filter_text: None,
        }
    }

    /// The text this item would insert, defaulting to the label.
    pub fn effective_insert_text(&self) -> &str {
        self.insert_text.as_deref().unwrap_or(&self.label)
    }
}
