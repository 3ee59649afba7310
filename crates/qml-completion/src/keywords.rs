//! Static keyword and pragma tables.
//!
//! The real module/type index is an external collaborator (the type
//! resolver and its import graph). These tables are a stand-in, in the same
//! spirit as `qml_dom::parser`'s regex scanner standing in for the real
//! lexer/parser.

/// Recognized `pragma` names.
pub const PRAGMA_NAMES: &[&str] =
    &["Singleton", "ComponentBehavior", "FunctionSignatureBehavior", "ValueTypeBehavior"];

/// Legal values for a pragma that takes one, keyed by pragma name.
pub fn pragma_values(name: &str) -> &'static [&'static str] {
    match name {
        "ComponentBehavior" => &["Bound", "Unbound"],
        "FunctionSignatureBehavior" => &["Ignored", "Enforced"],
        "ValueTypeBehavior" => &["Copy", "Reference", "Addressable"],
        _ => &[],
    }
}

/// Modules offered after `import `.
pub const IMPORT_MODULES: &[&str] =
    &["QtQuick", "QtQuick.Controls", "QtQuick.Layouts", "QtQuick.Window", "QtQml"];

/// Modifier keywords legal before `property` in a property definition.
pub const PROPERTY_MODIFIER_KEYWORDS: &[&str] = &["readonly", "required", "default"];

/// Type names offered for a property declaration's type slot and for
/// default-binding child objects.
pub const TYPE_NAMES: &[&str] = &[
    "int", "real", "double", "bool", "string", "url", "var", "list", "point", "size", "rect",
    "color", "date", "Item", "Rectangle", "Text", "Image", "MouseArea", "Column", "Row", "Grid",
    "ListView", "Repeater", "Timer", "Connections", "Component",
];

/// Global JS built-ins offered at any JS-expression position.
pub const GLOBAL_JS_BUILTINS: &[&str] =
    &["Math", "console", "Date", "JSON", "Array", "Object", "String", "Number", "Boolean"];

/// JS statement-level keywords.
pub const STATEMENT_KEYWORDS: &[&str] =
    &["let", "var", "const", "for", "while", "if", "switch", "return", "throw", "function"];
