//! Stand-in prototype-chain data for built-in QtQuick-like types.
//!
//! Real property/signal resolution walks the containing object's prototype
//! chain through the type resolver (an external collaborator per the
//! specification this module implements). This table gives the dispatch
//! producers something concrete to offer without that resolver.

/// `(property name, type name)` pairs bindable on `type_name`, including
/// those inherited from `Item`.
pub fn bindable_properties(type_name: &str) -> Vec<(&'static str, &'static str)> {
    let mut props = vec![
        ("x", "real"),
        ("y", "real"),
        ("width", "real"),
        ("height", "real"),
        ("visible", "bool"),
        ("enabled", "bool"),
        ("opacity", "real"),
        ("anchors", "Anchors"),
        ("id", "string"),
    ];
    match type_name {
        "Rectangle" => props.extend([("color", "color"), ("radius", "real"), ("border", "Border")]),
        "Text" => props.extend([("text", "string"), ("color", "color"), ("font", "font")]),
        "Image" => props.extend([("source", "url"), ("fillMode", "int")]),
        "MouseArea" => props.extend([("pressed", "bool"), ("hoverEnabled", "bool")]),
        "ListView" => props.extend([("model", "var"), ("delegate", "Component"), ("currentIndex", "int")]),
        "Repeater" => props.extend([("model", "var"), ("delegate", "Component")]),
        "Timer" => props.extend([("interval", "int"), ("running", "bool"), ("repeat", "bool")]),
        _ => {}
    }
    props
}

/// Signal-handler names (`onXyz`) offered in the body of `type_name`.
pub fn signal_handlers(type_name: &str) -> Vec<&'static str> {
    let mut handlers = vec!["onCompleted", "onDestruction"];
    match type_name {
        "MouseArea" => handlers.extend(["onClicked", "onPressed", "onReleased", "onEntered", "onExited"]),
        "Timer" => handlers.push("onTriggered"),
        "ListView" => handlers.push("onCurrentIndexChanged"),
        _ => {}
    }
    handlers
}
