//! Context dispatch table: one producer per syntactic
//! kind, consulted while walking from the innermost containing node toward
//! the file root.

use std::sync::Arc;

use qml_dom::{DomItem, FileTree, NodeKind, RegionKind};

use crate::builtins::{bindable_properties, signal_handlers};
use crate::context::ContextStrings;
use crate::dedup::Dedup;
use crate::items::{CompletionItem, CompletionItemKind};
use crate::keywords::{
    GLOBAL_JS_BUILTINS, IMPORT_MODULES, PRAGMA_NAMES, PROPERTY_MODIFIER_KEYWORDS,
    STATEMENT_KEYWORDS, TYPE_NAMES,
};

/// Run the upward walk: call the per-kind producer for `node`, then for each
/// ancestor in turn, stopping at the first non-empty result.
pub fn complete(tree: &Arc<FileTree>, text: &str, offset: usize, ctx: &ContextStrings) -> Vec<CompletionItem> {
    let start = DomItem::at_offset(tree, offset);
    for node in start.ancestors() {
        let items = dispatch(&node, text, offset, ctx);
        if !items.is_empty() {
            return items;
        }
    }
    Vec::new()
}

fn dispatch(node: &DomItem, text: &str, offset: usize, ctx: &ContextStrings) -> Vec<CompletionItem> {
    match node.kind() {
        NodeKind::File => root_of_file(ctx),
        NodeKind::Pragma => pragma(node, offset),
        NodeKind::Import => import(node, offset),
        NodeKind::QmlObject | NodeKind::InlineComponent => object_body(node, ctx),
        NodeKind::PropertyDefinition => property_definition(text, node),
        NodeKind::Binding => binding_rhs(node, offset),
        NodeKind::JsIdentifier => expression_slot(node, offset),
        NodeKind::JsMemberExpression => field_member(text, node),
        NodeKind::JsBlock | NodeKind::JsCaseClause | NodeKind::JsLabelledStatement => {
            statement_slot(node, offset)
        }
        NodeKind::JsForStatement
        | NodeKind::JsWhileStatement
        | NodeKind::JsIfStatement
        | NodeKind::JsSwitchStatement
        | NodeKind::JsReturnStatement
        | NodeKind::JsThrowStatement
        | NodeKind::JsConditionalExpression
        | NodeKind::JsUnaryExpression
        | NodeKind::JsPostfixExpression
        | NodeKind::JsParenthesizedExpression
        | NodeKind::JsCallExpression
        | NodeKind::JsVariableDeclaration => expression_slot(node, offset),
        NodeKind::JsBreakStatement | NodeKind::JsContinueStatement => labelled_jump_targets(node),
        NodeKind::SignalDefinition
        | NodeKind::FunctionDefinition
        | NodeKind::EnumDefinition => Vec::new(),
    }
}

fn root_of_file(ctx: &ContextStrings) -> Vec<CompletionItem> {
    let mut dedup = Dedup::new();
    if ctx.at_line_start {
        dedup.push(CompletionItem::snippet("pragma", "pragma ${1:Name}"));
        dedup.push(CompletionItem::snippet("import", "import ${1:Module}"));
    }
    for ty in TYPE_NAMES {
        dedup.push(CompletionItem::new(*ty, CompletionItemKind::Class));
    }
    dedup.into_items()
}

fn pragma(node: &DomItem, offset: usize) -> Vec<CompletionItem> {
    let mut dedup = Dedup::new();
    let after_colon = node.region(RegionKind::ColonToken).is_some_and(|span| offset > span.start);
    if after_colon {
        if let Some(name) = node.name() {
            for value in crate::keywords::pragma_values(name) {
                dedup.push(CompletionItem::new(*value, CompletionItemKind::Constant));
            }
        }
    } else {
        for name in PRAGMA_NAMES {
            dedup.push(CompletionItem::new(*name, CompletionItemKind::Keyword));
        }
    }
    dedup.into_items()
}

fn import(node: &DomItem, offset: usize) -> Vec<CompletionItem> {
    let mut dedup = Dedup::new();
    let after_as = node.region(RegionKind::KeywordToken).is_some_and(|span| offset > span.end);
    if after_as {
        dedup.push(CompletionItem::new("Alias", CompletionItemKind::Module).with_detail("alias name"));
        return dedup.into_items();
    }
    for module in IMPORT_MODULES {
        dedup.push(CompletionItem::new(*module, CompletionItemKind::Module));
    }
    for version in ["1", "2", "6"] {
        dedup.push(CompletionItem::new(version, CompletionItemKind::Constant));
    }
    dedup.push(CompletionItem::new("as", CompletionItemKind::Keyword));
    dedup.into_items()
}

fn object_body(node: &DomItem, ctx: &ContextStrings) -> Vec<CompletionItem> {
    let mut dedup = Dedup::new();
    if ctx.at_line_start {
        dedup.push(CompletionItem::snippet("property", "property ${1:type} ${2:name}"));
        dedup.push(CompletionItem::snippet("function", "function ${1:name}(${2:args}) {\n    $0\n}"));
        dedup.push(CompletionItem::snippet("signal", "signal ${1:name}(${2:args})"));
        dedup.push(CompletionItem::snippet("enum", "enum ${1:Name} {\n    $0\n}"));
        dedup.push(CompletionItem::snippet("component", "component ${1:Name}: ${2:Base} {\n    $0\n}"));
    }
    for ty in TYPE_NAMES {
        dedup.push(CompletionItem::new(*ty, CompletionItemKind::Constructor));
    }
    if let Some(type_name) = node.name() {
        for (prop, prop_type) in bindable_properties(type_name) {
            dedup.push(CompletionItem::bindable_property(prop, prop_type));
        }
        for handler in signal_handlers(type_name) {
            dedup.push(CompletionItem::new(handler, CompletionItemKind::Method));
        }
    }
    dedup.into_items()
}

fn property_definition(text: &str, node: &DomItem) -> Vec<CompletionItem> {
    let mut dedup = Dedup::new();
    let written = node.full_region().map(|span| &text[span]).unwrap_or_default();
    for modifier in PROPERTY_MODIFIER_KEYWORDS {
        if !written.contains(modifier) {
            dedup.push(CompletionItem::new(*modifier, CompletionItemKind::Keyword));
        }
    }
    if !written.contains("property") {
        dedup.push(CompletionItem::new("property", CompletionItemKind::Keyword));
    }
    for ty in TYPE_NAMES {
        dedup.push(CompletionItem::new(*ty, CompletionItemKind::Class));
    }
    dedup.into_items()
}

fn binding_rhs(node: &DomItem, offset: usize) -> Vec<CompletionItem> {
    let after_colon = node.region(RegionKind::ColonToken).is_some_and(|span| offset > span.start);
    if !after_colon {
        return Vec::new();
    }
    let mut dedup = Dedup::new();
    for builtin in GLOBAL_JS_BUILTINS {
        dedup.push(CompletionItem::new(*builtin, CompletionItemKind::Value));
    }
    for ty in TYPE_NAMES {
        dedup.push(CompletionItem::new(*ty, CompletionItemKind::Class));
    }
    extend_with_local_scope(&mut dedup, node, offset);
    dedup.into_items()
}

fn expression_slot(node: &DomItem, offset: usize) -> Vec<CompletionItem> {
    let mut dedup = Dedup::new();
    for builtin in GLOBAL_JS_BUILTINS {
        dedup.push(CompletionItem::new(*builtin, CompletionItemKind::Value));
    }
    extend_with_local_scope(&mut dedup, node, offset);
    dedup.into_items()
}

fn statement_slot(node: &DomItem, offset: usize) -> Vec<CompletionItem> {
    let mut dedup = Dedup::new();
    for keyword in STATEMENT_KEYWORDS {
        dedup.push(CompletionItem::new(*keyword, CompletionItemKind::Keyword));
    }
    let in_loop_or_switch = node.ancestors().any(|a| a.kind().is_loop_or_switch());
    if in_loop_or_switch {
        dedup.push(CompletionItem::new("break", CompletionItemKind::Keyword));
        dedup.push(CompletionItem::new("continue", CompletionItemKind::Keyword));
    }
    let in_switch_body =
        node.parent().is_some_and(|p| p.kind() == NodeKind::JsSwitchStatement) || node.kind() == NodeKind::JsCaseClause;
    if in_switch_body {
        dedup.push(CompletionItem::new("case", CompletionItemKind::Keyword));
        dedup.push(CompletionItem::new("default", CompletionItemKind::Keyword));
    }
    for label in labelled_jump_target_names(node) {
        dedup.push(CompletionItem::new(label, CompletionItemKind::Value));
    }
    for builtin in GLOBAL_JS_BUILTINS {
        dedup.push(CompletionItem::new(*builtin, CompletionItemKind::Value));
    }
    extend_with_local_scope(&mut dedup, node, offset);
    dedup.into_items()
}

fn labelled_jump_targets(node: &DomItem) -> Vec<CompletionItem> {
    labelled_jump_target_names(node)
        .into_iter()
        .map(|label| CompletionItem::new(label, CompletionItemKind::Value))
        .collect()
}

fn labelled_jump_target_names(node: &DomItem) -> Vec<String> {
    node.ancestors()
        .filter(|a| a.kind() == NodeKind::JsLabelledStatement)
        .filter_map(|a| a.name().map(str::to_string))
        .collect()
}

fn field_member(text: &str, node: &DomItem) -> Vec<CompletionItem> {
    let Some(base_span) = node.region(RegionKind::Identifier) else { return Vec::new() };
    let base = &text[base_span];
    let mut dedup = Dedup::new();
    for (prop, prop_type) in bindable_properties(base) {
        dedup.push(CompletionItem::new(prop, CompletionItemKind::Field).with_detail(prop_type));
    }
    for handler in signal_handlers(base) {
        dedup.push(CompletionItem::new(handler, CompletionItemKind::Method));
    }
    dedup.into_items()
}

/// Walk up from `node`'s lexical scope, collecting sibling `let`/`var`/`const`
/// declarations and the enclosing object's own declared members, stopping at
/// the first object-scope boundary.
fn extend_with_local_scope(dedup: &mut Dedup, node: &DomItem, offset: usize) {
    for ancestor in node.ancestors() {
        for child in ancestor.children() {
            if child.kind() == NodeKind::JsVariableDeclaration
                && child.full_region().is_some_and(|span| span.start < offset)
            {
                if let Some(name) = child.name() {
                    dedup.push(CompletionItem::new(name, CompletionItemKind::Variable));
                }
            }
        }
        if ancestor.kind().is_object_scope_boundary() {
            for child in ancestor.children() {
                match child.kind() {
                    NodeKind::PropertyDefinition => {
                        if let Some(name) = child.name() {
                            dedup.push(CompletionItem::new(name, CompletionItemKind::Property));
                        }
                    }
                    NodeKind::FunctionDefinition => {
                        if let Some(name) = child.name() {
                            dedup.push(CompletionItem::new(name, CompletionItemKind::Function));
                        }
                    }
                    NodeKind::SignalDefinition => {
                        if let Some(name) = child.name() {
                            dedup.push(CompletionItem::new(name, CompletionItemKind::Method));
                        }
                    }
                    _ => {}
                }
            }
            if let Some(type_name) = ancestor.name() {
                for (prop, prop_type) in bindable_properties(type_name) {
                    dedup.push(CompletionItem::new(prop, CompletionItemKind::Property).with_detail(prop_type));
                }
            }
            break;
        }
    }
}
