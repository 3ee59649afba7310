//! Reference parser: text → [`FileTree`].
//!
//! A real lexer, parser, and type resolver for the full markup grammar are
//! deliberately out of scope here; this module is a small stand-in, good
//! enough to produce a `DomItem` tree with file-location regions that the
//! coordinator and completion engine can be exercised against. It is not a
//! claim to a complete grammar for the markup language.
//!
//! Supported surface: `pragma Name[: value];`, `import Module[.Sub] [1.2]
//! [as Alias];`, nested `Identifier { ... }` object bodies,
//! `[readonly|required|default] property Type name[: expr];`,
//! `name: expr;` bindings, `signal name(...);`, `function name(...) {
//! ... }`, `enum Name { ... }`, `component Name: Base { ... }`, and inside
//! function bodies a line-oriented scan for `for`/`while`/`if`/`switch`/
//! `case`/`return`/`throw`/`break`/`continue`/labelled statements and
//! `let`/`var`/`const` declarations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::arena::{FileTree, NodeId};
use crate::kind::{NodeKind, RegionKind};

/// Outcome of parsing a file: the tree plus whether it parsed cleanly
/// enough to be considered structurally valid.
pub struct ParseOutcome {
    /// The resulting tree, always present: even a parse riddled with
    /// errors still has *a* root and whatever was recovered, so a failed
    /// parse never removes a file's last-known-good tree out from under
    /// callers.
    pub tree: Arc<FileTree>,
}

static PRAGMA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*pragma\s+(\w+)\s*(?::\s*(\S+))?\s*;?").expect("valid regex"));
static IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*import\s+([\w.]+)(?:\s+(\d+)(?:\.(\d+))?)?(?:\s+as\s+(\w+))?\s*;?")
        .expect("valid regex")
});
static OBJECT_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Z][\w.]*)\s*\{").expect("valid regex"));
static COMPONENT_OPEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*component\s+(\w+)\s*:\s*([A-Z][\w.]*)\s*\{").expect("valid regex")
});
static PROPERTY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(readonly\s+|required\s+|default\s+)*property\s+([\w<>]+)\s+(\w+)\s*(:\s*([^;]*))?;?")
        .expect("valid regex")
});
static SIGNAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*signal\s+(\w+)\s*\(([^)]*)\)\s*;?").expect("valid regex"));
static FUNCTION_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*function\s+(\w+)\s*\(([^)]*)\)\s*\{").expect("valid regex"));
static ENUM_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*enum\s+(\w+)\s*\{").expect("valid regex"));
static BINDING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\w+)\s*:\s*([^;\{]*);?").expect("valid regex"));

/// Parse `text` (the contents of `path`) into a [`FileTree`].
///
/// Never fails outright: malformed input yields a tree with
/// [`FileTree::is_valid`] false (it never made it past the top-level object
/// scan) rather than an `Err`. The caller decides whether to promote the
/// result into the valid environment.
pub fn parse_source(path: &Path, text: &str) -> ParseOutcome {
    let mut tree = FileTree::new(path.to_path_buf());
    let mut valid = true;

    let mut offset = 0usize;
    let mut cursor = text;
    let mut saw_object = false;

    loop {
        let trimmed_start = cursor.len() - cursor.trim_start().len();
        offset += trimmed_start;
        cursor = cursor.trim_start();
        if cursor.is_empty() {
            break;
        }

        if let Some(caps) = PRAGMA_RE.captures(cursor) {
            let whole = caps.get(0).expect("group 0 always matches").as_str();
            let name = caps.get(1).map(|m| m.as_str().to_string());
            let node = tree.push_child(NodeId::ROOT, NodeKind::Pragma, name);
            tree.set_region(node, RegionKind::FullRegion, offset..offset + whole.len());
            if let Some(value) = caps.get(2) {
                tree.set_region(
                    node,
                    RegionKind::ColonToken,
                    offset + value.start() - 1..offset + value.start(),
                );
            }
            offset += whole.len();
            cursor = &cursor[whole.len()..];
            continue;
        }

        if let Some(caps) = IMPORT_RE.captures(cursor) {
            let whole = caps.get(0).expect("group 0 always matches").as_str();
            let module = caps.get(1).map(|m| m.as_str().to_string());
            let node = tree.push_child(NodeId::ROOT, NodeKind::Import, module);
            tree.set_region(node, RegionKind::FullRegion, offset..offset + whole.len());
            if let Some(alias_kw) = whole.find(" as ") {
                tree.set_region(
                    node,
                    RegionKind::KeywordToken,
                    offset + alias_kw + 1..offset + alias_kw + 3,
                );
            }
            offset += whole.len();
            cursor = &cursor[whole.len()..];
            continue;
        }

        if let Some(caps) = COMPONENT_OPEN_RE.captures(cursor) {
            let name = caps.get(1).map(|m| m.as_str().to_string());
            let open_at = caps.get(0).expect("group 0 always matches").as_str().len();
            let (body, consumed) = take_balanced_braces(&cursor[open_at - 1..]);
            let whole_len = open_at - 1 + consumed;
            let node = tree.push_child(NodeId::ROOT, NodeKind::InlineComponent, name);
            tree.set_region(node, RegionKind::FullRegion, offset..offset + whole_len);
            parse_object_body(&mut tree, node, body, offset + open_at);
            saw_object = true;
            offset += whole_len;
            cursor = &cursor[whole_len..];
            continue;
        }

        if let Some(caps) = OBJECT_OPEN_RE.captures(cursor) {
            let name = caps.get(1).map(|m| m.as_str().to_string());
            let open_at = caps.get(0).expect("group 0 always matches").as_str().len();
            let (body, consumed) = take_balanced_braces(&cursor[open_at - 1..]);
            let whole_len = open_at - 1 + consumed;
            let node = tree.push_child(NodeId::ROOT, NodeKind::QmlObject, name);
            tree.set_region(node, RegionKind::FullRegion, offset..offset + whole_len);
            parse_object_body(&mut tree, node, body, offset + open_at);
            saw_object = true;
            offset += whole_len;
            cursor = &cursor[whole_len..];
            continue;
        }

        // Nothing recognized: stop. The remainder is treated as unparsed
        // trailing content; the file is still considered invalid since we
        // could not account for every byte.
        valid = false;
        break;
    }

    if !saw_object {
        valid = false;
    }
    tree.is_valid = valid;
    ParseOutcome { tree: Arc::new(tree) }
}

/// Consume a `{ ... }` block starting at `text[0] == '{'`, respecting
/// nested braces and skipping braces inside string literals. Returns the
/// inner body (without the outer braces) and the total number of bytes
/// consumed including both braces.
fn take_balanced_braces(text: &str) -> (&str, usize) {
    let bytes = text.as_bytes();
    debug_assert_eq!(bytes.first(), Some(&b'{'));
    let mut depth = 0i32;
    let mut in_string: Option<u8> = None;
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = in_string {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                in_string = None;
            }
        } else {
            match b {
                b'"' | b'\'' => in_string = Some(b),
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return (&text[1..i], i + 1);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    (&text[1.min(text.len())..], text.len())
}

fn parse_object_body(tree: &mut FileTree, parent: NodeId, body: &str, body_start: usize) {
    let mut offset = body_start;
    let mut cursor = body;

    loop {
        let trimmed_start = cursor.len() - cursor.trim_start().len();
        offset += trimmed_start;
        cursor = cursor.trim_start();
        if cursor.is_empty() {
            break;
        }

        if let Some(caps) = PROPERTY_RE.captures(cursor) {
            let whole = caps.get(0).expect("group 0 always matches").as_str();
            let name = caps.get(3).map(|m| m.as_str().to_string());
            let node = tree.push_child(parent, NodeKind::PropertyDefinition, name);
            tree.set_region(node, RegionKind::FullRegion, offset..offset + whole.len());
            offset += whole.len();
            cursor = &cursor[whole.len()..];
            continue;
        }

        if let Some(caps) = SIGNAL_RE.captures(cursor) {
            let whole = caps.get(0).expect("group 0 always matches").as_str();
            let name = caps.get(1).map(|m| m.as_str().to_string());
            let node = tree.push_child(parent, NodeKind::SignalDefinition, name);
            tree.set_region(node, RegionKind::FullRegion, offset..offset + whole.len());
            offset += whole.len();
            cursor = &cursor[whole.len()..];
            continue;
        }

        if let Some(caps) = ENUM_OPEN_RE.captures(cursor) {
            let name = caps.get(1).map(|m| m.as_str().to_string());
            let open_at = caps.get(0).expect("group 0 always matches").as_str().len();
            let (_, consumed) = take_balanced_braces(&cursor[open_at - 1..]);
            let whole_len = open_at - 1 + consumed;
            let node = tree.push_child(parent, NodeKind::EnumDefinition, name);
            tree.set_region(node, RegionKind::FullRegion, offset..offset + whole_len);
            offset += whole_len;
            cursor = &cursor[whole_len..];
            continue;
        }

        if let Some(caps) = FUNCTION_OPEN_RE.captures(cursor) {
            let name = caps.get(1).map(|m| m.as_str().to_string());
            let paren_rel = cursor.find('(').unwrap_or(0);
            let open_at = caps.get(0).expect("group 0 always matches").as_str().len();
            let (body, consumed) = take_balanced_braces(&cursor[open_at - 1..]);
            let whole_len = open_at - 1 + consumed;
            let node = tree.push_child(parent, NodeKind::FunctionDefinition, name);
            tree.set_region(node, RegionKind::FullRegion, offset..offset + whole_len);
            tree.set_region(
                node,
                RegionKind::LeftParenthesis,
                offset + paren_rel..offset + paren_rel + 1,
            );
            let block = tree.push_child(node, NodeKind::JsBlock, None);
            tree.set_region(block, RegionKind::FullRegion, offset + open_at - 1..offset + whole_len);
            parse_js_block(tree, block, body, offset + open_at);
            offset += whole_len;
            cursor = &cursor[whole_len..];
            continue;
        }

        if let Some(caps) = COMPONENT_OPEN_RE.captures(cursor) {
            let name = caps.get(1).map(|m| m.as_str().to_string());
            let open_at = caps.get(0).expect("group 0 always matches").as_str().len();
            let (inner, consumed) = take_balanced_braces(&cursor[open_at - 1..]);
            let whole_len = open_at - 1 + consumed;
            let node = tree.push_child(parent, NodeKind::InlineComponent, name);
            tree.set_region(node, RegionKind::FullRegion, offset..offset + whole_len);
            parse_object_body(tree, node, inner, offset + open_at);
            offset += whole_len;
            cursor = &cursor[whole_len..];
            continue;
        }

        if let Some(caps) = OBJECT_OPEN_RE.captures(cursor) {
            let name = caps.get(1).map(|m| m.as_str().to_string());
            let open_at = caps.get(0).expect("group 0 always matches").as_str().len();
            let (inner, consumed) = take_balanced_braces(&cursor[open_at - 1..]);
            let whole_len = open_at - 1 + consumed;
            let node = tree.push_child(parent, NodeKind::QmlObject, name);
            tree.set_region(node, RegionKind::FullRegion, offset..offset + whole_len);
            parse_object_body(tree, node, inner, offset + open_at);
            offset += whole_len;
            cursor = &cursor[whole_len..];
            continue;
        }

        if let Some(caps) = BINDING_RE.captures(cursor) {
            let whole = caps.get(0).expect("group 0 always matches").as_str();
            let name = caps.get(1).map(|m| m.as_str().to_string());
            let colon_rel = cursor.find(':').unwrap_or(0);
            let node = tree.push_child(parent, NodeKind::Binding, name);
            tree.set_region(node, RegionKind::FullRegion, offset..offset + whole.len());
            tree.set_region(
                node,
                RegionKind::ColonToken,
                offset + colon_rel..offset + colon_rel + 1,
            );
            offset += whole.len();
            cursor = &cursor[whole.len()..];
            continue;
        }

        // Unrecognized token inside an object body: skip one character so
        // we make forward progress rather than looping forever.
        offset += 1;
        cursor = &cursor[1..];
    }
}

static FOR_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*for\s*\(").expect("valid regex"));
static WHILE_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*while\s*\(").expect("valid regex"));
static IF_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*if\s*\(").expect("valid regex"));
static SWITCH_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*switch\s*\(").expect("valid regex"));
static CASE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(case\s+[^:]+|default)\s*:").expect("valid regex"));
static RETURN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*return\b[^;]*;?").expect("valid regex"));
static THROW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*throw\b[^;]*;?").expect("valid regex"));
static BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*break\b\s*\w*\s*;?").expect("valid regex"));
static CONTINUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*continue\b\s*\w*\s*;?").expect("valid regex"));
static VAR_DECL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(let|var|const)\s+(\w+)\s*(=\s*[^;]*)?;?").expect("valid regex"));
static LABEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\w+)\s*:\s*(?:for|while)\b").expect("valid regex"));
static IDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([A-Za-z_]\w*)").expect("valid regex"));

/// Line/token-oriented scan of a JS statement block. Intentionally shallow:
/// enough to place the statement-kind nodes and token regions the
/// completion engine's dispatch table reads, not a full expression grammar.
fn parse_js_block(tree: &mut FileTree, parent: NodeId, body: &str, body_start: usize) {
    let mut offset = body_start;
    let mut cursor = body;

    loop {
        let trimmed_start = cursor.len() - cursor.trim_start().len();
        offset += trimmed_start;
        cursor = cursor.trim_start();
        if cursor.is_empty() {
            break;
        }

        if LABEL_RE.is_match(cursor) {
            let colon_rel = cursor.find(':').unwrap_or(0);
            let name = IDENT_RE.captures(cursor).and_then(|c| c.get(1)).map(|m| m.as_str().to_string());
            let node = tree.push_child(parent, NodeKind::JsLabelledStatement, name);
            tree.set_region(node, RegionKind::ColonToken, offset + colon_rel..offset + colon_rel + 1);
            offset += colon_rel + 1;
            cursor = &cursor[colon_rel + 1..];
            continue;
        }

        if FOR_OPEN_RE.is_match(cursor) {
            let paren_rel = cursor.find('(').unwrap_or(0);
            let (head, head_len) = take_balanced_parens(&cursor[paren_rel..]);
            let whole_head_len = paren_rel + head_len;
            let node = tree.push_child(parent, NodeKind::JsForStatement, None);
            tree.set_region(node, RegionKind::LeftParenthesis, offset + paren_rel..offset + paren_rel + 1);
            mark_for_head_tokens(tree, node, head, offset + paren_rel + 1);
            let after_head = &cursor[whole_head_len..];
            let (rest_len, block_parent) = consume_statement_or_block(
                tree,
                node,
                after_head,
                offset + whole_head_len,
                NodeKind::JsBlock,
            );
            let _ = block_parent;
            let total = whole_head_len + rest_len;
            tree.set_region(node, RegionKind::FullRegion, offset..offset + total);
            offset += total;
            cursor = &cursor[total..];
            continue;
        }

        if WHILE_OPEN_RE.is_match(cursor) {
            let paren_rel = cursor.find('(').unwrap_or(0);
            let (_head, head_len) = take_balanced_parens(&cursor[paren_rel..]);
            let whole_head_len = paren_rel + head_len;
            let node = tree.push_child(parent, NodeKind::JsWhileStatement, None);
            tree.set_region(node, RegionKind::LeftParenthesis, offset + paren_rel..offset + paren_rel + 1);
            let after_head = &cursor[whole_head_len..];
            let (rest_len, _) =
                consume_statement_or_block(tree, node, after_head, offset + whole_head_len, NodeKind::JsBlock);
            let total = whole_head_len + rest_len;
            tree.set_region(node, RegionKind::FullRegion, offset..offset + total);
            offset += total;
            cursor = &cursor[total..];
            continue;
        }

        if IF_OPEN_RE.is_match(cursor) {
            let paren_rel = cursor.find('(').unwrap_or(0);
            let (_head, head_len) = take_balanced_parens(&cursor[paren_rel..]);
            let whole_head_len = paren_rel + head_len;
            let node = tree.push_child(parent, NodeKind::JsIfStatement, None);
            tree.set_region(node, RegionKind::LeftParenthesis, offset + paren_rel..offset + paren_rel + 1);
            let after_head = &cursor[whole_head_len..];
            let (rest_len, _) =
                consume_statement_or_block(tree, node, after_head, offset + whole_head_len, NodeKind::JsBlock);
            let total = whole_head_len + rest_len;
            tree.set_region(node, RegionKind::FullRegion, offset..offset + total);
            offset += total;
            cursor = &cursor[total..];
            continue;
        }

        if SWITCH_OPEN_RE.is_match(cursor) {
            let paren_rel = cursor.find('(').unwrap_or(0);
            let (_head, head_len) = take_balanced_parens(&cursor[paren_rel..]);
            let whole_head_len = paren_rel + head_len;
            let brace_rel = cursor[whole_head_len..].find('{').map(|i| i + whole_head_len);
            let node = tree.push_child(parent, NodeKind::JsSwitchStatement, None);
            tree.set_region(node, RegionKind::LeftParenthesis, offset + paren_rel..offset + paren_rel + 1);
            if let Some(brace_rel) = brace_rel {
                let (body, consumed) = take_balanced_braces(&cursor[brace_rel..]);
                let total = brace_rel + consumed;
                tree.set_region(node, RegionKind::FullRegion, offset..offset + total);
                parse_switch_body(tree, node, body, offset + brace_rel + 1);
                offset += total;
                cursor = &cursor[total..];
            } else {
                tree.set_region(node, RegionKind::FullRegion, offset..offset + whole_head_len);
                offset += whole_head_len;
                cursor = &cursor[whole_head_len..];
            }
            continue;
        }

        if let Some(m) = RETURN_RE.find(cursor) {
            let node = tree.push_child(parent, NodeKind::JsReturnStatement, None);
            tree.set_region(node, RegionKind::FullRegion, offset..offset + m.end());
            offset += m.end();
            cursor = &cursor[m.end()..];
            continue;
        }

        if let Some(m) = THROW_RE.find(cursor) {
            let node = tree.push_child(parent, NodeKind::JsThrowStatement, None);
            tree.set_region(node, RegionKind::FullRegion, offset..offset + m.end());
            offset += m.end();
            cursor = &cursor[m.end()..];
            continue;
        }

        if let Some(m) = BREAK_RE.find(cursor) {
            let node = tree.push_child(parent, NodeKind::JsBreakStatement, None);
            tree.set_region(node, RegionKind::FullRegion, offset..offset + m.end());
            offset += m.end();
            cursor = &cursor[m.end()..];
            continue;
        }

        if let Some(m) = CONTINUE_RE.find(cursor) {
            let node = tree.push_child(parent, NodeKind::JsContinueStatement, None);
            tree.set_region(node, RegionKind::FullRegion, offset..offset + m.end());
            offset += m.end();
            cursor = &cursor[m.end()..];
            continue;
        }

        if let Some(caps) = VAR_DECL_RE.captures(cursor) {
            let whole = caps.get(0).expect("group 0 always matches").as_str();
            let name = caps.get(2).map(|m| m.as_str().to_string());
            let node = tree.push_child(parent, NodeKind::JsVariableDeclaration, name);
            tree.set_region(node, RegionKind::FullRegion, offset..offset + whole.len());
            offset += whole.len();
            cursor = &cursor[whole.len()..];
            continue;
        }

        if cursor.starts_with('{') {
            let (body, consumed) = take_balanced_braces(cursor);
            let node = tree.push_child(parent, NodeKind::JsBlock, None);
            tree.set_region(node, RegionKind::FullRegion, offset..offset + consumed);
            parse_js_block(tree, node, body, offset + 1);
            offset += consumed;
            cursor = &cursor[consumed..];
            continue;
        }

        // A bare expression statement: record identifiers and member
        // expressions up to the terminating `;`.
        let stmt_end = cursor.find(';').map(|i| i + 1).unwrap_or(cursor.len());
        parse_expression(tree, parent, &cursor[..stmt_end], offset);
        offset += stmt_end;
        cursor = &cursor[stmt_end..];
    }
}

fn parse_switch_body(tree: &mut FileTree, parent: NodeId, body: &str, body_start: usize) {
    let mut offset = body_start;
    let mut cursor = body;
    loop {
        let trimmed_start = cursor.len() - cursor.trim_start().len();
        offset += trimmed_start;
        cursor = cursor.trim_start();
        if cursor.is_empty() {
            break;
        }
        if let Some(caps) = CASE_RE.captures(cursor) {
            let label = caps.get(1).map(|m| m.as_str().trim().to_string());
            let colon_rel = cursor.find(':').unwrap_or(0);
            let node = tree.push_child(parent, NodeKind::JsCaseClause, label);
            tree.set_region(node, RegionKind::CaseKeyword, offset..offset);
            tree.set_region(node, RegionKind::ColonToken, offset + colon_rel..offset + colon_rel + 1);
            let rest = &cursor[colon_rel + 1..];
            let next_case = rest.find("case").or_else(|| rest.find("default")).unwrap_or(rest.len());
            tree.set_region(
                node,
                RegionKind::FullRegion,
                offset..offset + colon_rel + 1 + next_case,
            );
            parse_js_block(tree, node, &rest[..next_case], offset + colon_rel + 1);
            offset += colon_rel + 1 + next_case;
            cursor = &cursor[colon_rel + 1 + next_case..];
            continue;
        }
        offset += 1;
        cursor = &cursor[1..];
    }
}

fn mark_for_head_tokens(tree: &mut FileTree, node: NodeId, head: &str, head_start: usize) {
    if let Some(in_of) = find_word(head, "in").or_else(|| find_word(head, "of")) {
        tree.set_region(node, RegionKind::InOfToken, head_start + in_of.0..head_start + in_of.1);
        return;
    }
    let semis: Vec<usize> = head.match_indices(';').map(|(i, _)| i).collect();
    if let Some(&first) = semis.first() {
        tree.set_region(node, RegionKind::FirstSemicolon, head_start + first..head_start + first + 1);
    }
    if let Some(&second) = semis.get(1) {
        tree.set_region(node, RegionKind::SecondSemicolon, head_start + second..head_start + second + 1);
    }
}

fn find_word(text: &str, word: &str) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let wlen = word.len();
    let mut i = 0;
    while i + wlen <= bytes.len() {
        if &text[i..i + wlen] == word {
            let before_ok = i == 0 || !bytes[i - 1].is_ascii_alphanumeric();
            let after_ok = i + wlen == bytes.len() || !bytes[i + wlen].is_ascii_alphanumeric();
            if before_ok && after_ok {
                return Some((i, i + wlen));
            }
        }
        i += 1;
    }
    None
}

/// Consume either a single statement or a `{ ... }` block following a
/// control-flow head, returning the number of bytes consumed.
fn consume_statement_or_block(
    tree: &mut FileTree,
    parent: NodeId,
    text: &str,
    text_start: usize,
    block_kind: NodeKind,
) -> (usize, NodeId) {
    let trimmed_start = text.len() - text.trim_start().len();
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') {
        let (body, consumed) = take_balanced_braces(trimmed);
        let node = tree.push_child(parent, block_kind, None);
        tree.set_region(
            node,
            RegionKind::FullRegion,
            text_start + trimmed_start..text_start + trimmed_start + consumed,
        );
        parse_js_block(tree, node, body, text_start + trimmed_start + 1);
        (trimmed_start + consumed, node)
    } else {
        let stmt_end = trimmed.find(';').map(|i| i + 1).unwrap_or(trimmed.len());
        parse_js_block(tree, parent, &trimmed[..stmt_end], text_start + trimmed_start);
        (trimmed_start + stmt_end, parent)
    }
}

fn take_balanced_parens(text: &str) -> (&str, usize) {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'(') {
        return ("", 0);
    }
    let mut depth = 0i32;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return (&text[1..i], i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    (&text[1.min(text.len())..], text.len())
}

/// Record identifier and member-expression nodes found in a bare expression
/// statement. Shallow on purpose: it records the leftmost identifier chain,
/// which is all the completion engine's field-member producer needs.
fn parse_expression(tree: &mut FileTree, parent: NodeId, text: &str, text_start: usize) {
    let trimmed_start = text.len() - text.trim_start().len();
    let trimmed = text.trim_start();
    let Some(caps) = IDENT_RE.captures(trimmed) else { return };
    let ident = caps.get(1).expect("group 1 always matches when regex matches");
    let name = ident.as_str().to_string();
    let after = &trimmed[ident.end()..];
    if let Some(rest) = after.strip_prefix('.') {
        let member_caps = IDENT_RE.captures(rest);
        let member_name = member_caps.as_ref().and_then(|c| c.get(1)).map(|m| m.as_str().to_string());
        let node = tree.push_child(parent, NodeKind::JsMemberExpression, member_name);
        tree.set_region(
            node,
            RegionKind::FullRegion,
            text_start + trimmed_start..text_start + trimmed.len(),
        );
        tree.set_region(
            node,
            RegionKind::Identifier,
            text_start + trimmed_start..text_start + trimmed_start + ident.end(),
        );
        let _ = name;
    } else {
        let node = tree.push_child(parent, NodeKind::JsIdentifier, Some(name));
        tree.set_region(
            node,
            RegionKind::FullRegion,
            text_start + trimmed_start + ident.start()..text_start + trimmed_start + ident.end(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_empty_object_body() {
        let outcome = parse_source(Path::new("A.qml"), "import QtQuick\nRectangle {\n    \n}\n");
        assert!(outcome.tree.is_valid());
        let root = crate::DomItem::root(outcome.tree.clone());
        let children = root.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].kind(), NodeKind::Import);
        assert_eq!(children[1].kind(), NodeKind::QmlObject);
        assert_eq!(children[1].name(), Some("Rectangle"));
    }

    #[test]
    fn parses_property_and_binding() {
        let src = "Rectangle {\n    property int count: 0\n    width: 100\n}\n";
        let outcome = parse_source(Path::new("B.qml"), src);
        let root = crate::DomItem::root(outcome.tree.clone());
        let rect = &root.children()[0];
        let kinds: Vec<_> = rect.children().iter().map(|c| c.kind()).collect();
        assert_eq!(kinds, vec![NodeKind::PropertyDefinition, NodeKind::Binding]);
    }

    #[test]
    fn parses_function_with_for_loop() {
        let src =
            "Item {\n    function f() {\n        let sum = 0;\n        for (let i = 0; i < 3; i = i + 1) {\n            sum = sum + i;\n        }\n    }\n}\n";
        let outcome = parse_source(Path::new("C.qml"), src);
        let root = crate::DomItem::root(outcome.tree.clone());
        let item = &root.children()[0];
        let func = &item.children()[0];
        assert_eq!(func.kind(), NodeKind::FunctionDefinition);
        let block = &func.children()[0];
        assert_eq!(block.kind(), NodeKind::JsBlock);
        let kinds: Vec<_> = block.children().iter().map(|c| c.kind()).collect();
        assert!(kinds.contains(&NodeKind::JsVariableDeclaration));
        assert!(kinds.contains(&NodeKind::JsForStatement));
    }

    #[test]
    fn incomplete_input_is_invalid_but_preserved() {
        let outcome = parse_source(Path::new("D.qml"), "not valid at all @@@");
        assert!(!outcome.tree.is_valid());
    }
}
