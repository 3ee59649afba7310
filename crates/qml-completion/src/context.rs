//! Context-string computation from document text and cursor offset.

/// The three adjacent backward-looking ranges the dispatch producers consult,
/// plus whether the cursor sits at the start of its line (ignoring
/// whitespace).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextStrings {
    /// The run of letters/digits/`_` ending at the cursor — what the user has
    /// typed so far of the identifier being completed.
    pub filter_chars: String,
    /// Byte offset where `filter_chars` begins.
    pub filter_start: usize,
    /// The dot-separated identifier chain ending just before `filter_chars`,
    /// e.g. `Module.Type` in `Module.Type.Fi|`. Empty if there is none.
    pub base: String,
    /// Byte offset where `base` begins (equals `filter_start` when `base` is
    /// empty).
    pub base_start: usize,
    /// Everything from the cursor back to the preceding line break.
    pub pre_line: String,
    /// Whether only whitespace precedes `base` on the current line.
    pub at_line_start: bool,
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Compute [`ContextStrings`] for `text` at byte offset `p`.
pub fn compute(text: &str, p: usize) -> ContextStrings {
    let bytes = text.as_bytes();
    let p = p.min(bytes.len());

    let mut filter_start = p;
    while filter_start > 0 && is_ident_byte(bytes[filter_start - 1]) {
        filter_start -= 1;
    }
    let filter_chars = text[filter_start..p].to_string();

    let mut base_start = filter_start;
    loop {
        let mut scan = base_start;
        while scan > 0 && bytes[scan - 1] == b'.' {
            let dot = scan - 1;
            let mut ident_start = dot;
            while ident_start > 0 && is_ident_byte(bytes[ident_start - 1]) {
                ident_start -= 1;
            }
            if ident_start == dot {
                break;
            }
            scan = ident_start;
        }
        if scan == base_start {
            break;
        }
        base_start = scan;
    }
    let base = text[base_start..filter_start].to_string();

    let line_start = text[..p].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let pre_line = text[line_start..p].to_string();
    let at_line_start = text[line_start..base_start].trim().is_empty();

    ContextStrings { filter_chars, filter_start, base, base_start, pre_line, at_line_start }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_offset_zero_has_no_context() {
        let ctx = compute("", 0);
        assert_eq!(ctx.filter_chars, "");
        assert_eq!(ctx.base, "");
        assert!(ctx.at_line_start);
    }

    #[test]
    fn bare_identifier_prefix() {
        let ctx = compute("Rectangle {\n    wid", 19);
        assert_eq!(ctx.filter_chars, "wid");
        assert_eq!(ctx.base, "");
        assert!(ctx.at_line_start);
    }

    #[test]
    fn qualified_name_splits_base_and_filter() {
        let text = "Module.Type.Fi";
        let ctx = compute(text, text.len());
        assert_eq!(ctx.filter_chars, "Fi");
        assert_eq!(ctx.base, "Module.Type.");
        assert!(ctx.at_line_start);
    }

    #[test]
    fn indented_identifier_is_still_at_line_start() {
        let text = "Item {\n        wi";
        let ctx = compute(text, text.len());
        assert!(ctx.at_line_start);
    }

    #[test]
    fn identifier_after_other_text_is_not_at_line_start() {
        let text = "Item { width: he";
        let ctx = compute(text, text.len());
        assert!(!ctx.at_line_start);
    }
}
