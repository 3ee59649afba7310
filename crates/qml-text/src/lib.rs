//! Line-indexed, version-tracked, mutable text buffer.
//!
//! Backed by [`ropey::Rope`] for O(log n) edits and offset/position
//! conversions. All reads and mutations happen under the document's own
//! lock, alongside its optional client-assigned version.

#![warn(missing_docs)]

use std::sync::Arc;

use lsp_types::{Position, Range};
use parking_lot::Mutex;
use ropey::Rope;
use thiserror::Error;

/// Position-encoding mode for offset↔position conversions.
///
/// LSP positions are UTF-16 code units. `Utf8` is kept for internal tooling and tests that want byte
/// columns directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosEnc {
    /// Count UTF-16 code units per LSP.
    Utf16,
    /// Count UTF-8 bytes.
    Utf8,
}

/// A client sent a `didChange` whose version did not exceed the document's
/// current version; the change was discarded.
#[derive(Debug, Error)]
#[error("stale didChange: document is at version {current}, change carried version {attempted}")]
pub struct StaleVersionError {
    /// The document's version before the rejected change.
    pub current: i32,
    /// The version carried by the rejected change.
    pub attempted: i32,
}

struct Inner {
    rope: Rope,
    version: Option<i32>,
}

/// A mutable, version-tracked text buffer.
///
/// Cloning a `TextDocument` clones the `Arc` handle, not the buffer; all
/// clones observe the same underlying text and lock.
#[derive(Clone)]
pub struct TextDocument {
    inner: Arc<Mutex<Inner>>,
}

impl TextDocument {
    /// Create a new document with the given initial text and version.
    ///
    /// The server never fabricates a version — `version` is always
    /// whatever the client supplied on `didOpen`.
    pub fn new(text: &str, version: Option<i32>) -> Self {
        Self { inner: Arc::new(Mutex::new(Inner { rope: Rope::from_str(text), version })) }
    }

    /// Replace the entire document contents.
    pub fn set_text(&self, text: &str, version: i32) {
        let mut inner = self.inner.lock();
        inner.rope = Rope::from_str(text);
        inner.version = Some(version);
    }

    /// Apply an incremental edit: replace `[start, end)` (computed from
    /// `range` against the line table *before* the edit) with `text`.
    ///
    /// `range = None` means whole-document replace. The supplied `version`
    /// must be strictly greater than the document's current version;
    /// otherwise the change is discarded and [`StaleVersionError`] is
    /// returned.
    pub fn apply_change(
        &self,
        range: Option<Range>,
        text: &str,
        version: i32,
    ) -> Result<(), StaleVersionError> {
        let mut inner = self.inner.lock();
        if let Some(current) = inner.version {
            if version <= current {
                tracing::warn!(current, attempted = version, "discarding stale didChange");
                return Err(StaleVersionError { current, attempted: version });
            }
        }
        match range {
            None => inner.rope = Rope::from_str(text),
            Some(range) => {
                let (start, end) = range_to_chars(&inner.rope, range, PosEnc::Utf16);
                if start <= end {
                    inner.rope.remove(start..end);
                    inner.rope.insert(start, text);
                }
            }
        }
        inner.version = Some(version);
        Ok(())
    }

    /// Convert an LSP `(line, character)` position to a byte offset.
    ///
    /// `character` past the end of the line clamps to end-of-line.
    pub fn offset_of(&self, position: Position) -> usize {
        let inner = self.inner.lock();
        lsp_pos_to_byte(&inner.rope, position, PosEnc::Utf16)
    }

    /// Convert a byte offset to an LSP `(line, character)` position.
    pub fn position_of(&self, offset: usize) -> Position {
        let inner = self.inner.lock();
        byte_to_lsp_pos(&inner.rope, offset, PosEnc::Utf16)
    }

    /// The document's current version, if any has been set.
    pub fn version(&self) -> Option<i32> {
        self.inner.lock().version
    }

    /// A snapshot copy of the full text.
    pub fn text(&self) -> String {
        self.inner.lock().rope.to_string()
    }

    /// Total length in bytes.
    pub fn len_bytes(&self) -> usize {
        self.inner.lock().rope.len_bytes()
    }
}

fn lsp_pos_to_char(rope: &Rope, pos: Position, enc: PosEnc) -> usize {
    if pos.line as usize >= rope.len_lines() {
        return rope.len_chars();
    }
    let line_char0 = rope.line_to_char(pos.line as usize);
    let line_slice = rope.line(pos.line as usize);

    let col_chars = match enc {
        PosEnc::Utf8 => pos.character as usize,
        PosEnc::Utf16 => {
            let mut char_idx = 0usize;
            let mut utf16_units = 0u32;
            for ch in line_slice.chars() {
                if utf16_units >= pos.character {
                    break;
                }
                utf16_units += ch.len_utf16() as u32;
                char_idx += 1;
            }
            char_idx
        }
    };

    let line_chars = line_slice.chars().count();
    let clamped_col = col_chars.min(line_chars);
    (line_char0 + clamped_col).min(rope.len_chars())
}

fn lsp_pos_to_byte(rope: &Rope, pos: Position, enc: PosEnc) -> usize {
    rope.char_to_byte(lsp_pos_to_char(rope, pos, enc))
}

fn byte_to_lsp_pos(rope: &Rope, byte: usize, enc: PosEnc) -> Position {
    let byte = byte.min(rope.len_bytes());
    let char_idx = rope.byte_to_char(byte);
    let line = rope.char_to_line(char_idx);
    let line_char0 = rope.line_to_char(line);
    let col_chars = char_idx - line_char0;

    let character = match enc {
        PosEnc::Utf8 => col_chars as u32,
        PosEnc::Utf16 => {
            let line_slice = rope.line(line);
            let mut cu = 0u32;
            for (i, ch) in line_slice.chars().enumerate() {
                if i >= col_chars {
                    break;
                }
                cu += ch.len_utf16() as u32;
            }
            cu
        }
    };

    Position { line: line as u32, character }
}

fn range_to_chars(rope: &Rope, range: Range, enc: PosEnc) -> (usize, usize) {
    let s = lsp_pos_to_char(rope, range.start, enc);
    let e = lsp_pos_to_char(rope, range.end, enc);
    (s.min(rope.len_chars()), e.min(rope.len_chars()))
}

// NOTE: the LSP `positionEncoding` capability negotiation allows UTF-8/UTF-32
// position encodings too, and the exact behavior at a surrogate-pair
// boundary (a `character` landing mid-surrogate-pair) is left open pending
// that negotiation. `lsp_pos_to_char` currently rounds such a `character`
// down to the start of the enclosing `char`; this is a deliberate,
// documented choice, not a verified-correct one.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_offsets_on_char_boundaries() {
        let doc = TextDocument::new("hello\nworld\n", Some(1));
        for line in 0..2u32 {
            for ch in 0..5u32 {
                let pos = Position { line, character: ch };
                let offset = doc.offset_of(pos);
                assert_eq!(doc.position_of(offset), pos);
            }
        }
    }

    #[test]
    fn column_past_end_of_line_clamps() {
        let doc = TextDocument::new("abc\ndef\n", Some(1));
        let pos = Position { line: 0, character: 999 };
        let offset = doc.offset_of(pos);
        assert_eq!(offset, 3);
    }

    #[test]
    fn crlf_resolves_after_the_pair() {
        let doc = TextDocument::new("abc\r\ndef", Some(1));
        let offset = doc.offset_of(Position { line: 1, character: 0 });
        assert_eq!(offset, 5);
    }

    #[test]
    fn stale_change_is_rejected_and_version_unchanged() {
        let doc = TextDocument::new("hello", Some(5));
        let result = doc.apply_change(None, "bye", 3);
        assert!(result.is_err());
        assert_eq!(doc.version(), Some(5));
        assert_eq!(doc.text(), "hello");
    }

    #[test]
    fn empty_range_change_with_empty_text_is_a_no_op_except_version() {
        let doc = TextDocument::new("hello", Some(1));
        let range = Range {
            start: Position { line: 0, character: 2 },
            end: Position { line: 0, character: 2 },
        };
        doc.apply_change(Some(range), "", 2).expect("version 2 > 1");
        assert_eq!(doc.text(), "hello");
        assert_eq!(doc.version(), Some(2));
    }
}
