//! Errors surfaced by this crate.

use thiserror::Error;

/// Errors that can occur while loading or navigating a [`crate::FileTree`].
#[derive(Debug, Error)]
pub enum DomError {
    /// A requested source offset fell outside the document.
    #[error("offset {offset} is outside document {path} (len {len})")]
    OffsetOutOfBounds {
        /// The file path involved.
        path: String,
        /// The offset requested.
        offset: usize,
        /// The document's byte length.
        len: usize,
    },

    /// The underlying file could not be read from disk.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file path involved.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
