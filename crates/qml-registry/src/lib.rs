//! Process-wide registry of open documents, their snapshots, and the
//! build-directory resolution used to scope dependency analysis.

#![warn(missing_docs)]

mod build_dirs;
mod document;
mod events;
mod registry;

pub use build_dirs::{BuildDirRegistry, SettingsLookup};
pub use document::{OpenDocument, OpenDocumentSnapshot};
pub use events::SnapshotBus;
pub use registry::{DocumentRegistry, SharedRegistry};
