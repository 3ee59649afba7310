//! Object model for a declarative UI markup language: an arena-backed
//! parallel tree of syntactic nodes and the source-offset regions attached
//! to them.
//!
//! Nodes are owned by a [`FileTree`]; all cross-node references are arena
//! indices, so the tree is cycle-free regardless of how deeply it nests
//!. [`DomItem`] is the cheap, `Arc`-backed handle callers actually
//! hold and navigate.

#![warn(missing_docs)]

mod arena;
mod error;
mod item;
mod kind;
pub mod parser;

pub use arena::{FileTree, NodeId, Span};
pub use error::DomError;
pub use item::DomItem;
pub use kind::{NodeKind, RegionKind};
