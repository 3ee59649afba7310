//! Node arena backing a single parsed file.
//!
//! Nodes live in a flat `Vec`, owned by the [`FileTree`] for the file they
//! belong to; every inter-node reference is a [`NodeId`] index rather than a
//! raw pointer, so shared or cyclic object graphs in the source never
//! become cycles in memory. Parent pointers are stored
//! (computed once, at construction time) rather than recomputed on every
//! traversal, which is cheap because the tree is immutable once built.

use std::ops::Range;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::kind::{NodeKind, RegionKind};

/// An index into a [`FileTree`]'s node table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The root node of any [`FileTree`] is always index 0.
    pub const ROOT: NodeId = NodeId(0);
}

/// Source-offset span, half-open `[start, end)`, in UTF-8 byte offsets.
pub type Span = Range<usize>;

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub kind: NodeKind,
    pub name: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub regions: FxHashMap<RegionKind, Span>,
}

/// A fully parsed file: an arena of nodes plus the path it was parsed from.
///
/// `FileTree` is immutable once built; handles into it ([`crate::DomItem`])
/// are cheap `Arc` clones, so handing a snapshot out never copies node
/// data.
#[derive(Debug)]
pub struct FileTree {
    pub(crate) path: PathBuf,
    pub(crate) nodes: Vec<NodeData>,
    /// Whether the parse was structurally valid enough to be promoted into
    /// a document's `valid_doc` slot.
    pub(crate) is_valid: bool,
}

impl FileTree {
    pub(crate) fn new(path: PathBuf) -> Self {
        let mut nodes = Vec::with_capacity(16);
        nodes.push(NodeData {
            kind: NodeKind::File,
            name: None,
            parent: None,
            children: Vec::new(),
            regions: FxHashMap::default(),
        });
        Self { path, nodes, is_valid: true }
    }

    /// The file this tree was parsed from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this parse was structurally valid.
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub(crate) fn push_child(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        name: Option<String>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            name,
            parent: Some(parent),
            children: Vec::new(),
            regions: FxHashMap::default(),
        });
        self.nodes[parent.0 as usize].children.push(id);
        id
    }

    pub(crate) fn set_region(&mut self, node: NodeId, region: RegionKind, span: Span) {
        self.nodes[node.0 as usize].regions.insert(region, span);
    }

    pub(crate) fn full_region_of(&self, node: NodeId) -> Option<Span> {
        self.nodes[node.0 as usize].regions.get(&RegionKind::FullRegion).cloned()
    }

    /// Find the innermost node whose full region contains `offset`, breaking
    /// ties toward the smallest containing region.
    ///
    /// Returns [`NodeId::ROOT`] if no node has location information, or if
    /// `offset` falls outside every recorded region.
    pub fn node_at_offset(&self, offset: usize) -> NodeId {
        let mut best = NodeId::ROOT;
        let mut best_len = usize::MAX;
        self.visit_containing(NodeId::ROOT, offset, &mut best, &mut best_len);
        best
    }

    fn visit_containing(&self, node: NodeId, offset: usize, best: &mut NodeId, best_len: &mut usize) {
        if let Some(span) = self.full_region_of(node) {
            if span.contains(&offset) || span.end == offset {
                let len = span.end.saturating_sub(span.start);
                if len <= *best_len {
                    *best = node;
                    *best_len = len;
                }
            } else {
                return;
            }
        }
        for &child in &self.nodes[node.0 as usize].children {
            self.visit_containing(child, offset, best, best_len);
        }
    }
}
