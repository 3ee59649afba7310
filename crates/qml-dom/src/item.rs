//! `DomItem`: a cheap, reference-counted handle into a [`FileTree`].

use std::path::Path;
use std::sync::Arc;

use crate::arena::{FileTree, NodeId, Span};
use crate::kind::{NodeKind, RegionKind};

/// A node in the parsed object model.
///
/// Cloning a `DomItem` is an `Arc` clone plus a `u32` copy — cheap, since
/// handles into a tree are reference-counted rather than owning copies of
/// node data.
#[derive(Debug, Clone)]
pub struct DomItem {
    tree: Arc<FileTree>,
    id: NodeId,
}

impl DomItem {
    /// Construct a handle to the root of `tree`.
    pub fn root(tree: Arc<FileTree>) -> Self {
        Self { id: NodeId::ROOT, tree }
    }

    fn with_id(&self, id: NodeId) -> Self {
        Self { tree: Arc::clone(&self.tree), id }
    }

    /// The syntactic kind of this node.
    pub fn kind(&self) -> NodeKind {
        self.tree.nodes[self.id.0 as usize].kind
    }

    /// The node's name, if it has one (property name, signal name, imported
    /// module, etc).
    pub fn name(&self) -> Option<&str> {
        self.tree.nodes[self.id.0 as usize].name.as_deref()
    }

    /// The canonical path of the file owning this node.
    pub fn path(&self) -> &Path {
        self.tree.path()
    }

    /// This node's parent, unless it is the file root.
    pub fn parent(&self) -> Option<DomItem> {
        self.tree.nodes[self.id.0 as usize].parent.map(|p| self.with_id(p))
    }

    /// This node's children, in source order.
    pub fn children(&self) -> Vec<DomItem> {
        self.tree.nodes[self.id.0 as usize].children.iter().map(|&c| self.with_id(c)).collect()
    }

    /// The source offset range of `region` on this node, if recorded.
    pub fn region(&self, region: RegionKind) -> Option<Span> {
        self.tree.nodes[self.id.0 as usize].regions.get(&region).cloned()
    }

    /// The full source span of this node.
    pub fn full_region(&self) -> Option<Span> {
        self.region(RegionKind::FullRegion)
    }

    /// Whether the parse this node belongs to was structurally valid.
    pub fn file_is_valid(&self) -> bool {
        self.tree.is_valid()
    }

    /// Walk from this node up through ancestors, yielding each in turn
    /// (self first). Used by the completion engine's "walks upward through
    /// kinds" algorithm.
    pub fn ancestors(&self) -> impl Iterator<Item = DomItem> + '_ {
        let mut current = Some(self.clone());
        std::iter::from_fn(move || {
            let item = current.take()?;
            current = item.parent();
            Some(item)
        })
    }

    /// The innermost ancestor (including self) that is an object-scope
    /// boundary, per [`NodeKind::is_object_scope_boundary`].
    pub fn enclosing_object_scope(&self) -> DomItem {
        self.ancestors()
            .find(|n| n.kind().is_object_scope_boundary())
            .unwrap_or_else(|| DomItem::root(Arc::clone(&self.tree)))
    }

    /// Find the node whose full region contains `offset`.
    pub fn at_offset(tree: &Arc<FileTree>, offset: usize) -> DomItem {
        let id = tree.node_at_offset(offset);
        DomItem { tree: Arc::clone(tree), id }
    }

    /// Access the backing arena directly (used by the completion engine to
    /// re-resolve other offsets without re-parsing).
    pub fn tree(&self) -> &Arc<FileTree> {
        &self.tree
    }
}
