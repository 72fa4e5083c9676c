//! Core node types for the ordered hierarchical index

use derive_more::{Display, From, Into};
use serde::Deserialize;

/// Unique identifier for a node within a tree
///
/// Internally an index into the tree's arena storage. Parent and sibling
/// back-references are `NodeId`s rather than owning pointers, so the node
/// graph never forms an ownership cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into)]
#[display(fmt = "NodeId({})", _0)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root node is always built first and therefore has ID 0
    pub const ROOT: NodeId = NodeId(0);

    /// Create a new NodeId from a usize
    pub const fn new(id: usize) -> Self {
        NodeId(id)
    }

    /// Get the inner usize value
    pub const fn get(self) -> usize {
        self.0
    }
}

/// 2D projection coordinates used by the linked scatter view
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Projection {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// Leaf-specific state
#[derive(Debug, Clone)]
pub struct LeafData {
    /// Whether this leaf is currently selected
    pub selected: bool,
}

/// Aggregate-specific state
#[derive(Debug, Clone)]
pub struct AggregateData {
    /// Direct children as an unordered bag.
    ///
    /// Display order lives exclusively in the sibling chain; this collection
    /// only answers ownership and membership questions.
    pub children: Vec<NodeId>,
    /// Whether the aggregate is currently expanded
    pub is_open: bool,
    /// Number of leaf descendants, maintained incrementally
    pub leaf_count: usize,
    /// Number of selected leaf descendants, maintained incrementally
    pub selected_leaf_count: usize,
}

/// The variant of a node: terminal leaf or collapsible aggregate
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Terminal node representing one item or one attribute
    Leaf(LeafData),
    /// Internal node grouping child nodes, with open/closed display state
    Aggregate(AggregateData),
}

/// A single node in the hierarchy
///
/// Structural shape (parent, children) is fixed at construction time. Only
/// `position`, `depth`, the sibling links and the variant state (`is_open`,
/// `selected`, the running counts) mutate afterwards, and all mutation goes
/// through the owning [`HierarchyTree`](crate::tree::HierarchyTree).
#[derive(Debug, Clone)]
pub struct Node {
    /// Display name
    pub name: String,
    /// Numeric payload vector (cell values for item rows; empty for columns)
    pub values: Vec<f64>,
    /// Pre-aggregated leaf descendant count from the payload
    pub total_leaf_count: usize,
    /// Precomputed spread statistic used by the dispersion sort criterion
    pub dispersion: f64,
    /// Scatter-view coordinates
    pub projection: Projection,
    pub(crate) original_index: usize,
    pub(crate) parent: Option<NodeId>,
    pub(crate) prev_sibling: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
    pub(crate) kind: NodeKind,
    position: i32,
    previous_position: i32,
    depth: i32,
}

impl Node {
    pub(crate) fn new(
        name: String,
        kind: NodeKind,
        parent: Option<NodeId>,
        original_index: usize,
    ) -> Self {
        Self {
            name,
            values: Vec::new(),
            total_leaf_count: 0,
            dispersion: 0.0,
            projection: Projection::default(),
            original_index,
            parent,
            prev_sibling: None,
            next_sibling: None,
            kind,
            position: -1,
            previous_position: -1,
            depth: -1,
        }
    }

    /// Position in the flattened display order; -1 while not placed
    pub fn position(&self) -> i32 {
        self.position
    }

    /// Position before the most recent placement, for animating transitions
    pub fn previous_position(&self) -> i32 {
        self.previous_position
    }

    /// Nesting depth from the root (root = 0); -1 until computed
    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// Parent node, `None` for the root
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Previous sibling in display order
    pub fn prev_sibling(&self) -> Option<NodeId> {
        self.prev_sibling
    }

    /// Next sibling in display order
    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    /// Index of this node in payload document order, fixed at construction
    pub fn original_index(&self) -> usize {
        self.original_index
    }

    /// The node's variant
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns true for leaves
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// Returns true for aggregates with a non-empty child bag
    pub fn has_children(&self) -> bool {
        match &self.kind {
            NodeKind::Leaf(_) => false,
            NodeKind::Aggregate(agg) => !agg.children.is_empty(),
        }
    }

    /// Whether the node is expanded; always false for leaves
    pub fn is_open(&self) -> bool {
        match &self.kind {
            NodeKind::Leaf(_) => false,
            NodeKind::Aggregate(agg) => agg.is_open,
        }
    }

    /// Leaf state, if this is a leaf
    pub fn as_leaf(&self) -> Option<&LeafData> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// Aggregate state, if this is an aggregate
    pub fn as_aggregate(&self) -> Option<&AggregateData> {
        match &self.kind {
            NodeKind::Aggregate(agg) => Some(agg),
            _ => None,
        }
    }

    pub(crate) fn as_aggregate_mut(&mut self) -> Option<&mut AggregateData> {
        match &mut self.kind {
            NodeKind::Aggregate(agg) => Some(agg),
            _ => None,
        }
    }

    /// Record the current position as the previous one and set the new value.
    ///
    /// No range validation happens here; the traversal engine guarantees the
    /// values it hands in.
    pub(crate) fn set_position(&mut self, position: i32) {
        self.previous_position = self.position;
        self.position = position;
    }

    pub(crate) fn set_depth(&mut self, depth: i32) {
        self.depth = depth;
    }
}
