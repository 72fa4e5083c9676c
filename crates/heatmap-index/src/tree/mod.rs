//! Ordered hierarchical index core
//!
//! The tree structure, sibling ordering, traversal, expansion state, sorting
//! and pinning behind one side of the matrix view. Instantiated twice by
//! consumers, once for item rows and once for attribute columns, with a
//! [`PositionPolicy`] selecting the position-counting semantics.

pub(crate) mod arena;
mod hierarchy;
pub(crate) mod node;
mod pins;
mod sorter;
mod traversal;

pub use hierarchy::{HierarchyTree, LayoutEvent};
pub use node::{AggregateData, LeafData, Node, NodeId, NodeKind, Projection};
pub use sorter::{
    ByDescendantCount, ByDispersion, ByHasChildren, ByName, ByOriginalOrder, SortCriterion, Sorter,
};
pub use traversal::PositionPolicy;

/// Re-export common types for convenience
pub mod prelude {
    pub use super::{
        ByDescendantCount, ByDispersion, ByHasChildren, ByName, ByOriginalOrder, HierarchyTree,
        LayoutEvent, Node, NodeId, NodeKind, PositionPolicy, SortCriterion, Sorter,
    };
}
