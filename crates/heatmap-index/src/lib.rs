//! Heatmap Index Library
//!
//! The ordered hierarchical index behind a dual-hierarchy heatmap view: two
//! independently collapsible trees (items as rows, attributes as columns),
//! each flattened into a virtualized, sortable display sequence.
//!
//! # Core Concepts
//!
//! - **HierarchyTree**: facade owning one hierarchy and all mutation paths
//! - **Node**: leaf or aggregate, addressed by an arena `NodeId`
//! - **Sorter**: ordered criteria chain applied per sibling group
//! - **Position / depth**: outputs of the layout pass consumed by renderers
//!
//! Rendering, color mapping, scrolling and data fetching live outside this
//! crate; they consume the index's positions, depths and visibility.
//!
//! # Example
//!
//! ```
//! use heatmap_index::prelude::*;
//!
//! let payload = NodePayload::aggregate(
//!     "root",
//!     true,
//!     vec![
//!         NodePayload::leaf("alpha"),
//!         NodePayload::aggregate("group", false, vec![NodePayload::leaf("beta")]),
//!     ],
//! );
//!
//! let sorter = Sorter::with_criteria(vec![Box::new(ByName::new(false))]);
//! let mut tree = HierarchyTree::items(&payload, sorter).unwrap();
//!
//! // Aggregates are rows too, so every visible node holds a position.
//! assert_eq!(tree.visible_count(), 3);
//!
//! let group = tree
//!     .visible_nodes()
//!     .into_iter()
//!     .find(|&id| tree[id].name == "group")
//!     .unwrap();
//! tree.expand(group);
//! assert_eq!(tree.visible_count(), 4);
//! ```

pub mod payload;
pub mod tree;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::payload::NodePayload;
    pub use crate::tree::prelude::*;
}
