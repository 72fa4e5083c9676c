//! Construction payload and arena building
//!
//! The data-fetch layer delivers one nested payload per hierarchy; the tree
//! is rebuilt wholesale from it. Partial or incremental updates are not
//! supported; a new payload discards the previous node graph entirely.

use anyhow::{bail, Result};
use serde::Deserialize;

use crate::tree::arena::NodeArena;
use crate::tree::node::{AggregateData, LeafData, Node, NodeId, NodeKind, Projection};

/// Nested description of one node.
///
/// Absence of `children` marks a leaf. Validation is strict: a malformed
/// payload fails construction with a descriptive error instead of producing
/// a silently broken sibling chain.
#[derive(Debug, Clone, Deserialize)]
pub struct NodePayload {
    /// Display name; must be non-empty
    pub name: String,
    /// Numeric payload vector (cell values)
    #[serde(default)]
    pub values: Vec<f64>,
    /// Pre-aggregated leaf descendant count; defaults to 1 for leaves and to
    /// the computed rolling count for aggregates
    #[serde(default)]
    pub total_leaf_count: Option<usize>,
    /// Precomputed spread statistic
    #[serde(default)]
    pub dispersion: f64,
    /// 2D projection coordinates for the scatter view
    #[serde(default)]
    pub projection: Projection,
    /// Initial expansion state; aggregates only
    #[serde(default)]
    pub is_open: Option<bool>,
    /// Initial selection state; leaves only, defaults to true
    #[serde(default)]
    pub selected: Option<bool>,
    /// Child payloads; present exactly for aggregates
    #[serde(default)]
    pub children: Option<Vec<NodePayload>>,
}

impl NodePayload {
    /// A leaf payload with default values
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            total_leaf_count: None,
            dispersion: 0.0,
            projection: Projection::default(),
            is_open: None,
            selected: None,
            children: None,
        }
    }

    /// An aggregate payload with the given children
    pub fn aggregate(name: impl Into<String>, is_open: bool, children: Vec<NodePayload>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            total_leaf_count: None,
            dispersion: 0.0,
            projection: Projection::default(),
            is_open: Some(is_open),
            selected: None,
            children: Some(children),
        }
    }

    pub fn with_values(mut self, values: Vec<f64>) -> Self {
        self.values = values;
        self
    }

    pub fn with_total_leaf_count(mut self, count: usize) -> Self {
        self.total_leaf_count = Some(count);
        self
    }

    pub fn with_dispersion(mut self, dispersion: f64) -> Self {
        self.dispersion = dispersion;
        self
    }

    pub fn with_projection(mut self, x: f64, y: f64) -> Self {
        self.projection = Projection { x, y };
        self
    }

    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = Some(selected);
        self
    }
}

/// Build the node graph for one payload, with sibling chains in document
/// order. Sorting and layout are the tree's job afterwards.
pub(crate) fn build_arena(payload: &NodePayload) -> Result<(NodeArena, NodeId)> {
    if payload.children.is_none() {
        bail!("root node '{}' must be an aggregate with children", payload.name);
    }
    let mut arena = NodeArena::new();
    let mut next_index = 0usize;
    let root = build_node(&mut arena, payload, None, &mut next_index, "")?;
    Ok((arena, root))
}

fn build_node(
    arena: &mut NodeArena,
    payload: &NodePayload,
    parent: Option<NodeId>,
    next_index: &mut usize,
    parent_path: &str,
) -> Result<NodeId> {
    if payload.name.is_empty() {
        let context = if parent_path.is_empty() {
            "<root>"
        } else {
            parent_path
        };
        bail!("node under '{context}' has an empty name");
    }
    let path = if parent_path.is_empty() {
        payload.name.clone()
    } else {
        format!("{parent_path}/{}", payload.name)
    };

    let original_index = *next_index;
    *next_index += 1;

    match &payload.children {
        Some(children) => {
            if children.is_empty() {
                bail!("aggregate '{path}' has an empty children list");
            }
            if payload.selected.is_some() {
                bail!("aggregate '{path}' carries the leaf-only 'selected' flag");
            }

            let mut node = Node::new(
                payload.name.clone(),
                NodeKind::Aggregate(AggregateData {
                    children: Vec::new(),
                    is_open: payload.is_open.unwrap_or(false),
                    leaf_count: 0,
                    selected_leaf_count: 0,
                }),
                parent,
                original_index,
            );
            node.values = payload.values.clone();
            node.dispersion = payload.dispersion;
            node.projection = payload.projection;
            let id = arena.push(node);

            let mut child_ids = Vec::with_capacity(children.len());
            for child in children {
                child_ids.push(build_node(arena, child, Some(id), next_index, &path)?);
            }
            if let Some(agg) = arena[id].as_aggregate_mut() {
                agg.children = child_ids.clone();
            }
            arena.link_siblings(&child_ids);

            let rolling = arena[id].as_aggregate().map_or(0, |agg| agg.leaf_count);
            arena[id].total_leaf_count = payload.total_leaf_count.unwrap_or(rolling);
            Ok(id)
        }
        None => {
            if payload.is_open.is_some() {
                bail!("leaf '{path}' carries the aggregate-only 'is_open' flag");
            }
            let selected = payload.selected.unwrap_or(true);

            let mut node = Node::new(
                payload.name.clone(),
                NodeKind::Leaf(LeafData { selected }),
                parent,
                original_index,
            );
            node.values = payload.values.clone();
            node.dispersion = payload.dispersion;
            node.projection = payload.projection;
            node.total_leaf_count = payload.total_leaf_count.unwrap_or(1);
            let id = arena.push(node);

            // Propagate the rolling counts up through every ancestor, the
            // same path later selection toggles take.
            let mut cursor = parent;
            while let Some(ancestor) = cursor {
                if let Some(agg) = arena[ancestor].as_aggregate_mut() {
                    agg.leaf_count += 1;
                    if selected {
                        agg.selected_leaf_count += 1;
                    }
                }
                cursor = arena[ancestor].parent();
            }
            Ok(id)
        }
    }
}
