//! Arena storage and sibling-chain maintenance

use std::ops::{Index, IndexMut};

use crate::tree::node::{Node, NodeId, NodeKind};

/// Arena storage for all nodes of one hierarchy
///
/// Nodes are created once at construction time and never re-parented or
/// removed individually; replacing the payload discards the whole arena.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Total number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Get a node by its ID, `None` if the ID is invalid
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.get())
    }

    /// Iterate over all nodes with their IDs
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId::new(i), node))
    }

    /// Rebuild the doubly linked sibling chain for one ordered sibling group.
    ///
    /// The first element ends up with no previous sibling, the last with no
    /// next sibling, and interior elements point at their adjacent neighbors.
    pub(crate) fn link_siblings(&mut self, ordered: &[NodeId]) {
        for (i, &id) in ordered.iter().enumerate() {
            let prev = if i > 0 { Some(ordered[i - 1]) } else { None };
            let next = ordered.get(i + 1).copied();
            let node = &mut self.nodes[id.get()];
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
    }

    /// Find the child of `id` that has no previous sibling.
    ///
    /// The child bag does not encode display order, so resolution starts at
    /// an arbitrary bag element and walks the chain backwards. Returns `None`
    /// only when the bag is empty (or `id` is a leaf).
    ///
    /// # Panics
    ///
    /// Panics if the sibling chain contains a cycle; that is a construction
    /// bug, not a runtime condition.
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        let children = match &self.nodes[id.get()].kind {
            NodeKind::Aggregate(agg) => &agg.children,
            NodeKind::Leaf(_) => return None,
        };
        let mut pointer = children.first().copied()?;
        let mut steps = 0usize;
        while let Some(prev) = self.nodes[pointer.get()].prev_sibling {
            steps += 1;
            if steps > children.len() {
                panic!("sibling chain under {id} has no first child (cycle detected)");
            }
            pointer = prev;
        }
        Some(pointer)
    }
}

impl Index<NodeId> for NodeArena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.get()]
    }
}

impl IndexMut<NodeId> for NodeArena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.get()]
    }
}
