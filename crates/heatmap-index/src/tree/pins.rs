//! Registry of pinned leaves displayed outside the normal ordering

use crate::tree::node::NodeId;

/// Ordered set of pinned leaves.
///
/// Pinned leaves keep their display slot at the top of the view regardless
/// of structural position; the layout pass never touches them. Every
/// mutation replaces the sequence wholesale and bumps `revision`, so
/// consumers that cache the sequence can detect changes with a single
/// counter comparison.
#[derive(Debug, Default)]
pub struct PinRegistry {
    pinned: Vec<NodeId>,
    revision: u64,
}

impl PinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Membership test by node identity
    pub fn contains(&self, id: NodeId) -> bool {
        self.pinned.contains(&id)
    }

    /// Current pinned sequence in display order
    pub fn as_slice(&self) -> &[NodeId] {
        &self.pinned
    }

    pub fn len(&self) -> usize {
        self.pinned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pinned.is_empty()
    }

    /// Monotone counter bumped on every observable change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Append a leaf; returns false (and changes nothing) if already pinned
    pub(crate) fn add(&mut self, id: NodeId) -> bool {
        if self.contains(id) {
            return false;
        }
        let mut next = self.pinned.clone();
        next.push(id);
        self.replace(next);
        true
    }

    /// Remove a leaf; silently a no-op when it is not pinned
    pub(crate) fn remove(&mut self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let next = self
            .pinned
            .iter()
            .copied()
            .filter(|&pinned| pinned != id)
            .collect();
        self.replace(next);
        true
    }

    /// Install a re-sorted sequence; only an actual reorder counts as a change
    pub(crate) fn set_order(&mut self, ordered: Vec<NodeId>) {
        debug_assert_eq!(ordered.len(), self.pinned.len());
        if ordered != self.pinned {
            self.replace(ordered);
        }
    }

    fn replace(&mut self, next: Vec<NodeId>) {
        self.pinned = next;
        self.revision += 1;
    }
}
