//! Tree facade owning the arena, the sorter and the pin registry
//!
//! The facade is the single writer: consumers hold `NodeId`s and read node
//! state through it, but every mutation funnels through these methods,
//! each of which finishes its
//! layout pass before returning. No reader can ever observe stale positions.

use anyhow::Result;
use log::{debug, trace};

use crate::payload::{self, NodePayload};
use crate::tree::arena::NodeArena;
use crate::tree::node::{Node, NodeId, NodeKind};
use crate::tree::pins::PinRegistry;
use crate::tree::sorter::{SortCriterion, Sorter};
use crate::tree::traversal::{self, Placement, PositionPolicy, TraversalMode};

/// Fired by the layout pass when a node's placement changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutEvent {
    /// The node's position in the flattened sequence changed
    Moved { node: NodeId, from: i32, to: i32 },
    /// The node's nesting depth changed
    Nested { node: NodeId, depth: i32 },
}

type LayoutObserver = Box<dyn FnMut(&LayoutEvent)>;

/// One ordered, collapsible hierarchy: the item (row) or attribute (column)
/// side of the matrix.
///
/// The structural shape is immutable after construction; sibling order,
/// expansion state, selection, pins, position and depth mutate through the
/// public operations. Instantiate once per hierarchy; the two sides differ
/// only in their [`PositionPolicy`].
pub struct HierarchyTree {
    arena: NodeArena,
    root: NodeId,
    sorter: Sorter,
    pins: PinRegistry,
    policy: PositionPolicy,
    max_depth: i32,
    observer: Option<LayoutObserver>,
}

impl HierarchyTree {
    /// Build an item hierarchy: aggregates render as rows of their own and
    /// consume a position slot.
    pub fn items(payload: &NodePayload, sorter: Sorter) -> Result<Self> {
        Self::from_payload(payload, sorter, PositionPolicy::AllNodes)
    }

    /// Build an attribute hierarchy: only leaves consume a position slot, so
    /// attribute groups never shift column indices.
    pub fn attributes(payload: &NodePayload, sorter: Sorter) -> Result<Self> {
        Self::from_payload(payload, sorter, PositionPolicy::LeavesOnly)
    }

    /// Build a hierarchy from a payload, sort it, and run the initial layout
    /// pass.
    pub fn from_payload(
        payload: &NodePayload,
        sorter: Sorter,
        policy: PositionPolicy,
    ) -> Result<Self> {
        let (arena, root) = payload::build_arena(payload)?;
        debug!("built hierarchy with {} nodes ({policy:?})", arena.len());

        let mut tree = Self {
            arena,
            root,
            sorter,
            pins: PinRegistry::new(),
            policy,
            max_depth: 0,
            observer: None,
        };
        tree.sort(None);
        tree.recalculate_max_depth();
        Ok(tree)
    }

    /// The root node ID
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a node by its ID, `None` if the ID is invalid
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    /// Which nodes consume position slots in this instantiation
    pub fn policy(&self) -> PositionPolicy {
        self.policy
    }

    /// The sorter's current criteria chain
    pub fn sorter(&self) -> &Sorter {
        &self.sorter
    }

    /// Maximum depth across currently visible nodes
    pub fn max_depth(&self) -> i32 {
        self.max_depth
    }

    /// Total number of nodes in the tree
    pub fn total_count(&self) -> usize {
        self.arena.len()
    }

    /// Every node in pre-order, regardless of expansion state
    pub fn all_nodes(&self) -> Vec<NodeId> {
        traversal::walk(&self.arena, self.root, TraversalMode::Full)
    }

    /// The currently visible pre-order sequence (contents of closed
    /// aggregates excluded)
    pub fn visible_nodes(&self) -> Vec<NodeId> {
        traversal::walk(&self.arena, self.root, TraversalMode::Visible)
    }

    /// Number of currently visible nodes
    pub fn visible_count(&self) -> usize {
        self.visible_nodes().len()
    }

    /// Register a callback fired whenever layout moves or re-nests a node.
    ///
    /// This replaces direct rendering side effects inside the tree: the
    /// rendering layer subscribes here instead of being called by the core.
    pub fn set_layout_observer(&mut self, observer: impl FnMut(&LayoutEvent) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn clear_layout_observer(&mut self) {
        self.observer = None;
    }

    // ---- sorting ----------------------------------------------------------

    /// Re-sort every sibling group under `start` (default: the whole tree)
    /// and re-run layout.
    ///
    /// Each group is sorted independently; nodes are only ever compared
    /// against their own siblings.
    pub fn sort(&mut self, start: Option<NodeId>) {
        let start = start.unwrap_or(self.root);
        debug!("sorting from {start} with {:?}", self.sorter);
        self.sort_subtree(start);
        self.layout(Some(start));
    }

    fn sort_subtree(&mut self, id: NodeId) {
        let mut ordered = match self.arena[id].as_aggregate() {
            Some(agg) if !agg.children.is_empty() => agg.children.clone(),
            _ => return,
        };
        self.sorter.sort(&self.arena, &mut ordered);
        self.arena.link_siblings(&ordered);
        for child in ordered {
            self.sort_subtree(child);
        }
    }

    /// Append a criterion, then re-sort the tree and the pinned sequence
    pub fn add_criterion(&mut self, criterion: Box<dyn SortCriterion>) {
        self.sorter.add_criterion(criterion);
        self.resort();
    }

    /// Remove a criterion by name; unknown names are silent no-ops
    pub fn remove_criterion(&mut self, name: &str) {
        if self.sorter.remove_criterion(name) {
            self.resort();
        }
    }

    /// Move a criterion to a new priority slot
    pub fn move_criterion(&mut self, name: &str, new_index: usize) {
        if self.sorter.move_criterion(name, new_index) {
            self.resort();
        }
    }

    /// Set a criterion's reverse flag
    pub fn set_criterion_reverse(&mut self, name: &str, reverse: bool) {
        if self.sorter.set_reverse(name, reverse) {
            self.resort();
        }
    }

    fn resort(&mut self) {
        self.sort(None);
        self.sort_pins();
    }

    // ---- layout -----------------------------------------------------------

    /// Assign position and depth to every node visible from `start`
    /// (default: the root).
    ///
    /// Partial starts are normalized to the root in two cases: under
    /// [`PositionPolicy::LeavesOnly`], where aggregates never hold a valid
    /// running position, and when `start` itself is unplaced (hidden inside
    /// a closed ancestor), where seeding from its -1 position would leak
    /// positions into hidden nodes and renumber visible followers wrongly.
    pub fn layout(&mut self, start: Option<NodeId>) {
        let start = match start {
            Some(id)
                if self.policy == PositionPolicy::AllNodes
                    && self.arena[id].position() >= 0 =>
            {
                id
            }
            _ => self.root,
        };
        let (first_position, first_depth) = if start == self.root {
            (0, 0)
        } else {
            (self.arena[start].position(), self.arena[start].depth())
        };

        let placements =
            traversal::plan_layout(&self.arena, start, first_position, first_depth, self.policy);
        trace!("layout from {start}: {} placements", placements.len());
        for placement in placements {
            self.apply(placement);
        }
    }

    fn apply(&mut self, placement: Placement) {
        self.apply_position(placement.node, placement.position);
        self.apply_depth(placement.node, placement.depth);
    }

    fn apply_position(&mut self, id: NodeId, position: i32) {
        let from = {
            let node = &mut self.arena[id];
            let from = node.position();
            node.set_position(position);
            from
        };
        if from != position {
            if let Some(observer) = self.observer.as_mut() {
                observer(&LayoutEvent::Moved {
                    node: id,
                    from,
                    to: position,
                });
            }
        }
    }

    fn apply_depth(&mut self, id: NodeId, depth: i32) {
        let changed = {
            let node = &mut self.arena[id];
            let changed = node.depth() != depth;
            node.set_depth(depth);
            changed
        };
        if changed {
            if let Some(observer) = self.observer.as_mut() {
                observer(&LayoutEvent::Nested { node: id, depth });
            }
        }
    }

    fn recalculate_max_depth(&mut self) {
        let mut max_depth = 0;
        for id in self.visible_nodes() {
            max_depth = max_depth.max(self.arena[id].depth());
        }
        self.max_depth = max_depth;
    }

    // ---- expansion --------------------------------------------------------

    /// Flip an aggregate between open and closed; leaves are a no-op
    pub fn toggle_expansion(&mut self, id: NodeId) {
        if self.arena[id].is_open() {
            self.collapse(id);
        } else {
            self.expand(id);
        }
    }

    /// Open an aggregate. Children keep their own expansion state, so
    /// re-opening reveals them exactly as they were left.
    pub fn expand(&mut self, id: NodeId) {
        let Some(agg) = self.arena[id].as_aggregate_mut() else {
            return;
        };
        agg.is_open = true;
        debug!("expanded {id}");
        self.layout(Some(id));
        self.recalculate_max_depth();
    }

    /// Close an aggregate. Cascades: every descendant aggregate is closed
    /// too, and every descendant's position is cleared to -1 so no consumer
    /// can read a stale placement.
    pub fn collapse(&mut self, id: NodeId) {
        if self.arena[id].as_aggregate().is_none() {
            return;
        }
        self.close_subtree(id);
        debug!("collapsed {id}");
        self.layout(Some(id));
        self.recalculate_max_depth();
    }

    fn close_subtree(&mut self, id: NodeId) {
        let children = {
            let Some(agg) = self.arena[id].as_aggregate_mut() else {
                return;
            };
            agg.is_open = false;
            agg.children.clone()
        };
        for child in children {
            self.apply_position(child, -1);
            if self.arena[child].as_aggregate().is_some() {
                self.close_subtree(child);
            }
        }
    }

    /// Open an aggregate and, recursively, every aggregate below it
    pub fn expand_deep(&mut self, id: NodeId) {
        if self.arena[id].as_aggregate().is_none() {
            return;
        }
        self.open_subtree(id);
        self.layout(Some(id));
        self.recalculate_max_depth();
    }

    fn open_subtree(&mut self, id: NodeId) {
        let children = {
            let Some(agg) = self.arena[id].as_aggregate_mut() else {
                return;
            };
            agg.is_open = true;
            agg.children.clone()
        };
        for child in children {
            self.open_subtree(child);
        }
    }

    /// Open every aggregate in the tree in one pass
    pub fn expand_all(&mut self) {
        for index in 0..self.arena.len() {
            if let Some(agg) = self.arena[NodeId::new(index)].as_aggregate_mut() {
                agg.is_open = true;
            }
        }
        self.layout(None);
        self.recalculate_max_depth();
    }

    // ---- selection --------------------------------------------------------

    /// Set a leaf's selection flag, adjusting the running counts on every
    /// ancestor aggregate. Aggregates and unchanged flags are no-ops.
    pub fn set_selected(&mut self, id: NodeId, selected: bool) {
        let changed = match &mut self.arena[id].kind {
            NodeKind::Leaf(leaf) if leaf.selected != selected => {
                leaf.selected = selected;
                true
            }
            _ => false,
        };
        if !changed {
            return;
        }
        trace!("leaf {id} selected={selected}");

        let mut cursor = self.arena[id].parent();
        while let Some(ancestor) = cursor {
            if let Some(agg) = self.arena[ancestor].as_aggregate_mut() {
                if selected {
                    agg.selected_leaf_count += 1;
                } else {
                    agg.selected_leaf_count -= 1;
                }
            }
            cursor = self.arena[ancestor].parent();
        }
    }

    /// Flip a leaf's selection flag
    pub fn toggle_selected(&mut self, id: NodeId) {
        let Some(leaf) = self.arena[id].as_leaf() else {
            return;
        };
        let next = !leaf.selected;
        self.set_selected(id, next);
    }

    /// Set the selection flag on every leaf below an aggregate
    pub fn select_descendants(&mut self, id: NodeId, selected: bool) {
        let children = match self.arena[id].as_aggregate() {
            Some(agg) => agg.children.clone(),
            None => return,
        };
        for child in children {
            if self.arena[child].is_leaf() {
                self.set_selected(child, selected);
            } else {
                self.select_descendants(child, selected);
            }
        }
    }

    // ---- pins -------------------------------------------------------------

    /// Pin a leaf if unpinned, unpin it otherwise; returns whether anything
    /// changed
    pub fn toggle_pin(&mut self, id: NodeId) -> bool {
        if self.pins.contains(id) {
            self.remove_pin(id)
        } else {
            self.add_pin(id)
        }
    }

    /// Pin a leaf. Aggregates cannot be pinned; already-pinned leaves are a
    /// no-op. The pinned sequence is re-sorted with the same criteria chain.
    pub fn add_pin(&mut self, id: NodeId) -> bool {
        if !self.arena[id].is_leaf() {
            debug!("refusing to pin non-leaf {id}");
            return false;
        }
        if !self.pins.add(id) {
            return false;
        }
        self.sort_pins();
        true
    }

    /// Unpin a leaf; silently a no-op when it is not pinned
    pub fn remove_pin(&mut self, id: NodeId) -> bool {
        self.pins.remove(id)
    }

    /// The pinned sequence in its own sorted order
    pub fn pinned(&self) -> &[NodeId] {
        self.pins.as_slice()
    }

    pub fn is_pinned(&self, id: NodeId) -> bool {
        self.pins.contains(id)
    }

    /// Change counter for the pinned sequence, for external change detection
    pub fn pin_revision(&self) -> u64 {
        self.pins.revision()
    }

    fn sort_pins(&mut self) {
        let mut ordered = self.pins.as_slice().to_vec();
        self.sorter.sort(&self.arena, &mut ordered);
        self.pins.set_order(ordered);
    }
}

impl std::ops::Index<NodeId> for HierarchyTree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.arena[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::sorter::ByName;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn sample_payload() -> NodePayload {
        NodePayload::aggregate(
            "root",
            true,
            vec![
                NodePayload::leaf("a"),
                NodePayload::aggregate(
                    "b",
                    false,
                    vec![NodePayload::leaf("b1"), NodePayload::leaf("b2")],
                ),
            ],
        )
    }

    fn by_name_sorter() -> Sorter {
        Sorter::with_criteria(vec![Box::new(ByName::new(false))])
    }

    fn find(tree: &HierarchyTree, name: &str) -> NodeId {
        tree.all_nodes()
            .into_iter()
            .find(|&id| tree[id].name == name)
            .unwrap()
    }

    #[test]
    fn test_construction_sorts_and_lays_out() {
        let tree = HierarchyTree::items(&sample_payload(), by_name_sorter()).unwrap();
        assert_eq!(tree.total_count(), 5);
        assert_eq!(tree.visible_count(), 3);

        let root = tree.root();
        assert_eq!(tree[root].position(), 0);
        assert_eq!(tree[root].depth(), 0);
        assert_eq!(tree[find(&tree, "a")].position(), 1);
        assert_eq!(tree[find(&tree, "b")].position(), 2);
        assert_eq!(tree[find(&tree, "b1")].position(), -1);
        assert_eq!(tree.max_depth(), 1);
    }

    #[test]
    fn test_expand_keeps_child_state_and_collapse_cascades() {
        let payload = NodePayload::aggregate(
            "root",
            true,
            vec![NodePayload::aggregate(
                "outer",
                true,
                vec![
                    NodePayload::aggregate("inner", true, vec![NodePayload::leaf("deep")]),
                    NodePayload::leaf("shallow"),
                ],
            )],
        );
        let mut tree = HierarchyTree::items(&payload, by_name_sorter()).unwrap();
        let outer = find(&tree, "outer");
        let inner = find(&tree, "inner");
        let deep = find(&tree, "deep");

        tree.collapse(outer);
        // Cascade: inner is closed too and every descendant is unplaced.
        assert!(!tree[outer].is_open());
        assert!(!tree[inner].is_open());
        assert_eq!(tree[inner].position(), -1);
        assert_eq!(tree[deep].position(), -1);

        tree.expand(outer);
        // Non-cascading: inner stays closed, so deep stays unplaced.
        assert!(tree[outer].is_open());
        assert!(!tree[inner].is_open());
        assert!(tree[inner].position() >= 0);
        assert_eq!(tree[deep].position(), -1);
    }

    #[test]
    fn test_expand_of_hidden_aggregate_leaks_no_positions() {
        let payload = NodePayload::aggregate(
            "root",
            true,
            vec![
                NodePayload::aggregate(
                    "b",
                    false,
                    vec![NodePayload::aggregate(
                        "c",
                        false,
                        vec![NodePayload::leaf("x")],
                    )],
                ),
                NodePayload::leaf("d"),
            ],
        );
        let mut tree = HierarchyTree::items(&payload, by_name_sorter()).unwrap();
        let c = find(&tree, "c");
        let x = find(&tree, "x");
        let d = find(&tree, "d");
        let d_before = tree[d].position();

        // c sits inside the closed b, so opening it must not place anything.
        tree.expand(c);
        assert!(tree[c].is_open());
        assert_eq!(tree[c].position(), -1);
        assert_eq!(tree[x].position(), -1);
        assert_eq!(tree[d].position(), d_before);

        let visible = tree.visible_nodes();
        for (expected, &id) in visible.iter().enumerate() {
            assert_eq!(tree[id].position(), expected as i32);
        }

        // Opening b then reveals c in the open state it was left in.
        tree.expand(find(&tree, "b"));
        assert!(tree[x].position() >= 0);
    }

    #[test]
    fn test_collapse_of_hidden_aggregate_leaves_visible_untouched() {
        let payload = NodePayload::aggregate(
            "root",
            true,
            vec![
                NodePayload::aggregate(
                    "b",
                    false,
                    vec![NodePayload::aggregate(
                        "c",
                        true,
                        vec![NodePayload::leaf("x")],
                    )],
                ),
                NodePayload::leaf("d"),
            ],
        );
        let mut tree = HierarchyTree::items(&payload, by_name_sorter()).unwrap();
        let d = find(&tree, "d");
        let d_before = tree[d].position();

        tree.collapse(find(&tree, "c"));
        assert_eq!(tree[d].position(), d_before);
        assert_eq!(tree.visible_count(), 3);
    }

    #[test]
    fn test_expand_deep_opens_whole_subtree() {
        let payload = NodePayload::aggregate(
            "root",
            true,
            vec![NodePayload::aggregate(
                "outer",
                false,
                vec![NodePayload::aggregate(
                    "inner",
                    false,
                    vec![NodePayload::leaf("deep")],
                )],
            )],
        );
        let mut tree = HierarchyTree::items(&payload, by_name_sorter()).unwrap();
        tree.expand_deep(find(&tree, "outer"));

        assert!(tree[find(&tree, "inner")].is_open());
        assert!(tree[find(&tree, "deep")].position() >= 0);
        assert_eq!(tree.visible_count(), tree.total_count());
        assert_eq!(tree.max_depth(), 3);
    }

    #[test]
    fn test_expand_all_places_every_node() {
        let mut tree = HierarchyTree::items(&sample_payload(), by_name_sorter()).unwrap();
        tree.expand_all();

        let visible = tree.visible_nodes();
        assert_eq!(visible.len(), tree.total_count());
        for (expected, id) in visible.iter().enumerate() {
            assert_eq!(tree[*id].position(), expected as i32);
        }
    }

    #[test]
    fn test_expansion_of_leaf_is_noop() {
        let mut tree = HierarchyTree::items(&sample_payload(), by_name_sorter()).unwrap();
        let a = find(&tree, "a");
        let before = tree[a].position();
        tree.toggle_expansion(a);
        tree.expand(a);
        tree.collapse(a);
        assert_eq!(tree[a].position(), before);
        assert_eq!(tree.visible_count(), 3);
    }

    #[test]
    fn test_selection_bookkeeping() {
        let mut tree = HierarchyTree::attributes(&sample_payload(), by_name_sorter()).unwrap();
        let root = tree.root();
        let b = find(&tree, "b");
        let b1 = find(&tree, "b1");

        assert_eq!(tree[root].as_aggregate().unwrap().selected_leaf_count, 3);
        assert_eq!(tree[b].as_aggregate().unwrap().selected_leaf_count, 2);

        tree.toggle_selected(b1);
        assert_eq!(tree[root].as_aggregate().unwrap().selected_leaf_count, 2);
        assert_eq!(tree[b].as_aggregate().unwrap().selected_leaf_count, 1);

        // Repeated toggles net out to the original counts.
        tree.toggle_selected(b1);
        assert_eq!(tree[root].as_aggregate().unwrap().selected_leaf_count, 3);
        assert_eq!(tree[b].as_aggregate().unwrap().selected_leaf_count, 2);

        // Setting the current value again changes nothing.
        tree.set_selected(b1, true);
        assert_eq!(tree[root].as_aggregate().unwrap().selected_leaf_count, 3);
    }

    #[test]
    fn test_select_descendants() {
        let mut tree = HierarchyTree::attributes(&sample_payload(), by_name_sorter()).unwrap();
        let root = tree.root();
        tree.select_descendants(root, false);
        assert_eq!(tree[root].as_aggregate().unwrap().selected_leaf_count, 0);
        tree.select_descendants(root, true);
        assert_eq!(tree[root].as_aggregate().unwrap().selected_leaf_count, 3);
    }

    #[test]
    fn test_pins_reject_aggregates_and_sort_themselves() {
        let mut tree = HierarchyTree::items(&sample_payload(), by_name_sorter()).unwrap();
        let b = find(&tree, "b");
        assert!(!tree.add_pin(b));
        assert!(tree.pinned().is_empty());

        let b2 = find(&tree, "b2");
        let b1 = find(&tree, "b1");
        assert!(tree.toggle_pin(b2));
        assert!(tree.toggle_pin(b1));
        // Pinned among themselves follow the criteria chain, not pin order.
        assert_eq!(tree.pinned(), &[b1, b2]);

        let revision = tree.pin_revision();
        assert!(tree.toggle_pin(b1));
        assert_eq!(tree.pinned(), &[b2]);
        assert!(tree.pin_revision() > revision);
    }

    #[test]
    fn test_criterion_changes_trigger_resort() {
        let mut tree = HierarchyTree::items(&sample_payload(), by_name_sorter()).unwrap();
        let a = find(&tree, "a");
        let b = find(&tree, "b");
        assert!(tree[a].position() < tree[b].position());

        tree.set_criterion_reverse("name", true);
        assert!(tree[b].position() < tree[a].position());

        tree.set_criterion_reverse("name", false);
        assert!(tree[a].position() < tree[b].position());

        // Unknown criterion names leave everything untouched.
        tree.remove_criterion("missing");
        assert!(tree[a].position() < tree[b].position());
    }

    #[test]
    fn test_layout_observer_sees_moves() {
        let mut tree = HierarchyTree::items(&sample_payload(), by_name_sorter()).unwrap();
        let events: Rc<RefCell<Vec<LayoutEvent>>> = Rc::default();
        let sink = Rc::clone(&events);
        tree.set_layout_observer(move |event| sink.borrow_mut().push(*event));

        let b = find(&tree, "b");
        tree.expand(b);

        let moved: Vec<_> = events
            .borrow()
            .iter()
            .filter(|event| matches!(event, LayoutEvent::Moved { .. }))
            .copied()
            .collect();
        assert!(!moved.is_empty());
        assert!(moved.iter().any(|event| matches!(
            event,
            LayoutEvent::Moved { to, .. } if *to == 3
        )));
    }

    #[test]
    fn test_max_depth_rescans_after_collapse() {
        let mut tree = HierarchyTree::items(&sample_payload(), by_name_sorter()).unwrap();
        let b = find(&tree, "b");
        tree.expand(b);
        assert_eq!(tree.max_depth(), 2);
        tree.collapse(b);
        assert_eq!(tree.max_depth(), 1);
    }
}
