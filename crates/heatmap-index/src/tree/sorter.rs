//! Multi-criterion stable sorting of sibling groups

use std::cmp::Ordering;
use std::fmt;

use crate::tree::arena::NodeArena;
use crate::tree::node::{Node, NodeId};

/// One comparison rule used, in priority order, by the [`Sorter`]
///
/// `compare` returns the raw ordering; the `reverse` flag is applied on top
/// by [`SortCriterion::compare_directed`]. Comparators are not assumed to be
/// total orders; ties fall through to the next criterion and finally to the
/// stable sort's original relative order.
pub trait SortCriterion {
    /// Stable technical identifier used for removal and reordering
    fn name(&self) -> &'static str;

    /// Human readable label for UI listings
    fn label(&self) -> &'static str;

    fn reverse(&self) -> bool;

    fn set_reverse(&mut self, reverse: bool);

    /// Raw comparison, before the reverse flag is applied
    fn compare(&self, a: &Node, b: &Node) -> Ordering;

    /// Comparison with the reverse flag applied
    fn compare_directed(&self, a: &Node, b: &Node) -> Ordering {
        let ordering = self.compare(a, b);
        if self.reverse() {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

macro_rules! criterion_boilerplate {
    ($type:ty, $name:literal, $label:literal) => {
        impl $type {
            pub fn new(reverse: bool) -> Self {
                Self { reverse }
            }
        }

        impl SortCriterion for $type {
            fn name(&self) -> &'static str {
                $name
            }

            fn label(&self) -> &'static str {
                $label
            }

            fn reverse(&self) -> bool {
                self.reverse
            }

            fn set_reverse(&mut self, reverse: bool) {
                self.reverse = reverse;
            }

            fn compare(&self, a: &Node, b: &Node) -> Ordering {
                Self::compare_nodes(a, b)
            }
        }
    };
}

/// Case-folded lexical compare on the display name
#[derive(Debug, Clone, Default)]
pub struct ByName {
    reverse: bool,
}

impl ByName {
    fn compare_nodes(a: &Node, b: &Node) -> Ordering {
        a.name.to_lowercase().cmp(&b.name.to_lowercase())
    }
}

criterion_boilerplate!(ByName, "name", "Name");

/// Nodes with children sort before leaves (or after, when reversed)
#[derive(Debug, Clone, Default)]
pub struct ByHasChildren {
    reverse: bool,
}

impl ByHasChildren {
    fn compare_nodes(a: &Node, b: &Node) -> Ordering {
        b.has_children().cmp(&a.has_children())
    }
}

criterion_boilerplate!(ByHasChildren, "has_children", "Has Children");

/// Numeric compare on the precomputed dispersion statistic
#[derive(Debug, Clone, Default)]
pub struct ByDispersion {
    reverse: bool,
}

impl ByDispersion {
    fn compare_nodes(a: &Node, b: &Node) -> Ordering {
        a.dispersion.total_cmp(&b.dispersion)
    }
}

criterion_boilerplate!(ByDispersion, "dispersion", "Dispersion");

/// Compare on the payload document order fixed at construction
#[derive(Debug, Clone, Default)]
pub struct ByOriginalOrder {
    reverse: bool,
}

impl ByOriginalOrder {
    fn compare_nodes(a: &Node, b: &Node) -> Ordering {
        a.original_index().cmp(&b.original_index())
    }
}

criterion_boilerplate!(ByOriginalOrder, "original_order", "Original Order");

/// Compare on the pre-aggregated leaf descendant count
#[derive(Debug, Clone, Default)]
pub struct ByDescendantCount {
    reverse: bool,
}

impl ByDescendantCount {
    fn compare_nodes(a: &Node, b: &Node) -> Ordering {
        a.total_leaf_count.cmp(&b.total_leaf_count)
    }
}

criterion_boilerplate!(ByDescendantCount, "descendant_count", "Descendant Count");

/// Ordered list of criteria applied as a lexicographic tie-break chain
///
/// The sorter itself is pure: it never triggers re-layout or reaches into
/// shared state. The owning tree re-sorts and re-lays-out whenever the
/// criteria list changes.
#[derive(Default)]
pub struct Sorter {
    criteria: Vec<Box<dyn SortCriterion>>,
}

impl Sorter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_criteria(criteria: Vec<Box<dyn SortCriterion>>) -> Self {
        Self { criteria }
    }

    /// Stable-sort one sibling group in place.
    ///
    /// The first criterion returning a non-equal ordering wins; full ties
    /// keep their original relative order.
    pub(crate) fn sort(&self, arena: &NodeArena, group: &mut [NodeId]) {
        if self.criteria.is_empty() {
            return;
        }
        group.sort_by(|&a, &b| self.compare_ids(arena, a, b));
    }

    fn compare_ids(&self, arena: &NodeArena, a: NodeId, b: NodeId) -> Ordering {
        for criterion in &self.criteria {
            let ordering = criterion.compare_directed(&arena[a], &arena[b]);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Append a criterion with the lowest priority
    pub fn add_criterion(&mut self, criterion: Box<dyn SortCriterion>) {
        self.criteria.push(criterion);
    }

    /// Remove a criterion by technical name; silently does nothing if absent
    pub fn remove_criterion(&mut self, name: &str) -> bool {
        let before = self.criteria.len();
        self.criteria.retain(|criterion| criterion.name() != name);
        self.criteria.len() != before
    }

    /// Move a criterion to a new priority slot; out-of-bounds indices and
    /// unknown names are silent no-ops
    pub fn move_criterion(&mut self, name: &str, new_index: usize) -> bool {
        let Some(index) = self.position_of(name) else {
            return false;
        };
        if new_index >= self.criteria.len() {
            return false;
        }
        let criterion = self.criteria.remove(index);
        self.criteria.insert(new_index, criterion);
        true
    }

    /// Flip or set the reverse flag of a criterion
    pub fn set_reverse(&mut self, name: &str, reverse: bool) -> bool {
        match self.position_of(name) {
            Some(index) => {
                self.criteria[index].set_reverse(reverse);
                true
            }
            None => false,
        }
    }

    /// Current criteria in priority order
    pub fn criteria(&self) -> impl Iterator<Item = &dyn SortCriterion> {
        self.criteria.iter().map(|criterion| criterion.as_ref())
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.criteria
            .iter()
            .position(|criterion| criterion.name() == name)
    }
}

impl fmt::Debug for Sorter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self
            .criteria
            .iter()
            .map(|criterion| {
                if criterion.reverse() {
                    format!("{} (reversed)", criterion.name())
                } else {
                    criterion.name().to_string()
                }
            })
            .collect();
        f.debug_struct("Sorter").field("criteria", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::{LeafData, NodeKind};
    use pretty_assertions::assert_eq;

    fn arena_with_leaves(names: &[&str]) -> (NodeArena, Vec<NodeId>) {
        let mut arena = NodeArena::new();
        let ids = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                arena.push(Node::new(
                    name.to_string(),
                    NodeKind::Leaf(LeafData { selected: true }),
                    None,
                    i,
                ))
            })
            .collect();
        (arena, ids)
    }

    fn names(arena: &NodeArena, ids: &[NodeId]) -> Vec<String> {
        ids.iter().map(|&id| arena[id].name.clone()).collect()
    }

    #[test]
    fn test_sort_by_name_case_folded() {
        let (arena, mut ids) = arena_with_leaves(&["beta", "Alpha", "gamma"]);
        let sorter = Sorter::with_criteria(vec![Box::new(ByName::new(false))]);
        sorter.sort(&arena, &mut ids);
        assert_eq!(names(&arena, &ids), vec!["Alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_reverse_flag_flips_order() {
        let (arena, mut ids) = arena_with_leaves(&["a", "b", "c"]);
        let sorter = Sorter::with_criteria(vec![Box::new(ByName::new(true))]);
        sorter.sort(&arena, &mut ids);
        assert_eq!(names(&arena, &ids), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_tie_break_chain() {
        let (mut arena, mut ids) = arena_with_leaves(&["dup", "dup", "aaa"]);
        arena[ids[0]].dispersion = 2.0;
        arena[ids[1]].dispersion = 1.0;
        arena[ids[2]].dispersion = 3.0;

        let sorter = Sorter::with_criteria(vec![
            Box::new(ByName::new(false)),
            Box::new(ByDispersion::new(false)),
        ]);
        sorter.sort(&arena, &mut ids);

        // "aaa" first by name; the two "dup"s ordered by dispersion.
        assert_eq!(names(&arena, &ids), vec!["aaa", "dup", "dup"]);
        assert_eq!(arena[ids[1]].dispersion, 1.0);
        assert_eq!(arena[ids[2]].dispersion, 2.0);
    }

    #[test]
    fn test_full_tie_keeps_original_order() {
        let (arena, mut ids) = arena_with_leaves(&["same", "same", "same"]);
        let original = ids.clone();
        let sorter = Sorter::with_criteria(vec![Box::new(ByName::new(false))]);
        sorter.sort(&arena, &mut ids);
        assert_eq!(ids, original);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let (arena, mut ids) = arena_with_leaves(&["c", "a", "b"]);
        let sorter = Sorter::with_criteria(vec![Box::new(ByName::new(false))]);
        sorter.sort(&arena, &mut ids);
        let once = ids.clone();
        sorter.sort(&arena, &mut ids);
        assert_eq!(ids, once);
    }

    #[test]
    fn test_by_original_order_restores_document_order() {
        let (arena, mut ids) = arena_with_leaves(&["z", "m", "a"]);
        let document = ids.clone();
        ids.reverse();

        let sorter = Sorter::with_criteria(vec![Box::new(ByOriginalOrder::new(false))]);
        sorter.sort(&arena, &mut ids);
        assert_eq!(ids, document);
    }

    #[test]
    fn test_criteria_management() {
        let mut sorter = Sorter::new();
        sorter.add_criterion(Box::new(ByName::new(false)));
        sorter.add_criterion(Box::new(ByDispersion::new(false)));
        assert_eq!(sorter.len(), 2);

        assert!(sorter.move_criterion("dispersion", 0));
        let order: Vec<_> = sorter.criteria().map(|criterion| criterion.name()).collect();
        assert_eq!(order, vec!["dispersion", "name"]);

        // Unknown names and out-of-bounds indices are no-ops.
        assert!(!sorter.move_criterion("missing", 0));
        assert!(!sorter.move_criterion("name", 5));
        assert!(!sorter.remove_criterion("missing"));

        assert!(sorter.set_reverse("name", true));
        assert!(sorter.remove_criterion("name"));
        assert_eq!(sorter.len(), 1);
    }

    #[test]
    fn test_empty_sorter_leaves_group_untouched() {
        let (arena, mut ids) = arena_with_leaves(&["c", "a", "b"]);
        let original = ids.clone();
        Sorter::new().sort(&arena, &mut ids);
        assert_eq!(ids, original);
    }
}
