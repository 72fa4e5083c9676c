//! Iterative pre-order traversal and layout planning
//!
//! One engine serves both hierarchy instantiations; the only difference is
//! whether aggregate nodes consume a position slot ([`PositionPolicy`]).
//! Traversal never recurses and never allocates an explicit stack: it walks
//! first-child links downwards and backtracks through parent/sibling links.

use crate::tree::arena::NodeArena;
use crate::tree::node::NodeId;

/// Which visited nodes consume a position slot during layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionPolicy {
    /// Every visited node takes a slot. Item hierarchy: aggregates are
    /// rendered as rows of their own.
    AllNodes,
    /// Only leaves take a slot. Attribute hierarchy: groups have no rendered
    /// column and must not shift column indices.
    LeavesOnly,
}

/// Which subtrees a walk descends into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalMode {
    /// Skip the contents of closed aggregates
    Visible,
    /// Descend regardless of open state (for counting/export)
    Full,
}

/// One planned position/depth assignment produced by [`plan_layout`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub node: NodeId,
    pub position: i32,
    pub depth: i32,
}

/// Plan position and depth for every node visible from `start`.
///
/// Visitation is pre-order and continues past the start subtree through the
/// siblings of its ancestors, so a partial re-layout after a localized
/// expand/collapse still renumbers everything that follows it. Nodes that do
/// not count toward the sequence under `policy` are planned at position -1.
///
/// # Panics
///
/// Panics if more nodes are visited than exist in the arena, which means the
/// sibling chain is corrupted. Well-formed construction rules this out.
pub(crate) fn plan_layout(
    arena: &NodeArena,
    start: NodeId,
    first_position: i32,
    first_depth: i32,
    policy: PositionPolicy,
) -> Vec<Placement> {
    let mut placements = Vec::new();
    let mut pointer = Some(start);
    let mut position = first_position;
    let mut depth = first_depth;

    while let Some(current) = pointer {
        if placements.len() >= arena.len() {
            panic!("layout visited more nodes than the arena holds; sibling chain is corrupted");
        }

        let counts_toward_sequence = match policy {
            PositionPolicy::AllNodes => true,
            PositionPolicy::LeavesOnly => arena[current].is_leaf(),
        };
        if counts_toward_sequence {
            placements.push(Placement {
                node: current,
                position,
                depth,
            });
            position += 1;
        } else {
            placements.push(Placement {
                node: current,
                position: -1,
                depth,
            });
        }

        if arena[current].is_open() && arena[current].has_children() {
            pointer = arena.first_child(current);
            depth += 1;
        } else {
            pointer = advance(arena, current, Some(&mut depth));
        }
    }

    placements
}

/// Enumerate nodes reachable from `start` in pre-order.
///
/// `Visible` mirrors the layout pass without assigning anything; `Full`
/// descends into closed aggregates as well.
///
/// # Panics
///
/// Same corruption bound as [`plan_layout`].
pub(crate) fn walk(arena: &NodeArena, start: NodeId, mode: TraversalMode) -> Vec<NodeId> {
    let mut visited = Vec::new();
    let mut pointer = Some(start);

    while let Some(current) = pointer {
        if visited.len() >= arena.len() {
            panic!("walk visited more nodes than the arena holds; sibling chain is corrupted");
        }
        visited.push(current);

        let descend = arena[current].has_children()
            && match mode {
                TraversalMode::Full => true,
                TraversalMode::Visible => arena[current].is_open(),
            };
        if descend {
            pointer = arena.first_child(current);
        } else {
            pointer = advance(arena, current, None);
        }
    }

    visited
}

/// Step to the next sibling, backtracking through parents until one exists.
/// Returns `None` once backtracking reaches the root with no next sibling.
fn advance(arena: &NodeArena, from: NodeId, mut depth: Option<&mut i32>) -> Option<NodeId> {
    let mut cursor = from;
    loop {
        if let Some(next) = arena[cursor].next_sibling() {
            return Some(next);
        }
        match arena[cursor].parent() {
            Some(parent) => {
                cursor = parent;
                if let Some(depth) = depth.as_deref_mut() {
                    *depth -= 1;
                }
            }
            None => return None,
        }
    }
}
