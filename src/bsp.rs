//! Binary space partition tree operations (§4.4).
//!
//! Arena-backed, in the style of the teacher's `space/tree.rs` and
//! `space/bsp.rs` (`Vec<Node>` with `Option<usize>` parent/child links) but
//! a slab with a free list so nodes can be removed and reused, since this
//! tree is mutated live by window map/unmap rather than built once from a
//! fixed container count.

use std::collections::HashMap;

use crate::container::ContainerId;
use crate::geometry::{Rect, RectExt};

/// The split direction of an internal BSP node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Horizontal,
    Vertical,
}

/// Which side of a new internal parent a leaf is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Left,
    Right,
}

#[derive(Debug)]
enum NodeKind {
    Leaf { container: ContainerId },
    Internal { split: Split, left_wfact: f64, left: usize, right: usize },
}

#[derive(Debug)]
struct BspNode {
    parent: Option<usize>,
    rect: Rect,
    enabled: bool,
    kind: NodeKind,
}

/// A purely-structural snapshot of a tree, for the round-trip test in §8
/// (invariant 7): arena slot numbers are allowed to change across an
/// insert/remove pair, but the shape must not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Empty,
    Leaf(ContainerId),
    Internal {
        split_is_horizontal: bool,
        left_wfact_millis: i64,
        left: Box<Snapshot>,
        right: Box<Snapshot>,
    },
}

/// An arena of BSP nodes for a single (output, workspace) pair. Default
/// state is an empty tree (no root).
#[derive(Debug, Default)]
pub struct BspTree {
    arena: Vec<Option<BspNode>>,
    free: Vec<usize>,
    root: Option<usize>,
    index_of: HashMap<ContainerId, usize>,
}

impl BspTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    #[must_use]
    pub fn contains(&self, container: ContainerId) -> bool {
        self.index_of.contains_key(&container)
    }

    /// Number of leaves currently in the tree (§8 invariant 2).
    #[must_use]
    pub fn count_leaves(&self) -> usize {
        self.index_of.len()
    }

    fn alloc(&mut self, node: BspNode) -> usize {
        if let Some(idx) = self.free.pop() {
            self.arena[idx] = Some(node);
            idx
        } else {
            self.arena.push(Some(node));
            self.arena.len() - 1
        }
    }

    fn free_slot(&mut self, idx: usize) {
        self.arena[idx] = None;
        self.free.push(idx);
    }

    fn node(&self, idx: usize) -> &BspNode {
        self.arena[idx].as_ref().expect("dangling BSP node index")
    }

    fn node_mut(&mut self, idx: usize) -> &mut BspNode {
        self.arena[idx].as_mut().expect("dangling BSP node index")
    }

    /// Insert `container` as a new leaf.
    ///
    /// If the tree is empty, the new leaf becomes the root. Otherwise
    /// `sibling` (normally the workspace's `last_focused` container)
    /// becomes the other child of a freshly created internal parent; the
    /// split direction is `Horizontal` if the sibling's current rect is at
    /// least as wide as it is tall, else `Vertical`. `pos` controls which
    /// side the *new* leaf lands on.
    ///
    /// If `sibling` isn't actually a leaf of this tree (a caller bug, or a
    /// stale `last_focused`), falls back to an arbitrary existing leaf so
    /// the tree stays in a valid state.
    pub fn insert(&mut self, container: ContainerId, sibling: Option<ContainerId>, pos: Position) {
        if self.root.is_none() {
            let idx = self.alloc(BspNode {
                parent: None,
                rect: Rect::default(),
                enabled: true,
                kind: NodeKind::Leaf { container },
            });
            self.root = Some(idx);
            self.index_of.insert(container, idx);
            return;
        }

        let sibling_idx = sibling
            .and_then(|c| self.index_of.get(&c).copied())
            .or_else(|| {
                crate::error::report_precondition_violation(
                    "bsp insert: sibling is not a leaf of this tree",
                );
                self.index_of.values().copied().next()
            });

        let Some(sibling_idx) = sibling_idx else {
            // Unreachable in practice: root.is_some() implies at least one
            // leaf, so index_of is non-empty.
            return;
        };

        let sibling_rect = self.node(sibling_idx).rect;
        let split = if sibling_rect.w() >= sibling_rect.h() {
            Split::Horizontal
        } else {
            Split::Vertical
        };

        let new_idx = self.alloc(BspNode {
            parent: None,
            rect: Rect::default(),
            enabled: true,
            kind: NodeKind::Leaf { container },
        });

        let (left, right) = match pos {
            Position::Left => (new_idx, sibling_idx),
            Position::Right => (sibling_idx, new_idx),
        };

        let parent_of_sibling = self.node(sibling_idx).parent;
        let internal_idx = self.alloc(BspNode {
            parent: parent_of_sibling,
            rect: sibling_rect,
            enabled: true,
            kind: NodeKind::Internal {
                split,
                left_wfact: 0.5,
                left,
                right,
            },
        });

        self.node_mut(left).parent = Some(internal_idx);
        self.node_mut(right).parent = Some(internal_idx);

        if let Some(grandparent) = parent_of_sibling {
            self.replace_child(grandparent, sibling_idx, internal_idx);
        } else {
            self.root = Some(internal_idx);
        }

        self.index_of.insert(container, new_idx);
    }

    fn replace_child(&mut self, parent: usize, old_child: usize, new_child: usize) {
        if let NodeKind::Internal { left, right, .. } = &mut self.node_mut(parent).kind {
            if *left == old_child {
                *left = new_child;
            } else if *right == old_child {
                *right = new_child;
            }
        }
    }

    fn sibling_of(&self, idx: usize) -> Option<usize> {
        let parent = self.node(idx).parent?;
        if let NodeKind::Internal { left, right, .. } = &self.node(parent).kind {
            Some(if *left == idx { *right } else { *left })
        } else {
            None
        }
    }

    /// Remove `container`'s leaf from the tree. Returns a container that
    /// would make a sensible new `last_focused` (the closest surviving
    /// sibling), if any leaf remains.
    pub fn remove(&mut self, container: ContainerId) -> Option<ContainerId> {
        let Some(leaf_idx) = self.index_of.remove(&container) else {
            crate::error::report_transient("bsp remove: container has no BSP leaf");
            return None;
        };

        let parent_idx = self.node(leaf_idx).parent;
        self.free_slot(leaf_idx);

        let Some(parent_idx) = parent_idx else {
            // The removed leaf was the root.
            self.root = None;
            return None;
        };

        let sibling_idx = self.sibling_of(leaf_idx).expect("internal node missing a child");
        let grandparent = self.node(parent_idx).parent;
        self.node_mut(sibling_idx).parent = grandparent;
        self.free_slot(parent_idx);

        if let Some(grandparent) = grandparent {
            self.replace_child(grandparent, parent_idx, sibling_idx);
        } else {
            self.root = Some(sibling_idx);
        }

        self.closest_leaf(sibling_idx)
    }

    fn closest_leaf(&self, idx: usize) -> Option<ContainerId> {
        match &self.node(idx).kind {
            NodeKind::Leaf { container } => Some(*container),
            NodeKind::Internal { left, .. } => self.closest_leaf(*left),
        }
    }

    /// Flip the split direction of `container`'s leaf's parent, if any.
    pub fn toggle_split(&mut self, container: ContainerId) {
        let Some(&leaf_idx) = self.index_of.get(&container) else {
            crate::error::report_transient("bsp toggle_split: container has no BSP leaf");
            return;
        };
        let Some(parent_idx) = self.node(leaf_idx).parent else {
            return;
        };
        if let NodeKind::Internal { split, .. } = &mut self.node_mut(parent_idx).kind {
            *split = match split {
                Split::Horizontal => Split::Vertical,
                Split::Vertical => Split::Horizontal,
            };
        }
    }

    /// Enable or disable `container`'s leaf (Maximized/Fullscreen yield the
    /// whole area to the sibling while disabled; §4.3).
    pub fn set_enabled(&mut self, container: ContainerId, enabled: bool) {
        if let Some(&idx) = self.index_of.get(&container) {
            self.node_mut(idx).enabled = enabled;
        }
    }

    /// Recompute every node's rectangle top-down from `root_rect`,
    /// returning the new `(container, rect)` pairs for every leaf so the
    /// caller can push resize events to its surfaces. A disabled child
    /// gives its sibling the full parent rect.
    pub fn update(&mut self, root_rect: Rect, gap: i32) -> Vec<(ContainerId, Rect)> {
        let mut out = Vec::with_capacity(self.index_of.len());
        if let Some(root) = self.root {
            self.update_node(root, root_rect, gap, &mut out);
        }
        out
    }

    fn update_node(&mut self, idx: usize, rect: Rect, gap: i32, out: &mut Vec<(ContainerId, Rect)>) {
        self.node_mut(idx).rect = rect;
        match self.node(idx).kind {
            NodeKind::Leaf { container } => out.push((container, rect)),
            NodeKind::Internal { split, left_wfact, left, right } => {
                let left_enabled = self.node(left).enabled;
                let right_enabled = self.node(right).enabled;
                match (left_enabled, right_enabled) {
                    (true, false) => self.update_node(left, rect, gap, out),
                    (false, true) => self.update_node(right, rect, gap, out),
                    _ => {
                        let (left_rect, right_rect) = rect.split(split, left_wfact, gap);
                        self.update_node(left, left_rect, gap, out);
                        self.update_node(right, right_rect, gap, out);
                    }
                }
            }
        }
    }

    /// Find the nearest ancestor of `container`'s leaf that fences a
    /// resize on the requested `edges`: for `LEFT`/`RIGHT` the nearest
    /// `Horizontal`-split ancestor where the leaf is on the opposite side
    /// of that fence; for `TOP`/`BOTTOM` the nearest `Vertical`-split
    /// ancestor, similarly. Either may be absent.
    #[must_use]
    pub fn find_resize_fence(
        &self,
        container: ContainerId,
        edges: crate::geometry::Edges,
    ) -> ResizeFence {
        use crate::geometry::Edges;

        let mut fence = ResizeFence::default();
        let Some(&leaf_idx) = self.index_of.get(&container) else {
            return fence;
        };

        let want_horizontal = edges.intersects(Edges::LEFT | Edges::RIGHT);
        let want_vertical = edges.intersects(Edges::TOP | Edges::BOTTOM);

        let mut current = leaf_idx;
        while let Some(parent_idx) = self.node(current).parent {
            if let NodeKind::Internal { split, left, .. } = self.node(parent_idx).kind {
                let is_left_child = left == current;
                match split {
                    Split::Horizontal
                        if want_horizontal
                            && fence.horizontal.is_none()
                            && ((edges.contains(Edges::LEFT) && !is_left_child)
                                || (edges.contains(Edges::RIGHT) && is_left_child)) =>
                    {
                        fence.horizontal = Some(parent_idx);
                    }
                    Split::Vertical
                        if want_vertical
                            && fence.vertical.is_none()
                            && ((edges.contains(Edges::TOP) && !is_left_child)
                                || (edges.contains(Edges::BOTTOM) && is_left_child)) =>
                    {
                        fence.vertical = Some(parent_idx);
                    }
                    _ => {}
                }
            }
            if fence.horizontal.is_some() && fence.vertical.is_some() {
                break;
            }
            current = parent_idx;
        }
        fence
    }

    /// Adjust the `left_wfact` of a fence found by
    /// [`BspTree::find_resize_fence`], clamped to `[0.05, 0.95]`.
    pub fn set_fence_left_wfact(&mut self, fence: usize, left_wfact: f64) {
        let clamped = left_wfact.clamp(0.05, 0.95);
        if (clamped - left_wfact).abs() > f64::EPSILON {
            crate::error::report_clamped("left_wfact out of [0.05, 0.95]");
        }
        if let NodeKind::Internal { left_wfact: slot, .. } = &mut self.node_mut(fence).kind {
            *slot = clamped;
        }
    }

    /// The rect of the fence node referenced by a [`ResizeFence`], as of
    /// the last [`BspTree::update`].
    #[must_use]
    pub fn fence_rect(&self, fence: usize) -> Rect {
        self.node(fence).rect
    }

    /// The `left_wfact` currently recorded at a fence node, used as the
    /// `fence_wfact_0` baseline for an interactive BSP resize (§4.6).
    #[must_use]
    pub fn fence_left_wfact(&self, fence: usize) -> f64 {
        match self.node(fence).kind {
            NodeKind::Internal { left_wfact, .. } => left_wfact,
            NodeKind::Leaf { .. } => {
                crate::error::report_precondition_violation("fence_left_wfact: node is a leaf");
                0.5
            }
        }
    }

    /// Whether `pos` (a drop point) should land `Left` or `Right` of
    /// `target`, per §4.4's should-insert-position heuristic.
    #[must_use]
    pub fn should_insert_position(target: Rect, point: crate::geometry::Point) -> Position {
        if target.w() >= target.h() {
            let mid_x = target.x() + target.w() / 2;
            if point.x > mid_x { Position::Right } else { Position::Left }
        } else {
            let mid_y = target.y() + target.h() / 2;
            if point.y > mid_y { Position::Right } else { Position::Left }
        }
    }

    /// The rect last assigned to `container`'s leaf, if it has one.
    #[must_use]
    pub fn leaf_rect(&self, container: ContainerId) -> Option<Rect> {
        self.index_of.get(&container).map(|&idx| self.node(idx).rect)
    }

    /// Build a structural snapshot for shape-equality comparisons (§8
    /// invariant 7).
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        match self.root {
            None => Snapshot::Empty,
            Some(root) => self.snapshot_node(root),
        }
    }

    fn snapshot_node(&self, idx: usize) -> Snapshot {
        match &self.node(idx).kind {
            NodeKind::Leaf { container } => Snapshot::Leaf(*container),
            NodeKind::Internal { split, left_wfact, left, right } => Snapshot::Internal {
                split_is_horizontal: matches!(split, Split::Horizontal),
                left_wfact_millis: (left_wfact * 1000.0).round() as i64,
                left: Box::new(self.snapshot_node(*left)),
                right: Box::new(self.snapshot_node(*right)),
            },
        }
    }
}

/// The result of [`BspTree::find_resize_fence`]: arena indices for the
/// nearest vertical-split and horizontal-split fencing ancestors.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResizeFence {
    pub horizontal: Option<usize>,
    pub vertical: Option<usize>,
}
