//! The interactive pointer state machine (§4.6): move, resize, edge
//! snapping and the tiled-swap drop behaviors.
//!
//! Grounded on the teacher's `resize_tile_grab.rs` / `swap_tile_grab.rs`
//! pattern of a small per-grab struct holding the original geometry plus
//! whatever the grab needs to undo itself, driven by per-motion-event
//! callbacks and one `ungrab` that restores invariants; adapted here to a
//! plain state enum (no `PointerGrab` trait to implement — the wire-level
//! grab machinery is a `collab`-gated concern) with one method per
//! transition named after its §4.6 heading.

use crate::bsp::{BspTree, Position};
use crate::container::{Container, ContainerId, ContainerState};
use crate::geometry::{Edges, Point, Rect, RectExt};
use crate::master::LayoutStrategy;
use crate::output::OutputState;
use crate::tag::{LayoutMode, TagInfo};

/// Which interactive mode currently owns the pointer (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Move,
    Resize,
    MoveBsp,
    ResizeBsp,
    MoveMaster,
    ResizeMaster,
}

#[derive(Debug, Clone, Copy)]
struct FenceGrab {
    fence: usize,
    wfact_0: f64,
    /// `fence.height` for the vertical fence (moved by `dy`), `fence.width`
    /// for the horizontal fence (moved by `dx`) — §4.6's `ResizeBSP` math.
    extent: i32,
}

#[derive(Debug, Clone, Copy)]
enum Grab {
    Normal,
    Move {
        container: ContainerId,
        grab_offset: Point,
    },
    Resize {
        container: ContainerId,
        edges: Edges,
        grab_float: Rect,
    },
    MoveBsp {
        container: ContainerId,
        origin_workspace: usize,
    },
    ResizeBsp {
        container: ContainerId,
        grab_cursor: Point,
        horizontal: Option<FenceGrab>,
        vertical: Option<FenceGrab>,
    },
    MoveMaster {
        container: ContainerId,
    },
    ResizeMaster {
        container: ContainerId,
        grab_cursor: Point,
        mwfact_0: f64,
    },
}

impl Grab {
    const fn mode(&self) -> Mode {
        match self {
            Self::Normal => Mode::Normal,
            Self::Move { .. } => Mode::Move,
            Self::Resize { .. } => Mode::Resize,
            Self::MoveBsp { .. } => Mode::MoveBsp,
            Self::ResizeBsp { .. } => Mode::ResizeBsp,
            Self::MoveMaster { .. } => Mode::MoveMaster,
            Self::ResizeMaster { .. } => Mode::ResizeMaster,
        }
    }

    const fn container(&self) -> Option<ContainerId> {
        match self {
            Self::Normal => None,
            Self::Move { container, .. }
            | Self::Resize { container, .. }
            | Self::MoveBsp { container, .. }
            | Self::ResizeBsp { container, .. }
            | Self::MoveMaster { container, .. }
            | Self::ResizeMaster { container, .. } => Some(*container),
        }
    }
}

/// The default 80/20 edge-zone used to pick resize edges when the caller
/// doesn't supply an explicit set (§4.6 `start_interactive_resize`).
#[must_use]
pub fn default_resize_edges(rect: Rect, cursor: Point) -> Edges {
    let w = rect.w().max(1) as f64;
    let h = rect.h().max(1) as f64;
    let rel_x = (cursor.x - rect.x()) as f64 / w;
    let rel_y = (cursor.y - rect.y()) as f64 / h;

    let mut edges = Edges::empty();
    if rel_x <= 0.2 {
        edges |= Edges::LEFT;
    } else if rel_x >= 0.8 {
        edges |= Edges::RIGHT;
    }
    if rel_y <= 0.2 {
        edges |= Edges::TOP;
    } else if rel_y >= 0.8 {
        edges |= Edges::BOTTOM;
    }

    if edges.is_empty() {
        // Cursor is in the inner 60% band on both axes: fall back to
        // whichever edge it is proportionally closest to.
        let dist_x = (rel_x - 0.5).abs();
        let dist_y = (rel_y - 0.5).abs();
        if dist_x >= dist_y {
            edges |= if rel_x < 0.5 { Edges::LEFT } else { Edges::RIGHT };
        } else {
            edges |= if rel_y < 0.5 { Edges::TOP } else { Edges::BOTTOM };
        }
    }
    edges
}

/// Which edges of `usable` the cursor is within `threshold` pixels of
/// (§4.6 per-frame `Move` update / S3).
#[must_use]
fn snap_edges(usable: Rect, cursor: Point, threshold: i32) -> Edges {
    let mut edges = Edges::empty();
    if cursor.x <= usable.x() + threshold {
        edges |= Edges::LEFT;
    }
    if cursor.x >= usable.x() + usable.w() - threshold {
        edges |= Edges::RIGHT;
    }
    if cursor.y <= usable.y() + threshold {
        edges |= Edges::TOP;
    }
    if cursor.y >= usable.y() + usable.h() - threshold {
        edges |= Edges::BOTTOM;
    }
    edges
}

/// The half/quarter-screen region implied by a set of snap edges, or
/// `None` if no edge applies (§4.6: "half the usable area per-edge,
/// corner combinations allowed").
#[must_use]
fn snap_region(usable: Rect, edges: Edges) -> Option<Rect> {
    if edges.is_empty() {
        return None;
    }
    let half_w = usable.w() / 2;
    let half_h = usable.h() / 2;
    let horizontal = edges.intersects(Edges::LEFT | Edges::RIGHT);
    let vertical = edges.intersects(Edges::TOP | Edges::BOTTOM);

    let (mut x, mut y, mut w, mut h) = (usable.x(), usable.y(), usable.w(), usable.h());
    if horizontal {
        w = half_w;
        if edges.contains(Edges::RIGHT) {
            x = usable.x() + half_w;
        }
    }
    if vertical {
        h = half_h;
        if edges.contains(Edges::BOTTOM) {
            y = usable.y() + half_h;
        }
    }
    Some(Rect::new(x, y, w.max(1), h.max(1)))
}

/// Context the caller supplies each motion update; bundles the bits of
/// output/config state the math in §4.6 depends on without requiring
/// `PointerState` to own an output registry itself.
#[derive(Debug, Clone, Copy)]
pub struct MotionContext {
    pub usable_area: Rect,
    pub cursor_edge_threshold: i32,
    /// The output's refresh rate in Hz, if known; falls back to 120 Hz
    /// per §4.6/§9 "Pointer throttling".
    pub refresh_hz: Option<u32>,
}

fn refresh_period_ms(refresh_hz: Option<u32>) -> u64 {
    let hz = refresh_hz.filter(|&hz| hz > 0).unwrap_or(120);
    (1000 / u64::from(hz)).max(1)
}

/// The outcome of ending whichever interactive mode was active, for the
/// caller to finish applying (re-inserting into BSP, swapping containers,
/// committing a latched resize box — operations that need the output's
/// container list, which this state machine intentionally does not own).
#[derive(Debug, Clone, Copy)]
pub enum StopOutcome {
    /// Nothing was in progress.
    WasNormal,
    /// A floating move ended; apply this box if `Some` (the snap target),
    /// otherwise the container is already at its final position.
    Move { container: ContainerId, snap_to: Option<Rect> },
    /// A floating resize ended; apply this box if a throttle latch was
    /// still pending.
    Resize { container: ContainerId, pending: Option<Rect> },
    /// A BSP move ended: re-insert `container` at the position implied by
    /// dropping it under whatever leaf is at the current cursor, or back
    /// into its own workspace if nothing is under the cursor.
    MoveBsp { container: ContainerId, origin_workspace: usize },
    /// A master/stack move ended: find the tiled container at the cursor
    /// (if any, and not the grabbed one) and swap front toplevels with it.
    MoveMaster { container: ContainerId },
    ResizeBsp,
    ResizeMaster,
}

/// Drives one interactive grab at a time (§4.6). Only one grab is ever
/// active; the `Grab` enum is the single source of truth for `Mode`.
#[derive(Debug)]
pub struct PointerState {
    grab: Grab,
    cursor: Point,
    snap_overlay: Option<Rect>,
    /// The last computed-but-not-yet-committed floating resize box, while
    /// the refresh-period throttle in [`PointerState::update_resize`] is
    /// holding a commit back.
    pending_resize: Option<Rect>,
    last_commit_ms: u64,
}

impl PointerState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            grab: Grab::Normal,
            cursor: Point::default(),
            snap_overlay: None,
            pending_resize: None,
            last_commit_ms: 0,
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.grab.mode()
    }

    #[must_use]
    pub const fn cursor(&self) -> Point {
        self.cursor
    }

    #[must_use]
    pub const fn snap_overlay(&self) -> Option<Rect> {
        self.snap_overlay
    }

    fn snap_center(container: &Container, cursor: Point) {
        let geo = container.geometry();
        container.set_box_gap(
            Rect::new(cursor.x - geo.w() / 2, cursor.y - geo.h() / 2, geo.w(), geo.h()),
            0,
        );
    }

    /// `start_interactive_move` (§4.6). `tag_info` is the workspace's
    /// `TagInfo` so a BSP-mode container can be unlinked from its tree.
    pub fn start_interactive_move(&mut self, container: &Container, cursor: Point, tag_info: &mut TagInfo) {
        self.cursor = cursor;
        if container.is_floating() {
            let geo = container.geometry();
            let grab_offset = Point::new(cursor.x - geo.x(), cursor.y - geo.y());
            self.grab = Grab::Move { container: container.id(), grab_offset };
        } else if tag_info.layout_mode == LayoutMode::Bsp {
            tag_info.bsp.root.remove(container.id());
            container.set_bsp_linked(false);
            self.grab = Grab::MoveBsp { container: container.id(), origin_workspace: container.workspace() };
            Self::snap_center(container, cursor);
        } else {
            self.grab = Grab::MoveMaster { container: container.id() };
            Self::snap_center(container, cursor);
        }
        container.insert_state(ContainerState::MOVING);
    }

    /// `start_interactive_resize` (§4.6). `edges` defaults to the 80/20
    /// zone around `cursor` when `None`.
    pub fn start_interactive_resize(
        &mut self,
        container: &Container,
        cursor: Point,
        edges: Option<Edges>,
        tag_info: &mut TagInfo,
    ) {
        self.cursor = cursor;
        let rect = container.geometry();
        let edges = edges.unwrap_or_else(|| default_resize_edges(rect, cursor));

        if container.is_floating() {
            self.grab = Grab::Resize { container: container.id(), edges, grab_float: rect };
        } else if tag_info.layout_mode == LayoutMode::Bsp {
            let fence = tag_info.bsp.root.find_resize_fence(container.id(), edges);
            let horizontal = fence.horizontal.map(|idx| FenceGrab {
                fence: idx,
                wfact_0: tag_info.bsp.root.fence_left_wfact(idx),
                extent: tag_info.bsp.root.fence_rect(idx).w(),
            });
            let vertical = fence.vertical.map(|idx| FenceGrab {
                fence: idx,
                wfact_0: tag_info.bsp.root.fence_left_wfact(idx),
                extent: tag_info.bsp.root.fence_rect(idx).h(),
            });
            self.grab = Grab::ResizeBsp { container: container.id(), grab_cursor: cursor, horizontal, vertical };
        } else {
            self.grab = Grab::ResizeMaster {
                container: container.id(),
                grab_cursor: cursor,
                mwfact_0: tag_info.master_state.mwfact(),
            };
        }
        container.insert_state(ContainerState::RESIZING);
    }

    /// Per-frame motion update while in `Move`/`MoveBsp`/`MoveMaster`
    /// (§4.6). `ctx` is only consulted for `Move` (edge-snap overlay).
    pub fn update_move(&mut self, container: &Container, cursor: Point, ctx: MotionContext) {
        self.cursor = cursor;
        match self.grab {
            Grab::Move { grab_offset, .. } => {
                let geo = container.geometry();
                container.set_box_gap(
                    Rect::new(cursor.x - grab_offset.x, cursor.y - grab_offset.y, geo.w(), geo.h()),
                    0,
                );
                let edges = snap_edges(ctx.usable_area, cursor, ctx.cursor_edge_threshold);
                self.snap_overlay = snap_region(ctx.usable_area, edges);
            }
            Grab::MoveBsp { .. } | Grab::MoveMaster { .. } => {
                Self::snap_center(container, cursor);
            }
            _ => {
                crate::error::report_precondition_violation("update_move called outside a move grab");
            }
        }
    }

    /// Per-frame motion update while in `Resize`/`ResizeBsp`/`ResizeMaster`
    /// (§4.6). Floating-box resize commits are throttled to at most once
    /// per `ctx.refresh_hz` period (§9 "Pointer throttling"); BSP fence and
    /// master `mwfact` updates are plain float writes picked up by the next
    /// transaction drain, so they apply every call. `now_ms` is the
    /// caller's monotonic clock.
    pub fn update_resize(
        &mut self,
        container: &Container,
        cursor: Point,
        now_ms: u64,
        ctx: MotionContext,
        tag_info: Option<&mut TagInfo>,
        strategy: Option<(&dyn LayoutStrategy, i32)>,
    ) -> Option<Rect> {
        self.cursor = cursor;
        let due = now_ms.saturating_sub(self.last_commit_ms) >= refresh_period_ms(ctx.refresh_hz);

        match self.grab {
            Grab::Resize { edges, grab_float, .. } => {
                let candidate = resize_floating_box(grab_float, edges, cursor);
                if due {
                    container.set_box_gap(candidate, 0);
                    self.last_commit_ms = now_ms;
                    self.pending_resize = None;
                    None
                } else {
                    self.pending_resize = Some(candidate);
                    Some(candidate)
                }
            }
            Grab::ResizeBsp { grab_cursor, horizontal, vertical, .. } => {
                let Some(tag_info) = tag_info else {
                    crate::error::report_precondition_violation("update_resize: ResizeBsp needs a tag_info");
                    return None;
                };
                let dx = cursor.x - grab_cursor.x;
                let dy = cursor.y - grab_cursor.y;
                if let Some(h) = horizontal {
                    let wfact = h.wfact_0 + f64::from(dx) / f64::from(h.extent.max(1));
                    tag_info.bsp.root.set_fence_left_wfact(h.fence, wfact);
                }
                if let Some(v) = vertical {
                    let wfact = v.wfact_0 + f64::from(dy) / f64::from(v.extent.max(1));
                    tag_info.bsp.root.set_fence_left_wfact(v.fence, wfact);
                }
                None
            }
            Grab::ResizeMaster { grab_cursor, mwfact_0, .. } => {
                let Some(tag_info) = tag_info else {
                    crate::error::report_precondition_violation("update_resize: ResizeMaster needs a tag_info");
                    return None;
                };
                let Some((strategy, usable_width)) = strategy else {
                    crate::error::report_precondition_violation("update_resize: ResizeMaster needs a strategy");
                    return None;
                };
                let dx = cursor.x - grab_cursor.x;
                let mwfact = strategy.resize_update(mwfact_0, dx, usable_width);
                tag_info.master_state.set_mwfact(mwfact);
                None
            }
            _ => {
                crate::error::report_precondition_violation("update_resize called outside a resize grab");
                None
            }
        }
    }

    /// `stop_interactive()` (§4.6): idempotent from `Normal`. Clears
    /// `state` back to `Normal`, the snap overlay, and the container's
    /// `Moving`/`Resizing` flags, and returns what the caller still needs
    /// to finish applying.
    pub fn stop_interactive(&mut self, container: Option<&Container>) -> StopOutcome {
        let grab = std::mem::replace(&mut self.grab, Grab::Normal);
        let snap_to = self.snap_overlay.take();
        let pending = self.pending_resize.take();

        if let (Some(container), Some(id)) = (container, grab.container()) {
            debug_assert_eq!(container.id(), id, "stop_interactive container mismatch");
            container.remove_state(ContainerState::MOVING | ContainerState::RESIZING);
        }

        match grab {
            Grab::Normal => StopOutcome::WasNormal,
            Grab::Move { container, grab_offset: _ } => StopOutcome::Move { container, snap_to },
            Grab::Resize { container, .. } => StopOutcome::Resize { container, pending },
            Grab::MoveBsp { container, origin_workspace } => StopOutcome::MoveBsp { container, origin_workspace },
            Grab::MoveMaster { container } => StopOutcome::MoveMaster { container },
            Grab::ResizeBsp { .. } => StopOutcome::ResizeBsp,
            Grab::ResizeMaster { .. } => StopOutcome::ResizeMaster,
        }
    }

    /// The position a dropped BSP container should be inserted at,
    /// relative to whatever tiled leaf sits under `cursor` in `workspace`
    /// (§4.4 `should_insert_position`, §4.6 `end MoveBSP`). Returns the
    /// target sibling and position, or `None` if nothing is under the
    /// cursor (caller should re-insert at the container's own workspace).
    #[must_use]
    pub fn bsp_drop_target(
        output_state: &OutputState,
        bsp: &BspTree,
        workspace: usize,
        ignore: ContainerId,
        cursor: Point,
    ) -> Option<(ContainerId, Position)> {
        let target = container_at_point(output_state, workspace, cursor, ignore)?;
        let rect = bsp.leaf_rect(target.id())?;
        Some((target.id(), BspTree::should_insert_position(rect, cursor)))
    }

    /// The tiled container at `cursor` in `workspace` other than `ignore`,
    /// for `end MoveMaster` to swap front toplevels with (§4.6).
    #[must_use]
    pub fn master_drop_target(
        output_state: &OutputState,
        workspace: usize,
        ignore: ContainerId,
        cursor: Point,
    ) -> Option<Container> {
        container_at_point(output_state, workspace, cursor, ignore)
    }
}

fn resize_floating_box(grab_float: Rect, edges: Edges, cursor: Point) -> Rect {
    let mut x = grab_float.x();
    let mut y = grab_float.y();
    let mut w = grab_float.w();
    let mut h = grab_float.h();

    if edges.contains(Edges::LEFT) {
        let new_x = cursor.x;
        w = (x + w - new_x).max(1);
        x = new_x.min(grab_float.x() + grab_float.w() - 1);
    }
    if edges.contains(Edges::RIGHT) {
        w = (cursor.x - x).max(1);
    }
    if edges.contains(Edges::TOP) {
        let new_y = cursor.y;
        h = (y + h - new_y).max(1);
        y = new_y.min(grab_float.y() + grab_float.h() - 1);
    }
    if edges.contains(Edges::BOTTOM) {
        h = (cursor.y - y).max(1);
    }

    Rect::new(x, y, w, h)
}

fn container_at_point(
    output_state: &OutputState,
    workspace: usize,
    point: Point,
    ignore: ContainerId,
) -> Option<Container> {
    output_state
        .containers
        .iter()
        .find(|c| {
            c.id() != ignore
                && c.workspace() == workspace
                && output_state.is_visible(c)
                && !c.is_floating()
                && c.geometry().contains(point)
        })
        .cloned()
}

impl Default for PointerState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::Position;
    use crate::collab::test_support::{FakeSceneNode, FakeSurfaceProvider};
    use crate::container::Border;
    use crate::output::OutputId;
    use crate::tag::TagInfo;
    use crate::toplevel::{SurfaceKind, Toplevel};

    fn floating_container(output: OutputId, geo: Rect) -> Container {
        let c = Container::new(
            output,
            1,
            Box::new(FakeSceneNode::default()),
            Border::new(1, loomwm_config::Rgba::new(0.0, 0.0, 0.0, 1.0)),
        );
        let t = Toplevel::new(c.id(), SurfaceKind::XdgShell, Box::new(FakeSurfaceProvider::default()));
        c.insert_toplevel(t);
        c.insert_state(ContainerState::FLOATING);
        c.set_box_gap(geo, 0);
        c
    }

    #[test]
    fn s3_edge_snap_on_drop_scenario() {
        let output = OutputId::unique();
        let w = floating_container(output, Rect::new(800, 400, 200, 150));
        let mut tag_info = TagInfo::new(1);
        let usable = Rect::new(0, 0, 1920, 1080);

        let mut pointer = PointerState::new();
        pointer.start_interactive_move(&w, Point::new(900, 475), &mut tag_info);

        let ctx = MotionContext { usable_area: usable, cursor_edge_threshold: 16, refresh_hz: None };
        pointer.update_move(&w, Point::new(1918, 500), ctx);
        assert!(pointer.snap_overlay().is_some());

        let outcome = pointer.stop_interactive(Some(&w));
        match outcome {
            StopOutcome::Move { snap_to: Some(rect), .. } => {
                w.set_box_gap(rect, 0);
            }
            other => panic!("expected a Move outcome with a snap target, got {other:?}"),
        }

        assert_eq!(w.geometry(), Rect::new(960, 0, 960, 1080));
        assert!(!w.state().contains(ContainerState::MOVING));
    }

    #[test]
    fn invariant_6_stop_interactive_is_idempotent_from_normal() {
        let mut pointer = PointerState::new();
        assert!(matches!(pointer.stop_interactive(None), StopOutcome::WasNormal));
        assert_eq!(pointer.mode(), Mode::Normal);
    }

    #[test]
    fn default_resize_edges_picks_nearest_corner() {
        let rect = Rect::new(0, 0, 100, 100);
        let edges = default_resize_edges(rect, Point::new(95, 95));
        assert!(edges.contains(Edges::RIGHT));
        assert!(edges.contains(Edges::BOTTOM));
    }

    #[test]
    fn default_resize_edges_falls_back_to_nearest_single_edge_in_dead_center() {
        let rect = Rect::new(0, 0, 200, 100);
        let edges = default_resize_edges(rect, Point::new(100, 50));
        assert_eq!(edges.bits().count_ones(), 1);
    }

    #[test]
    fn bsp_move_unlinks_container_from_tree_on_start() {
        let output = OutputId::unique();
        let a = floating_container(output, Rect::new(0, 0, 100, 100));
        a.remove_state(ContainerState::FLOATING);
        let mut tag_info = TagInfo::new(1);
        tag_info.layout_mode = LayoutMode::Bsp;
        tag_info.bsp.root.insert(a.id(), None, Position::Right);
        a.set_bsp_linked(true);
        assert!(tag_info.bsp.root.contains(a.id()));

        let mut pointer = PointerState::new();
        pointer.start_interactive_move(&a, Point::new(50, 50), &mut tag_info);

        assert!(!tag_info.bsp.root.contains(a.id()));
        assert!(!a.bsp_linked());
        assert_eq!(pointer.mode(), Mode::MoveBsp);
    }

    #[test]
    fn resize_master_delegates_to_strategy_and_clamps() {
        use crate::master::TileLayout;
        let output = OutputId::unique();
        let a = floating_container(output, Rect::new(0, 0, 500, 800));
        a.remove_state(ContainerState::FLOATING);
        let mut tag_info = TagInfo::new(1);

        let mut pointer = PointerState::new();
        pointer.start_interactive_resize(&a, Point::new(500, 400), None, &mut tag_info);
        assert_eq!(pointer.mode(), Mode::ResizeMaster);

        let ctx = MotionContext {
            usable_area: Rect::new(0, 0, 1920, 1080),
            cursor_edge_threshold: 16,
            refresh_hz: None,
        };
        pointer.update_resize(&a, Point::new(-10_000, 400), 0, ctx, Some(&mut tag_info), Some((&TileLayout, 1000)));
        assert!((0.1..=0.9).contains(&tag_info.master_state.mwfact()));
    }
}
