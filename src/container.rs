//! The container model: the managed unit of window tiling (§3
//! "Container", §4.3 "Container & toplevel operations").
//!
//! A container outlives any single toplevel mapped into it; splitting
//! "container" from "toplevel" is the one place this crate's data model
//! diverges structurally from the teacher's `window.rs` (which conflates
//! window identity and surface identity into one `Window` type). The
//! `Rc<RefCell<_>>` handle shape, the `AtomicUsize` unique-id generator and
//! the accessor-method style are carried over unchanged.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::geometry::Rect;
use crate::output::OutputId;
use crate::tag::Tags;
use crate::toplevel::{Toplevel, ToplevelId};

static NEXT_CONTAINER_ID: AtomicUsize = AtomicUsize::new(0);

/// A unique, stable identity for a container across its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(usize);

impl ContainerId {
    #[must_use]
    pub fn unique() -> Self {
        Self(NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

bitflags::bitflags! {
    /// Container state flags (§3). Not mutually exclusive except where
    /// noted in §4.3: `Maximized`/`Fullscreen` both disable a BSP leaf
    /// without being the same state; `Moving`/`Resizing` are set only
    /// while an interactive mode owns the container.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ContainerState: u16 {
        const FLOATING   = 0b0000_0001;
        const MOVING     = 0b0000_0010;
        const RESIZING   = 0b0000_0100;
        const MAXIMIZED  = 0b0000_1000;
        const FULLSCREEN = 0b0001_0000;
        const MINIMIZED  = 0b0010_0000;
        const STICKY     = 0b0100_0000;
        const URGENT     = 0b1000_0000;
    }
}

/// Border appearance for a container (§3).
#[derive(Debug, Clone, Copy)]
pub struct Border {
    pub enabled: bool,
    pub thickness: i32,
    pub pattern: loomwm_config::Rgba,
    pub rotation_deg: u32,
}

impl Border {
    #[must_use]
    pub fn new(thickness: i32, pattern: loomwm_config::Rgba) -> Self {
        Self {
            enabled: true,
            thickness: thickness.max(0),
            pattern,
            rotation_deg: 0,
        }
    }

    /// Set the rotation, wrapping into `0..360` rather than clamping, since
    /// rotation is cyclic.
    pub fn set_rotation_deg(&mut self, deg: i64) {
        self.rotation_deg = deg.rem_euclid(360) as u32;
    }
}

/// State saved when a container leaves an output that may return (§3
/// `old_prop`, §4.2 output retire/restore).
#[derive(Debug, Clone, Default)]
pub struct OldProp {
    /// The *name* of the output the container left, not a live
    /// [`OutputId`]: an `OutputId` is minted fresh on every replug, so only
    /// the stable name can be matched against on restore.
    pub output_name: Option<String>,
    pub was_bsp_linked: bool,
    pub tag: Tags,
    pub workspace: usize,
}

struct ContainerData {
    toplevels: Vec<Toplevel>,
    tag: Tags,
    workspace: usize,
    output: OutputId,
    geometry: Rect,
    wfact: f64,
    state: ContainerState,
    bsp_linked: bool,
    border: Border,
    opacity: f64,
    old_prop: Option<OldProp>,
    floating_box: Option<Rect>,
    scene: Box<dyn crate::collab::SceneNode>,
}

/// The managed unit of window tiling: owns an ordered sequence of
/// toplevels, of which the front one receives focus and drives geometry.
///
/// Cheap to clone (an `Rc` bump). Owned by its output's state via the
/// `containers` list (§5); this handle is non-owning.
#[derive(Clone)]
pub struct Container {
    inner: Rc<RefCell<ContainerData>>,
    id: ContainerId,
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.inner.borrow();
        f.debug_struct("Container")
            .field("id", &self.id)
            .field("tag", &data.tag)
            .field("workspace", &data.workspace)
            .field("output", &data.output)
            .field("geometry", &data.geometry)
            .field("state", &data.state)
            .finish()
    }
}

impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Container {}

impl Container {
    #[must_use]
    pub fn new(
        output: OutputId,
        workspace: usize,
        scene: Box<dyn crate::collab::SceneNode>,
        border: Border,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ContainerData {
                toplevels: Vec::new(),
                tag: Tags::single(workspace),
                workspace,
                output,
                geometry: Rect::default(),
                wfact: 1.0,
                state: ContainerState::empty(),
                bsp_linked: false,
                border,
                opacity: 1.0,
                old_prop: None,
                floating_box: None,
                scene,
            })),
            id: ContainerId::unique(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> ContainerId {
        self.id
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().toplevels.is_empty()
    }

    #[must_use]
    pub fn toplevel_count(&self) -> usize {
        self.inner.borrow().toplevels.len()
    }

    /// The front toplevel: the one that receives focus and drives
    /// geometry. `None` if the container currently owns no toplevels (a
    /// transient state between creation and the first insert, or after the
    /// last one has been removed via the non-destroying variant).
    #[must_use]
    pub fn front_toplevel(&self) -> Option<Toplevel> {
        self.inner.borrow().toplevels.first().cloned()
    }

    /// Append `toplevel` to the ordered sequence and point its
    /// back-reference at this container.
    pub fn insert_toplevel(&self, toplevel: Toplevel) {
        toplevel.set_container(self.id);
        self.inner.borrow_mut().toplevels.push(toplevel);
    }

    /// Remove `toplevel` from the sequence. Returns `true` if this removed
    /// the last toplevel, which callers should treat as "destroy the
    /// container" unless they explicitly want to keep an empty shell
    /// around (§4.3: "removing the last toplevel destroys the container
    /// unless the caller uses the non-destroying variant" — this method is
    /// the non-destroying variant; destruction is the caller's decision).
    pub fn remove_toplevel(&self, toplevel: &Toplevel) -> bool {
        let mut data = self.inner.borrow_mut();
        let Some(pos) = data.toplevels.iter().position(|t| t == toplevel) else {
            crate::error::report_transient("remove_toplevel: toplevel not owned by this container");
            return data.toplevels.is_empty();
        };
        data.toplevels.remove(pos);
        data.toplevels.is_empty()
    }

    /// Rotate the sequence so `toplevel` is front; geometry/activation is
    /// re-derived from the new front toplevel by the caller.
    pub fn set_front_toplevel(&self, toplevel: &Toplevel) {
        let mut data = self.inner.borrow_mut();
        let Some(pos) = data.toplevels.iter().position(|t| t == toplevel) else {
            crate::error::report_transient("set_front_toplevel: toplevel not owned by this container");
            return;
        };
        data.toplevels.rotate_left(pos);
    }

    #[must_use]
    pub fn tag(&self) -> Tags {
        self.inner.borrow().tag
    }

    pub fn set_tag(&self, tag: Tags) {
        self.inner.borrow_mut().tag = tag;
    }

    #[must_use]
    pub fn workspace(&self) -> usize {
        self.inner.borrow().workspace
    }

    pub fn set_workspace(&self, workspace: usize) {
        self.inner.borrow_mut().workspace = workspace;
    }

    #[must_use]
    pub fn output(&self) -> OutputId {
        self.inner.borrow().output
    }

    #[must_use]
    pub fn geometry(&self) -> Rect {
        self.inner.borrow().geometry
    }

    /// Set the container's box, clamping to a minimum of `1x1` and
    /// applying `gap` as an inset on all sides (§4.3 `set_box_gap`). The
    /// caller is responsible for emitting `container::geometry` and
    /// re-positioning the scene node, which it can do with the returned
    /// final rect.
    pub fn set_box_gap(&self, rect: Rect, gap: i32) -> Rect {
        use crate::geometry::RectExt;
        let final_rect = rect.clamp_min_size().inset(gap.max(0));
        {
            let mut data = self.inner.borrow_mut();
            data.geometry = final_rect;
            data.scene.set_position(final_rect.x(), final_rect.y());
        }
        final_rect
    }

    #[must_use]
    pub fn wfact(&self) -> f64 {
        self.inner.borrow().wfact
    }

    /// Set `wfact`, clamping non-positive input to `0.01` per the open
    /// question resolution in §9.
    pub fn set_wfact(&self, wfact: f64) {
        let clamped = if wfact > 0.0 { wfact } else {
            crate::error::report_clamped("wfact <= 0");
            0.01
        };
        self.inner.borrow_mut().wfact = clamped;
    }

    #[must_use]
    pub fn state(&self) -> ContainerState {
        self.inner.borrow().state
    }

    pub fn insert_state(&self, flag: ContainerState) {
        self.inner.borrow_mut().state.insert(flag);
    }

    pub fn remove_state(&self, flag: ContainerState) {
        self.inner.borrow_mut().state.remove(flag);
    }

    #[must_use]
    pub fn is_floating(&self) -> bool {
        self.state().contains(ContainerState::FLOATING)
    }

    #[must_use]
    pub fn bsp_linked(&self) -> bool {
        self.inner.borrow().bsp_linked
    }

    pub fn set_bsp_linked(&self, linked: bool) {
        self.inner.borrow_mut().bsp_linked = linked;
    }

    #[must_use]
    pub fn border(&self) -> Border {
        self.inner.borrow().border
    }

    pub fn set_border(&self, border: Border) {
        self.inner.borrow_mut().border = border;
    }

    #[must_use]
    pub fn opacity(&self) -> f64 {
        self.inner.borrow().opacity
    }

    /// Set opacity, clamping to `[0.0, 1.0]`.
    pub fn set_opacity(&self, opacity: f64) {
        let clamped = opacity.clamp(0.0, 1.0);
        if (clamped - opacity).abs() > f64::EPSILON {
            crate::error::report_clamped("opacity out of [0.0, 1.0]");
        }
        self.inner.borrow_mut().opacity = clamped;
    }

    /// The box remembered while floating, restored when switching back
    /// from a tiled layout mode.
    #[must_use]
    pub fn floating_box(&self) -> Option<Rect> {
        self.inner.borrow().floating_box
    }

    pub fn set_floating_box(&self, rect: Rect) {
        self.inner.borrow_mut().floating_box = Some(rect);
    }

    #[must_use]
    pub fn old_prop(&self) -> Option<OldProp> {
        self.inner.borrow().old_prop.clone()
    }

    pub fn set_old_prop(&self, old_prop: Option<OldProp>) {
        self.inner.borrow_mut().old_prop = old_prop;
    }

    /// Move this container to `output`, clipping any BSP link (the caller
    /// must have already called `BspTree::remove` on the source workspace
    /// if `bsp_linked()` was true) and re-parenting the scene node. The
    /// caller is responsible for moving this container between the two
    /// outputs' `containers` lists and re-evaluating visibility on both.
    pub fn move_to_output(&self, output: OutputId, workspace: usize) {
        let mut data = self.inner.borrow_mut();
        data.output = output;
        data.workspace = workspace;
        data.tag = Tags::single(workspace);
        data.bsp_linked = false;
    }

    pub fn raise(&self) {
        self.inner.borrow().scene.raise_to_top();
    }

    pub fn lower(&self) {
        self.inner.borrow().scene.lower_to_bottom();
    }

    pub fn set_scene_enabled(&self, enabled: bool) {
        self.inner.borrow().scene.set_enabled(enabled);
    }
}

/// Exchange the containers holding `t1` and `t2`: `t1` is placed into
/// `t2`'s container slot and vice versa, preserving each container's
/// tiling state, tag and geometry (§4.3 `swap`, and the open-question
/// resolution in §9: tag/workspace of each *container* is left untouched,
/// only the toplevel occupying the slot changes).
pub fn swap_toplevels(c1: &Container, t1: &Toplevel, c2: &Container, t2: &Toplevel) {
    if c1 == c2 {
        // Swapping within the same container is just a front-toplevel
        // rotation; nothing to exchange across containers.
        return;
    }

    let pos1 = {
        let data = c1.inner.borrow();
        data.toplevels.iter().position(|t| t == t1)
    };
    let pos2 = {
        let data = c2.inner.borrow();
        data.toplevels.iter().position(|t| t == t2)
    };

    let (Some(pos1), Some(pos2)) = (pos1, pos2) else {
        crate::error::report_transient("swap_toplevels: toplevel not owned by its expected container");
        return;
    };

    {
        let mut data1 = c1.inner.borrow_mut();
        let mut data2 = c2.inner.borrow_mut();
        data1.toplevels[pos1] = t2.clone();
        data2.toplevels[pos2] = t1.clone();
    }
    t2.set_container(c1.id);
    t1.set_container(c2.id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::test_support::{FakeSceneNode, FakeSurfaceProvider};
    use crate::toplevel::SurfaceKind;

    fn container(output: OutputId, workspace: usize) -> Container {
        Container::new(
            output,
            workspace,
            Box::new(FakeSceneNode::default()),
            Border::new(1, loomwm_config::Rgba::new(0.0, 0.0, 0.0, 1.0)),
        )
    }

    #[test]
    fn inserting_last_toplevel_then_removing_reports_empty() {
        let output = OutputId::unique();
        let c = container(output, 1);
        let t = Toplevel::new(c.id(), SurfaceKind::XdgShell, Box::new(FakeSurfaceProvider::default()));
        c.insert_toplevel(t.clone());
        assert_eq!(c.toplevel_count(), 1);
        assert!(c.remove_toplevel(&t));
        assert!(c.is_empty());
    }

    #[test]
    fn set_front_toplevel_rotates_sequence() {
        let output = OutputId::unique();
        let c = container(output, 1);
        let t1 = Toplevel::new(c.id(), SurfaceKind::XdgShell, Box::new(FakeSurfaceProvider::default()));
        let t2 = Toplevel::new(c.id(), SurfaceKind::XdgShell, Box::new(FakeSurfaceProvider::default()));
        c.insert_toplevel(t1.clone());
        c.insert_toplevel(t2.clone());
        assert_eq!(c.front_toplevel(), Some(t1));
        c.set_front_toplevel(&t2);
        assert_eq!(c.front_toplevel(), Some(t2));
    }

    #[test]
    fn wfact_clamps_non_positive_to_minimum() {
        let output = OutputId::unique();
        let c = container(output, 1);
        c.set_wfact(-3.0);
        assert!((c.wfact() - 0.01).abs() < f64::EPSILON);
    }

    #[test]
    fn set_box_gap_never_collapses_below_one_pixel() {
        let output = OutputId::unique();
        let c = container(output, 1);
        let result = c.set_box_gap(Rect::new(0, 0, 2, 2), 10);
        assert!(result.w() >= 1);
        assert!(result.h() >= 1);
    }

    #[test]
    fn swap_exchanges_toplevels_across_containers() {
        let output = OutputId::unique();
        let c1 = container(output, 1);
        let c2 = container(output, 1);
        let t1 = Toplevel::new(c1.id(), SurfaceKind::XdgShell, Box::new(FakeSurfaceProvider::default()));
        let t2 = Toplevel::new(c2.id(), SurfaceKind::XdgShell, Box::new(FakeSurfaceProvider::default()));
        c1.insert_toplevel(t1.clone());
        c2.insert_toplevel(t2.clone());

        swap_toplevels(&c1, &t1, &c2, &t2);

        assert_eq!(c1.front_toplevel(), Some(t2.clone()));
        assert_eq!(c2.front_toplevel(), Some(t1.clone()));
        assert_eq!(t1.container(), c2.id());
        assert_eq!(t2.container(), c1.id());
    }
}
