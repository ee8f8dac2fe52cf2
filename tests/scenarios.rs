//! End-to-end reproductions of the six literal scenarios in §8 of
//! `SPEC_FULL.md`, driven against `loomwm-core`'s public API rather than
//! each module's private internals (complementing the unit tests
//! colocated with `bsp.rs`/`master.rs`/`output.rs`/`keybind.rs`, which
//! exercise the same scenarios from inside the crate).

use loomwm_core::bsp::{BspTree, Position};
use loomwm_core::collab::test_support::{FakeSceneNode, FakeSurfaceProvider};
use loomwm_core::container::{Border, Container, ContainerState};
use loomwm_core::geometry::{Edges, Point, Rect};
use loomwm_core::keybind::{
    compose, scroll_pseudo_button, AxisOrientation, AxisSource, Binding, Dispatch, KeybindMap, ModifierMask,
    SCROLL_UP,
};
use loomwm_core::master::{LayoutStrategy, TileLayout};
use loomwm_core::output::{OutputId, OutputRegistry};
use loomwm_core::pointer::{MotionContext, PointerState, StopOutcome};
use loomwm_core::tag::{MasterState, TagInfo};
use loomwm_core::toplevel::{SurfaceKind, Toplevel};

fn container(output: OutputId, workspace: usize) -> Container {
    Container::new(
        output,
        workspace,
        Box::new(FakeSceneNode::default()),
        Border::new(1, loomwm_config::Rgba::new(0.0, 0.0, 0.0, 1.0)),
    )
}

fn container_with_toplevel(output: OutputId, workspace: usize) -> Container {
    let c = container(output, workspace);
    let t = Toplevel::new(c.id(), SurfaceKind::XdgShell, Box::new(FakeSurfaceProvider::default()));
    c.insert_toplevel(t);
    c
}

/// S1: three containers inserted into an empty BSP tree, then a resize
/// fence dragged, producing the exact leaf boxes the spec lists.
#[test]
fn s1_bsp_insert_and_resize() {
    let output = OutputId::unique();
    let a = container_with_toplevel(output, 1);
    let b = container_with_toplevel(output, 1);
    let c = container_with_toplevel(output, 1);

    let mut tree = BspTree::new();
    let usable = Rect::new(0, 0, 1000, 1000);

    tree.insert(a.id(), None, Position::Right);
    tree.update(usable, 0);
    assert_eq!(tree.leaf_rect(a.id()), Some(Rect::new(0, 0, 1000, 1000)));

    tree.insert(b.id(), Some(a.id()), Position::Right);
    tree.update(usable, 0);
    assert_eq!(tree.leaf_rect(a.id()), Some(Rect::new(0, 0, 500, 1000)));
    assert_eq!(tree.leaf_rect(b.id()), Some(Rect::new(500, 0, 500, 1000)));

    tree.insert(c.id(), Some(b.id()), Position::Right);
    tree.update(usable, 0);
    assert_eq!(tree.leaf_rect(b.id()), Some(Rect::new(500, 0, 500, 500)));
    assert_eq!(tree.leaf_rect(c.id()), Some(Rect::new(500, 500, 500, 500)));

    let fence = tree.find_resize_fence(b.id(), Edges::BOTTOM);
    let vertical = fence.vertical.expect("b has a vertical fence");
    tree.set_fence_left_wfact(vertical, 0.25);
    tree.update(usable, 0);
    assert_eq!(tree.leaf_rect(b.id()), Some(Rect::new(500, 0, 500, 250)));
    assert_eq!(tree.leaf_rect(c.id()), Some(Rect::new(500, 250, 500, 750)));
}

/// S2: one master plus a two-column stack, weighted evenly.
#[test]
fn s2_master_stack_tile() {
    let output = OutputId::unique();
    let containers = [
        container_with_toplevel(output, 1),
        container_with_toplevel(output, 1),
        container_with_toplevel(output, 1),
    ];

    let mut master_state = MasterState::new();
    master_state.master_count = 1;
    master_state.column_count = 2;
    master_state.set_mwfact(0.5);

    let usable = Rect::new(0, 0, 1000, 800);
    let rects = TileLayout.arrange(&containers, usable, 0, &master_state);

    assert_eq!(rects[0], Rect::new(0, 0, 500, 800));
    assert_eq!(rects[1], Rect::new(500, 0, 250, 800));
    assert_eq!(rects[2], Rect::new(750, 0, 250, 800));
}

/// S3: a floating container dragged to within `cursor_edge_threshold` of
/// the right edge snaps to the right half on release.
#[test]
fn s3_edge_snap_on_drop() {
    let output = OutputId::unique();
    let w = container(output, 1);
    let t = Toplevel::new(w.id(), SurfaceKind::XdgShell, Box::new(FakeSurfaceProvider::default()));
    w.insert_toplevel(t);
    w.insert_state(ContainerState::FLOATING);
    w.set_box_gap(Rect::new(800, 400, 200, 150), 0);

    let mut tag_info = TagInfo::new(1);
    let usable = Rect::new(0, 0, 1920, 1080);

    let mut pointer = PointerState::new();
    pointer.start_interactive_move(&w, Point::new(900, 475), &mut tag_info);

    let ctx = MotionContext { usable_area: usable, cursor_edge_threshold: 16, refresh_hz: None };
    pointer.update_move(&w, Point::new(1918, 500), ctx);

    let outcome = pointer.stop_interactive(Some(&w));
    match outcome {
        StopOutcome::Move { snap_to: Some(rect), .. } => w.set_box_gap(rect, 0),
        other => panic!("expected a Move outcome with a snap target, got {other:?}"),
    }

    assert_eq!(w.geometry(), Rect::new(960, 0, 960, 1080));
    assert!(!w.state().contains(ContainerState::MOVING));
}

/// S4: unplugging an output parks its containers on the fallback and
/// replugging the same name restores their tag/workspace.
#[test]
fn s4_output_unplug_replug() {
    let mut registry = OutputRegistry::new();
    let hdmi = registry.add_output("HDMI-A-1", Rect::new(0, 0, 1920, 1080));

    let a = container_with_toplevel(hdmi, 2);
    let b = container_with_toplevel(hdmi, 3);
    registry.state_mut(hdmi).unwrap().containers.push(a.clone());
    registry.state_mut(hdmi).unwrap().containers.push(b.clone());

    let fallback_id = registry.fallback().id();
    let moved = registry.remove_output(hdmi, fallback_id);
    assert_eq!(moved.len(), 2);
    assert_eq!(a.old_prop().unwrap().output_name.as_deref(), Some("HDMI-A-1"));
    assert_eq!(a.output(), fallback_id);

    let restored = registry.add_output("HDMI-A-1", Rect::new(0, 0, 1920, 1080));
    let state = registry.state(restored).unwrap();
    assert_eq!(state.containers.len(), 2);
    assert!(a.old_prop().is_none());
    assert_eq!(a.workspace(), 2);
    assert_eq!(b.workspace(), 3);
}

fn super_f() -> u64 {
    compose(ModifierMask::LOGO, 0x66)
}

/// S5: a held repeating binding fires once at the initial delay, then
/// every `2000 / repeat_rate_hz` ms, and stops dead on release.
#[test]
fn s5_keybind_repeat() {
    let mut map = KeybindMap::new();
    map.set_repeat_timing(400, 50);

    let presses = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let releases = std::rc::Rc::new(std::cell::RefCell::new(0));
    let p = presses.clone();
    let r = releases.clone();
    map.bind(
        super_f(),
        Binding {
            on_press: Some(Box::new(move || p.borrow_mut().push(()))),
            on_release: Some(Box::new(move || *r.borrow_mut() += 1)),
            repeat: true,
            ..Binding::new()
        },
    );

    assert_eq!(map.dispatch_press(super_f(), false, 0), Dispatch::Consumed);
    assert_eq!(presses.borrow().len(), 1);

    map.advance(399);
    assert_eq!(presses.borrow().len(), 1, "nothing fires before the initial delay elapses");

    map.advance(400);
    assert_eq!(presses.borrow().len(), 2);
    map.advance(440);
    assert_eq!(presses.borrow().len(), 3);
    map.advance(480);
    assert_eq!(presses.borrow().len(), 4);

    map.dispatch_release(super_f());
    assert_eq!(*releases.borrow(), 1);
    map.advance(10_000);
    assert_eq!(presses.borrow().len(), 4, "repeat stops once released");
}

/// S6: a wheel scroll maps to the `SCROLL_UP` pseudo-button and dispatches
/// through the ordinary keybind path.
#[test]
fn s6_scroll_pseudo_button() {
    let mut map = KeybindMap::new();
    let fired = std::rc::Rc::new(std::cell::RefCell::new(false));
    let f = fired.clone();
    map.bind(
        compose(ModifierMask::LOGO, SCROLL_UP),
        Binding { on_press: Some(Box::new(move || *f.borrow_mut() = true)), ..Binding::new() },
    );

    let code = scroll_pseudo_button(AxisSource::Wheel, AxisOrientation::Vertical, -1.0);
    assert_eq!(code, Some(SCROLL_UP));

    let dispatch = map.dispatch_press(compose(ModifierMask::LOGO, code.unwrap()), false, 0);
    assert_eq!(dispatch, Dispatch::Consumed);
    assert!(*fired.borrow());
}
