//! Trait contracts for the external collaborators named in §6.
//!
//! Nothing in this crate implements these traits for real: a host
//! compositor binds them to its actual Wayland surfaces, scene graph,
//! layer-shell state and input backend. Keeping them as plain traits lets
//! every algorithm in this crate be exercised with lightweight fakes, the
//! same way the teacher's `Window` fronts a concrete `ToplevelSurface`
//! behind accessor methods — here the accessor methods front a trait
//! object instead, since Smithay itself is out of scope.

use crate::geometry::{Edges, Rect};

/// Per-surface operations and the title/app-id it reports. One instance
/// backs each [`crate::toplevel::Toplevel`].
pub trait SurfaceProvider: std::fmt::Debug {
    fn title(&self) -> String;
    fn app_id(&self) -> String;
    fn geometry(&self) -> Rect;
    fn send_close(&self);
    fn kill(&self);
    fn set_activated(&self, activated: bool);
    fn set_fullscreen(&self, fullscreen: bool);
    fn set_tiled(&self, edges: Edges);
    fn set_resizing(&self, resizing: bool);
}

/// A node in the external scene graph. One instance backs each
/// [`crate::container::Container`].
pub trait SceneNode: std::fmt::Debug {
    fn set_position(&self, x: i32, y: i32);
    fn raise_to_top(&self);
    fn lower_to_bottom(&self);
    fn set_enabled(&self, enabled: bool);
}

/// Exclusive-zone reservations from layer-shell surfaces, which the core
/// subtracts from an output's `usable_area`.
pub trait LayerShellProvider: std::fmt::Debug {
    /// Exclusive insets `(top, bottom, left, right)` currently reserved on
    /// the given output.
    fn exclusive_insets(&self, output: crate::output::OutputId) -> (i32, i32, i32, i32);
}

/// The output backend: state commit/test and basic output-level events.
pub trait OutputProvider: std::fmt::Debug {
    fn commit_state(&self, output: crate::output::OutputId) -> bool;
    fn test_state(&self, output: crate::output::OutputId) -> bool;
}

/// Raw input delivery. The core only ever reads the untransformed keysym
/// and the live modifier bitmask; keymap decoding itself is out of scope.
pub trait InputProvider: std::fmt::Debug {
    fn current_modifiers(&self) -> crate::keybind::ModifierMask;
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use super::{Edges, Rect, SceneNode, SurfaceProvider};
    use std::cell::RefCell;

    #[derive(Debug, Default)]
    pub struct FakeSurfaceProvider {
        pub geometry: RefCell<Rect>,
        pub activated: RefCell<bool>,
        pub fullscreen: RefCell<bool>,
        pub tiled_edges: RefCell<Edges>,
        pub resizing: RefCell<bool>,
        pub closed: RefCell<bool>,
    }

    impl SurfaceProvider for FakeSurfaceProvider {
        fn title(&self) -> String {
            "fake".to_owned()
        }
        fn app_id(&self) -> String {
            "fake.app".to_owned()
        }
        fn geometry(&self) -> Rect {
            *self.geometry.borrow()
        }
        fn send_close(&self) {
            *self.closed.borrow_mut() = true;
        }
        fn kill(&self) {
            *self.closed.borrow_mut() = true;
        }
        fn set_activated(&self, activated: bool) {
            *self.activated.borrow_mut() = activated;
        }
        fn set_fullscreen(&self, fullscreen: bool) {
            *self.fullscreen.borrow_mut() = fullscreen;
        }
        fn set_tiled(&self, edges: Edges) {
            *self.tiled_edges.borrow_mut() = edges;
        }
        fn set_resizing(&self, resizing: bool) {
            *self.resizing.borrow_mut() = resizing;
        }
    }

    #[derive(Debug, Default)]
    pub struct FakeSceneNode {
        pub position: RefCell<(i32, i32)>,
        pub enabled: RefCell<bool>,
        pub raised: RefCell<bool>,
    }

    impl SceneNode for FakeSceneNode {
        fn set_position(&self, x: i32, y: i32) {
            *self.position.borrow_mut() = (x, y);
        }
        fn raise_to_top(&self) {
            *self.raised.borrow_mut() = true;
        }
        fn lower_to_bottom(&self) {
            *self.raised.borrow_mut() = false;
        }
        fn set_enabled(&self, enabled: bool) {
            *self.enabled.borrow_mut() = enabled;
        }
    }
}
