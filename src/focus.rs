//! Focus stack & input focus glue (§4.8).
//!
//! Implemented as an intrusive MRU list of container ids living on each
//! [`crate::output::OutputState`] (§9 design note); this module is the glue
//! on top of that list — the keyboard-focus-change choreography and the
//! "refocus newest visible" algorithm — plus the one piece of truly global
//! state: which container currently holds keyboard focus, tracked
//! independent of any single output since focus can move between outputs.

use crate::container::{Container, ContainerId};
use crate::output::OutputState;
use crate::signals::{names, SignalPayload, Signals};
use crate::tag::LayoutMode;
use crate::toplevel::Toplevel;

/// Tracks which container currently holds keyboard focus, crate-wide.
#[derive(Debug, Default)]
pub struct FocusStack {
    current: Option<ContainerId>,
}

impl FocusStack {
    #[must_use]
    pub fn new() -> Self {
        Self { current: None }
    }

    #[must_use]
    pub const fn current(&self) -> Option<ContainerId> {
        self.current
    }

    /// Reattach `container` to the front of its output's MRU focus list
    /// (§4.8: "moving focus re-attaches the container to the front of
    /// `focus_stack`"). Unmanaged surfaces are never inserted in the first
    /// place (§9), so this never needs to filter anything out.
    pub fn touch(output_state: &mut OutputState, container: ContainerId) {
        output_state.focus_stack.retain(|&c| c != container);
        output_state.focus_stack.insert(0, container);
    }

    /// Run a keyboard-focus change onto `container`'s front toplevel
    /// (§4.8): the previously-focused container (if different and still
    /// live) is marked deactivated and emits `client::unfocus`; `container`
    /// is marked activated and emits `client::focus`; if `container` is in
    /// BSP mode on `workspace`, that tree's `last_focused` is updated; and
    /// `container` is moved to the front of the focus stack.
    pub fn focus_container(
        &mut self,
        output_state: &mut OutputState,
        container: &Container,
        signals: &mut Signals,
    ) {
        if let Some(previous_id) = self.current {
            if previous_id != container.id() {
                if let Some(previous) = output_state.find_container(previous_id) {
                    if let Some(top) = previous.front_toplevel() {
                        top.with_provider(|p| p.set_activated(false));
                    }
                }
                signals.emit(names::CLIENT_UNFOCUS, &SignalPayload::ContainerId(previous_id));
            }
        }

        if let Some(top) = container.front_toplevel() {
            top.with_provider(|p| p.set_activated(true));
        }
        signals.emit(names::CLIENT_FOCUS, &SignalPayload::ContainerId(container.id()));

        self.current = Some(container.id());
        Self::touch(output_state, container.id());

        let workspace = container.workspace();
        let tag_info = output_state.tag_info_mut(workspace);
        if tag_info.layout_mode == LayoutMode::Bsp {
            tag_info.bsp.last_focused = Some(container.id());
        }
    }

    /// Clear keyboard focus without selecting a replacement (used when no
    /// visible container remains on an output).
    pub fn clear(&mut self, signals: &mut Signals) {
        if let Some(previous_id) = self.current.take() {
            signals.emit(names::CLIENT_UNFOCUS, &SignalPayload::ContainerId(previous_id));
        }
    }

    /// `focus_newest_focus_visible_toplevel(o)` (§4.2, §4.8): walk
    /// `o.state.focus_stack`, focus the front toplevel of the first
    /// visible container found, and return it. Clears keyboard/pointer
    /// focus (by contract, only the keyboard half — pointer focus is an
    /// out-of-scope collaborator concern) if none qualify.
    pub fn focus_newest_visible(
        &mut self,
        output_state: &mut OutputState,
        signals: &mut Signals,
    ) -> Option<Toplevel> {
        let candidate = output_state
            .focus_stack
            .iter()
            .copied()
            .find(|&id| output_state.find_container(id).is_some_and(|c| output_state.is_visible(c)));

        match candidate.and_then(|id| output_state.find_container(id).cloned()) {
            Some(container) => {
                let front = container.front_toplevel();
                self.focus_container(output_state, &container, signals);
                front
            }
            None => {
                self.clear(signals);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::test_support::{FakeSceneNode, FakeSurfaceProvider};
    use crate::container::{Border, Container, ContainerState};
    use crate::output::{OutputId, OutputState};
    use crate::toplevel::{SurfaceKind, Toplevel};

    fn container_with_toplevel(output: OutputId, workspace: usize) -> Container {
        let c = Container::new(
            output,
            workspace,
            Box::new(FakeSceneNode::default()),
            Border::new(1, loomwm_config::Rgba::new(0.0, 0.0, 0.0, 1.0)),
        );
        let t = Toplevel::new(c.id(), SurfaceKind::XdgShell, Box::new(FakeSurfaceProvider::default()));
        c.insert_toplevel(t);
        c
    }

    #[test]
    fn focus_container_emits_unfocus_then_focus() {
        let mut signals = Signals::new();
        let mut output_state = OutputState::new();
        let output = OutputId::unique();

        let a = container_with_toplevel(output, 1);
        let b = container_with_toplevel(output, 1);
        output_state.containers.push(a.clone());
        output_state.containers.push(b.clone());

        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let log1 = log.clone();
        signals.subscribe(names::CLIENT_FOCUS, move |_| log1.borrow_mut().push("focus"));
        let log2 = log.clone();
        signals.subscribe(names::CLIENT_UNFOCUS, move |_| log2.borrow_mut().push("unfocus"));

        let mut stack = FocusStack::new();
        stack.focus_container(&mut output_state, &a, &mut signals);
        stack.focus_container(&mut output_state, &b, &mut signals);

        assert_eq!(*log.borrow(), vec!["focus", "unfocus", "focus"]);
        assert_eq!(stack.current(), Some(b.id()));
    }

    #[test]
    fn touch_moves_container_to_front() {
        let mut output_state = OutputState::new();
        let output = OutputId::unique();
        let a = container_with_toplevel(output, 1);
        let b = container_with_toplevel(output, 1);
        output_state.focus_stack = vec![a.id(), b.id()];
        FocusStack::touch(&mut output_state, b.id());
        assert_eq!(output_state.focus_stack, vec![b.id(), a.id()]);
    }

    #[test]
    fn focus_newest_visible_skips_minimized() {
        let mut signals = Signals::new();
        let mut output_state = OutputState::new();
        let output = OutputId::unique();

        let a = container_with_toplevel(output, 1);
        a.insert_state(ContainerState::MINIMIZED);
        let b = container_with_toplevel(output, 1);
        output_state.containers.push(a.clone());
        output_state.containers.push(b.clone());
        output_state.focus_stack = vec![a.id(), b.id()];

        let mut stack = FocusStack::new();
        let focused = stack.focus_newest_visible(&mut output_state, &mut signals);
        assert_eq!(focused, b.front_toplevel());
        assert_eq!(stack.current(), Some(b.id()));
    }

    #[test]
    fn focus_newest_visible_clears_when_nothing_qualifies() {
        let mut signals = Signals::new();
        let mut output_state = OutputState::new();
        let mut stack = FocusStack::new();
        let focused = stack.focus_newest_visible(&mut output_state, &mut signals);
        assert!(focused.is_none());
        assert!(stack.current().is_none());
    }
}
