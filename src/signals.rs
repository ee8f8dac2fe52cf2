//! The in-process signals bus: publish/subscribe keyed by string name.
//!
//! Mirrors the teacher's approach of firing string-named signals
//! (`client::map`, `screen::focus`, ...) out to whatever registered a
//! listener, except here there is no embedded scripting runtime to dispatch
//! into: subscribers are plain Rust closures registered by the host. This
//! keeps the bus usable from tests without pulling in a callback/registry
//! system that is explicitly out of scope.

use std::collections::HashMap;

/// A disposable subscription handle. Dropping it does not unsubscribe by
/// itself (listeners are torn down explicitly via [`Signals::unsubscribe`]
/// per §9's "disposer" discipline); this type is only an opaque token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Data passed along with a signal. Kept intentionally untyped (a small
/// closed set of primitive shapes) since the core has no reason to know
/// what its collaborators want to do with a notification.
#[derive(Debug, Clone)]
pub enum SignalPayload {
    None,
    ContainerId(crate::container::ContainerId),
    ToplevelId(crate::toplevel::ToplevelId),
    OutputId(crate::output::OutputId),
    Tag(crate::tag::Tags),
    Text(String),
}

type Listener = Box<dyn FnMut(&SignalPayload)>;

/// The signals bus. One instance lives on [`crate::Core`].
pub struct Signals {
    next_id: u64,
    listeners: HashMap<&'static str, Vec<(SubscriptionId, Listener)>>,
}

impl std::fmt::Debug for Signals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signals")
            .field(
                "subscriptions",
                &self.listeners.values().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}

impl Signals {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            listeners: HashMap::new(),
        }
    }

    /// Subscribe to `name`, returning a disposer token.
    pub fn subscribe(
        &mut self,
        name: &'static str,
        listener: impl FnMut(&SignalPayload) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners
            .entry(name)
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Remove a previously registered listener. A no-op if it was already
    /// removed or never existed (`TransientIgnorable`-style tolerance).
    pub fn unsubscribe(&mut self, name: &'static str, id: SubscriptionId) {
        if let Some(list) = self.listeners.get_mut(name) {
            list.retain(|(existing, _)| *existing != id);
        }
    }

    /// Emit `name` to every current subscriber, in registration order.
    pub fn emit(&mut self, name: &'static str, payload: &SignalPayload) {
        if let Some(list) = self.listeners.get_mut(name) {
            for (_, listener) in list.iter_mut() {
                listener(payload);
            }
        }
    }
}

impl Default for Signals {
    fn default() -> Self {
        Self::new()
    }
}

// Canonical signal names from spec §6, kept as constants so call sites
// cannot typo a signal name past compile time.
pub mod names {
    pub const CLIENT_NEW: &str = "client::new";
    pub const CLIENT_MAP: &str = "client::map";
    pub const CLIENT_UNMAP: &str = "client::unmap";
    pub const CLIENT_FOCUS: &str = "client::focus";
    pub const CLIENT_UNFOCUS: &str = "client::unfocus";
    pub const CLIENT_DESTROY: &str = "client::destroy";
    pub const CLIENT_SWAP: &str = "client::swap";
    pub const CLIENT_MOUSE_ENTER: &str = "client::mouse_enter";
    pub const CLIENT_MOUSE_LEAVE: &str = "client::mouse_leave";
    pub const CLIENT_PROP_TITLE: &str = "client::prop::title";
    pub const CLIENT_PROP_APPID: &str = "client::prop::appid";
    pub const CLIENT_PROPERTY_URGENT: &str = "client::property::urgent";
    pub const CLIENT_PROPERTY_TAG: &str = "client::property::tag";
    pub const CLIENT_PROPERTY_FULLSCREEN: &str = "client::property::fullscreen";
    pub const CLIENT_PROPERTY_MAXIMIZED: &str = "client::property::maximized";
    pub const CLIENT_PROPERTY_MINIMIZED: &str = "client::property::minimized";
    pub const CLIENT_PROPERTY_FLOATING: &str = "client::property::floating";

    pub const SCREEN_NEW: &str = "screen::new";
    pub const SCREEN_FOCUS: &str = "screen::focus";
    pub const SCREEN_UNFOCUS: &str = "screen::unfocus";
    pub const SCREEN_DESTROY: &str = "screen::destroy";
    pub const SCREEN_MOUSE_ENTER: &str = "screen::mouse_enter";
    pub const SCREEN_MOUSE_LEAVE: &str = "screen::mouse_leave";
    pub const SCREEN_PROP_ACTIVE_TAG: &str = "screen::prop::active_tag";

    pub const CONTAINER_GEOMETRY: &str = "container::geometry";
    pub const CONTAINER_SWAP: &str = "container::swap";

    pub const POINTER_MOVE: &str = "pointer::move";
    pub const POINTER_BUTTON: &str = "pointer::button";
    pub const POINTER_AXIS: &str = "pointer::axis";
    pub const POINTER_SWIPE_BEGIN: &str = "pointer::swipe::begin";
    pub const POINTER_SWIPE_UPDATE: &str = "pointer::swipe::update";
    pub const POINTER_SWIPE_END: &str = "pointer::swipe::end";
    pub const POINTER_PINCH_BEGIN: &str = "pointer::pinch::begin";
    pub const POINTER_PINCH_UPDATE: &str = "pointer::pinch::update";
    pub const POINTER_PINCH_END: &str = "pointer::pinch::end";
    pub const POINTER_HOLD_BEGIN: &str = "pointer::hold::begin";
    pub const POINTER_HOLD_END: &str = "pointer::hold::end";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn emit_reaches_subscribers_in_order() {
        let mut signals = Signals::new();
        let log = Rc::new(std::cell::RefCell::new(Vec::new()));

        let log1 = log.clone();
        signals.subscribe(names::CLIENT_MAP, move |_| log1.borrow_mut().push(1));
        let log2 = log.clone();
        signals.subscribe(names::CLIENT_MAP, move |_| log2.borrow_mut().push(2));

        signals.emit(names::CLIENT_MAP, &SignalPayload::None);
        assert_eq!(*log.borrow(), vec![1, 2]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut signals = Signals::new();
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        let id = signals.subscribe(names::CLIENT_FOCUS, move |_| {
            count_clone.set(count_clone.get() + 1);
        });
        signals.emit(names::CLIENT_FOCUS, &SignalPayload::None);
        signals.unsubscribe(names::CLIENT_FOCUS, id);
        signals.emit(names::CLIENT_FOCUS, &SignalPayload::None);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn emit_on_unknown_signal_is_harmless() {
        let mut signals = Signals::new();
        signals.emit("nonexistent::signal", &SignalPayload::None);
    }
}
