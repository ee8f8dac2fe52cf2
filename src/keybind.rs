//! Keybinding map for keyboard and pointer buttons (§4.7).
//!
//! Grounded on the teacher's `KeyPattern(ModifiersState, Keysym)` ->
//! `KeyAction` lookup in `input/mod.rs` (`CONFIG.keybinds.get(&key_pattern)`
//! inside the keyboard filter closure): a flat map keyed by a composed
//! pattern, looked up once per press. This crate composes the pattern into
//! a single `u64` instead of a tuple key (§3 "Key composition") so the same
//! map serves keyboard keysyms, pointer buttons and the four scroll
//! pseudo-buttons uniformly.

use std::collections::HashMap;

bitflags::bitflags! {
    /// The modifier bitfield packed into the high 32 bits of a composed
    /// key (§3). Mirrors `loomwm_config::Modifiers` one-to-one; kept
    /// distinct because this is the wire-level bitmask the core composes
    /// keys with, while `Modifiers` is the user-facing config shape.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModifierMask: u32 {
        const ALT   = 0b0001;
        const CTRL  = 0b0010;
        const LOGO  = 0b0100;
        const SHIFT = 0b1000;
    }
}

impl From<loomwm_config::Modifiers> for ModifierMask {
    fn from(m: loomwm_config::Modifiers) -> Self {
        let mut mask = Self::empty();
        mask.set(Self::ALT, m.alt);
        mask.set(Self::CTRL, m.ctrl);
        mask.set(Self::LOGO, m.logo);
        mask.set(Self::SHIFT, m.shift);
        mask
    }
}

/// Four codes outside any real XKB keysym / linux input-event-code range,
/// standing in for the scroll directions as pseudo-buttons (§3, §4.7).
pub const SCROLL_LEFT: u32 = 0xffff_fff0;
pub const SCROLL_UP: u32 = 0xffff_fff1;
pub const SCROLL_RIGHT: u32 = 0xffff_fff2;
pub const SCROLL_DOWN: u32 = 0xffff_fff3;

/// Compose a modifier set and a keysym/button/pseudo-button code into the
/// 64-bit key `(modifiers << 32) | code` (§3).
#[must_use]
pub const fn compose(modifiers: ModifierMask, code: u32) -> u64 {
    ((modifiers.bits() as u64) << 32) | code as u64
}

/// The input-device axis source an axis event arrived on. Only `Wheel`
/// ever produces a scroll pseudo-button (§9: "only the Wheel axis source
/// produces pseudo-buttons, not continuous touchpad scroll, to avoid
/// unintended repeats").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSource {
    Wheel,
    Finger,
    Continuous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrientation {
    Horizontal,
    Vertical,
}

/// Map a raw axis event to one of the four scroll pseudo-button codes, or
/// `None` if it shouldn't produce one (§4.7 S6, §9 axis-to-button mapping).
#[must_use]
pub fn scroll_pseudo_button(source: AxisSource, orientation: AxisOrientation, delta: f64) -> Option<u32> {
    if source != AxisSource::Wheel || delta == 0.0 {
        return None;
    }
    Some(match (orientation, delta.is_sign_negative()) {
        (AxisOrientation::Vertical, true) => SCROLL_UP,
        (AxisOrientation::Vertical, false) => SCROLL_DOWN,
        (AxisOrientation::Horizontal, true) => SCROLL_LEFT,
        (AxisOrientation::Horizontal, false) => SCROLL_RIGHT,
    })
}

/// One registered binding (§3 "Binding record").
pub struct Binding {
    pub on_press: Option<Box<dyn FnMut()>>,
    pub on_release: Option<Box<dyn FnMut()>>,
    pub description: String,
    pub group: String,
    /// If `false`, the binding does not fire while the session is locked
    /// or a shortcut inhibitor is active.
    pub exclusive: bool,
    /// While held, re-invoke `on_press` at the map's configured repeat
    /// rate after the initial delay.
    pub repeat: bool,
    /// If `true`, the event is also delivered to the focused client.
    pub pass: bool,
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("description", &self.description)
            .field("group", &self.group)
            .field("exclusive", &self.exclusive)
            .field("repeat", &self.repeat)
            .field("pass", &self.pass)
            .finish_non_exhaustive()
    }
}

impl Binding {
    #[must_use]
    pub fn new() -> Self {
        Self {
            on_press: None,
            on_release: None,
            description: String::new(),
            group: String::new(),
            exclusive: true,
            repeat: false,
            pass: false,
        }
    }
}

impl Default for Binding {
    fn default() -> Self {
        Self::new()
    }
}

/// What a dispatch call did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// No binding matched, or the map/binding declined to handle it.
    NotHandled,
    /// A binding ran and the event should not reach the client.
    Consumed,
    /// A binding ran and the event should *also* reach the client
    /// (`pass = true`).
    PassThrough,
}

impl Dispatch {
    #[must_use]
    pub const fn is_handled(self) -> bool {
        !matches!(self, Self::NotHandled)
    }
}

/// The single in-progress key-repeat timer for one [`KeybindMap`] (§3: "at
/// most one binding repeats at a time per map").
#[derive(Debug, Clone, Copy)]
struct RepeatTimer {
    key: u64,
    next_fire_ms: u64,
    /// Milliseconds between repeats after the first, per §4.7's scenario
    /// S5: `2000 / repeat_rate`, not the more obvious `1000 / repeat_rate`
    /// — carried over from the source's own repeat-timer arithmetic.
    interval_ms: u64,
}

/// A hash map of composed key -> binding, with repeat-timer state and a
/// global enable flag (§4.7 "Map container").
pub struct KeybindMap {
    bindings: HashMap<u64, Binding>,
    active: bool,
    repeat_delay_ms: u32,
    repeat_rate_hz: u32,
    repeat: Option<RepeatTimer>,
}

impl std::fmt::Debug for KeybindMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeybindMap")
            .field("bindings", &self.bindings.len())
            .field("active", &self.active)
            .field("repeating", &self.repeat.is_some())
            .finish()
    }
}

impl KeybindMap {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
            active: true,
            repeat_delay_ms: 400,
            repeat_rate_hz: 30,
            repeat: None,
        }
    }

    pub fn set_repeat_timing(&mut self, delay_ms: u32, rate_hz: u32) {
        self.repeat_delay_ms = delay_ms;
        self.repeat_rate_hz = rate_hz.max(1);
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        if !active {
            self.repeat = None;
        }
    }

    /// Register `binding` under `key`, silently replacing whatever was
    /// there (§9: "the most recently registered binding wins").
    pub fn bind(&mut self, key: u64, binding: Binding) {
        self.bindings.insert(key, binding);
    }

    pub fn unbind(&mut self, key: u64) {
        self.bindings.remove(&key);
        if self.repeat.is_some_and(|r| r.key == key) {
            self.repeat = None;
        }
    }

    #[must_use]
    pub fn contains(&self, key: u64) -> bool {
        self.bindings.contains_key(&key)
    }

    /// Dispatch a key press (§4.7 "Dispatch on press").
    pub fn dispatch_press(&mut self, key: u64, input_inhibited: bool, now_ms: u64) -> Dispatch {
        if !self.active {
            return Dispatch::NotHandled;
        }
        let Some(binding) = self.bindings.get_mut(&key) else {
            return Dispatch::NotHandled;
        };
        if !binding.exclusive && input_inhibited {
            return Dispatch::NotHandled;
        }

        if let Some(cb) = binding.on_press.as_mut() {
            cb();
        }
        let (repeat, pass) = (binding.repeat, binding.pass);

        if repeat && self.repeat.is_none() {
            self.repeat = Some(RepeatTimer {
                key,
                next_fire_ms: now_ms + u64::from(self.repeat_delay_ms),
                interval_ms: (2000 / u64::from(self.repeat_rate_hz)).max(1),
            });
        }

        if pass {
            Dispatch::PassThrough
        } else {
            Dispatch::Consumed
        }
    }

    /// Dispatch a key release. Always attempted regardless of `active` or
    /// exclusivity, "to avoid client key-stuck state" (§4.7).
    pub fn dispatch_release(&mut self, key: u64) -> Dispatch {
        if self.repeat.is_some_and(|r| r.key == key) {
            self.repeat = None;
        }
        let Some(binding) = self.bindings.get_mut(&key) else {
            return Dispatch::NotHandled;
        };
        if let Some(cb) = binding.on_release.as_mut() {
            cb();
        }
        if binding.pass {
            Dispatch::PassThrough
        } else {
            Dispatch::Consumed
        }
    }

    /// Fire every repeat tick that has come due by `now_ms`. The caller is
    /// expected to call this from its own idle/timer loop; there is no
    /// internal clock (§5: this crate is driven by the reactor, it doesn't
    /// own one).
    pub fn advance(&mut self, now_ms: u64) {
        while let Some(timer) = self.repeat {
            if now_ms < timer.next_fire_ms {
                break;
            }
            if let Some(binding) = self.bindings.get_mut(&timer.key) {
                if let Some(cb) = binding.on_press.as_mut() {
                    cb();
                }
            }
            self.repeat = self.repeat.map(|mut t| {
                t.next_fire_ms += t.interval_ms;
                t
            });
        }
    }

    #[must_use]
    pub fn is_repeating(&self, key: u64) -> bool {
        self.repeat.is_some_and(|r| r.key == key)
    }
}

impl Default for KeybindMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn super_f() -> u64 {
        compose(ModifierMask::LOGO, 0x66 /* keysym-ish stand-in for F */)
    }

    #[test]
    fn s5_keybind_repeat_scenario() {
        let mut map = KeybindMap::new();
        map.set_repeat_timing(400, 50);

        let presses = Rc::new(RefCell::new(Vec::new()));
        let releases = Rc::new(RefCell::new(0));
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

        // Nothing fires before the initial delay elapses.
        map.advance(399);
        assert_eq!(presses.borrow().len(), 1);

        // First repeat at t=400ms, then every 2000/50 = 40ms while held.
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

    #[test]
    fn s6_scroll_pseudo_button_scenario() {
        let mut map = KeybindMap::new();
        let fired = Rc::new(RefCell::new(false));
        let f = fired.clone();
        map.bind(
            compose(ModifierMask::LOGO, SCROLL_UP),
            Binding {
                on_press: Some(Box::new(move || *f.borrow_mut() = true)),
                ..Binding::new()
            },
        );

        let code = scroll_pseudo_button(AxisSource::Wheel, AxisOrientation::Vertical, -1.0);
        assert_eq!(code, Some(SCROLL_UP));

        let dispatch = map.dispatch_press(compose(ModifierMask::LOGO, code.unwrap()), false, 0);
        assert_eq!(dispatch, Dispatch::Consumed);
        assert!(*fired.borrow());
    }

    #[test]
    fn continuous_touchpad_scroll_never_produces_a_pseudo_button() {
        assert_eq!(
            scroll_pseudo_button(AxisSource::Finger, AxisOrientation::Vertical, -1.0),
            None
        );
        assert_eq!(
            scroll_pseudo_button(AxisSource::Continuous, AxisOrientation::Horizontal, 1.0),
            None
        );
    }

    #[test]
    fn rebinding_the_same_key_replaces_silently() {
        let mut map = KeybindMap::new();
        let first = Rc::new(RefCell::new(false));
        let second = Rc::new(RefCell::new(false));
        let f1 = first.clone();
        map.bind(super_f(), Binding { on_press: Some(Box::new(move || *f1.borrow_mut() = true)), ..Binding::new() });
        let f2 = second.clone();
        map.bind(super_f(), Binding { on_press: Some(Box::new(move || *f2.borrow_mut() = true)), ..Binding::new() });

        map.dispatch_press(super_f(), false, 0);
        assert!(!*first.borrow());
        assert!(*second.borrow());
    }

    #[test]
    fn non_exclusive_binding_is_suppressed_while_inhibited() {
        let mut map = KeybindMap::new();
        map.bind(super_f(), Binding { exclusive: false, ..Binding::new() });
        assert_eq!(map.dispatch_press(super_f(), true, 0), Dispatch::NotHandled);
        assert_eq!(map.dispatch_press(super_f(), false, 0), Dispatch::Consumed);
    }

    #[test]
    fn release_is_attempted_even_while_map_inactive() {
        let mut map = KeybindMap::new();
        let released = Rc::new(RefCell::new(false));
        let r = released.clone();
        map.bind(super_f(), Binding { on_release: Some(Box::new(move || *r.borrow_mut() = true)), ..Binding::new() });
        map.set_active(false);
        map.dispatch_release(super_f());
        assert!(*released.borrow());
    }

    #[test]
    fn pass_through_still_reports_handled() {
        let mut map = KeybindMap::new();
        map.bind(super_f(), Binding { pass: true, ..Binding::new() });
        let dispatch = map.dispatch_press(super_f(), false, 0);
        assert_eq!(dispatch, Dispatch::PassThrough);
        assert!(dispatch.is_handled());
    }
}
