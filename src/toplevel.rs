//! The toplevel model: one mapped surface (§3 "Toplevel").
//!
//! Grounded on the teacher's `window.rs` `Arc<Inner>` + `Mutex<Data>` +
//! `AtomicUsize`-backed unique-id handle pattern, adapted to the single-
//! threaded `Rc<RefCell<_>>` sharing this crate otherwise uses (§5):
//! nothing here crosses a thread boundary, so there is no need to pay for
//! atomics on every borrow the way a `Send`-capable compositor handle does.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::container::ContainerId;

static NEXT_TOPLEVEL_ID: AtomicUsize = AtomicUsize::new(0);

/// A unique, stable identity for a toplevel across its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToplevelId(usize);

impl ToplevelId {
    #[must_use]
    pub fn unique() -> Self {
        Self(NEXT_TOPLEVEL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Which wire protocol mapped this surface. The core never decodes either
/// protocol; it only needs to know which `SurfaceProvider` methods apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    XdgShell,
    XWayland,
}

/// A hint about whether the client wants tearing presentation for this
/// surface, passed through to the renderer collaborator untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TearingHint {
    #[default]
    Unset,
    Requested,
    Refused,
}

struct ToplevelData {
    container: ContainerId,
    surface_kind: SurfaceKind,
    mapped: bool,
    urgent: bool,
    tearing_hint: TearingHint,
    provider: Box<dyn crate::collab::SurfaceProvider>,
}

/// A single top-level client surface.
///
/// Cheap to clone (an `Rc` bump); every clone refers to the same
/// underlying data. Owned by its [`crate::container::Container`] via that
/// container's `toplevels` list; this handle itself is non-owning, matching
/// §5's ownership-edges policy.
#[derive(Clone)]
pub struct Toplevel {
    inner: Rc<RefCell<ToplevelData>>,
    id: ToplevelId,
}

impl std::fmt::Debug for Toplevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.inner.borrow();
        f.debug_struct("Toplevel")
            .field("id", &self.id)
            .field("container", &data.container)
            .field("mapped", &data.mapped)
            .field("urgent", &data.urgent)
            .finish()
    }
}

impl PartialEq for Toplevel {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Toplevel {}

impl Toplevel {
    #[must_use]
    pub fn new(
        container: ContainerId,
        surface_kind: SurfaceKind,
        provider: Box<dyn crate::collab::SurfaceProvider>,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ToplevelData {
                container,
                surface_kind,
                mapped: true,
                urgent: false,
                tearing_hint: TearingHint::default(),
                provider,
            })),
            id: ToplevelId::unique(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> ToplevelId {
        self.id
    }

    #[must_use]
    pub fn container(&self) -> ContainerId {
        self.inner.borrow().container
    }

    pub fn set_container(&self, container: ContainerId) {
        self.inner.borrow_mut().container = container;
    }

    #[must_use]
    pub fn surface_kind(&self) -> SurfaceKind {
        self.inner.borrow().surface_kind
    }

    #[must_use]
    pub fn mapped(&self) -> bool {
        self.inner.borrow().mapped
    }

    /// Marks the surface as destroyed. Must be detached from its container
    /// (via `Container::remove_toplevel`) before or immediately after this
    /// is called; the two are independent flags by design (§3's "must
    /// detach from container first" describes caller obligation, not an
    /// invariant this type enforces unilaterally).
    pub fn set_unmapped(&self) {
        self.inner.borrow_mut().mapped = false;
    }

    #[must_use]
    pub fn urgent(&self) -> bool {
        self.inner.borrow().urgent
    }

    pub fn set_urgent(&self, urgent: bool) {
        self.inner.borrow_mut().urgent = urgent;
    }

    #[must_use]
    pub fn tearing_hint(&self) -> TearingHint {
        self.inner.borrow().tearing_hint
    }

    pub fn set_tearing_hint(&self, hint: TearingHint) {
        self.inner.borrow_mut().tearing_hint = hint;
    }

    pub fn with_provider<R>(&self, f: impl FnOnce(&dyn crate::collab::SurfaceProvider) -> R) -> R {
        f(self.inner.borrow().provider.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::test_support::FakeSurfaceProvider;

    #[test]
    fn unmapped_and_detached_flags_are_independent() {
        let container = ContainerId::unique();
        let toplevel = Toplevel::new(container, SurfaceKind::XdgShell, Box::new(FakeSurfaceProvider::default()));
        assert!(toplevel.mapped());
        toplevel.set_unmapped();
        assert!(!toplevel.mapped());
        assert_eq!(toplevel.container(), container);
    }

    #[test]
    fn urgent_flag_clears_on_demand() {
        let container = ContainerId::unique();
        let toplevel = Toplevel::new(container, SurfaceKind::XdgShell, Box::new(FakeSurfaceProvider::default()));
        toplevel.set_urgent(true);
        assert!(toplevel.urgent());
        toplevel.set_urgent(false);
        assert!(!toplevel.urgent());
    }
}
