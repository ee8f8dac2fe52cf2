//! `loomwm-core`: the window-management core of a tiling Wayland
//! compositor.
//!
//! This crate owns tag-based workspace visibility, the container/toplevel
//! model, BSP and master/stack layout, the interactive pointer state
//! machine, the keybinding map and the transaction scheduler that coalesces
//! layout changes into output commits. It does not speak any wire protocol,
//! does not render anything and does not own a GPU context: those concerns
//! live behind the collaborator traits in [`collab`], implemented by the
//! host compositor.

#[macro_use]
extern crate tracing;

pub mod bsp;
pub mod collab;
pub mod config;
pub mod container;
pub mod error;
pub mod focus;
pub mod geometry;
pub mod keybind;
pub mod logging;
pub mod master;
pub mod output;
pub mod pointer;
pub mod signals;
pub mod tag;
pub mod toplevel;
pub mod transaction;

pub use config::Config;
pub use container::{Container, ContainerId};
pub use error::CoreError;
pub use output::{Output, OutputId};
pub use tag::{TagInfo, Tags};
pub use toplevel::{Toplevel, ToplevelId};

use std::rc::Rc;

use crate::focus::FocusStack;
use crate::keybind::KeybindMap;
use crate::output::OutputRegistry;
use crate::pointer::PointerState;
use crate::signals::Signals;
use crate::transaction::Scheduler;

/// The aggregate root of the window-management core.
///
/// A `Core` owns every output, the global focus stack, the keybinding map,
/// the interactive pointer state machine, the transaction scheduler and the
/// signals bus. A host binary constructs one `Core` for the whole
/// compositor lifetime and drives it from input and output events.
#[derive(Debug)]
pub struct Core {
    pub config: Rc<Config>,
    pub outputs: OutputRegistry,
    pub focus: FocusStack,
    pub keybinds: KeybindMap,
    pub pointer: PointerState,
    pub scheduler: Scheduler,
    pub signals: Signals,
}

impl Core {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let config = Rc::new(config);
        Self {
            config: config.clone(),
            outputs: OutputRegistry::new(),
            focus: FocusStack::new(),
            keybinds: KeybindMap::new(),
            pointer: PointerState::new(),
            scheduler: Scheduler::new(),
            signals: Signals::new(),
        }
    }

    /// Replace the active configuration, re-deriving anything it affects.
    ///
    /// Mirrors the teacher's `reload_config` flow: tunables are picked up by
    /// layout strategies and containers on their next arrange pass, nothing
    /// is recomputed eagerly here.
    pub fn reload_config(&mut self, config: Config) {
        self.config = Rc::new(config);
        info!("configuration reloaded");
    }
}
