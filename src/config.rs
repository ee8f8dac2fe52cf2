//! Re-exports the configuration types `loomwm-core` consumes.
//!
//! `loomwm-config` is kept as a separate crate (§1 "Workspace layout")
//! purely so a host binary can parse configuration before constructing a
//! [`crate::Core`]; nothing in this module adds behavior, it just brings
//! the types into this crate's namespace the way the teacher crate
//! re-exports its own `fht-compositor-config` types from `config/mod.rs`.

pub use loomwm_config::{Config, KeyPattern, Modifiers, MouseInput, MousePattern, Rgba};
