//! Configuration types for `loomwm-core`.
//!
//! This crate only holds data: the tunables the window-management core reads
//! (gaps, border appearance, cursor behaviour, key repeat) and the pattern
//! types used to compose keybinding/mousebinding keys. It does not implement
//! a scripting runtime, a callback registry or signal fan-out; those belong
//! to the embedded configuration layer, which is out of scope for this
//! crate. Host binaries wire the parsed [`Config`] into `loomwm_core`.

#[macro_use]
extern crate tracing;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Opaque color handle.
///
/// The core never decodes or renders this; it passes it back out verbatim
/// to whatever draws borders/overlays. We keep a concrete RGBA representation
/// here since unlike a renderer pattern (gradients, images, ...) this is
/// plain config data with a natural default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

fn default_border_color_focus() -> Rgba {
    Rgba::new(0.54, 0.73, 1.0, 1.0)
}

fn default_border_color_normal() -> Rgba {
    Rgba::new(0.22, 0.22, 0.24, 1.0)
}

fn default_cursor_edge_snapping_overlay_color() -> Rgba {
    Rgba::new(0.3, 0.5, 1.0, 0.25)
}

const fn default_border_width() -> u32 {
    1
}

const fn default_cursor_size() -> u32 {
    24
}

const fn default_cursor_inactive_timeout_ms() -> u64 {
    5000
}

const fn default_cursor_edge_threshold() -> u32 {
    16
}

const fn default_repeat_rate() -> u32 {
    30
}

const fn default_repeat_delay() -> u32 {
    400
}

const fn default_useless_gaps() -> u32 {
    0
}

const fn default_border_color_rotation_degree() -> u32 {
    0
}

/// Tunables the window-management core reads. See spec §6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Inner gap applied to tiled cells.
    #[serde(default = "default_useless_gaps")]
    pub useless_gaps: u32,
    #[serde(default = "default_border_width")]
    pub border_width: u32,
    #[serde(default = "default_border_color_focus")]
    pub border_color_focus: Rgba,
    #[serde(default = "default_border_color_normal")]
    pub border_color_normal: Rgba,
    #[serde(default = "default_border_color_rotation_degree")]
    pub border_color_rotation_degree: u32,
    #[serde(default = "default_cursor_size")]
    pub cursor_size: u32,
    #[serde(default = "default_cursor_inactive_timeout_ms")]
    pub cursor_inactive_timeout_ms: u64,
    #[serde(default = "default_cursor_edge_threshold")]
    pub cursor_edge_threshold: u32,
    #[serde(default = "default_cursor_edge_snapping_overlay_color")]
    pub cursor_edge_snapping_overlay_color: Rgba,
    #[serde(default = "default_repeat_rate")]
    pub repeat_rate: u32,
    #[serde(default = "default_repeat_delay")]
    pub repeat_delay: u32,
}

// Custom Default so that a missing config file and an empty TOML document
// produce identical configuration, mirroring the teacher crate's approach.
impl Default for Config {
    fn default() -> Self {
        Self {
            useless_gaps: default_useless_gaps(),
            border_width: default_border_width(),
            border_color_focus: default_border_color_focus(),
            border_color_normal: default_border_color_normal(),
            border_color_rotation_degree: default_border_color_rotation_degree(),
            cursor_size: default_cursor_size(),
            cursor_inactive_timeout_ms: default_cursor_inactive_timeout_ms(),
            cursor_edge_threshold: default_cursor_edge_threshold(),
            cursor_edge_snapping_overlay_color: default_cursor_edge_snapping_overlay_color(),
            repeat_rate: default_repeat_rate(),
            repeat_delay: default_repeat_delay(),
        }
    }
}

impl Config {
    /// Load a [`Config`] from a TOML file, falling back to defaults for
    /// anything unset. A missing file is not an error: we just return
    /// [`Config::default`].
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };

        Self::parse(&contents)
    }

    /// Parse a [`Config`] from a TOML string.
    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let config = toml::from_str(contents)?;
        Ok(config)
    }
}

/// A list of modifiers usable in a key or mouse pattern.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Modifiers {
    pub alt: bool,
    pub ctrl: bool,
    pub logo: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        alt: false,
        ctrl: false,
        logo: false,
        shift: false,
    };

    /// Pack into the bitfield the composed key uses, one bit per modifier.
    pub const fn bits(self) -> u32 {
        (self.alt as u32) | (self.ctrl as u32) << 1 | (self.logo as u32) << 2 | (self.shift as u32) << 3
    }
}

/// A keyboard pattern: modifiers plus an XKB keysym.
///
/// Mirrors the teacher's `KeyPattern(ModifiersState, Keysym)` tuple struct,
/// except the keysym here is a plain `u32`: decoding the real keymap is a
/// wire-protocol concern out of scope for this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyPattern(pub Modifiers, pub u32);

/// A pointer button, or one of the four scroll pseudo-buttons (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseInput {
    Button(u32),
    ScrollUp,
    ScrollDown,
    ScrollLeft,
    ScrollRight,
}

/// A mouse pattern: modifiers plus a button or scroll pseudo-button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MousePattern(pub Modifiers, pub MouseInput);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_equals_empty_document() {
        let from_empty = Config::parse("").unwrap();
        assert_eq!(from_empty, Config::default());
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let config = Config::load(Path::new("/nonexistent/loomwm.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_document_keeps_remaining_defaults() {
        let config = Config::parse("useless-gaps = 8\nborder-width = 3\n").unwrap();
        assert_eq!(config.useless_gaps, 8);
        assert_eq!(config.border_width, 3);
        assert_eq!(config.repeat_rate, default_repeat_rate());
    }

    #[test]
    fn modifiers_bits_are_distinct() {
        let all = [
            Modifiers {
                alt: true,
                ..Modifiers::NONE
            },
            Modifiers {
                ctrl: true,
                ..Modifiers::NONE
            },
            Modifiers {
                logo: true,
                ..Modifiers::NONE
            },
            Modifiers {
                shift: true,
                ..Modifiers::NONE
            },
        ];
        let bits: Vec<u32> = all.iter().map(|m| m.bits()).collect();
        assert_eq!(bits, vec![1, 2, 4, 8]);
    }
}
