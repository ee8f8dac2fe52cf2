//! The tag bitfield and per-workspace tag info (§3 "Tag info").

use crate::bsp::BspTree;
use crate::container::ContainerId;
use crate::output::OutputId;

/// Workspace indices run `1..=MAX_WORKSPACE`; bit 0 of [`Tags`] is never
/// set by normal operation (reserved for the off-screen "wallpaper" view).
pub const MAX_WORKSPACE: usize = 30;

/// A 30-bit workspace membership mask. Bit *i* represents workspace
/// `i + 1`. Multiple bits can be set simultaneously: several workspaces can
/// be "active" (visible) on one output at once.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tags(u32);

impl Tags {
    pub const EMPTY: Self = Self(0);

    /// The mask with only `workspace`'s bit set. `workspace` must be in
    /// `1..=MAX_WORKSPACE`; out-of-range indices are clamped and logged
    /// (`ClampableInput`).
    #[must_use]
    pub fn single(workspace: usize) -> Self {
        if !(1..=MAX_WORKSPACE).contains(&workspace) {
            crate::error::report_clamped("workspace index out of range");
            let clamped = workspace.clamp(1, MAX_WORKSPACE);
            return Self(1 << (clamped - 1));
        }
        Self(1 << (workspace - 1))
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// `workspace`'s 1-based index, if this mask has exactly one bit set.
    #[must_use]
    pub fn single_workspace(self) -> Option<usize> {
        if self.0.count_ones() == 1 {
            Some(self.0.trailing_zeros() as usize + 1)
        } else {
            None
        }
    }
}

/// The layout strategy applied to a workspace's visible containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    Floating,
    #[default]
    Master,
    Bsp,
}

/// Master/stack tunables for one workspace (§3, §4.5).
#[derive(Debug, Clone)]
pub struct MasterState {
    pub master_count: u32,
    pub column_count: u32,
    mwfact: f64,
    /// Index into the [`crate::master::LayoutRegistry`] ring of the
    /// currently selected strategy.
    pub current_layout: usize,
}

impl MasterState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            master_count: 1,
            column_count: 1,
            mwfact: 0.5,
            current_layout: 0,
        }
    }

    #[must_use]
    pub const fn mwfact(&self) -> f64 {
        self.mwfact
    }

    /// Set `mwfact`, clamping to `[0.1, 0.9]` (invariant 4/§8).
    pub fn set_mwfact(&mut self, value: f64) {
        let clamped = value.clamp(0.1, 0.9);
        if (clamped - value).abs() > f64::EPSILON {
            crate::error::report_clamped("mwfact out of [0.1, 0.9]");
        }
        self.mwfact = clamped;
    }
}

impl Default for MasterState {
    fn default() -> Self {
        Self::new()
    }
}

/// The BSP tree root for a workspace plus the last-focused-leaf pointer
/// used to pick an insertion sibling (§3, §4.4).
#[derive(Debug, Default)]
pub struct BspRootEntry {
    pub root: BspTree,
    pub last_focused: Option<ContainerId>,
}

/// A key identifying one (output, workspace) tag-info slot, used by the
/// transaction scheduler to dedupe `schedule_tag` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagKey {
    pub output: OutputId,
    pub workspace: usize,
}

/// Per-output, per-workspace parameters (§3 "Tag info").
#[derive(Debug)]
pub struct TagInfo {
    pub index: usize,
    useless_gaps: i32,
    pub layout_mode: LayoutMode,
    pub master_state: MasterState,
    pub bsp: BspRootEntry,
    pub pending_transaction: bool,
}

impl TagInfo {
    #[must_use]
    pub fn new(index: usize) -> Self {
        debug_assert!((1..=MAX_WORKSPACE).contains(&index));
        Self {
            index,
            useless_gaps: 0,
            layout_mode: LayoutMode::default(),
            master_state: MasterState::new(),
            bsp: BspRootEntry::default(),
            pending_transaction: false,
        }
    }

    #[must_use]
    pub const fn useless_gaps(&self) -> i32 {
        self.useless_gaps
    }

    /// Set the inner gap, clamping negative input to `0` (invariant 4/§8).
    pub fn set_useless_gaps(&mut self, gaps: i32) {
        if gaps < 0 {
            crate::error::report_clamped("useless_gaps < 0");
        }
        self.useless_gaps = gaps.max(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_sets_expected_bit() {
        assert_eq!(Tags::single(1).bits(), 0b1);
        assert_eq!(Tags::single(2).bits(), 0b10);
        assert_eq!(Tags::single(30).bits(), 1 << 29);
    }

    #[test]
    fn mwfact_clamps_to_legal_range() {
        let mut state = MasterState::new();
        state.set_mwfact(0.05);
        assert!((state.mwfact() - 0.1).abs() < f64::EPSILON);
        state.set_mwfact(0.95);
        assert!((state.mwfact() - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn useless_gaps_never_negative() {
        let mut tag = TagInfo::new(1);
        tag.set_useless_gaps(-5);
        assert_eq!(tag.useless_gaps(), 0);
    }

    #[test]
    fn single_workspace_roundtrip() {
        let tags = Tags::single(17);
        assert_eq!(tags.single_workspace(), Some(17));
        let multi = tags.union(Tags::single(3));
        assert_eq!(multi.single_workspace(), None);
    }
}
