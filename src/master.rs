//! Master/stack layout: a pluggable ring of layout strategies (§4.5).
//!
//! The source's function-pointer ring maps naturally onto a trait-object
//! slice (§9 design note); `LayoutRegistry` is that slice plus the
//! "refuse unregister of an in-use strategy" policy the design notes
//! prescribe in place of the source's known issue.

use crate::container::Container;
use crate::geometry::Rect;
use crate::tag::MasterState;

/// A pluggable tiling strategy for the master/stack layout.
pub trait LayoutStrategy: std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Arrange `containers` (front-to-back order, as kept in
    /// `OutputState::containers`) within `usable_area`, honoring
    /// `master_state`. Returns the new `(index, rect)` box for each
    /// container, in the same order as the input slice.
    fn arrange(
        &self,
        containers: &[Container],
        usable_area: Rect,
        gap: i32,
        master_state: &MasterState,
    ) -> Vec<Rect>;

    /// Called when an interactive master-resize begins; returns the
    /// initial `mwfact` to record as the resize baseline. The default
    /// simply reads the current value.
    fn resize_begin(&self, master_state: &MasterState) -> f64 {
        master_state.mwfact()
    }

    /// Compute the updated `mwfact` given the starting value and cursor
    /// delta along the resize axis, normalized to `usable_width`. Default
    /// matches §4.5's `tile` strategy resize math.
    fn resize_update(&self, mwfact_0: f64, delta_x: i32, usable_width: i32) -> f64 {
        if usable_width == 0 {
            return mwfact_0;
        }
        (mwfact_0 + f64::from(delta_x) / f64::from(usable_width)).clamp(0.1, 0.9)
    }

    fn resize_end(&self) {}
}

/// The `tile` strategy: a master column of `master_state.master_count`
/// containers spanning `mwfact` of the usable width, with the remainder
/// spread across `master_state.column_count` stack columns weighted by
/// each container's `wfact`.
#[derive(Debug, Default)]
pub struct TileLayout;

impl LayoutStrategy for TileLayout {
    fn name(&self) -> &'static str {
        "tile"
    }

    fn arrange(
        &self,
        containers: &[Container],
        usable_area: Rect,
        gap: i32,
        master_state: &MasterState,
    ) -> Vec<Rect> {
        let total = containers.len();
        if total == 0 {
            return Vec::new();
        }

        let master_count = (master_state.master_count as usize).min(total).max(1.min(total));
        let mwfact = if master_count >= total { 1.0 } else { master_state.mwfact() };

        let master_width = ((usable_area.w() as f64) * mwfact).round() as i32;
        let stack_width = (usable_area.w() - master_width).max(0);
        let gap_half = gap / 2;

        let mut out = Vec::with_capacity(total);

        // Master column: stacked vertically, equal height.
        let master_h = usable_area.h() / master_count as i32;
        for i in 0..master_count {
            let y = usable_area.y() + master_h * i as i32;
            let h = if i + 1 == master_count {
                usable_area.y() + usable_area.h() - y
            } else {
                master_h
            };
            let w = if master_count >= total {
                usable_area.w()
            } else {
                master_width - gap_half
            };
            out.push(Rect::new(usable_area.x(), y, w.max(1), h.max(1)));
        }

        if master_count >= total {
            return out;
        }

        // Stack: remaining containers spread across column_count columns,
        // weighted within each column by wfact.
        let stack_containers = &containers[master_count..];
        let column_count = (master_state.column_count as usize).max(1).min(stack_containers.len().max(1));
        let stack_x0 = usable_area.x() + master_width + gap_half + gap - gap_half;
        let column_width = stack_width / column_count as i32;

        for (col, chunk) in distribute_into_columns(stack_containers, column_count)
            .into_iter()
            .enumerate()
        {
            let col_x = stack_x0 + column_width * col as i32;
            let col_w = if col + 1 == column_count {
                usable_area.x() + usable_area.w() - col_x
            } else {
                column_width
            };
            let total_wfact: f64 = chunk.iter().map(|c| c.wfact()).sum::<f64>().max(0.01);
            let mut y = usable_area.y();
            for (i, c) in chunk.iter().enumerate() {
                let share = c.wfact() / total_wfact;
                let h = if i + 1 == chunk.len() {
                    usable_area.y() + usable_area.h() - y
                } else {
                    ((usable_area.h() as f64) * share).round() as i32
                };
                out.push(Rect::new(col_x, y, col_w.max(1), h.max(1)));
                y += h;
            }
        }

        out
    }
}

fn distribute_into_columns<'a>(containers: &'a [Container], column_count: usize) -> Vec<Vec<&'a Container>> {
    let mut columns: Vec<Vec<&Container>> = vec![Vec::new(); column_count];
    for (i, c) in containers.iter().enumerate() {
        columns[i % column_count].push(c);
    }
    columns
}

/// The `monocle` strategy: every container fills the full usable area.
#[derive(Debug, Default)]
pub struct MonocleLayout;

impl LayoutStrategy for MonocleLayout {
    fn name(&self) -> &'static str {
        "monocle"
    }

    fn arrange(
        &self,
        containers: &[Container],
        usable_area: Rect,
        _gap: i32,
        _master_state: &MasterState,
    ) -> Vec<Rect> {
        vec![usable_area; containers.len()]
    }
}

/// A ring of registered layout strategies, selected by index
/// (`MasterState::current_layout`).
#[derive(Debug)]
pub struct LayoutRegistry {
    strategies: Vec<Box<dyn LayoutStrategy>>,
}

impl LayoutRegistry {
    /// A registry pre-populated with the two canonical strategies the core
    /// ships (§4.5).
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            strategies: vec![Box::new(TileLayout), Box::new(MonocleLayout)],
        }
    }

    #[must_use]
    pub fn new() -> Self {
        Self { strategies: Vec::new() }
    }

    pub fn register(&mut self, strategy: Box<dyn LayoutStrategy>) {
        self.strategies.push(strategy);
    }

    /// Remove the strategy at `index`, refusing if it is the one currently
    /// selected by `in_use` (§9: "refuse unregister of in-use strategy").
    /// Returns `true` if the strategy was removed.
    pub fn unregister(&mut self, index: usize, in_use: usize) -> bool {
        if index == in_use {
            crate::error::report_precondition_violation("cannot unregister the in-use layout strategy");
            return false;
        }
        if index >= self.strategies.len() {
            crate::error::report_transient("unregister: layout strategy index out of range");
            return false;
        }
        self.strategies.remove(index);
        true
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&dyn LayoutStrategy> {
        self.strategies.get(index).map(std::convert::AsRef::as_ref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// The next index in the ring after `current`, wrapping around.
    #[must_use]
    pub fn next_index(&self, current: usize) -> usize {
        if self.strategies.is_empty() {
            0
        } else {
            (current + 1) % self.strategies.len()
        }
    }

    /// The previous index in the ring before `current`, wrapping around.
    #[must_use]
    pub fn previous_index(&self, current: usize) -> usize {
        if self.strategies.is_empty() {
            0
        } else {
            (current + self.strategies.len() - 1) % self.strategies.len()
        }
    }
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
