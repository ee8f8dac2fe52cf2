//! Output lifecycle and per-output persistent state (§3 "Output"/"Output
//! state", §4.2).
//!
//! The teacher's `output.rs` is about redraw/frame-clock scheduling, a
//! different concern entirely; this module borrows only its
//! `OutputExt`-style extension-trait habit, not its contents. The
//! persistent-state-survives-unplug design here is new: §9 calls for a
//! name-indexed cache whose values outlive any single output instance,
//! with ownership transferring explicitly on restore (no weak references).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::container::{Container, ContainerId};
use crate::geometry::Rect;
use crate::tag::{LayoutMode, TagInfo, Tags, MAX_WORKSPACE};
use crate::toplevel::Toplevel;

static NEXT_OUTPUT_ID: AtomicUsize = AtomicUsize::new(0);

/// The sentinel name reserved for the always-present fallback output.
pub const FALLBACK_OUTPUT_NAME: &str = "__fallback__";

/// Identity of a *live* output handle. A new value is minted every time an
/// output is (re)created; the persistent state surviving unplug is keyed
/// separately, by [`Output::name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputId(usize);

impl OutputId {
    #[must_use]
    pub fn unique() -> Self {
        Self(NEXT_OUTPUT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Persistent, per-output state that survives unplug/replug by being
/// stashed in a name-keyed cache (§3 "Output state").
pub struct OutputState {
    pub tag_info: Vec<TagInfo>,
    active_tag: Tags,
    active_workspace: usize,
    pub max_general_workspace: usize,
    pub containers: Vec<Container>,
    pub focus_stack: Vec<ContainerId>,
    pub toplevels: Vec<Toplevel>,
    pub minimized: Vec<ContainerId>,
    pub old_output_name: Option<String>,
}

impl std::fmt::Debug for OutputState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputState")
            .field("active_tag", &self.active_tag)
            .field("active_workspace", &self.active_workspace)
            .field("containers", &self.containers.len())
            .finish()
    }
}

impl OutputState {
    #[must_use]
    pub fn new() -> Self {
        let tag_info = (1..=MAX_WORKSPACE).map(TagInfo::new).collect();
        Self {
            tag_info,
            active_tag: Tags::single(1),
            active_workspace: 1,
            max_general_workspace: MAX_WORKSPACE,
            containers: Vec::new(),
            focus_stack: Vec::new(),
            toplevels: Vec::new(),
            minimized: Vec::new(),
            old_output_name: None,
        }
    }

    #[must_use]
    pub const fn active_tag(&self) -> Tags {
        self.active_tag
    }

    #[must_use]
    pub const fn active_workspace(&self) -> usize {
        self.active_workspace
    }

    /// Replace the active tag bitfield. Requires at least one bit set;
    /// fails silently otherwise (§4.2 `set_active_tag`).
    pub fn set_active_tag(&mut self, tag: Tags) {
        if tag.is_empty() {
            crate::error::report_transient("set_active_tag: refusing to clear all active tags");
            return;
        }
        self.active_tag = tag;
    }

    /// Look up a live container by id among this output's `containers`
    /// (§4.8 focus-stack walks need this to resolve a `ContainerId` back
    /// into a handle).
    #[must_use]
    pub fn find_container(&self, id: ContainerId) -> Option<&Container> {
        self.containers.iter().find(|c| c.id() == id)
    }

    pub fn tag_info(&self, workspace: usize) -> &TagInfo {
        &self.tag_info[workspace - 1]
    }

    pub fn tag_info_mut(&mut self, workspace: usize) -> &mut TagInfo {
        &mut self.tag_info[workspace - 1]
    }

    /// `set_view_only(o, w)`: select exactly workspace `w` as active
    /// (§4.2).
    pub fn set_view_only(&mut self, workspace: usize) {
        self.active_tag = Tags::single(workspace);
        self.active_workspace = workspace;
    }

    #[must_use]
    pub fn is_visible(&self, container: &Container) -> bool {
        container.tag().intersects(self.active_tag) && !container.state().contains(crate::container::ContainerState::MINIMIZED)
    }

    /// Switch `workspace`'s layout mode. Entering `Bsp` inserts every
    /// eligible container (visible, non-floating, not yet linked) at the
    /// tree; entering `Floating` restores each container's remembered
    /// floating box (§4.2 `set_layout_mode`).
    pub fn set_layout_mode(&mut self, workspace: usize, mode: LayoutMode) {
        let previous = self.tag_info(workspace).layout_mode;
        if previous == mode {
            return;
        }

        if mode == LayoutMode::Bsp {
            let eligible: Vec<ContainerId> = self
                .containers
                .iter()
                .filter(|c| {
                    c.workspace() == workspace
                        && self.is_visible(c)
                        && !c.is_floating()
                        && !c.bsp_linked()
                })
                .map(Container::id)
                .collect();
            let tag_info = self.tag_info_mut(workspace);
            for container_id in eligible {
                let sibling = tag_info.bsp.last_focused;
                tag_info.bsp.root.insert(container_id, sibling, crate::bsp::Position::Right);
                tag_info.bsp.last_focused = Some(container_id);
            }
            for container in &self.containers {
                if container.workspace() == workspace && !container.is_floating() {
                    container.set_bsp_linked(true);
                }
            }
        } else if mode == LayoutMode::Floating {
            for container in &self.containers {
                if container.workspace() == workspace && !container.is_floating() {
                    if let Some(floating_box) = container.floating_box() {
                        container.set_box_gap(floating_box, 0);
                    }
                }
            }
        }

        self.tag_info_mut(workspace).layout_mode = mode;
    }
}

impl Default for OutputState {
    fn default() -> Self {
        Self::new()
    }
}

/// The live output handle (§3 "Output").
#[derive(Debug, Clone)]
pub struct Output {
    id: OutputId,
    name: String,
    layout_box: Rect,
    exclusive_insets: (i32, i32, i32, i32),
    pub tearing_allowed: bool,
}

impl Output {
    #[must_use]
    pub fn new(name: impl Into<String>, layout_box: Rect) -> Self {
        Self {
            id: OutputId::unique(),
            name: name.into(),
            layout_box,
            exclusive_insets: (0, 0, 0, 0),
            tearing_allowed: true,
        }
    }

    /// The headless 1280x720 sentinel output, always present, used as a
    /// graveyard for orphaned containers while no real output exists. It
    /// never receives arrange calls.
    #[must_use]
    pub fn fallback() -> Self {
        let mut output = Self::new(FALLBACK_OUTPUT_NAME, Rect::new(0, 0, 1280, 720));
        output.tearing_allowed = false;
        output
    }

    #[must_use]
    pub const fn id(&self) -> OutputId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.name == FALLBACK_OUTPUT_NAME
    }

    #[must_use]
    pub const fn layout_box(&self) -> Rect {
        self.layout_box
    }

    pub fn set_layout_box(&mut self, layout_box: Rect) {
        self.layout_box = layout_box;
    }

    pub fn set_exclusive_insets(&mut self, insets: (i32, i32, i32, i32)) {
        self.exclusive_insets = insets;
    }

    /// `layout_box` minus exclusive layer-shell reservations.
    #[must_use]
    pub fn usable_area(&self) -> Rect {
        let (top, bottom, left, right) = self.exclusive_insets;
        Rect::new(
            self.layout_box.x() + left,
            self.layout_box.y() + top,
            (self.layout_box.w() - left - right).max(1),
            (self.layout_box.h() - top - bottom).max(1),
        )
    }
}

/// Owns every live output plus the name-keyed cache of persistent state
/// for outputs that are currently unplugged (§4.2).
#[derive(Debug)]
pub struct OutputRegistry {
    outputs: Vec<Output>,
    states: HashMap<OutputId, OutputState>,
    state_cache: HashMap<String, OutputState>,
    fallback: Output,
    fallback_state: OutputState,
}

impl OutputRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            outputs: Vec::new(),
            states: HashMap::new(),
            state_cache: HashMap::new(),
            fallback: Output::fallback(),
            fallback_state: OutputState::new(),
        }
    }

    #[must_use]
    pub fn fallback(&self) -> &Output {
        &self.fallback
    }

    #[must_use]
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    #[must_use]
    pub fn find(&self, id: OutputId) -> Option<&Output> {
        self.outputs.iter().find(|o| o.id() == id)
    }

    pub fn state(&self, id: OutputId) -> Option<&OutputState> {
        if id == self.fallback.id() {
            Some(&self.fallback_state)
        } else {
            self.states.get(&id)
        }
    }

    pub fn state_mut(&mut self, id: OutputId) -> Option<&mut OutputState> {
        if id == self.fallback.id() {
            Some(&mut self.fallback_state)
        } else {
            self.states.get_mut(&id)
        }
    }

    /// Create (or restore) an output named `name` with the given layout
    /// box. Reclaims every container parked on another live output (or the
    /// fallback) whose `old_prop.output_name` matches `name`, restoring its
    /// tag, workspace and BSP link and clearing `old_prop` (§4.2 "State
    /// restore").
    pub fn add_output(&mut self, name: impl Into<String>, layout_box: Rect) -> OutputId {
        let name = name.into();
        let output = Output::new(name.clone(), layout_box);
        let id = output.id();

        let mut state = self.state_cache.remove(&name).unwrap_or_else(OutputState::new);

        let Self { states, fallback_state, .. } = self;
        let mut reclaimed = Vec::new();
        for other_state in states.values_mut().chain(std::iter::once(&mut *fallback_state)) {
            let mut i = 0;
            while i < other_state.containers.len() {
                let belongs = other_state.containers[i]
                    .old_prop()
                    .and_then(|p| p.output_name)
                    .as_deref()
                    == Some(name.as_str());
                if belongs {
                    reclaimed.push(other_state.containers.remove(i));
                } else {
                    i += 1;
                }
            }
        }

        for container in &reclaimed {
            let old_prop = container.old_prop();
            container.move_to_output(id, container.workspace());
            if let Some(old_prop) = old_prop {
                container.set_tag(old_prop.tag);
                container.set_workspace(old_prop.workspace);
                container.set_bsp_linked(old_prop.was_bsp_linked);
            }
            container.set_old_prop(None);
        }
        state.containers.extend(reclaimed);
        state.old_output_name = None;

        info!(output = %name, "output added");
        self.outputs.push(output);
        self.states.insert(id, state);
        id
    }

    /// Retire an output: snapshot its state into the name-keyed cache, and
    /// move every still-bound container to `receiving_output` (normally
    /// "the focused remaining output", or the fallback if none remains).
    /// Returns the containers that moved, so the caller can re-arrange the
    /// receiving output's workspaces.
    pub fn remove_output(&mut self, id: OutputId, receiving_output: OutputId) -> Vec<Container> {
        let Some(pos) = self.outputs.iter().position(|o| o.id() == id) else {
            crate::error::report_transient("remove_output: output id not found");
            return Vec::new();
        };
        let output = self.outputs.remove(pos);
        let Some(mut state) = self.states.remove(&id) else {
            return Vec::new();
        };

        let mut moved = Vec::with_capacity(state.containers.len());
        for container in state.containers.drain(..) {
            container.set_old_prop(Some(crate::container::OldProp {
                output_name: Some(output.name().to_owned()),
                was_bsp_linked: container.bsp_linked(),
                tag: container.tag(),
                workspace: container.workspace(),
            }));
            container.set_bsp_linked(false);
            container.move_to_output(receiving_output, container.workspace());
            moved.push(container);
        }

        if let Some(receiving_state) = self.state_mut(receiving_output) {
            receiving_state.containers.extend(moved.iter().cloned());
        }

        state.old_output_name = Some(output.name().to_owned());
        info!(output = %output.name(), "output removed");
        self.state_cache.insert(output.name().to_owned(), state);
        moved
    }
}

impl Default for OutputRegistry {
    fn default() -> Self {
        Self::new()
    }
}
