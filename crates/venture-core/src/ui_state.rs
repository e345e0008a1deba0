//! Shared UI preference model.
//!
//! Small interaction state that is not worth threading through every call
//! site: sidebar collapse, the active side panel, and command palette
//! visibility. Fields are private; the three named mutators are the only
//! way to change them, which keeps `active_panel` inside its enumerated
//! values for the life of the process.

use serde::{Deserialize, Serialize};

/// The side panels a project view can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    Overview,
    Approvals,
    Artifacts,
}

/// In-memory UI preferences.
///
/// Only `sidebar_collapsed` survives a restart; `active_panel` and
/// `command_palette_open` always start from their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UiPreferences {
    sidebar_collapsed: bool,
    active_panel: Option<Panel>,
    command_palette_open: bool,
}

impl UiPreferences {
    /// Creates preferences with all defaults (expanded sidebar, no panel,
    /// palette closed).
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges the persisted sidebar flag with ephemeral defaults.
    ///
    /// Called once at startup; whatever a prior run left in `active_panel`
    /// or `command_palette_open` is intentionally discarded.
    pub fn from_persisted(sidebar_collapsed: bool) -> Self {
        Self {
            sidebar_collapsed,
            active_panel: None,
            command_palette_open: false,
        }
    }

    /// Flips the sidebar collapse flag and returns the new value.
    pub fn toggle_sidebar(&mut self) -> bool {
        self.sidebar_collapsed = !self.sidebar_collapsed;
        self.sidebar_collapsed
    }

    /// Selects the active side panel (`None` closes it).
    pub fn set_active_panel(&mut self, panel: Option<Panel>) {
        self.active_panel = panel;
    }

    /// Shows or hides the command palette.
    pub fn set_command_palette_open(&mut self, open: bool) {
        self.command_palette_open = open;
    }

    pub fn sidebar_collapsed(&self) -> bool {
        self.sidebar_collapsed
    }

    pub fn active_panel(&self) -> Option<Panel> {
        self.active_panel
    }

    pub fn command_palette_open(&self) -> bool {
        self.command_palette_open
    }
}
