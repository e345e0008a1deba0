//! Shared UI state service.
//!
//! One instance of this service lives for the process lifetime and is
//! injected wherever the view layer needs it; it is the only writer of the
//! shared `UiPreferences`. Of the three fields, only the sidebar collapse
//! flag is durable; the active panel and command palette visibility reset
//! on every start.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use venture_core::error::Result;
use venture_core::ui_state::{Panel, UiPreferences};

use crate::storage::AtomicTomlFile;

/// The on-disk shape: exactly one persisted field.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PersistedUiState {
    pub sidebar_collapsed: bool,
}

/// Service owning the process-wide UI preferences.
///
/// Cheap to clone; clones share the same state and storage.
#[derive(Clone)]
pub struct UiStateService {
    state: Arc<RwLock<UiPreferences>>,
    storage: Arc<AtomicTomlFile<PersistedUiState>>,
}

impl UiStateService {
    /// Opens the service, restoring the persisted sidebar flag and
    /// resetting the ephemeral fields.
    ///
    /// An unreadable preference file is treated as absent: preferences are
    /// never worth failing startup over.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let storage = AtomicTomlFile::new(path);
        let persisted = match storage.load() {
            Ok(state) => state.unwrap_or_default(),
            Err(err) => {
                log::warn!("Ignoring unreadable UI state file: {}", err);
                PersistedUiState::default()
            }
        };

        Self {
            state: Arc::new(RwLock::new(UiPreferences::from_persisted(
                persisted.sidebar_collapsed,
            ))),
            storage: Arc::new(storage),
        }
    }

    /// Returns a copy of the current preferences.
    pub fn snapshot(&self) -> UiPreferences {
        *self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Flips the sidebar collapse flag, persists it, and returns the new
    /// value.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the flag cannot be written to disk.
    /// The in-memory flip still holds in that case; the preference is
    /// simply forgotten at the next restart.
    pub fn toggle_sidebar(&self) -> Result<bool> {
        let collapsed = {
            let mut state = self
                .state
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            state.toggle_sidebar()
        };

        self.storage
            .save(&PersistedUiState {
                sidebar_collapsed: collapsed,
            })
            .map(|_| collapsed)
            .inspect_err(|err| {
                log::warn!("Failed to persist sidebar state: {}", err);
            })
    }

    /// Selects the active side panel (`None` closes it). Ephemeral.
    pub fn set_active_panel(&self, panel: Option<Panel>) {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.set_active_panel(panel);
    }

    /// Shows or hides the command palette. Ephemeral.
    pub fn set_command_palette_open(&self, open: bool) {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.set_command_palette_open(open);
    }
}
