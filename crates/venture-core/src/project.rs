//! Project progress domain models.
//!
//! The runtime does not own project data; it only consumes the small
//! read-only snapshot that drives UI mode detection.

use serde::{Deserialize, Serialize};

/// The six stages a Venture project moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Discovery,
    Branding,
    Validation,
    Development,
    Marketing,
    Fundraising,
}

/// Read-only view of a project's progress.
///
/// The API reports the phase under `current_phase`; both field names are
/// accepted on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    #[serde(alias = "current_phase")]
    pub phase: Phase,
    #[serde(alias = "artifacts_count")]
    pub artifact_count: u32,
}

impl ProjectSnapshot {
    pub fn new(phase: Phase, artifact_count: u32) -> Self {
        Self {
            phase,
            artifact_count,
        }
    }
}
