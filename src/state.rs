//! Status edit state machine definition.
//!
//! A draft is the complete snapshot of one row's in-progress status edit.
//! It lives only in the view: the store's copy of the record is never
//! touched until the save request resolves and the list is re-fetched.

use serde::{Deserialize, Serialize};

use crate::types::{DeploymentId, DeploymentStatus};

/// Phases of a row's status control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditPhase {
    /// Badge only, no draft exists.
    Viewing,
    /// Dropdown open, candidate held locally.
    Editing,
    /// Update request in flight. Control disabled.
    Saving,
}

impl EditPhase {
    /// Human-readable phase name for logging/display.
    pub fn name(&self) -> &'static str {
        match self {
            EditPhase::Viewing => "viewing",
            EditPhase::Editing => "editing",
            EditPhase::Saving => "saving",
        }
    }
}

/// In-progress status edit for one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDraft {
    pub id: DeploymentId,
    /// Last-known-good status, seeded when the editor opened.
    pub original: DeploymentStatus,
    /// Status the user picked, not yet sent.
    pub candidate: DeploymentStatus,
    pub phase: EditPhase,
    /// Inline message from the last failed save.
    pub error: Option<String>,
}

impl StatusDraft {
    /// Open an editor seeded with the record's current status.
    pub fn open(id: DeploymentId, current: DeploymentStatus) -> Self {
        Self {
            id,
            original: current,
            candidate: current,
            phase: EditPhase::Editing,
            error: None,
        }
    }

    pub fn is_saving(&self) -> bool {
        self.phase == EditPhase::Saving
    }

    /// Candidate differs from the last-known-good status.
    pub fn is_dirty(&self) -> bool {
        self.candidate != self.original
    }

    /// Move into the saving phase.
    pub fn start_saving(&mut self) {
        self.phase = EditPhase::Saving;
        self.error = None;
    }

    /// Save failed: back to editing with the pre-edit status restored.
    pub fn revert(&mut self, message: impl Into<String>) {
        self.phase = EditPhase::Editing;
        self.candidate = self.original;
        self.error = Some(message.into());
    }
}
