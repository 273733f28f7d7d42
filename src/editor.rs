//! Status Transition Editor
//!
//! Drives the per-row status drafts defined in [`crate::state`]. It never
//! writes into a record it was handed: the optimistic value is the draft,
//! and the store's answer only becomes visible after the view re-fetches.
//!
//! The save is split into [`StatusEditor::begin_save`] and
//! [`StatusEditor::finish_save`] so a host can run the request without
//! holding a lock on the view. [`StatusEditor::confirm`] glues the two
//! together for the simple case.

use std::collections::HashMap;

use crate::error::SyncError;
use crate::state::{EditPhase, StatusDraft};
use crate::store::ResourceStore;
use crate::types::{Deployment, DeploymentId, DeploymentPayload, DeploymentStatus};

/// What confirming an edit requires.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmAction {
    /// Candidate equals the current status. Editor closed, nothing to send.
    Unchanged,
    /// Send this update, then call `finish_save`.
    Save(SaveTicket),
}

/// An update request the editor has committed to.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveTicket {
    pub id: DeploymentId,
    pub from: DeploymentStatus,
    pub to: DeploymentStatus,
    pub payload: DeploymentPayload,
}

/// How a confirmed edit ended.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// No request was issued.
    Unchanged,
    /// The store accepted the update. The list must be re-fetched.
    Saved,
    /// The store refused. The draft is open again at its original status.
    Reverted(SyncError),
}

/// All open status drafts of a view, keyed by deployment.
#[derive(Debug, Default)]
pub struct StatusEditor {
    drafts: HashMap<DeploymentId, StatusDraft>,
}

impl StatusEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the editor for `record`, seeding the candidate with its status.
    ///
    /// Re-opening an already open editor keeps its candidate. Rejected while
    /// a save for the same record is in flight.
    pub fn begin(&mut self, record: &Deployment) -> Result<(), SyncError> {
        match self.drafts.get(&record.id) {
            Some(draft) if draft.is_saving() => Err(SyncError::SaveInProgress(record.id.clone())),
            Some(_) => Ok(()),
            None => {
                tracing::debug!(id = %record.id, status = %record.status, "status editor opened");
                self.drafts
                    .insert(record.id.clone(), StatusDraft::open(record.id.clone(), record.status));
                Ok(())
            }
        }
    }

    /// Pick a different candidate. Local only.
    pub fn choose(&mut self, id: &DeploymentId, candidate: DeploymentStatus) -> Result<(), SyncError> {
        let draft = self.editing_draft_mut(id)?;
        draft.candidate = candidate;
        Ok(())
    }

    /// Close the editor and drop the candidate. Returns whether an editor
    /// was open. A save already in flight cannot be cancelled.
    pub fn cancel(&mut self, id: &DeploymentId) -> Result<bool, SyncError> {
        match self.drafts.get(id) {
            Some(draft) if draft.is_saving() => Err(SyncError::SaveInProgress(id.clone())),
            Some(_) => {
                self.drafts.remove(id);
                tracing::debug!(id = %id, "status edit cancelled");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// First half of a confirm: decide whether a request is needed and, if
    /// so, move the draft into `Saving` and hand back the full payload.
    ///
    /// `record` is the last fetched copy; every field but `status` is sent
    /// back unchanged.
    pub fn begin_save(&mut self, record: &Deployment) -> Result<ConfirmAction, SyncError> {
        let draft = self.editing_draft_mut(&record.id)?;

        if draft.candidate == record.status {
            self.drafts.remove(&record.id);
            tracing::debug!(id = %record.id, "status unchanged, no request issued");
            return Ok(ConfirmAction::Unchanged);
        }

        draft.start_saving();
        let ticket = SaveTicket {
            id: record.id.clone(),
            from: record.status,
            to: draft.candidate,
            payload: DeploymentPayload::from_record(record).with_status(draft.candidate),
        };
        Ok(ConfirmAction::Save(ticket))
    }

    /// Second half of a confirm: apply the store's answer.
    pub fn finish_save(
        &mut self,
        ticket: &SaveTicket,
        result: Result<Deployment, SyncError>,
    ) -> EditOutcome {
        match result {
            Ok(_) => {
                self.drafts.remove(&ticket.id);
                tracing::info!(
                    id = %ticket.id,
                    from = %ticket.from,
                    to = %ticket.to,
                    "deployment status saved"
                );
                EditOutcome::Saved
            }
            Err(err) => {
                if let Some(draft) = self.drafts.get_mut(&ticket.id) {
                    draft.revert(err.user_message());
                }
                tracing::warn!(
                    id = %ticket.id,
                    from = %ticket.from,
                    to = %ticket.to,
                    error = %err,
                    "deployment status save failed, reverted"
                );
                EditOutcome::Reverted(err)
            }
        }
    }

    /// A save that was never sent: back to `Editing` with the candidate
    /// kept. Returns whether a saving draft was found.
    pub fn abandon_save(&mut self, ticket: &SaveTicket) -> bool {
        match self.drafts.get_mut(&ticket.id) {
            Some(draft) if draft.is_saving() => {
                draft.phase = EditPhase::Editing;
                tracing::debug!(id = %ticket.id, "status save abandoned");
                true
            }
            _ => false,
        }
    }

    /// Confirm the open edit for `record` against `store`.
    pub async fn confirm<S>(&mut self, store: &S, record: &Deployment) -> Result<EditOutcome, SyncError>
    where
        S: ResourceStore + ?Sized,
    {
        let ticket = match self.begin_save(record)? {
            ConfirmAction::Unchanged => return Ok(EditOutcome::Unchanged),
            ConfirmAction::Save(ticket) => ticket,
        };
        let result = store.update(&ticket.id, &ticket.payload).await;
        Ok(self.finish_save(&ticket, result))
    }

    /// Phase of the control for `id`.
    pub fn phase(&self, id: &DeploymentId) -> EditPhase {
        self.drafts
            .get(id)
            .map(|d| d.phase)
            .unwrap_or(EditPhase::Viewing)
    }

    pub fn draft(&self, id: &DeploymentId) -> Option<&StatusDraft> {
        self.drafts.get(id)
    }

    /// Status to show for `record`: the draft's candidate while a draft
    /// exists, otherwise the fetched value.
    pub fn displayed_status(&self, record: &Deployment) -> DeploymentStatus {
        self.drafts
            .get(&record.id)
            .map(|d| d.candidate)
            .unwrap_or(record.status)
    }

    /// Drop drafts invalidated by freshly fetched records: the record is
    /// gone, or its status changed under the open editor. Drafts that are
    /// saving are kept; `finish_save` owns them.
    pub fn reconcile(&mut self, records: &[Deployment]) -> usize {
        let current: HashMap<&DeploymentId, DeploymentStatus> =
            records.iter().map(|r| (&r.id, r.status)).collect();
        let before = self.drafts.len();
        self.drafts.retain(|id, draft| {
            draft.is_saving() || current.get(id).is_some_and(|status| *status == draft.original)
        });
        before - self.drafts.len()
    }

    /// Drop every draft not currently saving.
    pub fn clear(&mut self) {
        self.drafts.retain(|_, draft| draft.is_saving());
    }

    pub fn is_saving(&self, id: &DeploymentId) -> bool {
        self.phase(id) == EditPhase::Saving
    }

    fn editing_draft_mut(&mut self, id: &DeploymentId) -> Result<&mut StatusDraft, SyncError> {
        match self.drafts.get_mut(id) {
            None => Err(SyncError::InvalidState(format!(
                "no status editor open for deployment {}",
                id
            ))),
            Some(draft) if draft.is_saving() => Err(SyncError::SaveInProgress(id.clone())),
            Some(draft) => Ok(draft),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryResourceStore;
    use chrono::{TimeZone, Utc};

    fn record(status: DeploymentStatus) -> Deployment {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        Deployment::new("d1", "gateway", status, "p1", at).with_services("nginx")
    }

    #[test]
    fn test_confirm_same_status_issues_nothing() {
        let mut editor = StatusEditor::new();
        let rec = record(DeploymentStatus::Running);
        editor.begin(&rec).unwrap();
        editor.choose(&rec.id, DeploymentStatus::Failed).unwrap();
        editor.choose(&rec.id, DeploymentStatus::Running).unwrap();

        assert_eq!(editor.begin_save(&rec).unwrap(), ConfirmAction::Unchanged);
        assert_eq!(editor.phase(&rec.id), EditPhase::Viewing);
    }

    #[test]
    fn test_begin_save_builds_full_payload() {
        let mut editor = StatusEditor::new();
        let rec = record(DeploymentStatus::Running);
        editor.begin(&rec).unwrap();
        editor.choose(&rec.id, DeploymentStatus::Completed).unwrap();

        let ConfirmAction::Save(ticket) = editor.begin_save(&rec).unwrap() else {
            panic!("expected a save");
        };
        assert_eq!(ticket.payload.status, DeploymentStatus::Completed);
        assert_eq!(ticket.payload.services, "nginx");
        assert_eq!(ticket.payload.name, "gateway");
        assert_eq!(editor.phase(&rec.id), EditPhase::Saving);
    }

    #[test]
    fn test_saving_refuses_reentry_and_cancel() {
        let mut editor = StatusEditor::new();
        let rec = record(DeploymentStatus::Pending);
        editor.begin(&rec).unwrap();
        editor.choose(&rec.id, DeploymentStatus::Running).unwrap();
        let _ = editor.begin_save(&rec).unwrap();

        assert!(matches!(editor.begin(&rec), Err(SyncError::SaveInProgress(_))));
        assert!(matches!(
            editor.choose(&rec.id, DeploymentStatus::Failed),
            Err(SyncError::SaveInProgress(_))
        ));
        assert!(matches!(editor.cancel(&rec.id), Err(SyncError::SaveInProgress(_))));
        assert!(matches!(editor.begin_save(&rec), Err(SyncError::SaveInProgress(_))));
    }

    #[test]
    fn test_failed_save_reverts_to_original() {
        let mut editor = StatusEditor::new();
        let rec = record(DeploymentStatus::Running);
        editor.begin(&rec).unwrap();
        editor.choose(&rec.id, DeploymentStatus::Completed).unwrap();
        let ConfirmAction::Save(ticket) = editor.begin_save(&rec).unwrap() else {
            panic!("expected a save");
        };

        let outcome = editor.finish_save(&ticket, Err(SyncError::Conflict("locked".into())));
        assert!(matches!(outcome, EditOutcome::Reverted(SyncError::Conflict(_))));
        assert_eq!(editor.phase(&rec.id), EditPhase::Editing);
        assert_eq!(editor.displayed_status(&rec), DeploymentStatus::Running);
        assert!(editor.draft(&rec.id).unwrap().error.is_some());

        // Still open for retry or cancel.
        assert!(editor.cancel(&rec.id).unwrap());
        assert_eq!(editor.phase(&rec.id), EditPhase::Viewing);
    }

    #[test]
    fn test_cancel_without_editor_is_noop() {
        let mut editor = StatusEditor::new();
        assert!(!editor.cancel(&DeploymentId::from("nope")).unwrap());
        assert!(editor.choose(&DeploymentId::from("nope"), DeploymentStatus::Failed).is_err());
    }

    #[test]
    fn test_reconcile_drops_drafts_on_external_change() {
        let mut editor = StatusEditor::new();
        let rec = record(DeploymentStatus::Pending);
        editor.begin(&rec).unwrap();
        editor.choose(&rec.id, DeploymentStatus::Running).unwrap();

        assert_eq!(editor.reconcile(std::slice::from_ref(&rec)), 0);
        assert_eq!(editor.phase(&rec.id), EditPhase::Editing);

        let changed = record(DeploymentStatus::Failed);
        assert_eq!(editor.reconcile(&[changed]), 1);
        assert_eq!(editor.phase(&rec.id), EditPhase::Viewing);
    }

    #[tokio::test]
    async fn test_confirm_against_store() {
        let rec = record(DeploymentStatus::Pending);
        let store = MemoryResourceStore::with_records(vec![rec.clone()]);
        let mut editor = StatusEditor::new();

        editor.begin(&rec).unwrap();
        editor.choose(&rec.id, DeploymentStatus::Running).unwrap();
        let outcome = editor.confirm(&store, &rec).await.unwrap();

        assert_eq!(outcome, EditOutcome::Saved);
        assert_eq!(editor.phase(&rec.id), EditPhase::Viewing);
        assert_eq!(store.get(&rec.id).await.unwrap().status, DeploymentStatus::Running);
        // The handed-in copy is untouched until a refresh.
        assert_eq!(rec.status, DeploymentStatus::Pending);
    }

    #[test]
    fn test_abandoned_save_reopens_editor() {
        let mut editor = StatusEditor::new();
        let rec = record(DeploymentStatus::Pending);
        editor.begin(&rec).unwrap();
        editor.choose(&rec.id, DeploymentStatus::Failed).unwrap();
        let ConfirmAction::Save(ticket) = editor.begin_save(&rec).unwrap() else {
            panic!("expected a save");
        };

        assert!(editor.abandon_save(&ticket));
        assert_eq!(editor.phase(&rec.id), EditPhase::Editing);
        assert_eq!(editor.displayed_status(&rec), DeploymentStatus::Failed);
        assert!(editor.cancel(&rec.id).unwrap());
        assert!(!editor.abandon_save(&ticket));
    }
}
