//! [`ResourceStore`] trait definition.

use crate::error::SyncError;
use crate::types::{Deployment, DeploymentId, DeploymentPayload};
use async_trait::async_trait;

/// The remote-backed deployment collection the list engine reads from and
/// writes back to.
///
/// Transport, auth headers and timeouts are the implementation's business.
/// Failures must be mapped onto [`SyncError`]; HTTP-backed stores should
/// use [`SyncError::from_status`].
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Fetch every deployment in scope.
    async fn list(&self) -> Result<Vec<Deployment>, SyncError>;

    /// Replace the writable fields of `id` with `payload`. Returns the
    /// stored record as the backend sees it after the write.
    async fn update(
        &self,
        id: &DeploymentId,
        payload: &DeploymentPayload,
    ) -> Result<Deployment, SyncError>;

    /// Delete `id`. Deleting a missing record is `SyncError::NotFound`.
    async fn delete(&self, id: &DeploymentId) -> Result<(), SyncError>;
}

/// Rules every bundled store enforces on a full-record update.
pub(crate) fn check_update(
    existing: &Deployment,
    payload: &DeploymentPayload,
) -> Result<(), SyncError> {
    if payload.name.trim().is_empty() {
        return Err(SyncError::Validation {
            detail: Some("name must not be empty".into()),
        });
    }
    if payload.project_id != existing.project_id {
        return Err(SyncError::Validation {
            detail: Some("project_id cannot be changed".into()),
        });
    }
    if payload.engineer_id != existing.engineer_id {
        return Err(SyncError::Validation {
            detail: Some("engineer_id cannot be changed".into()),
        });
    }
    Ok(())
}
