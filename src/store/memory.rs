//! In-process store.
//!
//! Keeps deployments in a `Vec` behind a tokio `RwLock`. Useful for hosts
//! that own their data locally, for demos and for tests.

use crate::error::SyncError;
use crate::store::store::check_update;
use crate::store::ResourceStore;
use crate::types::{Deployment, DeploymentId, DeploymentPayload};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// In-memory implementation of [`ResourceStore`].
#[derive(Debug, Default)]
pub struct MemoryResourceStore {
    records: RwLock<Vec<Deployment>>,
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `records`.
    pub fn with_records(records: Vec<Deployment>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Add a record. Fails with `Conflict` if the id is taken.
    pub async fn insert(&self, record: Deployment) -> Result<(), SyncError> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == record.id) {
            return Err(SyncError::Conflict(format!(
                "deployment {} already exists",
                record.id
            )));
        }
        records.push(record);
        Ok(())
    }

    /// Look up one record.
    pub async fn get(&self, id: &DeploymentId) -> Option<Deployment> {
        self.records.read().await.iter().find(|r| &r.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn list(&self) -> Result<Vec<Deployment>, SyncError> {
        Ok(self.records.read().await.clone())
    }

    async fn update(
        &self,
        id: &DeploymentId,
        payload: &DeploymentPayload,
    ) -> Result<Deployment, SyncError> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| SyncError::NotFound(format!("deployment {}", id)))?;

        check_update(record, payload)?;
        payload.apply_to(record);
        Ok(record.clone())
    }

    async fn delete(&self, id: &DeploymentId) -> Result<(), SyncError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| &r.id != id);
        if records.len() == before {
            return Err(SyncError::NotFound(format!("deployment {}", id)));
        }
        Ok(())
    }
}
