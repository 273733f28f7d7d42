//! File-backed deployment store.
//!
//! Stores each deployment as `{id}/record.json` under
//! `~/.fleet-deploy/deployments/`.

use crate::error::SyncError;
use crate::store::store::check_update;
use crate::store::ResourceStore;
use crate::types::{Deployment, DeploymentId, DeploymentPayload};
use async_trait::async_trait;
use std::path::PathBuf;

/// File-backed implementation of [`ResourceStore`].
///
/// Each deployment is stored as `{deployments_dir}/{id}/record.json`.
pub struct FileResourceStore {
    deployments_dir: PathBuf,
}

impl FileResourceStore {
    /// Create a store using the default directory (`~/.fleet-deploy/deployments`).
    pub async fn new_default() -> Result<Self, SyncError> {
        let home = dirs::home_dir()
            .ok_or_else(|| SyncError::Storage("could not determine home directory".into()))?;
        let deployments_dir = home.join(".fleet-deploy").join("deployments");
        Self::new(deployments_dir).await
    }

    /// Create a store at a custom directory path.
    pub async fn new(deployments_dir: PathBuf) -> Result<Self, SyncError> {
        tokio::fs::create_dir_all(&deployments_dir)
            .await
            .map_err(|e| SyncError::Storage(format!("failed to create deployments dir: {}", e)))?;

        Ok(Self { deployments_dir })
    }

    /// Write `record`, overwriting any record with the same id.
    pub async fn save(&self, record: &Deployment) -> Result<(), SyncError> {
        let dir = self.record_dir(&record.id)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| SyncError::Storage(format!("failed to create record dir: {}", e)))?;

        let content = serde_json::to_string_pretty(record)
            .map_err(|e| SyncError::Storage(format!("failed to serialize record: {}", e)))?;

        tokio::fs::write(dir.join("record.json"), content)
            .await
            .map_err(|e| SyncError::Storage(format!("failed to write record: {}", e)))?;

        Ok(())
    }

    /// Load one record. Returns `None` if not found.
    pub async fn load(&self, id: &DeploymentId) -> Result<Option<Deployment>, SyncError> {
        let path = self.record_dir(id)?.join("record.json");

        if tokio::fs::metadata(&path).await.is_err() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| SyncError::Storage(format!("failed to read record: {}", e)))?;

        let record = serde_json::from_str(&content)
            .map_err(|e| SyncError::Storage(format!("failed to parse record: {}", e)))?;

        Ok(Some(record))
    }

    fn record_dir(&self, id: &DeploymentId) -> Result<PathBuf, SyncError> {
        let raw = id.as_str();
        if raw.is_empty() || raw == "." || raw == ".." || raw.contains(['/', '\\']) {
            return Err(SyncError::InvalidInput(format!(
                "deployment id not usable as a path segment: {:?}",
                raw
            )));
        }
        Ok(self.deployments_dir.join(raw))
    }
}

#[async_trait]
impl ResourceStore for FileResourceStore {
    async fn list(&self) -> Result<Vec<Deployment>, SyncError> {
        let mut records = Vec::new();

        let mut entries = tokio::fs::read_dir(&self.deployments_dir)
            .await
            .map_err(|e| SyncError::Storage(format!("failed to read deployments dir: {}", e)))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SyncError::Storage(format!("failed to read dir entry: {}", e)))?
        {
            let record_path = entry.path().join("record.json");
            let Ok(content) = tokio::fs::read_to_string(&record_path).await else {
                continue;
            };
            match serde_json::from_str::<Deployment>(&content) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(
                    path = %record_path.display(),
                    error = %e,
                    "skipping unreadable deployment record"
                ),
            }
        }

        Ok(records)
    }

    async fn update(
        &self,
        id: &DeploymentId,
        payload: &DeploymentPayload,
    ) -> Result<Deployment, SyncError> {
        let mut record = self
            .load(id)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("deployment {}", id)))?;

        check_update(&record, payload)?;
        payload.apply_to(&mut record);
        self.save(&record).await?;
        Ok(record)
    }

    async fn delete(&self, id: &DeploymentId) -> Result<(), SyncError> {
        let dir = self.record_dir(id)?;
        if tokio::fs::metadata(&dir).await.is_err() {
            return Err(SyncError::NotFound(format!("deployment {}", id)));
        }
        tokio::fs::remove_dir_all(&dir)
            .await
            .map_err(|e| SyncError::Storage(format!("failed to delete record: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeploymentStatus;
    use chrono::{TimeZone, Utc};

    fn make_record(id: u64) -> Deployment {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        Deployment::new(id, format!("deploy-{}", id), DeploymentStatus::Pending, "p1", at)
            .with_project("Platform")
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("fleet-deploy-test-{}", rand::random::<u32>()))
    }

    #[tokio::test]
    async fn test_file_store_lifecycle() {
        let temp_dir = temp_dir();
        let store = FileResourceStore::new(temp_dir.clone()).await.unwrap();

        store.save(&make_record(7)).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, DeploymentId::from(7u64));
        assert_eq!(all[0].project.as_ref().unwrap().name, "Platform");

        let payload = DeploymentPayload::from_record(&all[0]).with_status(DeploymentStatus::Running);
        let updated = store.update(&all[0].id, &payload).await.unwrap();
        assert_eq!(updated.status, DeploymentStatus::Running);

        let reloaded = store.load(&DeploymentId::from(7u64)).await.unwrap().unwrap();
        assert_eq!(reloaded.status, DeploymentStatus::Running);
        assert_eq!(reloaded.project, updated.project);

        store.delete(&DeploymentId::from(7u64)).await.unwrap();
        assert!(store.load(&DeploymentId::from(7u64)).await.unwrap().is_none());

        let err = store.delete(&DeploymentId::from(7u64)).await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));

        let _ = tokio::fs::remove_dir_all(temp_dir).await;
    }

    #[tokio::test]
    async fn test_file_store_update_missing_is_not_found() {
        let temp_dir = temp_dir();
        let store = FileResourceStore::new(temp_dir.clone()).await.unwrap();

        let payload = DeploymentPayload::from_record(&make_record(1));
        let err = store.update(&DeploymentId::from(1u64), &payload).await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));

        let _ = tokio::fs::remove_dir_all(temp_dir).await;
    }

    #[tokio::test]
    async fn test_file_store_list_ignores_bad_files() {
        let temp_dir = temp_dir();
        let store = FileResourceStore::new(temp_dir.clone()).await.unwrap();

        store.save(&make_record(99)).await.unwrap();

        let bad_dir = temp_dir.join("77777");
        tokio::fs::create_dir_all(&bad_dir).await.unwrap();
        tokio::fs::write(bad_dir.join("record.json"), "not valid json")
            .await
            .unwrap();

        let empty_dir = temp_dir.join("88888");
        tokio::fs::create_dir_all(&empty_dir).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, DeploymentId::from(99u64));

        let _ = tokio::fs::remove_dir_all(temp_dir).await;
    }

    #[tokio::test]
    async fn test_file_store_rejects_path_like_ids() {
        let temp_dir = temp_dir();
        let store = FileResourceStore::new(temp_dir.clone()).await.unwrap();

        let err = store.delete(&DeploymentId::from("../etc")).await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidInput(_)));

        let _ = tokio::fs::remove_dir_all(temp_dir).await;
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let temp_dir = temp_dir();

        {
            let store = FileResourceStore::new(temp_dir.clone()).await.unwrap();
            store.save(&make_record(555)).await.unwrap();
        }

        let store2 = FileResourceStore::new(temp_dir.clone()).await.unwrap();
        let loaded = store2.load(&DeploymentId::from(555u64)).await.unwrap();
        assert_eq!(loaded.unwrap().name, "deploy-555");

        let _ = tokio::fs::remove_dir_all(temp_dir).await;
    }
}
