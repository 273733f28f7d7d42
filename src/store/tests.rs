use super::*;
use crate::error::SyncError;
use crate::types::{
    Deployment, DeploymentId, DeploymentPayload, DeploymentStatus, EngineerId, EngineerRef,
};
use chrono::{TimeZone, Utc};

fn make_record(id: &str, status: DeploymentStatus) -> Deployment {
    let at = Utc.with_ymd_and_hms(2024, 2, 10, 9, 30, 0).unwrap();
    Deployment::new(id, format!("svc-{}", id), status, "p1", at)
        .with_description("payments edge")
        .with_project("Payments")
}

#[tokio::test]
async fn test_memory_store_update_keeps_joins() {
    let store = MemoryResourceStore::with_records(vec![make_record("a", DeploymentStatus::Running)]);
    let id = DeploymentId::from("a");
    let current = store.get(&id).await.unwrap();

    let payload = DeploymentPayload::from_record(&current).with_status(DeploymentStatus::Completed);
    let updated = store.update(&id, &payload).await.unwrap();

    assert_eq!(updated.status, DeploymentStatus::Completed);
    assert_eq!(updated.description, "payments edge");
    assert_eq!(updated.project.as_ref().unwrap().name, "Payments");
    assert_eq!(store.get(&id).await.unwrap(), updated);
}

#[tokio::test]
async fn test_memory_store_rejects_empty_name() {
    let store = MemoryResourceStore::with_records(vec![make_record("a", DeploymentStatus::Pending)]);
    let id = DeploymentId::from("a");
    let mut payload = DeploymentPayload::from_record(&store.get(&id).await.unwrap());
    payload.name = "  ".into();

    let err = store.update(&id, &payload).await.unwrap_err();
    assert_eq!(err.user_message(), "name must not be empty");
    assert_eq!(store.get(&id).await.unwrap().name, "svc-a");
}

#[tokio::test]
async fn test_memory_store_foreign_keys_are_immutable() {
    let store = MemoryResourceStore::with_records(vec![make_record("a", DeploymentStatus::Pending)]);
    let id = DeploymentId::from("a");
    let current = store.get(&id).await.unwrap();

    let mut payload = DeploymentPayload::from_record(&current);
    payload.project_id = "p2".into();
    assert!(matches!(
        store.update(&id, &payload).await,
        Err(SyncError::Validation { .. })
    ));

    let mut payload = DeploymentPayload::from_record(&current);
    payload.engineer_id = Some(EngineerId::from("e1"));
    assert!(matches!(
        store.update(&id, &payload).await,
        Err(SyncError::Validation { .. })
    ));
}

#[tokio::test]
async fn test_memory_store_delete_missing_is_not_found() {
    let store = MemoryResourceStore::with_records(vec![make_record("a", DeploymentStatus::Failed)]);

    store.delete(&DeploymentId::from("a")).await.unwrap();
    assert!(store.is_empty().await);

    let err = store.delete(&DeploymentId::from("a")).await.unwrap_err();
    assert!(matches!(err, SyncError::NotFound(_)));
}

#[tokio::test]
async fn test_memory_store_insert_duplicate_conflicts() {
    let store = MemoryResourceStore::new();
    let engineer = EngineerRef {
        id: EngineerId::from("e1"),
        first_name: "Linus".into(),
        last_name: "T".into(),
        username: "lt".into(),
    };
    store
        .insert(make_record("a", DeploymentStatus::Pending).with_engineer(engineer))
        .await
        .unwrap();

    let err = store
        .insert(make_record("a", DeploymentStatus::Running))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Conflict(_)));
    assert_eq!(store.len().await, 1);
    assert_eq!(store.list().await.unwrap()[0].engineer_id, Some(EngineerId::from("e1")));
}
