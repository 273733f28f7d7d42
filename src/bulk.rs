//! Bulk Operation Coordinator
//!
//! Deletes a batch of deployments one request per id, never stopping at
//! the first failure. Outcomes are folded into a [`BulkOperationResult`]
//! in the order the ids were given.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::context::Notice;
use crate::error::SyncError;
use crate::store::ResourceStore;
use crate::types::DeploymentId;

/// How the coordinator issues its requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BulkMode {
    /// One request at a time, in selection order.
    #[default]
    Sequential,
    /// Up to `limit` requests in flight. Results are still reported in
    /// selection order.
    Concurrent { limit: usize },
}

/// One id the store refused to delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedItem {
    pub id: DeploymentId,
    pub reason: String,
}

/// Aggregate of one bulk invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOperationResult {
    pub success_count: usize,
    pub error_count: usize,
    /// Diagnostic detail. Logged, never shown to the user.
    pub failed_items: Vec<FailedItem>,
}

impl BulkOperationResult {
    pub fn total(&self) -> usize {
        self.success_count + self.error_count
    }

    pub fn record_success(&mut self) {
        self.success_count += 1;
    }

    pub fn record_failure(&mut self, id: DeploymentId, reason: impl Into<String>) {
        self.error_count += 1;
        self.failed_items.push(FailedItem {
            id,
            reason: reason.into(),
        });
    }

    /// At most one success and one error summary, counts only.
    pub fn summary_notices(&self) -> Vec<Notice> {
        let mut notices = Vec::new();
        if self.success_count > 0 {
            notices.push(Notice::success(format!(
                "Deleted {} {}",
                self.success_count,
                plural(self.success_count)
            )));
        }
        if self.error_count > 0 {
            notices.push(Notice::error(format!(
                "Failed to delete {} {}",
                self.error_count,
                plural(self.error_count)
            )));
        }
        notices
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        "deployment"
    } else {
        "deployments"
    }
}

/// Runs destructive operations over a batch of ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct BulkCoordinator {
    mode: BulkMode,
}

impl BulkCoordinator {
    pub fn new(mode: BulkMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> BulkMode {
        self.mode
    }

    /// Delete every id in `ids`, continuing past individual failures.
    pub async fn delete_all<S>(&self, store: &S, ids: &[DeploymentId]) -> BulkOperationResult
    where
        S: ResourceStore + ?Sized,
    {
        self.delete_listed(store, ids, |_| true).await
    }

    /// Like [`delete_all`](Self::delete_all), but ids for which `listed`
    /// is false are never sent and count as failures. Repeated ids are
    /// attempted once. Outcomes follow the order of first appearance.
    pub async fn delete_listed<S, F>(
        &self,
        store: &S,
        ids: &[DeploymentId],
        listed: F,
    ) -> BulkOperationResult
    where
        S: ResourceStore + ?Sized,
        F: Fn(&DeploymentId) -> bool,
    {
        let unique = unique_in_order(ids);

        let outcomes: Vec<(&DeploymentId, Result<(), String>)> = match self.mode {
            BulkMode::Sequential => {
                let mut outcomes = Vec::with_capacity(unique.len());
                for id in unique {
                    outcomes.push((id, delete_one(store, id, listed(id)).await));
                }
                outcomes
            }
            BulkMode::Concurrent { limit } => {
                stream::iter(unique)
                    .map(|id| {
                        let known = listed(id);
                        async move { (id, delete_one(store, id, known).await) }
                    })
                    .buffered(limit.max(1))
                    .collect()
                    .await
            }
        };

        let mut result = BulkOperationResult::default();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => result.record_success(),
                Err(reason) => result.record_failure(id.clone(), reason),
            }
        }

        tracing::info!(
            mode = ?self.mode,
            succeeded = result.success_count,
            failed = result.error_count,
            "bulk delete finished"
        );
        result
    }
}

const NOT_LISTED: &str = "not present in the current list";

async fn delete_one<S>(store: &S, id: &DeploymentId, listed: bool) -> Result<(), String>
where
    S: ResourceStore + ?Sized,
{
    if !listed {
        tracing::warn!(id = %id, "bulk delete skipped id missing from the list");
        return Err(NOT_LISTED.to_string());
    }
    store.delete(id).await.map_err(|err: SyncError| {
        tracing::warn!(id = %id, error = %err, "bulk delete item failed");
        err.to_string()
    })
}

fn unique_in_order(ids: &[DeploymentId]) -> Vec<&DeploymentId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().filter(|id| seen.insert(*id)).collect()
}
