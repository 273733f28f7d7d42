//! Search and field filters over the fetched deployment set.

use serde::{Deserialize, Serialize};

use crate::types::{Deployment, DeploymentStatus, ProjectId};

/// Active filters of the list view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Free-text query, matched case-insensitively.
    pub query: String,
    pub status: Option<DeploymentStatus>,
    pub project: Option<ProjectId>,
}

impl FilterState {
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_status(mut self, status: DeploymentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_project(mut self, project: impl Into<ProjectId>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// No predicate is active.
    pub fn is_empty(&self) -> bool {
        self.query.trim().is_empty() && self.status.is_none() && self.project.is_none()
    }

    /// Whether `record` satisfies every active predicate.
    pub fn matches(&self, record: &Deployment) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(project) = &self.project {
            if &record.project_id != project {
                return false;
            }
        }
        matches_query(record, &self.query)
    }
}

/// Apply `filter` to `records`, newest deployment first.
///
/// Ties on `deployed_at` keep their input order.
pub fn filter_deployments<'a>(records: &'a [Deployment], filter: &FilterState) -> Vec<&'a Deployment> {
    let mut matched: Vec<&Deployment> = records.iter().filter(|r| filter.matches(r)).collect();
    matched.sort_by(|a, b| b.deployed_at.cmp(&a.deployed_at));
    matched
}

fn matches_query(record: &Deployment, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    searchable_fields(record)
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

// Order matters only for readability; any hit is a match.
fn searchable_fields(record: &Deployment) -> Vec<String> {
    let mut fields = vec![
        record.name.clone(),
        record.description.clone(),
        record.id.to_string(),
    ];
    if let Some(project) = &record.project {
        fields.push(project.name.clone());
    }
    if let Some(engineer) = &record.engineer {
        fields.push(engineer.full_name());
        fields.push(engineer.first_name.clone());
        fields.push(engineer.last_name.clone());
        fields.push(engineer.username.clone());
    }
    fields
}
