//! Minimal domain types for the deployment list.
//!
//! These are the types the list engine needs. Nothing more. Projects and
//! engineers only appear as the joined references a store returns with
//! each deployment; the engine never edits them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SyncError;

/// Opaque deployment identifier. Backends hand out strings or numbers;
/// both are held as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeploymentId(String);

impl DeploymentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeploymentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DeploymentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for DeploymentId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// Parent project identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl From<&str> for ProjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Assigned engineer identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineerId(pub String);

impl From<&str> for EngineerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Deployment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl DeploymentStatus {
    pub const ALL: [DeploymentStatus; 4] = [
        DeploymentStatus::Pending,
        DeploymentStatus::Running,
        DeploymentStatus::Completed,
        DeploymentStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::Running => "running",
            DeploymentStatus::Completed => "completed",
            DeploymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentStatus {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SyncError::InvalidInput(format!("unknown deployment status: {}", s)))
    }
}

/// Parent project as joined onto a deployment by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: ProjectId,
    pub name: String,
}

/// Assigned engineer as joined onto a deployment by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineerRef {
    pub id: EngineerId,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
}

impl EngineerRef {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A deployment as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: DeploymentId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub services: String,
    pub status: DeploymentStatus,
    pub project_id: ProjectId,
    #[serde(default)]
    pub engineer_id: Option<EngineerId>,
    pub deployed_at: DateTime<Utc>,

    // Read-only joins, never sent back on update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engineer: Option<EngineerRef>,
}

impl Deployment {
    /// Create a deployment with empty free-text fields.
    pub fn new(
        id: impl Into<DeploymentId>,
        name: impl Into<String>,
        status: DeploymentStatus,
        project_id: impl Into<ProjectId>,
        deployed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            services: String::new(),
            status,
            project_id: project_id.into(),
            engineer_id: None,
            deployed_at,
            project: None,
            engineer: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_services(mut self, services: impl Into<String>) -> Self {
        self.services = services.into();
        self
    }

    /// Attach the parent project join.
    pub fn with_project(mut self, name: impl Into<String>) -> Self {
        self.project = Some(ProjectRef {
            id: self.project_id.clone(),
            name: name.into(),
        });
        self
    }

    /// Assign an engineer, setting both the foreign key and the join.
    pub fn with_engineer(mut self, engineer: EngineerRef) -> Self {
        self.engineer_id = Some(engineer.id.clone());
        self.engineer = Some(engineer);
        self
    }
}

/// Full-record update body.
///
/// Stores are not assumed to support partial updates, so every writable
/// field is resent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentPayload {
    pub name: String,
    pub description: String,
    pub services: String,
    pub status: DeploymentStatus,
    pub project_id: ProjectId,
    pub engineer_id: Option<EngineerId>,
    pub deployed_at: DateTime<Utc>,
}

impl DeploymentPayload {
    pub fn from_record(record: &Deployment) -> Self {
        Self {
            name: record.name.clone(),
            description: record.description.clone(),
            services: record.services.clone(),
            status: record.status,
            project_id: record.project_id.clone(),
            engineer_id: record.engineer_id.clone(),
            deployed_at: record.deployed_at,
        }
    }

    pub fn with_status(mut self, status: DeploymentStatus) -> Self {
        self.status = status;
        self
    }

    /// Apply the payload to a stored record, keeping its id and joins.
    pub fn apply_to(&self, record: &mut Deployment) {
        record.name = self.name.clone();
        record.description = self.description.clone();
        record.services = self.services.clone();
        record.status = self.status;
        record.deployed_at = self.deployed_at;
    }
}
