//! Deployment models

use std::fmt;

/// Identifier of an accepted deployment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeployId(String);

impl DeployId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeployId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Optional switches sent with a start request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeploymentFlags {
    /// Run the deployment even if nothing changed
    pub force_run: bool,

    /// Rebuild images even if the source did not change
    pub force_build: bool,
}

/// Status of a remote deployment, decoded once from the API text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentStatus {
    Pending,
    Running,
    Successful,

    /// Anything else the service reports, kept verbatim for diagnostics
    Failed(String),
}

impl DeploymentStatus {
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "pending" => DeploymentStatus::Pending,
            "running" => DeploymentStatus::Running,
            "successful" => DeploymentStatus::Successful,
            other => DeploymentStatus::Failed(other.to_string()),
        }
    }

    /// Whether polling should stop on this status
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeploymentStatus::Pending | DeploymentStatus::Running)
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentStatus::Pending => f.write_str("pending"),
            DeploymentStatus::Running => f.write_str("running"),
            DeploymentStatus::Successful => f.write_str("successful"),
            DeploymentStatus::Failed(raw) => f.write_str(raw),
        }
    }
}

/// Result of one deployment attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentOutcome {
    /// The service reported `successful`
    Success { deploy_id: DeployId, polls: u32 },

    /// Another deployment was already in flight (HTTP 409)
    Rejected { deploy_id: Option<DeployId>, polls: u32 },

    /// The service reported a terminal status other than `successful`
    Failed {
        deploy_id: DeployId,
        status: String,
        polls: u32,
    },
}

impl DeploymentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeploymentOutcome::Success { .. })
    }

    /// Number of status polls issued
    pub fn polls(&self) -> u32 {
        match self {
            DeploymentOutcome::Success { polls, .. }
            | DeploymentOutcome::Rejected { polls, .. }
            | DeploymentOutcome::Failed { polls, .. } => *polls,
        }
    }
}

impl fmt::Display for DeploymentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentOutcome::Success { deploy_id, .. } => {
                write!(f, "deployment {} successful", deploy_id)
            }
            DeploymentOutcome::Rejected { deploy_id: None, .. } => {
                f.write_str("not started, another deployment is in progress")
            }
            DeploymentOutcome::Rejected {
                deploy_id: Some(id),
                ..
            } => write!(f, "deployment {} rejected while polling", id),
            DeploymentOutcome::Failed {
                deploy_id, status, ..
            } => write!(f, "deployment {} failed with status '{}'", deploy_id, status),
        }
    }
}
