//! Finite State Machine for one deployment attempt

use crate::errors::DeployerError;
use crate::models::deployment::{DeployId, DeploymentStatus};

/// Deployment state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentState {
    /// Token resolved, nothing sent yet
    NotStarted,

    /// Start request in flight
    Starting,

    /// Accepted by the service, polling
    InProgress,

    /// Another deployment was in flight (409)
    Rejected,

    /// Service reported `successful`
    Success,

    /// Terminal failure status or fatal error
    Failure,
}

impl DeploymentState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeploymentState::Rejected | DeploymentState::Success | DeploymentState::Failure
        )
    }
}

/// Deployment event
#[derive(Debug, Clone)]
pub enum DeploymentEvent {
    /// Start request issued
    Start,

    /// Start request accepted
    Accepted(DeployId),

    /// HTTP 409 from start or poll
    Conflict,

    /// Status observed by a poll
    Status(DeploymentStatus),

    /// Transport, API or timeout error
    Error(String),
}

/// Deployment FSM
#[derive(Debug, Clone)]
pub struct DeploymentFsm {
    state: DeploymentState,
    deploy_id: Option<DeployId>,
    last_status: Option<DeploymentStatus>,
    error: Option<String>,
    polls: u32,
}

impl DeploymentFsm {
    /// Create a new FSM in the not-started state
    pub fn new() -> Self {
        Self {
            state: DeploymentState::NotStarted,
            deploy_id: None,
            last_status: None,
            error: None,
            polls: 0,
        }
    }

    /// Get current state
    pub fn state(&self) -> &DeploymentState {
        &self.state
    }

    /// Deploy id once accepted
    pub fn deploy_id(&self) -> Option<&DeployId> {
        self.deploy_id.as_ref()
    }

    /// Last status observed while polling
    pub fn last_status(&self) -> Option<&DeploymentStatus> {
        self.last_status.as_ref()
    }

    /// Get error message if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Number of statuses observed
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: DeploymentEvent) -> Result<(), DeployerError> {
        let new_state = match (&self.state, event) {
            (DeploymentState::NotStarted, DeploymentEvent::Start) => DeploymentState::Starting,

            // From Starting
            (DeploymentState::Starting, DeploymentEvent::Accepted(id)) => {
                self.deploy_id = Some(id);
                DeploymentState::InProgress
            }
            (DeploymentState::Starting, DeploymentEvent::Conflict) => DeploymentState::Rejected,
            (DeploymentState::Starting, DeploymentEvent::Error(err)) => {
                self.error = Some(err);
                DeploymentState::Failure
            }

            // From InProgress
            (DeploymentState::InProgress, DeploymentEvent::Status(status)) => {
                self.polls += 1;
                let next = match &status {
                    DeploymentStatus::Pending | DeploymentStatus::Running => {
                        DeploymentState::InProgress
                    }
                    DeploymentStatus::Successful => DeploymentState::Success,
                    DeploymentStatus::Failed(_) => DeploymentState::Failure,
                };
                self.last_status = Some(status);
                next
            }
            (DeploymentState::InProgress, DeploymentEvent::Conflict) => DeploymentState::Rejected,
            (DeploymentState::InProgress, DeploymentEvent::Error(err)) => {
                self.error = Some(err);
                DeploymentState::Failure
            }

            // Invalid transitions
            (state, event) => {
                return Err(DeployerError::InvalidTransition(format!(
                    "{:?} -> {:?}",
                    state, event
                )));
            }
        };

        self.state = new_state;
        Ok(())
    }
}

impl Default for DeploymentFsm {
    fn default() -> Self {
        Self::new()
    }
}
