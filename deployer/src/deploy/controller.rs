//! Deployment lifecycle controller
//!
//! Drives one deployment attempt of one tool: start, poll until the service
//! reports a terminal status, and translate the result into a
//! [`DeploymentOutcome`]. HTTP 409 is the only API error absorbed here; every
//! other error is returned to the caller because the remote state is unknown.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::authn::deploy_token::DeployToken;
use crate::deploy::clock::Clock;
use crate::deploy::fsm::{DeploymentEvent, DeploymentFsm};
use crate::errors::DeployerError;
use crate::http::deployments::DeploymentApi;
use crate::models::deployment::{DeployId, DeploymentFlags, DeploymentOutcome, DeploymentStatus};
use crate::models::tool::ToolName;

/// Poll loop settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay between status polls
    pub interval: Duration,

    /// Give up after this many non-terminal polls
    ///
    /// At least one poll is always made, so `Some(0)` behaves like `Some(1)`.
    pub max_attempts: Option<u32>,

    /// Give up once this much time passed since the deployment was accepted
    pub timeout: Option<Duration>,
}

impl PollSettings {
    /// Poll forever at the given interval
    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            timeout: None,
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: None,
            timeout: Some(Duration::from_secs(3600)),
        }
    }
}

/// Deployment controller
pub struct DeploymentController<'a, A: DeploymentApi, C: Clock> {
    api: &'a A,
    clock: &'a C,
    settings: PollSettings,
}

impl<'a, A: DeploymentApi, C: Clock> DeploymentController<'a, A, C> {
    pub fn new(api: &'a A, clock: &'a C, settings: PollSettings) -> Self {
        Self {
            api,
            clock,
            settings,
        }
    }

    /// Run one deployment attempt for `tool`
    pub async fn run_deployment(
        &self,
        tool: &ToolName,
        token: &DeployToken,
        flags: DeploymentFlags,
    ) -> Result<DeploymentOutcome, DeployerError> {
        let mut fsm = DeploymentFsm::new();
        fsm.process(DeploymentEvent::Start)?;

        info!(
            "Starting deployment of {} (force_run={}, force_build={})",
            tool, flags.force_run, flags.force_build
        );

        let deploy_id = match self.api.start_deployment(tool, token, flags).await {
            Ok(id) => id,
            Err(e) if e.is_conflict() => {
                fsm.process(DeploymentEvent::Conflict)?;
                warn!("Deployment of {} not started, another one is in progress", tool);
                return Ok(DeploymentOutcome::Rejected {
                    deploy_id: None,
                    polls: 0,
                });
            }
            Err(e) => {
                fsm.process(DeploymentEvent::Error(e.to_string()))?;
                error!("Failed to start deployment of {}: {}", tool, e);
                return Err(e);
            }
        };

        fsm.process(DeploymentEvent::Accepted(deploy_id.clone()))?;
        info!("Deployment {} of {} accepted", deploy_id, tool);

        self.poll(tool, token, deploy_id, &mut fsm).await
    }

    async fn poll(
        &self,
        tool: &ToolName,
        token: &DeployToken,
        deploy_id: DeployId,
        fsm: &mut DeploymentFsm,
    ) -> Result<DeploymentOutcome, DeployerError> {
        let accepted_at = self.clock.now();

        loop {
            let status = match self.api.deployment_status(tool, token, &deploy_id).await {
                Ok(status) => status,
                Err(e) if e.is_conflict() => {
                    fsm.process(DeploymentEvent::Conflict)?;
                    warn!("Deployment {} of {} rejected while polling", deploy_id, tool);
                    return Ok(DeploymentOutcome::Rejected {
                        deploy_id: Some(deploy_id),
                        polls: fsm.polls() + 1,
                    });
                }
                Err(e) => {
                    fsm.process(DeploymentEvent::Error(e.to_string()))?;
                    error!("Failed to poll deployment {} of {}: {}", deploy_id, tool, e);
                    return Err(e);
                }
            };

            fsm.process(DeploymentEvent::Status(status.clone()))?;
            let polls = fsm.polls();

            match status {
                DeploymentStatus::Pending | DeploymentStatus::Running => {
                    debug!("Deployment {} of {} is {}", deploy_id, tool, status);
                }
                DeploymentStatus::Successful => {
                    info!("Deployment {} of {} successful", deploy_id, tool);
                    return Ok(DeploymentOutcome::Success { deploy_id, polls });
                }
                DeploymentStatus::Failed(raw) => {
                    warn!(
                        "Deployment {} of {} finished with status '{}'",
                        deploy_id, tool, raw
                    );
                    return Ok(DeploymentOutcome::Failed {
                        deploy_id,
                        status: raw,
                        polls,
                    });
                }
            }

            let elapsed = self.clock.now().saturating_duration_since(accepted_at);
            let attempts_exhausted = self.settings.max_attempts.is_some_and(|max| polls >= max);
            let deadline_passed = self.settings.timeout.is_some_and(|t| elapsed >= t);
            if attempts_exhausted || deadline_passed {
                let err = DeployerError::Timeout {
                    tool: tool.to_string(),
                    deploy_id: deploy_id.to_string(),
                    polls,
                    elapsed,
                };
                fsm.process(DeploymentEvent::Error(err.to_string()))?;
                error!("{}", err);
                return Err(err);
            }

            self.clock.sleep(self.settings.interval).await;
        }
    }
}
