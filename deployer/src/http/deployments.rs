//! Deployment API client

use async_trait::async_trait;
use components_api::{
    DeploymentStatusResponse, StartDeploymentQuery, StartDeploymentResponse, TokenQuery,
};
use tracing::debug;

use crate::authn::deploy_token::DeployToken;
use crate::errors::DeployerError;
use crate::http::client::HttpClient;
use crate::models::deployment::{DeployId, DeploymentFlags, DeploymentStatus};
use crate::models::tool::ToolName;

/// The two deployment operations the controller needs
///
/// A 409 from either call surfaces as an error for which
/// [`DeployerError::is_conflict`] holds.
#[async_trait]
pub trait DeploymentApi: Send + Sync {
    /// Start a deployment of `tool`
    async fn start_deployment(
        &self,
        tool: &ToolName,
        token: &DeployToken,
        flags: DeploymentFlags,
    ) -> Result<DeployId, DeployerError>;

    /// Read the status of a started deployment
    async fn deployment_status(
        &self,
        tool: &ToolName,
        token: &DeployToken,
        deploy_id: &DeployId,
    ) -> Result<DeploymentStatus, DeployerError>;
}

#[async_trait]
impl DeploymentApi for HttpClient {
    async fn start_deployment(
        &self,
        tool: &ToolName,
        token: &DeployToken,
        flags: DeploymentFlags,
    ) -> Result<DeployId, DeployerError> {
        let query = StartDeploymentQuery {
            token: token.expose(),
            force_run: flags.force_run.then_some(true),
            force_build: flags.force_build.then_some(true),
        };
        let response: StartDeploymentResponse = self
            .post(
                &["components", "v1", "tool", tool.as_str(), "deployment"],
                &query,
            )
            .await?;

        debug!("Deployment {} accepted for {}", response.data.deploy_id, tool);
        Ok(DeployId::new(response.data.deploy_id))
    }

    async fn deployment_status(
        &self,
        tool: &ToolName,
        token: &DeployToken,
        deploy_id: &DeployId,
    ) -> Result<DeploymentStatus, DeployerError> {
        let query = TokenQuery {
            token: token.expose(),
        };
        let response: DeploymentStatusResponse = self
            .get(
                &[
                    "components",
                    "v1",
                    "tool",
                    tool.as_str(),
                    "deployment",
                    deploy_id.as_str(),
                ],
                &query,
            )
            .await?;

        Ok(DeploymentStatus::from_raw(&response.data.status))
    }
}
