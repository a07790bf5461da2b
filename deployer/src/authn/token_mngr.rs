//! Token providers for deployment API calls

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use components_api::DeployTokenResponse;
use tracing::{debug, info, warn};

use crate::authn::deploy_token::DeployToken;
use crate::errors::DeployerError;
use crate::models::tool::ToolName;
use crate::remote::ssh::{shell_quote, RemoteRunner};

/// Resolves the deploy token of a tool
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Get a non-empty token for `tool`, creating one if the provider can
    async fn get_token(&self, tool: &ToolName) -> Result<DeployToken, DeployerError>;
}

/// Provider returning one operator-supplied token for every tool
pub struct StaticTokenProvider {
    token: DeployToken,
}

impl StaticTokenProvider {
    pub fn new(token: DeployToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self, _tool: &ToolName) -> Result<DeployToken, DeployerError> {
        DeployToken::new(self.token.expose())
    }
}

/// Provider reading tokens with the `toolforge` CLI on the bastion host
pub struct RemoteTokenProvider<R: RemoteRunner> {
    runner: Arc<R>,
    tool_base_dir: PathBuf,
}

impl<R: RemoteRunner> RemoteTokenProvider<R> {
    pub fn new(runner: Arc<R>, tool_base_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            tool_base_dir: tool_base_dir.into(),
        }
    }

    fn toolforge_command(&self, tool: &ToolName, args: &str) -> String {
        let home = tool.home_dir(&self.tool_base_dir);
        format!(
            "XDG_CONFIG_HOME={} toolforge components deploy-token {}",
            shell_quote(&home.to_string_lossy()),
            args
        )
    }

    /// Current token, `None` when the tool has none yet
    async fn show(&self, tool: &ToolName) -> Result<Option<DeployToken>, DeployerError> {
        let output = self
            .runner
            .sudo(&tool.sudo_user(), &self.toolforge_command(tool, "show --json"))
            .await?;

        if !output.success() {
            debug!(
                "deploy-token show for {} exited with {}: {}",
                tool,
                output.exit_code,
                output.stderr.trim()
            );
            return Ok(None);
        }

        let response: DeployTokenResponse = match serde_json::from_str(output.stdout.trim()) {
            Ok(response) => response,
            Err(e) => {
                debug!("Unreadable deploy-token show output for {}: {}", tool, e);
                return Ok(None);
            }
        };
        Ok(DeployToken::new(response.data.token).ok())
    }

    async fn create(&self, tool: &ToolName) -> Result<(), DeployerError> {
        let output = self
            .runner
            .sudo(&tool.sudo_user(), &self.toolforge_command(tool, "create --json"))
            .await?;

        if !output.success() {
            warn!(
                "deploy-token create for {} exited with {}: {}",
                tool,
                output.exit_code,
                output.stderr.trim()
            );
        }
        Ok(())
    }
}

#[async_trait]
impl<R: RemoteRunner> TokenProvider for RemoteTokenProvider<R> {
    async fn get_token(&self, tool: &ToolName) -> Result<DeployToken, DeployerError> {
        if let Some(token) = self.show(tool).await? {
            return Ok(token);
        }

        info!("No deploy token for {}, creating one", tool);
        self.create(tool).await?;

        self.show(tool).await?.ok_or_else(|| {
            DeployerError::TokenError(format!("no deploy token available for {}", tool))
        })
    }
}
