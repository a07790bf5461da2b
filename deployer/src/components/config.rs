//! Component config provisioning
//!
//! Makes sure every tool account has a components config, creating it from
//! the published `<base_url>/<tool>.yaml` when the platform reports none.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::DeployerError;
use crate::models::tool::ToolName;
use crate::remote::ssh::{shell_quote, RemoteRunner};

/// Provisions component configs over the remote runner
pub struct ComponentConfigurator<R: RemoteRunner> {
    runner: Arc<R>,
    tool_base_dir: PathBuf,
    config_base_url: String,
}

impl<R: RemoteRunner> ComponentConfigurator<R> {
    pub fn new(
        runner: Arc<R>,
        tool_base_dir: impl Into<PathBuf>,
        config_base_url: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            tool_base_dir: tool_base_dir.into(),
            config_base_url: config_base_url.into(),
        }
    }

    /// Published config location for `tool`
    pub fn config_url(&self, tool: &ToolName) -> String {
        format!("{}/{}.yaml", self.config_base_url.trim_end_matches('/'), tool)
    }

    fn xdg_prefix(&self, tool: &ToolName) -> String {
        let home = tool.home_dir(&self.tool_base_dir);
        format!("XDG_CONFIG_HOME={}", shell_quote(&home.to_string_lossy()))
    }

    /// Whether the platform reports no components config for `tool`
    ///
    /// Only the exact "unable to find" failure counts; any other failure of
    /// `config show` is treated as "has a config" so nothing is overwritten.
    pub async fn has_no_component_config(&self, tool: &ToolName) -> Result<bool, DeployerError> {
        let command = format!("{} toolforge components config show", self.xdg_prefix(tool));
        let output = self.runner.sudo(&tool.sudo_user(), &command).await?;

        let missing_message = format!(
            "Error: Unable to find namespace tool-{0} or config {0}-config for {0}",
            tool
        );
        let missing = output.exit_code == 1 && output.stderr.contains(&missing_message);
        debug!(
            "config show for {} exited with {} (missing={})",
            tool, output.exit_code, missing
        );
        Ok(missing)
    }

    /// Create the components config of `tool` from its published file
    pub async fn create_component_config(&self, tool: &ToolName) -> Result<(), DeployerError> {
        let config_url = self.config_url(tool);
        info!("Applying to {}: {}", tool, config_url);

        let command = format!(
            "curl --fail {} | {} toolforge components config create",
            shell_quote(&config_url),
            self.xdg_prefix(tool)
        );
        let output = self.runner.sudo(&tool.sudo_user(), &command).await?;

        if !output.success() {
            return Err(DeployerError::RemoteError(format!(
                "config create for {} exited with {}: {}",
                tool,
                output.exit_code,
                output.stderr.trim()
            )));
        }
        Ok(())
    }

    /// Create missing configs, returning the tools that were configured
    pub async fn ensure_component_configs(
        &self,
        tools: &[ToolName],
    ) -> Result<Vec<ToolName>, DeployerError> {
        let mut configured = Vec::new();
        for tool in tools {
            info!("Checking {}", tool);
            if self.has_no_component_config(tool).await? {
                self.create_component_config(tool).await?;
                configured.push(tool.clone());
            }
        }
        Ok(configured)
    }
}
