//! Tool account identity

use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::DeployerError;

/// Name of a hosted tool account
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToolName(String);

impl ToolName {
    /// Create a tool name, rejecting empty or whitespace-only input
    pub fn new(name: impl Into<String>) -> Result<Self, DeployerError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DeployerError::ConfigError("tool name must not be empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Account the remote commands run as
    pub fn sudo_user(&self) -> String {
        format!("tools.{}", self.0)
    }

    /// Home directory of the tool account, used as `XDG_CONFIG_HOME`
    pub fn home_dir(&self, tool_base_dir: &Path) -> PathBuf {
        tool_base_dir.join(&self.0)
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ToolName {
    type Err = DeployerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::new(s)
    }
}
