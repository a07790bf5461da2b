//! Settings file management

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::deploy::controller::PollSettings;
use crate::errors::DeployerError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Deployer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Components API configuration
    #[serde(default)]
    pub api: ApiSettings,

    /// Bastion host configuration
    #[serde(default)]
    pub ssh: SshSettings,

    /// Directory holding the per-tool `<tool>.yaml` component configs
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Where the component configs are published
    #[serde(default = "default_config_base_url")]
    pub config_base_url: String,

    /// Parent of the tool home directories on the bastion host
    #[serde(default = "default_tool_base_dir")]
    pub tool_base_dir: PathBuf,

    /// Status polling configuration
    #[serde(default)]
    pub polling: PollingSettings,
}

fn default_config_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_config_base_url() -> String {
    "https://raw.githubusercontent.com/cluebotng/bot/refs/heads/main".to_string()
}

fn default_tool_base_dir() -> PathBuf {
    PathBuf::from("/data/project")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            api: ApiSettings::default(),
            ssh: SshSettings::default(),
            config_dir: default_config_dir(),
            config_base_url: default_config_base_url(),
            tool_base_dir: default_tool_base_dir(),
            polling: PollingSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file
    pub async fn load(file: &File) -> Result<Self, DeployerError> {
        if !file.exists().await {
            return Err(DeployerError::ConfigError(format!(
                "settings file {} does not exist",
                file.path().display()
            )));
        }
        file.read_json().await
    }
}

/// Components API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL for the components API
    #[serde(default = "default_api_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.svc.toolforge.org".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Bastion host settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshSettings {
    /// Host remote commands run on
    #[serde(default = "default_ssh_host")]
    pub host: String,

    /// Command prefix used to become the tool user
    #[serde(default = "default_sudo_prefix")]
    pub sudo_prefix: String,
}

fn default_ssh_host() -> String {
    "login.toolforge.org".to_string()
}

fn default_sudo_prefix() -> String {
    "/usr/bin/sudo -ni".to_string()
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            host: default_ssh_host(),
            sudo_prefix: default_sudo_prefix(),
        }
    }
}

/// Status polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingSettings {
    /// Seconds between status polls
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Maximum number of polls, unlimited when absent
    #[serde(default)]
    pub max_attempts: Option<u32>,

    /// Seconds to wait for a deployment, unlimited when absent
    #[serde(default = "default_timeout")]
    pub timeout_secs: Option<u64>,
}

fn default_interval() -> u64 {
    1
}

fn default_timeout() -> Option<u64> {
    Some(3600)
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            max_attempts: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl PollingSettings {
    /// Poll loop settings; a zero poll limit is rejected
    pub fn to_poll_settings(&self) -> Result<PollSettings, DeployerError> {
        if self.max_attempts == Some(0) {
            return Err(DeployerError::ConfigError(
                "polling.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(PollSettings {
            interval: Duration::from_secs(self.interval_secs),
            max_attempts: self.max_attempts,
            timeout: self.timeout_secs.map(Duration::from_secs),
        })
    }
}
