//! Error types for the deployer

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the deployer
#[derive(Error, Debug)]
pub enum DeployerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Non-2xx response from the components API
    #[error("{message}")]
    ApiError { status: u16, message: String },

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Remote command error: {0}")]
    RemoteError(String),

    #[error("Deployment {deploy_id} of {tool} still in progress after {polls} polls ({elapsed:?})")]
    Timeout {
        tool: String,
        deploy_id: String,
        polls: u32,
        elapsed: Duration,
    },

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),
}

impl DeployerError {
    /// Build the error for a non-2xx response
    ///
    /// The message follows the `"{code} Client Error: {reason}"` /
    /// `"{code} Server Error: {reason}"` shape operators are used to.
    pub fn from_status(status: StatusCode) -> Self {
        Self::from_status_with_reason(status, None)
    }

    /// Same as [`DeployerError::from_status`], preferring the reason phrase
    /// the server sent over the canonical one
    pub fn from_status_with_reason(status: StatusCode, reason: Option<&[u8]>) -> Self {
        let reason = match reason {
            Some(raw) if !raw.is_empty() => decode_reason(raw),
            _ => status.canonical_reason().unwrap_or("Unknown").to_string(),
        };
        let kind = if status.is_client_error() {
            "Client Error"
        } else if status.is_server_error() {
            "Server Error"
        } else {
            "Unexpected Status"
        };
        DeployerError::ApiError {
            status: status.as_u16(),
            message: format!("{} {}: {}", status.as_u16(), kind, reason),
        }
    }

    /// Another deployment is already in flight for the tool
    pub fn is_conflict(&self) -> bool {
        matches!(self, DeployerError::ApiError { status: 409, .. })
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            DeployerError::ApiError { status, .. } => Some(*status),
            DeployerError::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Reason phrase bytes as text, UTF-8 first and Latin-1 otherwise
pub fn decode_reason(raw: &[u8]) -> String {
    match std::str::from_utf8(raw) {
        Ok(reason) => reason.to_string(),
        Err(_) => raw.iter().map(|&b| char::from(b)).collect(),
    }
}
