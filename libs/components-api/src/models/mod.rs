//! API models

use serde::{Deserialize, Serialize};

/// Every components API response wraps its payload in `data`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// Query parameters for starting a deployment
///
/// The force flags are only sent when set, so older deployments of the API
/// that do not know them see the same request as before.
#[derive(Debug, Clone, Serialize)]
pub struct StartDeploymentQuery<'a> {
    pub token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_run: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_build: Option<bool>,
}

/// Query parameters for reading a deployment
#[derive(Debug, Clone, Serialize)]
pub struct TokenQuery<'a> {
    pub token: &'a str,
}

/// Start deployment response payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentCreated {
    pub deploy_id: String,
}

/// Deployment status payload
///
/// `status` is kept as the raw text the service returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentInfo {
    pub status: String,
}

/// Deploy token payload printed by `toolforge components deploy-token show --json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployTokenInfo {
    #[serde(default)]
    pub token: String,
}

/// Start deployment response
pub type StartDeploymentResponse = DataEnvelope<DeploymentCreated>;

/// Deployment status response
pub type DeploymentStatusResponse = DataEnvelope<DeploymentInfo>;

/// Deploy token response
pub type DeployTokenResponse = DataEnvelope<DeployTokenInfo>;
