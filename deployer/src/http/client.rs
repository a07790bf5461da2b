//! HTTP client implementation

use std::time::Duration;

use hyper::ext::ReasonPhrase;
use reqwest::{header, Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::errors::DeployerError;
use crate::utils::version_info;

/// HTTP client for the components API
pub struct HttpClient {
    client: Client,
    base_url: Url,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DeployerError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| DeployerError::ConfigError(format!("invalid API URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(DeployerError::ConfigError(format!(
                "{} cannot be used as an API base URL",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("tooldeploy/{}", version_info().version))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Build an endpoint URL from path segments, escaping each one
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, DeployerError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                DeployerError::ConfigError(format!("{} cannot be a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        query: &Q,
    ) -> Result<T, DeployerError> {
        let url = self.endpoint(segments)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;

        Self::decode("GET", response).await
    }

    /// Make a POST request with query parameters and no body
    pub async fn post<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        query: &Q,
    ) -> Result<T, DeployerError> {
        let url = self.endpoint(segments)?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;

        Self::decode("POST", response).await
    }

    async fn decode<T: DeserializeOwned>(method: &str, response: Response) -> Result<T, DeployerError> {
        let status = response.status();
        if !status.is_success() {
            // hyper keeps the server's reason phrase only when it is not the canonical one
            let reason = response
                .extensions()
                .get::<ReasonPhrase>()
                .map(|reason| reason.as_bytes().to_vec());
            let body = response.text().await.unwrap_or_default();
            error!("HTTP {} failed: {} - {}", method, status, body);
            return Err(DeployerError::from_status_with_reason(status, reason.as_deref()));
        }

        let body = response.json().await?;
        Ok(body)
    }
}
