//! Deploy token wrapper

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::errors::DeployerError;

/// Bearer credential authorising deployment API calls for one tool
///
/// The raw value is only reachable through [`DeployToken::expose`]; `Debug`
/// output is redacted.
pub struct DeployToken {
    raw: SecretString,
}

impl DeployToken {
    /// Wrap a raw token, rejecting empty values
    pub fn new(raw: impl Into<String>) -> Result<Self, DeployerError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DeployerError::TokenError("deploy token is empty".to_string()));
        }
        Ok(Self {
            raw: SecretString::from(trimmed.to_string()),
        })
    }

    /// Raw token for request building
    pub fn expose(&self) -> &str {
        self.raw.expose_secret()
    }
}

impl fmt::Debug for DeployToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeployToken([REDACTED])")
    }
}
