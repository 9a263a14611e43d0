//! Error types for the rotation agent.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Reasons a rotation cycle ends without dispatching a rotation.
///
/// Verification problems never show up here: once the trigger has been
/// accepted the cycle always reports success.
#[derive(Debug, Error)]
pub enum RotationError {
    /// The rotation trigger URL is empty
    #[error("No rotation URL configured")]
    MissingRotationUrl,

    /// A proxy address or credential is empty
    #[error("Missing proxy credentials: {0} is not set")]
    MissingProxySetting(&'static str),

    /// The proxy has been switched off in the configuration
    #[error("Proxy is disabled")]
    ProxyDisabled,

    /// The trigger endpoint answered with something other than 200
    #[error("Rotation API returned status {status}")]
    TriggerRejected { status: u16, body: String },

    /// The trigger endpoint could not be reached
    #[error("Failed to send rotation command: {0}")]
    TriggerUnreachable(#[source] TransportError),
}

impl RotationError {
    /// Human-readable remediation hint for API and CLI callers
    pub fn details(&self) -> String {
        match self {
            RotationError::MissingRotationUrl => {
                "The rotation URL is not configured in the rotation config file".to_string()
            }
            RotationError::MissingProxySetting(_) => {
                "Check your proxy configuration in the rotation config file".to_string()
            }
            RotationError::ProxyDisabled => {
                "Enable the proxy before requesting a rotation".to_string()
            }
            RotationError::TriggerRejected { body, .. } => format!("Response: {}", body),
            RotationError::TriggerUnreachable(_) => {
                "Check your internet connection and rotation URL.".to_string()
            }
        }
    }

    /// Whether the cycle was rejected before any network call
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            RotationError::MissingRotationUrl
                | RotationError::MissingProxySetting(_)
                | RotationError::ProxyDisabled
        )
    }
}

/// Failures of a single outbound GET request
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Never carries the proxy URL itself since it embeds the password
    #[error("invalid proxy URL")]
    InvalidProxy,

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("request failed: {0}")]
    Request(String),
}

/// Failures reading or writing the persisted rotation config
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_flagged() {
        assert!(RotationError::MissingRotationUrl.is_config_error());
        assert!(RotationError::MissingProxySetting("proxy_username").is_config_error());
        assert!(RotationError::ProxyDisabled.is_config_error());
        assert!(!RotationError::TriggerRejected {
            status: 500,
            body: String::new()
        }
        .is_config_error());
    }

    #[test]
    fn test_trigger_rejected_details_include_body() {
        let err = RotationError::TriggerRejected {
            status: 403,
            body: "token expired".to_string(),
        };
        assert_eq!(err.to_string(), "Rotation API returned status 403");
        assert_eq!(err.details(), "Response: token expired");
    }
}
