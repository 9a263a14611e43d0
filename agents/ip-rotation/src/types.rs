//! Rotation Result Types
//!
//! Outcomes of a rotation cycle, connection check and status report, plus the
//! JSON shape returned to API callers.

use serde::{Deserialize, Serialize};

use crate::config::ProxyStatus;
use crate::error::RotationError;

/// Reported IP when no lookup succeeded
pub const UNKNOWN_IP: &str = "unknown";

/// How far the new IP could be confirmed after a dispatched rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verification {
    /// The IP-echo service answered through the rotated proxy
    ThroughProxy,
    /// Only a direct lookup answered; the proxy route is unconfirmed
    Direct,
    /// Neither lookup answered
    Unconfirmed,
}

impl Verification {
    pub fn message(&self) -> &'static str {
        match self {
            Verification::ThroughProxy => "IP rotation completed successfully!",
            Verification::Direct => {
                "IP rotation command sent successfully, but could not verify through proxy"
            }
            Verification::Unconfirmed => {
                "IP rotation command sent successfully, but could not verify IP"
            }
        }
    }
}

/// Terminal outcome of one `rotate()` call
#[derive(Debug)]
pub enum RotationResult {
    /// The trigger was accepted and the counter advanced
    Rotated {
        ip: String,
        verification: Verification,
        rotation_count: u64,
    },
    /// The cycle stopped before a rotation was dispatched
    Failed {
        error: RotationError,
        rotation_count: u64,
    },
}

impl RotationResult {
    pub(crate) fn unconfirmed(rotation_count: u64) -> Self {
        RotationResult::Rotated {
            ip: UNKNOWN_IP.to_string(),
            verification: Verification::Unconfirmed,
            rotation_count,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RotationResult::Rotated { .. })
    }

    /// Resolved IP, `"unknown"` when unconfirmed, `None` on failure
    pub fn new_ip(&self) -> Option<&str> {
        match self {
            RotationResult::Rotated { ip, .. } => Some(ip),
            RotationResult::Failed { .. } => None,
        }
    }

    pub fn verification(&self) -> Option<Verification> {
        match self {
            RotationResult::Rotated { verification, .. } => Some(*verification),
            RotationResult::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&RotationError> {
        match self {
            RotationResult::Rotated { .. } => None,
            RotationResult::Failed { error, .. } => Some(error),
        }
    }

    pub fn rotation_count(&self) -> u64 {
        match self {
            RotationResult::Rotated { rotation_count, .. }
            | RotationResult::Failed { rotation_count, .. } => *rotation_count,
        }
    }

    pub fn message(&self) -> String {
        match self {
            RotationResult::Rotated { verification, .. } => verification.message().to_string(),
            RotationResult::Failed { error, .. } => error.to_string(),
        }
    }

    pub fn to_response(&self) -> RotationResponse {
        match self {
            RotationResult::Rotated {
                ip, rotation_count, ..
            } => RotationResponse {
                success: true,
                new_ip: Some(ip.clone()),
                message: self.message(),
                rotation_count: *rotation_count,
                error: None,
                details: None,
            },
            RotationResult::Failed {
                error,
                rotation_count,
            } => RotationResponse {
                success: false,
                new_ip: None,
                message: self.message(),
                rotation_count: *rotation_count,
                error: Some(error.to_string()),
                details: Some(error.details()),
            },
        }
    }
}

/// Caller-facing JSON body for a rotation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_ip: Option<String>,
    pub message: String,
    pub rotation_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Result of probing the current public IP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionCheck {
    pub connected: bool,
    pub message: String,
    pub ip: Option<String>,
}

/// Snapshot of the proxy and rotation state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationStatus {
    pub connected: bool,
    pub status: ProxyStatus,
    pub current_ip: Option<String>,
    pub last_error: Option<String>,
    /// Epoch seconds, 0 when never rotated
    pub last_rotation: i64,
    pub time_since_rotation: String,
    pub rotation_count: u64,
    pub proxy_server: Option<String>,
}

/// Render seconds elapsed since the last rotation
pub(crate) fn format_since_rotation(last_rotation: i64, now: i64) -> String {
    if last_rotation <= 0 {
        return "Never rotated".to_string();
    }
    let elapsed = (now - last_rotation).max(0);
    format!("{} minutes, {} seconds", elapsed / 60, elapsed % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_response_carries_error_and_details() {
        let result = RotationResult::Failed {
            error: RotationError::MissingRotationUrl,
            rotation_count: 4,
        };
        let json = serde_json::to_value(result.to_response()).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["rotation_count"], 4);
        assert_eq!(json["error"], "No rotation URL configured");
        assert!(json.get("new_ip").is_none());
        assert!(json["details"].as_str().unwrap().contains("rotation URL"));
    }

    #[test]
    fn test_unconfirmed_response_reports_unknown_ip() {
        let response = RotationResult::unconfirmed(9).to_response();
        assert!(response.success);
        assert_eq!(response.new_ip.as_deref(), Some(UNKNOWN_IP));
        assert_eq!(response.rotation_count, 9);
        assert!(response.error.is_none());
        assert_eq!(response.message, Verification::Unconfirmed.message());
    }

    #[test]
    fn test_format_since_rotation() {
        assert_eq!(format_since_rotation(0, 1_700_000_000), "Never rotated");
        assert_eq!(
            format_since_rotation(1_700_000_000, 1_700_000_125),
            "2 minutes, 5 seconds"
        );
    }
}
