//! Proxy IP Rotation Agent Library
//!
//! Drives a rotation cycle against an external rotation trigger, waits for the
//! upstream change to settle, then verifies the new public IP through the proxy
//! with a direct-lookup fallback.
//!
//! The config store and the outbound HTTP transport are injected, so the
//! orchestrator can run against a JSON file and reqwest in production or
//! against in-memory doubles in tests.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod transport;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{
    ConfigStore, ConfigUpdate, ConfigView, JsonFileStore, MemoryStore, ProxyProtocol, ProxyStatus,
    RotationConfig,
};
pub use error::{RotationError, StoreError, TransportError};
pub use orchestrator::{RotationOrchestrator, RotationSettings, DEFAULT_IP_ECHO_URL};
pub use transport::{GetRequest, HttpReply, HttpTransport, ReqwestTransport};
pub use types::{
    ConnectionCheck, RotationResponse, RotationResult, RotationStatus, Verification, UNKNOWN_IP,
};
