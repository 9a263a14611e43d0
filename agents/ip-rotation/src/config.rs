//! Rotation Configuration
//!
//! The persisted proxy settings and rotation counters, plus the store
//! interface used to read them at startup and rewrite them after each
//! dispatched rotation.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{RotationError, StoreError};

/// Connection state recorded alongside the proxy settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProxyStatus {
    Connected,
    #[default]
    Disconnected,
    Error,
    Disabled,
}

impl fmt::Display for ProxyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyStatus::Connected => write!(f, "connected"),
            ProxyStatus::Disconnected => write!(f, "disconnected"),
            ProxyStatus::Error => write!(f, "error"),
            ProxyStatus::Disabled => write!(f, "disabled"),
        }
    }
}

/// Proxy URL scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyProtocol {
    Http,
    Socks5,
}

/// Persisted rotation configuration.
///
/// Keys missing from the file fall back to their defaults so older files
/// keep loading.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RotationConfig {
    /// Endpoint that instructs the upstream modem to change its IP
    pub rotation_url: String,
    /// HTTP proxy address (host:port)
    pub http_proxy: String,
    /// SOCKS proxy address (host:port)
    pub socks_proxy: String,
    pub proxy_username: String,
    pub proxy_password: String,
    /// Number of rotations dispatched so far
    pub rotation_count: u64,
    /// Epoch seconds of the last dispatched rotation (0 = never)
    pub last_rotation: i64,
    pub status: ProxyStatus,
}

// Hand-written so the password never reaches a log line.
impl fmt::Debug for RotationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotationConfig")
            .field("rotation_url", &self.rotation_url)
            .field("http_proxy", &self.http_proxy)
            .field("socks_proxy", &self.socks_proxy)
            .field("proxy_username", &self.proxy_username)
            .field("proxy_password", &"<redacted>")
            .field("rotation_count", &self.rotation_count)
            .field("last_rotation", &self.last_rotation)
            .field("status", &self.status)
            .finish()
    }
}

impl RotationConfig {
    /// Check everything a rotation cycle needs before any network call.
    ///
    /// Returns the trigger URL on success.
    pub fn rotation_target(&self) -> Result<&str, RotationError> {
        if self.status == ProxyStatus::Disabled {
            return Err(RotationError::ProxyDisabled);
        }
        if self.rotation_url.trim().is_empty() {
            return Err(RotationError::MissingRotationUrl);
        }
        self.proxy_url(ProxyProtocol::Http)?;
        Ok(self.rotation_url.trim())
    }

    /// Full proxy URL with embedded credentials
    pub fn proxy_url(&self, protocol: ProxyProtocol) -> Result<String, RotationError> {
        let (scheme, address, field) = match protocol {
            ProxyProtocol::Http => ("http", &self.http_proxy, "http_proxy"),
            ProxyProtocol::Socks5 => ("socks5", &self.socks_proxy, "socks_proxy"),
        };

        if address.trim().is_empty() {
            return Err(RotationError::MissingProxySetting(field));
        }
        if self.proxy_username.is_empty() {
            return Err(RotationError::MissingProxySetting("proxy_username"));
        }
        if self.proxy_password.is_empty() {
            return Err(RotationError::MissingProxySetting("proxy_password"));
        }

        // Userinfo must be percent-encoded or `#`, `/` and `@` split the URL early.
        Ok(format!(
            "{}://{}:{}@{}",
            scheme,
            urlencoding::encode(&self.proxy_username),
            urlencoding::encode(&self.proxy_password),
            address.trim()
        ))
    }

    /// Count one dispatched rotation at `timestamp` and return the new count
    pub fn record_rotation(&mut self, timestamp: i64) -> u64 {
        self.rotation_count = self.rotation_count.saturating_add(1);
        self.last_rotation = timestamp;
        self.rotation_count
    }

    /// Password-free view for API responses and CLI output
    pub fn view(&self) -> ConfigView {
        ConfigView {
            rotation_url: self.rotation_url.clone(),
            http_proxy: self.http_proxy.clone(),
            socks_proxy: self.socks_proxy.clone(),
            proxy_username: self.proxy_username.clone(),
            password_set: !self.proxy_password.is_empty(),
            rotation_count: self.rotation_count,
            last_rotation: self.last_rotation,
            status: self.status,
        }
    }
}

/// Redacted configuration as shown to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigView {
    pub rotation_url: String,
    pub http_proxy: String,
    pub socks_proxy: String,
    pub proxy_username: String,
    pub password_set: bool,
    pub rotation_count: u64,
    pub last_rotation: i64,
    pub status: ProxyStatus,
}

/// Partial configuration update. Empty strings are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    pub rotation_url: Option<String>,
    pub http_proxy: Option<String>,
    pub socks_proxy: Option<String>,
    pub proxy_username: Option<String>,
    pub proxy_password: Option<String>,
    /// `false` disables the proxy, `true` re-enables a disabled one
    pub enabled: Option<bool>,
}

impl ConfigUpdate {
    /// Apply the update in place, returning whether anything changed
    pub fn apply(&self, config: &mut RotationConfig) -> bool {
        let mut changed = false;

        let fields = [
            (&self.rotation_url, &mut config.rotation_url),
            (&self.http_proxy, &mut config.http_proxy),
            (&self.socks_proxy, &mut config.socks_proxy),
            (&self.proxy_username, &mut config.proxy_username),
            (&self.proxy_password, &mut config.proxy_password),
        ];
        for (update, target) in fields {
            if let Some(value) = update.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                if target.as_str() != value {
                    *target = value.to_string();
                    changed = true;
                }
            }
        }

        match self.enabled {
            Some(false) if config.status != ProxyStatus::Disabled => {
                config.status = ProxyStatus::Disabled;
                changed = true;
            }
            Some(true) if config.status == ProxyStatus::Disabled => {
                config.status = ProxyStatus::Disconnected;
                changed = true;
            }
            _ => {}
        }

        changed
    }
}

// ============================================================
// Stores
// ============================================================

/// Read/write access to the persisted rotation configuration
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> Result<RotationConfig, StoreError>;
    fn save(&self, config: &RotationConfig) -> Result<(), StoreError>;
}

/// Pretty-printed JSON file store
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonFileStore {
    /// Load the config, writing a default file first if none exists
    fn load(&self) -> Result<RotationConfig, StoreError> {
        if !self.path.exists() {
            let config = RotationConfig::default();
            self.save(&config)?;
            info!("Created default configuration in {:?}", self.path);
            return Ok(config);
        }

        let raw = fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        let config = serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;

        info!("Loaded configuration from {:?}", self.path);
        Ok(config)
    }

    fn save(&self, config: &RotationConfig) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(config)?;

        // Write-then-rename so a crash never leaves a truncated file behind.
        let tmp = self.path.with_extension("json.tmp");
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        fs::write(&tmp, body).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)?;

        debug!("Configuration saved to {:?}", self.path);
        Ok(())
    }
}

/// In-memory store, useful for embedding and tests
#[derive(Default)]
pub struct MemoryStore {
    config: Mutex<RotationConfig>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new(config: RotationConfig) -> Self {
        Self {
            config: Mutex::new(config),
            saves: AtomicUsize::new(0),
        }
    }

    /// Last saved (or initial) configuration
    pub fn snapshot(&self) -> RotationConfig {
        self.config
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of successful `save` calls
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl ConfigStore for MemoryStore {
    fn load(&self) -> Result<RotationConfig, StoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, config: &RotationConfig) -> Result<(), StoreError> {
        *self
            .config
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = config.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
