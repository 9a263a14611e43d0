//! Outbound HTTP Transport
//!
//! Every network call the orchestrator makes is a plain GET with a per-call
//! timeout, optionally routed through the rotating proxy.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Proxy};
use tracing::debug;

use crate::error::TransportError;

const USER_AGENT: &str = concat!("lornu-ip-rotation/", env!("CARGO_PKG_VERSION"));

/// A single GET request
#[derive(Clone, PartialEq, Eq)]
pub struct GetRequest {
    pub url: String,
    /// Proxy URL with embedded credentials, or `None` for a direct request
    pub proxy: Option<String>,
    pub timeout: Duration,
}

impl GetRequest {
    pub fn direct(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            proxy: None,
            timeout,
        }
    }

    pub fn via_proxy(url: impl Into<String>, proxy: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            proxy: Some(proxy.into()),
            timeout,
        }
    }
}

impl std::fmt::Debug for GetRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GetRequest")
            .field("url", &self.url)
            .field("via_proxy", &self.proxy.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Status and body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Only an exact 200 counts as success for triggers and IP lookups
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Issues GET requests on behalf of the orchestrator
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, request: GetRequest) -> Result<HttpReply, TransportError>;
}

/// reqwest-backed transport
pub struct ReqwestTransport {
    direct: Client,
    /// Client for the most recent proxy URL, rebuilt when the credentials change
    proxied: Mutex<Option<(String, Client)>>,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        // Direct calls must bypass any HTTP_PROXY in the environment.
        let direct = Client::builder()
            .user_agent(USER_AGENT)
            .no_proxy()
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            direct,
            proxied: Mutex::new(None),
        })
    }

    fn client_for(&self, proxy: Option<&str>) -> Result<Client, TransportError> {
        let Some(proxy_url) = proxy else {
            return Ok(self.direct.clone());
        };

        let mut cached = self
            .proxied
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some((url, client)) = cached.as_ref() {
            if url == proxy_url {
                return Ok(client.clone());
            }
        }

        let proxy = Proxy::all(proxy_url).map_err(|_| TransportError::InvalidProxy)?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .proxy(proxy)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        *cached = Some((proxy_url.to_string(), client.clone()));
        Ok(client)
    }

    #[cfg(test)]
    fn cached_proxy(&self) -> Option<String> {
        self.proxied
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|(url, _)| url.clone())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, request: GetRequest) -> Result<HttpReply, TransportError> {
        debug!(
            url = %request.url,
            via_proxy = request.proxy.is_some(),
            timeout_secs = request.timeout.as_secs_f64(),
            "Sending GET request"
        );

        let client = self.client_for(request.proxy.as_deref())?;
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                TransportError::Timeout(request.timeout)
            } else {
                // without_url keeps proxy credentials out of the message
                TransportError::Request(e.without_url().to_string())
            }
        };

        let response = client
            .get(&request.url)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(map_err)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_err)?;

        Ok(HttpReply { status, body })
    }
}
