//! Test doubles for the rotation agent.
//!
//! Only available with the `test-utils` feature or in test builds.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::RotationConfig;
use crate::error::TransportError;
use crate::transport::{GetRequest, HttpReply, HttpTransport};

pub const TRIGGER_URL: &str = "https://rotate.example.test/modem/abc";
pub const ECHO_URL: &str = "https://echo.example.test/";

/// Config with every setting a rotation needs
pub fn complete_config() -> RotationConfig {
    RotationConfig {
        rotation_url: TRIGGER_URL.to_string(),
        http_proxy: "proxy.example.test:2148".to_string(),
        socks_proxy: "proxy.example.test:2149".to_string(),
        proxy_username: "user".to_string(),
        proxy_password: "secret".to_string(),
        ..Default::default()
    }
}

type Route = (String, bool);

/// Transport that replays queued replies per (url, via proxy) route.
///
/// A request with nothing queued for its route fails with a transport error,
/// so unscripted calls behave like an unreachable host.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<Route, VecDeque<Result<HttpReply, TransportError>>>>,
    calls: Mutex<Vec<GetRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, url: &str, via_proxy: bool, reply: Result<HttpReply, TransportError>) {
        self.routes
            .lock()
            .unwrap()
            .entry((url.to_string(), via_proxy))
            .or_default()
            .push_back(reply);
    }

    /// Queue a reply for the next request on this route
    pub fn respond(&self, url: &str, via_proxy: bool, status: u16, body: &str) -> &Self {
        self.push(url, via_proxy, Ok(HttpReply::new(status, body)));
        self
    }

    /// Queue a transport failure for the next request on this route
    pub fn fail(&self, url: &str, via_proxy: bool) -> &Self {
        self.push(
            url,
            via_proxy,
            Err(TransportError::Request("connection refused".to_string())),
        );
        self
    }

    /// Every request received so far, in order
    pub fn calls(&self) -> Vec<GetRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, request: GetRequest) -> Result<HttpReply, TransportError> {
        let route = (request.url.clone(), request.proxy.is_some());
        self.calls.lock().unwrap().push(request);

        self.routes
            .lock()
            .unwrap()
            .get_mut(&route)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(TransportError::Request(format!(
                    "no scripted reply for {} (via proxy: {})",
                    route.0, route.1
                )))
            })
    }
}
