use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha1::Sha1;
use tracing::{info, warn};

use crate::config::Config;
use crate::registry::now_secs;

type HmacSha1 = Hmac<Sha1>;

/// How long an issued TURN credential stays valid.
const CREDENTIAL_LIFETIME_SECS: u64 = 3600;

/// Lifecycle state of the relay instance as reported by the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// No instance configured.
    Unavailable,
    Stopped,
    Pending,
    Running,
    Stopping,
    /// The control plane reported a state we do not recognize.
    Unknown,
}

impl RelayState {
    fn parse(s: &str) -> Self {
        match s {
            "stopped" => RelayState::Stopped,
            "pending" => RelayState::Pending,
            "running" => RelayState::Running,
            "stopping" => RelayState::Stopping,
            _ => RelayState::Unknown,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InstanceStatus {
    pub state: RelayState,
    pub public_ip: Option<String>,
}

impl InstanceStatus {
    pub fn unavailable() -> Self {
        Self {
            state: RelayState::Unavailable,
            public_ip: None,
        }
    }

    /// A relay is usable only once it is running with an address assigned.
    pub fn ready(&self) -> bool {
        self.state == RelayState::Running && self.public_ip.is_some()
    }
}

/// Start/stop/describe capability over a remote compute instance. Start and
/// stop are idempotent on the control-plane side; repeating them is harmless.
#[async_trait]
pub trait InstanceControl: Send + Sync {
    async fn describe(&self) -> Result<InstanceStatus>;
    async fn start(&self) -> Result<()>;
    async fn stop(&self) -> Result<()>;
}

/// Control-plane client speaking a small JSON API:
/// `GET /instances/{id}` returns `{"state": "...", "publicIp": "..."}`,
/// `POST /instances/{id}/start` and `/stop` act on the instance.
pub struct HttpInstanceControl {
    client: reqwest::Client,
    base_url: String,
    instance_id: String,
    token: Option<String>,
}

impl HttpInstanceControl {
    pub fn new(base_url: String, instance_id: String, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            instance_id,
            token,
        }
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.header("Authorization", format!("Bearer {token}")),
            None => req,
        }
    }

    async fn post_action(&self, action: &str) -> Result<()> {
        let url = format!("{}/instances/{}/{action}", self.base_url, self.instance_id);
        let res = self
            .authed(self.client.post(&url))
            .send()
            .await
            .with_context(|| format!("control plane {action} request failed"))?;
        if !res.status().is_success() {
            return Err(anyhow!("control plane {action} returned HTTP {}", res.status()));
        }
        Ok(())
    }
}

#[async_trait]
impl InstanceControl for HttpInstanceControl {
    async fn describe(&self) -> Result<InstanceStatus> {
        let url = format!("{}/instances/{}", self.base_url, self.instance_id);
        let res = self
            .authed(self.client.get(&url))
            .send()
            .await
            .context("control plane describe request failed")?;
        if !res.status().is_success() {
            return Err(anyhow!("control plane describe returned HTTP {}", res.status()));
        }
        let body: serde_json::Value = res.json().await.context("invalid describe response")?;
        let state = body["state"].as_str().map(RelayState::parse).unwrap_or(RelayState::Unknown);
        let public_ip = body["publicIp"].as_str().map(str::to_string);
        Ok(InstanceStatus { state, public_ip })
    }

    async fn start(&self) -> Result<()> {
        self.post_action("start").await
    }

    async fn stop(&self) -> Result<()> {
        self.post_action("stop").await
    }
}

/// Time-limited TURN credentials following the standard shared-secret
/// convention: the relay recomputes the HMAC over the presented username, so
/// nothing issued here needs to be tracked.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TurnCredentials {
    pub username: String,
    pub credential: String,
}

pub fn turn_credentials(secret: &str, client_id: &str, now: u64) -> TurnCredentials {
    let expiry = now + CREDENTIAL_LIFETIME_SECS;
    let username = format!("{expiry}:{client_id}");
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(username.as_bytes());
    let credential = B64.encode(mac.finalize().into_bytes());
    TurnCredentials { username, credential }
}

/// Wraps the relay instance and the shared secret. The controller never
/// tracks instance state itself; every decision re-describes on demand.
#[derive(Clone)]
pub struct RelayController {
    secret: Option<String>,
    control: Option<Arc<dyn InstanceControl>>,
}

impl RelayController {
    pub fn new(secret: Option<String>, control: Option<Arc<dyn InstanceControl>>) -> Self {
        Self { secret, control }
    }

    pub fn from_config(config: &Config) -> Self {
        let control: Option<Arc<dyn InstanceControl>> =
            match (&config.turn_control_url, &config.turn_instance_id) {
                (Some(url), Some(id)) => Some(Arc::new(HttpInstanceControl::new(
                    url.clone(),
                    id.clone(),
                    config.turn_control_token.clone(),
                ))),
                _ => None,
            };
        Self::new(config.turn_secret.clone(), control)
    }

    /// Whether credential issuance is enabled at all.
    pub fn configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Whether there is an instance to start and stop.
    pub fn controls_instance(&self) -> bool {
        self.control.is_some()
    }

    pub fn credentials(&self, client_id: &str) -> Option<TurnCredentials> {
        self.secret
            .as_deref()
            .map(|secret| turn_credentials(secret, client_id, now_secs()))
    }

    pub async fn describe(&self) -> Result<InstanceStatus> {
        match &self.control {
            Some(control) => control.describe().await,
            None => Ok(InstanceStatus::unavailable()),
        }
    }

    /// Kick off an instance start without waiting for it. Relay boot takes on
    /// the order of 30s and a join must not block on it; callers discover the
    /// outcome by polling readiness.
    pub fn spawn_start(&self) {
        let Some(control) = self.control.clone() else {
            return;
        };
        tokio::spawn(async move {
            info!("starting relay instance");
            if let Err(e) = control.start().await {
                warn!("relay start failed: {e:#}");
            }
        });
    }

    /// Stop the instance, swallowing failures. Used on the leave path where
    /// the leave itself has already succeeded and the idle reaper backstops.
    pub async fn stop_best_effort(&self) {
        let Some(control) = &self.control else {
            return;
        };
        info!("room is empty, stopping relay instance");
        if let Err(e) = control.stop().await {
            warn!("relay stop failed: {e:#}");
        }
    }

    pub async fn stop(&self) -> Result<()> {
        match &self.control {
            Some(control) => control.stop().await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
pub mod testutil {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory control plane for tests; records start/stop calls.
    pub struct MockControl {
        status: Mutex<InstanceStatus>,
        pub starts: AtomicUsize,
        pub stops: AtomicUsize,
        fail: bool,
    }

    impl MockControl {
        pub fn with_state(state: RelayState, public_ip: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                status: Mutex::new(InstanceStatus {
                    state,
                    public_ip: public_ip.map(str::to_string),
                }),
                starts: AtomicUsize::new(0),
                stops: AtomicUsize::new(0),
                fail: false,
            })
        }

        pub fn failing() -> Arc<Self> {
            Arc::new(Self {
                status: Mutex::new(InstanceStatus::unavailable()),
                starts: AtomicUsize::new(0),
                stops: AtomicUsize::new(0),
                fail: true,
            })
        }

        pub fn start_count(&self) -> usize {
            self.starts.load(Ordering::SeqCst)
        }

        pub fn stop_count(&self) -> usize {
            self.stops.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InstanceControl for MockControl {
        async fn describe(&self) -> Result<InstanceStatus> {
            if self.fail {
                return Err(anyhow!("control plane unreachable"));
            }
            Ok(self.status.lock().unwrap().clone())
        }

        async fn start(&self) -> Result<()> {
            if self.fail {
                return Err(anyhow!("control plane unreachable"));
            }
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn stop(&self) -> Result<()> {
            if self.fail {
                return Err(anyhow!("control plane unreachable"));
            }
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
