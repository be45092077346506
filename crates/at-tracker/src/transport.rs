//! Delivery transports.
//!
//! Two distinct capabilities with different contracts:
//! - [`Transport`]: awaited POST whose failure is reported, so the caller can
//!   restore the batch.
//! - [`BeaconTransport`]: fire-and-forget send for page teardown. The caller
//!   only learns whether the payload was queued.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tokio::task::JoinHandle;

use crate::error::TransportError;

/// `User-Agent` for outgoing requests and the default navigator string.
pub const USER_AGENT: &str = concat!("action-tracker/", env!("CARGO_PKG_VERSION"));

const JSON: &str = "application/json";

/// Primary delivery path.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` (a serialized batch payload) to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails or the collector
    /// rejects it.
    async fn post(&self, endpoint: &str, body: String) -> Result<(), TransportError>;
}

/// Best-effort delivery path that must survive teardown.
pub trait BeaconTransport: Send + Sync {
    /// Queue `body` for `endpoint`. Returns `true` if it was accepted for
    /// sending; the outcome of the send itself is never observable.
    fn send_beacon(&self, endpoint: &str, body: String) -> bool;
}

// ── HTTP ───────────────────────────────────────────────────────────

/// reqwest-backed [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Build a client with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Http`] if the underlying client fails to build.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    /// The underlying client, for sharing its connection pool.
    #[must_use]
    pub fn client(&self) -> reqwest::Client {
        self.http.clone()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, endpoint: &str, body: String) -> Result<(), TransportError> {
        let resp = self
            .http
            .post(endpoint)
            .header(CONTENT_TYPE, JSON)
            .body(body)
            .send()
            .await?;
        check_response(resp).await?;
        Ok(())
    }
}

/// Map a non-success status to [`TransportError::Api`] with the response body.
async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    if !resp.status().is_success() {
        return Err(TransportError::Api {
            status: resp.status().as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

/// reqwest-backed [`BeaconTransport`].
///
/// Each beacon is a detached task on the current Tokio runtime. A process
/// host that is about to exit calls [`HttpBeacon::settle`] to give queued
/// beacons a bounded chance to finish.
#[derive(Debug)]
pub struct HttpBeacon {
    http: reqwest::Client,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl HttpBeacon {
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Wait up to `timeout` for queued beacons. Returns `true` if all of them
    /// finished in time.
    pub async fn settle(&self, timeout: Duration) -> bool {
        let handles = std::mem::take(
            &mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner),
        );
        tokio::time::timeout(timeout, async {
            for handle in handles {
                let _ = handle.await;
            }
        })
        .await
        .is_ok()
    }
}

impl BeaconTransport for HttpBeacon {
    fn send_beacon(&self, endpoint: &str, body: String) -> bool {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return false;
        };

        let request = self
            .http
            .post(endpoint)
            .header(CONTENT_TYPE, JSON)
            .body(body);
        let task = runtime.spawn(async move {
            // Nobody is left to report to.
            let _ = request.send().await;
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|handle| !handle.is_finished());
        pending.push(task);
        true
    }
}
