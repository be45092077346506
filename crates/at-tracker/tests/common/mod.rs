//! Shared doubles for the tracker integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use at_config::TrackerConfig;
use at_core::PageSnapshot;
use at_tracker::{
    ActionTracker, BeaconTransport, Capabilities, ElementRef, HeadlessHost, MemoryStore,
    NavigatorInfo, StaticElement, Transport, TransportError,
};

pub const ENDPOINT: &str = "https://collector.test";

// ---------------------------------------------------------------------------
// Transports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Post {
    pub endpoint: String,
    pub body: serde_json::Value,
}

impl Post {
    /// `actionName` of every record in the batch, in order.
    pub fn action_names(&self) -> Vec<String> {
        self.body["batch"]
            .as_array()
            .map(|batch| {
                batch
                    .iter()
                    .map(|record| record["actionName"].as_str().unwrap_or_default().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Records every POST. Can be scripted to fail the first N attempts and to
/// hold each attempt until [`RecordingTransport::release`] is called.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    posts: Mutex<Vec<Post>>,
    failures_left: AtomicUsize,
    gate: Option<Semaphore>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing(self, attempts: usize) -> Self {
        self.failures_left.store(attempts, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    /// Let `n` held attempts complete.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post(&self, endpoint: &str, body: String) -> Result<(), TransportError> {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        self.posts.lock().unwrap().push(Post {
            endpoint: endpoint.to_string(),
            body: serde_json::from_str(&body).expect("payload is JSON"),
        });

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        let fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if fail {
            Err(TransportError::Rejected("scripted failure".into()))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingBeacon {
    sent: Mutex<Vec<Post>>,
}

impl RecordingBeacon {
    pub fn sent(&self) -> Vec<Post> {
        self.sent.lock().unwrap().clone()
    }
}

impl BeaconTransport for RecordingBeacon {
    fn send_beacon(&self, endpoint: &str, body: String) -> bool {
        self.sent.lock().unwrap().push(Post {
            endpoint: endpoint.to_string(),
            body: serde_json::from_str(&body).expect("payload is JSON"),
        });
        true
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub host: Arc<HeadlessHost>,
    pub store: Arc<MemoryStore>,
    pub transport: Arc<RecordingTransport>,
    pub beacon: Arc<RecordingBeacon>,
}

impl Harness {
    pub fn new(transport: RecordingTransport) -> Self {
        let host = HeadlessHost::new(
            PageSnapshot {
                url: "https://shop.test/cart".into(),
                path: "/cart".into(),
                referrer: String::new(),
                title: "Cart".into(),
                width: 1280,
                height: 800,
            },
            NavigatorInfo {
                user_agent: "test-agent/1.0".into(),
                language: "de-DE".into(),
            },
        );
        Self {
            host: Arc::new(host),
            store: Arc::new(MemoryStore::new()),
            transport: Arc::new(transport),
            beacon: Arc::new(RecordingBeacon::default()),
        }
    }

    pub fn caps(&self) -> Capabilities {
        Capabilities {
            host: self.host.clone(),
            store: self.store.clone(),
            transport: self.transport.clone(),
            beacon: self.beacon.clone(),
        }
    }

    pub fn start(&self, config: TrackerConfig) -> ActionTracker {
        ActionTracker::start(config, self.caps()).expect("tracker starts on a headless host")
    }
}

/// Endpoint set, the given batch size, and timers far enough out that they
/// never fire unless a test moves the clock.
pub fn config(max_batch_size: usize) -> TrackerConfig {
    let mut config = TrackerConfig::for_endpoint(ENDPOINT);
    config.batching.max_batch_size = max_batch_size;
    config.batching.flush_interval_ms = 100_000;
    config
}

/// Let spawned tasks run until they block.
pub async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

// ---------------------------------------------------------------------------
// Elements
// ---------------------------------------------------------------------------

/// `<html><body><button action-name={name}>` (returns the button).
pub fn marked(name: &str) -> ElementRef {
    let html = StaticElement::document_root();
    let body = StaticElement::new("body").child_of(&html);
    StaticElement::new("button")
        .attr("action-name", name)
        .attr("data-variant", "primary")
        .text(format!("Do {name}"))
        .child_of(&body)
}

/// `<html><body><p>` with no marker anywhere.
pub fn unmarked() -> ElementRef {
    let html = StaticElement::document_root();
    let body = StaticElement::new("body").child_of(&html);
    StaticElement::new("p").text("plain text").child_of(&body)
}
