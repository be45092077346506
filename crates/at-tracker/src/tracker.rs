//! The tracker: wires identity, capture, buffering, delivery and the session
//! monitor to a host.
//!
//! [`ActionTracker::start`] registers observers with the host once and spawns
//! a single event-loop task. That task handles host signals in the order they
//! were sent, ticks the flush timer, and polls the session. Deliveries run on
//! their own tasks so capture keeps going while a batch is on the wire.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use at_config::TrackerConfig;
use at_core::timestamp::now_iso8601;
use at_core::{ActionRecord, TrackedAction};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::buffer::SharedBuffer;
use crate::context::Extractor;
use crate::delivery::{DeliveryEngine, FlushOutcome};
use crate::element::ElementRef;
use crate::host::{Capabilities, HostEnvironment, HostSignal, Visibility, signal_channel};
use crate::identity::Identity;
use crate::session::SessionMonitor;

/// Stable identifiers plus the effective settings, as logged at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackerSummary {
    pub user_id: String,
    pub session_id: String,
    pub device_id: String,
    pub endpoint: Option<String>,
    pub flush_interval_ms: u64,
    pub max_batch_size: usize,
    pub session_timeout_ms: u64,
    pub debug: bool,
}

struct Inner {
    config: TrackerConfig,
    identity: Identity,
    session: Mutex<SessionMonitor>,
    buffer: SharedBuffer,
    delivery: DeliveryEngine,
    extractor: Extractor,
    host: Arc<dyn HostEnvironment>,
    runtime: Handle,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    signals_handled: AtomicU64,
}

impl Drop for Inner {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner).drain(..) {
            task.abort();
        }
    }
}

/// Handle to a running tracker. Clones share the same pipeline.
#[derive(Clone)]
pub struct ActionTracker {
    inner: Arc<Inner>,
}

impl fmt::Debug for ActionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionTracker")
            .field("user_id", &self.inner.identity.user_id)
            .field("device_id", &self.inner.identity.device_id)
            .field("session_id", &self.session_id())
            .field("buffered", &self.buffered_len())
            .finish_non_exhaustive()
    }
}

impl ActionTracker {
    /// Start a tracker on the current Tokio runtime.
    ///
    /// Returns `None` when the host has no document, no runtime is running,
    /// or identifiers cannot be minted. Observers are registered exactly once
    /// per call; use [`crate::TrackerSlot`] to share one tracker per host.
    #[must_use]
    pub fn start(config: TrackerConfig, caps: Capabilities) -> Option<Self> {
        if !caps.host.is_available() {
            tracing::debug!("host document unavailable; tracker not started");
            return None;
        }
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("no tokio runtime running; tracker not started");
            return None;
        };

        let started = Identity::resolve(&config, caps.store.as_ref()).and_then(|identity| {
            let session = SessionMonitor::new(config.session.timeout(), Instant::now())?;
            Ok((identity, session))
        });
        let (identity, session) = match started {
            Ok(started) => started,
            Err(error) => {
                tracing::warn!(%error, "could not mint identifiers; tracker not started");
                return None;
            }
        };
        let inner = Arc::new(Inner {
            session: Mutex::new(session),
            buffer: SharedBuffer::new(config.batching.batch_threshold()),
            delivery: DeliveryEngine::new(&config.collector.endpoint, &caps, config.general.debug),
            extractor: Extractor::from_config(&config.capture),
            host: Arc::clone(&caps.host),
            identity,
            runtime,
            tasks: Mutex::new(Vec::new()),
            signals_handled: AtomicU64::new(0),
            config,
        });

        let (signals, receiver) = signal_channel();
        inner.host.register_observers(signals);

        let event_loop = inner.runtime.spawn(event_loop(
            Arc::downgrade(&inner),
            receiver,
            inner.config.batching.flush_interval(),
            inner.config.session.poll_interval(),
        ));
        inner.lock_tasks().push(event_loop);

        let tracker = Self { inner };
        if tracker.debug() {
            let summary = tracker.summary();
            tracing::debug!(
                user_id = %summary.user_id,
                session_id = %summary.session_id,
                device_id = %summary.device_id,
                endpoint = summary.endpoint.as_deref().unwrap_or("<none>"),
                flush_interval_ms = summary.flush_interval_ms,
                max_batch_size = summary.max_batch_size,
                session_timeout_ms = summary.session_timeout_ms,
                "action tracker initialized"
            );
        }
        Some(tracker)
    }

    /// Enrich `action` with identity, session and time, then buffer it.
    /// Reaching the batch threshold starts a delivery before this returns.
    pub fn track(&self, action: TrackedAction) {
        let session_id = {
            let mut session = self.inner.lock_session();
            session.touch(Instant::now());
            session.session_id().to_string()
        };
        let identity = &self.inner.identity;
        let record = action.enrich(now_iso8601(), &identity.user_id, &session_id, &identity.device_id);

        if self.debug() {
            tracing::debug!(kind = %record.kind, action = %record.action_name, "action tracked");
        }
        if self.inner.buffer.append(record) {
            self.spawn_flush(false);
        }
    }

    /// Handle a click on `target`. Returns `true` if it was on a marked
    /// element and got tracked.
    pub fn capture_click(&self, target: &ElementRef, x: f64, y: f64) -> bool {
        let host = &self.inner.host;
        match self.inner.extractor.capture_click(target, x, y, || host.page_info()) {
            Some(action) => {
                self.track(action);
                true
            }
            None => false,
        }
    }

    /// Flush and wait for the delivery to finish.
    pub async fn flush(&self, force: bool) -> FlushOutcome {
        self.inner.delivery.flush(&self.inner.buffer, force).await
    }

    /// Best-effort send of whatever is buffered, for page teardown.
    pub fn teardown_flush(&self) -> usize {
        self.inner.delivery.teardown_flush(&self.inner.buffer)
    }

    /// Mark the user active now.
    pub fn update_activity(&self) {
        self.inner.lock_session().touch(Instant::now());
    }

    /// Poll the session. Returns the new session id if it rotated.
    pub fn rotate_session_if_idle(&self) -> Option<String> {
        let rotated = self
            .inner
            .lock_session()
            .rotate_if_idle(Instant::now())
            .map(str::to_string);
        if let Some(session_id) = rotated.as_deref() {
            if self.debug() {
                tracing::debug!(session_id, "session rotated after inactivity");
            }
        }
        rotated
    }

    /// Stop the timers and the event loop. Buffered records stay put and a
    /// delivery already on the wire runs to completion.
    pub fn shutdown(&self) {
        for task in self.inner.lock_tasks().drain(..) {
            task.abort();
        }
        if self.debug() {
            tracing::debug!(buffered = self.buffered_len(), "action tracker shut down");
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.inner.identity.user_id
    }

    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.inner.identity.device_id
    }

    #[must_use]
    pub fn session_id(&self) -> String {
        self.inner.lock_session().session_id().to_string()
    }

    #[must_use]
    pub fn session_start(&self) -> DateTime<Utc> {
        self.inner.lock_session().session_start()
    }

    /// Copy of the buffered records, oldest first.
    #[must_use]
    pub fn pending(&self) -> Vec<ActionRecord> {
        self.inner.buffer.snapshot()
    }

    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.inner.buffer.len()
    }

    #[must_use]
    pub fn is_delivering(&self) -> bool {
        self.inner.delivery.is_in_flight()
    }

    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn summary(&self) -> TrackerSummary {
        let config = &self.inner.config;
        TrackerSummary {
            user_id: self.user_id().to_string(),
            session_id: self.session_id(),
            device_id: self.device_id().to_string(),
            endpoint: self.inner.delivery.endpoint().map(str::to_string),
            flush_interval_ms: config.batching.flush_interval_ms,
            max_batch_size: config.batching.batch_threshold(),
            session_timeout_ms: config.session.timeout_ms,
            debug: config.general.debug,
        }
    }

    /// How many host signals the event loop has finished handling. A host
    /// that counts its sends can wait on this to know a signal took effect.
    #[must_use]
    pub fn signals_handled(&self) -> u64 {
        self.inner.signals_handled.load(Ordering::Acquire)
    }

    fn debug(&self) -> bool {
        self.inner.config.general.debug
    }

    /// Start a delivery without waiting for it. Returns `false` if the flush
    /// was skipped.
    fn spawn_flush(&self, force: bool) -> bool {
        match self.inner.delivery.begin(&self.inner.buffer, force) {
            Ok(batch) => {
                let inner = Arc::clone(&self.inner);
                self.inner.runtime.spawn(async move {
                    inner.delivery.deliver(batch, &inner.buffer).await;
                });
                true
            }
            Err(_) => false,
        }
    }

    fn handle_signal(&self, signal: HostSignal) {
        match signal {
            HostSignal::Click { target, x, y } => {
                self.capture_click(&target, x, y);
            }
            HostSignal::PointerMove | HostSignal::Scroll | HostSignal::KeyDown | HostSignal::TouchStart => {
                self.update_activity();
            }
            HostSignal::VisibilityChange(Visibility::Hidden) => {
                self.spawn_flush(true);
            }
            HostSignal::VisibilityChange(Visibility::Visible) => {}
            HostSignal::BeforeUnload => {
                let sent = self.teardown_flush();
                if self.debug() {
                    tracing::debug!(sent, "page unloading; teardown flush");
                }
            }
        }
    }
}

impl Inner {
    fn lock_session(&self) -> MutexGuard<'_, SessionMonitor> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Runs until every [`ActionTracker`] handle is gone or the task is aborted.
async fn event_loop(
    inner: Weak<Inner>,
    mut signals: UnboundedReceiver<HostSignal>,
    flush_every: Duration,
    poll_every: Duration,
) {
    // Like setInterval: the first tick comes one period after start.
    let mut flush_timer = interval_at(Instant::now() + flush_every, flush_every);
    flush_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut session_timer = interval_at(Instant::now() + poll_every, poll_every);
    session_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut signals_open = true;

    loop {
        tokio::select! {
            biased;

            signal = signals.recv(), if signals_open => {
                let Some(signal) = signal else {
                    signals_open = false;
                    continue;
                };
                let Some(tracker) = upgrade(&inner) else { break };
                tracker.handle_signal(signal);
                tracker.inner.signals_handled.fetch_add(1, Ordering::AcqRel);
            }
            _ = flush_timer.tick() => {
                let Some(tracker) = upgrade(&inner) else { break };
                tracker.spawn_flush(false);
            }
            _ = session_timer.tick() => {
                let Some(tracker) = upgrade(&inner) else { break };
                tracker.rotate_session_if_idle();
            }
        }
    }
}

fn upgrade(inner: &Weak<Inner>) -> Option<ActionTracker> {
    inner.upgrade().map(|inner| ActionTracker { inner })
}
