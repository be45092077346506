//! Batch delivery with single-flight.
//!
//! A flush is split in two so the caller can drain synchronously and await
//! the network separately:
//!
//! 1. [`DeliveryEngine::begin`] checks and sets the in-flight flag, then
//!    drains the buffer. Nothing suspends.
//! 2. [`DeliveryEngine::deliver`] serializes and posts. On failure the batch
//!    goes back to the head of the buffer before the flag clears.
//!
//! Teardown bypasses the flag entirely and never restores.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use at_core::payload::serialize_batch;
use at_core::timestamp::now_iso8601;
use at_core::{ActionRecord, CoreError, SendMeta};

use crate::buffer::SharedBuffer;
use crate::host::{Capabilities, HostEnvironment};
use crate::transport::{BeaconTransport, Transport};

/// Why a flush did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another delivery holds the flag. The request is dropped, not queued.
    InFlight,
    /// Nothing to send.
    Empty,
}

/// Result of one flush attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    Skipped(SkipReason),
    /// Drained with no endpoint configured; the records are gone.
    Discarded { count: usize },
    Delivered { count: usize },
    /// Delivery failed and the records are back at the head of the buffer.
    Restored { count: usize },
}

impl FlushOutcome {
    /// Records that left the buffer for good.
    #[must_use]
    pub const fn settled(self) -> usize {
        match self {
            Self::Discarded { count } | Self::Delivered { count } => count,
            Self::Skipped(_) | Self::Restored { .. } => 0,
        }
    }
}

/// Clears the in-flight flag when dropped.
#[derive(Debug)]
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A drained batch holding the single-flight flag.
#[derive(Debug)]
pub struct PreparedBatch {
    records: Vec<ActionRecord>,
    guard: InFlightGuard,
}

impl PreparedBatch {
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub struct DeliveryEngine {
    endpoint: Option<String>,
    transport: Arc<dyn Transport>,
    beacon: Arc<dyn BeaconTransport>,
    host: Arc<dyn HostEnvironment>,
    in_flight: Arc<AtomicBool>,
    debug: bool,
}

impl fmt::Debug for DeliveryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryEngine")
            .field("endpoint", &self.endpoint)
            .field("in_flight", &self.is_in_flight())
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl DeliveryEngine {
    /// An empty `endpoint` means delivery is switched off.
    #[must_use]
    pub fn new(endpoint: &str, caps: &Capabilities, debug: bool) -> Self {
        Self {
            endpoint: Some(endpoint.trim().to_string()).filter(|e| !e.is_empty()),
            transport: Arc::clone(&caps.transport),
            beacon: Arc::clone(&caps.beacon),
            host: Arc::clone(&caps.host),
            in_flight: Arc::new(AtomicBool::new(false)),
            debug,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Take the flag and drain `buffer`.
    ///
    /// # Errors
    ///
    /// Returns the [`FlushOutcome::Skipped`] to report when another delivery
    /// is in flight or there is nothing to send. A forced call on an empty
    /// buffer still skips once the drain comes back empty.
    pub fn begin(&self, buffer: &SharedBuffer, force: bool) -> Result<PreparedBatch, FlushOutcome> {
        if self.is_in_flight() {
            return Err(FlushOutcome::Skipped(SkipReason::InFlight));
        }
        if !force && buffer.is_empty() {
            return Err(FlushOutcome::Skipped(SkipReason::Empty));
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(FlushOutcome::Skipped(SkipReason::InFlight));
        }
        let guard = InFlightGuard(Arc::clone(&self.in_flight));

        let records = buffer.drain();
        if records.is_empty() {
            return Err(FlushOutcome::Skipped(SkipReason::Empty));
        }
        Ok(PreparedBatch { records, guard })
    }

    /// Send a prepared batch. The flag is released only after a failed batch
    /// has been restored.
    pub async fn deliver(&self, batch: PreparedBatch, buffer: &SharedBuffer) -> FlushOutcome {
        let PreparedBatch { records, guard } = batch;
        let count = records.len();

        let outcome = match self.endpoint.as_deref() {
            None => {
                if self.debug {
                    tracing::debug!(count, "no collector endpoint configured; batch discarded");
                }
                FlushOutcome::Discarded { count }
            }
            Some(endpoint) => match self.payload(&records) {
                Ok(body) => match self.transport.post(endpoint, body).await {
                    Ok(()) => {
                        if self.debug {
                            tracing::debug!(count, endpoint, "batch delivered");
                        }
                        FlushOutcome::Delivered { count }
                    }
                    Err(error) => {
                        tracing::error!(%error, count, endpoint, "batch delivery failed; records restored");
                        buffer.restore(records);
                        FlushOutcome::Restored { count }
                    }
                },
                Err(error) => {
                    tracing::error!(%error, count, "batch serialization failed; records restored");
                    buffer.restore(records);
                    FlushOutcome::Restored { count }
                }
            },
        };

        drop(guard);
        outcome
    }

    /// [`Self::begin`] then [`Self::deliver`].
    pub async fn flush(&self, buffer: &SharedBuffer, force: bool) -> FlushOutcome {
        match self.begin(buffer, force) {
            Ok(batch) => self.deliver(batch, buffer).await,
            Err(skipped) => skipped,
        }
    }

    /// Best-effort send on teardown. Returns how many records were handed to
    /// the beacon. A refused hand-off puts the records back so a later flush
    /// can still deliver them; with no endpoint they are dropped.
    pub fn teardown_flush(&self, buffer: &SharedBuffer) -> usize {
        let records = buffer.drain();
        if records.is_empty() {
            return 0;
        }
        let count = records.len();

        let Some(endpoint) = self.endpoint.as_deref() else {
            if self.debug {
                tracing::debug!(count, "teardown with no collector endpoint; batch discarded");
            }
            return 0;
        };

        let body = match self.payload(&records) {
            Ok(body) => body,
            Err(error) => {
                tracing::error!(%error, count, "teardown batch serialization failed");
                buffer.restore(records);
                return 0;
            }
        };

        if self.beacon.send_beacon(endpoint, body) {
            if self.debug {
                tracing::debug!(count, endpoint, "teardown batch queued on beacon");
            }
            count
        } else {
            tracing::warn!(count, endpoint, "beacon refused teardown batch; kept in buffer");
            buffer.restore(records);
            0
        }
    }

    fn payload(&self, records: &[ActionRecord]) -> Result<String, CoreError> {
        let navigator = self.host.navigator();
        let meta = SendMeta {
            sent_at: now_iso8601(),
            user_agent: navigator.user_agent,
            language: navigator.language,
        };
        serialize_batch(&meta, records)
    }
}
