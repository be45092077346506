use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::Serialize;

use at_config::TrackerConfig;
use at_core::TrackedAction;
use at_tracker::{
    ActionTracker, Capabilities, FileStore, FlushOutcome, HeadlessHost, HostEnvironment,
    HostSignal, HttpBeacon, HttpTransport, KeyValueStore, MemoryStore, TrackerSlot,
    TrackerSummary, Visibility,
};

use super::persistent_store;
use crate::cli::GlobalFlags;
use crate::cli::root_commands::ReplayArgs;
use crate::output::output;
use crate::script::{self, Step, build_target};

const BEACON_GRACE: Duration = Duration::from_secs(5);
const IDLE_POLL: Duration = Duration::from_millis(10);

#[derive(Debug, Default, Serialize)]
struct FlushTally {
    delivered: usize,
    restored: usize,
    discarded: usize,
    skipped: usize,
}

impl FlushTally {
    fn record(&mut self, outcome: FlushOutcome) {
        match outcome {
            FlushOutcome::Delivered { count } => self.delivered += count,
            FlushOutcome::Restored { count } => self.restored += count,
            FlushOutcome::Discarded { count } => self.discarded += count,
            FlushOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}

#[derive(Debug, Serialize)]
struct ReplayReport {
    tracker: TrackerSummary,
    steps: usize,
    clicks: usize,
    /// Outcomes of explicit `flush` steps and the closing flush.
    flushes: FlushTally,
    unloaded: bool,
    beacons_settled: bool,
    still_buffered: usize,
}

/// Handle `atrack replay`.
pub async fn handle(
    args: &ReplayArgs,
    mut config: TrackerConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    if let Some(endpoint) = &args.endpoint {
        config.collector.endpoint.clone_from(endpoint);
        config.validate().context("invalid --endpoint")?;
    }
    if !config.collector.is_configured() {
        tracing::warn!("no collector endpoint configured; batches will be discarded");
    }
    let steps = script::load(&args.script)?;

    let timeout = Duration::from_secs(config.collector.timeout_secs);
    let host = Arc::new(HeadlessHost::default());
    let store: Arc<dyn KeyValueStore> = match persistent_store(FileStore::default_location()) {
        Some(store) => Arc::new(store),
        None => Arc::new(MemoryStore::new()),
    };
    let http = HttpTransport::new(timeout).context("failed to build HTTP client")?;
    let beacon = Arc::new(HttpBeacon::new(http.client()));

    let slot = TrackerSlot::new();
    let tracker = slot
        .init(
            config,
            Capabilities {
                host: host.clone(),
                store,
                transport: Arc::new(http),
                beacon: beacon.clone(),
            },
        )
        .context("tracker could not start")?;

    let mut replay = Replay {
        host: &host,
        tracker: &tracker,
        timeout,
        dispatched: 0,
        clicks: 0,
        flushes: FlushTally::default(),
        unloaded: false,
    };
    for step in &steps {
        replay.apply(step).await;
    }

    if !replay.unloaded {
        wait_idle(&tracker, timeout).await;
        let outcome = tracker.flush(true).await;
        replay.flushes.record(outcome);
    }
    wait_idle(&tracker, timeout).await;
    let beacons_settled = beacon.settle(BEACON_GRACE).await;

    let summary = ReplayReport {
        tracker: tracker.summary(),
        steps: steps.len(),
        clicks: replay.clicks,
        flushes: replay.flushes,
        unloaded: replay.unloaded,
        beacons_settled,
        still_buffered: tracker.buffered_len(),
    };
    slot.clear();
    output(&summary, flags.format)
}

struct Replay<'a> {
    host: &'a HeadlessHost,
    tracker: &'a ActionTracker,
    timeout: Duration,
    /// Signals the host accepted; the tracker acknowledges each one.
    dispatched: u64,
    clicks: usize,
    flushes: FlushTally,
    unloaded: bool,
}

impl Replay<'_> {
    async fn apply(&mut self, step: &Step) {
        match step {
            Step::Page(page) => self.host.set_page(page.snapshot()),
            Step::Click { path, x, y } => {
                self.clicks += 1;
                self.dispatch(HostSignal::Click {
                    target: build_target(path),
                    x: *x,
                    y: *y,
                });
            }
            Step::Activity { kind } => self.dispatch(kind.signal()),
            Step::Track { name } => {
                self.tracker
                    .track(TrackedAction::custom(name.clone(), self.host.page_info()));
            }
            Step::Wait { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
            Step::Hide => self.dispatch(HostSignal::VisibilityChange(Visibility::Hidden)),
            Step::Show => self.dispatch(HostSignal::VisibilityChange(Visibility::Visible)),
            Step::Flush => {
                wait_idle(self.tracker, self.timeout).await;
                let outcome = self.tracker.flush(false).await;
                self.flushes.record(outcome);
            }
            Step::Unload => {
                self.dispatch(HostSignal::BeforeUnload);
                self.unloaded = true;
            }
        }
        self.wait_handled().await;
    }

    fn dispatch(&mut self, signal: HostSignal) {
        if self.host.dispatch(signal) {
            self.dispatched += 1;
        } else {
            tracing::warn!("tracker is not observing the host; signal dropped");
        }
    }

    /// Wait until the tracker has handled every signal sent so far.
    async fn wait_handled(&self) {
        let tracker = self.tracker;
        let dispatched = self.dispatched;
        let waited = tokio::time::timeout(self.timeout, async {
            while tracker.signals_handled() < dispatched {
                tokio::task::yield_now().await;
            }
        })
        .await;
        if waited.is_err() {
            tracing::warn!(dispatched, handled = tracker.signals_handled(), "signals still queued");
        }
    }
}

/// Wait for a background delivery to finish, up to `timeout`.
async fn wait_idle(tracker: &ActionTracker, timeout: Duration) {
    let waited = tokio::time::timeout(timeout, async {
        while tracker.is_delivering() {
            tokio::time::sleep(IDLE_POLL).await;
        }
    })
    .await;
    if waited.is_err() {
        tracing::warn!(?timeout, "delivery still in flight");
    }
}
