//! Delivery pipeline integration tests
//!
//! Capture through buffering to the collector, against recording transports:
//! - Ordering within a batch
//! - Size-triggered flush draining before the next append
//! - Failed delivery restoring records ahead of newer ones
//! - Single-flight under concurrent triggers
//! - Forced flush on an empty buffer, untracked clicks, missing endpoint

mod common;

use chrono::DateTime;
use pretty_assertions::assert_eq;

use at_config::TrackerConfig;
use at_tracker::{FlushOutcome, HostSignal, SkipReason};
use common::{ENDPOINT, Harness, RecordingTransport, config, marked, settle, unmarked};

fn names(tracker: &at_tracker::ActionTracker) -> Vec<String> {
    tracker.pending().into_iter().map(|r| r.action_name).collect()
}

// ---------------------------------------------------------------------------
// Collector scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn two_marked_clicks_produce_one_post() {
    let harness = Harness::new(RecordingTransport::new());
    let tracker = harness.start(config(2));

    harness.host.dispatch(HostSignal::Click { target: marked("first"), x: 1.0, y: 2.0 });
    harness.host.dispatch(HostSignal::Click { target: marked("second"), x: 3.0, y: 4.0 });
    settle().await;

    let posts = harness.transport.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].endpoint, ENDPOINT);
    assert_eq!(posts[0].body["batch"].as_array().map(Vec::len), Some(2));

    let sent_at = posts[0].body["meta"]["sentAt"].as_str().expect("sentAt is a string");
    assert!(DateTime::parse_from_rfc3339(sent_at).is_ok(), "not ISO 8601: {sent_at}");
    assert_eq!(posts[0].body["meta"]["userAgent"], "test-agent/1.0");
    assert_eq!(posts[0].body["meta"]["language"], "de-DE");
    assert!(tracker.pending().is_empty());
    tracker.shutdown();
}

#[tokio::test]
async fn rejected_post_is_redelivered_with_newer_records() {
    let harness = Harness::new(RecordingTransport::new().failing(1));
    let tracker = harness.start(config(2));

    harness.host.dispatch(HostSignal::Click { target: marked("a"), x: 0.0, y: 0.0 });
    harness.host.dispatch(HostSignal::Click { target: marked("b"), x: 0.0, y: 0.0 });
    settle().await;

    assert_eq!(harness.transport.post_count(), 1);
    assert_eq!(names(&tracker), vec!["a", "b"]);
    assert!(!tracker.is_delivering());

    // Buffer is over threshold again after this append.
    harness.host.dispatch(HostSignal::Click { target: marked("c"), x: 0.0, y: 0.0 });
    settle().await;

    let posts = harness.transport.posts();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[1].action_names(), vec!["a", "b", "c"]);
    assert!(tracker.pending().is_empty());
    tracker.shutdown();
}

#[tokio::test]
async fn records_carry_identity_and_page() {
    let harness = Harness::new(RecordingTransport::new());
    let tracker = harness.start(config(1));

    harness.host.dispatch(HostSignal::Click { target: marked("buy"), x: 5.0, y: 6.0 });
    settle().await;

    let posts = harness.transport.posts();
    let record = &posts[0].body["batch"][0];
    assert_eq!(record["type"], "click");
    assert_eq!(record["actionName"], "buy");
    assert_eq!(record["userId"], tracker.user_id());
    assert_eq!(record["deviceId"], tracker.device_id());
    assert_eq!(record["sessionId"], tracker.session_id());
    assert_eq!(record["element"]["tag"], "button");
    assert_eq!(record["element"]["text"], "Do buy");
    assert_eq!(record["element"]["attributes"]["data-variant"], "primary");
    assert_eq!(record["event"]["x"], 5.0);
    assert_eq!(record["page"]["path"], "/cart");
    assert_eq!(record["page"]["width"], 1280);
    tracker.shutdown();
}

#[tokio::test]
async fn page_state_is_read_at_capture_time() {
    let harness = Harness::new(RecordingTransport::new());
    let tracker = harness.start(config(10));

    assert!(tracker.capture_click(&marked("one"), 0.0, 0.0));
    harness.host.set_title("Checkout");
    assert!(tracker.capture_click(&marked("two"), 0.0, 0.0));

    let pending = tracker.pending();
    assert_eq!(pending[0].page.title, "Cart");
    assert_eq!(pending[1].page.title, "Checkout");
    tracker.shutdown();
}

// ---------------------------------------------------------------------------
// Buffer properties
// ---------------------------------------------------------------------------

#[tokio::test]
async fn batch_preserves_call_order() {
    let harness = Harness::new(RecordingTransport::new());
    let tracker = harness.start(config(100));

    let expected: Vec<String> = (0..25).map(|i| format!("action-{i}")).collect();
    for name in &expected {
        assert!(tracker.capture_click(&marked(name), 0.0, 0.0));
    }

    assert_eq!(tracker.flush(false).await, FlushOutcome::Delivered { count: 25 });
    assert_eq!(harness.transport.posts()[0].action_names(), expected);
    tracker.shutdown();
}

#[tokio::test]
async fn threshold_drains_before_next_append() {
    let harness = Harness::new(RecordingTransport::new().gated());
    let tracker = harness.start(config(3));

    for name in ["a", "b", "c"] {
        tracker.capture_click(&marked(name), 0.0, 0.0);
    }
    assert!(tracker.pending().is_empty(), "threshold append drains synchronously");
    assert!(tracker.is_delivering());

    tracker.capture_click(&marked("d"), 0.0, 0.0);
    assert_eq!(names(&tracker), vec!["d"]);

    harness.transport.release(1);
    settle().await;

    let posts = harness.transport.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].action_names(), vec!["a", "b", "c"]);
    assert_eq!(names(&tracker), vec!["d"]);
    tracker.shutdown();
}

#[tokio::test]
async fn failed_batch_goes_ahead_of_records_captured_meanwhile() {
    let harness = Harness::new(RecordingTransport::new().gated().failing(1));
    let tracker = harness.start(config(2));

    tracker.capture_click(&marked("a"), 0.0, 0.0);
    tracker.capture_click(&marked("b"), 0.0, 0.0);
    settle().await;
    assert!(tracker.is_delivering());

    tracker.capture_click(&marked("c"), 0.0, 0.0);
    assert_eq!(names(&tracker), vec!["c"]);

    harness.transport.release(1);
    settle().await;

    assert_eq!(names(&tracker), vec!["a", "b", "c"]);
    assert!(!tracker.is_delivering());
    tracker.shutdown();
}

// ---------------------------------------------------------------------------
// Single-flight
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_triggers_never_overlap() {
    let harness = Harness::new(RecordingTransport::new().gated());
    let tracker = harness.start(config(1));

    tracker.capture_click(&marked("a"), 0.0, 0.0);
    settle().await;
    assert_eq!(harness.transport.post_count(), 1);

    // Threshold, forced and timer-style triggers while the first is held.
    tracker.capture_click(&marked("b"), 0.0, 0.0);
    tracker.capture_click(&marked("c"), 0.0, 0.0);
    assert_eq!(
        tracker.flush(true).await,
        FlushOutcome::Skipped(SkipReason::InFlight)
    );
    harness.host.dispatch(HostSignal::VisibilityChange(at_tracker::Visibility::Hidden));
    settle().await;

    assert_eq!(harness.transport.post_count(), 1, "dropped, not queued");
    assert_eq!(names(&tracker), vec!["b", "c"]);

    harness.transport.release(10);
    settle().await;
    assert_eq!(tracker.flush(false).await, FlushOutcome::Delivered { count: 2 });

    assert_eq!(harness.transport.max_concurrency(), 1);
    assert_eq!(harness.transport.posts()[1].action_names(), vec!["b", "c"]);
    tracker.shutdown();
}

// ---------------------------------------------------------------------------
// No-ops
// ---------------------------------------------------------------------------

#[tokio::test]
async fn forced_flush_on_empty_buffer_sends_nothing() {
    let harness = Harness::new(RecordingTransport::new());
    let tracker = harness.start(config(5));

    assert_eq!(tracker.flush(true).await, FlushOutcome::Skipped(SkipReason::Empty));
    assert_eq!(tracker.flush(false).await, FlushOutcome::Skipped(SkipReason::Empty));
    assert_eq!(harness.transport.post_count(), 0);
    tracker.shutdown();
}

#[tokio::test]
async fn unmarked_click_is_ignored() {
    let harness = Harness::new(RecordingTransport::new());
    let tracker = harness.start(config(1));

    harness.host.dispatch(HostSignal::Click { target: unmarked(), x: 0.0, y: 0.0 });
    settle().await;

    assert_eq!(tracker.buffered_len(), 0);
    assert_eq!(harness.transport.post_count(), 0);
    tracker.shutdown();
}

#[tokio::test]
async fn missing_endpoint_skips_network() {
    let harness = Harness::new(RecordingTransport::new());
    let mut config = TrackerConfig::default();
    config.batching.max_batch_size = 2;
    let tracker = harness.start(config);

    tracker.capture_click(&marked("a"), 0.0, 0.0);
    assert_eq!(tracker.flush(false).await, FlushOutcome::Discarded { count: 1 });
    assert_eq!(tracker.teardown_flush(), 0);
    assert_eq!(harness.transport.post_count(), 0);
    assert!(harness.beacon.sent().is_empty());
    tracker.shutdown();
}
