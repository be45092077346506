//! Host environment capabilities.
//!
//! Everything the tracker needs from its surroundings (interaction signals,
//! page state, persistence, network) comes through these seams so the pipeline
//! runs the same in a browser binding, a headless replay, or a test.

use std::fmt;
use std::sync::Arc;

use at_core::PageSnapshot;
use tokio::sync::mpsc;

use crate::element::ElementRef;
use crate::store::KeyValueStore;
use crate::transport::{BeaconTransport, Transport};

/// Document visibility as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// One notification from the host's event loop.
#[derive(Debug, Clone)]
pub enum HostSignal {
    /// A click, observed in the capture phase so page handlers cannot hide it.
    Click { target: ElementRef, x: f64, y: f64 },
    PointerMove,
    Scroll,
    KeyDown,
    TouchStart,
    VisibilityChange(Visibility),
    /// The page is about to be destroyed.
    BeforeUnload,
}

/// Where the host delivers [`HostSignal`]s. Signals are handled in send order.
#[derive(Debug, Clone)]
pub struct SignalSender(mpsc::UnboundedSender<HostSignal>);

impl SignalSender {
    /// Returns `false` once the tracker has shut down.
    pub fn send(&self, signal: HostSignal) -> bool {
        self.0.send(signal).is_ok()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

pub(crate) fn signal_channel() -> (SignalSender, mpsc::UnboundedReceiver<HostSignal>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SignalSender(tx), rx)
}

/// Browser-like identification sent with every batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigatorInfo {
    pub user_agent: String,
    pub language: String,
}

impl Default for NavigatorInfo {
    fn default() -> Self {
        Self {
            user_agent: crate::transport::USER_AGENT.to_string(),
            language: "en-US".to_string(),
        }
    }
}

/// The document/window the tracker observes.
pub trait HostEnvironment: Send + Sync {
    /// Whether a document is present at all. The tracker refuses to start
    /// when this is `false`.
    fn is_available(&self) -> bool {
        true
    }

    /// Start forwarding click, pointer-move, scroll, key-down, touch-start,
    /// visibility and before-unload signals. Called once per tracker.
    fn register_observers(&self, signals: SignalSender);

    /// Current page state. Must not be cached by the host.
    fn page_info(&self) -> PageSnapshot;

    fn navigator(&self) -> NavigatorInfo;
}

/// Every capability a tracker is constructed with.
#[derive(Clone)]
pub struct Capabilities {
    pub host: Arc<dyn HostEnvironment>,
    pub store: Arc<dyn KeyValueStore>,
    pub transport: Arc<dyn Transport>,
    pub beacon: Arc<dyn BeaconTransport>,
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities").finish_non_exhaustive()
    }
}
