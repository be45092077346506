//! # at-tracker
//!
//! Client-side interaction capture and batched delivery.
//!
//! The pipeline observes host signals, turns clicks on marked elements into
//! enriched [`at_core::ActionRecord`]s, buffers them in memory, and posts them
//! to a collector in batches:
//!
//! ```text
//! host signal ──► context::Extractor ──► buffer::SharedBuffer ──► delivery::DeliveryEngine
//!                                             ▲    (threshold)          │
//!                  flush timer / hidden ──────┘                         ├─► Transport (POST)
//!                  unload ──────────────────────────────────────────────┴─► BeaconTransport
//! ```
//!
//! The host (document, storage, network) is reached only through the traits in
//! [`host`], [`store`] and [`transport`], bundled as [`host::Capabilities`].

pub mod buffer;
pub mod context;
pub mod delivery;
pub mod element;
pub mod error;
pub mod headless;
pub mod host;
pub mod identity;
pub mod session;
pub mod slot;
pub mod store;
pub mod tracker;
pub mod transport;

pub use delivery::{FlushOutcome, SkipReason};
pub use element::{Element, ElementRef, StaticElement};
pub use error::{StorageError, TransportError};
pub use headless::HeadlessHost;
pub use host::{Capabilities, HostEnvironment, HostSignal, NavigatorInfo, SignalSender, Visibility};
pub use slot::TrackerSlot;
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use tracker::{ActionTracker, TrackerSummary};
pub use transport::{BeaconTransport, HttpBeacon, HttpTransport, Transport};
