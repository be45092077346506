//! One tracker per host.

use std::sync::{Mutex, MutexGuard, PoisonError};

use at_config::TrackerConfig;

use crate::host::Capabilities;
use crate::tracker::ActionTracker;

/// Holds at most one [`ActionTracker`]. The embedder keeps one slot per host
/// (a `static` works, since [`TrackerSlot::new`] is `const`).
///
/// ```no_run
/// use at_tracker::TrackerSlot;
///
/// static TRACKER: TrackerSlot = TrackerSlot::new();
/// ```
#[derive(Debug, Default)]
pub struct TrackerSlot {
    tracker: Mutex<Option<ActionTracker>>,
}

impl TrackerSlot {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tracker: Mutex::new(None),
        }
    }

    /// Return the tracker already in the slot, or start one.
    ///
    /// A second call never registers observers or timers again; its `config`
    /// and `caps` are ignored. Returns `None` (and leaves the slot empty) when
    /// the tracker cannot start.
    pub fn init(&self, config: TrackerConfig, caps: Capabilities) -> Option<ActionTracker> {
        let mut slot = self.lock();
        if let Some(existing) = slot.as_ref() {
            return Some(existing.clone());
        }
        let tracker = ActionTracker::start(config, caps)?;
        *slot = Some(tracker.clone());
        Some(tracker)
    }

    #[must_use]
    pub fn get(&self) -> Option<ActionTracker> {
        self.lock().clone()
    }

    /// Shut down and remove the tracker, if any.
    pub fn clear(&self) -> Option<ActionTracker> {
        let tracker = self.lock().take()?;
        tracker.shutdown();
        Some(tracker)
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActionTracker>> {
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
