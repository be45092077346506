//! In-process host with no real document.
//!
//! The embedding code drives it directly: set the page, then
//! [`HeadlessHost::dispatch`] signals as if a user were interacting.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use at_core::PageSnapshot;

use crate::host::{HostEnvironment, HostSignal, NavigatorInfo, SignalSender};

#[derive(Debug)]
pub struct HeadlessHost {
    available: bool,
    page: Mutex<PageSnapshot>,
    navigator: NavigatorInfo,
    observers: Mutex<Vec<SignalSender>>,
    registrations: AtomicUsize,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new(PageSnapshot::default(), NavigatorInfo::default())
    }
}

impl HeadlessHost {
    #[must_use]
    pub fn new(page: PageSnapshot, navigator: NavigatorInfo) -> Self {
        Self {
            available: true,
            page: Mutex::new(page),
            navigator,
            observers: Mutex::new(Vec::new()),
            registrations: AtomicUsize::new(0),
        }
    }

    /// A host without a document; trackers refuse to start on it.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }

    /// Replace the page state returned by subsequent `page_info` calls.
    pub fn set_page(&self, page: PageSnapshot) {
        *self.page.lock().unwrap_or_else(PoisonError::into_inner) = page;
    }

    /// Update only the title, as a single-page app would.
    pub fn set_title(&self, title: impl Into<String>) {
        self.page.lock().unwrap_or_else(PoisonError::into_inner).title = title.into();
    }

    /// Deliver `signal` to every registered observer. Returns `false` if no
    /// live observer received it.
    pub fn dispatch(&self, signal: HostSignal) -> bool {
        let mut observers = self.observers.lock().unwrap_or_else(PoisonError::into_inner);
        observers.retain(|sender| !sender.is_closed());
        let mut delivered = false;
        for sender in observers.iter() {
            delivered |= sender.send(signal.clone());
        }
        delivered
    }

    /// How many times observers were registered over the host's lifetime.
    #[must_use]
    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }
}

impl HostEnvironment for HeadlessHost {
    fn is_available(&self) -> bool {
        self.available
    }

    fn register_observers(&self, signals: SignalSender) {
        self.registrations.fetch_add(1, Ordering::SeqCst);
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(signals);
    }

    fn page_info(&self) -> PageSnapshot {
        self.page.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn navigator(&self) -> NavigatorInfo {
        self.navigator.clone()
    }
}
