//! In-memory action buffer.
//!
//! `append`, `drain` and `restore` are the only mutations and none of them
//! suspends, so the lock is never held across an await. `drain` is the sole
//! hand-off to delivery: a record is either buffered or in flight, never both.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use at_core::ActionRecord;

/// Ordered queue of records with a flush threshold.
#[derive(Debug)]
pub struct ActionBuffer {
    records: VecDeque<ActionRecord>,
    threshold: usize,
}

impl ActionBuffer {
    #[must_use]
    pub fn new(threshold: usize) -> Self {
        Self {
            records: VecDeque::new(),
            threshold: threshold.max(1),
        }
    }

    /// Add to the tail. Returns `true` when the buffer has reached the
    /// threshold and should be flushed.
    pub fn append(&mut self, record: ActionRecord) -> bool {
        self.records.push_back(record);
        self.records.len() >= self.threshold
    }

    /// Remove and return everything, oldest first.
    pub fn drain(&mut self) -> Vec<ActionRecord> {
        self.records.drain(..).collect()
    }

    /// Put a failed batch back at the head, ahead of anything appended since
    /// it was drained.
    pub fn restore(&mut self, batch: Vec<ActionRecord>) {
        let mut restored = VecDeque::from(batch);
        restored.append(&mut self.records);
        self.records = restored;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub const fn threshold(&self) -> usize {
        self.threshold
    }

    /// Copy of the current contents, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ActionRecord> {
        self.records.iter().cloned().collect()
    }
}

/// [`ActionBuffer`] behind a mutex, shared by the tracker and delivery tasks.
#[derive(Debug)]
pub struct SharedBuffer {
    inner: Mutex<ActionBuffer>,
}

impl SharedBuffer {
    #[must_use]
    pub fn new(threshold: usize) -> Self {
        Self {
            inner: Mutex::new(ActionBuffer::new(threshold)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ActionBuffer> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// See [`ActionBuffer::append`].
    pub fn append(&self, record: ActionRecord) -> bool {
        self.lock().append(record)
    }

    pub fn drain(&self) -> Vec<ActionRecord> {
        self.lock().drain()
    }

    pub fn restore(&self, batch: Vec<ActionRecord>) {
        if !batch.is_empty() {
            self.lock().restore(batch);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<ActionRecord> {
        self.lock().snapshot()
    }
}
