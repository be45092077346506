//! Session and activity tracking.
//!
//! One state (active) and one transition: rotate when the time since the last
//! activity exceeds the timeout at a poll. Rotation leaves `last_activity`
//! alone, so an idle session rotates again on every poll until activity
//! resumes.

use std::time::Duration;

use at_core::CoreError;
use at_core::ids::{PREFIX_SESSION, SESSION_ID_LEN, generate_id};
use chrono::{DateTime, Utc};
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct SessionMonitor {
    session_id: String,
    session_start: DateTime<Utc>,
    last_activity: Instant,
    timeout: Duration,
}

impl SessionMonitor {
    /// # Errors
    ///
    /// Returns [`CoreError::Random`] if no session id can be generated.
    pub fn new(timeout: Duration, now: Instant) -> Result<Self, CoreError> {
        Ok(Self {
            session_id: generate_id(PREFIX_SESSION, SESSION_ID_LEN)?,
            session_start: Utc::now(),
            last_activity: now,
            timeout,
        })
    }

    /// Record activity at `now`. Never moves `last_activity` backwards.
    pub fn touch(&mut self, now: Instant) {
        if now > self.last_activity {
            self.last_activity = now;
        }
    }

    /// Rotate the session if idle longer than the timeout. Returns the new
    /// session id when a rotation happened. The current session is kept if a
    /// new id cannot be generated.
    pub fn rotate_if_idle(&mut self, now: Instant) -> Option<&str> {
        if self.idle_for(now) <= self.timeout {
            return None;
        }
        self.session_id = match generate_id(PREFIX_SESSION, SESSION_ID_LEN) {
            Ok(id) => id,
            Err(error) => {
                tracing::error!(%error, "session rotation skipped");
                return None;
            }
        };
        self.session_start = Utc::now();
        Some(&self.session_id)
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    #[must_use]
    pub const fn session_start(&self) -> DateTime<Utc> {
        self.session_start
    }

    #[must_use]
    pub const fn last_activity(&self) -> Instant {
        self.last_activity
    }

    #[must_use]
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(60);

    fn monitor(now: Instant) -> SessionMonitor {
        SessionMonitor::new(TIMEOUT, now).expect("session id")
    }

    #[test]
    fn no_rotation_within_timeout() {
        let start = Instant::now();
        let mut session = monitor(start);
        let id = session.session_id().to_string();

        assert!(session.rotate_if_idle(start + TIMEOUT).is_none(), "exactly at timeout is not idle");
        assert_eq!(session.session_id(), id);
    }

    #[test]
    fn rotation_after_timeout() {
        let start = Instant::now();
        let mut session = monitor(start);
        let old = session.session_id().to_string();

        let new = session
            .rotate_if_idle(start + TIMEOUT + Duration::from_millis(1))
            .map(str::to_string)
            .expect("idle session rotates");
        assert_ne!(new, old);
        assert!(new.starts_with("ses-"));
        assert_eq!(session.session_id(), new);
    }

    #[test]
    fn activity_postpones_rotation() {
        let start = Instant::now();
        let mut session = monitor(start);
        session.touch(start + Duration::from_secs(50));
        assert!(session.rotate_if_idle(start + Duration::from_secs(100)).is_none());
        assert!(session.rotate_if_idle(start + Duration::from_secs(111)).is_some());
    }

    #[test]
    fn idle_session_keeps_rotating() {
        let start = Instant::now();
        let mut session = monitor(start);
        let later = start + TIMEOUT * 2;
        let first = session.rotate_if_idle(later).map(str::to_string);
        let second = session.rotate_if_idle(later).map(str::to_string);
        assert!(first.is_some());
        assert!(second.is_some());
        assert_ne!(first, second);
    }

    #[test]
    fn touch_is_monotonic() {
        let start = Instant::now();
        let mut session = monitor(start + Duration::from_secs(5));
        session.touch(start);
        assert_eq!(session.last_activity(), start + Duration::from_secs(5));
    }
}
