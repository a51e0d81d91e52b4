//! Per-client session state.
//!
//! Sessions are keyed by the client IP address. They track the last time the
//! client was served and whether it is authorized, and carry arbitrary
//! string values for route handlers (the CSRF token among them).

mod store;

pub use store::{SessionHandle, SessionStore};

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct Session {
    /// When the last request from this client completed.
    pub last_connection: DateTime<Utc>,
    pub authorized: bool,
    /// Values that need to persist across requests.
    pub objects: HashMap<String, String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            last_connection: Utc::now(),
            authorized: false,
            objects: HashMap::new(),
        }
    }

    /// Records activity now. Never moves the timestamp backwards.
    pub fn touch(&mut self) {
        self.last_connection = self.last_connection.max(Utc::now());
    }

    /// Time since the last completed request.
    pub fn idle_for(&self) -> Duration {
        (Utc::now() - self.last_connection)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// True once the idle time exceeds `expiration`.
    pub fn is_expired(&self, expiration: Duration) -> bool {
        self.idle_for() > expiration
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.objects.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.objects.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.objects.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_is_unauthorized_and_not_expired() {
        let session = Session::new();

        assert!(!session.authorized);
        assert!(session.objects.is_empty());
        assert!(!session.is_expired(Duration::from_secs(60)));
    }

    #[test]
    fn expires_after_threshold() {
        let mut session = Session::new();
        session.last_connection = Utc::now() - chrono::Duration::seconds(61);

        assert!(session.is_expired(Duration::from_secs(60)));
        assert!(!session.is_expired(Duration::from_secs(120)));
    }

    #[test]
    fn touch_is_monotonic() {
        let mut session = Session::new();
        let future = Utc::now() + chrono::Duration::seconds(30);
        session.last_connection = future;

        session.touch();

        assert_eq!(session.last_connection, future);
    }

    #[test]
    fn touch_refreshes_stale_session() {
        let mut session = Session::new();
        session.last_connection = Utc::now() - chrono::Duration::seconds(300);

        session.touch();

        assert!(session.idle_for() < Duration::from_secs(5));
    }

    #[test]
    fn object_values() {
        let mut session = Session::new();
        session.set("user", "frodo");

        assert_eq!(session.get("user"), Some("frodo"));
        assert_eq!(session.remove("user").as_deref(), Some("frodo"));
        assert_eq!(session.get("user"), None);
    }
}
