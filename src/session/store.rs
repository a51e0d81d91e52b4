use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::Session;

/// Shared handle to one client's session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Maps client IP addresses to their sessions.
///
/// The remote port changes on every connection, so only the address is used
/// as the key. Without [`SessionStore::evict_idle`] (or the sweeper) every
/// session lives as long as the process.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<IpAddr, SessionHandle>>>,
    token_key: Arc<str>,
}

impl SessionStore {
    /// Creates an empty store. New sessions get a random CSRF token stored
    /// under `token_key`.
    pub fn new(token_key: impl Into<Arc<str>>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            token_key: token_key.into(),
        }
    }

    /// Returns the session for `ip`, creating it on first sight.
    pub async fn get_or_create(&self, ip: IpAddr) -> SessionHandle {
        if let Some(handle) = self.sessions.read().await.get(&ip) {
            return Arc::clone(handle);
        }

        let mut sessions = self.sessions.write().await;
        let handle = sessions.entry(ip).or_insert_with(|| {
            tracing::debug!(client = %ip, "Creating session");
            let mut session = Session::new();
            session.set(&*self.token_key, Uuid::new_v4().to_string());
            Arc::new(Mutex::new(session))
        });

        Arc::clone(handle)
    }

    pub async fn get(&self, ip: IpAddr) -> Option<SessionHandle> {
        self.sessions.read().await.get(&ip).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Removes sessions idle for longer than `max_idle`.
    ///
    /// Sessions that an in-flight request currently holds are kept.
    /// Returns the number of sessions removed.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|_, handle| {
            if Arc::strong_count(handle) > 1 {
                return true;
            }
            match handle.try_lock() {
                Ok(session) => session.idle_for() <= max_idle,
                Err(_) => true,
            }
        });

        let removed = before - sessions.len();
        if removed > 0 {
            tracing::info!(
                removed,
                remaining = sessions.len(),
                "Evicted idle sessions"
            );
        }
        removed
    }

    /// Runs [`SessionStore::evict_idle`] every `interval` until the returned
    /// task is aborted.
    pub fn spawn_sweeper(&self, interval: Duration, max_idle: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                store.evict_idle(max_idle).await;
            }
        })
    }
}
