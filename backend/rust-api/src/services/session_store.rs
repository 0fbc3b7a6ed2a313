use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::metrics::PROXY_SESSIONS_ACTIVE;

/// Sessions are reaped at a fixed age from creation, not last use. Actively
/// studying users are logged out at the cutoff too; a flagged simplification.
pub const SESSION_TTL: Duration = Duration::from_secs(30 * 60);
pub const REAPER_INTERVAL: Duration = Duration::from_secs(30 * 60);

const EDUPAGE_TIMEOUT_SECS: u64 = 15;

/// One authenticated browser identity against one school host. The cookie
/// jar lives inside the reqwest client and is never shared across sessions.
pub struct ProxySession {
    pub id: String,
    pub client: reqwest::Client,
    pub base_url: String,
    pub created_at: Instant,
    pub demo: bool,
}

pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<ProxySession>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_ttl(SESSION_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Allocates a fresh cookie jar bound to the school host and registers
    /// the session under a random opaque id. Created before the login
    /// succeeds, so the in-flight handshake has a jar to fill.
    pub fn create(&self, ebuid: &str) -> Result<Arc<ProxySession>> {
        self.insert(ebuid, false)
    }

    /// Demo sessions skip the network handshake entirely and serve the
    /// synthetic snapshot. First-class branch, not an error path.
    pub fn create_demo(&self, ebuid: &str) -> Result<Arc<ProxySession>> {
        self.insert(ebuid, true)
    }

    fn insert(&self, ebuid: &str, demo: bool) -> Result<Arc<ProxySession>> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(EDUPAGE_TIMEOUT_SECS))
            .build()
            .context("Failed to build EduPage HTTP client")?;

        let session = Arc::new(ProxySession {
            id: Uuid::new_v4().to_string(),
            client,
            base_url: derive_base_url(ebuid),
            created_at: Instant::now(),
            demo,
        });

        let mut sessions = self.sessions.lock().expect("session store lock poisoned");
        sessions.insert(session.id.clone(), session.clone());
        PROXY_SESSIONS_ACTIVE.set(sessions.len() as i64);

        Ok(session)
    }

    /// Expired sessions are dropped here as well, so a session past its TTL
    /// is never returned between reaper sweeps.
    pub fn get(&self, session_id: &str) -> Option<Arc<ProxySession>> {
        let mut sessions = self.sessions.lock().expect("session store lock poisoned");

        let expired = match sessions.get(session_id) {
            Some(session) => session.created_at.elapsed() >= self.ttl,
            None => return None,
        };

        if expired {
            sessions.remove(session_id);
            PROXY_SESSIONS_ACTIVE.set(sessions.len() as i64);
            return None;
        }

        sessions.get(session_id).cloned()
    }

    pub fn remove(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().expect("session store lock poisoned");
        sessions.remove(session_id);
        PROXY_SESSIONS_ACTIVE.set(sessions.len() as i64);
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One reaper sweep; returns how many sessions were deleted.
    pub fn reap_expired(&self) -> usize {
        let mut sessions = self.sessions.lock().expect("session store lock poisoned");
        let before = sessions.len();
        sessions.retain(|_, session| session.created_at.elapsed() < self.ttl);
        PROXY_SESSIONS_ACTIVE.set(sessions.len() as i64);
        before - sessions.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Background task scanning for over-age sessions.
pub fn spawn_reaper(store: Arc<SessionStore>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // First tick fires immediately; skip it.
        interval.tick().await;
        loop {
            interval.tick().await;
            let reaped = store.reap_expired();
            if reaped > 0 {
                tracing::info!("Session reaper removed {} expired session(s)", reaped);
            }
        }
    });
}

/// Bare subdomain → EduPage host; a fully-qualified value is an override.
fn derive_base_url(ebuid: &str) -> String {
    let ebuid = ebuid.trim().trim_end_matches('/');
    if ebuid.starts_with("http://") || ebuid.starts_with("https://") {
        ebuid.to_string()
    } else if ebuid.contains('.') {
        format!("https://{}", ebuid)
    } else {
        format!("https://{}.edupage.org", ebuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_base_url() {
        assert_eq!(derive_base_url("zsmala"), "https://zsmala.edupage.org");
        assert_eq!(
            derive_base_url("zsmala.edupage.org"),
            "https://zsmala.edupage.org"
        );
        assert_eq!(
            derive_base_url("https://custom.example.com/"),
            "https://custom.example.com"
        );
    }

    #[test]
    fn test_session_ids_are_opaque_and_unique() {
        let store = SessionStore::new();
        let a = store.create("zsmala").unwrap();
        let b = store.create("zsmala").unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_get_returns_live_session() {
        let store = SessionStore::new();
        let session = store.create("zsmala").unwrap();
        assert!(store.get(&session.id).is_some());
        assert!(store.get("no-such-session").is_none());
    }

    #[test]
    fn test_expired_session_is_not_returned() {
        let store = SessionStore::with_ttl(Duration::from_millis(10));
        let session = store.create("zsmala").unwrap();
        std::thread::sleep(Duration::from_millis(25));
        assert!(store.get(&session.id).is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_reaper_sweep_deletes_only_over_age_sessions() {
        let store = SessionStore::with_ttl(Duration::from_millis(30));
        let old = store.create("zsmala").unwrap();
        std::thread::sleep(Duration::from_millis(40));
        let fresh = store.create("zsmala").unwrap();

        assert_eq!(store.reap_expired(), 1);
        assert!(store.get(&fresh.id).is_some());
        assert!(store.get(&old.id).is_none());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = SessionStore::new();
        let session = store.create("zsmala").unwrap();
        store.remove(&session.id);
        store.remove(&session.id);
        assert!(store.get(&session.id).is_none());
    }
}
