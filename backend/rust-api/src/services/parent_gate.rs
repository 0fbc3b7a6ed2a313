use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Parent gate unlock lifetime after a successful PIN verification.
pub const GATE_TTL: Duration = Duration::from_secs(10 * 60);

/// Accepted when no PIN hash is configured. Local development only; the
/// missing-hash case must become a hard startup failure before production.
const DEV_PIN: &str = "1234";

/// Per-user TTL flag store: "parent has unlocked reveals until T".
pub trait GateStore: Send + Sync {
    fn set_gate(&self, user_id: &str, ttl: Duration);
    fn is_valid(&self, user_id: &str) -> bool;
}

/// Map-backed store. Entries are checked lazily and never swept; the map is
/// bounded by active users.
#[derive(Default)]
pub struct InMemoryGateStore {
    entries: Mutex<HashMap<String, Instant>>,
}

impl GateStore for InMemoryGateStore {
    fn set_gate(&self, user_id: &str, ttl: Duration) {
        let mut entries = self.entries.lock().expect("gate store lock poisoned");
        entries.insert(user_id.to_string(), Instant::now() + ttl);
    }

    fn is_valid(&self, user_id: &str) -> bool {
        let entries = self.entries.lock().expect("gate store lock poisoned");
        entries
            .get(user_id)
            .map(|expires_at| Instant::now() < *expires_at)
            .unwrap_or(false)
    }
}

pub struct ParentGateService {
    store: Box<dyn GateStore>,
    pin_hash: Option<String>,
}

impl ParentGateService {
    pub fn new(store: Box<dyn GateStore>, pin_hash: Option<String>) -> Self {
        Self { store, pin_hash }
    }

    /// Verifies the PIN and, on success, opens the gate for 10 minutes.
    /// With no configured hash only the dev PIN passes; anything else in
    /// that state is a configuration error, not a bad credential.
    pub async fn verify(&self, user_id: &str, pin: &str) -> Result<bool> {
        let valid = match &self.pin_hash {
            Some(hash) => {
                // bcrypt is CPU-bound; keep it off the request loop.
                let hash = hash.clone();
                let pin = pin.to_string();
                tokio::task::spawn_blocking(move || bcrypt::verify(&pin, &hash))
                    .await
                    .context("PIN verification task failed")?
                    .context("PIN hash could not be verified")?
            }
            None if pin == DEV_PIN => true,
            None => {
                anyhow::bail!("parent PIN hash is not configured");
            }
        };

        if valid {
            tracing::info!("Parent gate opened for user: {}", user_id);
            self.store.set_gate(user_id, GATE_TTL);
        }

        Ok(valid)
    }

    pub fn is_valid(&self, user_id: &str) -> bool {
        self.store.is_valid(user_id)
    }
}
