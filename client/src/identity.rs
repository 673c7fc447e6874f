//! Persistence of the server-assigned player id between sessions.

use crate::timer::Clock;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// How long a stored id stays valid.
pub const IDENTITY_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

pub trait IdentityStore: Send {
    /// The stored id, if there is one and it has not expired.
    fn load(&self) -> Option<String>;
    fn store(&mut self, player_id: &str);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryIdentityStore {
    player_id: Option<String>,
}

impl MemoryIdentityStore {
    pub fn with_id(player_id: impl Into<String>) -> Self {
        Self {
            player_id: Some(player_id.into()),
        }
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self) -> Option<String> {
        self.player_id.clone()
    }

    fn store(&mut self, player_id: &str) {
        self.player_id = Some(player_id.to_string());
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredIdentity {
    player_id: String,
    stored_at_ms: i64,
}

/// Keeps the id in a small JSON file. I/O failures are logged and treated
/// as "no id"; a new one will simply be assigned by the server.
pub struct FileIdentityStore {
    path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl FileIdentityStore {
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
        }
    }

    fn read(&self) -> Option<StoredIdentity> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!("No identity at {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(stored) => Some(stored),
            Err(e) => {
                warn!("Ignoring corrupt identity file {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

impl IdentityStore for FileIdentityStore {
    fn load(&self) -> Option<String> {
        let stored = self.read()?;
        let age = self.clock.now_ms().saturating_sub(stored.stored_at_ms);
        if age > IDENTITY_LIFETIME.as_millis() as i64 {
            debug!("Stored identity expired {}ms ago", age);
            return None;
        }
        Some(stored.player_id)
    }

    fn store(&mut self, player_id: &str) {
        let stored = StoredIdentity {
            player_id: player_id.to_string(),
            stored_at_ms: self.clock.now_ms(),
        };

        let result = serde_json::to_string_pretty(&stored)
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(&self.path, json).map_err(|e| e.to_string()));

        if let Err(e) = result {
            warn!("Failed to save identity to {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct FixedClock(AtomicI64);

    impl Clock for FixedClock {
        fn now_ms(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn scratch_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("airhockey-identity-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryIdentityStore::default();
        assert_eq!(store.load(), None);
        store.store("abc");
        assert_eq!(store.load().as_deref(), Some("abc"));
    }

    #[test]
    fn test_file_store_round_trip() {
        let path = scratch_file("round_trip.json");
        let clock = Arc::new(FixedClock(AtomicI64::new(1_000)));

        let mut store = FileIdentityStore::new(&path, clock.clone());
        assert_eq!(store.load(), None);
        store.store("player-42");

        let reopened = FileIdentityStore::new(&path, clock);
        assert_eq!(reopened.load().as_deref(), Some("player-42"));
    }

    #[test]
    fn test_file_store_expires() {
        let path = scratch_file("expiry.json");
        let clock = Arc::new(FixedClock(AtomicI64::new(0)));

        let mut store = FileIdentityStore::new(&path, clock.clone());
        store.store("old");

        let lifetime = IDENTITY_LIFETIME.as_millis() as i64;
        clock.0.store(lifetime, Ordering::SeqCst);
        assert_eq!(store.load().as_deref(), Some("old"));

        clock.0.store(lifetime + 1, Ordering::SeqCst);
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_corrupt_file_reads_as_missing() {
        let path = scratch_file("corrupt.json");
        fs::write(&path, "not json").unwrap();

        let store = FileIdentityStore::new(&path, Arc::new(FixedClock(AtomicI64::new(0))));
        assert_eq!(store.load(), None);
    }
}
