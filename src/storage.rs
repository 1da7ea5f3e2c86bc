//! Token and default-folder persistence.
//!
//! The access token lives in a session-scoped storage area and expires
//! implicitly; the default folder id lives in a durable area and survives
//! across sessions until overwritten.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

const TOKEN_KEY: &str = "google_oauth_token";
const TOKEN_EXPIRATION_KEY: &str = "google_oauth_token_expiration";
const DEFAULT_FOLDER_ID_KEY: &str = "google_drive_default_folder_id";

/// A string key-value storage region.
pub trait StorageArea: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// In-process storage area.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageArea for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("storage lock poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .expect("storage lock poisoned")
            .insert(key.to_string(), value.to_string());
    }
}

/// Accessors for the short-lived access token and the persisted default
/// folder id.
#[derive(Clone)]
pub struct TokenStore {
    session: Arc<dyn StorageArea>,
    durable: Arc<dyn StorageArea>,
}

impl TokenStore {
    pub fn new(session: Arc<dyn StorageArea>, durable: Arc<dyn StorageArea>) -> Self {
        Self { session, durable }
    }

    /// Token store backed by in-process storage for both regions.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
        )
    }

    /// The current access token, or an empty string if no token is stored
    /// or the stored one has expired.
    pub fn token(&self) -> String {
        self.token_at(now_ms())
    }

    /// Token lookup against an explicit clock. The token is absent from the
    /// expiry instant onward.
    pub fn token_at(&self, now_ms: i64) -> String {
        let expires_at = self
            .session
            .get(TOKEN_EXPIRATION_KEY)
            .and_then(|s| s.parse::<i64>().ok());

        match expires_at {
            Some(expires_at) if now_ms < expires_at => {
                self.session.get(TOKEN_KEY).unwrap_or_default()
            }
            _ => String::new(),
        }
    }

    /// Store a token with its time-to-live. Overwrites any previous token;
    /// expiry is absolute, computed from the current time.
    pub fn save_token(&self, token: &str, ttl_seconds: i64) {
        self.save_token_at(token, ttl_seconds, now_ms());
    }

    pub fn save_token_at(&self, token: &str, ttl_seconds: i64, now_ms: i64) {
        tracing::debug!("auth token updated");
        self.session.set(TOKEN_KEY, token);
        self.session
            .set(TOKEN_EXPIRATION_KEY, &(now_ms + ttl_seconds * 1000).to_string());
    }

    /// The persisted default folder id, or an empty string if none is stored.
    pub fn default_folder(&self) -> String {
        self.durable.get(DEFAULT_FOLDER_ID_KEY).unwrap_or_default()
    }

    pub fn save_default_folder(&self, folder_id: &str) {
        self.durable.set(DEFAULT_FOLDER_ID_KEY, folder_id);
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_absent_by_default() {
        let store = TokenStore::in_memory();
        assert_eq!(store.token(), "");
    }

    #[test]
    fn test_token_valid_before_expiry() {
        let store = TokenStore::in_memory();
        let now = 1_000_000;

        store.save_token_at("t1", 5, now);

        assert_eq!(store.token_at(now), "t1");
        assert_eq!(store.token_at(now + 4_999), "t1");
    }

    #[test]
    fn test_token_absent_from_expiry_onward() {
        let store = TokenStore::in_memory();
        let now = 1_000_000;

        store.save_token_at("t1", 5, now);

        assert_eq!(store.token_at(now + 5_000), "");
        assert_eq!(store.token_at(now + 60_000), "");
    }

    #[test]
    fn test_save_token_overwrites() {
        let store = TokenStore::in_memory();
        let now = 1_000_000;

        store.save_token_at("t1", 5, now);
        store.save_token_at("t2", 10, now);

        assert_eq!(store.token_at(now + 7_000), "t2");
    }

    #[test]
    fn test_default_folder_round_trip() {
        let store = TokenStore::in_memory();
        assert_eq!(store.default_folder(), "");

        store.save_default_folder("folder123");
        assert_eq!(store.default_folder(), "folder123");

        store.save_default_folder("folder456");
        assert_eq!(store.default_folder(), "folder456");
    }

    #[test]
    fn test_default_folder_survives_token_expiry() {
        let store = TokenStore::in_memory();
        store.save_default_folder("folder123");
        store.save_token_at("t1", 5, 0);

        assert_eq!(store.token_at(10_000), "");
        assert_eq!(store.default_folder(), "folder123");
    }
}
