//! Caller-owned private key cache
//!
//! Replaces a process-wide "last issued key" with entries scoped to an
//! explicit session id. Within one session the last insert wins; sessions
//! never observe each other's keys.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::crypto::KeyMaterial;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| Error::Encoding(format!("Invalid session id {}: {}", s, e)))
    }
}

#[derive(Debug, Default)]
pub struct KeyCache {
    entries: DashMap<SessionId, Arc<KeyMaterial>>,
}

impl KeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `key` under `session`, replacing any earlier key.
    pub fn insert(&self, session: SessionId, key: KeyMaterial) -> Arc<KeyMaterial> {
        let key = Arc::new(key);
        if self.entries.insert(session, Arc::clone(&key)).is_some() {
            debug!(%session, "Replaced cached key");
        }
        key
    }

    pub fn get(&self, session: SessionId) -> Option<Arc<KeyMaterial>> {
        self.entries.get(&session).map(|entry| Arc::clone(entry.value()))
    }

    /// Base64 PKCS#8 form of the session's key, if one is cached.
    pub fn private_key_base64(&self, session: SessionId) -> Result<Option<String>> {
        self.get(session).map(|key| key.private_key_base64()).transpose()
    }

    pub fn remove(&self, session: SessionId) -> bool {
        self.entries.remove(&session).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn key() -> KeyMaterial {
        KeyMaterial::generate("prime256v1").unwrap()
    }

    #[test]
    fn test_sessions_are_isolated() {
        let cache = KeyCache::new();
        let (a, b) = (SessionId::new(), SessionId::new());
        cache.insert(a, key());
        assert!(cache.private_key_base64(a).unwrap().is_some());
        assert!(cache.private_key_base64(b).unwrap().is_none());
    }

    #[test]
    fn test_last_insert_wins_within_session() {
        let cache = KeyCache::new();
        let session = SessionId::new();
        cache.insert(session, key());
        let second = cache.insert(session, key());
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.private_key_base64(session).unwrap().unwrap(),
            second.private_key_base64().unwrap()
        );
    }

    #[test]
    fn test_remove() {
        let cache = KeyCache::new();
        let session = SessionId::new();
        cache.insert(session, key());
        assert!(cache.remove(session));
        assert!(!cache.remove(session));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_sessions() {
        let cache = Arc::new(KeyCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    let session = SessionId::new();
                    let inserted = cache.insert(session, key()).private_key_base64().unwrap();
                    assert_eq!(cache.private_key_base64(session).unwrap(), Some(inserted));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 8);
    }

    #[test]
    fn test_session_id_parsing() {
        let session = SessionId::new();
        assert_eq!(session.to_string().parse::<SessionId>().unwrap(), session);
        assert!("not-a-uuid".parse::<SessionId>().is_err());
    }
}
