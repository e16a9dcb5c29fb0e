/// Key-value storage seam used by the local persistence backend.
///
/// Values are opaque strings (the callers store serialized JSON). Two stores implement it:
/// [`crate::redis::RedisKv`] for durable storage and [`MemoryKv`] for a session-only map.
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::error::CommonError;

pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`. `Ok(None)` means the key was never written.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, CommonError>> + Send;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), CommonError>> + Send;
}

/// In-process key-value map. Contents live as long as the last clone.
#[derive(Clone, Default)]
pub struct MemoryKv {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, CommonError> {
        let entries = self.entries.lock().map_err(|_| CommonError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CommonError> {
        let mut entries = self.entries.lock().map_err(|_| CommonError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let kv = MemoryKv::new();
        assert_eq!(kv.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn clones_share_entries_and_set_overwrites() {
        let kv = MemoryKv::new();
        let other = kv.clone();
        kv.set("k", "first").await.unwrap();
        other.set("k", "second").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("second"));
    }
}
