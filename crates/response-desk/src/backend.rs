/// Persistence backends for the response collection.
///
/// Backends always receive and return the full ordered collection; there are no
/// partial updates.
/// - [`LocalKvBackend`]: one key in a key-value store holding the JSON list.
/// - [`StaticFetchBackend`]: read-only GET of a static JSON resource. Writes are
///   accepted but reported as not durable.
use std::future::Future;

use tracing::{debug, warn};

use crate::error::BackendError;
use crate::model::ResponseRecord;
use desk_common::fetch::StaticFetchClient;
use desk_common::kv::{KeyValueStore, MemoryKv};
use desk_common::redis::RedisKv;

/// What happened to a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Durable,
    /// Accepted, but nothing outlives the session.
    NotDurable { reason: String },
}

pub trait PersistenceBackend: Send + Sync {
    /// `Ok(None)` means nothing has ever been stored.
    fn read(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<ResponseRecord>>, BackendError>> + Send;

    fn write(
        &self,
        records: &[ResponseRecord],
    ) -> impl Future<Output = Result<WriteOutcome, BackendError>> + Send;
}

pub struct LocalKvBackend<K> {
    kv: K,
    key: String,
}

impl<K: KeyValueStore> LocalKvBackend<K> {
    pub fn new(kv: K, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }
}

impl<K: KeyValueStore> PersistenceBackend for LocalKvBackend<K> {
    async fn read(&self) -> Result<Option<Vec<ResponseRecord>>, BackendError> {
        let Some(raw) = self.kv.get(&self.key).await? else {
            debug!(key = %self.key, "no stored collection");
            return Ok(None);
        };
        let records: Vec<ResponseRecord> = serde_json::from_str(&raw)?;
        Ok(Some(records))
    }

    async fn write(&self, records: &[ResponseRecord]) -> Result<WriteOutcome, BackendError> {
        let raw = serde_json::to_string(records)?;
        self.kv.set(&self.key, &raw).await?;
        debug!(key = %self.key, records = records.len(), "collection stored");
        Ok(WriteOutcome::Durable)
    }
}

pub struct StaticFetchBackend {
    client: StaticFetchClient,
}

impl StaticFetchBackend {
    pub fn new(client: StaticFetchClient) -> Self {
        Self { client }
    }

    pub fn url(&self) -> &str {
        &self.client.config().url
    }
}

impl PersistenceBackend for StaticFetchBackend {
    async fn read(&self) -> Result<Option<Vec<ResponseRecord>>, BackendError> {
        let records: Vec<ResponseRecord> = self.client.get_json().await?;
        debug!(url = %self.url(), records = records.len(), "static collection fetched");
        Ok(Some(records))
    }

    async fn write(&self, records: &[ResponseRecord]) -> Result<WriteOutcome, BackendError> {
        warn!(
            url = %self.url(),
            records = records.len(),
            "static resource has no write endpoint, change kept in memory only"
        );
        Ok(WriteOutcome::NotDurable {
            reason: format!("{} is read-only", self.url()),
        })
    }
}

/// Key-value stores the local backend can sit on.
#[derive(Clone)]
pub enum LocalKv {
    Redis(RedisKv),
    /// Session-only; used when no Redis URL is configured.
    Memory(MemoryKv),
}

impl KeyValueStore for LocalKv {
    async fn get(&self, key: &str) -> Result<Option<String>, desk_common::error::CommonError> {
        match self {
            LocalKv::Redis(kv) => kv.get(key).await,
            LocalKv::Memory(kv) => kv.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), desk_common::error::CommonError> {
        match self {
            LocalKv::Redis(kv) => kv.set(key, value).await,
            LocalKv::Memory(kv) => kv.set(key, value).await,
        }
    }
}

/// The backend selected by configuration.
pub enum Backend {
    Local(LocalKvBackend<LocalKv>),
    Static(StaticFetchBackend),
}

impl PersistenceBackend for Backend {
    async fn read(&self) -> Result<Option<Vec<ResponseRecord>>, BackendError> {
        match self {
            Backend::Local(b) => b.read().await,
            Backend::Static(b) => b.read().await,
        }
    }

    async fn write(&self, records: &[ResponseRecord]) -> Result<WriteOutcome, BackendError> {
        match self {
            Backend::Local(b) => b.write(records).await,
            Backend::Static(b) => b.write(records).await,
        }
    }
}
