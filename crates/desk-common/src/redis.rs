/// Redis-backed key-value store.
///
/// Unlike a cache, the desk needs to know whether a write landed, so operations return
/// `Result` instead of swallowing failures. Every failure is still logged at `warn` here;
/// callers decide how to surface it.
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::warn;

use crate::error::CommonError;
use crate::kv::KeyValueStore;

#[derive(Clone)]
pub struct RedisKv {
    client: Option<redis::Client>,
}

impl RedisKv {
    /// Build a client for `url`. An absent or unparseable URL yields a store whose
    /// operations all fail with [`CommonError::RedisUnavailable`].
    pub fn new(url: Option<&str>) -> Self {
        let client = url.and_then(|u| {
            redis::Client::open(u)
                .inspect_err(|e| warn!(error = %e, url = u, "failed to create redis client"))
                .ok()
        });
        Self { client }
    }

    /// Send a PING. Returns `true` if Redis is reachable.
    pub async fn is_available(&self) -> bool {
        let Ok(mut conn) = self.connection().await else {
            return false;
        };
        let result: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
        result.is_ok()
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CommonError> {
        let client = self.client.as_ref().ok_or(CommonError::RedisUnavailable)?;
        client
            .get_multiplexed_async_connection()
            .await
            .inspect_err(|e| warn!(error = %e, "redis connection failed"))
            .map_err(CommonError::from)
    }
}

impl KeyValueStore for RedisKv {
    async fn get(&self, key: &str) -> Result<Option<String>, CommonError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis GET failed"))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CommonError> {
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(key, value)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis SET failed"))?;
        Ok(())
    }
}
