/// Error types shared by the response desk crates.
///
/// These cover the infrastructure the store persists through (Redis and the in-process
/// key-value map). Application errors live in the server crate and wrap
/// `CommonError` via `#[from]`.

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("redis unavailable, keeping data in memory only")]
    RedisUnavailable,

    #[error("key-value store lock poisoned")]
    Poisoned,
}
