use desk_common::error::CommonError;
use desk_common::fetch::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Rejected `add` input. Never mutates the collection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,

    #[error("content must not be empty")]
    EmptyContent,
}

/// Failure reported by a persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("storage error: {0}")]
    Storage(#[from] CommonError),

    #[error("stored collection is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}
