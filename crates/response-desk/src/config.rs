use std::fmt;
use std::time::Duration;

use desk_common::fetch::FetchConfig;

use crate::error::AppError;

const DEFAULT_STORAGE_KEY: &str = "canned_responses:v1:collection";
const DEFAULT_STATIC_URL: &str = "http://localhost:8080/responses.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Key-value store (Redis, or an in-process map without `REDIS_URL`).
    Local,
    /// Read-only static JSON resource.
    Static,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => f.write_str("local"),
            BackendKind::Static => f.write_str("static"),
        }
    }
}

/// Application configuration loaded explicitly from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    /// Redis connection URL. `None` keeps the collection in process memory only.
    pub redis_url: Option<String>,
    /// Key holding the serialized collection in the local store.
    pub storage_key: String,
    pub fetch: FetchConfig,
}

impl Config {
    /// Optional:
    /// - `RESPONSES_BACKEND`: `local` (default) or `static`
    /// - `REDIS_URL`
    /// - `RESPONSES_STORAGE_KEY` (default: "canned_responses:v1:collection")
    /// - `RESPONSES_STATIC_URL` (default: "http://localhost:8080/responses.json")
    /// - `RESPONSES_FETCH_TIMEOUT_SECS`, `RESPONSES_FETCH_MAX_RETRIES`,
    ///   `RESPONSES_FETCH_RETRY_INITIAL_MS`, `RESPONSES_FETCH_RETRY_MAX_MS`
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let backend = match lookup("RESPONSES_BACKEND").as_deref().map(str::trim) {
            None | Some("") | Some("local") => BackendKind::Local,
            Some("static") => BackendKind::Static,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "RESPONSES_BACKEND must be \"local\" or \"static\", got {other:?}"
                )))
            }
        };

        let storage_key = lookup("RESPONSES_STORAGE_KEY")
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());

        let url = lookup("RESPONSES_STATIC_URL").unwrap_or_else(|| DEFAULT_STATIC_URL.to_string());
        let mut fetch = FetchConfig::new(url.trim_end_matches('/'));

        if let Some(secs) = parse_var::<u64>(&lookup, "RESPONSES_FETCH_TIMEOUT_SECS")? {
            fetch.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = parse_var::<u32>(&lookup, "RESPONSES_FETCH_MAX_RETRIES")? {
            fetch.max_retries = retries;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "RESPONSES_FETCH_RETRY_INITIAL_MS")? {
            fetch.initial_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "RESPONSES_FETCH_RETRY_MAX_MS")? {
            fetch.max_backoff = Duration::from_millis(ms);
        }

        Ok(Self {
            backend,
            redis_url: lookup("REDIS_URL").filter(|u| !u.trim().is_empty()),
            storage_key,
            fetch,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, AppError> {
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| {
            AppError::Config(format!("{name} must be a non-negative integer, got {raw:?}"))
        })
}
