use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::warn;

#[derive(Clone, Debug)]
pub struct FetchConfig {
    pub url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_error_body_bytes: usize,
}

impl FetchConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(10),
            max_retries: 2,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_millis(2_000),
            max_error_body_bytes: 4 * 1024,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid response JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("resource returned error: status={status} body={body}")]
    Status { status: StatusCode, body: String },
}

/// Read-only HTTP client for a single static JSON resource.
#[derive(Clone)]
pub struct StaticFetchClient {
    config: FetchConfig,
    http: reqwest::Client,
}

impl StaticFetchClient {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent("response-desk/static-fetch")
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// GET the configured resource and decode it as `T`, retrying transient failures.
    pub async fn get_json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.get_once().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    if attempt > self.config.max_retries || !should_retry(&e) {
                        return Err(e);
                    }
                    let delay = backoff_delay(
                        self.config.initial_backoff,
                        self.config.max_backoff,
                        attempt - 1,
                    );
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        url = %self.config.url,
                        error = %e,
                        "static fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn get_once<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        let resp = self
            .http
            .get(&self.config.url)
            .timeout(self.config.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = read_limited_text(resp, self.config.max_error_body_bytes).await;
            return Err(FetchError::Status { status, body });
        }

        // Decoded separately so malformed bodies surface as InvalidJson rather than a
        // reqwest decode error, which would be retried.
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn should_retry(err: &FetchError) -> bool {
    match err {
        FetchError::Request(e) => e.is_timeout() || e.is_connect() || e.is_body(),
        FetchError::Status { status, .. } => {
            *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
        }
        FetchError::InvalidJson(_) => false,
    }
}

fn backoff_delay(initial: Duration, max: Duration, exponent: u32) -> Duration {
    let mult = 1u128.checked_shl(exponent).unwrap_or(u128::MAX);
    let base_ms = initial.as_millis().saturating_mul(mult);
    let capped_ms = std::cmp::min(base_ms, max.as_millis()) as u64;
    let jitter_cap = std::cmp::max(1, capped_ms / 4);
    Duration::from_millis(capped_ms.saturating_add(pseudo_jitter_ms(jitter_cap)))
}

fn pseudo_jitter_ms(max_inclusive: u64) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0));
    u64::from(now.subsec_nanos()) % (max_inclusive + 1)
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(mut b) => {
            if b.len() > max_bytes {
                b.truncate(max_bytes);
            }
            String::from_utf8_lossy(&b).to_string()
        }
        Err(e) => {
            warn!(error = %e, "failed to read error body");
            "<failed to read error body>".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `responses` in order, one per connection, on a local port. Returns the URL
    /// and a counter of connections answered.
    async fn serve_sequence(
        responses: Vec<(&'static str, &'static str)>,
    ) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            for (status_line, body) in responses {
                let (mut stream, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                counter.fetch_add(1, Ordering::SeqCst);
                let response = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.ok();
            }
        });
        (format!("http://{addr}/responses.json"), hits)
    }

    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        serve_sequence(vec![(status_line, body)]).await.0
    }

    fn with_retries(url: String, max_retries: u32) -> FetchConfig {
        FetchConfig {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
            ..FetchConfig::new(url)
        }
    }

    fn no_retry(url: String) -> FetchConfig {
        FetchConfig {
            max_retries: 0,
            ..FetchConfig::new(url)
        }
    }

    #[tokio::test]
    async fn decodes_successful_body() {
        let url = serve_once("200 OK", r#"["a","b"]"#).await;
        let client = StaticFetchClient::new(no_retry(url)).unwrap();
        let values: Vec<String> = client.get_json().await.unwrap();
        assert_eq!(values, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn error_status_carries_body() {
        let url = serve_once("404 Not Found", "missing").await;
        let client = StaticFetchClient::new(no_retry(url)).unwrap();
        let err = client.get_json::<Vec<String>>().await.unwrap_err();
        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(body, "missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_json() {
        let url = serve_once("200 OK", "{not json").await;
        let client = StaticFetchClient::new(no_retry(url)).unwrap();
        let err = client.get_json::<Vec<String>>().await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidJson(_)));
        assert!(!should_retry(&err));
    }

    #[tokio::test]
    async fn transient_statuses_are_retried_until_success() {
        let (url, hits) = serve_sequence(vec![
            ("503 Service Unavailable", "busy"),
            ("429 Too Many Requests", "slow down"),
            ("200 OK", r#"["x"]"#),
        ])
        .await;
        let client = StaticFetchClient::new(with_retries(url, 2)).unwrap();
        let values: Vec<String> = client.get_json().await.unwrap();
        assert_eq!(values, vec!["x".to_string()]);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let (url, hits) = serve_sequence(vec![
            ("404 Not Found", "missing"),
            ("200 OK", r#"["x"]"#),
        ])
        .await;
        let client = StaticFetchClient::new(with_retries(url, 3)).unwrap();
        let err = client.get_json::<Vec<String>>().await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::Status { status, .. } if status == StatusCode::NOT_FOUND
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_retries_return_last_error() {
        let (url, hits) = serve_sequence(vec![
            ("500 Internal Server Error", "first"),
            ("502 Bad Gateway", "second"),
        ])
        .await;
        let client = StaticFetchClient::new(with_retries(url, 1)).unwrap();
        let err = client.get_json::<Vec<String>>().await.unwrap_err();
        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert_eq!(body, "second");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn backoff_is_capped() {
        let delay = backoff_delay(Duration::from_millis(200), Duration::from_millis(1_000), 10);
        assert!(delay >= Duration::from_millis(1_000));
        assert!(delay <= Duration::from_millis(1_250));
    }
}
