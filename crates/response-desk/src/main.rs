mod backend;
mod config;
mod error;
mod model;
mod notify;
mod server;
mod store;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use backend::{Backend, LocalKv, LocalKvBackend, StaticFetchBackend};
use config::{BackendKind, Config};
use desk_common::fetch::StaticFetchClient;
use desk_common::kv::MemoryKv;
use desk_common::redis::RedisKv;
use error::AppError;
use notify::NoticeBoard;
use server::ResponseDeskServer;
use store::ResponseStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting response-desk MCP server");

    let config = Config::from_env()?;
    info!(
        backend = %config.backend,
        storage_key = %config.storage_key,
        redis = config.redis_url.is_some(),
        "configuration loaded"
    );

    let backend = build_backend(&config).await?;

    let notices = Arc::new(NoticeBoard::new());
    let mut store = ResponseStore::new(backend, Arc::clone(&notices));
    let source = store.load().await;
    // Startup notices have no caller to receive them; they are already logged.
    notices.drain();
    if store.is_empty() {
        warn!(?source, "response collection is empty");
    } else {
        info!(?source, responses = store.records().len(), "response collection ready");
    }

    let server = ResponseDeskServer::new(store, notices);

    if let Ok(addr) = std::env::var("MCP_TCP_LISTEN_ADDR") {
        let listener = TcpListener::bind(&addr).await?;
        info!(listen_addr = %addr, "MCP server ready, serving on TCP");
        loop {
            let (stream, peer) = listener.accept().await?;
            let server = server.clone();
            tokio::spawn(async move {
                info!(peer = %peer, "MCP client connected");
                let service = server.serve(stream).await.inspect_err(|e| {
                    tracing::error!(error = %e, "MCP server error");
                })?;
                service.waiting().await?;
                info!(peer = %peer, "MCP client disconnected");
                Ok::<(), anyhow::Error>(())
            });
        }
    } else {
        info!("MCP server ready, serving on stdio");
        let service = server.serve(stdio()).await.inspect_err(|e| {
            tracing::error!(error = %e, "MCP server error");
        })?;
        service.waiting().await?;
        info!("MCP server shut down");
    }
    Ok(())
}

async fn build_backend(config: &Config) -> Result<Backend, AppError> {
    match config.backend {
        BackendKind::Local => {
            let kv = match config.redis_url.as_deref() {
                Some(url) => {
                    let redis = RedisKv::new(Some(url));
                    if redis.is_available().await {
                        info!("redis connected");
                    } else {
                        warn!("redis unavailable, changes will not be stored until it returns");
                    }
                    LocalKv::Redis(redis)
                }
                None => {
                    warn!("REDIS_URL not set, responses are kept for this session only");
                    LocalKv::Memory(MemoryKv::new())
                }
            };
            Ok(Backend::Local(LocalKvBackend::new(kv, config.storage_key.clone())))
        }
        BackendKind::Static => {
            info!(
                url = %config.fetch.url,
                timeout_ms = config.fetch.timeout.as_millis(),
                max_retries = config.fetch.max_retries,
                "static fetch configured"
            );
            let client = StaticFetchClient::new(config.fetch.clone())?;
            Ok(Backend::Static(StaticFetchBackend::new(client)))
        }
    }
}
