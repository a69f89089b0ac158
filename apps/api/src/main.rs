mod auth;
mod config;
mod errors;
mod llm_client;
mod profile;
mod render;
mod resumes;
mod routes;
mod state;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::SessionKeys;
use crate::config::{Config, StorageBackend};
use crate::llm_client::LlmClient;
use crate::render::CommandPdfRenderer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::fs::FsStore;
use crate::storage::memory::MemoryStore;
use crate::storage::s3::S3Store;
use crate::storage::DocumentStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume API v{}", env!("CARGO_PKG_VERSION"));

    let store = build_store(&config.storage).await;

    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_model.clone())
        .context("building LLM HTTP client")?;
    info!("LLM client initialized (model: {})", llm.model());

    if !config.resume_template_path.is_file() {
        warn!(
            "Resume template {} not found; generation will fail until it exists",
            config.resume_template_path.display()
        );
    }

    let state = AppState {
        store,
        llm: Arc::new(llm),
        pdf: Arc::new(CommandPdfRenderer::wkhtmltopdf(config.pdf_renderer.clone())),
        sessions: SessionKeys::new(&config.session_secret, config.session_ttl_hours),
        resume_template_path: config.resume_template_path.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the front-end host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs the configured Document Store backend.
async fn build_store(backend: &StorageBackend) -> Arc<dyn DocumentStore> {
    match backend {
        StorageBackend::Filesystem { root } => {
            info!("Document store: filesystem at {}", root.display());
            Arc::new(FsStore::new(root.clone()))
        }
        StorageBackend::S3(settings) => {
            info!(
                "Document store: S3 bucket '{}' ({})",
                settings.bucket,
                settings.endpoint.as_deref().unwrap_or("AWS")
            );
            Arc::new(S3Store::connect(settings).await)
        }
        StorageBackend::Memory => {
            warn!("Document store: in-memory; all data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    }
}
