mod auth;
mod config;
mod db;
mod errors;
mod models;
mod resumes;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::FirebaseTokenVerifier;
use crate::config::{Config, StoreBackend};
use crate::db::{create_pool, ensure_schema};
use crate::resumes::ResumeService;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{DocumentStore, MemoryDocumentStore, PgDocumentStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the document store
    let store = build_store(&config).await?;

    // Initialize identity verification
    let mut verifier = FirebaseTokenVerifier::new(config.firebase_project_id.clone())?;
    if let Some(url) = &config.firebase_jwks_url {
        info!("Fetching Firebase signing keys from {url}");
        verifier = verifier.with_jwks_url(url.clone());
    }
    info!(
        "Firebase token verification enabled (project: {})",
        config.firebase_project_id
    );

    let state = AppState {
        verifier: Arc::new(verifier),
        resumes: ResumeService::new(store),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors(&config)?);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_store(config: &Config) -> Result<Arc<dyn DocumentStore>> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres document store")?;
            let pool = create_pool(url).await?;
            ensure_schema(&pool).await?;
            Ok(Arc::new(PgDocumentStore::new(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory document store; resumes are lost on restart");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
    }
}

/// Permissive when no origins are configured, otherwise limited to the list.
fn build_cors(config: &Config) -> Result<CorsLayer> {
    if config.cors_allowed_origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }

    let origins = config
        .cors_allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin '{origin}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}
