//! AgriRent Server - farm equipment rental marketplace
//!
//! REST API server for the pincode-scoped rental marketplace.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agrirent_server::{
    api,
    config::{AppConfig, StorageBackend},
    repository::{memory::MemoryRepository, sessions::RedisSessionStore, Repository, SessionStore},
    services::{
        directory::PostalDirectory, payment::HttpPaymentGateway, readiness::wait_until_ready,
        Services,
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("agrirent_server={},tower_http=debug", config.logging.level).into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting AgriRent Server v{}", env!("CARGO_PKG_VERSION"));

    let repository = build_repository(&config).await?;

    let directory = PostalDirectory::new(&config.directory)?;
    let payment = HttpPaymentGateway::new(&config.payment)?;
    let services = Services::new(
        repository,
        &config,
        Arc::new(directory),
        Arc::new(payment),
    );

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };
    let app = api::router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Connect the configured backends, waiting for each to answer
async fn build_repository(config: &AppConfig) -> anyhow::Result<Repository> {
    let interval = config.readiness.poll_interval();
    let timeout = config.readiness.timeout();

    if config.storage.backend == StorageBackend::Memory {
        tracing::warn!("Using in-memory storage; data is lost on restart");
        return Ok(Repository::in_memory());
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_lazy(&config.database.url)
        .context("Invalid database URL")?;

    wait_until_ready("postgres", interval, timeout, || async {
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    })
    .await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations completed");

    let sessions: Arc<dyn SessionStore> = if config.redis.enabled {
        let store = RedisSessionStore::new(&config.redis.url, config.redis.session_ttl_seconds)?;
        wait_until_ready("redis", interval, timeout, || store.ping()).await?;
        tracing::info!("Connected to Redis");
        Arc::new(store)
    } else {
        tracing::warn!("Redis disabled; anonymous session pincodes are kept in memory");
        Arc::new(MemoryRepository::new())
    };

    Ok(Repository::postgres(pool, sessions))
}
