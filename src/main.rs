use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod domain;
mod metrics;
mod models;
mod store;
mod utils;

use api::AppState;
use config::Config;
use store::{MemoryStore, PgStore, Store};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();

    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,little_lemon=debug"))
        )
        .init();

    tracing::info!("🍋 Starting Little Lemon ordering service");

    // === 1. Metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    let registry = Arc::new(metrics.registry().clone());

    // === 2. Store ===
    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            tracing::info!(max_connections = config.max_connections, "Connecting to PostgreSQL...");
            let pg = utils::retry_with_backoff(config.connect_retry(), |attempt| {
                tracing::debug!(attempt, "Opening connection pool");
                PgStore::connect(url, config.max_connections)
            })
            .await?;
            pg.migrate().await?;
            Arc::new(pg)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store with demo data");
            let memory = MemoryStore::new();
            for (username, token) in memory.seed_demo().await {
                tracing::info!(username = %username, token = %token, "Demo account");
            }
            Arc::new(memory)
        }
    };

    // === 3. HTTP server ===
    let state = web::Data::new(AppState::new(store, metrics));
    let registry = web::Data::new(registry);

    tracing::info!(bind = %config.bind, "🚀 Listening");
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .app_data(registry.clone())
            .configure(metrics::configure)
            .configure(api::configure)
    })
    .bind(&config.bind)?
    .run()
    .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
