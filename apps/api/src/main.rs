mod config;
mod db;
mod errors;
mod import;
mod matching;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::create_pool;
use crate::import::events::ImportEvents;
use crate::import::pipeline::RunningImports;
use crate::import::registry::FieldRegistry;
use crate::import::store::{PgProspectStore, ProspectStore};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Agency API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config).await?;

    // Prospect store (PgProspectStore by default; tests use an in-memory store)
    let prospect_store: Arc<dyn ProspectStore> =
        Arc::new(PgProspectStore::new(db.clone(), config.store_settings()));
    info!(
        "Prospect store initialized (timeout {:?}, {} lookup attempts, batch size {})",
        config.store_timeout, config.store_max_retries, config.import_batch_size
    );

    let field_registry = Arc::new(FieldRegistry::prospects());

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        prospect_store,
        field_registry,
        import_events: ImportEvents::default(),
        running_imports: RunningImports::default(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the marketing and dashboard hosts

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
