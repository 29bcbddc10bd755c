//! PawSpace API server.
//!
//! Run from repo root: `cargo run -p server`. Without `DATABASE_URL` the API serves from memory.

use pawspace_api::{
    apply_migrations, build_app, logging, AppState, MemoryStore, PgStore, RoutineGenerator, Settings, Store,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env();
    logging::init(&settings.log_level);

    let store: Arc<dyn Store> = match &settings.database_url {
        Some(url) => {
            let store = PgStore::connect(url, settings.db_pool_max).await?;
            apply_migrations(store.pool()).await?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };
    if settings.generation.api_key.is_none() {
        tracing::warn!(
            provider = %settings.generation.provider,
            "no AI API key configured; routine generation will fail"
        );
    }

    let state = AppState::new(store, RoutineGenerator::new(settings.generation.clone()));
    let app = build_app(state, settings.body_limit_bytes);
    let listener = TcpListener::bind(settings.bind_addr()).await?;
    tracing::info!("PawSpace API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
