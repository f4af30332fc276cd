//! Storefront server: loads configuration and the resource catalog, connects to PostgreSQL,
//! logs the route table, and serves.

use std::sync::Arc;
use storefront_api::{
    build_app, load_catalog, log_route_views, AppConfig, AppState, ErrorClassifier, PgConstraintRule, PgStore,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("storefront_api=info,storefront=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let catalog = load_catalog(config.catalog_path.as_deref()).await?;
    tracing::info!(resources = catalog.resources.len(), "catalog loaded");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    let classifier = ErrorClassifier::default().register(PgConstraintRule);
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(Arc::new(PgStore::new(pool)), classifier, config);
    let config = state.config.clone();
    let (app, table) = build_app(state, &catalog);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        app = %config.app_name,
        environment = %config.environment,
        url = %config.origin(),
        "listening on {}",
        listener.local_addr()?
    );
    log_route_views(&config, &table);
    axum::serve(listener, app).await?;
    Ok(())
}
