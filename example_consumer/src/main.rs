//! Example consumer: a separate Rust project that uses storefront-api as a dependency.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Or from this directory: `cargo run`

use axum::http::StatusCode;
use std::sync::Arc;
use storefront_api::{
    build_app, load_catalog, log_route_views, AppConfig, AppError, AppState, Classification,
    ClassificationRule, ErrorClassifier, PgConstraintRule, PgStore, StoreError,
};
use tokio::net::TcpListener;

/// Pool exhaustion is a capacity problem, not a server bug.
struct PoolTimeoutRule;

impl ClassificationRule for PoolTimeoutRule {
    fn classify(&self, failure: &AppError) -> Option<Classification> {
        match failure {
            AppError::Store(StoreError::Database(sqlx::Error::PoolTimedOut)) => Some(Classification {
                status: StatusCode::SERVICE_UNAVAILABLE,
                code: "DATABASE_BUSY".into(),
                message: "Database is busy, retry shortly".into(),
                errors: None,
            }),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("storefront_api=info,example_consumer=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let catalog = load_catalog(config.catalog_path.as_deref()).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    let classifier = ErrorClassifier::default()
        .register(PgConstraintRule)
        .register(PoolTimeoutRule);
    let state = AppState::new(Arc::new(PgStore::new(pool)), classifier, config);
    let config = state.config.clone();
    let (app, table) = build_app(state, &catalog);

    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    let port = listener.local_addr()?.port();
    tracing::info!("Example consumer listening on http://127.0.0.1:{}", port);
    log_route_views(&config, &table);
    axum::serve(listener, app).await?;
    Ok(())
}
