//! Common routes: health, readiness, version.

use crate::error::AppError;
use crate::extractors::RequestContext;
use crate::response::{self, Envelope};
use crate::routes::registry::Routes;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode};
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    database: &'static str,
}

#[derive(Serialize)]
struct VersionBody {
    name: String,
    version: &'static str,
    environment: String,
}

async fn health(ctx: RequestContext) -> Envelope<HealthBody> {
    response::ok(&ctx, "Service is healthy", HealthBody { status: "ok" })
}

async fn ready(State(state): State<AppState>, ctx: RequestContext) -> Result<Envelope<ReadyBody>, AppError> {
    if let Err(e) = state.store.ping().await {
        tracing::warn!(request_id = %ctx.request_id, error = %e, "readiness check failed");
        return Err(AppError::declared(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database unavailable",
        ));
    }
    Ok(response::ok(
        &ctx,
        "Service is ready",
        ReadyBody {
            status: "ok",
            database: "ok",
        },
    ))
}

async fn version(State(state): State<AppState>, ctx: RequestContext) -> Envelope<VersionBody> {
    response::ok(
        &ctx,
        "Success",
        VersionBody {
            name: state.config.app_name.clone(),
            version: env!("CARGO_PKG_VERSION"),
            environment: state.config.environment.clone(),
        },
    )
}

/// GET /health, GET /ready (store ping), GET /version.
pub fn common_routes() -> Routes<AppState> {
    Routes::new()
        .get("/health", health)
        .get("/ready", ready)
        .get("/version", version)
}
