//! Response-side middleware: every failure leaves through the classifier as an envelope.

use crate::error::{AppError, PendingFailure};
use crate::extractors::RequestContext;
use crate::response::Envelope;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::any::Any;

/// Render parked failures (and bare error statuses from layers or axum itself) as envelopes.
pub async fn render_failures(
    State(state): State<AppState>,
    ctx: RequestContext,
    req: Request,
    next: Next,
) -> Response {
    let mut res = next.run(req).await;
    let failure = match res.extensions_mut().remove::<PendingFailure>() {
        Some(PendingFailure(failure)) => failure,
        None if is_failure(res.status()) => std::sync::Arc::new(bare_status(res.status())),
        None => return res,
    };

    let classification = state.classifier.classify(&failure);
    if classification.status.is_server_error() {
        tracing::error!(
            request_id = %ctx.request_id,
            code = %classification.code,
            error = %failure,
            "request failed"
        );
    } else {
        tracing::debug!(
            request_id = %ctx.request_id,
            code = %classification.code,
            error = %failure,
            "request rejected"
        );
    }
    Envelope::failure(&ctx, classification).into_response()
}

fn is_failure(status: StatusCode) -> bool {
    status.is_client_error() || status.is_server_error()
}

/// `405 Method Not Allowed` becomes `METHOD_NOT_ALLOWED` / `Method Not Allowed`.
fn bare_status(status: StatusCode) -> AppError {
    let reason = status.canonical_reason().unwrap_or("Error");
    let code = reason
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_uppercase)
        .collect::<Vec<_>>()
        .join("_");
    AppError::declared(status, code, reason)
}

/// Fallback for unmatched paths.
pub async fn route_not_found(uri: Uri) -> AppError {
    AppError::RouteNotFound(uri.path().to_string())
}

/// `CatchPanicLayer::custom` hook; the panic is rendered like any other internal failure.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    AppError::Internal(format!("handler panicked: {}", detail)).into_response()
}
