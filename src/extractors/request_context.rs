//! Per-request correlation id: accepted from `x-request-id` when well-formed, generated otherwise.

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use std::fmt;

/// Header carrying the correlation id in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

/// Opaque per-request token tying log lines and the response body together.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn generate() -> Self {
        CorrelationId(uuid::Uuid::new_v4().to_string())
    }

    /// Accepts an upstream id only if it is 1..=128 chars of `[A-Za-z0-9._:-]`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let well_formed = !raw.is_empty()
            && raw.len() <= MAX_REQUEST_ID_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'));
        well_formed.then(|| CorrelationId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug)]
pub struct RequestContext {
    pub request_id: CorrelationId,
}

impl RequestContext {
    pub fn from_parts(parts: &Parts) -> Self {
        let request_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v: &HeaderValue| v.to_str().ok())
            .and_then(CorrelationId::parse)
            .unwrap_or_else(CorrelationId::generate);
        RequestContext { request_id }
    }

    /// Context for code running outside a request (tests, startup).
    pub fn detached() -> Self {
        RequestContext {
            request_id: CorrelationId::generate(),
        }
    }
}

/// Ingress middleware: derive the context once and echo the id on the way out.
pub async fn attach_request_context(req: Request, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();
    let ctx = parts
        .extensions
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_else(|| RequestContext::from_parts(&parts));
    parts.extensions.insert(ctx.clone());

    let mut res = next.run(Request::from_parts(parts, body)).await;
    if let Ok(value) = HeaderValue::from_str(ctx.request_id.as_str()) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

/// Reads the context attached by [`attach_request_context`]; falls back to deriving it
/// so handlers mounted without the middleware still get an id.
#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<RequestContext>() {
            return Ok(ctx.clone());
        }
        let ctx = RequestContext::from_parts(parts);
        parts.extensions.insert(ctx.clone());
        Ok(ctx)
    }
}
