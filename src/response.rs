//! Standard response envelope: every body, success or failure, has the same top-level keys.

use crate::classify::Classification;
use crate::extractors::{CorrelationId, RequestContext};
use crate::pagination::{LinkTarget, PageLinks, PaginationInfo, PaginationSpec};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

/// Field-level detail of a failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub field: String,
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T = Value> {
    pub success: bool,
    pub message: String,
    pub status_code: u16,
    pub error_code: Option<String>,
    pub data: Option<T>,
    pub errors: Option<Vec<ErrorDetail>>,
    pub pagination: Option<PaginationInfo>,
    pub links: Option<PageLinks>,
    pub meta: Option<Value>,
    pub timestamp: String,
    pub request_id: CorrelationId,
    #[serde(skip)]
    status: StatusCode,
}

/// Options for a success body. Defaults: message `Success`, status 200, no meta.
#[derive(Clone, Debug)]
pub struct Success {
    pub message: String,
    pub status: StatusCode,
    pub meta: Option<Value>,
}

impl Default for Success {
    fn default() -> Self {
        Success {
            message: "Success".into(),
            status: StatusCode::OK,
            meta: None,
        }
    }
}

impl Success {
    pub fn message(message: impl Into<String>) -> Self {
        Success {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn created(message: impl Into<String>) -> Self {
        Success {
            message: message.into(),
            status: StatusCode::CREATED,
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// ISO-8601 UTC with milliseconds, e.g. `2024-05-01T12:00:00.000Z`.
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl<T: Serialize> Envelope<T> {
    pub fn success(ctx: &RequestContext, data: Option<T>, opts: Success) -> Self {
        Envelope {
            success: true,
            message: opts.message,
            status_code: opts.status.as_u16(),
            error_code: None,
            data,
            errors: None,
            pagination: None,
            links: None,
            meta: opts.meta,
            timestamp: now_timestamp(),
            request_id: ctx.request_id.clone(),
            status: opts.status,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl Envelope<Value> {
    pub fn failure(ctx: &RequestContext, classification: Classification) -> Self {
        Envelope {
            success: false,
            message: classification.message,
            status_code: classification.status.as_u16(),
            error_code: Some(classification.code),
            data: None,
            errors: classification.errors,
            pagination: None,
            links: None,
            meta: None,
            timestamp: now_timestamp(),
            request_id: ctx.request_id.clone(),
            status: classification.status,
        }
    }
}

impl<T> Envelope<Vec<T>>
where
    T: Serialize,
{
    /// Page of rows with pagination info and self/next/prev links. Always 200.
    pub fn paginated(
        ctx: &RequestContext,
        rows: Vec<T>,
        total_items: u64,
        spec: &PaginationSpec,
        target: LinkTarget<'_>,
    ) -> Self {
        let info = PaginationInfo::new(spec, total_items);
        let links = target.links(&info);
        let meta = serde_json::json!({
            "sort": {
                "sortBy": spec.sort_field,
                "order": spec.sort_direction,
            }
        });
        let mut env = Envelope::success(
            ctx,
            Some(rows),
            Success::message("Paginated results fetched successfully").with_meta(meta),
        );
        env.pagination = Some(info);
        env.links = Some(links);
        env
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

pub fn ok<T: Serialize>(ctx: &RequestContext, message: impl Into<String>, data: T) -> Envelope<T> {
    Envelope::success(ctx, Some(data), Success::message(message))
}

pub fn created<T: Serialize>(ctx: &RequestContext, message: impl Into<String>, data: T) -> Envelope<T> {
    Envelope::success(ctx, Some(data), Success::created(message))
}

/// Success without a body, e.g. after a delete.
pub fn done(ctx: &RequestContext, message: impl Into<String>) -> Envelope<Value> {
    Envelope::success(ctx, None, Success::message(message))
}
