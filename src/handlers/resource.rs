//! Generic resource handlers: paginated list, full list, read, create, update, delete, restore,
//! plus the client lookups and queries a resource declares. The resource comes from the
//! `Extension` its mount installs; a client query's definition from its route's own `Extension`.

use crate::config::{ColumnQuery, RangeQuery, ResourceConfig, SearchQuery};
use crate::error::AppError;
use crate::extractors::RequestContext;
use crate::pagination::{parse_query, LinkTarget, PaginationSpec};
use crate::response::{self, Envelope, Success};
use crate::state::AppState;
use crate::store::{writable_values, Filter, Range, RecordId, Scope};
use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, RawQuery, State},
    Extension, Json,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

type Resource = Extension<Arc<ResourceConfig>>;
type Body = Result<Json<Map<String, Value>>, JsonRejection>;

fn parse_id(resource: &ResourceConfig, raw: &str) -> Result<RecordId, AppError> {
    RecordId::parse(raw, resource.pk_type)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid {} id '{}'", resource.label(), raw)))
}

fn not_found(resource: &ResourceConfig, id: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("{} record {}", resource.label(), id))
}

/// Parameter text a client search reads.
pub const SEARCH_PARAM: &str = "query";

async fn page(
    state: &AppState,
    resource: &ResourceConfig,
    ctx: &RequestContext,
    uri: &OriginalUri,
    query: &[(String, String)],
    scope: Scope,
    filter: Filter,
) -> Result<Envelope<Vec<Value>>, AppError> {
    let mut spec = PaginationSpec::from_query(query, resource.pagination_defaults());
    spec.sort_field = resource.sort_column(&spec.sort_field).to_string();

    let page = state.store.page(resource, scope, &filter, &spec).await?;
    let target = LinkTarget {
        origin: &state.config.app_url,
        path: uri.0.path(),
        query,
    };
    Ok(Envelope::paginated(ctx, page.rows, page.total_items, &spec, target))
}

/// GET `/` on the admin mount.
pub async fn list_page(
    State(state): State<AppState>,
    Extension(resource): Resource,
    ctx: RequestContext,
    uri: OriginalUri,
    RawQuery(raw): RawQuery,
) -> Result<Envelope<Vec<Value>>, AppError> {
    let query = parse_query(raw.as_deref());
    let filter = Filter::from_query(&resource, &query);
    page(&state, &resource, &ctx, &uri, &query, Scope::All, filter).await
}

/// GET `/` on the client mount: active rows only.
pub async fn list_active(
    State(state): State<AppState>,
    Extension(resource): Resource,
    ctx: RequestContext,
    uri: OriginalUri,
    RawQuery(raw): RawQuery,
) -> Result<Envelope<Vec<Value>>, AppError> {
    let query = parse_query(raw.as_deref());
    let filter = Filter::from_query(&resource, &query);
    page(&state, &resource, &ctx, &uri, &query, Scope::Active, filter).await
}

pub async fn list_all(
    State(state): State<AppState>,
    Extension(resource): Resource,
    ctx: RequestContext,
    RawQuery(raw): RawQuery,
) -> Result<Envelope<Vec<Value>>, AppError> {
    let filter = Filter::from_query(&resource, &parse_query(raw.as_deref()));
    let rows = state.store.all(&resource, Scope::All, &filter).await?;
    let meta = json!({ "count": rows.len() });
    Ok(Envelope::success(
        &ctx,
        Some(rows),
        Success::message(format!("{} fetched successfully", resource.label())).with_meta(meta),
    ))
}

async fn find(state: &AppState, resource: &ResourceConfig, raw_id: &str, scope: Scope) -> Result<Value, AppError> {
    let id = parse_id(resource, raw_id)?;
    state
        .store
        .find(resource, &id, scope)
        .await?
        .ok_or_else(|| not_found(resource, &id))
}

pub async fn read(
    State(state): State<AppState>,
    Extension(resource): Resource,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Envelope<Value>, AppError> {
    let row = find(&state, &resource, &id, Scope::All).await?;
    Ok(response::ok(&ctx, format!("{} record fetched successfully", resource.label()), row))
}

/// GET `/:id` on the client mount, or `/:<client_key>` when the resource is looked up by a
/// natural key. Inactive rows are not found.
pub async fn read_active(
    State(state): State<AppState>,
    Extension(resource): Resource,
    ctx: RequestContext,
    Path(key): Path<String>,
) -> Result<Envelope<Value>, AppError> {
    let row = match &resource.client_key {
        Some(column) => state
            .store
            .find_by(&resource, column, &key, Scope::Active)
            .await?
            .ok_or_else(|| not_found(&resource, &key))?,
        None => find(&state, &resource, &key, Scope::Active).await?,
    };
    Ok(response::ok(&ctx, format!("{} record fetched successfully", resource.label()), row))
}

/// One active row whose column equals the path value.
pub async fn lookup_active(
    State(state): State<AppState>,
    Extension(resource): Resource,
    Extension(lookup): Extension<Arc<ColumnQuery>>,
    ctx: RequestContext,
    Path(value): Path<String>,
) -> Result<Envelope<Value>, AppError> {
    let row = state
        .store
        .find_by(&resource, &lookup.column, &value, Scope::Active)
        .await?
        .ok_or_else(|| not_found(&resource, &value))?;
    Ok(response::ok(&ctx, format!("{} record fetched successfully", resource.label()), row))
}

/// Active rows whose column equals the path value, e.g. products of one category.
pub async fn list_related(
    State(state): State<AppState>,
    Extension(resource): Resource,
    Extension(related): Extension<Arc<ColumnQuery>>,
    ctx: RequestContext,
    uri: OriginalUri,
    RawQuery(raw): RawQuery,
    Path(value): Path<String>,
) -> Result<Envelope<Vec<Value>>, AppError> {
    let query = parse_query(raw.as_deref());
    let filter = Filter::from_query(&resource, &query).equal(&related.column, &value);
    page(&state, &resource, &ctx, &uri, &query, Scope::Active, filter).await
}

/// Active rows whose boolean column is set, e.g. featured products.
pub async fn list_flagged(
    State(state): State<AppState>,
    Extension(resource): Resource,
    Extension(flag): Extension<Arc<ColumnQuery>>,
    ctx: RequestContext,
    uri: OriginalUri,
    RawQuery(raw): RawQuery,
) -> Result<Envelope<Vec<Value>>, AppError> {
    let query = parse_query(raw.as_deref());
    let filter = Filter::from_query(&resource, &query).equal(&flag.column, "true");
    page(&state, &resource, &ctx, &uri, &query, Scope::Active, filter).await
}

fn param<'q>(query: &'q [(String, String)], name: &str) -> Option<&'q str> {
    query.iter().rev().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
}

/// Active rows where any searchable column contains `?query=`.
pub async fn search_active(
    State(state): State<AppState>,
    Extension(resource): Resource,
    Extension(search): Extension<Arc<SearchQuery>>,
    ctx: RequestContext,
    uri: OriginalUri,
    RawQuery(raw): RawQuery,
) -> Result<Envelope<Vec<Value>>, AppError> {
    let query = parse_query(raw.as_deref());
    let text = param(&query, SEARCH_PARAM).map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Query parameter '{}' is required",
            SEARCH_PARAM
        )));
    }
    let filter = Filter::from_query(&resource, &query).search(&search.columns, text);
    page(&state, &resource, &ctx, &uri, &query, Scope::Active, filter).await
}

fn bound(query: &[(String, String)], name: &str) -> Result<Option<f64>, AppError> {
    match param(query, name).map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("'{}' must be a number, got '{}'", name, raw))),
    }
}

/// Active rows with the column inside the requested bounds; at least one bound is required.
pub async fn list_in_range(
    State(state): State<AppState>,
    Extension(resource): Resource,
    Extension(range): Extension<Arc<RangeQuery>>,
    ctx: RequestContext,
    uri: OriginalUri,
    RawQuery(raw): RawQuery,
) -> Result<Envelope<Vec<Value>>, AppError> {
    let query = parse_query(raw.as_deref());
    let min = bound(&query, &range.min_param)?;
    let max = bound(&query, &range.max_param)?;
    match (min, max) {
        (None, None) => {
            return Err(AppError::BadRequest(format!(
                "'{}' or '{}' is required",
                range.min_param, range.max_param
            )))
        }
        (Some(lo), Some(hi)) if lo > hi => {
            return Err(AppError::BadRequest(format!(
                "'{}' cannot be greater than '{}'",
                range.min_param, range.max_param
            )))
        }
        _ => {}
    }
    let filter = Filter::from_query(&resource, &query).range(Range {
        column: range.column.clone(),
        min,
        max,
    });
    page(&state, &resource, &ctx, &uri, &query, Scope::Active, filter).await
}

/// Number of active rows, narrowed by any filterable columns in the query.
pub async fn count_active(
    State(state): State<AppState>,
    Extension(resource): Resource,
    ctx: RequestContext,
    RawQuery(raw): RawQuery,
) -> Result<Envelope<Value>, AppError> {
    let filter = Filter::from_query(&resource, &parse_query(raw.as_deref()));
    let count = state.store.count(&resource, Scope::Active, &filter).await?;
    Ok(response::ok(
        &ctx,
        format!("{} counted successfully", resource.label()),
        json!({ "count": count }),
    ))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(resource): Resource,
    ctx: RequestContext,
    body: Body,
) -> Result<Envelope<Value>, AppError> {
    let Json(body) = body?;
    let values = writable_values(&resource, body);
    let row = state.store.create(&resource, &values).await?;
    tracing::info!(request_id = %ctx.request_id, resource = %resource.name, "record created");
    Ok(response::created(&ctx, format!("{} record created successfully", resource.label()), row))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(resource): Resource,
    ctx: RequestContext,
    Path(id): Path<String>,
    body: Body,
) -> Result<Envelope<Value>, AppError> {
    let id = parse_id(&resource, &id)?;
    let Json(body) = body?;
    let values = writable_values(&resource, body);
    if values.is_empty() {
        return Err(AppError::BadRequest(format!(
            "No updatable {} fields in request body",
            resource.label()
        )));
    }
    let row = state
        .store
        .update(&resource, &id, &values)
        .await?
        .ok_or_else(|| not_found(&resource, &id))?;
    tracing::info!(request_id = %ctx.request_id, resource = %resource.name, id = %id, "record updated");
    Ok(response::ok(&ctx, format!("{} record updated successfully", resource.label()), row))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(resource): Resource,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Envelope<Value>, AppError> {
    let id = parse_id(&resource, &id)?;
    if !state.store.delete(&resource, &id).await? {
        return Err(not_found(&resource, &id));
    }
    tracing::info!(request_id = %ctx.request_id, resource = %resource.name, id = %id, "record deleted");
    Ok(response::done(&ctx, format!("{} record deleted successfully", resource.label())))
}

/// PATCH `/:id/restore`: clears the soft-delete stamp and returns the row.
pub async fn restore(
    State(state): State<AppState>,
    Extension(resource): Resource,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Envelope<Value>, AppError> {
    let id = parse_id(&resource, &id)?;
    if !state.store.restore(&resource, &id).await? {
        return Err(not_found(&resource, &id));
    }
    let row = state
        .store
        .find(&resource, &id, Scope::All)
        .await?
        .ok_or_else(|| not_found(&resource, &id))?;
    tracing::info!(request_id = %ctx.request_id, resource = %resource.name, id = %id, "record restored");
    Ok(response::ok(&ctx, format!("{} record restored successfully", resource.label()), row))
}
