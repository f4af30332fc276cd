//! Shared helpers: an in-memory `ResourceStore` and request plumbing for the assembled app.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use storefront_api::config::{parse_catalog, PkType, BUILTIN_CATALOG};
use storefront_api::error::{DuplicateField, StoreError};
use storefront_api::pagination::{PaginationSpec, SortDirection};
use storefront_api::store::{Filter, Page, RecordId};
use storefront_api::{build_app, AppConfig, AppState, Catalog, ErrorClassifier, ResourceConfig, ResourceStore, Scope};
use tower::ServiceExt;

type Row = Map<String, Value>;

/// Rows per resource name, with optional single-column uniqueness like a database index.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    unique: Vec<(String, String)>,
    next_id: AtomicI64,
    down: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unique(mut self, resource: &str, column: &str) -> Self {
        self.unique.push((resource.to_string(), column.to_string()));
        self
    }

    /// Make `ping` fail, as if the database went away.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, AtomicOrdering::SeqCst);
    }

    /// Insert rows as given (ids, flags and stamps included); returns the stored rows.
    pub fn seed(&self, resource: &ResourceConfig, rows: Vec<Value>) -> Vec<Value> {
        rows.into_iter()
            .map(|row| {
                let row = row.as_object().cloned().unwrap_or_default();
                Value::Object(self.insert(resource, row))
            })
            .collect()
    }

    fn insert(&self, resource: &ResourceConfig, mut row: Row) -> Row {
        let seq = self.next_id.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        if !row.contains_key(&resource.primary_key) {
            let id = match resource.pk_type {
                PkType::Int => json!(seq),
                PkType::Uuid => json!(uuid::Uuid::new_v4().to_string()),
            };
            row.insert(resource.primary_key.clone(), id);
        }
        if resource.timestamps {
            let stamp = format!("2024-01-01T00:00:00.{:06}Z", seq);
            row.entry("created_at").or_insert_with(|| json!(stamp));
            row.entry("updated_at").or_insert_with(|| json!(stamp));
        }
        if resource.soft_delete {
            row.entry("deleted_at").or_insert(Value::Null);
        }
        if let Some(active) = &resource.active_column {
            row.entry(active.clone()).or_insert(Value::Bool(true));
        }
        self.tables
            .lock()
            .unwrap()
            .entry(resource.name.clone())
            .or_default()
            .push(row.clone());
        row
    }

    fn visible(resource: &ResourceConfig, row: &Row, scope: Scope) -> bool {
        if resource.soft_delete && !row.get("deleted_at").map_or(true, Value::is_null) {
            return false;
        }
        match (scope, &resource.active_column) {
            (Scope::Active, Some(active)) => row.get(active) == Some(&Value::Bool(true)),
            _ => true,
        }
    }

    fn rows(&self, resource: &ResourceConfig, scope: Scope) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap()
            .get(&resource.name)
            .map(|rows| {
                rows.iter()
                    .filter(|r| Self::visible(resource, r, scope))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn filtered(&self, resource: &ResourceConfig, scope: Scope, filter: &Filter) -> Vec<Row> {
        self.rows(resource, scope)
            .into_iter()
            .filter(|row| matches_filter(row, filter))
            .collect()
    }

    fn matches_id(resource: &ResourceConfig, row: &Row, id: &RecordId) -> bool {
        match row.get(&resource.primary_key) {
            Some(Value::Number(n)) => n.to_string() == id.to_string(),
            Some(Value::String(s)) => *s == id.to_string(),
            _ => false,
        }
    }

    fn check_unique(&self, resource: &ResourceConfig, values: &Row, except: Option<&RecordId>) -> Result<(), StoreError> {
        let live = self.rows(resource, Scope::All);
        let duplicates: Vec<DuplicateField> = self
            .unique
            .iter()
            .filter(|(name, _)| *name == resource.name)
            .filter_map(|(_, column)| {
                let value = values.get(column)?;
                let taken = live.iter().any(|row| {
                    row.get(column) == Some(value) && except.map_or(true, |id| !Self::matches_id(resource, row, id))
                });
                taken.then(|| DuplicateField {
                    field: column.clone(),
                    value: value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string()),
                })
            })
            .collect();
        if duplicates.is_empty() {
            Ok(())
        } else {
            Err(StoreError::UniqueViolation(duplicates))
        }
    }

    fn with_row<T>(&self, resource: &ResourceConfig, id: &RecordId, f: impl FnOnce(&mut Row) -> T) -> Option<T> {
        let mut tables = self.tables.lock().unwrap();
        let row = tables
            .get_mut(&resource.name)?
            .iter_mut()
            .find(|r| Self::matches_id(resource, r, id))?;
        Some(f(row))
    }
}

/// Column value as PostgreSQL would print it with `::text`.
fn as_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn matches_filter(row: &Row, filter: &Filter) -> bool {
    let equals = filter.equals.iter().all(|(column, values)| {
        as_text(row.get(column)).map_or(false, |text| values.contains(&text))
    });
    let search = filter.search.as_ref().map_or(true, |(columns, needle)| {
        let needle = needle.to_lowercase();
        columns
            .iter()
            .filter_map(|c| as_text(row.get(c)))
            .any(|text| text.to_lowercase().contains(&needle))
    });
    let range = filter.range.as_ref().map_or(true, |range| {
        match row.get(&range.column).and_then(|v| v.as_f64().or_else(|| v.as_str()?.parse().ok())) {
            Some(n) => range.min.map_or(true, |min| n >= min) && range.max.map_or(true, |max| n <= max),
            None => false,
        }
    });
    equals && search && range
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

fn sort_rows(rows: &mut [Row], column: &str, pk: &str, direction: SortDirection) {
    rows.sort_by(|a, b| {
        let ord = compare(a.get(column), b.get(column)).then_with(|| compare(a.get(pk), b.get(pk)));
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        if self.down.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Backend("connection refused".into()));
        }
        Ok(())
    }

    async fn page(
        &self,
        resource: &ResourceConfig,
        scope: Scope,
        filter: &Filter,
        spec: &PaginationSpec,
    ) -> Result<Page<Value>, StoreError> {
        let mut rows = self.filtered(resource, scope, filter);
        sort_rows(
            &mut rows,
            resource.sort_column(&spec.sort_field),
            &resource.primary_key,
            spec.sort_direction,
        );
        let total_items = rows.len() as u64;
        let rows = rows
            .into_iter()
            .skip(spec.offset as usize)
            .take(spec.per_page as usize)
            .map(Value::Object)
            .collect();
        Ok(Page { rows, total_items })
    }

    async fn all(&self, resource: &ResourceConfig, scope: Scope, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        let mut rows = self.filtered(resource, scope, filter);
        sort_rows(&mut rows, resource.sort_column(""), &resource.primary_key, resource.default_order);
        Ok(rows.into_iter().map(Value::Object).collect())
    }

    async fn count(&self, resource: &ResourceConfig, scope: Scope, filter: &Filter) -> Result<u64, StoreError> {
        Ok(self.filtered(resource, scope, filter).len() as u64)
    }

    async fn find(&self, resource: &ResourceConfig, id: &RecordId, scope: Scope) -> Result<Option<Value>, StoreError> {
        Ok(self
            .rows(resource, scope)
            .into_iter()
            .find(|r| Self::matches_id(resource, r, id))
            .map(Value::Object))
    }

    async fn find_by(
        &self,
        resource: &ResourceConfig,
        column: &str,
        value: &str,
        scope: Scope,
    ) -> Result<Option<Value>, StoreError> {
        Ok(self
            .rows(resource, scope)
            .into_iter()
            .find(|r| as_text(r.get(column)).as_deref() == Some(value))
            .map(Value::Object))
    }

    async fn create(&self, resource: &ResourceConfig, values: &Map<String, Value>) -> Result<Value, StoreError> {
        self.check_unique(resource, values, None)?;
        Ok(Value::Object(self.insert(resource, values.clone())))
    }

    async fn update(
        &self,
        resource: &ResourceConfig,
        id: &RecordId,
        values: &Map<String, Value>,
    ) -> Result<Option<Value>, StoreError> {
        if self.find(resource, id, Scope::All).await?.is_none() {
            return Ok(None);
        }
        self.check_unique(resource, values, Some(id))?;
        Ok(self.with_row(resource, id, |row| {
            for (k, v) in values {
                row.insert(k.clone(), v.clone());
            }
            Value::Object(row.clone())
        }))
    }

    async fn delete(&self, resource: &ResourceConfig, id: &RecordId) -> Result<bool, StoreError> {
        if self.find(resource, id, Scope::All).await?.is_none() {
            return Ok(false);
        }
        if resource.soft_delete {
            Ok(self
                .with_row(resource, id, |row| {
                    row.insert("deleted_at".into(), json!("2024-06-01T00:00:00.000Z"));
                })
                .is_some())
        } else {
            let mut tables = self.tables.lock().unwrap();
            let rows = tables.entry(resource.name.clone()).or_default();
            let before = rows.len();
            rows.retain(|r| !Self::matches_id(resource, r, id));
            Ok(rows.len() < before)
        }
    }

    async fn restore(&self, resource: &ResourceConfig, id: &RecordId) -> Result<bool, StoreError> {
        Ok(self
            .with_row(resource, id, |row| {
                let deleted = !row.get("deleted_at").map_or(true, Value::is_null);
                if deleted {
                    row.insert("deleted_at".into(), Value::Null);
                }
                deleted
            })
            .unwrap_or(false))
    }
}

pub fn catalog() -> Catalog {
    parse_catalog(BUILTIN_CATALOG).unwrap()
}

pub fn resource(name: &str) -> ResourceConfig {
    catalog().resource(name).unwrap().clone()
}

pub fn views_dir() -> String {
    format!("{}/web/public/views", env!("CARGO_MANIFEST_DIR"))
}

pub fn config_with(vars: &[(&str, &str)]) -> AppConfig {
    let mut vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    vars.entry("APP_URL".into()).or_insert_with(|| "http://shop.test".into());
    vars.entry("VIEWS_DIR".into()).or_insert_with(views_dir);
    AppConfig::from_lookup(|k| vars.get(k).cloned()).unwrap()
}

pub fn state_with(store: Arc<MemoryStore>, config: AppConfig) -> AppState {
    AppState::new(store, ErrorClassifier::default(), config)
}

pub fn app_with(store: Arc<MemoryStore>, config: AppConfig) -> Router {
    build_app(state_with(store, config), &catalog()).0
}

pub fn app(store: Arc<MemoryStore>) -> Router {
    app_with(store, config_with(&[]))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn send_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    raw_json(method, uri, &body.to_string())
}

pub fn raw_json(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Run one request; the body is parsed as JSON, or `Value::Null` when it is not JSON.
pub async fn call(app: Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

pub async fn call_text(app: Router, req: Request<Body>) -> (StatusCode, String) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

pub const ENVELOPE_KEYS: [&str; 11] = [
    "success", "message", "statusCode", "errorCode", "data", "errors", "pagination", "links", "meta",
    "timestamp", "requestId",
];

pub fn assert_envelope(body: &Value) {
    let obj = body.as_object().expect("envelope is an object");
    let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
    keys.sort_unstable();
    let mut expected = ENVELOPE_KEYS.to_vec();
    expected.sort_unstable();
    assert_eq!(keys, expected);
}
