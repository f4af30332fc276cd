//! Persistence interface consumed by the resource handlers.

use crate::config::{PkType, ResourceConfig};
use crate::error::StoreError;
use crate::pagination::PaginationSpec;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;

/// Which rows a query may see. Soft-deleted rows are never visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    All,
    /// Only rows whose active column is true (client endpoints).
    Active,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordId {
    Int(i64),
    Uuid(uuid::Uuid),
}

impl RecordId {
    pub fn parse(raw: &str, pk_type: PkType) -> Option<Self> {
        match pk_type {
            PkType::Int => raw.parse().ok().map(RecordId::Int),
            PkType::Uuid => uuid::Uuid::parse_str(raw).ok().map(RecordId::Uuid),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::Uuid(u) => write!(f, "{}", u),
        }
    }
}

/// Inclusive numeric bounds on a column; at least one side is set.
#[derive(Clone, Debug, PartialEq)]
pub struct Range {
    pub column: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Row conditions on top of the scope. Every condition must hold.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    /// Column equals any of the values, compared as text.
    pub equals: Vec<(String, Vec<String>)>,
    /// Some column contains the text, case-insensitively.
    pub search: Option<(Vec<String>, String)>,
    pub range: Option<Range>,
}

impl Filter {
    /// Equality conditions for the resource's filterable columns named in `query`. Repeated keys
    /// accumulate values; other parameters are ignored.
    pub fn from_query(resource: &ResourceConfig, query: &[(String, String)]) -> Self {
        query
            .iter()
            .filter(|(k, _)| resource.is_filterable(k))
            .fold(Filter::default(), |filter, (k, v)| filter.equal(k, v))
    }

    pub fn equal(mut self, column: &str, value: &str) -> Self {
        match self.equals.iter_mut().find(|(c, _)| c == column) {
            Some((_, values)) => values.push(value.to_string()),
            None => self.equals.push((column.to_string(), vec![value.to_string()])),
        }
        self
    }

    pub fn search(mut self, columns: &[String], text: &str) -> Self {
        self.search = Some((columns.to_vec(), text.to_string()));
        self
    }

    pub fn range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total_items: u64,
}

/// Row storage for catalog resources. Rows travel as JSON objects.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    /// One page of matching rows in the requested sort (already checked against the allow-list),
    /// plus the number of matching rows.
    async fn page(
        &self,
        resource: &ResourceConfig,
        scope: Scope,
        filter: &Filter,
        spec: &PaginationSpec,
    ) -> Result<Page<Value>, StoreError>;

    async fn all(&self, resource: &ResourceConfig, scope: Scope, filter: &Filter) -> Result<Vec<Value>, StoreError>;

    async fn count(&self, resource: &ResourceConfig, scope: Scope, filter: &Filter) -> Result<u64, StoreError>;

    async fn find(
        &self,
        resource: &ResourceConfig,
        id: &RecordId,
        scope: Scope,
    ) -> Result<Option<Value>, StoreError>;

    /// First row whose `column` equals `value` as text.
    async fn find_by(
        &self,
        resource: &ResourceConfig,
        column: &str,
        value: &str,
        scope: Scope,
    ) -> Result<Option<Value>, StoreError>;

    /// `values` holds writable columns only.
    async fn create(
        &self,
        resource: &ResourceConfig,
        values: &Map<String, Value>,
    ) -> Result<Value, StoreError>;

    async fn update(
        &self,
        resource: &ResourceConfig,
        id: &RecordId,
        values: &Map<String, Value>,
    ) -> Result<Option<Value>, StoreError>;

    /// Soft delete when the resource supports it. `false` if no live row matched.
    async fn delete(&self, resource: &ResourceConfig, id: &RecordId) -> Result<bool, StoreError>;

    /// `false` if no soft-deleted row matched.
    async fn restore(&self, resource: &ResourceConfig, id: &RecordId) -> Result<bool, StoreError>;
}

/// Keep only the body keys the resource accepts.
pub fn writable_values(resource: &ResourceConfig, body: Map<String, Value>) -> Map<String, Value> {
    body.into_iter()
        .filter(|(k, _)| resource.is_writable(k))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_ids_follow_pk_type() {
        assert_eq!(RecordId::parse("42", PkType::Int), Some(RecordId::Int(42)));
        assert_eq!(RecordId::parse("4x2", PkType::Int), None);
        assert!(RecordId::parse("42", PkType::Uuid).is_none());
        let u = "0b7c5f0e-53a1-4d3e-9c55-0a3f4c7d9e21";
        assert_eq!(RecordId::parse(u, PkType::Uuid).unwrap().to_string(), u);
    }

    #[test]
    fn writable_values_drop_unknown_keys() {
        let resource: ResourceConfig = serde_json::from_value(json!({
            "name": "cities", "path": "cities", "table": "cities", "columns": ["name", "is_active"]
        }))
        .unwrap();
        let body = json!({ "name": "Cali", "id": 9, "deleted_at": null }).as_object().unwrap().clone();
        let kept = writable_values(&resource, body);
        assert_eq!(Value::Object(kept), json!({ "name": "Cali" }));
    }

    #[test]
    fn query_filters_only_allow_listed_columns() {
        let resource: ResourceConfig = serde_json::from_value(json!({
            "name": "orders", "path": "orders", "table": "orders", "columns": ["status", "customer_id"],
            "filterable": ["status", "customer_id"]
        }))
        .unwrap();
        let query: Vec<(String, String)> = [("status", "paid"), ("page", "2"), ("status", "sent"), ("total", "9")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let filter = Filter::from_query(&resource, &query);
        assert_eq!(
            filter.equals,
            vec![("status".to_string(), vec!["paid".to_string(), "sent".to_string()])]
        );
        assert!(filter.search.is_none() && filter.range.is_none());
        assert_eq!(Filter::from_query(&resource, &[]), Filter::default());
    }
}
