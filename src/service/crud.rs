//! Generic CRUD execution against PostgreSQL.

use crate::config::ResourceConfig;
use crate::error::StoreError;
use crate::pagination::PaginationSpec;
use crate::sql::builder::{self, Statement};
use crate::store::{Filter, Page, RecordId, ResourceStore, Scope};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    async fn fetch_rows(&self, stmt: &Statement) -> Result<Vec<Value>, StoreError> {
        tracing::debug!(sql = %stmt.sql, params = ?stmt.params, "query");
        let mut query = sqlx::query_scalar::<_, Value>(&stmt.sql);
        for param in &stmt.params {
            query = query.bind(param.as_str());
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn fetch_by_id(&self, sql: &str, id: &RecordId) -> Result<Option<Value>, StoreError> {
        tracing::debug!(sql = %sql, id = %id, "query");
        let row = sqlx::query_scalar::<_, Value>(sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn execute_by_id(&self, sql: &str, id: &RecordId) -> Result<bool, StoreError> {
        tracing::debug!(sql = %sql, id = %id, "execute");
        let done = sqlx::query(sql)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }
}

#[async_trait]
impl ResourceStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn page(
        &self,
        resource: &ResourceConfig,
        scope: Scope,
        filter: &Filter,
        spec: &PaginationSpec,
    ) -> Result<Page<Value>, StoreError> {
        let sort = resource.sort_column(&spec.sort_field);
        let stmt = builder::select_page(resource, scope, filter, sort, spec.sort_direction);
        tracing::debug!(sql = %stmt.sql, params = ?stmt.params, limit = spec.per_page, offset = spec.offset, "query");
        // Both fit in i64: per_page <= 100 and offset < 2^32 * 100.
        let mut query = sqlx::query_scalar::<_, Value>(&stmt.sql)
            .bind(spec.per_page as i64)
            .bind(spec.offset as i64);
        for param in &stmt.params {
            query = query.bind(param.as_str());
        }
        let rows = query.fetch_all(&self.pool).await?;
        let total_items = self.count(resource, scope, filter).await?;
        Ok(Page { rows, total_items })
    }

    async fn all(&self, resource: &ResourceConfig, scope: Scope, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        self.fetch_rows(&builder::select_all(resource, scope, filter)).await
    }

    async fn count(&self, resource: &ResourceConfig, scope: Scope, filter: &Filter) -> Result<u64, StoreError> {
        let stmt = builder::count(resource, scope, filter);
        tracing::debug!(sql = %stmt.sql, params = ?stmt.params, "query");
        let mut query = sqlx::query_scalar::<_, i64>(&stmt.sql);
        for param in &stmt.params {
            query = query.bind(param.as_str());
        }
        let total = query.fetch_one(&self.pool).await?;
        Ok(total.max(0) as u64)
    }

    async fn find(
        &self,
        resource: &ResourceConfig,
        id: &RecordId,
        scope: Scope,
    ) -> Result<Option<Value>, StoreError> {
        self.fetch_by_id(&builder::select_by_id(resource, scope), id).await
    }

    async fn find_by(
        &self,
        resource: &ResourceConfig,
        column: &str,
        value: &str,
        scope: Scope,
    ) -> Result<Option<Value>, StoreError> {
        let sql = builder::select_by_column(resource, scope, column);
        tracing::debug!(sql = %sql, value = %value, "query");
        let row = sqlx::query_scalar::<_, Value>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create(
        &self,
        resource: &ResourceConfig,
        values: &Map<String, Value>,
    ) -> Result<Value, StoreError> {
        let columns: Vec<&str> = values.keys().map(String::as_str).collect();
        let sql = builder::insert(resource, &columns);
        tracing::debug!(sql = %sql, "insert");
        let row = sqlx::query_scalar::<_, Value>(&sql)
            .bind(Value::Object(values.clone()))
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update(
        &self,
        resource: &ResourceConfig,
        id: &RecordId,
        values: &Map<String, Value>,
    ) -> Result<Option<Value>, StoreError> {
        let columns: Vec<&str> = values.keys().map(String::as_str).collect();
        let sql = builder::update(resource, &columns);
        tracing::debug!(sql = %sql, id = %id, "update");
        let row = sqlx::query_scalar::<_, Value>(&sql)
            .bind(id.to_string())
            .bind(Value::Object(values.clone()))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete(&self, resource: &ResourceConfig, id: &RecordId) -> Result<bool, StoreError> {
        self.execute_by_id(&builder::delete(resource), id).await
    }

    async fn restore(&self, resource: &ResourceConfig, id: &RecordId) -> Result<bool, StoreError> {
        if !resource.soft_delete {
            return Ok(false);
        }
        self.execute_by_id(&builder::restore(resource), id).await
    }
}
