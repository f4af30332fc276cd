//! Process configuration and the resource catalog (JSON).

use crate::pagination::{PaginationDefaults, SortDirection, DEFAULT_SORT_FIELD};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Process-wide settings, read once at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub app_name: String,
    pub host: String,
    pub port: u16,
    /// Public origin; page links and route dumps are resolved against it.
    pub app_url: Url,
    pub environment: String,
    /// Mount prefix of the API router, e.g. `/api`.
    pub api_prefix: String,
    pub views_dir: PathBuf,
    pub database_url: String,
    pub max_connections: u32,
    pub body_limit: usize,
    /// JSON file replacing the built-in catalog.
    pub catalog_path: Option<PathBuf>,
}

/// Primary key type for parsing path ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PkType {
    Int,
    Uuid,
}

/// One table exposed as a REST resource.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    /// URL segment under the admin/client mounts, e.g. `parent-categories`.
    pub path: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    pub table: String,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default = "default_pk_type")]
    pub pk_type: PkType,
    /// Columns accepted from request bodies.
    pub columns: Vec<String>,
    /// Columns accepted in `sortBy`.
    #[serde(default)]
    pub sortable: Vec<String>,
    #[serde(default)]
    pub default_order: SortDirection,
    #[serde(default = "default_true")]
    pub soft_delete: bool,
    /// Boolean column that hides a row from client endpoints when false.
    #[serde(default)]
    pub active_column: Option<String>,
    #[serde(default = "default_true")]
    pub timestamps: bool,
    #[serde(default = "default_true")]
    pub admin: bool,
    #[serde(default)]
    pub client: bool,
    /// Columns list endpoints filter on by equality (`?column=value`, repeat for any-of).
    #[serde(default)]
    pub filterable: Vec<String>,
    /// Column the client `/:<key>` route looks rows up by, instead of the primary key.
    #[serde(default)]
    pub client_key: Option<String>,
    /// Extra read-only routes on the client mount.
    #[serde(default)]
    pub client_queries: Vec<ClientQuery>,
}

/// A client route whose condition comes from the path value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnQuery {
    pub path: String,
    pub column: String,
}

/// Case-insensitive text search over `columns`, driven by the `query` parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub path: String,
    pub columns: Vec<String>,
}

/// Inclusive numeric bounds on `column`, read from two query parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeQuery {
    pub path: String,
    pub column: String,
    pub min_param: String,
    pub max_param: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountQuery {
    pub path: String,
}

/// Read-only client route over active rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientQuery {
    /// One row whose column equals the path value, e.g. `/key/:method_key`.
    Lookup(ColumnQuery),
    /// Rows whose column equals the path value, paginated.
    Related(ColumnQuery),
    /// Rows whose boolean column is true, paginated.
    Flagged(ColumnQuery),
    Search(SearchQuery),
    Range(RangeQuery),
    /// Number of rows.
    Count(CountQuery),
}

impl ClientQuery {
    pub fn path(&self) -> &str {
        match self {
            ClientQuery::Lookup(q) | ClientQuery::Related(q) | ClientQuery::Flagged(q) => &q.path,
            ClientQuery::Search(q) => &q.path,
            ClientQuery::Range(q) => &q.path,
            ClientQuery::Count(q) => &q.path,
        }
    }

    /// Columns the query reads, for identifier validation.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            ClientQuery::Lookup(q) | ClientQuery::Related(q) | ClientQuery::Flagged(q) => vec![q.column.as_str()],
            ClientQuery::Search(q) => q.columns.iter().map(String::as_str).collect(),
            ClientQuery::Range(q) => vec![q.column.as_str()],
            ClientQuery::Count(_) => Vec::new(),
        }
    }
}

fn default_schema() -> String {
    "public".into()
}

fn default_primary_key() -> String {
    "id".into()
}

fn default_pk_type() -> PkType {
    PkType::Int
}

fn default_true() -> bool {
    true
}

impl ResourceConfig {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn pagination_defaults(&self) -> PaginationDefaults {
        PaginationDefaults::with_direction(self.default_order)
    }

    /// `requested` if it is in the sort allow-list, else `created_at` (or the primary key
    /// when the table has no timestamps).
    pub fn sort_column<'a>(&'a self, requested: &str) -> &'a str {
        if let Some(col) = self.sortable.iter().find(|c| c.as_str() == requested) {
            return col;
        }
        if self.timestamps {
            DEFAULT_SORT_FIELD
        } else {
            &self.primary_key
        }
    }

    pub fn is_writable(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn is_filterable(&self, column: &str) -> bool {
        self.filterable.iter().any(|c| c == column)
    }

    /// Path template of the client single-row route: `/:id`, or `/:<client_key>`.
    pub fn client_key_path(&self) -> String {
        match &self.client_key {
            Some(key) => format!("/:{}", key),
            None => "/:id".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub resources: Vec<ResourceConfig>,
}

impl Catalog {
    pub fn resource(&self, name: &str) -> Option<&ResourceConfig> {
        self.resources.iter().find(|r| r.name == name)
    }
}
