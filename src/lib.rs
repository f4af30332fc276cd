//! Storefront API: catalog-driven e-commerce REST backend with a uniform response envelope.

pub mod app;
pub mod classify;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod pagination;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use app::{build_app, log_route_views};
pub use classify::{Classification, ClassificationRule, ErrorClassifier};
pub use config::{load_catalog, AppConfig, Catalog, ResourceConfig};
pub use error::{AppError, ConfigError, StoreError};
pub use extractors::{CorrelationId, RequestContext};
pub use pagination::{PaginationDefaults, PaginationSpec, SortDirection};
pub use response::Envelope;
pub use routes::{RouteIntrospector, RouteTable, RouteView, Routes};
pub use service::{PgConstraintRule, PgStore};
pub use state::AppState;
pub use store::{ResourceStore, Scope};
