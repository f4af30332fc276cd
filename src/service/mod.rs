//! PostgreSQL backend: `ResourceStore` over a `PgPool`, plus its failure classification rule.

mod constraint;
mod crud;
pub use constraint::PgConstraintRule;
pub use crud::PgStore;
