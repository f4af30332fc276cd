//! Maps raw PostgreSQL constraint failures onto the shared error taxonomy.

use crate::classify::{Classification, ClassificationRule};
use crate::error::{AppError, StoreError};
use regex::Regex;
use sqlx::error::{DatabaseError, ErrorKind};
use sqlx::postgres::PgDatabaseError;
use std::sync::OnceLock;

/// `Key (a, b)=(x, y) <rest>` as written in PostgreSQL constraint error details.
fn key_detail_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^Key \((?P<fields>[^)]*)\)=\((?P<values>.*)\) (?P<rest>.+)$").expect("static pattern")
    })
}

/// Field/value pairs named in a constraint detail. When the value list cannot be split to match
/// the fields (values containing ", "), every field reports the whole value text.
pub fn key_pairs(detail: &str) -> Vec<(String, String)> {
    let Some(caps) = key_detail_re().captures(detail) else {
        return Vec::new();
    };
    let fields: Vec<&str> = caps["fields"].split(", ").map(str::trim).collect();
    let values: Vec<&str> = caps["values"].split(", ").collect();
    if fields.len() == values.len() {
        fields
            .into_iter()
            .zip(values)
            .map(|(f, v)| (f.to_string(), v.to_string()))
            .collect()
    } else {
        fields
            .into_iter()
            .map(|f| (f.to_string(), caps["values"].to_string()))
            .collect()
    }
}

/// Classification for one constraint failure, from the parts PostgreSQL reports: the violation
/// kind, the `DETAIL` text, the offending column and the constraint name. Kinds that are not
/// constraint violations yield `None`.
pub fn classify_constraint(
    kind: ErrorKind,
    detail: &str,
    column: Option<&str>,
    constraint: Option<&str>,
) -> Option<Classification> {
    let constraint = constraint.unwrap_or("constraint");
    let pairs = key_pairs(detail);

    match kind {
        ErrorKind::UniqueViolation => {
            let pairs = if pairs.is_empty() {
                vec![(constraint.to_string(), String::new())]
            } else {
                pairs
            };
            Some(Classification::duplicate(
                pairs.iter().map(|(f, v)| (f.as_str(), v.as_str())),
            ))
        }
        ErrorKind::ForeignKeyViolation => {
            let messages: Vec<(String, String)> = if pairs.is_empty() {
                vec![(constraint.to_string(), "references a missing record".to_string())]
            } else {
                pairs
                    .into_iter()
                    .map(|(f, v)| {
                        let msg = format!("The {} '{}' does not reference an existing record.", f, v);
                        (f, msg)
                    })
                    .collect()
            };
            Some(Classification::invalid(
                messages.iter().map(|(f, m)| (f.as_str(), m.as_str())),
            ))
        }
        ErrorKind::NotNullViolation => {
            let field = column.unwrap_or(constraint);
            let message = format!("{} cannot be null", field);
            Some(Classification::invalid([(field, message.as_str())]))
        }
        ErrorKind::CheckViolation => {
            let message = format!("{} check failed", constraint);
            Some(Classification::invalid([(constraint, message.as_str())]))
        }
        _ => None,
    }
}

/// Register with `ErrorClassifier::register` when running on [`crate::service::PgStore`].
pub struct PgConstraintRule;

impl ClassificationRule for PgConstraintRule {
    fn classify(&self, failure: &AppError) -> Option<Classification> {
        let AppError::Store(StoreError::Database(sqlx::Error::Database(db))) = failure else {
            return None;
        };
        let pg = db.try_downcast_ref::<PgDatabaseError>();
        classify_constraint(
            db.kind(),
            pg.and_then(PgDatabaseError::detail).unwrap_or_default(),
            pg.and_then(PgDatabaseError::column),
            db.constraint(),
        )
    }
}
