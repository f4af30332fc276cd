//! Central failure classifier: maps any `AppError` to status, error code, message and field detail.
//!
//! Rules are evaluated in registration order and the first one that answers wins. Backends add
//! their own rules with [`ErrorClassifier::register`]; anything no rule claims falls through to the
//! failure's own declared mapping, or to `500 INTERNAL_SERVER_ERROR`.

use crate::error::{AppError, StoreError};
use crate::response::ErrorDetail;
use axum::http::StatusCode;

pub const UNIQUE_CONSTRAINT_ERROR: &str = "UNIQUE_CONSTRAINT_ERROR";
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const ROUTE_NOT_FOUND: &str = "ROUTE_NOT_FOUND";
pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub errors: Option<Vec<ErrorDetail>>,
}

impl Classification {
    /// Uniqueness failure with one `The <field> '<value>' already exists.` entry per field.
    pub fn duplicate<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let errors = fields
            .into_iter()
            .map(|(field, value)| ErrorDetail {
                field: field.to_string(),
                message: format!("The {} '{}' already exists.", field, value),
            })
            .collect();
        Classification {
            status: StatusCode::BAD_REQUEST,
            code: UNIQUE_CONSTRAINT_ERROR.into(),
            message: "Duplicate entry detected".into(),
            errors: Some(errors),
        }
    }

    pub fn invalid<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let errors = fields
            .into_iter()
            .map(|(field, message)| ErrorDetail {
                field: field.to_string(),
                message: message.to_string(),
            })
            .collect();
        Classification {
            status: StatusCode::BAD_REQUEST,
            code: VALIDATION_ERROR.into(),
            message: "Validation failed".into(),
            errors: Some(errors),
        }
    }
}

/// One ordered mapping rule. Returns `None` to let later rules decide.
pub trait ClassificationRule: Send + Sync {
    fn classify(&self, failure: &AppError) -> Option<Classification>;
}

/// Tagged uniqueness failures from any store.
pub struct UniqueConstraintRule;

impl ClassificationRule for UniqueConstraintRule {
    fn classify(&self, failure: &AppError) -> Option<Classification> {
        match failure {
            AppError::Store(StoreError::UniqueViolation(fields)) => Some(Classification::duplicate(
                fields.iter().map(|f| (f.field.as_str(), f.value.as_str())),
            )),
            _ => None,
        }
    }
}

/// Tagged field-validation failures from any store.
pub struct FieldValidationRule;

impl ClassificationRule for FieldValidationRule {
    fn classify(&self, failure: &AppError) -> Option<Classification> {
        match failure {
            AppError::Store(StoreError::Validation(fields)) => Some(Classification::invalid(
                fields.iter().map(|f| (f.field.as_str(), f.message.as_str())),
            )),
            _ => None,
        }
    }
}

pub struct ErrorClassifier {
    rules: Vec<Box<dyn ClassificationRule>>,
}

impl Default for ErrorClassifier {
    /// Built-in rules: uniqueness, then field validation.
    fn default() -> Self {
        ErrorClassifier::empty()
            .register(UniqueConstraintRule)
            .register(FieldValidationRule)
    }
}

impl ErrorClassifier {
    /// No rules; every failure takes the fallback mapping.
    pub fn empty() -> Self {
        ErrorClassifier { rules: Vec::new() }
    }

    /// Append a rule after the ones already registered.
    pub fn register<R: ClassificationRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn classify(&self, failure: &AppError) -> Classification {
        self.rules
            .iter()
            .find_map(|rule| rule.classify(failure))
            .unwrap_or_else(|| fallback(failure))
    }
}

fn fallback(failure: &AppError) -> Classification {
    Classification {
        status: failure
            .declared_status()
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        code: failure
            .declared_code()
            .unwrap_or(INTERNAL_SERVER_ERROR)
            .to_string(),
        message: failure
            .public_message()
            .unwrap_or_else(|| "Internal Server Error".into()),
        errors: None,
    }
}
