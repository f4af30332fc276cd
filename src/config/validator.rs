//! Catalog validation: identifiers are interpolated into SQL, so they must be plain.

use crate::config::{Catalog, ClientQuery, ResourceConfig};
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("static pattern"))
}

fn path_segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("static pattern"))
}

fn check_identifier(resource: &ResourceConfig, identifier: &str) -> Result<(), ConfigError> {
    if identifier_re().is_match(identifier) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier {
            resource: resource.name.clone(),
            identifier: identifier.to_string(),
        })
    }
}

/// Client query paths are literal segments, plus exactly one `:param` for path-valued kinds.
fn check_client_query(resource: &ResourceConfig, query: &ClientQuery) -> Result<(), ConfigError> {
    let path = query.path();
    let segments: Vec<&str> = path.strip_prefix('/').unwrap_or("").split('/').collect();
    let params = segments.iter().filter(|s| s.starts_with(':')).count();
    let expected = match query {
        ClientQuery::Lookup(_) | ClientQuery::Related(_) => 1,
        _ => 0,
    };
    let well_formed = path.starts_with('/')
        && segments.iter().all(|s| {
            let name = s.strip_prefix(':').unwrap_or(*s);
            path_segment_re().is_match(name) || (s.starts_with(':') && identifier_re().is_match(name))
        })
        && params == expected
        // a lone `/:x` would shadow the single-row route
        && !(segments.len() == 1 && params == 1);
    if !well_formed {
        return Err(ConfigError::Validation(format!(
            "resource {}: client query path '{}' is not valid for its kind",
            resource.name, path
        )));
    }
    for col in query.columns() {
        check_identifier(resource, col)?;
    }
    Ok(())
}

pub fn validate_catalog(catalog: &Catalog) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    let mut paths = HashSet::new();

    for r in &catalog.resources {
        if !names.insert(r.name.as_str()) {
            return Err(ConfigError::DuplicateName(r.name.clone()));
        }
        if !path_segment_re().is_match(&r.path) {
            return Err(ConfigError::Validation(format!(
                "resource {}: path '{}' must be lowercase kebab-case",
                r.name, r.path
            )));
        }
        if !paths.insert(r.path.as_str()) {
            return Err(ConfigError::DuplicatePathSegment(r.path.clone()));
        }
        if r.columns.is_empty() {
            return Err(ConfigError::Validation(format!(
                "resource {}: at least one writable column required",
                r.name
            )));
        }
        if !r.admin && !r.client {
            return Err(ConfigError::Validation(format!(
                "resource {}: exposed on neither admin nor client",
                r.name
            )));
        }

        check_identifier(r, &r.schema)?;
        check_identifier(r, &r.table)?;
        check_identifier(r, &r.primary_key)?;
        for col in r
            .columns
            .iter()
            .chain(&r.sortable)
            .chain(&r.active_column)
            .chain(&r.filterable)
            .chain(&r.client_key)
        {
            check_identifier(r, col)?;
        }
        if !r.client && (r.client_key.is_some() || !r.client_queries.is_empty()) {
            return Err(ConfigError::Validation(format!(
                "resource {}: client routes configured without a client mount",
                r.name
            )));
        }
        let mut query_paths = HashSet::new();
        for query in &r.client_queries {
            check_client_query(r, query)?;
            if !query_paths.insert(query.path()) {
                return Err(ConfigError::Validation(format!(
                    "resource {}: client query path '{}' declared twice",
                    r.name,
                    query.path()
                )));
            }
        }
        if r.columns.iter().any(|c| *c == r.primary_key) {
            return Err(ConfigError::Validation(format!(
                "resource {}: primary key '{}' cannot be writable",
                r.name, r.primary_key
            )));
        }
    }
    Ok(())
}
