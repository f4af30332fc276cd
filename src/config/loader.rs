//! Load `AppConfig` from the environment and the resource catalog from JSON.

use crate::config::types::{AppConfig, Catalog};
use crate::config::validate_catalog;
use crate::error::ConfigError;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

/// Catalog shipped with the crate; `CATALOG_PATH` replaces it.
pub const BUILTIN_CATALOG: &str = include_str!("../../catalog/resources.json");

impl AppConfig {
    /// Read from process environment (after `.env` if the caller loaded one).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read from any key lookup; unset or blank keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port: u16 = parse_or(get("PORT"), "PORT", 3001)?;
        let app_url_raw = get("APP_URL").unwrap_or_else(|| format!("http://localhost:{}", port));
        let app_url = Url::parse(&app_url_raw)
            .ok()
            .filter(|u| u.has_host())
            .ok_or(ConfigError::InvalidValue {
                key: "APP_URL",
                value: app_url_raw,
            })?;

        let api_prefix = get("API_PREFIX").unwrap_or_else(|| "/api".into());
        let api_prefix = format!("/{}", api_prefix.trim_matches('/'));
        if api_prefix == "/" {
            return Err(ConfigError::InvalidValue {
                key: "API_PREFIX",
                value: api_prefix,
            });
        }

        Ok(AppConfig {
            app_name: get("APP_NAME").unwrap_or_else(|| "Storefront".into()),
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            app_url,
            environment: get("APP_ENV").unwrap_or_else(|| "development".into()),
            api_prefix,
            views_dir: get("VIEWS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("web/public/views")),
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "postgres://localhost/storefront".into()),
            max_connections: parse_or(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 5)?,
            body_limit: parse_or(get("BODY_LIMIT_BYTES"), "BODY_LIMIT_BYTES", 1024 * 1024)?,
            catalog_path: get("CATALOG_PATH").map(PathBuf::from),
        })
    }

    /// `APP_URL` without a trailing slash, for prefixing absolute paths in logs.
    pub fn origin(&self) -> &str {
        self.app_url.as_str().trim_end_matches('/')
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}

/// Parse and validate a catalog document.
pub fn parse_catalog(json: &str) -> Result<Catalog, ConfigError> {
    let catalog: Catalog =
        serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))?;
    validate_catalog(&catalog)?;
    Ok(catalog)
}

/// The file at `path` if given, else the built-in catalog.
pub async fn load_catalog(path: Option<&Path>) -> Result<Catalog, ConfigError> {
    match path {
        Some(path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
            parse_catalog(&json)
        }
        None => parse_catalog(BUILTIN_CATALOG),
    }
}
