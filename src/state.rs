//! Shared application state for all routes.

use crate::classify::ErrorClassifier;
use crate::config::AppConfig;
use crate::store::ResourceStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ResourceStore>,
    /// Consulted once per failed request by the failure renderer.
    pub classifier: Arc<ErrorClassifier>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn ResourceStore>, classifier: ErrorClassifier, config: AppConfig) -> Self {
        AppState {
            store,
            classifier: Arc::new(classifier),
            config: Arc::new(config),
        }
    }
}
