//! Web views: static HTML pages read from the views directory.

use crate::error::AppError;
use crate::routes::registry::Routes;
use crate::state::AppState;
use axum::{extract::State, response::Html};

pub const CLIENT_INDEX: &str = "client/index.html";
pub const ADMIN_DASHBOARD: &str = "admin/dashboard.html";
pub const ADMIN_LOGIN: &str = "admin/auth/login.html";

async fn view(state: &AppState, file: &str) -> Result<Html<String>, AppError> {
    let path = state.config.views_dir.join(file);
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Ok(Html(html)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "view file missing");
            Err(AppError::NotFound(format!("View {}", file)))
        }
        Err(e) => Err(AppError::Internal(format!("{}: {}", path.display(), e))),
    }
}

async fn client_index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    view(&state, CLIENT_INDEX).await
}

async fn admin_dashboard(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    view(&state, ADMIN_DASHBOARD).await
}

async fn admin_login(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    view(&state, ADMIN_LOGIN).await
}

/// GET /, GET /administrador, GET /administrador/ingreso.
pub fn web_routes() -> Routes<AppState> {
    Routes::new()
        .get("/", client_index)
        .get("/administrador", admin_dashboard)
        .get("/administrador/ingreso", admin_login)
}
