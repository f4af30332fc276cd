//! Application assembly: route groups, the failure pipeline, and the startup route dump.

use crate::config::{AppConfig, Catalog};
use crate::extractors::{attach_request_context, RequestContext};
use crate::middleware::{panic_response, render_failures, route_not_found};
use crate::routes::{
    common_routes, log_route_view, resource_routes, web_routes, RouteIntrospector, RouteTable, RouteView,
    Routes,
};
use crate::state::AppState;
use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware, Router,
};
use tower_http::{catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// API routes under the configured prefix, web views at the root.
pub fn app_routes(config: &AppConfig, catalog: &Catalog) -> Routes<AppState> {
    let api = common_routes().merge(resource_routes(catalog));
    Routes::new()
        .nest(&config.api_prefix, api)
        .nest("/", web_routes())
}

/// Wrap `router` so every response carries a correlation id and every failure is an envelope.
pub fn with_envelope_layers(router: Router<AppState>, state: AppState) -> Router {
    let body_limit = state.config.body_limit;
    router
        .fallback(route_not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        // `BODY_LIMIT_BYTES` is the only cap; axum's own 2 MiB extractor default is lifted.
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(middleware::from_fn_with_state(state.clone(), render_failures))
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
            let request_id = req
                .extensions()
                .get::<RequestContext>()
                .map(|ctx| ctx.request_id.to_string())
                .unwrap_or_default();
            tracing::info_span!(
                "request",
                request_id = %request_id,
                method = %req.method(),
                uri = %req.uri()
            )
        }))
        .layer(middleware::from_fn(attach_request_context))
        .with_state(state)
}

/// Full application router and the table of what it serves.
pub fn build_app(state: AppState, catalog: &Catalog) -> (Router, RouteTable) {
    let (router, table) = app_routes(&state.config, catalog).into_parts();
    (with_envelope_layers(router, state), table)
}

/// Log the API view, then the web view.
pub fn log_route_views(config: &AppConfig, table: &RouteTable) {
    let introspector = RouteIntrospector::new(&config.api_prefix);
    for view in [RouteView::Api, RouteView::Web] {
        log_route_view(config.origin(), view, &introspector.list(table, view));
    }
}
