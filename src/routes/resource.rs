//! Admin and client mounts, one sub-router per catalog resource.

use crate::config::{Catalog, ClientQuery, ResourceConfig};
use crate::handlers::resource::{
    count_active, create, delete, list_active, list_all, list_flagged, list_in_range, list_page,
    list_related, lookup_active, read, read_active, restore, search_active, update,
};
use crate::routes::registry::Routes;
use crate::state::AppState;
use axum::{handler::Handler, Extension};
use std::sync::Arc;

/// Full management surface for one resource.
pub fn admin_resource_routes(resource: Arc<ResourceConfig>) -> Routes<AppState> {
    let soft_delete = resource.soft_delete;
    let routes = Routes::new()
        .get("/", list_page)
        .post("/", create)
        .get("/all", list_all)
        .get("/:id", read)
        .put("/:id", update)
        .delete("/:id", delete);
    let routes = if soft_delete {
        routes.patch("/:id/restore", restore)
    } else {
        routes
    };
    routes.extension(resource)
}

/// Read-only surface over active rows: the list, the declared client queries, then the
/// single-row route.
pub fn client_resource_routes(resource: Arc<ResourceConfig>) -> Routes<AppState> {
    let mut routes = Routes::new().get("/", list_active);
    for query in &resource.client_queries {
        let path = query.path();
        routes = match query {
            ClientQuery::Lookup(q) => routes.get(path, lookup_active.layer(Extension(Arc::new(q.clone())))),
            ClientQuery::Related(q) => routes.get(path, list_related.layer(Extension(Arc::new(q.clone())))),
            ClientQuery::Flagged(q) => routes.get(path, list_flagged.layer(Extension(Arc::new(q.clone())))),
            ClientQuery::Search(q) => routes.get(path, search_active.layer(Extension(Arc::new(q.clone())))),
            ClientQuery::Range(q) => routes.get(path, list_in_range.layer(Extension(Arc::new(q.clone())))),
            ClientQuery::Count(_) => routes.get(path, count_active),
        };
    }
    routes
        .get(&resource.client_key_path(), read_active)
        .extension(resource)
}

/// `/admin/<path>` for admin resources and `/client/<path>` for client resources.
pub fn resource_routes(catalog: &Catalog) -> Routes<AppState> {
    let mut admin = Routes::new();
    let mut client = Routes::new();
    for resource in &catalog.resources {
        let shared = Arc::new(resource.clone());
        let mount = format!("/{}", resource.path);
        if resource.admin {
            admin = admin.nest(&mount, admin_resource_routes(shared.clone()));
        }
        if resource.client {
            client = client.nest(&mount, client_resource_routes(shared));
        }
    }
    Routes::new().nest("/admin", admin).nest("/client", client)
}
