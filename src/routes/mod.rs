//! Route composition: a declarative registry, the startup introspector, and the route groups.

pub mod common;
pub mod introspect;
pub mod registry;
pub mod resource;
pub mod web;

pub use common::common_routes;
pub use introspect::{log_route_view, RouteDescriptor, RouteIntrospector, RouteView};
pub use registry::{RouteNode, RouteTable, Routes};
pub use resource::{admin_resource_routes, client_resource_routes, resource_routes};
pub use web::web_routes;
