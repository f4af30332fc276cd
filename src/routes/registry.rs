//! Declarative route registry: every route and mount is recorded with its literal path template
//! while the axum router is built, so diagnostics never have to read the router back.

use axum::{
    handler::Handler,
    routing::{on, MethodFilter},
    Extension, Router,
};

/// One entry of the registered route tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteNode {
    /// Terminal route: path template relative to its mount, plus its methods.
    Route { path: String, methods: Vec<String> },
    /// Sub-router attached under `prefix`.
    Mount { prefix: String, children: Vec<RouteNode> },
}

impl RouteNode {
    /// Path template this node was registered with.
    pub fn template(&self) -> &str {
        match self {
            RouteNode::Route { path, .. } => path,
            RouteNode::Mount { prefix, .. } => prefix,
        }
    }
}

/// Top-level nodes of the composed application, in registration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteTable {
    pub nodes: Vec<RouteNode>,
}

/// Builds an axum `Router` and its [`RouteTable`] side by side.
pub struct Routes<S = ()> {
    router: Router<S>,
    nodes: Vec<RouteNode>,
}

impl<S> Default for Routes<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Routes<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Routes {
            router: Router::new(),
            nodes: Vec::new(),
        }
    }

    /// Register `handler` for `method` on `path`. Methods on the same path share one entry.
    pub fn on<H, T>(mut self, filter: MethodFilter, method: &str, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.router = self.router.route(path, on(filter, handler));
        let method = method.to_ascii_uppercase();
        let existing = self.nodes.iter_mut().find_map(|node| match node {
            RouteNode::Route { path: p, methods } if p == path => Some(methods),
            _ => None,
        });
        match existing {
            Some(methods) => methods.push(method),
            None => self.nodes.push(RouteNode::Route {
                path: path.to_string(),
                methods: vec![method],
            }),
        }
        self
    }

    pub fn get<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.on(MethodFilter::GET, "GET", path, handler)
    }

    pub fn post<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.on(MethodFilter::POST, "POST", path, handler)
    }

    pub fn put<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.on(MethodFilter::PUT, "PUT", path, handler)
    }

    pub fn patch<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.on(MethodFilter::PATCH, "PATCH", path, handler)
    }

    pub fn delete<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.on(MethodFilter::DELETE, "DELETE", path, handler)
    }

    /// Mount `child` under `prefix`. A root prefix merges instead, since axum cannot nest at `/`.
    pub fn nest(mut self, prefix: &str, child: Routes<S>) -> Self {
        self.router = if prefix.trim_matches('/').is_empty() {
            self.router.merge(child.router)
        } else {
            self.router.nest(prefix, child.router)
        };
        self.nodes.push(RouteNode::Mount {
            prefix: prefix.to_string(),
            children: child.nodes,
        });
        self
    }

    /// Add `other`'s routes and mounts at this level.
    pub fn merge(mut self, other: Routes<S>) -> Self {
        self.router = self.router.merge(other.router);
        self.nodes.extend(other.nodes);
        self
    }

    /// Make `value` available to every route registered so far via `Extension<T>`.
    pub fn extension<T>(mut self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.router = self.router.layer(Extension(value));
        self
    }

    pub fn table(&self) -> RouteTable {
        RouteTable {
            nodes: self.nodes.clone(),
        }
    }

    pub fn into_parts(self) -> (Router<S>, RouteTable) {
        (self.router, RouteTable { nodes: self.nodes })
    }
}
