//! Startup route listing: flattens a [`RouteTable`] into descriptors, split into an API view and
//! a web view by the top-level mount prefix.
//!
//! Malformed templates degrade to empty fragments; nothing here can fail.

use crate::routes::registry::{RouteNode, RouteTable};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteDescriptor {
    /// Upper-cased, de-duplicated, in registration order.
    pub methods: Vec<String>,
    pub full_path: String,
}

impl fmt::Display for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.methods.join(", "), self.full_path)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteView {
    Api,
    Web,
}

impl fmt::Display for RouteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RouteView::Api => "api",
            RouteView::Web => "web",
        })
    }
}

pub struct RouteIntrospector {
    api_prefix: String,
}

impl RouteIntrospector {
    /// `api_prefix` is the API mount marker, e.g. `/api`.
    pub fn new(api_prefix: &str) -> Self {
        RouteIntrospector {
            api_prefix: fragment(api_prefix),
        }
    }

    /// Routes of one view, in registration order.
    pub fn list(&self, table: &RouteTable, view: RouteView) -> Vec<RouteDescriptor> {
        let mut out = Vec::new();
        for node in table.nodes.iter().filter(|n| self.view_of(n) == view) {
            walk(node, "", &mut out);
        }
        out
    }

    /// A top-level node is API only if its own template is anchored at the prefix.
    fn view_of(&self, node: &RouteNode) -> RouteView {
        let own = fragment(node.template());
        let anchored = !self.api_prefix.is_empty()
            && (own == self.api_prefix
                || own
                    .strip_prefix(&self.api_prefix)
                    .is_some_and(|rest| rest.starts_with('/')));
        if anchored {
            RouteView::Api
        } else {
            RouteView::Web
        }
    }
}

fn walk(node: &RouteNode, base: &str, out: &mut Vec<RouteDescriptor>) {
    match node {
        RouteNode::Route { path, methods } => {
            let mut seen: Vec<String> = Vec::with_capacity(methods.len());
            for m in methods {
                let m = m.trim().to_ascii_uppercase();
                if !m.is_empty() && !seen.contains(&m) {
                    seen.push(m);
                }
            }
            out.push(RouteDescriptor {
                methods: seen,
                full_path: join(base, &fragment(path)),
            });
        }
        RouteNode::Mount { prefix, children } => {
            let base = join(base, &fragment(prefix));
            for child in children {
                walk(child, &base, out);
            }
        }
    }
}

/// Literal path fragment for a template: `{id}` becomes `:id`, and anything unparseable
/// becomes the empty fragment.
fn fragment(template: &str) -> String {
    let template = template.trim();
    if template.is_empty() {
        return String::new();
    }
    let mut segments = Vec::new();
    for seg in template.split('/').filter(|s| !s.is_empty()) {
        let seg = match seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => {
                let name = name.trim_start_matches('*');
                if !is_param_name(name) {
                    return String::new();
                }
                format!(":{}", name)
            }
            None => seg.to_string(),
        };
        if seg.contains(['{', '}']) || seg.chars().any(char::is_whitespace) {
            return String::new();
        }
        segments.push(seg);
    }
    format!("/{}", segments.join("/"))
}

fn is_param_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Concatenate, collapse repeated `/`, drop a trailing `/` except on the root.
fn join(base: &str, tail: &str) -> String {
    let mut path = String::with_capacity(base.len() + tail.len() + 1);
    for c in format!("/{}/{}", base, tail).chars() {
        if c == '/' && path.ends_with('/') {
            continue;
        }
        path.push(c);
    }
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    path
}

/// Log one view at startup, each path prefixed with `origin`.
pub fn log_route_view(origin: &str, view: RouteView, routes: &[RouteDescriptor]) {
    if routes.is_empty() {
        tracing::warn!(view = %view, "no routes registered");
        return;
    }
    tracing::info!(view = %view, count = routes.len(), "registered routes");
    for route in routes {
        tracing::info!(
            view = %view,
            "[{}] {}{}",
            route.methods.join(", "),
            origin,
            route.full_path
        );
    }
}
