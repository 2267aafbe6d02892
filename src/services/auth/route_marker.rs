//! Route marker registry: which routes bypass authentication.
//!
//! Markers are declared next to the route table at startup and never change
//! afterwards, so lookups need no synchronization.
//!
//! Resolution order:
//! - handler marker (method + matched path template)
//! - innermost group marker (path prefix, matched on `/` boundaries)
//! - default: protected

use std::collections::HashMap;

use axum::http::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
}

impl Access {
    pub fn is_public(self) -> bool {
        matches!(self, Self::Public)
    }
}

/// Identity of a route as seen by the gate: method + matched path template
/// (e.g. `GET /api/v1/notes/{id}`), never the concrete request path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub method: Method,
    pub path: String,
}

impl RouteKey {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

impl std::fmt::Display for RouteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteMarkers {
    handlers: HashMap<RouteKey, Access>,
    // Sorted by prefix length, longest first.
    groups: Vec<(String, Access)>,
}

impl RouteMarkers {
    pub fn builder() -> RouteMarkersBuilder {
        RouteMarkersBuilder::default()
    }

    pub fn is_public(&self, route: &RouteKey) -> bool {
        self.resolve(route).is_public()
    }

    pub fn resolve(&self, route: &RouteKey) -> Access {
        if let Some(access) = self.handlers.get(route) {
            return *access;
        }

        self.groups
            .iter()
            .find(|(prefix, _)| path_in_group(&route.path, prefix))
            .map(|(_, access)| *access)
            .unwrap_or(Access::Protected)
    }
}

#[derive(Debug, Default)]
pub struct RouteMarkersBuilder {
    handlers: HashMap<RouteKey, Access>,
    groups: HashMap<String, Access>,
}

impl RouteMarkersBuilder {
    /// Mark a single handler. Overrides whatever its group says.
    pub fn route(mut self, method: Method, path: &str, access: Access) -> Self {
        self.handlers.insert(RouteKey::new(method, path), access);
        self
    }

    /// Mark every route under `prefix`.
    pub fn group(mut self, prefix: &str, access: Access) -> Self {
        self.groups.insert(normalize_prefix(prefix), access);
        self
    }

    pub fn build(self) -> RouteMarkers {
        let mut groups: Vec<(String, Access)> = self.groups.into_iter().collect();
        groups.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        RouteMarkers {
            handlers: self.handlers,
            groups,
        }
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

// `/api/v1/system` contains `/api/v1/system/version` but not `/api/v1/systemd`.
fn path_in_group(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(method: Method, path: &str) -> RouteKey {
        RouteKey::new(method, path)
    }

    #[test]
    fn unmarked_route_requires_authentication() {
        let markers = RouteMarkers::builder().build();
        assert!(!markers.is_public(&key(Method::GET, "/api/v1/me")));
    }

    #[test]
    fn handler_marker_overrides_group_in_both_directions() {
        let markers = RouteMarkers::builder()
            .group("/api/v1/system", Access::Public)
            .route(Method::GET, "/api/v1/system/revocations", Access::Protected)
            .group("/api/v1/notes", Access::Protected)
            .route(Method::GET, "/api/v1/notes/shared/{id}", Access::Public)
            .build();

        assert!(markers.is_public(&key(Method::GET, "/api/v1/system/version")));
        assert!(!markers.is_public(&key(Method::GET, "/api/v1/system/revocations")));
        assert!(!markers.is_public(&key(Method::GET, "/api/v1/notes/{id}")));
        assert!(markers.is_public(&key(Method::GET, "/api/v1/notes/shared/{id}")));
    }

    #[test]
    fn handler_marker_is_method_specific() {
        let markers = RouteMarkers::builder()
            .route(Method::GET, "/api/v1/health", Access::Public)
            .build();

        assert!(markers.is_public(&key(Method::GET, "/api/v1/health")));
        assert!(!markers.is_public(&key(Method::POST, "/api/v1/health")));
    }

    #[test]
    fn innermost_group_wins() {
        let markers = RouteMarkers::builder()
            .group("/api", Access::Public)
            .group("/api/v1/admin/", Access::Protected)
            .build();

        assert!(markers.is_public(&key(Method::GET, "/api/v1/health")));
        assert!(!markers.is_public(&key(Method::GET, "/api/v1/admin/users")));
        assert!(!markers.is_public(&key(Method::GET, "/api/v1/admin")));
    }

    #[test]
    fn group_prefix_matches_on_segment_boundary() {
        let markers = RouteMarkers::builder()
            .group("/api/v1/system", Access::Public)
            .build();

        assert!(!markers.is_public(&key(Method::GET, "/api/v1/systemd")));
    }
}
