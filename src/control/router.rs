//! Exact-match route table
//!
//! Routes are keyed by `(method, path)`; registering an existing key replaces
//! its handler. The table is turned into an axum [`Router`] where every
//! handler runs behind a panic guard, so a failing handler produces a `500`
//! instead of taking the connection task down with it. Unknown paths and
//! methods fall through to axum's own 404/405 responses.

use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{on, MethodFilter, MethodRouter};
use axum::Router;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Body sent when a handler panics
pub const INTERNAL_ERROR_BODY: &str = "internal error";

/// Type-erased route handler
pub type Handler = Arc<dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// Unique key of a route
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    /// HTTP method
    pub method: Method,
    /// Exact request path
    pub path: String,
}

impl std::fmt::Display for RouteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Dispatch table mapping `(method, path)` to handlers
#[derive(Default)]
pub struct RouteTable {
    routes: HashMap<RouteKey, Handler>,
}

impl RouteTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any handler already bound to the key
    ///
    /// Returns `true` when an existing handler was replaced.
    pub fn add<F, Fut>(&mut self, method: Method, path: &str, handler: F) -> bool
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let key = RouteKey {
            method,
            path: path.to_string(),
        };
        let handler: Handler = Arc::new(move |req: Request| handler(req).boxed());

        let replaced = self.routes.insert(key.clone(), handler).is_some();
        if replaced {
            warn!("Route {} registered twice; previous handler replaced", key);
        } else {
            debug!("Registered route {}", key);
        }
        replaced
    }

    /// Number of registered routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Whether a handler is bound to `(method, path)`
    pub fn contains(&self, method: &Method, path: &str) -> bool {
        self.routes.contains_key(&RouteKey {
            method: method.clone(),
            path: path.to_string(),
        })
    }

    /// Registered keys, sorted by path then method
    pub fn keys(&self) -> Vec<RouteKey> {
        let mut keys: Vec<RouteKey> = self.routes.keys().cloned().collect();
        keys.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then_with(|| a.method.as_str().cmp(b.method.as_str()))
        });
        keys
    }

    /// Build the axum router serving this table
    pub fn to_router(&self) -> Router {
        let mut by_path: BTreeMap<&str, Vec<(&Method, &Handler)>> = BTreeMap::new();
        for (key, handler) in &self.routes {
            by_path
                .entry(key.path.as_str())
                .or_default()
                .push((&key.method, handler));
        }

        let mut router = Router::new();
        for (path, handlers) in by_path {
            let mut method_router: Option<MethodRouter> = None;

            for (method, handler) in handlers {
                let filter = match MethodFilter::try_from(method.clone()) {
                    Ok(filter) => filter,
                    Err(_) => {
                        warn!("Method {} cannot be routed; skipping {}", method, path);
                        continue;
                    }
                };

                let handler = handler.clone();
                let guarded = move |req: Request| call_guarded(handler.clone(), req);
                method_router = Some(match method_router {
                    Some(existing) => existing.on(filter, guarded),
                    None => on(filter, guarded),
                });
            }

            if let Some(method_router) = method_router {
                router = router.route(path, method_router);
            }
        }

        router
    }
}

/// Run a handler, converting a panic into a generic error response
async fn call_guarded(handler: Handler, req: Request) -> Response {
    let route = format!("{} {}", req.method(), req.uri().path());

    let future = match std::panic::catch_unwind(AssertUnwindSafe(|| handler(req))) {
        Ok(future) => future,
        Err(panic) => return panic_response(&route, panic),
    };

    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => panic_response(&route, panic),
    }
}

fn panic_response(route: &str, panic: Box<dyn Any + Send>) -> Response {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());

    error!("Handler for {} panicked: {}", route, message);
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ok_handler(_req: Request) -> Response {
        "ok".into_response()
    }

    async fn panicking_handler(_req: Request) -> Response {
        panic!("boom")
    }

    #[test]
    fn test_add_and_contains() {
        let mut table = RouteTable::new();
        assert!(table.is_empty());

        assert!(!table.add(Method::GET, "/ping", ok_handler));
        assert!(!table.add(Method::POST, "/ping", ok_handler));

        assert_eq!(table.len(), 2);
        assert!(table.contains(&Method::GET, "/ping"));
        assert!(table.contains(&Method::POST, "/ping"));
        assert!(!table.contains(&Method::GET, "/ping/"));
    }

    #[test]
    fn test_duplicate_registration_overwrites() {
        let mut table = RouteTable::new();
        table.add(Method::GET, "/", ok_handler);
        assert!(table.add(Method::GET, "/", ok_handler));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_keys_are_sorted() {
        let mut table = RouteTable::new();
        table.add(Method::POST, "/api/action", ok_handler);
        table.add(Method::GET, "/ping", ok_handler);
        table.add(Method::GET, "/", ok_handler);

        let keys: Vec<String> = table.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["GET /", "POST /api/action", "GET /ping"]);
    }

    #[tokio::test]
    async fn test_guard_converts_panic_into_500() {
        let handler: Handler = Arc::new(|req: Request| panicking_handler(req).boxed());
        let req = Request::builder().uri("/boom").body(axum::body::Body::empty()).unwrap();

        let response = call_guarded(handler, req).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_guard_passes_response_through() {
        let handler: Handler = Arc::new(|req: Request| ok_handler(req).boxed());
        let req = Request::builder().uri("/ping").body(axum::body::Body::empty()).unwrap();

        let response = call_guarded(handler, req).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
