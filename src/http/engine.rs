//! Registration target backed by axum.
//!
//! # Responsibilities
//! - Implement the routing registration contract (`handle`, `group`)
//! - Join group paths and prepend group handlers to every descendant route
//! - Turn the collected table into an `axum::Router`
//! - Dispatch matched requests through their handler chain
//!
//! # Design Decisions
//! - Registration never fails; bad entries are reported by `into_router`
//! - Methods are matched exactly (HEAD does not fall back to GET)
//! - Method mismatch answers 404 unless `handle_method_not_allowed` is set
//! - Request bodies are buffered up to `max_body_bytes` before the chain runs

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{FromRequestParts, Path};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use thiserror::Error;

use crate::config::EngineConfig;
use crate::http::context::Context;
use crate::http::handler::{run_chain, Handler};
use crate::routing::{Routers, Routes};

/// Errors found while building the axum router.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid method {method:?} for path {path}")]
    InvalidMethod { method: String, path: String },

    #[error("invalid path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("duplicate route {method} {path}")]
    DuplicateRoute { method: String, path: String },
}

/// A route as the engine registered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub method: String,
    pub path: String,
    pub handler_count: usize,
}

#[derive(Debug)]
struct Registration {
    info: RouteInfo,
    chain: Arc<[Handler]>,
}

type RouteTable = Arc<Mutex<Vec<Registration>>>;

/// A nested scope on the engine. Cloning shares the underlying table.
#[derive(Debug, Clone)]
pub struct RouterGroup {
    base_path: String,
    handlers: Vec<Handler>,
    table: RouteTable,
}

impl RouterGroup {
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    fn combine(&self, handlers: &[Handler]) -> Vec<Handler> {
        let mut combined = Vec::with_capacity(self.handlers.len() + handlers.len());
        combined.extend_from_slice(&self.handlers);
        combined.extend_from_slice(handlers);
        combined
    }
}

impl Routes<Handler> for RouterGroup {
    type Handle = RouteInfo;

    fn handle(&mut self, method: &str, relative_path: &str, handlers: &[Handler]) -> RouteInfo {
        let chain: Arc<[Handler]> = self.combine(handlers).into();
        let info = RouteInfo {
            method: method.to_string(),
            path: join_paths(&self.base_path, relative_path),
            handler_count: chain.len(),
        };
        metrics::counter!("routes_registered_total").increment(1);
        self.table
            .lock()
            .expect("route table mutex poisoned")
            .push(Registration {
                info: info.clone(),
                chain,
            });
        info
    }
}

impl Routers<Handler> for RouterGroup {
    type Group = RouterGroup;

    fn group(&mut self, relative_path: &str, handlers: &[Handler]) -> RouterGroup {
        RouterGroup {
            base_path: join_paths(&self.base_path, relative_path),
            handlers: self.combine(handlers),
            table: self.table.clone(),
        }
    }
}

/// Root of the registration tree.
pub struct Engine {
    root: RouterGroup,
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            root: RouterGroup {
                base_path: "/".to_string(),
                handlers: Vec::new(),
                table: Arc::new(Mutex::new(Vec::new())),
            },
            config,
        }
    }

    /// Add handlers that run before every route registered afterwards.
    pub fn use_handlers(&mut self, handlers: impl IntoIterator<Item = Handler>) {
        self.root.handlers.extend(handlers);
    }

    /// Every registration so far, in registration order.
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.root
            .table
            .lock()
            .expect("route table mutex poisoned")
            .iter()
            .map(|r| r.info.clone())
            .collect()
    }

    /// Build the axum router serving every registered route.
    pub fn into_router(self) -> Result<axum::Router, EngineError> {
        let registrations = std::mem::take(
            &mut *self
                .root
                .table
                .lock()
                .expect("route table mutex poisoned"),
        );

        let mut paths: BTreeMap<String, HashMap<Method, Arc<[Handler]>>> = BTreeMap::new();
        for Registration { info, chain } in registrations {
            let method = Method::from_bytes(info.method.as_bytes()).map_err(|_| {
                EngineError::InvalidMethod {
                    method: info.method.clone(),
                    path: info.path.clone(),
                }
            })?;
            let methods = paths.entry(info.path.clone()).or_default();
            if methods.insert(method, chain).is_some() {
                return Err(EngineError::DuplicateRoute {
                    method: info.method,
                    path: info.path,
                });
            }
        }

        // axum panics on paths its matcher rejects; check them up front.
        let mut matcher = matchit::Router::new();
        for path in paths.keys() {
            check_path(path)?;
            matcher
                .insert(path.as_str(), ())
                .map_err(|e| EngineError::InvalidPath {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
        }

        let mut router = axum::Router::new();
        for (path, methods) in paths {
            let endpoint = Arc::new(Endpoint {
                methods,
                handle_method_not_allowed: self.config.handle_method_not_allowed,
                max_body_bytes: self.config.max_body_bytes,
            });
            router = router.route(
                &path,
                any(move |request: Request<Body>| {
                    let endpoint = endpoint.clone();
                    async move { endpoint.dispatch(request).await }
                }),
            );
        }

        Ok(router.fallback(not_found))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Routes<Handler> for Engine {
    type Handle = RouteInfo;

    fn handle(&mut self, method: &str, relative_path: &str, handlers: &[Handler]) -> RouteInfo {
        self.root.handle(method, relative_path, handlers)
    }
}

impl Routers<Handler> for Engine {
    type Group = RouterGroup;

    fn group(&mut self, relative_path: &str, handlers: &[Handler]) -> RouterGroup {
        self.root.group(relative_path, handlers)
    }
}

/// All methods registered on one concrete path.
struct Endpoint {
    methods: HashMap<Method, Arc<[Handler]>>,
    handle_method_not_allowed: bool,
    max_body_bytes: usize,
}

impl Endpoint {
    async fn dispatch(&self, request: Request<Body>) -> Response {
        let (mut parts, body) = request.into_parts();
        let method = parts.method.clone();

        let Some(chain) = self.methods.get(&method).cloned() else {
            let response = self.method_mismatch();
            record_request(&method, response.status());
            return response;
        };

        let params = Path::<HashMap<String, String>>::from_request_parts(&mut parts, &())
            .await
            .map(|Path(params)| params)
            .unwrap_or_default();

        let body = match axum::body::to_bytes(body, self.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %parts.uri.path(), error = %e, "Request body rejected");
                record_request(&method, StatusCode::PAYLOAD_TOO_LARGE);
                return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
            }
        };

        let mut ctx = Context::new(parts, params, body);
        run_chain(&chain, &mut ctx);

        let response = ctx.into_response();
        record_request(&method, response.status());
        response
    }

    fn method_mismatch(&self) -> Response {
        if !self.handle_method_not_allowed {
            return not_found_response();
        }
        let mut allowed: Vec<&str> = self.methods.keys().map(Method::as_str).collect();
        allowed.sort_unstable();
        let mut response = (StatusCode::METHOD_NOT_ALLOWED, "405 method not allowed").into_response();
        if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
            response.headers_mut().insert(header::ALLOW, value);
        }
        response
    }
}

async fn not_found(request: Request<Body>) -> Response {
    record_request(request.method(), StatusCode::NOT_FOUND);
    not_found_response()
}

fn not_found_response() -> Response {
    (StatusCode::NOT_FOUND, "404 page not found").into_response()
}

fn record_request(method: &Method, status: StatusCode) {
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);
}

/// Reject segments in the pre-0.8 `:param` / `*rest` syntax, which axum refuses.
fn check_path(path: &str) -> Result<(), EngineError> {
    match path
        .split('/')
        .find(|segment| segment.starts_with(':') || segment.starts_with('*'))
    {
        Some(segment) => Err(EngineError::InvalidPath {
            path: path.to_string(),
            reason: format!("segment {segment:?} must use `{{name}}` or `{{*name}}` syntax"),
        }),
        None => Ok(()),
    }
}

/// Join a group's base path with a relative path.
///
/// An empty relative path keeps the base; a trailing slash on the relative
/// path is preserved.
pub fn join_paths(absolute: &str, relative: &str) -> String {
    if relative.is_empty() {
        return absolute.to_string();
    }
    let mut joined = format!(
        "{}/{}",
        absolute.trim_end_matches('/'),
        relative.trim_start_matches('/')
    );
    if !relative.ends_with('/') && joined.len() > 1 && joined.ends_with('/') {
        joined.pop();
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower::ServiceExt;

    fn marker(tag: &'static str) -> Handler {
        Handler::new(move |ctx: &mut Context| {
            let mut body = String::from_utf8_lossy(ctx.response_body()).into_owned();
            body.push_str(tag);
            ctx.string(StatusCode::OK, body);
        })
    }

    async fn call(router: &axum::Router, method: &str, uri: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/", ""), "/");
        assert_eq!(join_paths("/", "/movies"), "/movies");
        assert_eq!(join_paths("/movies", "/{movie_id}"), "/movies/{movie_id}");
        assert_eq!(join_paths("/a", "b"), "/a/b");
        assert_eq!(join_paths("/a", "/b/"), "/a/b/");
        assert_eq!(join_paths("/a", "/"), "/a/");
        assert_eq!(join_paths("/", "/"), "/");
        assert_eq!(join_paths("/a/", "/b"), "/a/b");
    }

    #[test]
    fn test_group_prefixes_handlers() {
        let mut engine = Engine::default();
        let mut api = engine.group("/api", &[marker("a")]);
        let mut v1 = api.group("/v1", &[marker("b")]);
        let info = v1.handle("GET", "/items", &[marker("c"), marker("d")]);
        assert_eq!(
            info,
            RouteInfo {
                method: "GET".into(),
                path: "/api/v1/items".into(),
                handler_count: 4,
            }
        );
        assert_eq!(engine.routes(), vec![info]);
    }

    #[test]
    fn test_duplicate_route() {
        let mut engine = Engine::default();
        engine.handle("GET", "/x", &[marker("a")]);
        engine.group("/x", &[]).handle("GET", "", &[marker("b")]);
        let err = engine.into_router().unwrap_err();
        assert_eq!(
            err,
            EngineError::DuplicateRoute {
                method: "GET".into(),
                path: "/x".into()
            }
        );
    }

    #[test]
    fn test_invalid_method() {
        let mut engine = Engine::default();
        engine.handle("GE T", "/x", &[]);
        assert!(matches!(
            engine.into_router(),
            Err(EngineError::InvalidMethod { .. })
        ));
    }

    #[tokio::test]
    async fn test_dispatch_runs_chain_in_order() {
        let mut engine = Engine::default();
        engine.group("/g", &[marker("1")]).handle("GET", "/r", &[marker("2"), marker("3")]);
        let router = engine.into_router().unwrap();

        assert_eq!(call(&router, "GET", "/g/r").await, (StatusCode::OK, "123".into()));
        assert_eq!(call(&router, "GET", "/g").await.0, StatusCode::NOT_FOUND);
        assert_eq!(call(&router, "HEAD", "/g/r").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_abort_stops_chain() {
        let mut engine = Engine::default();
        let deny = Handler::new(|ctx: &mut Context| {
            ctx.string(StatusCode::UNAUTHORIZED, "denied");
            ctx.abort();
        });
        engine.handle("GET", "/secret", &[deny, marker("never")]);
        let router = engine.into_router().unwrap();
        assert_eq!(
            call(&router, "GET", "/secret").await,
            (StatusCode::UNAUTHORIZED, "denied".into())
        );
    }

    #[tokio::test]
    async fn test_path_params() {
        let mut engine = Engine::default();
        let echo = Handler::new(|ctx: &mut Context| {
            let id = ctx.param("id").unwrap_or("none").to_string();
            ctx.string(StatusCode::OK, id);
        });
        engine.group("/items", &[]).handle("GET", "/{id}", &[echo]);
        let router = engine.into_router().unwrap();
        assert_eq!(
            call(&router, "GET", "/items/7").await,
            (StatusCode::OK, "7".into())
        );
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let mut engine = Engine::new(EngineConfig {
            handle_method_not_allowed: true,
            ..EngineConfig::default()
        });
        engine.handle("POST", "/x", &[marker("p")]);
        engine.handle("GET", "/x", &[marker("g")]);
        let router = engine.into_router().unwrap();

        let request = Request::builder()
            .method("DELETE")
            .uri("/x")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET, POST");
    }

    #[tokio::test]
    async fn test_body_limit() {
        let mut engine = Engine::new(EngineConfig {
            max_body_bytes: 4,
            ..EngineConfig::default()
        });
        engine.handle("POST", "/upload", &[marker("ok")]);
        let router = engine.into_router().unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .body(Body::from("too large"))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_conflicting_params_rejected() {
        let mut engine = Engine::default();
        engine.handle("GET", "/x/{a}", &[marker("a")]);
        engine.handle("POST", "/x/{b}", &[marker("b")]);
        let Err(EngineError::InvalidPath { path, reason }) = engine.into_router() else {
            panic!("conflicting parameter routes must not build");
        };
        assert_eq!(path, "/x/{b}");
        assert!(reason.contains("/x/{a}"));
    }

    #[test]
    fn test_colon_param_rejected() {
        let mut engine = Engine::default();
        engine
            .group("/movies", &[])
            .handle("GET", "/:movie_id", &[marker("a")]);
        let Err(EngineError::InvalidPath { path, .. }) = engine.into_router() else {
            panic!("colon parameters must not build");
        };
        assert_eq!(path, "/movies/:movie_id");
    }

    #[tokio::test]
    async fn test_wildcard_and_param_paths_build() {
        let mut engine = Engine::default();
        engine.handle("GET", "/files/{*rest}", &[marker("f")]);
        engine.handle("GET", "/movies/{movie_id}", &[marker("m")]);
        engine.handle("GET", "/movies/top", &[marker("t")]);
        let router = engine.into_router().unwrap();
        assert_eq!(call(&router, "GET", "/files/a/b").await, (StatusCode::OK, "f".into()));
        assert_eq!(call(&router, "GET", "/movies/top").await, (StatusCode::OK, "t".into()));
        assert_eq!(call(&router, "GET", "/movies/7").await, (StatusCode::OK, "m".into()));
    }
}
