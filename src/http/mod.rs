//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     routing::Router<Handler>
//!     → engine.rs (Engine implements the registration contract)
//!     → Engine::into_router() → axum::Router
//!     → server.rs (layers, bind, serve)
//!
//! Per request:
//!     TCP connection
//!     → server.rs (request ID, tracing, timeout)
//!     → axum path match → engine.rs (exact method dispatch)
//!     → handler.rs (group handlers, then route handlers, on one Context)
//!     → context.rs (collected status, headers, body) → client
//! ```

pub mod context;
pub mod engine;
pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use context::Context;
pub use engine::{Engine, EngineError, RouteInfo, RouterGroup};
pub use handler::Handler;
pub use request::X_REQUEST_ID;
pub use response::ErrorBody;
pub use server::HttpServer;

/// A route producer whose handlers run on the axum engine.
pub type HttpRoute = crate::routing::Route<Handler>;

/// A router producer whose handlers run on the axum engine.
pub type HttpRouter = crate::routing::Router<Handler>;
