//! Declarative route trees for HTTP services.
//!
//! Routes and routers are described as lazily evaluated producers, resolved
//! into validated definitions once, then applied onto an HTTP engine.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod movies;
pub mod observability;
pub mod routing;

pub use config::AppConfig;
pub use http::{Engine, HttpServer};
pub use lifecycle::Shutdown;
pub use routing::{Route, RouteDefinition, Router, RouterDefinition, RoutingError};
