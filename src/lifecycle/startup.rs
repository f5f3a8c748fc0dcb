//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve the routing tree and register it on the engine
//! - Log every registered route
//! - Hand back the application router for the HTTP server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Nothing is registered unless the whole tree resolves

use std::sync::Arc;

use thiserror::Error;

use crate::config::AppConfig;
use crate::http::{Engine, EngineError, HttpRouter};
use crate::movies::{MovieStore, Root};
use crate::routing::RoutingError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("routing: {0}")]
    Routing(#[from] RoutingError),

    #[error("engine: {0}")]
    Engine(#[from] EngineError),
}

/// Resolve and apply `root` onto a fresh engine and build the axum router.
pub fn mount(config: &AppConfig, root: &HttpRouter) -> Result<axum::Router, StartupError> {
    let mut engine = Engine::new(config.engine);

    let group = root.apply(Some(&mut engine))?;
    tracing::debug!(base_path = %group.base_path(), "Routing tree applied");

    for route in engine.routes() {
        tracing::info!(
            method = %route.method,
            path = %route.path,
            handlers = route.handler_count,
            "Route registered"
        );
    }

    Ok(engine.into_router()?)
}

/// Build the movie service application.
pub fn build_application(
    config: &AppConfig,
    store: Arc<dyn MovieStore>,
) -> Result<axum::Router, StartupError> {
    mount(config, &Root::new(store).router())
}
