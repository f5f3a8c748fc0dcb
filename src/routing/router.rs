//! Subtrees: the router producer and its resolved definition.
//!
//! # Responsibilities
//! - Call each producer exactly once
//! - Validate handlers, then children in declaration order (routes first)
//! - Register a group, then its routes, then its nested routers
//!
//! # Design Decisions
//! - Fail fast: the first invalid node stops resolution of its siblings
//! - Every level wraps child errors with its own rendering and the child index
//! - Children are owned by their parent; the tree cannot contain cycles
//! - Registration of earlier siblings is not rolled back on a later failure

use std::fmt;
use std::sync::Arc;

use crate::routing::display;
use crate::routing::error::{BoxError, NodeKind, RoutingError, Stage};
use crate::routing::route::{collect_handlers, Route, RouteDefinition};
use crate::routing::target::Routers;

/// Deferred description of a routing subtree.
///
/// Implemented for any `Fn() -> RouterParts<H>` closure.
pub trait RouterProducer<H>: Send + Sync {
    fn produce(&self) -> RouterParts<H>;
}

impl<H, F> RouterProducer<H> for F
where
    F: Fn() -> RouterParts<H> + Send + Sync,
{
    fn produce(&self) -> RouterParts<H> {
        self()
    }
}

/// Raw output of a router producer.
pub struct RouterParts<H> {
    pub relative_path: String,
    pub handlers: Vec<Option<H>>,
    pub routes: Vec<Route<H>>,
    pub routers: Vec<Router<H>>,
    pub error: Option<BoxError>,
}

impl<H> RouterParts<H> {
    pub fn new(relative_path: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            handlers: Vec::new(),
            routes: Vec::new(),
            routers: Vec::new(),
            error: None,
        }
    }

    /// Append a handler run before every descendant route.
    pub fn handler(mut self, handler: H) -> Self {
        self.handlers.push(Some(handler));
        self
    }

    /// Append a slot that may be empty; an empty slot fails resolution.
    pub fn maybe_handler(mut self, handler: Option<H>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn route(mut self, route: Route<H>) -> Self {
        self.routes.push(route);
        self
    }

    pub fn router(mut self, router: Router<H>) -> Self {
        self.routers.push(router);
        self
    }

    /// Report a failure from the producer.
    pub fn fail(mut self, error: impl Into<BoxError>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// A router producer, or the absence of one.
pub struct Router<H> {
    producer: Option<Arc<dyn RouterProducer<H>>>,
}

impl<H> Router<H> {
    pub fn new(producer: impl RouterProducer<H> + 'static) -> Self {
        Self {
            producer: Some(Arc::new(producer)),
        }
    }

    /// A router with no producer; resolving it fails.
    pub fn absent() -> Self {
        Self { producer: None }
    }

    pub fn is_absent(&self) -> bool {
        self.producer.is_none()
    }

    /// Call the producer once and resolve the whole subtree.
    pub fn resolve(&self) -> Result<RouterDefinition<H>, RoutingError> {
        let producer = self
            .producer
            .as_ref()
            .ok_or(RoutingError::AbsentProducer(NodeKind::Router))?;

        let RouterParts {
            relative_path,
            handlers,
            routes,
            routers,
            error,
        } = producer.produce();

        // Counts are taken from the producer output so every diagnostic
        // below reports them, whatever stage fails.
        let (handler_count, route_count, router_count) =
            (handlers.len(), routes.len(), routers.len());
        let context = || display::router(&relative_path, handler_count, route_count, router_count);

        if let Some(source) = error {
            return Err(RoutingError::Producer {
                node: NodeKind::Router,
                context: context(),
                source,
            });
        }

        let handlers = collect_handlers(NodeKind::Router, handlers, &context)?;

        let mut route_definitions = Vec::with_capacity(route_count);
        for (index, route) in routes.iter().enumerate() {
            let definition = route.resolve().map_err(|e| {
                RoutingError::child(Stage::Resolve, NodeKind::Route, index, context(), e)
            })?;
            route_definitions.push(definition);
        }

        let mut router_definitions = Vec::with_capacity(router_count);
        for (index, router) in routers.iter().enumerate() {
            let definition = router.resolve().map_err(|e| {
                RoutingError::child(Stage::Resolve, NodeKind::Router, index, context(), e)
            })?;
            router_definitions.push(definition);
        }

        Ok(RouterDefinition {
            relative_path,
            handlers,
            routes: route_definitions,
            routers: router_definitions,
        })
    }

    /// Resolve, then apply the result to `target`.
    pub fn apply<T: Routers<H>>(&self, target: Option<&mut T>) -> Result<T::Group, RoutingError> {
        let definition = self
            .resolve()
            .map_err(|e| RoutingError::stage(NodeKind::Router, Stage::Resolve, e))?;
        definition
            .apply(target)
            .map_err(|e| RoutingError::stage(NodeKind::Router, Stage::Apply, e))
    }
}

impl<H> Clone for Router<H> {
    fn clone(&self) -> Self {
        Self {
            producer: self.producer.clone(),
        }
    }
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self::absent()
    }
}

impl<H> fmt::Debug for Router<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("absent", &self.is_absent())
            .finish()
    }
}

/// A validated subtree, ready to be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterDefinition<H> {
    pub relative_path: String,
    pub handlers: Vec<H>,
    pub routes: Vec<RouteDefinition<H>>,
    pub routers: Vec<RouterDefinition<H>>,
}

impl<H> RouterDefinition<H> {
    /// Register this subtree on `target` and return the group created for it.
    /// The definition is not re-validated.
    pub fn apply<T: Routers<H>>(&self, target: Option<&mut T>) -> Result<T::Group, RoutingError> {
        let target = target.ok_or_else(|| RoutingError::NilTarget {
            node: NodeKind::Router,
            context: self.to_string(),
        })?;

        tracing::debug!(
            relative_path = %self.relative_path,
            handlers = self.handlers.len(),
            routes = self.routes.len(),
            routers = self.routers.len(),
            "Registering group"
        );

        let mut group = target.group(&self.relative_path, &self.handlers);

        // `handle` and `group` are infallible and children always get a target,
        // so the only apply failure is a missing target at the root. The child
        // wrapping keeps the error shape aligned with resolve.
        for (index, route) in self.routes.iter().enumerate() {
            route.apply(Some(&mut group)).map_err(|e| {
                RoutingError::child(Stage::Apply, NodeKind::Route, index, self.to_string(), e)
            })?;
        }

        for (index, router) in self.routers.iter().enumerate() {
            router.apply(Some(&mut group)).map_err(|e| {
                RoutingError::child(Stage::Apply, NodeKind::Router, index, self.to_string(), e)
            })?;
        }

        Ok(group)
    }
}

impl<H> fmt::Display for RouterDefinition<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&display::router(
            &self.relative_path,
            self.handlers.len(),
            self.routes.len(),
            self.routers.len(),
        ))
    }
}
