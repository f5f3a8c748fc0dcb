//! Leaf endpoints: the route producer and its resolved definition.

use std::fmt;
use std::sync::Arc;

use crate::routing::display;
use crate::routing::error::{BoxError, NodeKind, RoutingError, Stage};
use crate::routing::target::Routes;

/// Deferred description of a single endpoint.
///
/// Implemented for any `Fn() -> RouteParts<H>` closure.
pub trait RouteProducer<H>: Send + Sync {
    fn produce(&self) -> RouteParts<H>;
}

impl<H, F> RouteProducer<H> for F
where
    F: Fn() -> RouteParts<H> + Send + Sync,
{
    fn produce(&self) -> RouteParts<H> {
        self()
    }
}

/// Raw output of a route producer.
///
/// On failure a producer should still fill in method and path so the
/// error can say which route it came from.
pub struct RouteParts<H> {
    pub method: String,
    pub relative_path: String,
    pub handlers: Vec<Option<H>>,
    pub error: Option<BoxError>,
}

impl<H> RouteParts<H> {
    pub fn new(method: impl Into<String>, relative_path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            relative_path: relative_path.into(),
            handlers: Vec::new(),
            error: None,
        }
    }

    /// Append a handler to the chain.
    pub fn handler(mut self, handler: H) -> Self {
        self.handlers.push(Some(handler));
        self
    }

    /// Append a slot that may be empty; an empty slot fails resolution.
    pub fn maybe_handler(mut self, handler: Option<H>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Report a failure from the producer.
    pub fn fail(mut self, error: impl Into<BoxError>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// A route producer, or the absence of one.
pub struct Route<H> {
    producer: Option<Arc<dyn RouteProducer<H>>>,
}

impl<H> Route<H> {
    pub fn new(producer: impl RouteProducer<H> + 'static) -> Self {
        Self {
            producer: Some(Arc::new(producer)),
        }
    }

    /// A route with no producer; resolving it fails.
    pub fn absent() -> Self {
        Self { producer: None }
    }

    pub fn is_absent(&self) -> bool {
        self.producer.is_none()
    }

    /// Call the producer once and validate its output.
    pub fn resolve(&self) -> Result<RouteDefinition<H>, RoutingError> {
        let producer = self
            .producer
            .as_ref()
            .ok_or(RoutingError::AbsentProducer(NodeKind::Route))?;

        let RouteParts {
            method,
            relative_path,
            handlers,
            error,
        } = producer.produce();
        let handler_count = handlers.len();
        let context = || display::route(&method, &relative_path, handler_count);

        if let Some(source) = error {
            return Err(RoutingError::Producer {
                node: NodeKind::Route,
                context: context(),
                source,
            });
        }

        let handlers = collect_handlers(NodeKind::Route, handlers, context)?;

        Ok(RouteDefinition {
            method,
            relative_path,
            handlers,
        })
    }

    /// Resolve, then apply the result to `target`.
    pub fn apply<T: Routes<H>>(&self, target: Option<&mut T>) -> Result<T::Handle, RoutingError> {
        let definition = self
            .resolve()
            .map_err(|e| RoutingError::stage(NodeKind::Route, Stage::Resolve, e))?;
        definition
            .apply(target)
            .map_err(|e| RoutingError::stage(NodeKind::Route, Stage::Apply, e))
    }
}

impl<H> Clone for Route<H> {
    fn clone(&self) -> Self {
        Self {
            producer: self.producer.clone(),
        }
    }
}

impl<H> Default for Route<H> {
    fn default() -> Self {
        Self::absent()
    }
}

impl<H> fmt::Debug for Route<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("absent", &self.is_absent())
            .finish()
    }
}

/// Unwrap every handler slot, failing on the first empty one.
///
/// `context` is only rendered when a slot is empty.
pub(crate) fn collect_handlers<H>(
    node: NodeKind,
    handlers: Vec<Option<H>>,
    context: impl Fn() -> String,
) -> Result<Vec<H>, RoutingError> {
    if let Some(index) = handlers.iter().position(Option::is_none) {
        return Err(RoutingError::NilHandler {
            node,
            index,
            context: context(),
        });
    }
    Ok(handlers.into_iter().flatten().collect())
}

/// A validated route, ready to be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDefinition<H> {
    pub method: String,
    pub relative_path: String,
    pub handlers: Vec<H>,
}

impl<H> RouteDefinition<H> {
    /// Register this route on `target`. The definition is not re-validated.
    pub fn apply<T: Routes<H>>(&self, target: Option<&mut T>) -> Result<T::Handle, RoutingError> {
        let target = target.ok_or_else(|| RoutingError::NilTarget {
            node: NodeKind::Route,
            context: self.to_string(),
        })?;

        tracing::debug!(
            method = %self.method,
            relative_path = %self.relative_path,
            handlers = self.handlers.len(),
            "Registering route"
        );

        Ok(target.handle(&self.method, &self.relative_path, &self.handlers))
    }
}

impl<H> fmt::Display for RouteDefinition<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&display::route(
            &self.method,
            &self.relative_path,
            self.handlers.len(),
        ))
    }
}
