//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Composition (application code):
//!     Router / Route producers (closures, evaluated lazily)
//!
//! Resolve (startup, once):
//!     router.rs / route.rs
//!     → call each producer once
//!     → validate handlers, recurse into children
//!     → Return: immutable RouterDefinition tree, or first failure
//!
//! Apply (startup, once):
//!     RouterDefinition
//!     → target.rs (engine registration contract)
//!     → group per router, handle per route
//!     → Return: group handle created for the root
//! ```
//!
//! # Design Decisions
//! - Two explicit phases: nothing is registered from an invalid tree
//! - First failure wins; errors carry the rendered node and child index
//! - Request matching belongs to the engine, never to this module
//! - Generic over the handler type so any engine can be targeted

mod display;
pub mod error;
pub mod route;
pub mod router;
pub mod target;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{BoxError, NodeKind, RoutingError, Stage};
pub use route::{Route, RouteDefinition, RouteParts, RouteProducer};
pub use router::{Router, RouterDefinition, RouterParts, RouterProducer};
pub use target::{Routers, Routes};
