//! Registration contract of the underlying HTTP engine.
//!
//! The applier only ever talks to these two traits. Path concatenation
//! belongs to the implementor: relative paths are passed through untouched.

/// Something routes can be registered on.
pub trait Routes<H> {
    /// Value returned for a registered route.
    type Handle;

    /// Register one method + path + handler chain.
    fn handle(&mut self, method: &str, relative_path: &str, handlers: &[H]) -> Self::Handle;
}

/// Something nested groups can be created on.
pub trait Routers<H>: Routes<H> {
    /// The nested scope, which accepts routes and further groups.
    type Group: Routers<H>;

    /// Create a nested group whose handlers run before every descendant route.
    fn group(&mut self, relative_path: &str, handlers: &[H]) -> Self::Group;
}
