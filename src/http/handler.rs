//! Request handlers run by the engine.

use std::fmt;
use std::sync::Arc;

use crate::http::context::Context;

/// One link of a handler chain.
///
/// Cloning is cheap; group handlers are shared by every route below them.
#[derive(Clone)]
pub struct Handler(Arc<dyn Fn(&mut Context) + Send + Sync>);

impl Handler {
    pub fn new(f: impl Fn(&mut Context) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, ctx: &mut Context) {
        (self.0)(ctx)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler")
    }
}

/// Run `chain` in order, stopping early once a handler aborts.
pub fn run_chain(chain: &[Handler], ctx: &mut Context) {
    for handler in chain {
        if ctx.is_aborted() {
            break;
        }
        handler.call(ctx);
    }
}
