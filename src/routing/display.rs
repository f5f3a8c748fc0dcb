//! Human-readable rendering of definitions.
//!
//! The textual form is kept stable for log and diagnostic compatibility.

pub(crate) fn route(method: &str, relative_path: &str, handler_count: usize) -> String {
    format!(
        "Route<method, relativePath, handlerCount> = ({}, {}, {})",
        method, relative_path, handler_count
    )
}

pub(crate) fn router(
    relative_path: &str,
    handler_count: usize,
    route_count: usize,
    router_count: usize,
) -> String {
    format!(
        "Router<relativePath, handlerCount, routeCount, routerCount> = ({}, {}, {}, {})",
        relative_path, handler_count, route_count, router_count
    )
}
