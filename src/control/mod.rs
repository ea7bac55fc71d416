//! HTTP control surface
//!
//! Serves the liveness probe, the dashboard and the host-action endpoint on
//! `0.0.0.0:<port>`, and owns the listener lifecycle.

mod api;
mod dashboard;
mod handler;
mod router;
mod server;

pub use api::{ActionParseError, ActionRequest};
pub use dashboard::{escape_html, render as render_dashboard};
pub use handler::{
    register_routes, HandlerContext, ACTION_PATH, DASHBOARD_PATH, PING_BODY, PING_PATH,
};
pub use router::{Handler, RouteKey, RouteTable, INTERNAL_ERROR_BODY};
pub use server::{
    probe, ControlServer, ServerState, DEFAULT_HEALTH_TIMEOUT, DEFAULT_SHUTDOWN_GRACE,
};
