//! hostctl-agent: LAN remote-management agent
//!
//! Exposes an HTTP control surface on a port chosen at startup so a client on
//! the same network can view host status (hostname, memory usage), see live
//! screenshots of every attached display, and request a reboot or shutdown.
//!
//! # Architecture
//!
//! The [`control::ControlServer`] owns the route table and at most one bound
//! listener, and moves through an explicit lifecycle (start, stop, restart,
//! health check). Handlers call into three capabilities that are traits so
//! they can be replaced in tests: [`host::InfoCollector`],
//! [`capture::DisplaySource`] and [`platform::ActionExecutor`]. The
//! [`agent::Agent`] facade and the [`status`] model sit on top for the
//! status-icon integration.
//!
//! # Modules
//!
//! - `agent`: Server facade, free-port and LAN-address discovery
//! - `capture`: Display capture and PNG/base64 encoding
//! - `config`: Configuration parsing and validation
//! - `control`: HTTP routes, dashboard and server lifecycle
//! - `host`: Hostname and memory statistics
//! - `platform`: Platform-specific reboot/shutdown dispatch
//! - `status`: Headless status-menu model
//! - `error`: Error types and handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod agent;
pub mod capture;
pub mod config;
pub mod control;
pub mod error;
pub mod host;
pub mod platform;
pub mod status;

// Re-export commonly used types
pub use error::{AgentError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
