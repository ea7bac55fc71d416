//! Agent facade
//!
//! Owns the single [`ControlServer`] of the process, bound to a port chosen
//! once at startup, and exposes the operations the status controller needs.

mod address;

pub use address::{find_free_port, first_lan_ipv4, format_reachable, lan_ipv4};

use crate::config::AgentConfig;
use crate::control::{ControlServer, HandlerContext, ServerState};
use crate::error::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// External-facing wrapper around the control server
#[derive(Clone)]
pub struct Agent {
    port: u16,
    server: Arc<ControlServer>,
}

impl Agent {
    /// Create an agent wired to the real OS services
    ///
    /// A configured port of `0` is replaced by a free port picked now; the
    /// port stays fixed for the lifetime of the agent.
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let port = match config.server.port {
            0 => find_free_port()?,
            port => port,
        };
        let context = HandlerContext::system(config);
        Ok(Self::with_server(ControlServer::from_config(port, context, config)))
    }

    /// Wrap an existing server
    pub fn with_server(server: ControlServer) -> Self {
        Self {
            port: server.port(),
            server: Arc::new(server),
        }
    }

    /// Listening port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Underlying control server
    pub fn server(&self) -> &Arc<ControlServer> {
        &self.server
    }

    /// Current server state
    pub fn state(&self) -> ServerState {
        self.server.state()
    }

    /// `<LAN-IPv4>:<port>`, or `0.0.0.0:<port>` without a LAN interface
    pub fn reachable_address(&self) -> String {
        let address = format_reachable(lan_ipv4(), self.port);
        debug!("Reachable address: {}", address);
        address
    }

    /// Whether the control server answers its liveness probe
    pub async fn ping(&self) -> bool {
        self.server.health_check().await
    }

    /// Start serving, restarting if already running
    pub async fn start(&self) -> Result<()> {
        info!("Starting agent on port {}", self.port);
        self.server.restart().await
    }

    /// Stop serving; `Ok(false)` when nothing was running
    pub async fn stop(&self) -> Result<bool> {
        info!("Stopping agent on port {}", self.port);
        self.server.stop().await
    }
}
