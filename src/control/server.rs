//! Control server lifecycle
//!
//! The server owns the route table and at most one bound listener. Its state
//! moves through:
//!
//! ```text
//! Uninitialized -> Ready -> Starting -> Running -> Stopping -> Stopped
//!                              ^                                  |
//!                              +----------------------------------+
//! ```
//!
//! Routes are registered exactly once, on the first `start()`, through a
//! `OnceLock`; later starts reuse the same table. Stopping releases the
//! listener but keeps the routes.

use crate::config::AgentConfig;
use crate::control::handler::{register_routes, HandlerContext, PING_PATH};
use crate::control::router::RouteTable;
use crate::error::{AgentError, Result};
use axum::Router;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Default time in-flight requests get to finish on stop
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Default timeout of the loopback health check
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// Lifecycle state of the control server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Routes not registered yet
    Uninitialized,
    /// Routes registered, listener never bound
    Ready,
    /// Binding the listener
    Starting,
    /// Listener bound and accepting
    Running,
    /// Graceful shutdown in progress
    Stopping,
    /// Listener released, routes kept
    Stopped,
}

impl ServerState {
    /// Check if the listener is accepting connections
    pub fn is_running(&self) -> bool {
        matches!(self, ServerState::Running)
    }

    /// Check if a listener may be bound from this state
    pub fn can_start(&self) -> bool {
        matches!(
            self,
            ServerState::Uninitialized | ServerState::Ready | ServerState::Stopped
        )
    }
}

impl std::fmt::Display for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerState::Uninitialized => write!(f, "uninitialized"),
            ServerState::Ready => write!(f, "ready"),
            ServerState::Starting => write!(f, "starting"),
            ServerState::Running => write!(f, "running"),
            ServerState::Stopping => write!(f, "stopping"),
            ServerState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Routes built by the one-time registration
struct Registration {
    table: RouteTable,
    router: Router,
}

/// Listener currently owned by the server
struct ActiveListener {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

/// HTTP control server bound to a fixed port
pub struct ControlServer {
    /// Port the listener binds on `0.0.0.0`
    port: u16,
    /// Services captured by the route handlers
    context: HandlerContext,
    /// Grace period for in-flight requests on stop
    shutdown_grace: Duration,
    /// Timeout of the loopback health check
    health_timeout: Duration,
    /// Route table, registered at most once
    registration: OnceLock<Registration>,
    /// How many times registration ran (0 or 1)
    registrations: AtomicUsize,
    /// Lifecycle state, observable through `subscribe`
    state: watch::Sender<ServerState>,
    /// Bound listener; the lock also serializes start/stop
    listener: Mutex<Option<ActiveListener>>,
}

impl ControlServer {
    /// Create a server for `port` with default timings
    pub fn new(port: u16, context: HandlerContext) -> Self {
        let (state, _) = watch::channel(ServerState::Uninitialized);
        Self {
            port,
            context,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            registration: OnceLock::new(),
            registrations: AtomicUsize::new(0),
            state,
            listener: Mutex::new(None),
        }
    }

    /// Create a server using the timings from `config`
    pub fn from_config(port: u16, context: HandlerContext, config: &AgentConfig) -> Self {
        Self::new(port, context)
            .with_shutdown_grace(config.server.shutdown_grace())
            .with_health_timeout(config.health.timeout())
    }

    /// Override the shutdown grace period
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Override the health-check timeout
    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    /// Configured listening port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Current lifecycle state
    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    /// Watch lifecycle transitions
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Address of the bound listener, if running
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.lock().await.as_ref().map(|l| l.local_addr)
    }

    /// Registered route table, `None` before the first start
    pub fn routes(&self) -> Option<&RouteTable> {
        self.registration.get().map(|r| &r.table)
    }

    /// Number of times route registration has run
    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    /// Start accepting connections
    ///
    /// Registers routes on first use, binds `0.0.0.0:<port>` and spawns the
    /// accept loop. Returns once the listener is bound. Calling this while
    /// running is a no-op.
    pub async fn start(&self) -> Result<()> {
        let mut slot = self.listener.lock().await;
        if slot.is_some() {
            debug!("Control server already running on port {}", self.port);
            return Ok(());
        }

        let router = self.register().router.clone();
        let previous = self.state();
        if !previous.can_start() {
            return Err(AgentError::InvalidState(format!(
                "Cannot start control server in state: {}",
                previous
            )));
        }
        self.set_state(ServerState::Starting);

        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port));
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(source) => {
                error!("Failed to bind control server on {}: {}", addr, source);
                self.set_state(previous);
                return Err(AgentError::Bind { addr, source });
            }
        };
        let local_addr = listener.local_addr().unwrap_or(addr);

        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        *slot = Some(ActiveListener {
            local_addr,
            shutdown,
            task,
        });
        self.set_state(ServerState::Running);
        info!("Control server listening on {}", local_addr);
        Ok(())
    }

    /// Stop accepting connections and release the listener
    ///
    /// Returns `Ok(false)` when no listener was bound. In-flight requests get
    /// the grace period to finish; after that the accept loop is aborted, the
    /// listener is released anyway and a timeout error is returned.
    pub async fn stop(&self) -> Result<bool> {
        let mut slot = self.listener.lock().await;
        let Some(active) = slot.take() else {
            debug!("Control server already stopped");
            return Ok(false);
        };

        self.set_state(ServerState::Stopping);
        info!("Stopping control server on {}", active.local_addr);
        let _ = active.shutdown.send(());

        let mut task = active.task;
        let result = match tokio::time::timeout(self.shutdown_grace, &mut task).await {
            Ok(Ok(Ok(()))) => Ok(true),
            Ok(Ok(Err(e))) => {
                error!("Control server exited with error: {}", e);
                Err(AgentError::Io(e))
            }
            Ok(Err(e)) => {
                error!("Control server task failed: {}", e);
                Err(AgentError::InvalidState(format!(
                    "control server task failed: {}",
                    e
                )))
            }
            Err(_) => {
                warn!(
                    "In-flight requests did not finish within {:?}; forcing shutdown",
                    self.shutdown_grace
                );
                task.abort();
                let _ = task.await;
                Err(AgentError::Timeout(format!(
                    "graceful shutdown exceeded {:?}",
                    self.shutdown_grace
                )))
            }
        };

        self.set_state(ServerState::Stopped);
        info!("Control server stopped");
        result
    }

    /// Stop (if running) and start again
    pub async fn restart(&self) -> Result<()> {
        match self.stop().await {
            Ok(true) => debug!("Restarting control server"),
            Ok(false) => debug!("Control server was not running; starting"),
            Err(e) => warn!("Stop during restart reported an error: {}", e),
        }
        self.start().await
    }

    /// Start and wait until the listener is released by `stop`
    pub async fn serve(&self) -> Result<()> {
        let mut state = self.subscribe();
        self.start().await?;
        state
            .wait_for(|s| *s == ServerState::Stopped)
            .await
            .map_err(|_| AgentError::InvalidState("lifecycle channel closed".to_string()))?;
        Ok(())
    }

    /// Probe `GET /ping` on this server's port over loopback
    ///
    /// Only the HTTP round trip is checked, never the internal state, so a
    /// dead accept loop is reported as unreachable.
    pub async fn health_check(&self) -> bool {
        probe(self.port, self.health_timeout).await
    }

    fn register(&self) -> &Registration {
        self.registration.get_or_init(|| {
            self.registrations.fetch_add(1, Ordering::SeqCst);

            let mut table = RouteTable::new();
            register_routes(&mut table, self.context.clone());
            let router = table.to_router();
            info!("Registered {} control routes", table.len());

            self.set_state(ServerState::Ready);
            Registration { table, router }
        })
    }

    fn set_state(&self, next: ServerState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!("Control server state: {} -> {}", previous, next);
        }
    }
}

/// Issue `GET /ping` to `127.0.0.1:<port>` and report whether it succeeded
pub async fn probe(port: u16, timeout: Duration) -> bool {
    match ping_status(port, timeout).await {
        Ok(status) if status.is_success() => true,
        Ok(status) => {
            debug!("Health check on port {} returned {}", port, status);
            false
        }
        Err(e) => {
            debug!("Health check on port {} failed: {}", port, e);
            false
        }
    }
}

async fn ping_status(port: u16, timeout: Duration) -> Result<reqwest::StatusCode> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()?;

    let url = format!("http://127.0.0.1:{}{}", port, PING_PATH);
    let response = client.get(&url).send().await?;
    Ok(response.status())
}
