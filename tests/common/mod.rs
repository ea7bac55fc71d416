//! Shared fixtures for integration tests

#![allow(dead_code)]

use hostctl_agent::capture::SyntheticDisplaySource;
use hostctl_agent::config::CapturePolicy;
use hostctl_agent::control::{ControlServer, HandlerContext};
use hostctl_agent::host::{ClientInfo, InfoCollector, MemoryStats};
use hostctl_agent::platform::{ActionExecutor, ActionKind, Dispatched};
use hostctl_agent::{AgentError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Executor that counts requests instead of touching the host
#[derive(Default)]
pub struct RecordingExecutor {
    reboots: AtomicUsize,
    shutdowns: AtomicUsize,
}

impl RecordingExecutor {
    pub fn reboots(&self) -> usize {
        self.reboots.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.reboots() + self.shutdowns()
    }
}

impl ActionExecutor for RecordingExecutor {
    fn reboot(&self) -> Result<Dispatched> {
        self.reboots.fetch_add(1, Ordering::SeqCst);
        Ok(Dispatched {
            kind: ActionKind::Reboot,
        })
    }

    fn shutdown(&self) -> Result<Dispatched> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(Dispatched {
            kind: ActionKind::Shutdown,
        })
    }
}

/// Collector returning fixed host facts
pub struct FixedInfo;

impl InfoCollector for FixedInfo {
    fn collect(&self) -> Result<ClientInfo> {
        Ok(ClientInfo {
            hostname: "test-host".to_string(),
            memory: MemoryStats::from_totals(16_000_000_000, 4_000_000_000)?,
        })
    }
}

/// Collector that blocks before answering, to keep a request in flight
pub struct SlowInfo(pub Duration);

impl InfoCollector for SlowInfo {
    fn collect(&self) -> Result<ClientInfo> {
        std::thread::sleep(self.0);
        FixedInfo.collect()
    }
}

/// Executor whose every operation panics
pub struct PanickingExecutor;

impl ActionExecutor for PanickingExecutor {
    fn reboot(&self) -> Result<Dispatched> {
        panic!("reboot backend crashed")
    }

    fn shutdown(&self) -> Result<Dispatched> {
        panic!("shutdown backend crashed")
    }
}

/// Collector that always fails
pub struct FailingInfo;

impl InfoCollector for FailingInfo {
    fn collect(&self) -> Result<ClientInfo> {
        Err(AgentError::InfoCollection("sysinfo unavailable".to_string()))
    }
}

pub fn free_port() -> u16 {
    std::net::TcpListener::bind("0.0.0.0:0")
        .and_then(|l| l.local_addr())
        .map(|a| a.port())
        .expect("Failed to reserve port")
}

pub fn context(executor: Arc<RecordingExecutor>, displays: usize) -> HandlerContext {
    context_with(executor, Arc::new(FixedInfo), displays)
}

pub fn context_with(
    executor: Arc<dyn ActionExecutor>,
    info: Arc<dyn InfoCollector>,
    displays: usize,
) -> HandlerContext {
    HandlerContext {
        executor,
        displays: Arc::new(SyntheticDisplaySource::with_displays(displays, 8, 6)),
        info,
        capture_policy: CapturePolicy::Abort,
        max_body_bytes: 64 * 1024,
    }
}

/// Start a server on a fresh port with a recording executor
pub async fn start_server(displays: usize) -> (ControlServer, Arc<RecordingExecutor>) {
    let executor = Arc::new(RecordingExecutor::default());
    let server = ControlServer::new(free_port(), context(executor.clone(), displays))
        .with_shutdown_grace(Duration::from_secs(2));
    server.start().await.expect("Failed to start control server");
    (server, executor)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("Failed to build client")
}

pub fn url(server: &ControlServer, path: &str) -> String {
    format!("http://127.0.0.1:{}{}", server.port(), path)
}
