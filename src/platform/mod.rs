//! Platform-specific privileged host actions
//!
//! The control server only needs one capability from the OS: "hand this
//! reboot/shutdown request over". [`ActionExecutor`] is that seam. The system
//! implementation spawns the platform's power command and does not wait for
//! it; the returned [`Dispatched`] says the request was forwarded, not that
//! the host changed state.

mod privileges;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

pub use privileges::PrivilegeLevel;

use crate::error::{AgentError, Result};
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Host action identified by an integer action code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Restart the host (code 0)
    Reboot,
    /// Power the host off (code 1)
    Shutdown,
}

impl ActionKind {
    /// Map an action code to an action, `None` for unrecognized codes
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Reboot),
            1 => Some(Self::Shutdown),
            _ => None,
        }
    }

    /// Wire code of this action
    pub fn code(&self) -> i64 {
        match self {
            Self::Reboot => 0,
            Self::Shutdown => 1,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reboot => write!(f, "reboot"),
            Self::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// Proof that an action was handed to the OS
///
/// Completion is never observed: the host may be going down by the time the
/// caller sees this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Dispatched {
    /// The dispatched action
    pub kind: ActionKind,
}

/// Capability to perform privileged power actions on the host
#[cfg_attr(test, mockall::automock)]
pub trait ActionExecutor: Send + Sync {
    /// Request a reboot
    fn reboot(&self) -> Result<Dispatched>;

    /// Request a shutdown
    fn shutdown(&self) -> Result<Dispatched>;
}

/// Route an action to the matching executor operation
pub fn dispatch(executor: &dyn ActionExecutor, kind: ActionKind) -> Result<Dispatched> {
    info!("Dispatching host action: {}", kind);
    match kind {
        ActionKind::Reboot => executor.reboot(),
        ActionKind::Shutdown => executor.shutdown(),
    }
}

/// Program and arguments for one power action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable to spawn
    pub program: &'static str,
    /// Arguments passed to the executable
    pub args: &'static [&'static str],
}

impl CommandSpec {
    fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.to_string()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Executor that spawns the platform's power commands
pub struct SystemActionExecutor {
    reboot: CommandSpec,
    shutdown: CommandSpec,
}

impl SystemActionExecutor {
    /// Create an executor using this platform's commands
    pub fn new() -> Self {
        Self::with_commands(reboot_command(), shutdown_command())
    }

    /// Create an executor with explicit commands
    pub fn with_commands(reboot: CommandSpec, shutdown: CommandSpec) -> Self {
        let level = PrivilegeLevel::detect();
        if level.is_elevated() {
            debug!("Action executor running with {} privileges", level);
        } else {
            warn!(
                "Action executor running as {}; reboot/shutdown may be refused by the OS",
                level
            );
        }

        Self { reboot, shutdown }
    }

    fn spawn_detached(&self, kind: ActionKind, spec: &CommandSpec) -> Result<Dispatched> {
        debug!("Spawning {} command: {}", kind, spec.display());

        let child = Command::new(spec.program)
            .args(spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                AgentError::Dispatch(format!("Failed to execute {}: {}", spec.display(), e))
            })?;

        // Reap the child off-thread so the caller never waits on the OS.
        let command = spec.display();
        std::thread::spawn(move || match child.wait_with_output() {
            Ok(output) if output.status.success() => {
                info!("{} command exited: {}", kind, command);
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                error!(
                    "{} command failed ({}): {}: {}",
                    kind,
                    output.status,
                    command,
                    stderr.trim()
                );
            }
            Err(e) => {
                error!("Failed to wait for {} command: {}", kind, e);
            }
        });

        Ok(Dispatched { kind })
    }
}

impl Default for SystemActionExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionExecutor for SystemActionExecutor {
    fn reboot(&self) -> Result<Dispatched> {
        self.spawn_detached(ActionKind::Reboot, &self.reboot)
    }

    fn shutdown(&self) -> Result<Dispatched> {
        self.spawn_detached(ActionKind::Shutdown, &self.shutdown)
    }
}

/// Get the action executor for the current OS
pub fn get_executor() -> Arc<dyn ActionExecutor> {
    Arc::new(SystemActionExecutor::new())
}

fn reboot_command() -> CommandSpec {
    #[cfg(target_os = "linux")]
    {
        linux::REBOOT
    }

    #[cfg(target_os = "macos")]
    {
        macos::REBOOT
    }

    #[cfg(target_os = "windows")]
    {
        windows::REBOOT
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        CommandSpec {
            program: "shutdown",
            args: &["-r", "now"],
        }
    }
}

fn shutdown_command() -> CommandSpec {
    #[cfg(target_os = "linux")]
    {
        linux::SHUTDOWN
    }

    #[cfg(target_os = "macos")]
    {
        macos::SHUTDOWN
    }

    #[cfg(target_os = "windows")]
    {
        windows::SHUTDOWN
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        CommandSpec {
            program: "shutdown",
            args: &["-h", "now"],
        }
    }
}
