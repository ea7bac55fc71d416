//! Windows power commands
//!
//! `shutdown.exe` enables SeShutdownPrivilege for the calling token itself.

use super::CommandSpec;

/// Immediate restart
pub const REBOOT: CommandSpec = CommandSpec {
    program: "shutdown",
    args: &["/r", "/t", "0"],
};

/// Immediate power off
pub const SHUTDOWN: CommandSpec = CommandSpec {
    program: "shutdown",
    args: &["/s", "/t", "0"],
};
