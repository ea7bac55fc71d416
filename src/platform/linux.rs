//! Linux power commands
//!
//! `systemctl` talks to logind/systemd, which applies polkit rules for
//! non-root callers.

use super::CommandSpec;

/// Reboot through systemd
pub const REBOOT: CommandSpec = CommandSpec {
    program: "systemctl",
    args: &["reboot"],
};

/// Power off through systemd
pub const SHUTDOWN: CommandSpec = CommandSpec {
    program: "systemctl",
    args: &["poweroff"],
};
