//! macOS power commands
//!
//! Both go through `sudo`, so the agent user needs a NOPASSWD rule for
//! `reboot` and `shutdown` when the agent is not run as root.

use super::CommandSpec;

/// Reboot via sudo
pub const REBOOT: CommandSpec = CommandSpec {
    program: "/bin/sh",
    args: &["-c", "sudo reboot"],
};

/// Halt via sudo
pub const SHUTDOWN: CommandSpec = CommandSpec {
    program: "/bin/sh",
    args: &["-c", "sudo shutdown -h now"],
};
