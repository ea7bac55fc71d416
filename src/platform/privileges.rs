//! Privilege level detection
//!
//! Reboot and shutdown need root/Administrator rights (or a sudo rule for the
//! agent user). The executor only reports the level; it never escalates.

/// Privilege level the power commands will run with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivilegeLevel {
    /// Effective uid 0
    Root,
    /// Elevated Windows token
    Administrator,
    /// Unprivileged account
    User,
    /// Could not be determined
    Unknown,
}

impl PrivilegeLevel {
    /// Detect the privilege level of this process
    #[cfg(unix)]
    pub fn detect() -> Self {
        // Spawned commands inherit the effective uid
        let euid = unsafe { libc::geteuid() };
        Self::from_euid(euid)
    }

    /// Detect the privilege level of this process
    ///
    /// `net session` only succeeds from an elevated token.
    #[cfg(windows)]
    pub fn detect() -> Self {
        use std::process::{Command, Stdio};

        match Command::new("net")
            .arg("session")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) if status.success() => Self::Administrator,
            Ok(_) => Self::User,
            Err(_) => Self::Unknown,
        }
    }

    /// Detect the privilege level of this process
    #[cfg(not(any(unix, windows)))]
    pub fn detect() -> Self {
        Self::Unknown
    }

    /// Map an effective uid to a level
    #[cfg(unix)]
    pub fn from_euid(euid: libc::uid_t) -> Self {
        if euid == 0 {
            Self::Root
        } else {
            Self::User
        }
    }

    /// Whether power commands can run without a sudo rule or UAC prompt
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::Root | Self::Administrator)
    }
}

impl std::fmt::Display for PrivilegeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Root => "root",
            Self::Administrator => "administrator",
            Self::User => "user",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}
