//! Status controller model
//!
//! The status icon and its click loop live outside this crate. This module
//! holds what they render and what a click does: the menu items, their
//! labels, and the handling of each action against the [`Agent`].

use crate::agent::Agent;
use crate::error::Result;
use tracing::{info, warn};

/// Actions that can be triggered from the status menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Copy the reachable address to the clipboard
    CopyAddress,
    /// Probe the control server
    CheckService,
    /// Stop the agent and leave the loop
    Quit,
}

/// A single menu item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    /// Display text
    pub label: String,
    /// Whether the item is clickable
    pub enabled: bool,
    /// Action triggered on click
    pub action: Option<MenuAction>,
}

/// State the menu is built from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusMenu {
    /// Address shown in the header
    pub address: String,
    /// Outcome of the last liveness probe, `None` before the first one
    pub last_check: Option<bool>,
}

impl StatusMenu {
    /// Create a menu for `address` with no probe yet
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            last_check: None,
        }
    }

    /// Label of the liveness item
    pub fn check_label(&self) -> String {
        match self.last_check {
            None => "Check service".to_string(),
            Some(true) => "Check service (last: ok)".to_string(),
            Some(false) => "Check service (last: failed)".to_string(),
        }
    }

    /// Build the menu items from the current state
    pub fn build_menu(&self) -> Vec<MenuItem> {
        vec![
            MenuItem {
                label: format!("Address: {}", self.address),
                enabled: true,
                action: Some(MenuAction::CopyAddress),
            },
            MenuItem {
                label: self.check_label(),
                enabled: true,
                action: Some(MenuAction::CheckService),
            },
            MenuItem {
                label: String::new(),
                enabled: false,
                action: None,
            },
            MenuItem {
                label: "Quit".to_string(),
                enabled: true,
                action: Some(MenuAction::Quit),
            },
        ]
    }
}

/// Clipboard access provided by the desktop integration
pub trait Clipboard: Send + Sync {
    /// Replace the clipboard contents with `text`
    fn set_text(&self, text: &str) -> Result<()>;
}

/// Clipboard that only logs, for headless runs
#[derive(Debug, Default)]
pub struct LogClipboard;

impl Clipboard for LogClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        info!("Reachable address: {}", text);
        Ok(())
    }
}

/// Handles menu actions against an agent
pub struct StatusController<C: Clipboard> {
    agent: Agent,
    clipboard: C,
    menu: StatusMenu,
}

impl<C: Clipboard> StatusController<C> {
    /// Create a controller; the menu shows the agent's reachable address
    pub fn new(agent: Agent, clipboard: C) -> Self {
        let menu = StatusMenu::new(agent.reachable_address());
        Self {
            agent,
            clipboard,
            menu,
        }
    }

    /// Current menu state
    pub fn menu(&self) -> &StatusMenu {
        &self.menu
    }

    /// Controlled agent
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Clipboard in use
    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    /// Handle one action; returns `false` when the loop should end
    pub async fn handle(&mut self, action: MenuAction) -> bool {
        match action {
            MenuAction::CopyAddress => {
                let address = self.agent.reachable_address();
                if let Err(e) = self.clipboard.set_text(&address) {
                    warn!("Failed to copy address to clipboard: {}", e);
                }
                self.menu.address = address;
                true
            }
            MenuAction::CheckService => {
                let alive = self.agent.ping().await;
                if alive {
                    info!("Control server is reachable");
                } else {
                    warn!("Control server is not reachable");
                }
                self.menu.last_check = Some(alive);
                true
            }
            MenuAction::Quit => {
                if let Err(e) = self.agent.stop().await {
                    warn!("Agent did not stop cleanly: {}", e);
                }
                false
            }
        }
    }
}
