//! Error types for hostctl-agent
//!
//! This module defines the error types used throughout the application.
//! We use `thiserror` for ergonomic error definitions and `anyhow` for
//! error propagation in the binary.

use std::net::SocketAddr;
use thiserror::Error;

/// Main error type for hostctl-agent operations
#[derive(Error, Debug)]
pub enum AgentError {
    /// The control listener could not be acquired (port in use, permission)
    #[error("Failed to bind control listener on {addr}: {source}")]
    Bind {
        /// Address the bind was attempted on
        addr: SocketAddr,
        /// Underlying socket error
        #[source]
        source: std::io::Error,
    },

    /// A display snapshot failed
    #[error("Capture error: {0}")]
    Capture(String),

    /// Hostname or memory statistics could not be read
    #[error("Host information unavailable: {0}")]
    InfoCollection(String),

    /// A privileged action could not be handed to the OS
    #[error("Action dispatch failed: {0}")]
    Dispatch(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Loopback HTTP client errors
    #[error("HTTP client error: {0}")]
    Http(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid state errors
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

/// Result type alias using AgentError
pub type Result<T> = std::result::Result<T, AgentError>;

impl From<toml::de::Error> for AgentError {
    fn from(err: toml::de::Error) -> Self {
        AgentError::Config(err.to_string())
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AgentError::Timeout(err.to_string())
        } else {
            AgentError::Http(err.to_string())
        }
    }
}

impl From<image::ImageError> for AgentError {
    fn from(err: image::ImageError) -> Self {
        AgentError::Capture(format!("PNG encoding failed: {}", err))
    }
}
