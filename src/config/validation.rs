//! Configuration validation functions

use crate::error::{AgentError, Result};

/// Upper bound for the shutdown grace period (5 minutes)
const MAX_GRACE_MS: u64 = 300_000;

/// Upper bound for the loopback health-check timeout
const MAX_HEALTH_TIMEOUT_MS: u64 = 60_000;

/// Validate the shutdown grace period (0 means "stop immediately")
pub fn validate_grace_period(grace_ms: u64) -> Result<()> {
    if grace_ms > MAX_GRACE_MS {
        return Err(AgentError::Validation(format!(
            "Shutdown grace period {}ms exceeds maximum of {}ms",
            grace_ms, MAX_GRACE_MS
        )));
    }
    Ok(())
}

/// Validate the health-check timeout (1ms-60s)
pub fn validate_health_timeout(timeout_ms: u64) -> Result<()> {
    if timeout_ms == 0 || timeout_ms > MAX_HEALTH_TIMEOUT_MS {
        return Err(AgentError::Validation(format!(
            "Health-check timeout {}ms is out of valid range (1-{})",
            timeout_ms, MAX_HEALTH_TIMEOUT_MS
        )));
    }
    Ok(())
}

/// Validate the request body limit
///
/// The action endpoint only needs a handful of bytes, but the limit must leave
/// room for a `key=value` pair.
pub fn validate_body_limit(max_body_bytes: usize) -> Result<()> {
    if max_body_bytes < 16 {
        return Err(AgentError::Validation(format!(
            "Request body limit {} is too small (minimum 16 bytes)",
            max_body_bytes
        )));
    }
    Ok(())
}
