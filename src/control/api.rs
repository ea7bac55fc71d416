//! Action request parsing for `POST /api/action`
//!
//! The body is a single `key=value` pair where the value is an integer action
//! code. The key is ignored. Diagnostics are plain text and sent with a `200`
//! status, matching what existing clients expect.

use crate::platform::ActionKind;
use thiserror::Error;

/// Why an action body was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionParseError {
    /// The body has no `=` separator
    #[error("parameter error")]
    MissingParameter,

    /// The value is not an integer; carries the parser's message
    #[error("{0}")]
    InvalidCode(String),
}

/// A parsed action request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    /// Value exactly as sent, echoed back in the response
    pub raw_value: String,
    /// Integer action code
    pub code: i64,
}

impl ActionRequest {
    /// Parse a `key=value` body
    ///
    /// The body is split on `=` and the second segment is the value, so
    /// `t=1=x` carries the value `1`.
    pub fn parse(body: &str) -> Result<Self, ActionParseError> {
        let raw_value = body
            .split('=')
            .nth(1)
            .ok_or(ActionParseError::MissingParameter)?;

        let code = raw_value
            .parse::<i64>()
            .map_err(|e| ActionParseError::InvalidCode(e.to_string()))?;

        Ok(Self {
            raw_value: raw_value.to_string(),
            code,
        })
    }

    /// Requested action, `None` for codes without an action
    pub fn kind(&self) -> Option<ActionKind> {
        ActionKind::from_code(self.code)
    }
}
