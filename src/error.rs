//! Error types for the address-set engine.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    /// A token is neither a valid address nor a valid CIDR.
    #[error("Invalid IP or CIDR '{token}': {reason}")]
    MalformedInput { token: String, reason: String },

    /// The primary list has no entries.
    #[error("No entries found in {0}")]
    EmptyInput(String),
}

impl ListError {
    pub(crate) fn malformed(token: &str, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}
