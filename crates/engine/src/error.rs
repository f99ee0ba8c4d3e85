//! Error types for the engine crate.

use std::fmt;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Engine error types.
#[derive(Debug, Clone)]
pub enum Error {
    /// A platform API call failed. Localized to one operation; the pass
    /// continues in degraded mode where possible.
    Transport { operation: String, reason: String },
    /// The pass reached an unrecoverable state (e.g. channel history
    /// unreadable) and was aborted.
    Reconciliation { reason: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { operation, reason } => {
                write!(f, "platform call '{operation}' failed: {reason}")
            }
            Self::Reconciliation { reason } => {
                write!(f, "reconciliation failed: {reason}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Create a transport error.
    pub fn transport(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a reconciliation error.
    pub fn reconciliation(reason: impl Into<String>) -> Self {
        Self::Reconciliation {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::transport("add_reaction", "rate limited");
        assert!(err.to_string().contains("add_reaction"));
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn test_reconciliation_display() {
        let err = Error::reconciliation("history unreadable");
        assert!(err.to_string().contains("history unreadable"));
    }
}
