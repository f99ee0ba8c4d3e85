//! Configuration errors.
//!
//! The `Display` form of [`ConfigError`] is the exact status line shown to
//! the member who triggered the load, so variants render as user-facing
//! text rather than diagnostic prose.

use thiserror::Error;

/// Why a settings document was rejected. Rejection never touches the
/// previously committed configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The document is not valid JSON, or a field has the wrong shape.
    #[error("JSON parsing error")]
    Parse,

    /// A required top-level key is absent.
    #[error("Missing \"{key}\" key in JSON file!")]
    MissingKey { key: String },

    /// The document references a space, channel, or authorized roles that
    /// do not exist in the connected environment.
    #[error("JSON does not match server")]
    Mismatch,
}

impl ConfigError {
    /// Create a missing-key error.
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey { key: key.into() }
    }
}
