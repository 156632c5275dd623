//! Error types for taskmirror.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from the remote task-list API.
///
/// The remote side gives us an opaque code at best. A failed request never
/// kills a fetcher; it surfaces as a FETCH_ERROR event while the previous
/// cache stays live.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
    #[error("Request to {endpoint} failed: {reason}")]
    RequestFailed { endpoint: String, reason: String },

    #[error("Remote returned status {code} for {endpoint}")]
    Status { endpoint: String, code: u16 },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

impl RemoteError {
    /// Opaque error code for FETCH_ERROR payloads. HTTP status where we
    /// have one, 0 otherwise.
    pub fn code(&self) -> u16 {
        match self {
            RemoteError::Status { code, .. } => *code,
            _ => 0,
        }
    }
}
