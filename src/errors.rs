use crate::service::ServiceError;
use thiserror::Error;

/// Uniform failure type surfaced by the rig.
///
/// Service-layer failures are wrapped exactly once, at the controller
/// boundary, so callers see a single error kind with the cause attached.
#[derive(Debug, Error)]
pub enum CameraError {
    /// Programming error: an operation was called in a state that forbids
    /// it. Not recoverable by retrying the same call.
    #[error("usage fault: {0}")]
    UsageFault(String),

    /// The camera service rejected a call.
    #[error("camera access failure: {message}")]
    AccessError {
        message: String,
        #[source]
        source: Option<ServiceError>,
    },

    /// The camera service was unavailable at construction.
    #[error("camera rig initialization error: {0}")]
    InitializationError(String),

    /// Malformed or out-of-range configuration.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl CameraError {
    pub fn usage(message: impl Into<String>) -> Self {
        CameraError::UsageFault(message.into())
    }

    pub fn access(message: impl Into<String>, source: ServiceError) -> Self {
        CameraError::AccessError {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Access failure with no underlying service error, e.g. a dead
    /// worker thread or an empty device list.
    pub fn access_plain(message: impl Into<String>) -> Self {
        CameraError::AccessError {
            message: message.into(),
            source: None,
        }
    }

    pub fn is_usage_fault(&self) -> bool {
        matches!(self, CameraError::UsageFault(_))
    }
}
