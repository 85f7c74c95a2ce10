//! Error types for cardboard-core
//!
//! Separates transport failures, upstream refusals, and caller mistakes so the
//! web layer can map each onto the right status code.

use thiserror::Error;

/// Core error type for cardboard operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // Remote API Errors
    // ===================
    #[error("Request to Trello failed during {operation}")]
    Transport {
        operation: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{message}")]
    UpstreamStatus {
        operation: String,
        status: u16,
        message: String,
    },

    #[error("Failed to decode Trello response for {operation}")]
    Decode {
        operation: String,
        #[source]
        source: serde_json::Error,
    },

    // ===================
    // Caller Errors
    // ===================
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Card not found: {card_id}")]
    CardNotFound { card_id: String },

    // ===================
    // Config Errors
    // ===================
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl CoreError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// True for failures caused by the caller rather than the remote service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidInput { .. } | CoreError::CardNotFound { .. }
        )
    }

    /// HTTP status reported by Trello, if the failure came from a response
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            CoreError::UpstreamStatus { status, .. } => Some(*status),
            CoreError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
