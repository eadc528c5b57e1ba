use shared::error::{ApiError, FailureKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid service base address '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error(
        "service rejected {operation}: {}",
        message.as_deref().unwrap_or("no message")
    )]
    Rejected {
        operation: &'static str,
        status: Option<u16>,
        message: Option<String>,
    },
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{operation} returned status {status} without a usable body")]
    UnexpectedResponse { operation: &'static str, status: u16 },
    #[error("invalid upload: {0}")]
    InvalidUpload(String),
}

impl GatewayError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Rejected { .. } => FailureKind::RemoteRejected,
            Self::InvalidUpload(_) => FailureKind::ValidationFailed,
            Self::InvalidBaseUrl { .. }
            | Self::Transport { .. }
            | Self::UnexpectedResponse { .. } => FailureKind::ConnectivityFailed,
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(value: GatewayError) -> Self {
        match value {
            GatewayError::Rejected { message, .. } => ApiError {
                kind: FailureKind::RemoteRejected,
                message,
            },
            other => ApiError::new(other.kind(), other.to_string()),
        }
    }
}
