use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Rejected locally before any request left the client.
    ValidationFailed,
    /// The service answered and denied the request.
    RemoteRejected,
    /// Transport failure, unreachable service, or an unusable response.
    ConnectivityFailed,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ValidationFailed => "validation_failed",
            Self::RemoteRejected => "remote_rejected",
            Self::ConnectivityFailed => "connectivity_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{}: {}", kind.as_str(), message.as_deref().unwrap_or("no details"))]
pub struct ApiError {
    pub kind: FailureKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    pub fn without_message(kind: FailureKind) -> Self {
        Self { kind, message: None }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ValidationFailed, message)
    }

    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ConnectivityFailed, message)
    }

    /// Message to show the user, with `fallback` when the source gave none.
    pub fn user_message(&self, fallback: &str) -> String {
        match self.message.as_deref().map(str::trim) {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => fallback.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_falls_back_when_absent_or_blank() {
        let rejected = ApiError::without_message(FailureKind::RemoteRejected);
        assert_eq!(rejected.user_message("Login failed"), "Login failed");

        let blank = ApiError::new(FailureKind::RemoteRejected, "   ");
        assert_eq!(blank.user_message("Login failed"), "Login failed");

        let detailed = ApiError::new(FailureKind::RemoteRejected, "Invalid credentials.");
        assert_eq!(detailed.user_message("Login failed"), "Invalid credentials.");
    }

    #[test]
    fn display_names_the_failure_kind() {
        let err = ApiError::connectivity("connection refused");
        assert_eq!(err.to_string(), "connectivity_failed: connection refused");
    }
}
