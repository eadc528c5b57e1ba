use serde::{Deserialize, Serialize};

use crate::domain::FileRecord;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilesResponse {
    #[serde(default)]
    pub files: Vec<FileRecord>,
}

/// Error body returned by the service on non-2xx responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Prefers `message`, then a string `detail`, then the first `msg` of a
    /// validation-error list.
    pub fn describe(&self) -> Option<String> {
        if let Some(message) = self.message.as_ref().filter(|m| !m.trim().is_empty()) {
            return Some(message.clone());
        }
        describe_detail(self.detail.as_ref()?)
    }
}

impl LoginResponse {
    pub fn rejection_message(&self) -> Option<String> {
        ErrorBody {
            message: self.message.clone(),
            detail: self.detail.clone(),
        }
        .describe()
    }
}

impl RegisterResponse {
    pub fn rejection_message(&self) -> Option<String> {
        ErrorBody {
            message: self.message.clone(),
            detail: self.detail.clone(),
        }
        .describe()
    }
}

fn describe_detail(detail: &serde_json::Value) -> Option<String> {
    match detail {
        serde_json::Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        serde_json::Value::Array(items) => items
            .iter()
            .find_map(|item| item.get("msg").and_then(|msg| msg.as_str()))
            .map(str::to_string),
        _ => None,
    }
}
