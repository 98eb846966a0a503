// Control-plane message types exchanged between the browser-side frame loop
// and the host-side control server

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /complete`. The server accepts any well-formed JSON; these
/// are the conventional fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionPayload {
    pub completed: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>, // Targets one session; latest session otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_id: Option<String>,
}

impl CompletionPayload {
    pub fn completed(resource: Option<String>, challenge_id: Option<String>) -> Self {
        CompletionPayload {
            completed: true,
            timestamp: Utc::now(),
            resource,
            challenge_id,
        }
    }
}

/// Reply to `POST /complete` (and the generic error body).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompletionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        CompletionResponse { success: true, message: Some(message.into()), error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        CompletionResponse { success: false, message: None, error: Some(error.into()) }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        HealthResponse { status: "ok".to_string() }
    }
}
