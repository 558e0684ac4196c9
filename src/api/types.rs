//! API request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::DiagramState;

/// Query string of the page endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    /// Session id the page should follow.
    #[serde(default)]
    pub mcp: Option<String>,
}

/// Query string of `GET` on the state endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Current state of a session as seen over HTTP.
///
/// An unknown session serializes as `{"xml":null,"version":0,"lastUpdated":null}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateResponse {
    pub xml: Option<String>,
    pub version: u64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl StateResponse {
    /// Response for a session that has never been written.
    pub fn absent() -> Self {
        Self {
            xml: None,
            version: 0,
            last_updated: None,
        }
    }

    pub fn from_state(state: Option<&DiagramState>) -> Self {
        match state {
            Some(state) => Self {
                xml: Some(state.xml.clone()),
                version: state.version,
                last_updated: Some(state.last_updated),
            },
            None => Self::absent(),
        }
    }
}

/// Body of `POST` on the state endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteStateRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    /// Missing `xml` is stored as the empty document.
    #[serde(default)]
    pub xml: Option<String>,
}

/// Response for a successful write.
#[derive(Debug, Clone, Serialize)]
pub struct WriteStateResponse {
    pub success: bool,
    pub version: u64,
}

impl WriteStateResponse {
    pub fn new(version: u64) -> Self {
        Self {
            success: true,
            version,
        }
    }
}

/// Fixed health payload.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub mcp: bool,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok",
            mcp: true,
        }
    }
}

/// Generic API error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    pub fn session_id_required() -> Self {
        Self::new("sessionId required")
    }

    pub fn invalid_json() -> Self {
        Self::new("Invalid JSON")
    }
}
