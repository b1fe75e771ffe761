// Cloudflare API v4 wire types
//
// Every response is wrapped in the same envelope:
//
// ```json
// { "success": true, "errors": [], "messages": [], "result": { ... } }
// ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Response envelope shared by all endpoints
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub errors: Vec<ApiMessage>,

    pub result: Option<T>,
}

/// One entry of the envelope's `errors` list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: u32,

    #[serde(default)]
    pub message: String,
}

impl fmt::Display for ApiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Join an error list for display
pub(crate) fn join_messages(errors: &[ApiMessage]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Entry of `GET /zones`
#[derive(Debug, Deserialize)]
pub(crate) struct Zone {
    pub id: String,

    #[serde(default)]
    pub name: String,
}

/// Result of `GET /user/tokens/verify`
#[derive(Debug, Deserialize)]
pub(crate) struct TokenStatus {
    #[serde(default)]
    pub id: String,

    pub status: String,
}

/// Request body for record create (POST) and full replace (PUT)
#[derive(Debug, Serialize)]
pub(crate) struct RecordBody<'a> {
    #[serde(rename = "type")]
    pub record_type: &'a str,

    pub name: &'a str,

    pub content: String,

    pub ttl: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
}
