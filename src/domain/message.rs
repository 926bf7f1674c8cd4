//! Wire messages exchanged with deployed agents.
//!
//! Messages entering or leaving this crate are already plaintext and
//! assumed valid; signing, encryption, and fragmentation are protocol
//! concerns handled inside the package. The server reads only the fields
//! it needs for identity and correlation; the body passes through opaque.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message kind tag for command results. Receive-side correlation only
/// applies to messages of this kind.
pub const COMMAND_RESPONSE_TYPE: &str = "command_response";

/// A single message to or from an endpoint.
///
/// `message_id` is minted by the sender and assumed globally unique; it is
/// the sole deduplication key, shared between the send and receive
/// directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: Uuid,
    /// Kind tag, e.g. `command_request`, `command_response`, `log`.
    pub message_type: String,
    /// For response-shaped messages, the id of the request being answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Agent-specific body, passed through untouched.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Message {
    /// True when this message is a command response correlating to `request`.
    #[must_use]
    pub fn is_response_to(&self, request: Uuid) -> bool {
        self.message_type == COMMAND_RESPONSE_TYPE && self.request_id == Some(request)
    }
}
