//! Defines the JSON message protocol between the client and the relay.

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};

/// Messages sent from the client to the relay.
///
/// Every message carries a request id so replies can be matched back to the
/// request that produced them. Ids are per-connection counters, not UUIDs.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// A text message typed by the user.
    Text { id: u64, text: String },
    /// A completed voice recording, base64-encoded WAV bytes.
    Audio { id: u64, audio: String },
}

impl OutboundMessage {
    /// The request id carried by this message.
    pub fn id(&self) -> u64 {
        match self {
            OutboundMessage::Text { id, .. } | OutboundMessage::Audio { id, .. } => *id,
        }
    }
}

/// Classifies a reply frame from the relay.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InboundKind {
    TextResponse,
    AudioResponse,
    Error,
}

/// A single reply frame from the relay.
///
/// Only `text` is required. Relays that do not echo request ids omit `id`,
/// and older relays omit `type` as well; unknown fields are ignored.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct InboundMessage {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(rename = "type", default)]
    pub kind: Option<InboundKind>,
    pub text: String,
    #[serde(default)]
    pub audio: Option<String>,
}

impl InboundMessage {
    /// Whether the relay flagged this frame as an error report.
    pub fn is_error(&self) -> bool {
        self.kind == Some(InboundKind::Error)
    }
}

/// Parses and validates one inbound text frame.
///
/// A frame that is not a JSON object with a string `text` field is rejected;
/// callers are expected to drop it with a logged warning rather than crash.
pub fn parse_frame(raw: &str) -> Result<InboundMessage, ProtocolError> {
    Ok(serde_json::from_str(raw)?)
}
