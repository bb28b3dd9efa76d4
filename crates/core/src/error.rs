/// Errors raised while validating traffic from the relay.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed relay frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid base64 audio payload: {0}")]
    InvalidAudio(#[from] base64::DecodeError),
}
