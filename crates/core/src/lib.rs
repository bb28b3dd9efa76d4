//! MindMate Client Core
//!
//! Session logic for the voice/text chat client, free of any I/O: the wire
//! protocol, the append-only transcript, audio payload codecs, and the
//! session controller state machine. The transport (`mindmate-relay`) and
//! the runtime (`mindmate-service`) drive this crate through typed events
//! and execute the commands it returns.

pub mod audio;
pub mod controller;
pub mod error;
pub mod protocol;
pub mod transcript;

pub use controller::{
    Command, ConnectionState, ControllerEvent, RecordingState, SessionController, Status,
};
pub use error::ProtocolError;
pub use protocol::{InboundMessage, OutboundMessage};
pub use transcript::{Sender, Transcript, TranscriptEntry};
