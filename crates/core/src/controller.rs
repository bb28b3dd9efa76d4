//! The session controller: one state machine owning the connection lifecycle,
//! the capture lifecycle, and the transcript.
//!
//! Every socket, device, and user gesture event is delivered as a typed
//! [`ControllerEvent`] to the single-threaded [`SessionController::handle`]
//! update function, which returns the side effects to perform as typed
//! [`Command`]s. The runtime executes commands; the controller never touches
//! a socket or a microphone itself, so every transition is testable without
//! either.

use crate::audio;
use crate::protocol::{InboundMessage, OutboundMessage};
use crate::transcript::{Sender, Transcript};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Transcript placeholder recorded for a sent voice message.
pub const VOICE_PLACEHOLDER: &str = "[voice message]";

/// Lifecycle of the WebSocket transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Lifecycle of a single voice-capture attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
    Processing,
}

/// The single user-visible status line. Each event overwrites the previous
/// status; there is no history and no stacking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Connecting,
    Connected,
    ConnectionLost { reason: Option<String> },
    Reconnecting,
    Recording,
    Processing,
    CaptureError(String),
    RelayError(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Connecting => write!(f, "connecting to relay..."),
            Status::Connected => write!(f, "connected"),
            Status::ConnectionLost { reason: Some(r) } => {
                write!(f, "connection error: {r} (retrying)")
            }
            Status::ConnectionLost { reason: None } => write!(f, "connection lost (retrying)"),
            Status::Reconnecting => write!(f, "reconnecting..."),
            Status::Recording => write!(f, "recording"),
            Status::Processing => write!(f, "processing voice message..."),
            Status::CaptureError(r) => write!(f, "microphone unavailable: {r}"),
            Status::RelayError(r) => write!(f, "relay error: {r}"),
        }
    }
}

/// An input to the controller: a user gesture, a device callback, or a
/// transport lifecycle change.
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// The transport established a connection.
    Opened,
    /// The transport closed, cleanly or not.
    Closed { reason: Option<String> },
    /// The reconnect timer fired.
    ReconnectDue,
    /// A validated reply frame arrived from the relay.
    Frame(InboundMessage),
    /// The user pressed the record gesture.
    PressRecord,
    /// The user released the record gesture.
    ReleaseRecord,
    /// The capture device granted access and started streaming.
    CaptureStarted { sample_rate: u32, channels: u16 },
    /// The capture device could not be acquired or failed mid-stream.
    CaptureFailed(String),
    /// A chunk of PCM16 samples from the capture device.
    CaptureChunk(Vec<i16>),
    /// The capture device halted and all chunks have been delivered.
    CaptureStopped,
    /// The user submitted the text input field.
    SubmitText(String),
}

/// A side effect the runtime must perform on the controller's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Open the WebSocket connection now.
    Connect,
    /// Deliver a `ReconnectDue` event after the given delay.
    ScheduleReconnect(Duration),
    /// Acquire the capture device and start streaming chunks.
    StartCapture,
    /// Halt the capture device and release the hardware.
    StopCapture,
    /// Serialize and send one message over the transport.
    Send(OutboundMessage),
    /// Play the given audio bytes, interrupting any previous playback.
    Play(Vec<u8>),
    /// Clear the text input field.
    ClearInput,
}

/// Owns connection, capture, and transcript state for one chat session.
pub struct SessionController {
    reconnect_delay: Duration,
    connection: ConnectionState,
    recording: RecordingState,
    capture_pending: bool,
    capture_format: Option<(u32, u16)>,
    chunk_buffer: Vec<i16>,
    next_request_id: u64,
    pending_replies: VecDeque<u64>,
    transcript: Transcript,
    status: Status,
}

impl SessionController {
    pub fn new(reconnect_delay: Duration) -> Self {
        Self {
            reconnect_delay,
            connection: ConnectionState::Disconnected,
            recording: RecordingState::Idle,
            capture_pending: false,
            capture_format: None,
            chunk_buffer: Vec::new(),
            next_request_id: 1,
            pending_replies: VecDeque::new(),
            transcript: Transcript::new(),
            status: Status::Connecting,
        }
    }

    /// Begins the session by requesting the initial connection attempt.
    pub fn start(&mut self) -> Vec<Command> {
        self.connection = ConnectionState::Connecting;
        self.status = Status::Connecting;
        vec![Command::Connect]
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn recording(&self) -> RecordingState {
        self.recording
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Request ids sent but not yet answered by the relay.
    pub fn pending_replies(&self) -> usize {
        self.pending_replies.len()
    }

    /// Applies one event and returns the side effects to perform.
    pub fn handle(&mut self, event: ControllerEvent) -> Vec<Command> {
        match event {
            ControllerEvent::Opened => self.on_opened(),
            ControllerEvent::Closed { reason } => self.on_closed(reason),
            ControllerEvent::ReconnectDue => self.on_reconnect_due(),
            ControllerEvent::Frame(msg) => self.on_frame(msg),
            ControllerEvent::PressRecord => self.on_press_record(),
            ControllerEvent::ReleaseRecord => self.on_release_record(),
            ControllerEvent::CaptureStarted {
                sample_rate,
                channels,
            } => self.on_capture_started(sample_rate, channels),
            ControllerEvent::CaptureFailed(reason) => self.on_capture_failed(reason),
            ControllerEvent::CaptureChunk(samples) => self.on_capture_chunk(samples),
            ControllerEvent::CaptureStopped => self.on_capture_stopped(),
            ControllerEvent::SubmitText(value) => self.on_submit_text(value),
        }
    }

    fn on_opened(&mut self) -> Vec<Command> {
        self.connection = ConnectionState::Connected;
        self.status = Status::Connected;
        Vec::new()
    }

    fn on_closed(&mut self, reason: Option<String>) -> Vec<Command> {
        if let Some(r) = &reason {
            warn!(reason = %r, "relay connection closed");
        }
        self.connection = ConnectionState::Disconnected;
        self.status = Status::ConnectionLost { reason };
        vec![Command::ScheduleReconnect(self.reconnect_delay)]
    }

    fn on_reconnect_due(&mut self) -> Vec<Command> {
        if self.connection != ConnectionState::Disconnected {
            debug!("ignoring reconnect timer, connection already in progress");
            return Vec::new();
        }
        self.connection = ConnectionState::Reconnecting;
        self.status = Status::Reconnecting;
        vec![Command::Connect]
    }

    fn on_press_record(&mut self) -> Vec<Command> {
        if self.recording != RecordingState::Idle || self.capture_pending {
            debug!("record pressed while capture already active, ignoring");
            return Vec::new();
        }
        self.capture_pending = true;
        vec![Command::StartCapture]
    }

    fn on_capture_started(&mut self, sample_rate: u32, channels: u16) -> Vec<Command> {
        if !self.capture_pending {
            debug!("capture start confirmation without a pending request, ignoring");
            return Vec::new();
        }
        self.capture_pending = false;
        self.recording = RecordingState::Recording;
        self.capture_format = Some((sample_rate, channels));
        self.chunk_buffer.clear();
        self.status = Status::Recording;
        Vec::new()
    }

    fn on_capture_failed(&mut self, reason: String) -> Vec<Command> {
        warn!(reason = %reason, "capture device failed");
        self.capture_pending = false;
        self.recording = RecordingState::Idle;
        self.capture_format = None;
        self.chunk_buffer.clear();
        self.status = Status::CaptureError(reason);
        Vec::new()
    }

    fn on_capture_chunk(&mut self, samples: Vec<i16>) -> Vec<Command> {
        // Chunks may trail in between the stop gesture and the device's halt
        // confirmation; they still belong to the session being assembled.
        match self.recording {
            RecordingState::Recording | RecordingState::Processing => {
                self.chunk_buffer.extend_from_slice(&samples);
            }
            RecordingState::Idle => debug!("dropping capture chunk outside a recording session"),
        }
        Vec::new()
    }

    fn on_release_record(&mut self) -> Vec<Command> {
        if self.recording != RecordingState::Recording {
            debug!("record released while not recording, ignoring");
            return Vec::new();
        }
        self.recording = RecordingState::Processing;
        self.status = Status::Processing;
        vec![Command::StopCapture]
    }

    fn on_capture_stopped(&mut self) -> Vec<Command> {
        if self.recording != RecordingState::Processing {
            debug!("capture halt confirmation while not processing, ignoring");
            return Vec::new();
        }
        let samples = std::mem::take(&mut self.chunk_buffer);
        let format = self.capture_format.take();
        self.recording = RecordingState::Idle;
        self.status = self.connection_status();

        let Some((sample_rate, channels)) = format else {
            warn!("capture stopped without a negotiated format, discarding recording");
            return Vec::new();
        };
        let wav = match audio::encode_wav(&samples, sample_rate, channels) {
            Ok(wav) => wav,
            Err(e) => {
                warn!(error = %e, "failed to assemble recording, discarding");
                return Vec::new();
            }
        };

        let id = self.issue_request_id();
        self.transcript.push(Sender::User, VOICE_PLACEHOLDER);
        vec![Command::Send(OutboundMessage::Audio {
            id,
            audio: audio::encode_base64(&wav),
        })]
    }

    fn on_submit_text(&mut self, value: String) -> Vec<Command> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        if self.connection != ConnectionState::Connected {
            debug!("text submitted while disconnected, ignoring");
            return Vec::new();
        }
        let id = self.issue_request_id();
        self.transcript.push(Sender::User, trimmed);
        vec![
            Command::Send(OutboundMessage::Text {
                id,
                text: trimmed.to_string(),
            }),
            Command::ClearInput,
        ]
    }

    fn on_frame(&mut self, msg: InboundMessage) -> Vec<Command> {
        self.correlate_reply(msg.id);

        if msg.is_error() {
            warn!(text = %msg.text, "relay reported an error");
            self.status = Status::RelayError(msg.text);
            return Vec::new();
        }

        self.transcript.push(Sender::Bot, msg.text);

        let mut commands = Vec::new();
        if let Some(payload) = &msg.audio {
            match audio::decode_base64(payload) {
                Ok(bytes) => commands.push(Command::Play(bytes)),
                Err(e) => warn!(error = %e, "dropping undecodable audio payload"),
            }
        }
        commands
    }

    /// Matches a reply to its request: an echoed id removes that entry from
    /// the pending queue; a frame without one is attributed to the oldest
    /// outstanding request.
    fn correlate_reply(&mut self, id: Option<u64>) {
        match id {
            Some(id) => {
                if let Some(pos) = self.pending_replies.iter().position(|&p| p == id) {
                    self.pending_replies.remove(pos);
                } else {
                    warn!(id, "reply references an unknown request id");
                }
            }
            None => {
                self.pending_replies.pop_front();
            }
        }
    }

    fn issue_request_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        self.pending_replies.push_back(id);
        id
    }

    fn connection_status(&self) -> Status {
        match self.connection {
            ConnectionState::Disconnected => Status::ConnectionLost { reason: None },
            ConnectionState::Connecting => Status::Connecting,
            ConnectionState::Connected => Status::Connected,
            ConnectionState::Reconnecting => Status::Reconnecting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::InboundKind;
    use std::io::Cursor;

    const DELAY: Duration = Duration::from_millis(3000);

    fn controller() -> SessionController {
        SessionController::new(DELAY)
    }

    fn connected_controller() -> SessionController {
        let mut c = controller();
        c.start();
        c.handle(ControllerEvent::Opened);
        c
    }

    fn frame(text: &str) -> InboundMessage {
        InboundMessage {
            id: None,
            kind: None,
            text: text.to_string(),
            audio: None,
        }
    }

    #[test]
    fn test_start_requests_connection() {
        let mut c = controller();
        assert_eq!(c.connection(), ConnectionState::Disconnected);
        assert_eq!(c.start(), vec![Command::Connect]);
        assert_eq!(c.connection(), ConnectionState::Connecting);
    }

    #[test]
    fn test_opened_transitions_to_connected() {
        let mut c = controller();
        c.start();
        assert!(c.handle(ControllerEvent::Opened).is_empty());
        assert_eq!(c.connection(), ConnectionState::Connected);
        assert_eq!(*c.status(), Status::Connected);
    }

    #[test]
    fn test_closed_schedules_reconnect() {
        let mut c = connected_controller();
        let commands = c.handle(ControllerEvent::Closed {
            reason: Some("io error".to_string()),
        });
        assert_eq!(commands, vec![Command::ScheduleReconnect(DELAY)]);
        assert_eq!(c.connection(), ConnectionState::Disconnected);
        assert_eq!(
            *c.status(),
            Status::ConnectionLost {
                reason: Some("io error".to_string())
            }
        );
    }

    #[test]
    fn test_reconnect_cycle_reaches_connected() {
        let mut c = connected_controller();
        c.handle(ControllerEvent::Closed { reason: None });

        let commands = c.handle(ControllerEvent::ReconnectDue);
        assert_eq!(commands, vec![Command::Connect]);
        assert_eq!(c.connection(), ConnectionState::Reconnecting);

        c.handle(ControllerEvent::Opened);
        assert_eq!(c.connection(), ConnectionState::Connected);
    }

    #[test]
    fn test_stale_reconnect_timer_is_ignored() {
        let mut c = connected_controller();
        assert!(c.handle(ControllerEvent::ReconnectDue).is_empty());
        assert_eq!(c.connection(), ConnectionState::Connected);
    }

    #[test]
    fn test_failed_attempt_schedules_another() {
        let mut c = controller();
        c.start();
        let commands = c.handle(ControllerEvent::Closed {
            reason: Some("connection refused".to_string()),
        });
        assert_eq!(commands, vec![Command::ScheduleReconnect(DELAY)]);
        assert_eq!(c.handle(ControllerEvent::ReconnectDue), vec![Command::Connect]);
    }

    #[test]
    fn test_submit_text_sends_and_clears() {
        let mut c = connected_controller();
        let commands = c.handle(ControllerEvent::SubmitText("Hello".to_string()));
        assert_eq!(
            commands,
            vec![
                Command::Send(OutboundMessage::Text {
                    id: 1,
                    text: "Hello".to_string()
                }),
                Command::ClearInput,
            ]
        );
        let entries = c.transcript().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sender, Sender::User);
        assert_eq!(entries[0].text, "Hello");
    }

    #[test]
    fn test_submit_text_trims_whitespace() {
        let mut c = connected_controller();
        let commands = c.handle(ControllerEvent::SubmitText("  Hello \n".to_string()));
        assert_eq!(
            commands[0],
            Command::Send(OutboundMessage::Text {
                id: 1,
                text: "Hello".to_string()
            })
        );
        assert_eq!(c.transcript().entries()[0].text, "Hello");
    }

    #[test]
    fn test_blank_text_is_a_noop() {
        let mut c = connected_controller();
        assert!(c.handle(ControllerEvent::SubmitText("   \t\n".to_string())).is_empty());
        assert!(c.handle(ControllerEvent::SubmitText(String::new())).is_empty());
        assert!(c.transcript().is_empty());
        assert_eq!(c.pending_replies(), 0);
    }

    #[test]
    fn test_text_while_disconnected_is_a_noop() {
        let mut c = controller();
        c.start();
        assert!(c.handle(ControllerEvent::SubmitText("Hello".to_string())).is_empty());
        assert!(c.transcript().is_empty());
    }

    #[test]
    fn test_press_record_acquires_device_once() {
        let mut c = connected_controller();
        assert_eq!(c.handle(ControllerEvent::PressRecord), vec![Command::StartCapture]);

        // A second press before the device confirms must not acquire again.
        assert!(c.handle(ControllerEvent::PressRecord).is_empty());

        c.handle(ControllerEvent::CaptureStarted {
            sample_rate: 16_000,
            channels: 1,
        });
        assert_eq!(c.recording(), RecordingState::Recording);

        // Nor may a press while already recording.
        assert!(c.handle(ControllerEvent::PressRecord).is_empty());
    }

    #[test]
    fn test_capture_denied_stays_idle_without_retry() {
        let mut c = connected_controller();
        c.handle(ControllerEvent::PressRecord);
        let commands = c.handle(ControllerEvent::CaptureFailed("permission denied".to_string()));
        assert!(commands.is_empty());
        assert_eq!(c.recording(), RecordingState::Idle);
        assert_eq!(
            *c.status(),
            Status::CaptureError("permission denied".to_string())
        );

        // The user may press again; only then is the device requested anew.
        assert_eq!(c.handle(ControllerEvent::PressRecord), vec![Command::StartCapture]);
    }

    #[test]
    fn test_release_while_idle_is_a_noop() {
        let mut c = connected_controller();
        assert!(c.handle(ControllerEvent::ReleaseRecord).is_empty());
        assert_eq!(c.recording(), RecordingState::Idle);
    }

    #[test]
    fn test_voice_cycle_sends_one_audio_message() {
        let mut c = connected_controller();
        c.handle(ControllerEvent::PressRecord);
        c.handle(ControllerEvent::CaptureStarted {
            sample_rate: 16_000,
            channels: 1,
        });
        c.handle(ControllerEvent::CaptureChunk(vec![1, 2]));
        c.handle(ControllerEvent::CaptureChunk(vec![3, 4, 5]));

        assert_eq!(c.handle(ControllerEvent::ReleaseRecord), vec![Command::StopCapture]);
        assert_eq!(c.recording(), RecordingState::Processing);

        let commands = c.handle(ControllerEvent::CaptureStopped);
        assert_eq!(commands.len(), 1);
        let Command::Send(OutboundMessage::Audio { id, audio }) = &commands[0] else {
            panic!("expected an audio send, got {:?}", commands[0]);
        };
        assert_eq!(*id, 1);

        // The payload is the WAV assembly of every buffered chunk, in order.
        let wav = crate::audio::decode_base64(audio).unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, 16_000);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![1, 2, 3, 4, 5]);

        assert_eq!(c.recording(), RecordingState::Idle);
        let entries = c.transcript().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sender, Sender::User);
        assert_eq!(entries[0].text, VOICE_PLACEHOLDER);
    }

    #[test]
    fn test_trailing_chunks_join_the_session() {
        let mut c = connected_controller();
        c.handle(ControllerEvent::PressRecord);
        c.handle(ControllerEvent::CaptureStarted {
            sample_rate: 8_000,
            channels: 1,
        });
        c.handle(ControllerEvent::CaptureChunk(vec![10]));
        c.handle(ControllerEvent::ReleaseRecord);
        // Delivered after the stop gesture but before the halt confirmation.
        c.handle(ControllerEvent::CaptureChunk(vec![20]));

        let commands = c.handle(ControllerEvent::CaptureStopped);
        let Command::Send(OutboundMessage::Audio { audio, .. }) = &commands[0] else {
            panic!("expected an audio send");
        };
        let wav = crate::audio::decode_base64(audio).unwrap();
        let samples: Vec<i16> = hound::WavReader::new(Cursor::new(wav))
            .unwrap()
            .samples::<i16>()
            .map(|s| s.unwrap())
            .collect();
        assert_eq!(samples, vec![10, 20]);
    }

    #[test]
    fn test_chunks_outside_a_session_are_dropped() {
        let mut c = connected_controller();
        c.handle(ControllerEvent::CaptureChunk(vec![1, 2, 3]));
        c.handle(ControllerEvent::PressRecord);
        c.handle(ControllerEvent::CaptureStarted {
            sample_rate: 16_000,
            channels: 1,
        });
        c.handle(ControllerEvent::ReleaseRecord);
        let commands = c.handle(ControllerEvent::CaptureStopped);
        let Command::Send(OutboundMessage::Audio { audio, .. }) = &commands[0] else {
            panic!("expected an audio send");
        };
        let wav = crate::audio::decode_base64(audio).unwrap();
        assert_eq!(hound::WavReader::new(Cursor::new(wav)).unwrap().len(), 0);
    }

    #[test]
    fn test_text_reply_appends_bot_entry_without_playback() {
        let mut c = connected_controller();
        let commands = c.handle(ControllerEvent::Frame(frame("Hi there")));
        assert!(commands.is_empty());
        let entries = c.transcript().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sender, Sender::Bot);
        assert_eq!(entries[0].text, "Hi there");
    }

    #[test]
    fn test_audio_reply_triggers_exactly_one_playback() {
        let mut c = connected_controller();
        let msg = InboundMessage {
            id: None,
            kind: Some(InboundKind::AudioResponse),
            text: "Hi".to_string(),
            audio: Some(crate::audio::encode_base64(b"mp3 bytes")),
        };
        let commands = c.handle(ControllerEvent::Frame(msg));
        assert_eq!(commands, vec![Command::Play(b"mp3 bytes".to_vec())]);
    }

    #[test]
    fn test_back_to_back_audio_replies_keep_both_transcript_entries() {
        let mut c = connected_controller();
        for text in ["first", "second"] {
            let msg = InboundMessage {
                id: None,
                kind: None,
                text: text.to_string(),
                audio: Some(crate::audio::encode_base64(text.as_bytes())),
            };
            let commands = c.handle(ControllerEvent::Frame(msg));
            // One playback per inbound audio; the runtime interrupts the
            // previous one when it executes the next Play.
            assert_eq!(commands, vec![Command::Play(text.as_bytes().to_vec())]);
        }
        let entries = c.transcript().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "first");
        assert_eq!(entries[1].text, "second");
    }

    #[test]
    fn test_undecodable_audio_keeps_the_text() {
        let mut c = connected_controller();
        let msg = InboundMessage {
            id: None,
            kind: None,
            text: "Hi".to_string(),
            audio: Some("not base64!".to_string()),
        };
        assert!(c.handle(ControllerEvent::Frame(msg)).is_empty());
        assert_eq!(c.transcript().len(), 1);
    }

    #[test]
    fn test_error_frame_hits_status_not_transcript() {
        let mut c = connected_controller();
        let msg = InboundMessage {
            id: None,
            kind: Some(InboundKind::Error),
            text: "No audio data received".to_string(),
            audio: None,
        };
        assert!(c.handle(ControllerEvent::Frame(msg)).is_empty());
        assert!(c.transcript().is_empty());
        assert_eq!(
            *c.status(),
            Status::RelayError("No audio data received".to_string())
        );
    }

    #[test]
    fn test_reply_correlation_by_id_and_fifo_fallback() {
        let mut c = connected_controller();
        c.handle(ControllerEvent::SubmitText("one".to_string()));
        c.handle(ControllerEvent::SubmitText("two".to_string()));
        assert_eq!(c.pending_replies(), 2);

        // Out-of-order reply matched by its echoed id.
        let mut reply = frame("answer to two");
        reply.id = Some(2);
        c.handle(ControllerEvent::Frame(reply));
        assert_eq!(c.pending_replies(), 1);

        // A relay that echoes nothing falls back to oldest-outstanding.
        c.handle(ControllerEvent::Frame(frame("answer to one")));
        assert_eq!(c.pending_replies(), 0);

        // Unknown ids are logged and leave the queue alone.
        let mut stray = frame("stray");
        stray.id = Some(99);
        c.handle(ControllerEvent::Frame(stray));
        assert_eq!(c.pending_replies(), 0);
        assert_eq!(c.transcript().len(), 5);
    }

    #[test]
    fn test_connection_loss_does_not_disturb_recording() {
        let mut c = connected_controller();
        c.handle(ControllerEvent::PressRecord);
        c.handle(ControllerEvent::CaptureStarted {
            sample_rate: 16_000,
            channels: 1,
        });
        c.handle(ControllerEvent::Closed { reason: None });
        assert_eq!(c.recording(), RecordingState::Recording);

        // The recording still completes; the transport layer is responsible
        // for dropping the send if the socket is still down.
        c.handle(ControllerEvent::CaptureChunk(vec![7]));
        c.handle(ControllerEvent::ReleaseRecord);
        let commands = c.handle(ControllerEvent::CaptureStopped);
        assert!(matches!(
            commands[0],
            Command::Send(OutboundMessage::Audio { .. })
        ));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(format!("{}", Status::Connected), "connected");
        assert_eq!(
            format!(
                "{}",
                Status::ConnectionLost {
                    reason: Some("io error".to_string())
                }
            ),
            "connection error: io error (retrying)"
        );
        assert_eq!(
            format!("{}", Status::CaptureError("denied".to_string())),
            "microphone unavailable: denied"
        );
    }
}
