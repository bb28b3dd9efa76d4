//! The append-only conversation transcript.

use std::fmt;

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "you"),
            Sender::Bot => write!(f, "bot"),
        }
    }
}

/// One rendered line of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub sender: Sender,
    pub text: String,
}

/// An ordered record of the conversation. Entries are appended as they are
/// produced and are never mutated or removed.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sender: Sender, text: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            sender,
            text: text.into(),
        });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_display() {
        assert_eq!(format!("{}", Sender::User), "you");
        assert_eq!(format!("{}", Sender::Bot), "bot");
    }

    #[test]
    fn test_push_preserves_order() {
        let mut transcript = Transcript::new();
        assert!(transcript.is_empty());

        transcript.push(Sender::User, "Hello");
        transcript.push(Sender::Bot, "Hi there");
        transcript.push(Sender::User, "How are you?");

        assert_eq!(transcript.len(), 3);
        let entries = transcript.entries();
        assert_eq!(entries[0].sender, Sender::User);
        assert_eq!(entries[0].text, "Hello");
        assert_eq!(entries[1].sender, Sender::Bot);
        assert_eq!(entries[1].text, "Hi there");
        assert_eq!(entries[2].sender, Sender::User);
        assert_eq!(entries[2].text, "How are you?");
    }
}
