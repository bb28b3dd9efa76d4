//! Reply audio playback on a dedicated thread.
//!
//! The rodio output stream is not `Send`, so one thread owns it for the
//! lifetime of the session. There is no queue: each new reply stops whatever
//! is still playing and starts decoding immediately.

use crossbeam_channel::{Receiver, Sender, unbounded};
use std::io::Cursor;
use std::thread::JoinHandle;
use tracing::{info, warn};

/// Handle to the playback thread. Dropping it ends the thread.
pub struct Player {
    commands: Option<Sender<Vec<u8>>>,
    worker: Option<JoinHandle<()>>,
}

impl Player {
    pub fn spawn() -> Self {
        let (tx, rx) = unbounded::<Vec<u8>>();
        let worker = std::thread::spawn(move || playback_thread(rx));
        Self {
            commands: Some(tx),
            worker: Some(worker),
        }
    }

    /// Starts playing the given encoded audio, interrupting any previous
    /// playback.
    pub fn play(&self, bytes: Vec<u8>) {
        if let Some(commands) = &self.commands {
            if commands.send(bytes).is_err() {
                warn!("playback thread is gone, dropping reply audio");
            }
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.commands.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn playback_thread(rx: Receiver<Vec<u8>>) {
    let (_stream, handle) = match rodio::OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            warn!(error = %e, "audio output unavailable, replies will be text only");
            // Keep draining so the session is unaffected.
            while rx.recv().is_ok() {}
            return;
        }
    };
    info!("audio output ready");

    let mut current: Option<rodio::Sink> = None;
    while let Ok(bytes) = rx.recv() {
        if let Some(sink) = current.take() {
            sink.stop();
        }
        let sink = match rodio::Sink::try_new(&handle) {
            Ok(sink) => sink,
            Err(e) => {
                warn!(error = %e, "failed to open playback sink");
                continue;
            }
        };
        match rodio::Decoder::new(Cursor::new(bytes)) {
            Ok(source) => {
                sink.append(source);
                current = Some(sink);
            }
            Err(e) => warn!(error = %e, "failed to decode reply audio"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_survives_garbage_audio() {
        // Whether or not the machine has an output device, feeding bytes
        // that are not decodable audio must not kill the thread.
        let player = Player::spawn();
        player.play(vec![0, 1, 2, 3]);
        player.play(Vec::new());
        drop(player);
    }
}
