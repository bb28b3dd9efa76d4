//! The runtime event loop.
//!
//! Translates stdin gestures, transport events, capture events, and timers
//! into controller events, executes the commands the controller returns, and
//! renders the transcript and status line to the terminal.

use crate::capture::{CaptureDevice, CaptureEvent};
use crate::playback::Player;
use anyhow::Result;
use mindmate_core::controller::{Command, ControllerEvent, SessionController, Status};
use mindmate_relay::{RelayCommand, RelayEvent};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

/// What one line of terminal input means.
#[derive(Debug, Clone, PartialEq, Eq)]
enum UserAction {
    Text(String),
    PressRecord,
    ReleaseRecord,
    Quit,
}

/// Press/release record gestures map to slash commands in a line-based
/// terminal.
fn parse_line(line: &str) -> UserAction {
    match line.trim() {
        "/record" => UserAction::PressRecord,
        "/stop" => UserAction::ReleaseRecord,
        "/quit" | "/exit" => UserAction::Quit,
        _ => UserAction::Text(line.to_string()),
    }
}

/// Wires the session controller to the transport, the capture device, and
/// the terminal.
pub struct App {
    controller: SessionController,
    capture: Box<dyn CaptureDevice>,
    player: Player,
    relay_commands: mpsc::Sender<RelayCommand>,
    relay_events: mpsc::Receiver<RelayEvent>,
    capture_tx: mpsc::UnboundedSender<CaptureEvent>,
    capture_rx: mpsc::UnboundedReceiver<CaptureEvent>,
    timer_tx: mpsc::Sender<()>,
    timer_rx: mpsc::Receiver<()>,
    rendered: usize,
    last_status: Option<Status>,
}

impl App {
    pub fn new(
        reconnect_delay: Duration,
        capture: Box<dyn CaptureDevice>,
        player: Player,
        relay_commands: mpsc::Sender<RelayCommand>,
        relay_events: mpsc::Receiver<RelayEvent>,
    ) -> Self {
        let (capture_tx, capture_rx) = mpsc::unbounded_channel();
        let (timer_tx, timer_rx) = mpsc::channel(8);
        Self {
            controller: SessionController::new(reconnect_delay),
            capture,
            player,
            relay_commands,
            relay_events,
            capture_tx,
            capture_rx,
            timer_tx,
            timer_rx,
            rendered: 0,
            last_status: None,
        }
    }

    /// Runs the session until the user quits or stdin closes.
    pub async fn run(mut self) -> Result<()> {
        println!("MindMate — type a message, /record to speak, /stop to send, /quit to leave.");
        let startup = self.controller.start();
        self.execute(startup).await;
        self.render();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => match parse_line(&line) {
                        UserAction::Quit => break,
                        UserAction::PressRecord => self.dispatch(ControllerEvent::PressRecord).await,
                        UserAction::ReleaseRecord => self.dispatch(ControllerEvent::ReleaseRecord).await,
                        UserAction::Text(text) => self.dispatch(ControllerEvent::SubmitText(text)).await,
                    },
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "failed to read terminal input");
                        break;
                    }
                },
                _ = &mut ctrl_c => break,
                Some(event) = self.relay_events.recv() => {
                    let event = match event {
                        RelayEvent::Opened => ControllerEvent::Opened,
                        RelayEvent::Closed { reason } => ControllerEvent::Closed { reason },
                        RelayEvent::Frame(frame) => ControllerEvent::Frame(frame),
                    };
                    self.dispatch(event).await;
                },
                Some(event) = self.capture_rx.recv() => {
                    let event = match event {
                        CaptureEvent::Started { sample_rate, channels } => {
                            ControllerEvent::CaptureStarted { sample_rate, channels }
                        }
                        CaptureEvent::Chunk(samples) => ControllerEvent::CaptureChunk(samples),
                        CaptureEvent::Stopped => ControllerEvent::CaptureStopped,
                        CaptureEvent::Failed(reason) => {
                            // Reap a dead capture worker before the next press.
                            self.capture.stop();
                            ControllerEvent::CaptureFailed(reason)
                        }
                    };
                    self.dispatch(event).await;
                },
                Some(()) = self.timer_rx.recv() => self.dispatch(ControllerEvent::ReconnectDue).await,
            }
        }

        // Release the microphone and close the socket on the way out.
        self.capture.stop();
        let _ = self.relay_commands.send(RelayCommand::Shutdown).await;
        Ok(())
    }

    async fn dispatch(&mut self, event: ControllerEvent) {
        let commands = self.controller.handle(event);
        self.execute(commands).await;
        self.render();
    }

    async fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Connect => {
                    if self.relay_commands.send(RelayCommand::Connect).await.is_err() {
                        warn!("relay task is gone, cannot connect");
                    }
                }
                Command::ScheduleReconnect(delay) => {
                    let timer_tx = self.timer_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = timer_tx.send(()).await;
                    });
                }
                Command::StartCapture => {
                    if let Err(e) = self.capture.start(self.capture_tx.clone()) {
                        // Route the failure through the normal event path.
                        let _ = self.capture_tx.send(CaptureEvent::Failed(e.to_string()));
                    }
                }
                Command::StopCapture => self.capture.stop(),
                Command::Send(message) => {
                    if self
                        .relay_commands
                        .send(RelayCommand::Send(message))
                        .await
                        .is_err()
                    {
                        warn!("relay task is gone, dropping outbound message");
                    }
                }
                Command::Play(bytes) => self.player.play(bytes),
                // Line input clears itself on Enter; nothing to do.
                Command::ClearInput => {}
            }
        }
    }

    fn render(&mut self) {
        let entries = self.controller.transcript().entries();
        for entry in &entries[self.rendered..] {
            println!("{}> {}", entry.sender, entry.text);
        }
        self.rendered = entries.len();

        let status = self.controller.status();
        if self.last_status.as_ref() != Some(status) {
            println!("[{status}]");
            self.last_status = Some(status.clone());
        }
    }
}
