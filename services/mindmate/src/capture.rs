//! Microphone capture behind a dependency-injection seam.
//!
//! The cpal stream lives on its own thread because it is not `Send`; the
//! runtime talks to it only through [`CaptureEvent`]s, mirroring how socket
//! traffic reaches the session controller.

use anyhow::{Result, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender, bounded};
use mindmate_core::audio::convert_f32_to_i16;
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// One event from the capture pipeline.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// The device granted access and started streaming at the given format.
    Started { sample_rate: u32, channels: u16 },
    /// A chunk of mono PCM16 samples.
    Chunk(Vec<i16>),
    /// The device halted and the hardware track was released.
    Stopped,
    /// The device could not be acquired, or failed while streaming.
    Failed(String),
}

/// The capture device seam. Production wraps cpal; tests substitute a mock.
#[cfg_attr(test, mockall::automock)]
pub trait CaptureDevice: Send {
    /// Begins capturing. Events flow to `events` until [`stop`] is called;
    /// acquisition failures are reported as [`CaptureEvent::Failed`].
    ///
    /// [`stop`]: CaptureDevice::stop
    fn start(&mut self, events: mpsc::UnboundedSender<CaptureEvent>) -> Result<()>;

    /// Halts capture and releases the hardware track. Idempotent.
    fn stop(&mut self);
}

/// Captures mono PCM16 from the default (or named) cpal input device.
pub struct CpalCapture {
    preferred_device: Option<String>,
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl CpalCapture {
    pub fn new(preferred_device: Option<String>) -> Self {
        Self {
            preferred_device,
            stop_tx: None,
            worker: None,
        }
    }
}

impl CaptureDevice for CpalCapture {
    fn start(&mut self, events: mpsc::UnboundedSender<CaptureEvent>) -> Result<()> {
        if self.stop_tx.is_some() {
            return Err(anyhow!("capture already active"));
        }
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let device_name = self.preferred_device.clone();
        let worker = std::thread::spawn(move || capture_thread(device_name, events, stop_rx));
        self.stop_tx = Some(stop_tx);
        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Owns the cpal stream for the duration of one recording session.
fn capture_thread(
    device_name: Option<String>,
    events: mpsc::UnboundedSender<CaptureEvent>,
    stop_rx: Receiver<()>,
) {
    let (stream, sample_rate) = match build_stream(device_name, events.clone()) {
        Ok(built) => built,
        Err(e) => {
            let _ = events.send(CaptureEvent::Failed(e.to_string()));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = events.send(CaptureEvent::Failed(e.to_string()));
        return;
    }
    let _ = events.send(CaptureEvent::Started {
        sample_rate,
        channels: 1,
    });

    // Block until the stop gesture (or runtime teardown) releases us.
    let _ = stop_rx.recv();
    drop(stream);
    let _ = events.send(CaptureEvent::Stopped);
}

fn build_stream(
    device_name: Option<String>,
    events: mpsc::UnboundedSender<CaptureEvent>,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = match &device_name {
        Some(name) => host
            .input_devices()?
            .find(|d| d.name().map(|n| &n == name).unwrap_or(false))
            .ok_or_else(|| anyhow!("input device '{}' not found", name))?,
        None => host
            .default_input_device()
            .ok_or_else(|| anyhow!("no input device available"))?,
    };
    info!(
        device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
        "acquiring input device"
    );

    let supported = device.default_input_config()?;
    let sample_rate = supported.sample_rate().0;
    let channels = supported.channels() as usize;
    let config: cpal::StreamConfig = supported.config();

    let err_events = events.clone();
    let err_fn = move |err: cpal::StreamError| {
        warn!(error = %err, "input stream error");
        let _ = err_events.send(CaptureEvent::Failed(err.to_string()));
    };

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mono = downmix_f32(data, channels);
                let _ = events.send(CaptureEvent::Chunk(convert_f32_to_i16(&mono)));
            },
            err_fn,
            None,
        )?,
        cpal::SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let _ = events.send(CaptureEvent::Chunk(downmix_i16(data, channels)));
            },
            err_fn,
            None,
        )?,
        cpal::SampleFormat::U16 => device.build_input_stream(
            &config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| {
                let signed: Vec<i16> = data.iter().map(|&s| (s as i32 - 32_768) as i16).collect();
                let _ = events.send(CaptureEvent::Chunk(downmix_i16(&signed, channels)));
            },
            err_fn,
            None,
        )?,
        other => return Err(anyhow!("unsupported input sample format: {other:?}")),
    };

    Ok((stream, sample_rate))
}

fn downmix_f32(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn downmix_i16(data: &[i16], channels: usize) -> Vec<i16> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|frame| (frame.iter().map(|&s| s as i32).sum::<i32>() / channels as i32) as i16)
        .collect()
}
