//! # Microphone Capture
//!
//! Owns the physical input device and feeds raw PCM frames into the pipeline
//! channel. The hardware callback runs on a thread owned by the audio
//! subsystem, so the only state it shares with the rest of the program is the
//! frame channel itself.
//!
//! ## Capture Contract:
//! - The data callback copies one frame of samples into a fresh byte buffer
//!   and pushes it; it never blocks and never touches the network
//! - Closing the source stops the device and pushes a [`FrameMessage::End`]
//!   sentinel so a consumer blocked on the channel wakes up and observes
//!   termination instead of hanging
//! - `close()` is idempotent and also runs on drop, so the device is
//!   released on every exit path
//!
//! ## Audio Format:
//! The device is opened mono at the configured sample rate with a fixed
//! frame size. Samples arrive as f32 and are converted to 16-bit
//! little-endian PCM, which is what goes over the wire unchanged.

use crate::config::AudioConfig;
use crate::error::{AppError, AppResult};
use byteorder::{LittleEndian, WriteBytesExt};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{error, info, warn};

/// One message on the capture channel.
///
/// The end-of-stream sentinel travels through the same channel as the data,
/// which avoids a race between a separate closed-flag check and the blocking
/// pop on the consumer side.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameMessage {
    /// One frame of 16-bit little-endian PCM bytes
    Frame(Vec<u8>),
    /// End of capture; no further frames will arrive
    End,
}

/// Handle to the running capture stream.
///
/// ## Lifecycle:
/// `open()` spawns a dedicated thread that owns the cpal stream (the stream
/// handle is not `Send`, so it must live where it was built). The thread
/// parks on a shutdown channel until `close()` is called or the handle is
/// dropped, then stops the device and pushes the sentinel.
pub struct AudioSource {
    shutdown_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
    last_error: Arc<Mutex<Option<String>>>,
    closed: bool,
}

impl AudioSource {
    /// Acquire the default input device and start capturing.
    ///
    /// ## Returns:
    /// The source handle plus the receiving end of the frame channel. The
    /// channel is unbounded: the hardware callback must never wait on a slow
    /// consumer.
    ///
    /// ## Failure:
    /// Device unavailable or stream build failure is reported here as
    /// [`AppError::Device`], before any frame is produced.
    pub fn open(config: &AudioConfig) -> AppResult<(Self, Receiver<FrameMessage>)> {
        let (frame_tx, frame_rx) = unbounded();
        let (ready_tx, ready_rx) = bounded::<Result<(), String>>(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let last_error = Arc::new(Mutex::new(None));

        let thread_error = last_error.clone();
        let config = config.clone();
        let handle = thread::Builder::new()
            .name("audio-capture".to_string())
            .spawn(move || {
                capture_thread(config, frame_tx, ready_tx, shutdown_rx, thread_error);
            })
            .map_err(|e| AppError::Device(format!("failed to spawn capture thread: {}", e)))?;

        // Wait for the device to actually open before declaring success
        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(msg)) => {
                let _ = handle.join();
                return Err(AppError::Device(msg));
            }
            Err(_) => {
                let _ = handle.join();
                return Err(AppError::Device("capture thread exited early".to_string()));
            }
        }

        Ok((
            Self {
                shutdown_tx,
                handle: Some(handle),
                last_error,
                closed: false,
            },
            frame_rx,
        ))
    }

    /// Stop the device, release it, and push the end sentinel.
    ///
    /// Safe to call more than once; only the first call does anything.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Capture thread panicked during shutdown");
            }
        }
    }

    /// Take the mid-stream device error, if the capture callback reported one.
    ///
    /// The error callback cannot unwind across the audio subsystem, so it
    /// records the failure here and pushes the sentinel; the controller
    /// checks this after the pipeline drains.
    pub fn take_error(&self) -> Option<AppError> {
        self.last_error
            .lock()
            .ok()
            .and_then(|mut guard| guard.take())
            .map(AppError::Device)
    }
}

impl Drop for AudioSource {
    fn drop(&mut self) {
        self.close();
    }
}

/// Body of the dedicated capture thread.
///
/// Builds the cpal input stream, reports the open result back through
/// `ready_tx`, then blocks until shutdown is requested. The stream is
/// dropped (stopping the hardware callback) before the sentinel is pushed,
/// so the sentinel is always the last message on the channel.
fn capture_thread(
    config: AudioConfig,
    frame_tx: Sender<FrameMessage>,
    ready_tx: Sender<Result<(), String>>,
    shutdown_rx: Receiver<()>,
    last_error: Arc<Mutex<Option<String>>>,
) {
    let host = cpal::default_host();
    let device = match host.default_input_device() {
        Some(device) => device,
        None => {
            let _ = ready_tx.send(Err("no default input device available".to_string()));
            return;
        }
    };

    let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

    let stream_config = cpal::StreamConfig {
        channels: config.channels as u16,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Fixed(config.frame_samples() as u32),
    };

    let data_tx = frame_tx.clone();
    let error_tx = frame_tx.clone();
    let error_slot = last_error;

    let stream = device.build_input_stream(
        &stream_config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            // One allocation per frame; conversion only, no waiting
            let mut bytes = Vec::with_capacity(data.len() * 2);
            for &sample in data {
                let clamped = (sample * i16::MAX as f32)
                    .clamp(i16::MIN as f32, i16::MAX as f32) as i16;
                // Writing into a Vec cannot fail
                let _ = bytes.write_i16::<LittleEndian>(clamped);
            }
            let _ = data_tx.send(FrameMessage::Frame(bytes));
        },
        move |err| {
            error!("Audio capture stream error: {}", err);
            if let Ok(mut slot) = error_slot.lock() {
                slot.get_or_insert_with(|| err.to_string());
            }
            // Wake the consumer so the session can unwind
            let _ = error_tx.send(FrameMessage::End);
        },
        None,
    );

    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(format!(
                "failed to open input stream on '{}': {}",
                device_name, e
            )));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(format!("failed to start capture: {}", e)));
        return;
    }

    info!(
        "Capturing from '{}' at {} Hz, {} ms frames",
        device_name, config.sample_rate, config.frame_duration_ms
    );
    let _ = ready_tx.send(Ok(()));

    // Park until close() signals or the handle is dropped
    let _ = shutdown_rx.recv();

    drop(stream);
    let _ = frame_tx.send(FrameMessage::End);
    info!("Capture stream stopped");
}
