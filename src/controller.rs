//! # Session Controller
//!
//! Wires the pipeline together and owns the top-level lifecycle: capture is
//! scope-acquired, the aggregator feeds the streaming session, and the
//! renderer drives the inbound event loop until a termination keyword, a
//! clean backend close, an interrupt, or an unrecoverable error.
//!
//! ## Shutdown Order:
//! 1. Stop feeding new audio (close capture → sentinel on the channel)
//! 2. Wait (bounded) for the outbound leg to drain the remaining batches
//!    and half-close
//! 3. Stop consuming inbound events
//! 4. The capture device is released by the source guard
//!
//! Every step is idempotent; the source guard also closes on drop, so the
//! device is released on the error paths too.

use crate::audio::{AudioSource, ChunkAggregator};
use crate::config::AppConfig;
use crate::error::AppResult;
use crate::render::{
    CsvSink, KeywordMatcher, NoopSink, RenderOutcome, ResultRenderer, TranscriptSink,
};
use crate::transcription::StreamingSession;
use futures_util::StreamExt;
use std::io;
use std::time::Duration;
use tracing::{info, warn};

/// How long to wait for the outbound leg to drain and half-close after
/// capture ends before giving up on the graceful goodbye.
const HALF_CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Why the event loop stopped.
enum Shutdown {
    /// A termination keyword was spoken ("Exiting.." already rendered)
    Keyword,
    /// The backend ended the inbound sequence
    BackendClosed,
    /// Ctrl-C
    Interrupt,
}

/// Top-level pipeline owner.
pub struct SessionController {
    config: AppConfig,
}

impl SessionController {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Run one capture-and-transcribe session to completion.
    ///
    /// Returns `Ok(())` on clean termination (keyword, backend close, or
    /// interrupt); device and stream failures propagate after the capture
    /// device has been released.
    pub async fn run(&self) -> AppResult<()> {
        let keywords = KeywordMatcher::new(&self.config.termination.keywords)?;

        let sink: Box<dyn TranscriptSink + Send> = if self.config.persistence.enabled {
            info!(
                "Persisting finalized utterances to {}",
                self.config.persistence.path
            );
            Box::new(CsvSink::new(&self.config.persistence.path))
        } else {
            Box::new(NoopSink)
        };

        let (mut source, frames) = AudioSource::open(&self.config.audio)?;
        let aggregator = ChunkAggregator::new(frames);

        // If the handshake fails the source guard still releases the device
        let session =
            StreamingSession::open(&self.config.backend, &self.config.audio, aggregator).await?;

        let (mut events, outbound_done) = session.into_parts();
        let mut renderer = ResultRenderer::new(io::stdout(), sink, keywords);

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let shutdown = loop {
            tokio::select! {
                maybe_event = events.next() => {
                    match maybe_event {
                        Some(Ok(event)) => {
                            match renderer.handle_event(&event)? {
                                RenderOutcome::Continue => {}
                                RenderOutcome::Terminate => break Shutdown::Keyword,
                            }
                        }
                        Some(Err(e)) => {
                            source.close();
                            return Err(e);
                        }
                        None => break Shutdown::BackendClosed,
                    }
                }
                _ = &mut ctrl_c => {
                    info!("Interrupt received, shutting down");
                    break Shutdown::Interrupt;
                }
            }
        };

        // Sentinel flows to the aggregator; the outbound leg drains the
        // remaining batches and half-closes. Awaiting the handle keeps the
        // runtime alive until the end_stream envelope and close frame have
        // actually gone out; returning earlier would cancel the task
        // mid-drain.
        source.close();
        if tokio::time::timeout(HALF_CLOSE_TIMEOUT, outbound_done)
            .await
            .is_err()
        {
            warn!("Outbound half-close did not complete in time");
        }

        // A mid-stream device failure ends the pipeline through the sentinel
        // path; surface it now that the device is released
        if let Some(device_error) = source.take_error() {
            return Err(device_error);
        }

        match shutdown {
            Shutdown::Keyword => info!("Session ended by termination keyword"),
            Shutdown::BackendClosed => {
                info!("Backend ended the stream");
                println!("Exiting..");
            }
            Shutdown::Interrupt => {
                println!("Exiting..");
            }
        }

        Ok(())
    }
}
