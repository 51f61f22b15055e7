//! # Streaming Session
//!
//! Owns the long-lived bidirectional connection to the recognition backend
//! and keeps its two directions progressing independently: a stalled send
//! never blocks inbound consumption and a stalled backend read never blocks
//! audio drainage.
//!
//! ## Task Layout:
//! - **bridge** (blocking thread): pulls batches off the [`ChunkAggregator`]
//!   and pushes them into a bounded async channel; this is the only place
//!   the blocking capture side meets the async runtime
//! - **outbound** (async task): config envelope first, then one binary
//!   message per batch, in order; when the batch sequence ends it sends the
//!   `end_stream` envelope and a close frame (graceful half-close)
//! - **inbound** (async task): decodes transcript events and forwards them
//!   to the renderer; undecodable frames are skipped, transport errors
//!   terminate the event sequence with a terminal error
//!
//! Ping/pong bookkeeping is handled inside tungstenite; both tasks ignore
//! control frames.

use crate::audio::ChunkAggregator;
use crate::config::{AudioConfig, BackendConfig};
use crate::error::{AppError, AppResult};
use crate::transcription::protocol::{ClientMessage, TranscriptEvent};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// How many un-sent batches may queue between the bridge and the socket
/// before the bridge thread waits. Capture itself is never throttled; the
/// unbounded frame channel absorbs the burst and the next batch simply
/// coalesces more frames.
const OUTBOUND_QUEUE_BATCHES: usize = 32;

/// How many decoded events may queue ahead of the renderer.
const INBOUND_QUEUE_EVENTS: usize = 64;

/// An open bidirectional stream to the recognition backend.
pub struct StreamingSession {
    events_rx: mpsc::Receiver<AppResult<TranscriptEvent>>,
    outbound: JoinHandle<()>,
}

impl StreamingSession {
    /// Connect to the backend, send the session configuration, and start
    /// feeding it the batch sequence.
    ///
    /// ## Failure:
    /// Handshake or auth failures surface here as [`AppError::Stream`];
    /// nothing has been captured-and-lost at that point because the batch
    /// sequence is lazy.
    pub async fn open(
        backend: &BackendConfig,
        audio: &AudioConfig,
        batches: ChunkAggregator,
    ) -> AppResult<Self> {
        let mut request = backend.url.as_str().into_client_request()?;
        if let Some(key) = &backend.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| AppError::Stream(format!("invalid API key: {}", e)))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (ws, _response) = connect_async(request).await?;
        info!("Connected to recognition backend at {}", backend.url);

        let (mut sink, mut inbound) = ws.split();

        // The configuration envelope precedes all audio
        let config_msg = ClientMessage::Config {
            encoding: "LINEAR16".to_string(),
            sample_rate_hertz: audio.sample_rate,
            language_code: backend.language_code.clone(),
            interim_results: backend.interim_results,
        };
        let config_json = serde_json::to_string(&config_msg)
            .map_err(|e| AppError::Stream(format!("failed to encode config: {}", e)))?;
        sink.send(Message::Text(config_json)).await?;

        // Bridge: blocking aggregator iteration stays off the async runtime.
        // Dropping batch_tx when the sequence ends is the outbound task's
        // end-of-audio signal.
        let (batch_tx, mut batch_rx) = mpsc::channel::<Vec<u8>>(OUTBOUND_QUEUE_BATCHES);
        tokio::task::spawn_blocking(move || {
            for batch in batches {
                if batch_tx.blocking_send(batch).is_err() {
                    // Socket side is gone; stop draining
                    break;
                }
            }
        });

        // Outbound: batches in capture order, then graceful half-close. The
        // handle resolves once the half-close has gone out (or the socket
        // died); the controller awaits it before tearing the runtime down.
        let outbound = tokio::spawn(async move {
            while let Some(batch) = batch_rx.recv().await {
                debug!("Sending {} byte audio batch", batch.len());
                if let Err(e) = sink.send(Message::Binary(batch)).await {
                    warn!("Outbound send failed, stopping audio feed: {}", e);
                    return;
                }
            }

            // Audio is done; let the backend flush pending finals
            if let Ok(end_json) = serde_json::to_string(&ClientMessage::EndStream {}) {
                let _ = sink.send(Message::Text(end_json)).await;
            }
            let _ = sink.send(Message::Close(None)).await;
            info!("Outbound audio stream half-closed");
        });

        // Inbound: events in arrival order until close or transport error
        let (events_tx, events_rx) = mpsc::channel(INBOUND_QUEUE_EVENTS);
        tokio::spawn(async move {
            while let Some(message) = inbound.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<TranscriptEvent>(&text) {
                            Ok(event) => {
                                if events_tx.send(Ok(event)).await.is_err() {
                                    // Renderer stopped listening
                                    return;
                                }
                            }
                            Err(e) => {
                                // Recovered locally; never fatal
                                warn!("Skipping undecodable transcript event: {}", e);
                            }
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        info!("Backend closed the stream: {:?}", frame);
                        return;
                    }
                    Ok(_) => {
                        // Binary and control frames are not part of the
                        // inbound protocol
                    }
                    Err(e) => {
                        let _ = events_tx.send(Err(e.into())).await;
                        return;
                    }
                }
            }
        });

        Ok(Self {
            events_rx,
            outbound,
        })
    }

    /// Split the session into the backend's inbound event sequence and the
    /// outbound completion handle.
    ///
    /// The event sequence ends when the backend closes the stream; a
    /// transport failure is delivered as a final `Err` item. The handle
    /// resolves once the outbound leg has drained every batch and sent its
    /// half-close, so awaiting it guarantees the `end_stream` envelope and
    /// close frame were not lost to shutdown.
    pub fn into_parts(
        self,
    ) -> (ReceiverStream<AppResult<TranscriptEvent>>, JoinHandle<()>) {
        (ReceiverStream::new(self.events_rx), self.outbound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::source::FrameMessage;
    use crossbeam_channel::unbounded;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    fn test_audio() -> AudioConfig {
        AudioConfig {
            sample_rate: 16000,
            frame_duration_ms: 100,
            channels: 1,
            bit_depth: 16,
        }
    }

    /// Ending capture must drain every queued batch and half-close the
    /// outbound leg (the `end_stream` envelope, then a close frame) before
    /// the completion handle resolves. The backend sees the configuration
    /// envelope first, the audio bytes in capture order, and the half-close
    /// last.
    #[tokio::test]
    async fn test_outbound_drains_and_half_closes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();

            let mut texts = Vec::new();
            let mut audio_bytes = Vec::new();
            while let Some(message) = ws.next().await {
                match message.unwrap() {
                    Message::Text(text) => texts.push(text),
                    Message::Binary(bytes) => audio_bytes.extend_from_slice(&bytes),
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            (texts, audio_bytes)
        });

        let (tx, rx) = unbounded();
        tx.send(FrameMessage::Frame(b"aaaa".to_vec())).unwrap();
        tx.send(FrameMessage::Frame(b"bbbb".to_vec())).unwrap();
        tx.send(FrameMessage::End).unwrap();

        let backend = BackendConfig {
            url: format!("ws://{}", addr),
            api_key: None,
            language_code: "ko-KR".to_string(),
            interim_results: true,
        };

        let session = StreamingSession::open(&backend, &test_audio(), ChunkAggregator::new(rx))
            .await
            .unwrap();
        let (_events, outbound_done) = session.into_parts();

        // Resolves only after the half-close went out
        outbound_done.await.unwrap();

        let (texts, audio_bytes) = server.await.unwrap();
        assert!(texts.first().unwrap().contains(r#""type":"config""#));
        assert_eq!(texts.last().unwrap().as_str(), r#"{"type":"end_stream"}"#);
        assert_eq!(audio_bytes, b"aaaabbbb");
    }
}
