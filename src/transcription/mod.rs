//! # Transcription Module
//!
//! The streaming connection to the remote recognition backend. This module
//! does not interpret transcript content; it marshals the message envelopes
//! and keeps the outbound (audio) and inbound (events) directions running
//! concurrently.
//!
//! ## Key Components:
//! - **Protocol**: JSON envelopes for the configuration handshake, the
//!   outbound half-close, and inbound transcript events
//! - **Session**: Connection lifecycle plus the bridge/outbound/inbound
//!   task trio

pub mod protocol; // Wire envelopes and transcript event types
pub mod session;  // Bidirectional stream lifecycle

pub use protocol::{Alternative, ClientMessage, TranscriptEvent, TranscriptResult};
pub use session::StreamingSession;
