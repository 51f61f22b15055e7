//! # Error Handling
//!
//! This module defines the error types used across the transcription pipeline
//! and how failures propagate to the process boundary.
//!
//! ## Error Categories:
//! - **Device**: Microphone open/capture failures. Fatal, never retried; the
//!   capture device has no safe reconnect semantic here.
//! - **Stream**: Backend connection, auth, or transport failures. Fatal for
//!   the current session, no automatic reconnect.
//! - **Render**: Terminal write failures. The terminal is the whole point of
//!   the program; if stdout is gone the session cannot usefully continue.
//! - **Persistence**: Transcript log append failures. Reported but never
//!   aborts the live session — losing a historical record is lower severity
//!   than losing the live stream.
//! - **Config**: Configuration file or environment variable problems,
//!   surfaced before the pipeline starts.
//!
//! Malformed inbound events (missing results or alternatives) are not an
//! error variant at all: the renderer skips them locally.
//!
//! ## Propagation policy:
//! Device, stream, and render errors always unwind to the controller, which releases
//! the capture device before re-raising. `main` converts the final error to
//! a non-zero exit status with the diagnostic on stderr.

use std::fmt;

/// Custom error type for the transcription pipeline.
#[derive(Debug)]
pub enum AppError {
    /// Microphone device open or capture failure
    Device(String),

    /// Backend stream connection or transport failure
    Stream(String),

    /// Terminal write failure
    Render(String),

    /// Transcript log append failure
    Persistence(String),

    /// Configuration loading or validation failure
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Device(msg) => write!(f, "Device error: {}", msg),
            AppError::Stream(msg) => write!(f, "Stream error: {}", msg),
            AppError::Render(msg) => write!(f, "Render error: {}", msg),
            AppError::Persistence(msg) => write!(f, "Persistence error: {}", msg),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Conversion from configuration errors.
///
/// ## When this happens:
/// - config.toml has invalid syntax
/// - Environment overrides fail to deserialize
/// - Configuration values fail validation
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Conversion from WebSocket transport errors.
///
/// Any tungstenite-level failure (handshake, protocol, broken pipe) is a
/// terminal stream error for the session.
impl From<tokio_tungstenite::tungstenite::Error> for AppError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        AppError::Stream(err.to_string())
    }
}

/// Conversion from CSV writer errors.
impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Persistence(err.to_string())
    }
}

/// Conversion from I/O errors.
///
/// The only I/O the pipeline performs outside the CSV sink is writing
/// rendered text to the terminal, so a raw `io::Error` is always a render
/// failure.
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Render(err.to_string())
    }
}

/// Type alias for Results that use the pipeline error type.
pub type AppResult<T> = Result<T, AppError>;
