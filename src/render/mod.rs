//! # Rendering Module
//!
//! Turns the inbound transcript event sequence into user-visible output.
//!
//! ## Key Components:
//! - **Renderer**: The interim-overwrite / final-commit state machine
//! - **Keyword Matcher**: Whole-word, case-insensitive termination check
//! - **Transcript Sinks**: Injectable persistence strategy for finalized
//!   utterances (no-op by default, CSV when configured)

pub mod keyword;  // Termination keyword matching
pub mod renderer; // Interim/final terminal rendering
pub mod sink;     // Finalized-utterance persistence strategies

pub use keyword::KeywordMatcher;
pub use renderer::{RenderOutcome, ResultRenderer};
pub use sink::{CsvSink, NoopSink, TranscriptSink};
