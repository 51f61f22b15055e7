//! # Result Rendering
//!
//! Consumes the inbound transcript event sequence and renders it
//! incrementally: interim hypotheses overwrite each other in place on one
//! terminal line, final results commit that line permanently.
//!
//! ## Per-Event State Machine:
//! - No results, or no alternatives → skip, no state change
//! - Interim: print the transcript, pad with spaces to erase leftover
//!   characters from a longer previous guess, end with a carriage return
//!   (no newline), remember the printed length
//! - Final: print the transcript with the same padding but a newline, reset
//!   the length counter, persist the utterance, then check the termination
//!   keywords
//!
//! The padding is computed from the length delta in characters, not bytes —
//! a Korean transcript is mostly multi-byte — and only trailing characters
//! are erased, never the whole line.
//!
//! Persistence and the keyword check happen only on final commits, never on
//! interim text. A persistence failure is reported and the session
//! continues.

use crate::error::AppResult;
use crate::render::keyword::KeywordMatcher;
use crate::render::sink::TranscriptSink;
use crate::transcription::protocol::TranscriptEvent;
use std::io::Write;
use tracing::warn;

/// What the controller should do after an event was handled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderOutcome {
    /// Keep consuming events
    Continue,
    /// A termination keyword was spoken; shut the session down
    Terminate,
}

/// Incremental renderer over an output writer and a persistence sink.
///
/// The writer is generic so tests render into a byte buffer; in production
/// it is stdout. All state — the character counter — lives on the consuming
/// thread; nothing here is shared.
pub struct ResultRenderer<W: Write, S: TranscriptSink> {
    out: W,
    sink: S,
    keywords: KeywordMatcher,

    /// Characters printed for the current in-progress utterance. Reset to
    /// zero after every final commit.
    last_printed_len: usize,
}

impl<W: Write, S: TranscriptSink> ResultRenderer<W, S> {
    pub fn new(out: W, sink: S, keywords: KeywordMatcher) -> Self {
        Self {
            out,
            sink,
            keywords,
            last_printed_len: 0,
        }
    }

    /// Render one inbound event.
    pub fn handle_event(&mut self, event: &TranscriptEvent) -> AppResult<RenderOutcome> {
        let Some((transcript, is_final)) = event.best_transcript() else {
            return Ok(RenderOutcome::Continue);
        };

        let printed_chars = transcript.chars().count();
        let padding = " ".repeat(self.last_printed_len.saturating_sub(printed_chars));

        if !is_final {
            write!(self.out, "{}{}\r", transcript, padding)?;
            self.out.flush()?;
            self.last_printed_len = printed_chars;
            return Ok(RenderOutcome::Continue);
        }

        writeln!(self.out, "{}{}", transcript, padding)?;
        self.out.flush()?;
        self.last_printed_len = 0;

        // Losing a log record must not kill the live session
        if let Err(e) = self.sink.persist(transcript) {
            warn!("Failed to persist finalized utterance: {}", e);
        }

        if self.keywords.matches(transcript) {
            writeln!(self.out, "Exiting..")?;
            self.out.flush()?;
            return Ok(RenderOutcome::Terminate);
        }

        Ok(RenderOutcome::Continue)
    }
}
