//! # Wire Protocol
//!
//! Message envelopes exchanged with the recognition backend over the
//! WebSocket connection.
//!
//! ## Protocol:
//! 1. **Configuration**: The first client message is a JSON `config`
//!    envelope describing the audio that follows
//! 2. **Audio Streaming**: Subsequent client messages are binary frames of
//!    raw 16-bit little-endian PCM (no envelope)
//! 3. **Results**: Server messages are JSON transcript events carrying zero
//!    or one results, each with ranked alternatives and a finality flag
//! 4. **Half-close**: When capture ends, the client sends an `end_stream`
//!    envelope so the backend can flush pending finals before closing
//!
//! Inbound deserialization is deliberately lenient: every field of a
//! transcript event defaults, so an event missing results or alternatives
//! parses fine and is simply skipped downstream.

use serde::{Deserialize, Serialize};

/// JSON text messages sent by the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Session configuration, sent once before any audio
    #[serde(rename = "config")]
    Config {
        /// Wire encoding of the audio frames; always "LINEAR16" here
        encoding: String,
        /// Capture sample rate in Hz
        #[serde(rename = "sampleRateHertz")]
        sample_rate_hertz: u32,
        /// BCP-47 language tag
        #[serde(rename = "languageCode")]
        language_code: String,
        /// Whether provisional hypotheses should be emitted
        #[serde(rename = "interimResults")]
        interim_results: bool,
    },

    /// Outbound half-close: no further audio will be sent
    #[serde(rename = "end_stream")]
    EndStream {},
}

/// One inbound message from the recognition backend.
///
/// May carry zero results (for example keep-alive events); only the first
/// result is ever used.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct TranscriptEvent {
    #[serde(default)]
    pub results: Vec<TranscriptResult>,
}

/// One recognition result with ranked candidate transcriptions.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct TranscriptResult {
    #[serde(default)]
    pub alternatives: Vec<Alternative>,

    /// False for interim hypotheses, true once the utterance is committed
    #[serde(default, rename = "isFinal")]
    pub is_final: bool,
}

/// One candidate transcription. Lower-ranked alternatives are ignored by
/// design (single-best-guess policy).
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct Alternative {
    #[serde(default)]
    pub transcript: String,
}

impl TranscriptEvent {
    /// Top alternative of the first result, with the finality flag.
    ///
    /// Returns `None` when the event carries no results or the first result
    /// has no alternatives — such events are skipped with no state change.
    pub fn best_transcript(&self) -> Option<(&str, bool)> {
        let result = self.results.first()?;
        let alternative = result.alternatives.first()?;
        Some((alternative.transcript.as_str(), result.is_final))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_envelope_serialization() {
        let msg = ClientMessage::Config {
            encoding: "LINEAR16".to_string(),
            sample_rate_hertz: 16000,
            language_code: "ko-KR".to_string(),
            interim_results: true,
        };

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"config""#));
        assert!(json.contains(r#""sampleRateHertz":16000"#));
        assert!(json.contains(r#""languageCode":"ko-KR""#));
        assert!(json.contains(r#""interimResults":true"#));
    }

    #[test]
    fn test_end_stream_envelope() {
        let json = serde_json::to_string(&ClientMessage::EndStream {}).unwrap();
        assert_eq!(json, r#"{"type":"end_stream"}"#);
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{
            "results": [{
                "alternatives": [
                    {"transcript": "안녕하세요"},
                    {"transcript": "안녕 하세요"}
                ],
                "isFinal": true
            }]
        }"#;

        let event: TranscriptEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.best_transcript(), Some(("안녕하세요", true)));
    }

    #[test]
    fn test_empty_event_is_tolerated() {
        let event: TranscriptEvent = serde_json::from_str("{}").unwrap();
        assert_eq!(event.best_transcript(), None);

        let event: TranscriptEvent = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert_eq!(event.best_transcript(), None);

        let event: TranscriptEvent =
            serde_json::from_str(r#"{"results": [{"alternatives": []}]}"#).unwrap();
        assert_eq!(event.best_transcript(), None);
    }

    #[test]
    fn test_is_final_defaults_to_interim() {
        let json = r#"{"results": [{"alternatives": [{"transcript": "hi"}]}]}"#;
        let event: TranscriptEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.best_transcript(), Some(("hi", false)));
    }
}
