//! # Finalized-Utterance Persistence
//!
//! Strategy interface for persisting finalized utterances, so the renderer
//! stays a single implementation whether or not a transcript log is
//! configured.
//!
//! ## Log Format:
//! Append-only CSV, UTF-8, one record per finalized utterance whose fields
//! are the whitespace-separated words of the transcript. A header row is
//! written only when the file is first created; afterwards records are
//! appended without ever rewriting earlier content.

use crate::error::{AppError, AppResult};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Capability interface for the renderer's persistence step.
///
/// Called exactly once per finalized utterance, never for interim text.
pub trait TranscriptSink {
    fn persist(&mut self, transcript: &str) -> AppResult<()>;
}

/// Default sink: discards utterances.
pub struct NoopSink;

impl TranscriptSink for NoopSink {
    fn persist(&mut self, _transcript: &str) -> AppResult<()> {
        Ok(())
    }
}

impl TranscriptSink for Box<dyn TranscriptSink + Send> {
    fn persist(&mut self, transcript: &str) -> AppResult<()> {
        (**self).persist(transcript)
    }
}

/// CSV-file sink.
///
/// The file is opened in append mode on every persist call, so a session
/// resumed against an existing log keeps appending after its old records.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl TranscriptSink for CsvSink {
    fn persist(&mut self, transcript: &str) -> AppResult<()> {
        let words: Vec<&str> = transcript.split_whitespace().collect();
        if words.is_empty() {
            // Nothing to record for a blank utterance
            return Ok(());
        }

        let is_new = !self.path.exists();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                AppError::Persistence(format!("cannot open {}: {}", self.path.display(), e))
            })?;

        // Records have as many fields as the utterance has words
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_writer(file);

        if is_new {
            writer.write_record(["transcript"])?;
        }

        writer.write_record(&words)?;
        writer
            .flush()
            .map_err(|e| AppError::Persistence(format!("flush failed: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create-with-header then append-without-header: the first finalized
    /// utterance creates the file with a header and one data row; the second
    /// appends one row without touching the header or the first record.
    #[test]
    fn test_create_then_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcripts.csv");
        let mut sink = CsvSink::new(&path);

        sink.persist("hello world").unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "transcript\nhello,world\n");

        sink.persist("foo bar").unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "transcript\nhello,world\nfoo,bar\n");
    }

    #[test]
    fn test_existing_file_gets_no_second_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcripts.csv");
        std::fs::write(&path, "transcript\nold,record\n").unwrap();

        let mut sink = CsvSink::new(&path);
        sink.persist("새로운 발화").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "transcript\nold,record\n새로운,발화\n");
    }

    #[test]
    fn test_unwritable_path_reports_persistence_error() {
        let mut sink = CsvSink::new("/nonexistent-dir/transcripts.csv");
        let err = sink.persist("hello").unwrap_err();
        assert!(matches!(err, AppError::Persistence(_)));
    }

    #[test]
    fn test_noop_sink_accepts_everything() {
        let mut sink = NoopSink;
        assert!(sink.persist("anything at all").is_ok());
    }
}
