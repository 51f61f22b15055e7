//! # Termination Keywords
//!
//! Whole-word, case-insensitive matching of the configured termination
//! keyword set against finalized transcripts. A keyword embedded in a larger
//! word ("끝" inside "끝내기") must not match, so the check uses Unicode word
//! boundaries rather than substring search. Keyword phrases may contain
//! spaces ("그려 줘").

use crate::error::{AppError, AppResult};
use regex::Regex;

/// Compiled matcher over the termination keyword set.
pub struct KeywordMatcher {
    pattern: Regex,
}

impl KeywordMatcher {
    /// Compile the keyword set into one alternation pattern.
    ///
    /// Keywords are escaped literally; the surrounding `\b` boundaries are
    /// Unicode-aware, so Korean keyword boundaries behave the same as ASCII
    /// ones.
    pub fn new(keywords: &[String]) -> AppResult<Self> {
        if keywords.is_empty() {
            return Err(AppError::Config(
                "termination keyword set is empty".to_string(),
            ));
        }

        let alternation = keywords
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternation))
            .map_err(|e| AppError::Config(format!("invalid termination keywords: {}", e)))?;

        Ok(Self { pattern })
    }

    /// Whether the transcript contains any keyword as a whole word.
    pub fn matches(&self, transcript: &str) -> bool {
        self.pattern.is_match(transcript)
    }
}
