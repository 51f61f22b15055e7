//! # Configuration Management
//!
//! This module handles loading and managing application configuration from
//! multiple sources:
//! - TOML configuration files (config.toml)
//! - Environment variables (with APP_ prefix)
//! - Default values (built into the code)
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Environment variables (APP_BACKEND__URL, APP_AUDIO__SAMPLE_RATE, etc.
//!    — a double underscore separates the section from the field, so field
//!    names may themselves contain underscores)
//! 2. Configuration file (config.toml)
//! 3. Default values (defined in the Default impl)
//!
//! The backend API key additionally honors the bare `STT_API_KEY` variable,
//! which is how deployment environments usually inject credentials.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Main application configuration that contains all settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub backend: BackendConfig,
    pub termination: TerminationConfig,
    pub persistence: PersistenceConfig,
}

/// Microphone capture settings.
///
/// ## Fields:
/// - `sample_rate`: Capture sample rate in Hz (16000 is what recognition
///   backends expect for LINEAR16 speech audio)
/// - `frame_duration_ms`: Duration of one hardware frame; the capture
///   callback pushes one channel message per frame
/// - `channels` / `bit_depth`: Fixed at mono 16-bit PCM; validated rather
///   than configurable, so a bad config fails fast instead of producing a
///   stream the backend rejects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub frame_duration_ms: u32,
    pub channels: u8,
    pub bit_depth: u8,
}

impl AudioConfig {
    /// Number of samples per capture frame.
    ///
    /// For 100ms at 16kHz: 16000 * 100 / 1000 = 1600 samples.
    pub fn frame_samples(&self) -> usize {
        (self.sample_rate as usize * self.frame_duration_ms as usize) / 1000
    }
}

/// Recognition backend connection settings.
///
/// ## Fields:
/// - `url`: WebSocket endpoint of the streaming recognizer
/// - `api_key`: Optional bearer credential sent on the handshake
/// - `language_code`: BCP-47 language tag for the session
/// - `interim_results`: Whether the backend should emit provisional
///   hypotheses before each utterance is finalized
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub language_code: String,
    pub interim_results: bool,
}

/// Session termination settings.
///
/// A final transcript containing any of these keywords (whole-word,
/// case-insensitive) ends the session cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminationConfig {
    pub keywords: Vec<String>,
}

/// Finalized-utterance log settings.
///
/// When enabled, every final transcript is appended as one CSV record of its
/// whitespace-separated words.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    pub enabled: bool,
    pub path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            audio: AudioConfig {
                sample_rate: 16000,     // What speech backends expect for LINEAR16
                frame_duration_ms: 100, // 1600 samples per frame at 16kHz
                channels: 1,
                bit_depth: 16,
            },
            backend: BackendConfig {
                url: "ws://127.0.0.1:9090/v1/stream".to_string(),
                api_key: None,
                language_code: "ko-KR".to_string(),
                interim_results: true,
            },
            termination: TerminationConfig {
                keywords: vec!["끝".to_string(), "그만".to_string()],
            },
            persistence: PersistenceConfig {
                enabled: false,
                path: "transcripts.csv".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources in priority order.
    ///
    /// ## Configuration Loading Process:
    /// 1. Start with built-in defaults
    /// 2. Override with values from config.toml (if it exists)
    /// 3. Override with environment variables prefixed with APP_
    ///    (double-underscore key separator: APP_AUDIO__SAMPLE_RATE)
    /// 4. Handle the special-case STT_API_KEY variable
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            // "__" separates section from field so snake_case field names
            // stay addressable (APP_AUDIO__SAMPLE_RATE -> audio.sample_rate)
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );

        // Credentials are usually injected without the APP_ prefix
        if let Ok(key) = env::var("STT_API_KEY") {
            settings = settings.set_override("backend.api_key", key)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    ///
    /// ## What this checks:
    /// - Sample rate and frame duration are non-zero
    /// - Audio format is the fixed mono 16-bit PCM the wire protocol carries
    /// - Backend URL is present and uses a WebSocket scheme
    /// - At least one termination keyword is configured
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(anyhow::anyhow!("Audio sample rate cannot be 0"));
        }

        if self.audio.frame_duration_ms == 0 {
            return Err(anyhow::anyhow!("Audio frame duration cannot be 0"));
        }

        if self.audio.channels != 1 {
            return Err(anyhow::anyhow!("Only mono capture is supported"));
        }

        if self.audio.bit_depth != 16 {
            return Err(anyhow::anyhow!("Only 16-bit PCM capture is supported"));
        }

        if !self.backend.url.starts_with("ws://") && !self.backend.url.starts_with("wss://") {
            return Err(anyhow::anyhow!(
                "Backend URL must use ws:// or wss://, got '{}'",
                self.backend.url
            ));
        }

        if self.termination.keywords.is_empty() {
            return Err(anyhow::anyhow!(
                "At least one termination keyword must be configured"
            ));
        }

        if self.persistence.enabled && self.persistence.path.is_empty() {
            return Err(anyhow::anyhow!(
                "Persistence path cannot be empty when persistence is enabled"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.audio.frame_samples(), 1600);
        assert_eq!(config.backend.language_code, "ko-KR");
        assert!(config.backend.interim_results);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.audio.sample_rate = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.backend.url = "http://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.termination.keywords.clear();
        assert!(config.validate().is_err());
    }

    /// Snake_case fields must be reachable through the environment: the
    /// double-underscore separator keeps the underscore inside the field
    /// name out of the key path.
    #[test]
    fn test_env_override_of_snake_case_field() {
        env::set_var("APP_AUDIO__SAMPLE_RATE", "8000");
        env::set_var("APP_BACKEND__LANGUAGE_CODE", "en-US");
        let config = AppConfig::load().unwrap();
        env::remove_var("APP_AUDIO__SAMPLE_RATE");
        env::remove_var("APP_BACKEND__LANGUAGE_CODE");

        assert_eq!(config.audio.sample_rate, 8000);
        assert_eq!(config.backend.language_code, "en-US");
    }

    #[test]
    fn test_persistence_validation() {
        let mut config = AppConfig::default();
        config.persistence.enabled = true;
        config.persistence.path = String::new();
        assert!(config.validate().is_err());

        config.persistence.path = "out.csv".to_string();
        assert!(config.validate().is_ok());
    }
}
