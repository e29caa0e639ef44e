use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Remote clip that counts through one round of work and rest.
pub const DEFAULT_AUDIO_SOURCE: &str = "https://sts-christtube-dev.s3.ap-south-1.amazonaws.com/audios/1767094336449_correct_1-10_rest_1-10_done.mp3";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    // Session
    pub default_rounds: u32,
    pub completion_delay_ms: u64,

    // Audio
    pub audio_source: String,
    /// Per-attempt limit for fetching a remote clip
    pub clip_timeout_secs: u64,

    // Speech
    pub tts_engine: String,
    pub preferred_voice: String,
    pub speech_rate: i32,
    pub speech_pitch: i32,
    pub voice_refresh_secs: u64,

    // Meta
    pub log_level: String,
    pub gui_scaling: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_rounds: 3,
            completion_delay_ms: 3000,
            audio_source: DEFAULT_AUDIO_SOURCE.to_string(),
            clip_timeout_secs: 15,
            tts_engine: "system".to_string(),
            preferred_voice: "google".to_string(),
            speech_rate: 0,
            speech_pitch: 0,
            voice_refresh_secs: 30,
            log_level: "info".to_string(),
            gui_scaling: 1.0,
        }
    }
}

impl Config {
    /// Load config from the user config directory, or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Save config to the user config directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path())
    }

    /// Load config from an explicit path. A corrupt file is moved aside and defaults are used.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str::<Config>(&content) {
            Ok(config) => Ok(config.sanitized()),
            Err(e) => {
                tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                let backup_path = path.with_extension("json.corrupt");
                let _ = std::fs::rename(path, &backup_path);
                Ok(Self::default())
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn completion_delay(&self) -> Duration {
        Duration::from_millis(self.completion_delay_ms)
    }

    pub fn clip_timeout(&self) -> Duration {
        Duration::from_secs(self.clip_timeout_secs.max(1))
    }

    pub fn voice_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.voice_refresh_secs.max(1))
    }

    fn sanitized(mut self) -> Self {
        self.default_rounds = self.default_rounds.max(1);
        self
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("workout-timer")
        .join("config.json")
}
