//! TTS (Text-to-Speech) Module
//!
//! Provides a unified interface for the speech backends that announce rounds.

use crate::config::Config;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub mod announcer;
pub mod silent;
pub mod speechd;
pub mod system;
pub mod voices;

pub use announcer::Announcer;
pub use voices::{select_voice, VoiceCatalog};

/// Trait for TTS engines
#[async_trait]
pub trait TtsEngine: Send + Sync + std::fmt::Debug {
    /// Speak the given text, resolving once the utterance has finished
    async fn speak(&self, text: &str, voice: Option<&str>) -> Result<()>;

    /// List the voice names this engine can speak with
    async fn voices(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    /// Silence any utterance in progress
    fn cancel(&self) {}

    /// Get the engine name
    fn name(&self) -> &str;
}

/// Factory to create the configured TTS engine.
///
/// Never fails: an unavailable engine degrades to the silent one.
pub async fn create_engine(config: &Config) -> Arc<dyn TtsEngine> {
    info!("🛠️ Creating TTS engine: {}", config.tts_engine);
    let engine: Arc<dyn TtsEngine> = match config.tts_engine.as_str() {
        "speechd_ng" | "speechd" => match speechd::SpeechdEngine::connect().await {
            Ok(client) => Arc::new(client),
            Err(e) => {
                warn!("⚠️ Speechd unavailable ({}), announcements disabled", e);
                Arc::new(silent::SilentEngine::new())
            }
        },
        "system" => {
            match system::SystemEngine::detect(config.speech_rate, config.speech_pitch).await {
                Ok(engine) => Arc::new(engine),
                Err(e) => {
                    warn!("⚠️ {}, announcements disabled", e);
                    Arc::new(silent::SilentEngine::new())
                }
            }
        }
        "none" | "silent" => Arc::new(silent::SilentEngine::new()),
        _ => {
            warn!(
                "  - Unknown engine '{}', falling back to silent",
                config.tts_engine
            );
            Arc::new(silent::SilentEngine::new())
        }
    };
    info!("✅ TTS engine '{}' initialized", engine.name());
    engine
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_engine_falls_back_to_silent() {
        let config = Config {
            tts_engine: "festival-9000".to_string(),
            ..Config::default()
        };
        let engine = create_engine(&config).await;
        assert_eq!(engine.name(), "silent");
    }

    #[tokio::test]
    async fn test_none_engine() {
        let config = Config {
            tts_engine: "none".to_string(),
            ..Config::default()
        };
        let engine = create_engine(&config).await;
        assert!(engine.speak("Round 1.", None).await.is_ok());
    }
}
