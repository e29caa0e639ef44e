//! Round announcer
//!
//! Wraps a [`TtsEngine`] with voice selection and the never-fail policy:
//! an announcement always resolves, whatever the engine does.

use super::voices::VoiceCatalog;
use super::{create_engine, TtsEngine};
use crate::config::Config;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug)]
pub struct Announcer {
    engine: Arc<dyn TtsEngine>,
    catalog: VoiceCatalog,
    preference: String,
}

impl Announcer {
    pub fn new(
        engine: Arc<dyn TtsEngine>,
        catalog: VoiceCatalog,
        preference: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            catalog,
            preference: preference.into(),
        }
    }

    /// Create the configured engine and load its voice list
    pub async fn from_config(config: &Config) -> Self {
        let engine = create_engine(config).await;
        let catalog = VoiceCatalog::load(engine.clone(), config.voice_refresh_interval()).await;
        Self::new(engine, catalog, config.preferred_voice.clone())
    }

    /// Speak `text`, interrupting any earlier announcement. Failures are logged and swallowed.
    pub async fn announce(&self, text: &str) {
        self.engine.cancel();
        let voice = self.catalog.preferred(&self.preference);
        info!("📢 Announcing: '{}'", text);
        if let Err(e) = self.engine.speak(text, voice.as_deref()).await {
            warn!("⚠️ Announcement failed (continuing): {}", e);
        }
    }

    pub fn cancel(&self) {
        self.engine.cancel();
    }

    pub fn voices(&self) -> Vec<String> {
        self.catalog.voices()
    }

    pub fn selected_voice(&self) -> Option<String> {
        self.catalog.preferred(&self.preference)
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Tear down the voice-list subscription
    pub fn shutdown(&self) {
        self.catalog.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct FlakyEngine {
        attempts: Mutex<Vec<(String, Option<String>)>>,
        cancels: Mutex<usize>,
    }

    #[async_trait]
    impl TtsEngine for FlakyEngine {
        async fn speak(&self, text: &str, voice: Option<&str>) -> Result<()> {
            self.attempts
                .lock()
                .unwrap()
                .push((text.to_string(), voice.map(str::to_string)));
            Err(anyhow::anyhow!("synthesizer crashed"))
        }

        async fn voices(&self) -> Result<Vec<String>> {
            Ok(vec!["espeak-en".to_string(), "Google Deutsch".to_string()])
        }

        fn cancel(&self) {
            *self.cancels.lock().unwrap() += 1;
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn test_announce_swallows_errors_and_uses_preferred_voice() {
        let engine = Arc::new(FlakyEngine::default());
        let catalog = VoiceCatalog::load(engine.clone(), std::time::Duration::from_secs(60)).await;
        let announcer = Announcer::new(engine.clone(), catalog, "google");

        announcer.announce("Round 1.").await;
        announcer.announce("Round 2.").await;

        let attempts = engine.attempts.lock().unwrap().clone();
        assert_eq!(
            attempts,
            vec![
                ("Round 1.".to_string(), Some("Google Deutsch".to_string())),
                ("Round 2.".to_string(), Some("Google Deutsch".to_string())),
            ]
        );
        // Each announcement interrupts whatever came before it
        assert_eq!(*engine.cancels.lock().unwrap(), 2);
        announcer.shutdown();
    }
}
