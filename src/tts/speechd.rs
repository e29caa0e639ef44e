//! speechd-ng backend over the session bus

use super::TtsEngine;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};
use zbus::{proxy, Connection};

#[proxy(
    interface = "org.speech.Service",
    default_service = "org.speech.Service",
    default_path = "/org/speech/Service"
)]
trait SpeechService {
    fn speak(&self, text: &str) -> zbus::Result<()>;

    fn speak_voice(&self, text: &str, voice: &str) -> zbus::Result<()>;

    fn ping(&self) -> zbus::Result<String>;
}

/// Announces through a running speechd-ng daemon.
///
/// The service has no voice listing, so the catalog stays empty and
/// announcements use the daemon's default voice.
pub struct SpeechdEngine {
    service: SpeechServiceProxy<'static>,
}

impl std::fmt::Debug for SpeechdEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechdEngine").finish_non_exhaustive()
    }
}

impl SpeechdEngine {
    /// Connect and check the daemon answers before accepting it
    pub async fn connect() -> Result<Self> {
        let bus = Connection::session()
            .await
            .context("no D-Bus session bus")?;
        let service = SpeechServiceProxy::new(&bus).await?;
        let pong = service
            .ping()
            .await
            .context("speechd-ng not responding")?;
        info!("🔊 speechd-ng answered: {}", pong);
        Ok(Self { service })
    }
}

#[async_trait]
impl TtsEngine for SpeechdEngine {
    async fn speak(&self, text: &str, voice: Option<&str>) -> Result<()> {
        debug!("speechd-ng <- '{}' (voice {:?})", text, voice);
        match voice {
            Some(voice) => self.service.speak_voice(text, voice).await?,
            None => self.service.speak(text).await?,
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "speechd_ng"
    }
}
