//! Voice list owned by the announcer
//!
//! Populated once at startup, then kept current by a refresh subscription
//! that publishes only real changes. The subscription is aborted on
//! [`VoiceCatalog::shutdown`] or drop.

use super::TtsEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Pick the first voice whose name contains `preference` (case-insensitive),
/// else the first voice listed.
pub fn select_voice<'a>(voices: &'a [String], preference: &str) -> Option<&'a str> {
    let needle = preference.trim().to_lowercase();
    if !needle.is_empty() {
        if let Some(voice) = voices
            .iter()
            .find(|v| v.to_lowercase().contains(&needle))
        {
            return Some(voice.as_str());
        }
    }
    voices.first().map(String::as_str)
}

#[derive(Debug)]
pub struct VoiceCatalog {
    voices: watch::Receiver<Vec<String>>,
    refresher: Option<JoinHandle<()>>,
}

impl VoiceCatalog {
    /// A catalog with no voices and no refresh subscription
    pub fn empty() -> Self {
        let (_tx, rx) = watch::channel(Vec::new());
        Self {
            voices: rx,
            refresher: None,
        }
    }

    pub async fn load(engine: Arc<dyn TtsEngine>, refresh_every: Duration) -> Self {
        let initial = fetch(engine.as_ref()).await.unwrap_or_default();
        info!(
            "🗣️ {} voices available from '{}'",
            initial.len(),
            engine.name()
        );

        let (tx, rx) = watch::channel(initial);
        let refresher = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(refresh_every);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    break;
                }
                let Some(latest) = fetch(engine.as_ref()).await else {
                    continue;
                };
                let changed = tx.send_if_modified(|current| {
                    if *current != latest {
                        *current = latest;
                        true
                    } else {
                        false
                    }
                });
                if changed {
                    info!("🗣️ Voice list changed ({} voices)", tx.borrow().len());
                }
            }
        });

        Self {
            voices: rx,
            refresher: Some(refresher),
        }
    }

    pub fn voices(&self) -> Vec<String> {
        self.voices.borrow().clone()
    }

    pub fn preferred(&self, preference: &str) -> Option<String> {
        select_voice(&self.voices.borrow(), preference).map(str::to_string)
    }

    /// Stop following voice-list changes
    pub fn shutdown(&self) {
        if let Some(refresher) = &self.refresher {
            refresher.abort();
        }
    }
}

impl Drop for VoiceCatalog {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn fetch(engine: &dyn TtsEngine) -> Option<Vec<String>> {
    match engine.voices().await {
        Ok(voices) => Some(voices),
        Err(e) => {
            debug!("Could not list voices from '{}': {}", engine.name(), e);
            None
        }
    }
}
