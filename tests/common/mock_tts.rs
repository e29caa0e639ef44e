//! Mock TTS Engine for Testing
//!
//! Records all spoken text for verification. Can be told to fail, or to hold
//! each utterance open until it is cancelled.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

/// Mock TTS engine that records spoken text
#[derive(Debug, Default)]
pub struct MockTts {
    /// All text that was "spoken", with the voice it was spoken in
    pub spoken: Mutex<Vec<(String, Option<String>)>>,
    /// Voices reported by `voices()`
    pub voices: Vec<String>,
    /// Simulate failure on every speak
    pub should_fail: AtomicBool,
    /// Keep each utterance going until `cancel()`
    pub hold: AtomicBool,
    cancels: AtomicUsize,
    release: Notify,
}

impl MockTts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voices(voices: &[&str]) -> Self {
        Self {
            voices: voices.iter().map(|v| v.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn holding() -> Self {
        let tts = Self::default();
        tts.hold.store(true, Ordering::SeqCst);
        tts
    }

    /// Get all spoken phrases
    pub fn get_spoken(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap()
            .iter()
            .map(|(text, _)| text.clone())
            .collect()
    }

    /// Check if a phrase was spoken
    pub fn was_spoken(&self, text: &str) -> bool {
        self.get_spoken().iter().any(|s| s.contains(text))
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl workout_timer::tts::TtsEngine for MockTts {
    async fn speak(&self, text: &str, voice: Option<&str>) -> Result<()> {
        self.spoken
            .lock()
            .unwrap()
            .push((text.to_string(), voice.map(str::to_string)));
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("Mock TTS failure"));
        }
        if self.hold.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        Ok(())
    }

    async fn voices(&self) -> Result<Vec<String>> {
        Ok(self.voices.clone())
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.release.notify_waiters();
    }

    fn name(&self) -> &str {
        "mock"
    }
}
