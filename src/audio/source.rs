//! Cue clip loading
//!
//! The clip is fetched once, kept in memory, and decoded afresh for every
//! round.

use crate::error::{TimerError, TimerResult};
use lofty::file::AudioFile;
use lofty::probe::Probe;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::{debug, info, warn};

const FETCH_ATTEMPTS: usize = 3;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the cue clip lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipSource {
    Remote(String),
    Local(PathBuf),
}

impl ClipSource {
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::Remote(trimmed.to_string())
        } else {
            Self::Local(PathBuf::from(trimmed))
        }
    }

    /// Fetch the clip bytes and probe its duration.
    ///
    /// Each remote attempt is abandoned after `timeout`.
    pub async fn load(&self, timeout: Duration) -> TimerResult<Clip> {
        let bytes = match self {
            Self::Remote(url) => {
                let client = reqwest::Client::builder()
                    .connect_timeout(timeout.min(CONNECT_TIMEOUT))
                    .timeout(timeout)
                    .build()
                    .map_err(|e| TimerError::Clip(e.to_string()))?;
                // 200ms, then 400ms
                let strategy = ExponentialBackoff::from_millis(2)
                    .factor(100)
                    .max_delay(Duration::from_secs(2))
                    .map(jitter)
                    .take(FETCH_ATTEMPTS - 1);
                Retry::spawn(strategy, || fetch(&client, url)).await?
            }
            Self::Local(path) => tokio::fs::read(path).await.map_err(|e| {
                TimerError::Clip(format!("Cannot read {}: {}", path.display(), e))
            })?,
        };

        if bytes.is_empty() {
            return Err(TimerError::Clip("Clip is empty".to_string()));
        }

        let clip = Clip::new(bytes);
        info!(
            "🎵 Clip loaded ({} bytes, duration {:?})",
            clip.len(),
            clip.duration()
        );
        Ok(clip)
    }
}

impl std::fmt::Display for ClipSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{}", url),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

async fn fetch(client: &reqwest::Client, url: &str) -> TimerResult<Vec<u8>> {
    debug!("⬇️ Fetching clip: {}", url);
    let resp = client.get(url).send().await.map_err(|e| {
        warn!("⚠️ Clip fetch failed: {}", e);
        TimerError::Clip(e.to_string())
    })?;
    let resp = resp
        .error_for_status()
        .map_err(|e| TimerError::Clip(e.to_string()))?;
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| TimerError::Clip(e.to_string()))?;
    Ok(bytes.to_vec())
}

/// An in-memory audio clip
#[derive(Debug, Clone)]
pub struct Clip {
    bytes: Arc<[u8]>,
    duration: Option<Duration>,
}

impl Clip {
    pub fn new(bytes: Vec<u8>) -> Self {
        let bytes: Arc<[u8]> = bytes.into();
        let duration = probe_duration(&bytes);
        Self { bytes, duration }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Duration read from the container headers, if lofty understands them
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// A fresh reader positioned at the start of the clip
    pub fn reader(&self) -> Cursor<Arc<[u8]>> {
        Cursor::new(self.bytes.clone())
    }
}

fn probe_duration(bytes: &[u8]) -> Option<Duration> {
    let probe = Probe::new(Cursor::new(bytes)).guess_file_type().ok()?;
    match probe.read() {
        Ok(tagged) => {
            let duration = tagged.properties().duration();
            (!duration.is_zero()).then_some(duration)
        }
        Err(e) => {
            debug!("Could not probe clip duration: {}", e);
            None
        }
    }
}
