//! Cue playback
//!
//! The controller only sees the [`CuePlayer`] trait and the [`PlayerEvent`]
//! stream. [`CueEngine`] is the rodio-backed implementation.

use crate::error::TimerResult;
use async_trait::async_trait;
use std::time::Duration;

pub mod engine;
pub mod source;

pub use engine::CueEngine;
pub use source::{Clip, ClipSource};

/// Events reported by a cue player
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// The clip is in memory and ready to play.
    Loaded { duration: Option<Duration> },
    /// Periodic position report while a clip is queued.
    TimeUpdate {
        position: Duration,
        duration: Option<Duration>,
    },
    /// The clip played through to its end.
    Ended,
    Error(String),
}

/// Trait for the audio cue player
#[async_trait]
pub trait CuePlayer: Send + Sync + std::fmt::Debug {
    /// Start or continue playback. Resolves once playback has begun.
    async fn play(&self) -> TimerResult<()>;

    /// Pause without moving the playback position
    fn pause(&self) -> TimerResult<()>;

    /// Move the playback position
    fn seek(&self, position: Duration) -> TimerResult<()>;

    /// Get the player name
    fn name(&self) -> &str;
}
