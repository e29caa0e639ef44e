//! Mock cue player for testing
//!
//! Records every call and lets the test drive the event stream by hand.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use workout_timer::audio::{CuePlayer, PlayerEvent};
use workout_timer::error::{TimerError, TimerResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCall {
    Play,
    Pause,
    Seek(Duration),
}

#[derive(Debug)]
pub struct MockPlayer {
    pub calls: Mutex<Vec<PlayerCall>>,
    /// Make every `play()` fail
    pub fail_play: AtomicBool,
    events: mpsc::UnboundedSender<PlayerEvent>,
}

impl MockPlayer {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PlayerEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let player = Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail_play: AtomicBool::new(false),
            events,
        });
        (player, rx)
    }

    pub fn calls(&self) -> Vec<PlayerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn play_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == PlayerCall::Play)
            .count()
    }

    pub fn emit(&self, event: PlayerEvent) {
        self.events.send(event).unwrap();
    }

    /// Report that the cue played through
    pub fn finish_cue(&self) {
        self.emit(PlayerEvent::Ended);
    }
}

#[async_trait]
impl CuePlayer for MockPlayer {
    async fn play(&self) -> TimerResult<()> {
        self.calls.lock().unwrap().push(PlayerCall::Play);
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(TimerError::Playback("autoplay blocked".to_string()));
        }
        Ok(())
    }

    fn pause(&self) -> TimerResult<()> {
        self.calls.lock().unwrap().push(PlayerCall::Pause);
        Ok(())
    }

    fn seek(&self, position: Duration) -> TimerResult<()> {
        self.calls.lock().unwrap().push(PlayerCall::Seek(position));
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
