//! Workout session state machine
//!
//! `Session` is pure and synchronous. Every transition returns the list of
//! [`Effect`]s the caller must run against the audio player and announcer;
//! their outcomes come back in through the `*_finished` / `playback_*`
//! methods tagged with the epoch that requested them.

use std::time::Duration;

/// Shown when the first round's audio refuses to start.
pub const START_FAILED: &str = "Unable to start audio. Please check your connection.";
/// Shown when a later round's audio refuses to restart.
pub const NEXT_ROUND_BLOCKED: &str = "Auto-play blocked for next round.";
/// Shown when resuming from pause fails.
pub const RESUME_FAILED: &str = "Unable to resume audio. Press play to try again.";

pub const DEFAULT_ROUNDS: u32 = 3;

/// Session lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Setup,
    Playing,
    Paused,
    Completed,
}

/// Step of an announce-then-play sequence still waiting on a collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cue {
    Announcing,
    Launching,
}

/// Collaborator work requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Speak `text`, then report `announcement_finished(epoch)`.
    Announce { text: String, epoch: u64 },
    /// Rewind to the start and play, then report `playback_started` or `playback_failed`.
    Restart { epoch: u64 },
    /// Play from the current position; report `resume_failed` on error.
    Resume { epoch: u64 },
    Pause,
    Rewind,
    /// Pause, rewind, and silence any speech in progress.
    Stop,
    /// Report `return_due(epoch)` after the completion delay.
    ScheduleReturn { epoch: u64 },
}

/// The single piece of state a workout timer owns
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    total_rounds: u32,
    current_round: u32,
    status: SessionStatus,
    progress_percent: f64,
    last_error: Option<String>,
    epoch: u64,
    cue: Option<Cue>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_ROUNDS)
    }
}

/// Text spoken before a round's cue
pub fn announcement(round: u32) -> String {
    format!("Round {}.", round)
}

impl Session {
    pub fn new(total_rounds: u32) -> Self {
        Self {
            total_rounds: total_rounds.max(1),
            current_round: 0,
            status: SessionStatus::Setup,
            progress_percent: 0.0,
            last_error: None,
            epoch: 0,
            cue: None,
        }
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn progress_percent(&self) -> f64 {
        self.progress_percent
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// True while an announcement or a play request is in flight
    pub fn cue_pending(&self) -> bool {
        self.cue.is_some()
    }

    /// Round count can only be edited on the setup screen with nothing in flight
    pub fn is_editable(&self) -> bool {
        self.status == SessionStatus::Setup && self.cue.is_none()
    }

    pub fn increment_rounds(&mut self) -> bool {
        if !self.is_editable() {
            return false;
        }
        self.total_rounds = self.total_rounds.saturating_add(1);
        true
    }

    pub fn decrement_rounds(&mut self) -> bool {
        if !self.is_editable() || self.total_rounds <= 1 {
            return false;
        }
        self.total_rounds -= 1;
        true
    }

    pub fn set_total_rounds(&mut self, rounds: u32) -> bool {
        if !self.is_editable() {
            return false;
        }
        self.total_rounds = rounds.max(1);
        true
    }

    /// Begin round 1: announce it, then start the cue.
    pub fn start(&mut self) -> Vec<Effect> {
        if !self.is_editable() {
            return Vec::new();
        }
        self.last_error = None;
        self.current_round = 1;
        self.begin_cue()
    }

    pub fn toggle_pause(&mut self) -> Vec<Effect> {
        match self.status {
            SessionStatus::Playing => {
                self.status = SessionStatus::Paused;
                vec![Effect::Pause]
            }
            SessionStatus::Paused => {
                self.status = SessionStatus::Playing;
                // A pending announcement will restart the cue on its own.
                if self.cue == Some(Cue::Announcing) {
                    Vec::new()
                } else {
                    vec![Effect::Resume { epoch: self.epoch }]
                }
            }
            SessionStatus::Setup | SessionStatus::Completed => Vec::new(),
        }
    }

    /// Leave any active state for setup, discarding rounds, progress and errors.
    pub fn cancel(&mut self) -> Vec<Effect> {
        let active = matches!(self.status, SessionStatus::Playing | SessionStatus::Paused);
        if !active && self.cue.is_none() {
            return Vec::new();
        }
        self.reset();
        vec![Effect::Stop]
    }

    /// The cue clip played through to its end.
    pub fn audio_ended(&mut self) -> Vec<Effect> {
        if self.status != SessionStatus::Playing || self.cue.is_some() {
            return Vec::new();
        }

        if self.current_round < self.total_rounds {
            self.current_round += 1;
            self.begin_cue()
        } else {
            self.status = SessionStatus::Completed;
            self.progress_percent = 0.0;
            self.last_error = None;
            self.epoch += 1;
            vec![Effect::ScheduleReturn { epoch: self.epoch }]
        }
    }

    pub fn announcement_finished(&mut self, epoch: u64) -> Vec<Effect> {
        if epoch != self.epoch || self.cue != Some(Cue::Announcing) {
            return Vec::new();
        }

        self.progress_percent = 0.0;
        if self.status == SessionStatus::Paused {
            self.cue = None;
            return vec![Effect::Rewind];
        }

        self.cue = Some(Cue::Launching);
        vec![Effect::Restart { epoch }]
    }

    pub fn playback_started(&mut self, epoch: u64) -> Vec<Effect> {
        if epoch != self.epoch || self.cue != Some(Cue::Launching) {
            return Vec::new();
        }
        self.cue = None;

        match self.status {
            SessionStatus::Setup => {
                self.status = SessionStatus::Playing;
                self.progress_percent = 0.0;
                Vec::new()
            }
            // Paused while play() was in flight
            SessionStatus::Paused => vec![Effect::Pause],
            SessionStatus::Playing | SessionStatus::Completed => Vec::new(),
        }
    }

    pub fn playback_failed(&mut self, epoch: u64) {
        if epoch != self.epoch || self.cue != Some(Cue::Launching) {
            return;
        }
        self.cue = None;

        if self.status == SessionStatus::Setup {
            self.current_round = 0;
            self.last_error = Some(START_FAILED.to_string());
        } else {
            self.last_error = Some(NEXT_ROUND_BLOCKED.to_string());
        }
    }

    pub fn resume_failed(&mut self, epoch: u64) {
        if epoch != self.epoch {
            return;
        }
        self.last_error = Some(RESUME_FAILED.to_string());
    }

    /// The completion delay elapsed.
    pub fn return_due(&mut self, epoch: u64) -> Vec<Effect> {
        if epoch != self.epoch || self.status != SessionStatus::Completed {
            return Vec::new();
        }
        self.reset();
        vec![Effect::Stop]
    }

    /// Recompute progress from the playback position. Unknown or zero duration is ignored.
    pub fn time_update(&mut self, position: Duration, duration: Option<Duration>) {
        if !matches!(self.status, SessionStatus::Playing | SessionStatus::Paused) {
            return;
        }
        let Some(duration) = duration.filter(|d| !d.is_zero()) else {
            return;
        };
        let percent = position.as_secs_f64() / duration.as_secs_f64() * 100.0;
        self.progress_percent = percent.clamp(0.0, 100.0);
    }

    fn begin_cue(&mut self) -> Vec<Effect> {
        self.epoch += 1;
        self.cue = Some(Cue::Announcing);
        vec![Effect::Announce {
            text: announcement(self.current_round),
            epoch: self.epoch,
        }]
    }

    fn reset(&mut self) {
        self.status = SessionStatus::Setup;
        self.current_round = 0;
        self.progress_percent = 0.0;
        self.last_error = None;
        self.cue = None;
        self.epoch += 1;
    }
}
