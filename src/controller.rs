//! Session controller
//!
//! Owns the [`Session`] and is the only place it is mutated. User commands,
//! player events and the outcomes of collaborator calls all arrive over
//! channels and are handled one at a time. Announcements and the completion
//! timer run in spawned tasks; player calls go through a single ordered lane
//! so a cancel can never overtake the play it is cancelling.

use crate::audio::{CuePlayer, PlayerEvent};
use crate::error::{TimerError, TimerResult};
use crate::session::{Effect, Session, SessionStatus};
use crate::tts::Announcer;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long shutdown waits for the player lane to drain
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// User actions accepted by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerCommand {
    IncrementRounds,
    DecrementRounds,
    SetRounds(u32),
    Start,
    TogglePause,
    Cancel,
    Shutdown,
}

/// Outcomes of collaborator calls, tagged with the epoch that issued them
#[derive(Debug)]
enum Completion {
    AnnouncementFinished(u64),
    PlaybackStarted(u64),
    PlaybackFailed { epoch: u64, reason: String },
    ResumeFailed { epoch: u64, reason: String },
    ReturnDue(u64),
}

/// Player calls, executed strictly in order
#[derive(Debug)]
enum PlayerOp {
    Seek(Duration),
    Pause,
    Play { epoch: u64, resume: bool },
}

/// Cheap, clonable access to a running controller
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    commands: mpsc::UnboundedSender<ControllerCommand>,
    snapshots: watch::Receiver<Session>,
}

impl ControllerHandle {
    pub fn send(&self, command: ControllerCommand) -> TimerResult<()> {
        self.commands
            .send(command)
            .map_err(|e| TimerError::Controller(format!("cannot deliver {:?}", e.0)))
    }

    pub fn increment_rounds(&self) -> TimerResult<()> {
        self.send(ControllerCommand::IncrementRounds)
    }

    pub fn decrement_rounds(&self) -> TimerResult<()> {
        self.send(ControllerCommand::DecrementRounds)
    }

    pub fn set_rounds(&self, rounds: u32) -> TimerResult<()> {
        self.send(ControllerCommand::SetRounds(rounds))
    }

    pub fn start(&self) -> TimerResult<()> {
        self.send(ControllerCommand::Start)
    }

    pub fn toggle_pause(&self) -> TimerResult<()> {
        self.send(ControllerCommand::TogglePause)
    }

    pub fn cancel(&self) -> TimerResult<()> {
        self.send(ControllerCommand::Cancel)
    }

    pub fn shutdown(&self) -> TimerResult<()> {
        self.send(ControllerCommand::Shutdown)
    }

    /// Follow session snapshots as they change
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.snapshots.clone()
    }

    pub fn snapshot(&self) -> Session {
        self.snapshots.borrow().clone()
    }
}

pub struct SessionController {
    session: Session,
    player: Arc<dyn CuePlayer>,
    player_events: mpsc::UnboundedReceiver<PlayerEvent>,
    announcer: Arc<Announcer>,
    completion_delay: Duration,
    commands: mpsc::UnboundedReceiver<ControllerCommand>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    player_ops: mpsc::UnboundedSender<PlayerOp>,
    player_ops_rx: Option<mpsc::UnboundedReceiver<PlayerOp>>,
    snapshots: watch::Sender<Session>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("session", &self.session)
            .field("player", &self.player.name())
            .field("announcer", &self.announcer.engine_name())
            .finish()
    }
}

impl SessionController {
    pub fn new(
        session: Session,
        player: Arc<dyn CuePlayer>,
        player_events: mpsc::UnboundedReceiver<PlayerEvent>,
        announcer: Arc<Announcer>,
        completion_delay: Duration,
    ) -> (Self, ControllerHandle) {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (player_ops, player_ops_rx) = mpsc::unbounded_channel();
        let (snapshots, snapshots_rx) = watch::channel(session.clone());

        let controller = Self {
            session,
            player,
            player_events,
            announcer,
            completion_delay,
            commands,
            completions_tx,
            completions,
            player_ops,
            player_ops_rx: Some(player_ops_rx),
            snapshots,
        };
        let handle = ControllerHandle {
            commands: commands_tx,
            snapshots: snapshots_rx,
        };
        (controller, handle)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until every handle is dropped or `Shutdown` arrives.
    pub async fn run(mut self) {
        let Some(ops) = self.player_ops_rx.take() else {
            warn!("⚠️ Session controller already ran");
            return;
        };
        let lane = tokio::spawn(player_lane(
            self.player.clone(),
            ops,
            self.completions_tx.clone(),
        ));

        info!(
            "🏋️ Session controller ready ({} rounds, player '{}', speech '{}')",
            self.session.total_rounds(),
            self.player.name(),
            self.announcer.engine_name()
        );

        let mut player_events_open = true;
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(ControllerCommand::Shutdown) | None => break,
                    Some(command) => self.on_command(command),
                },
                Some(done) = self.completions.recv() => self.on_completion(done),
                event = self.player_events.recv(), if player_events_open => match event {
                    Some(event) => self.on_player_event(event),
                    None => {
                        debug!("Player event stream closed");
                        player_events_open = false;
                    }
                },
            }
            self.publish();
        }

        info!("👋 Session controller shutting down");
        self.announcer.cancel();
        self.announcer.shutdown();
        self.enqueue(PlayerOp::Pause);

        let Self { player_ops, .. } = self;
        drop(player_ops);
        if tokio::time::timeout(DRAIN_TIMEOUT, lane).await.is_err() {
            warn!("⚠️ Player lane did not drain before shutdown");
        }
    }

    fn on_command(&mut self, command: ControllerCommand) {
        debug!("Command: {:?}", command);
        let effects = match command {
            ControllerCommand::IncrementRounds => {
                self.session.increment_rounds();
                Vec::new()
            }
            ControllerCommand::DecrementRounds => {
                self.session.decrement_rounds();
                Vec::new()
            }
            ControllerCommand::SetRounds(rounds) => {
                self.session.set_total_rounds(rounds);
                Vec::new()
            }
            ControllerCommand::Start => {
                let effects = self.session.start();
                if !effects.is_empty() {
                    info!(
                        "▶️ Starting workout: {} rounds",
                        self.session.total_rounds()
                    );
                }
                effects
            }
            ControllerCommand::TogglePause => {
                let effects = self.session.toggle_pause();
                match self.session.status() {
                    SessionStatus::Paused => info!("⏸️ Paused"),
                    SessionStatus::Playing => info!("▶️ Resumed"),
                    _ => {}
                }
                effects
            }
            ControllerCommand::Cancel => {
                let effects = self.session.cancel();
                if !effects.is_empty() {
                    info!("🛑 Workout cancelled");
                }
                effects
            }
            ControllerCommand::Shutdown => Vec::new(),
        };
        self.execute(effects);
    }

    fn on_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Loaded { duration } => {
                info!("🎵 Cue ready (duration {:?})", duration);
            }
            PlayerEvent::TimeUpdate { position, duration } => {
                self.session.time_update(position, duration);
            }
            PlayerEvent::Ended => {
                let effects = self.session.audio_ended();
                match self.session.status() {
                    SessionStatus::Completed => info!(
                        "✅ Workout complete ({} rounds)",
                        self.session.total_rounds()
                    ),
                    SessionStatus::Playing if !effects.is_empty() => info!(
                        "🔁 Round {}/{}",
                        self.session.current_round(),
                        self.session.total_rounds()
                    ),
                    _ => {}
                }
                self.execute(effects);
            }
            PlayerEvent::Error(message) => {
                warn!("⚠️ Audio player error: {}", message);
            }
        }
    }

    fn on_completion(&mut self, done: Completion) {
        debug!("Completion: {:?}", done);
        let effects = match done {
            Completion::AnnouncementFinished(epoch) => self.session.announcement_finished(epoch),
            Completion::PlaybackStarted(epoch) => self.session.playback_started(epoch),
            Completion::PlaybackFailed { epoch, reason } => {
                warn!("❌ Playback failed to start: {}", reason);
                self.session.playback_failed(epoch);
                Vec::new()
            }
            Completion::ResumeFailed { epoch, reason } => {
                warn!("❌ Resume failed: {}", reason);
                self.session.resume_failed(epoch);
                Vec::new()
            }
            Completion::ReturnDue(epoch) => {
                let effects = self.session.return_due(epoch);
                if !effects.is_empty() {
                    info!("↩️ Back to setup");
                }
                effects
            }
        };
        self.execute(effects);
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Announce { text, epoch } => {
                    let announcer = self.announcer.clone();
                    let done = self.completions_tx.clone();
                    tokio::spawn(async move {
                        announcer.announce(&text).await;
                        let _ = done.send(Completion::AnnouncementFinished(epoch));
                    });
                }
                Effect::Restart { epoch } => {
                    self.enqueue(PlayerOp::Seek(Duration::ZERO));
                    self.enqueue(PlayerOp::Play {
                        epoch,
                        resume: false,
                    });
                }
                Effect::Resume { epoch } => self.enqueue(PlayerOp::Play {
                    epoch,
                    resume: true,
                }),
                Effect::Pause => self.enqueue(PlayerOp::Pause),
                Effect::Rewind => self.enqueue(PlayerOp::Seek(Duration::ZERO)),
                Effect::Stop => {
                    self.announcer.cancel();
                    self.enqueue(PlayerOp::Pause);
                    self.enqueue(PlayerOp::Seek(Duration::ZERO));
                }
                Effect::ScheduleReturn { epoch } => {
                    let delay = self.completion_delay;
                    let done = self.completions_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = done.send(Completion::ReturnDue(epoch));
                    });
                }
            }
        }
    }

    fn enqueue(&self, op: PlayerOp) {
        if self.player_ops.send(op).is_err() {
            warn!("⚠️ Player lane closed");
        }
    }

    fn publish(&self) {
        let session = &self.session;
        self.snapshots.send_if_modified(|current| {
            if *current != *session {
                *current = session.clone();
                true
            } else {
                false
            }
        });
    }
}

async fn player_lane(
    player: Arc<dyn CuePlayer>,
    mut ops: mpsc::UnboundedReceiver<PlayerOp>,
    done: mpsc::UnboundedSender<Completion>,
) {
    while let Some(op) = ops.recv().await {
        match op {
            PlayerOp::Seek(position) => {
                if let Err(e) = player.seek(position) {
                    warn!("⚠️ Seek failed: {}", e);
                }
            }
            PlayerOp::Pause => {
                if let Err(e) = player.pause() {
                    warn!("⚠️ Pause failed: {}", e);
                }
            }
            PlayerOp::Play { epoch, resume } => {
                let outcome = player.play().await;
                let completion = match (outcome, resume) {
                    (Ok(()), false) => Completion::PlaybackStarted(epoch),
                    (Ok(()), true) => continue,
                    (Err(e), false) => Completion::PlaybackFailed {
                        epoch,
                        reason: e.to_string(),
                    },
                    (Err(e), true) => Completion::ResumeFailed {
                        epoch,
                        reason: e.to_string(),
                    },
                };
                let _ = done.send(completion);
            }
        }
    }
    debug!("Player lane closed");
}

/// Wire the rodio player and configured announcer into a controller.
///
/// Must be called from within a tokio runtime.
pub async fn from_config(
    config: &crate::config::Config,
) -> TimerResult<(SessionController, ControllerHandle)> {
    let source = crate::audio::ClipSource::parse(&config.audio_source);
    let (engine, events) = crate::audio::CueEngine::spawn(source, config.clip_timeout())?;
    let announcer = Announcer::from_config(config).await;

    Ok(SessionController::new(
        Session::new(config.default_rounds),
        Arc::new(engine),
        events,
        Arc::new(announcer),
        config.completion_delay(),
    ))
}
