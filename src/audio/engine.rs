//! Cue engine backed by rodio
//!
//! Uses a channel-based architecture to handle rodio's non-Send stream.
//! The engine spawns a dedicated audio thread that owns the output stream and
//! sink, polls the sink for position and end-of-clip, and reports back over
//! an unbounded tokio channel.

use super::source::{Clip, ClipSource};
use super::{CuePlayer, PlayerEvent};
use crate::error::{TimerError, TimerResult};
use async_trait::async_trait;
use rodio::{Decoder, OutputStream, Sink, Source};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc as async_mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// How often position updates are emitted while a clip is queued
const TICK: Duration = Duration::from_millis(250);

/// Commands sent to the audio thread
enum PlayerCommand {
    Loaded(TimerResult<Clip>),
    Play(oneshot::Sender<TimerResult<()>>),
    Pause,
    Seek(Duration),
    Shutdown,
}

enum ClipState {
    Loading,
    Ready(Clip),
    Failed(String),
}

/// Thread-safe handle to the cue engine
pub struct CueEngine {
    sender: mpsc::Sender<PlayerCommand>,
    loader: tokio::task::JoinHandle<()>,
}

impl std::fmt::Debug for CueEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CueEngine").finish()
    }
}

impl CueEngine {
    /// Start the audio thread and begin loading the clip eagerly.
    /// A remote fetch attempt is abandoned after `fetch_timeout`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        source: ClipSource,
        fetch_timeout: Duration,
    ) -> TimerResult<(Self, async_mpsc::UnboundedReceiver<PlayerEvent>)> {
        let (sender, receiver) = mpsc::channel::<PlayerCommand>();
        let (events, events_rx) = async_mpsc::unbounded_channel();

        thread::Builder::new()
            .name("cue-audio".to_string())
            .spawn(move || audio_thread(receiver, events))?;

        info!("🎵 Loading cue clip from {}", source);
        let loader_tx = sender.clone();
        let loader = tokio::spawn(async move {
            let result = source.load(fetch_timeout).await;
            let _ = loader_tx.send(PlayerCommand::Loaded(result));
        });

        Ok((Self { sender, loader }, events_rx))
    }

    fn send(&self, cmd: PlayerCommand) -> TimerResult<()> {
        self.sender
            .send(cmd)
            .map_err(|e| TimerError::Audio(format!("Audio thread disconnected: {}", e)))
    }
}

impl Drop for CueEngine {
    fn drop(&mut self) {
        self.loader.abort();
        let _ = self.sender.send(PlayerCommand::Shutdown);
    }
}

#[async_trait]
impl CuePlayer for CueEngine {
    async fn play(&self) -> TimerResult<()> {
        let (tx, rx) = oneshot::channel();
        self.send(PlayerCommand::Play(tx))?;
        rx.await
            .map_err(|_| TimerError::Audio("Audio thread dropped play request".to_string()))?
    }

    fn pause(&self) -> TimerResult<()> {
        self.send(PlayerCommand::Pause)
    }

    fn seek(&self, position: Duration) -> TimerResult<()> {
        self.send(PlayerCommand::Seek(position))
    }

    fn name(&self) -> &str {
        "rodio"
    }
}

fn audio_thread(
    receiver: mpsc::Receiver<PlayerCommand>,
    events: async_mpsc::UnboundedSender<PlayerEvent>,
) {
    // Initialize audio output on this thread; the stream must outlive the sink.
    let (_stream, sink, output_error) = match OutputStream::try_default() {
        Ok((stream, handle)) => match Sink::try_new(&handle) {
            Ok(sink) => (Some(stream), Some(sink), None),
            Err(e) => {
                error!("❌ Failed to create audio sink: {}", e);
                (Some(stream), None, Some(e.to_string()))
            }
        },
        Err(e) => {
            warn!("🔇 Failed to initialize audio output: {}", e);
            (None, None, Some(e.to_string()))
        }
    };

    if let Some(reason) = &output_error {
        let _ = events.send(PlayerEvent::Error(format!("No audio output: {}", reason)));
    }

    let mut playback = Playback::new(sink, output_error, events);

    info!("🔊 Audio thread started");
    let mut last_tick = Instant::now();

    loop {
        match receiver.recv_timeout(TICK) {
            Ok(PlayerCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Ok(cmd) => playback.handle(cmd),
            Err(RecvTimeoutError::Timeout) => {}
        }

        if last_tick.elapsed() >= TICK {
            playback.tick();
            last_tick = Instant::now();
        }
    }

    if let Some(sink) = &playback.sink {
        sink.stop();
    }
    info!("🔇 Audio thread stopped");
}

/// Playback state owned by the audio thread
struct Playback {
    sink: Option<Sink>,
    output_error: Option<String>,
    clip: ClipState,
    duration: Option<Duration>,
    /// A decoded clip is appended to the sink and has not drained yet
    queued: bool,
    /// Playback was requested and not paused since
    active: bool,
    /// Position to seek to once the clip is next appended
    start_at: Duration,
    /// Play requests issued before the clip finished loading
    waiting: Vec<oneshot::Sender<TimerResult<()>>>,
    events: async_mpsc::UnboundedSender<PlayerEvent>,
}

impl Playback {
    fn new(
        sink: Option<Sink>,
        output_error: Option<String>,
        events: async_mpsc::UnboundedSender<PlayerEvent>,
    ) -> Self {
        Self {
            sink,
            output_error,
            clip: ClipState::Loading,
            duration: None,
            queued: false,
            active: false,
            start_at: Duration::ZERO,
            waiting: Vec::new(),
            events,
        }
    }

    fn handle(&mut self, cmd: PlayerCommand) {
        match cmd {
            PlayerCommand::Loaded(result) => self.on_loaded(result),
            PlayerCommand::Play(reply) => {
                if matches!(self.clip, ClipState::Loading) {
                    debug!("⏳ Play requested before clip loaded, deferring");
                    self.waiting.push(reply);
                } else {
                    let _ = reply.send(self.play());
                }
            }
            PlayerCommand::Pause => {
                debug!("⏸️ Pausing cue");
                if let Some(sink) = &self.sink {
                    sink.pause();
                }
                self.active = false;
            }
            PlayerCommand::Seek(position) => self.seek(position),
            PlayerCommand::Shutdown => {}
        }
    }

    fn on_loaded(&mut self, result: TimerResult<Clip>) {
        match result {
            Ok(clip) => {
                self.duration = clip.duration();
                self.emit(PlayerEvent::Loaded {
                    duration: self.duration,
                });
                self.clip = ClipState::Ready(clip);
            }
            Err(e) => {
                error!("❌ Failed to load cue clip: {}", e);
                self.emit(PlayerEvent::Error(e.to_string()));
                self.clip = ClipState::Failed(e.to_string());
            }
        }

        let waiting = std::mem::take(&mut self.waiting);
        for reply in waiting {
            let _ = reply.send(self.play());
        }
    }

    fn play(&mut self) -> TimerResult<()> {
        let clip = match &self.clip {
            ClipState::Ready(clip) => clip,
            ClipState::Failed(reason) => {
                return Err(TimerError::Playback(format!("Clip unavailable: {}", reason)))
            }
            ClipState::Loading => {
                return Err(TimerError::Playback("Clip still loading".to_string()))
            }
        };

        let Some(sink) = self.sink.as_ref() else {
            let reason = self.output_error.clone().unwrap_or_default();
            return Err(TimerError::Audio(format!("No audio output: {}", reason)));
        };

        if !self.queued {
            let source = Decoder::new(clip.reader())
                .map_err(|e| TimerError::Playback(format!("Cannot decode clip: {}", e)))?;
            if self.duration.is_none() {
                self.duration = source.total_duration();
            }
            sink.append(source);
            self.queued = true;

            if !self.start_at.is_zero() {
                if let Err(e) = sink.try_seek(self.start_at) {
                    warn!("⚠️ Could not seek cue to {:?}: {}", self.start_at, e);
                }
            }
            self.start_at = Duration::ZERO;
        }

        sink.play();
        self.active = true;
        debug!("▶️ Cue playing");
        Ok(())
    }

    fn seek(&mut self, position: Duration) {
        if !self.queued {
            self.start_at = position;
            return;
        }
        let Some(sink) = &self.sink else {
            return;
        };

        if position.is_zero() {
            // Dropping the queued source is the one rewind every decoder supports.
            sink.clear();
            self.queued = false;
            self.active = false;
            self.start_at = Duration::ZERO;
        } else if let Err(e) = sink.try_seek(position) {
            warn!("⚠️ Could not seek cue to {:?}: {}", position, e);
        }
    }

    fn tick(&mut self) {
        let Some(sink) = &self.sink else {
            return;
        };
        if !self.queued {
            return;
        }

        if sink.empty() {
            self.queued = false;
            if let Some(duration) = self.duration {
                self.emit(PlayerEvent::TimeUpdate {
                    position: duration,
                    duration: Some(duration),
                });
            }
            if self.active {
                self.active = false;
                debug!("🏁 Cue ended");
                self.emit(PlayerEvent::Ended);
            }
            return;
        }

        if !sink.is_paused() {
            let position = sink.get_pos();
            self.emit(PlayerEvent::TimeUpdate {
                position,
                duration: self.duration,
            });
        }
    }

    fn emit(&self, event: PlayerEvent) {
        if self.events.send(event).is_err() {
            debug!("Player event receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playback(sink: Option<Sink>) -> (Playback, async_mpsc::UnboundedReceiver<PlayerEvent>) {
        let (events, rx) = async_mpsc::unbounded_channel();
        (Playback::new(sink, None, events), rx)
    }

    fn drain(rx: &mut async_mpsc::UnboundedReceiver<PlayerEvent>) -> Vec<PlayerEvent> {
        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event);
        }
        seen
    }

    #[test]
    fn test_play_waits_for_load_then_fails() {
        let (mut playback, mut events) = playback(None);
        let (reply, mut answer) = oneshot::channel();

        playback.handle(PlayerCommand::Play(reply));
        assert!(answer.try_recv().is_err());
        assert_eq!(playback.waiting.len(), 1);

        playback.handle(PlayerCommand::Loaded(Err(TimerError::Clip(
            "connection reset".to_string(),
        ))));
        let result = answer.try_recv().expect("deferred play must be answered");
        assert!(matches!(result, Err(TimerError::Playback(_))));
        assert!(playback.waiting.is_empty());
        assert!(matches!(drain(&mut events).as_slice(), [PlayerEvent::Error(_)]));
    }

    #[test]
    fn test_play_without_output_fails() {
        let (mut playback, _events) = playback(None);
        playback.clip = ClipState::Ready(Clip::new(b"bytes".to_vec()));

        assert!(matches!(playback.play(), Err(TimerError::Audio(_))));
        assert!(!playback.active);
    }

    #[test]
    fn test_seek_before_queue_only_records_position() {
        let (mut playback, mut events) = playback(None);

        playback.seek(Duration::from_secs(5));
        assert_eq!(playback.start_at, Duration::from_secs(5));
        assert!(!playback.queued);
        assert!(!playback.active);
        assert!(drain(&mut events).is_empty());
    }

    #[test]
    fn test_tick_reports_end_only_while_active() {
        let (sink, _queue) = Sink::new_idle();
        let (mut playback, mut events) = playback(Some(sink));
        playback.duration = Some(Duration::from_secs(40));

        // Paused clip drained by a rewind: no Ended
        playback.queued = true;
        playback.active = false;
        playback.tick();
        let seen = drain(&mut events);
        assert!(!seen.contains(&PlayerEvent::Ended));
        assert!(!playback.queued);

        playback.queued = true;
        playback.active = true;
        playback.tick();
        playback.tick();
        let seen = drain(&mut events);
        assert_eq!(
            seen,
            vec![
                PlayerEvent::TimeUpdate {
                    position: Duration::from_secs(40),
                    duration: Some(Duration::from_secs(40)),
                },
                PlayerEvent::Ended,
            ]
        );
        assert!(!playback.active);
    }

    #[test]
    fn test_tick_idle_when_nothing_queued() {
        let (sink, _queue) = Sink::new_idle();
        let (mut playback, mut events) = playback(Some(sink));
        playback.active = true;

        playback.tick();
        assert!(drain(&mut events).is_empty());
    }

    #[tokio::test]
    async fn test_missing_local_clip_fails_play() {
        let source = ClipSource::parse("/nonexistent/workout-cue.mp3");
        let (engine, _events) =
            CueEngine::spawn(source, Duration::from_secs(1)).expect("Failed to spawn engine");

        let result = tokio::time::timeout(Duration::from_secs(10), engine.play())
            .await
            .expect("play must resolve once loading fails");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_stalled_fetch_fails_play() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let url = format!("http://{}/cue.mp3", listener.local_addr().expect("No addr"));
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let (engine, _events) = CueEngine::spawn(ClipSource::parse(&url), Duration::from_millis(300))
            .expect("Failed to spawn engine");

        let result = tokio::time::timeout(Duration::from_secs(10), engine.play())
            .await
            .expect("play must not wait on a server that never answers");
        assert!(result.is_err());
    }
}
