#![allow(dead_code)]

pub mod mock_player;
pub mod mock_tts;

use mock_player::MockPlayer;
use mock_tts::MockTts;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use workout_timer::tts::{Announcer, VoiceCatalog};
use workout_timer::{ControllerHandle, Session, SessionController};

pub const COMPLETION_DELAY: Duration = Duration::from_millis(3000);

/// A running controller wired to mock collaborators
pub struct TestContext {
    pub handle: ControllerHandle,
    pub snapshots: watch::Receiver<Session>,
    pub player: Arc<MockPlayer>,
    pub tts: Arc<MockTts>,
    task: Option<JoinHandle<()>>,
}

impl TestContext {
    pub fn new(rounds: u32) -> Self {
        Self::with_tts(rounds, MockTts::new())
    }

    pub fn with_tts(rounds: u32, tts: MockTts) -> Self {
        let (player, events) = MockPlayer::new();
        let tts = Arc::new(tts);
        let announcer = Announcer::new(tts.clone(), VoiceCatalog::empty(), "google");

        let (controller, handle) = SessionController::new(
            Session::new(rounds),
            player.clone(),
            events,
            Arc::new(announcer),
            COMPLETION_DELAY,
        );
        let snapshots = handle.subscribe();
        let task = controller.spawn();

        Self {
            handle,
            snapshots,
            player,
            tts,
            task: Some(task),
        }
    }

    /// Wait until a published snapshot satisfies `predicate`
    pub async fn wait_for(&mut self, predicate: impl FnMut(&Session) -> bool) -> Session {
        tokio::time::timeout(Duration::from_secs(60), self.snapshots.wait_for(predicate))
            .await
            .expect("timed out waiting for session state")
            .expect("controller stopped")
            .clone()
    }

    /// Wait until the cue for `round` is actually playing
    pub async fn wait_for_round(&mut self, round: u32) -> Session {
        self.wait_for(|s| {
            s.current_round() == round
                && s.status() == workout_timer::SessionStatus::Playing
                && !s.cue_pending()
        })
        .await
    }

    /// Let spawned tasks run without moving the clock
    pub async fn settle(&self) {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    pub fn snapshot(&self) -> Session {
        self.handle.snapshot()
    }

    pub async fn shutdown(mut self) {
        tokio_test::assert_ok!(self.handle.shutdown());
        if let Some(task) = self.task.take() {
            task.await.unwrap();
        }
    }
}
