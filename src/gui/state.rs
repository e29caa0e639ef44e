//! State types for the workout timer GUI

use crate::session::{Session, SessionStatus};

/// Which screen the session calls for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Setup,
    /// Round 1 is being announced; setup stays visible until its cue starts
    Starting,
    Active,
    Completed,
}

impl Screen {
    pub fn for_session(session: &Session) -> Self {
        match session.status() {
            SessionStatus::Setup if session.cue_pending() => Screen::Starting,
            SessionStatus::Setup => Screen::Setup,
            SessionStatus::Playing | SessionStatus::Paused => Screen::Active,
            SessionStatus::Completed => Screen::Completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_follows_session() {
        let mut session = Session::new(1);
        assert_eq!(Screen::for_session(&session), Screen::Setup);

        session.start();
        assert_eq!(Screen::for_session(&session), Screen::Starting);

        let epoch = session.epoch();
        session.announcement_finished(epoch);
        session.playback_started(epoch);
        assert_eq!(Screen::for_session(&session), Screen::Active);

        session.toggle_pause();
        assert_eq!(Screen::for_session(&session), Screen::Active);
        session.toggle_pause();

        session.audio_ended();
        assert_eq!(Screen::for_session(&session), Screen::Completed);
    }
}
