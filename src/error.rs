//! Workout Timer Error Types
//!
//! Centralized error handling for the timer, its player and announcer.

use thiserror::Error;

/// Central error type for the workout timer
#[derive(Error, Debug)]
pub enum TimerError {
    #[error("Audio output error: {0}")]
    Audio(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Clip loading error: {0}")]
    Clip(String),

    #[error("TTS engine error: {0}")]
    Tts(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Controller stopped: {0}")]
    Controller(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for timer operations
pub type TimerResult<T> = Result<T, TimerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TimerError::Playback("device busy".to_string());
        assert_eq!(err.to_string(), "Playback error: device busy");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing clip");
        let err: TimerError = io.into();
        assert!(matches!(err, TimerError::Io(_)));
    }
}
