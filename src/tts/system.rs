//! System TTS engine driving speech-dispatcher or espeak-ng

use super::TtsEngine;
use anyhow::Result;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::process::Command;
use tokio::sync::{Mutex, Notify};
use tracing::debug;

/// Command-line speech program found on the system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechProgram {
    SpdSay,
    EspeakNg,
}

impl SpeechProgram {
    fn binary(self) -> &'static str {
        match self {
            Self::SpdSay => "spd-say",
            Self::EspeakNg => "espeak-ng",
        }
    }
}

#[derive(Debug)]
pub struct SystemEngine {
    program: SpeechProgram,
    binary: String,
    /// -100..=100, 0 is the program default
    rate: i32,
    /// -100..=100, 0 is the program default
    pitch: i32,
    interrupt: Notify,
    speaking: AtomicUsize,
    /// A cancel still has to clear the speech-dispatcher queue
    flush_pending: AtomicBool,
    /// Held while flushing; a new utterance waits for it
    flush_lock: Mutex<()>,
}

impl SystemEngine {
    pub fn new(program: SpeechProgram, rate: i32, pitch: i32) -> Self {
        Self {
            program,
            binary: program.binary().to_string(),
            rate: rate.clamp(-100, 100),
            pitch: pitch.clamp(-100, 100),
            interrupt: Notify::new(),
            speaking: AtomicUsize::new(0),
            flush_pending: AtomicBool::new(false),
            flush_lock: Mutex::new(()),
        }
    }

    /// Run a different executable with the same argument conventions
    #[cfg(test)]
    fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Try spd-say (speech-dispatcher), then espeak-ng
    pub async fn detect(rate: i32, pitch: i32) -> Result<Self> {
        for program in [SpeechProgram::SpdSay, SpeechProgram::EspeakNg] {
            let found = Command::new(program.binary())
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
                .is_ok();
            if found {
                debug!("Found system speech program: {}", program.binary());
                return Ok(Self::new(program, rate, pitch));
            }
        }

        Err(anyhow::anyhow!(
            "No system TTS command found (tried spd-say, espeak-ng)"
        ))
    }

    pub fn program(&self) -> SpeechProgram {
        self.program
    }

    /// Clear the dispatcher queue if a cancel asked for it.
    ///
    /// Completes before returning, so a following utterance is never flushed.
    async fn flush_if_pending(&self) {
        let _guard = self.flush_lock.lock().await;
        if !self.flush_pending.swap(false, Ordering::SeqCst) {
            return;
        }
        debug!("🤫 Flushing speech-dispatcher queue");
        let flushed = Command::new(&self.binary)
            .arg("-C")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        if let Err(e) = flushed {
            debug!("Could not flush speech queue: {}", e);
        }
    }

    fn speak_args(&self, text: &str, voice: Option<&str>) -> Vec<String> {
        let mut args = Vec::new();
        match self.program {
            SpeechProgram::SpdSay => {
                args.push("-w".to_string());
                args.extend(["-r".to_string(), self.rate.to_string()]);
                args.extend(["-p".to_string(), self.pitch.to_string()]);
                if let Some(voice) = voice {
                    args.extend(["-y".to_string(), voice.to_string()]);
                }
            }
            SpeechProgram::EspeakNg => {
                let words_per_minute = (175 + self.rate).clamp(80, 450);
                let pitch = (50 + self.pitch / 2).clamp(0, 99);
                args.extend(["-s".to_string(), words_per_minute.to_string()]);
                args.extend(["-p".to_string(), pitch.to_string()]);
                if let Some(voice) = voice {
                    args.extend(["-v".to_string(), voice.to_string()]);
                }
            }
        }
        args.push(text.to_string());
        args
    }
}

#[async_trait]
impl TtsEngine for SystemEngine {
    async fn speak(&self, text: &str, voice: Option<&str>) -> Result<()> {
        debug!("System speaking: {} (voice {:?})", text, voice);
        self.flush_if_pending().await;

        let mut child = Command::new(&self.binary)
            .args(self.speak_args(text, voice))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| anyhow::anyhow!("Failed to spawn {}: {}", self.binary, e))?;

        self.speaking.fetch_add(1, Ordering::SeqCst);
        let interrupted = self.interrupt.notified();
        let result = tokio::select! {
            status = child.wait() => match status {
                Ok(status) if status.success() => Ok(()),
                Ok(status) => Err(anyhow::anyhow!(
                    "{} failed with status {}",
                    self.binary,
                    status
                )),
                Err(e) => Err(e.into()),
            },
            _ = interrupted => {
                debug!("🤫 Utterance interrupted: {}", text);
                let _ = child.kill().await;
                self.flush_if_pending().await;
                Ok(())
            }
        };
        self.speaking.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn voices(&self) -> Result<Vec<String>> {
        let flag = match self.program {
            SpeechProgram::SpdSay => "-L",
            SpeechProgram::EspeakNg => "--voices",
        };
        let output = Command::new(&self.binary)
            .arg(flag)
            .stderr(Stdio::null())
            .output()
            .await?;
        if !output.status.success() {
            return Err(anyhow::anyhow!(
                "{} {} failed with status {}",
                self.binary,
                flag,
                output.status
            ));
        }

        let listing = String::from_utf8_lossy(&output.stdout);
        Ok(match self.program {
            SpeechProgram::SpdSay => parse_spd_voices(&listing),
            SpeechProgram::EspeakNg => parse_espeak_voices(&listing),
        })
    }

    fn cancel(&self) {
        if self.speaking.load(Ordering::SeqCst) == 0 {
            return;
        }
        // Killing the spd-say client does not flush the dispatcher queue.
        if self.program == SpeechProgram::SpdSay {
            self.flush_pending.store(true, Ordering::SeqCst);
        }
        self.interrupt.notify_waiters();
    }

    fn name(&self) -> &str {
        "system"
    }
}

/// Parse `spd-say -L`: a `NAME LANGUAGE VARIANT` header, then one voice per line
fn parse_spd_voices(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter(|name| *name != "NAME")
        .map(str::to_string)
        .collect()
}

/// Parse `espeak-ng --voices`: the voice name is the fourth column
fn parse_espeak_voices(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter(|line| !line.trim_start().starts_with("Pty"))
        .filter_map(|line| line.split_whitespace().nth(3))
        .map(str::to_string)
        .collect()
}
