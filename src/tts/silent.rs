//! Silent engine used when no speech capability is available

use super::TtsEngine;
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

#[derive(Debug, Default)]
pub struct SilentEngine;

impl SilentEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TtsEngine for SilentEngine {
    async fn speak(&self, text: &str, _voice: Option<&str>) -> Result<()> {
        debug!("🔇 (silent) {}", text);
        Ok(())
    }

    fn name(&self) -> &str {
        "silent"
    }
}
