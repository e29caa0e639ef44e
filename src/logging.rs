//! Tracing setup shared by both binaries

use anyhow::Result;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Filter directive used when `RUST_LOG` is not set
pub fn default_directive(verbose: bool, configured: &str) -> String {
    if verbose {
        return "debug".to_string();
    }
    match configured.trim().to_lowercase().as_str() {
        "" => "info".to_string(),
        level => level.to_string(),
    }
}

/// Install the global fmt subscriber. `RUST_LOG` overrides the configured level.
pub fn init(verbose: bool, configured: &str) -> Result<()> {
    let directive = default_directive(verbose, configured);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true, "warn"), "debug");
        assert_eq!(default_directive(false, "WARN"), "warn");
        assert_eq!(default_directive(false, "  "), "info");
    }
}
