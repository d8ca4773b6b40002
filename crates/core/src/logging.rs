//! Log subscriber setup for plugins

use anyhow::{anyhow, Context};
use tracing_subscriber::EnvFilter;

/// How log output is formatted and filtered.
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Filter directive, e.g. `info` or `bedrock_storage=debug,info`.
    /// `RUST_LOG` takes precedence when set.
    pub directive: String,
    /// Emit one JSON object per event.
    pub json: bool,
    pub ansi: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            directive: "info".to_string(),
            json: false,
            ansi: true,
        }
    }
}

impl LogSettings {
    fn filter(&self) -> anyhow::Result<EnvFilter> {
        match std::env::var(EnvFilter::DEFAULT_ENV) {
            Ok(env) if !env.trim().is_empty() => {
                EnvFilter::try_new(&env).with_context(|| format!("Invalid log filter '{env}'"))
            }
            _ => EnvFilter::try_new(&self.directive)
                .with_context(|| format!("Invalid log filter '{}'", self.directive)),
        }
    }
}

/// Installs the global log subscriber.
///
/// Fails when the filter cannot be parsed or a subscriber is already installed.
pub fn init(settings: &LogSettings) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(settings.filter()?)
        .with_ansi(settings.ansi);

    let result = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow!("Failed to install the log subscriber: {e}"))?;

    tracing::debug!(directive = %settings.directive, json = settings.json, "Logging initialized");
    Ok(())
}
