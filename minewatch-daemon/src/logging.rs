//! Tracing subscriber setup for minewatch-daemon.
//!
//! Notifications are emitted as `info` events on the `minewatch::notify`
//! target by [`TracingNotifier`](crate::sinks::TracingNotifier). That target
//! is kept at `info` even when `general.log_level` is `warn` or `error`, so
//! quieting the daemon never swallows the chat feed. `RUST_LOG` replaces the
//! whole filter when set.

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use minewatch_core::config::GeneralConfig;

/// Target used for notification events.
pub const NOTIFY_TARGET: &str = "minewatch::notify";

/// Build the level filter from `general.log_level` or an explicit `RUST_LOG` value.
pub fn build_filter(config: &GeneralConfig, rust_log: Option<&str>) -> Result<EnvFilter> {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        return EnvFilter::try_new(directives)
            .map_err(|e| anyhow::anyhow!("invalid RUST_LOG '{}': {}", directives, e));
    }

    let mut directives = config.log_level.clone();
    if matches!(config.log_level.as_str(), "warn" | "error") {
        directives.push_str(&format!(",{NOTIFY_TARGET}=info"));
    }
    EnvFilter::try_new(&directives)
        .map_err(|e| anyhow::anyhow!("invalid log level '{}': {}", config.log_level, e))
}

/// Install the global subscriber. Call once, before the first log line.
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(config, rust_log.as_deref())?;

    let fmt = match config.log_format.as_str() {
        "json" => tracing_subscriber::fmt::layer().json().boxed(),
        "pretty" => tracing_subscriber::fmt::layer().pretty().boxed(),
        other => {
            return Err(anyhow::anyhow!(
                "unknown log format '{}', expected 'json' or 'pretty'",
                other
            ));
        }
    };

    tracing_subscriber::registry()
        .with(fmt.with_filter(filter))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {}", e))
}
