//! CLI argument definitions for minewatch-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use minewatch_core::{MinewatchConfig, RejectedOverride};

/// Minewatch game-server log watcher.
///
/// Tails the server log, extracts player events and hands them to
/// the statistics store and the notification channel.
#[derive(Parser, Debug)]
#[command(name = "minewatch-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to minewatch.toml configuration file.
    #[arg(short, long, default_value = "/etc/minewatch/minewatch.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Load the configuration with full precedence applied, then validate.
    ///
    /// Order: file, environment variables, command-line flags. Validation
    /// runs last so a flag can repair a value the file got wrong.
    ///
    /// Rejected environment values are returned instead of logged because
    /// tracing is not initialized yet when this runs.
    pub async fn load_config(&self) -> Result<(MinewatchConfig, Vec<RejectedOverride>)> {
        let mut config = MinewatchConfig::from_file(&self.config)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load {}: {}", self.config.display(), e))?;
        let rejected = config.apply_env_overrides();
        self.apply_overrides(&mut config);
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
        Ok((config, rejected))
    }

    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut MinewatchConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.clone();
        }
    }
}
