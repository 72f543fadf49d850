//! Configuration and CLI argument handling

use std::{path::PathBuf, sync::Arc, time::Duration};
use clap::Parser;

use crate::{
    reconciler::ReconcilerConfig,
    replication::{FileStore, MemoryStore, SnapshotStore},
};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "timer-sync")]
#[command(about = "A session server that keeps shared countdown timers in sync")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Directory for cached session snapshots; kept in memory when omitted
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Display tick period in milliseconds
    #[arg(long, default_value = "100")]
    pub tick_ms: u64,

    /// Minimum spacing between time corrections in milliseconds
    #[arg(long, default_value = "1000")]
    pub correction_ms: u64,

    /// Seconds a session may sit unused before it is closed; 0 keeps sessions open
    #[arg(long, default_value = "600")]
    pub idle_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Tick and correction cadence; the tick period is at least one millisecond
    pub fn reconciler(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            tick_period: Duration::from_millis(self.tick_ms.max(1)),
            correction_interval: Duration::from_millis(self.correction_ms),
        }
    }

    /// Idle timeout for open sessions, if eviction is enabled
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_secs > 0).then(|| Duration::from_secs(self.idle_secs))
    }

    /// Snapshot store selected by `--cache-dir`
    pub fn store(&self) -> Arc<dyn SnapshotStore> {
        match &self.cache_dir {
            Some(dir) => Arc::new(FileStore::new(dir)),
            None => Arc::new(MemoryStore::new()),
        }
    }
}
