//! Configuration parsing for Team Saver.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Sensible defaults for quick start
//!
//! Every value is passed explicitly into the component that needs it; there
//! is no process-wide configuration accessor.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::model::SearchType;
use crate::pipeline::SaverConfig;

/// Team Saver: buffered, chunked persistence for team records.
#[derive(Parser, Debug, Clone)]
#[command(name = "team-saver")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Operation to run.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read JSON team records from stdin and persist them through the saver
    Ingest,

    /// Create one team immediately
    Create {
        /// Team name
        #[arg(long)]
        name: String,

        /// Team description
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Show a team
    Get {
        /// Team id
        id: u64,
    },

    /// List teams
    List {
        /// Maximum number of teams to return
        #[arg(long, default_value_t = 20)]
        limit: u64,

        /// Number of teams to skip
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },

    /// Replace a team's name and description
    Update {
        /// Team id
        id: u64,

        /// New team name
        #[arg(long)]
        name: String,

        /// New team description
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Search teams by name and description
    Search {
        /// Words to look for
        query: String,

        /// Match mode
        #[arg(long, value_enum, default_value_t = SearchType::Plain)]
        mode: SearchType,
    },

    /// Delete a team
    Remove {
        /// Team id
        id: u64,
    },
}

/// Output format for log lines.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Settings shared by every command.
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Data directory for the SQLite database
    #[arg(short, long, env = "TEAM_SAVER_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "TEAM_SAVER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Buffered teams that trigger an immediate flush
    #[arg(
        long,
        env = "TEAM_SAVER_CAPACITY",
        default_value_t = 100,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub capacity: u64,

    /// Period of the timer-driven flush in milliseconds
    #[arg(
        long,
        env = "TEAM_SAVER_FLUSH_INTERVAL_MS",
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub flush_interval_ms: u64,

    /// Teams written per storage call
    #[arg(
        long,
        env = "TEAM_SAVER_CHUNK_SIZE",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub chunk_size: u64,

    /// Size of the SQLite connection pool
    #[arg(
        long,
        env = "TEAM_SAVER_POOL_SIZE",
        default_value_t = 4,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub pool_size: u32,

    /// Size of the event channel
    #[arg(
        long,
        env = "TEAM_SAVER_EVENT_CHANNEL_SIZE",
        default_value_t = 1024,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub event_channel_size: u64,
}

impl Config {
    /// Saver settings derived from this configuration.
    pub fn saver_config(&self) -> SaverConfig {
        SaverConfig::from_config(self.capacity as usize, self.flush_interval_ms)
    }

    /// Chunk size as used by the flusher and bulk create.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size as usize
    }

    /// Capacity of the event channel.
    pub fn event_channel_size(&self) -> usize {
        self.event_channel_size as usize
    }

    /// Path of the SQLite database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("teams.db")
    }

    /// Create a default configuration for testing.
    #[cfg(test)]
    pub fn test_config(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            log_level: "debug".into(),
            capacity: 2,
            flush_interval_ms: 50,
            chunk_size: 2,
            pool_size: 2,
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            log_level: "info".into(),
            log_format: LogFormat::Text,
            capacity: 100,
            flush_interval_ms: 1000,
            chunk_size: 10,
            pool_size: 4,
            event_channel_size: 1024,
        }
    }
}
