//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Reachability: network connectivity watcher
///
/// Watches a hostname, an IP address, or the default route, and logs
/// every change in reachability status (none / Wi-Fi / cellular).
#[derive(Debug, Parser)]
#[command(name = "reachability")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Hostname to watch (mutually exclusive with --address)
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// IP address to watch (mutually exclusive with --host)
    #[arg(long, value_name = "ADDR")]
    pub address: Option<String>,

    /// Safety-net polling interval in seconds
    #[arg(long = "poll-interval", value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// Disable platform change events, use polling only
    #[arg(long = "poll-only")]
    pub poll_only: bool,

    /// Treat cellular-only paths as unreachable
    #[arg(long = "no-cellular")]
    pub no_cellular: bool,

    /// Path to configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

/// Subcommands for reachability
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "reachability.toml")]
        output: PathBuf,
    },
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }

    /// Returns the configuration file to load, if any.
    ///
    /// An explicit `--config` path always wins; otherwise the
    /// per-user default location is used when a file exists there.
    #[must_use]
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config {
            return Some(path.clone());
        }

        let default = dirs::config_dir()?.join("reachability").join("config.toml");
        default.is_file().then_some(default)
    }
}
