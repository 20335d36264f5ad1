//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the watcher binary. All validation is performed during
//! construction.

use std::fmt;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use crate::probe::Target;

use super::cli::Cli;
use super::defaults;
use super::error::ConfigError;
use super::toml::{TargetSection, TomlConfig};

/// Fully validated configuration ready for use by the watcher.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and
/// optional TOML config. The function validates all inputs and returns
/// errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// What to watch
    pub target: Target,

    /// Safety-net polling interval
    pub poll_interval: Duration,

    /// Whether to use polling only (no platform events)
    pub poll_only: bool,

    /// Whether cellular-only paths count as reachable
    pub allow_cellular: bool,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config {{ target: {}, poll_interval: {}s, poll_only: {}, allow_cellular: {} }}",
            self.target,
            self.poll_interval.as_secs(),
            self.poll_only,
            self.allow_cellular,
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional
    /// TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Both a host and an address are named in the same source
    /// - The address does not parse
    /// - The hostname is empty or contains whitespace
    /// - The polling interval is zero
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let target = Self::resolve_target(cli, toml)?;
        let poll_interval = Self::resolve_poll_interval(cli, toml)?;

        // Boolean flags: OR semantics (CLI can enable, not disable)
        let poll_only = cli.poll_only || toml.is_some_and(|t| t.monitor.poll_only);
        let allow_cellular = if cli.no_cellular {
            false
        } else {
            toml.and_then(|t| t.monitor.allow_cellular)
                .unwrap_or(defaults::ALLOW_CELLULAR)
        };

        Ok(Self {
            target,
            poll_interval,
            poll_only,
            allow_cellular,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config
    /// file.
    ///
    /// An explicit `--config` path is always loaded; otherwise the
    /// per-user default location is consulted when present.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = match cli.config_path() {
            Some(path) => Some(TomlConfig::load(&path)?),
            None => None,
        };

        Self::from_raw(cli, toml.as_ref())
    }

    /// Resolves the target: the CLI pair wins entirely when either half
    /// is given; with no target anywhere the default route is watched.
    fn resolve_target(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Target, ConfigError> {
        if cli.host.is_some() || cli.address.is_some() {
            return make_target(cli.host.as_deref(), cli.address.as_deref());
        }

        match toml.map(|t| &t.target) {
            Some(TargetSection { host, address }) => {
                make_target(host.as_deref(), address.as_deref())
            }
            None => Ok(Target::DefaultRoute),
        }
    }

    fn resolve_poll_interval(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Duration, ConfigError> {
        let secs = cli
            .poll_interval
            .or_else(|| toml.and_then(|t| t.monitor.poll_interval))
            .unwrap_or(defaults::POLL_INTERVAL_SECS);

        if secs == 0 {
            return Err(ConfigError::InvalidDuration {
                field: "poll_interval",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Duration::from_secs(secs))
    }
}

/// Builds a target from an optional host/address pair.
fn make_target(host: Option<&str>, address: Option<&str>) -> Result<Target, ConfigError> {
    match (host, address) {
        (Some(_), Some(_)) => Err(ConfigError::ConflictingTarget),
        (Some(host), None) => {
            if host.is_empty() || host.contains(char::is_whitespace) {
                return Err(ConfigError::InvalidHostname {
                    value: host.to_string(),
                });
            }
            Ok(Target::Host(host.to_string()))
        }
        (None, Some(address)) => {
            let parsed: IpAddr = address.parse().map_err(|source| ConfigError::InvalidAddress {
                value: address.to_string(),
                source,
            })?;
            Ok(Target::Address(parsed))
        }
        (None, None) => Ok(Target::DefaultRoute),
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns [`ConfigError::FileWrite`] when the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    std::fs::write(path, super::toml::default_config_template()).map_err(|e| {
        ConfigError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        }
    })
}
