//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Watched target configuration section
    #[serde(default)]
    pub target: TargetSection,

    /// Monitoring configuration
    #[serde(default)]
    pub monitor: MonitorSection,
}

/// Watched target configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSection {
    /// Hostname to watch
    pub host: Option<String>,

    /// IP address to watch
    pub address: Option<String>,
}

/// Monitoring configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorSection {
    /// Safety-net polling interval in seconds
    pub poll_interval: Option<u64>,

    /// Disable platform change events, use polling only
    #[serde(default)]
    pub poll_only: bool,

    /// Whether cellular-only paths count as reachable
    pub allow_cellular: Option<bool>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# Reachability Configuration File
# Documentation: https://github.com/doraemonkeys/reachability

[target]
# Hostname to watch. Leave the whole section commented out to watch
# the default route instead.
# host = "example.com"

# IP address to watch (mutually exclusive with host)
# address = "192.0.2.1"

[monitor]
# Safety-net polling interval in seconds (default: 60)
poll_interval = 60

# Disable platform change events, use polling only
# poll_only = false

# Whether cellular-only paths count as reachable (default: true)
# allow_cellular = true
"#
    .to_string()
}
