//! Error types for configuration parsing and validation.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for configuration operations.
///
/// Covers errors from parsing, validation, and file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to write configuration file (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Both a host and an address were named in the same source.
    #[error("Conflicting target: specify either a host or an address, not both")]
    ConflictingTarget,

    /// The address could not be parsed.
    #[error("Invalid address '{value}': {source}")]
    InvalidAddress {
        /// The invalid address string
        value: String,
        /// Underlying parse error
        #[source]
        source: std::net::AddrParseError,
    },

    /// The hostname failed validation.
    #[error("Invalid hostname '{value}'")]
    InvalidHostname {
        /// The invalid hostname
        value: String,
    },

    /// Invalid duration value (zero).
    #[error("Invalid duration for {field}: {reason}")]
    InvalidDuration {
        /// Name of the field
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },
}
