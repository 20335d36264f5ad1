//! Configuration layer for the reachability watcher binary.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority
//! (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command
//!    line
//! 2. **TOML config file** - Values from the configuration file
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! The target is resolved as a pair: if either `--host` or `--address`
//! is given on the command line, the CLI pair replaces the TOML
//! `[target]` section entirely. Naming both a host and an address in
//! the same source is an error. With no target anywhere, the default
//! route is watched.
//!
//! # Boolean Flag Semantics
//!
//! Boolean flags (`--poll-only`, `--no-cellular`) use OR semantics: if
//! enabled in either CLI or TOML, the result is enabled. Flags only
//! enable behavior, they cannot override a TOML `true` back to `false`.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;


pub use cli::{Cli, Command};
pub use error::ConfigError;
pub use toml::{TomlConfig, default_config_template};
pub use validated::{ValidatedConfig, write_default_config};
