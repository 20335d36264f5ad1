//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the
//! codebase.

/// Default safety-net polling interval in seconds.
pub const POLL_INTERVAL_SECS: u64 = 60;

/// Whether cellular-only paths count as reachable by default.
pub const ALLOW_CELLULAR: bool = true;
