//! Polling-based reachability monitor.
//!
//! This module provides:
//! - [`PollingMonitor`]: Builder/configuration for polling-based monitoring
//! - [`PollingStream`]: Stream that yields status change events

mod monitor;
mod stream;

pub use monitor::PollingMonitor;
pub use stream::PollingStream;
