//! Hybrid reachability monitor combining platform events with polling.
//!
//! This module provides:
//! - [`HybridMonitor`]: Builder/configuration for hybrid monitoring
//! - [`HybridStream`]: Stream that yields status changes from both sources

mod monitor;
mod stream;

pub use monitor::HybridMonitor;
pub use stream::HybridStream;

#[cfg(test)]
mod stream_tests;
#[cfg(test)]
mod test_fixtures;
