//! Error types for the monitor layer.

use thiserror::Error;

/// Error type for platform change listeners.
///
/// Represents failures in the native change-notification facility.
/// These errors are recoverable by falling back to polling mode.
#[derive(Debug, Error)]
pub enum ListenError {
    /// Windows API call failed.
    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsApi(#[from] windows::core::Error),

    /// The netlink notification socket could not be opened or read.
    #[cfg(target_os = "linux")]
    #[error("Netlink socket error: {0}")]
    Socket(#[source] std::io::Error),

    /// The native reachability handle could not be created.
    #[cfg(target_os = "macos")]
    #[error("Failed to create reachability handle: {0}")]
    Handle(String),

    /// The reachability callback could not be registered.
    #[cfg(target_os = "macos")]
    #[error("Unable to set reachability callback")]
    UnableToSetCallback,

    /// The callback dispatch queue could not be registered.
    #[cfg(target_os = "macos")]
    #[error("Unable to set callback dispatch queue")]
    UnableToSetDispatchQueue,

    /// The listener stopped unexpectedly.
    ///
    /// This can happen when the underlying event stream terminates
    /// without an explicit shutdown request.
    #[error("Listener stopped unexpectedly")]
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_displays_message() {
        let error = ListenError::Stopped;
        assert_eq!(error.to_string(), "Listener stopped unexpectedly");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn socket_error_preserves_source() {
        use std::error::Error;

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = ListenError::Socket(io);

        assert!(error.to_string().contains("Netlink socket error"));
        assert!(error.source().is_some());
    }
}
