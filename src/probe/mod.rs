//! Probing the OS for reachability flags.
//!
//! This module provides types and traits for:
//! - Naming what a handle is bound to ([`Target`])
//! - Querying the platform for the current flags ([`FlagsProbe`])
//! - Classifying the egress link ([`LinkKind`])
//! - Error handling ([`ProbeError`])
//! - Platform-specific implementations ([`platform`])

mod target;

pub mod platform;

pub use target::Target;

use thiserror::Error;

use crate::flags::ReachabilityFlags;

/// Error type for flag probing operations.
///
/// Describes what went wrong without dictating recovery strategy.
/// Callers decide how to handle each error variant.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Windows API call failed.
    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsApi(#[from] windows::core::Error),

    /// Permission denied while querying network state.
    #[error("Permission denied: {context}")]
    PermissionDenied {
        /// Additional context about what permission was denied.
        context: String,
    },

    /// Platform-specific error with a generic message.
    #[error("Platform error: {message}")]
    Platform {
        /// Error message describing the platform-specific failure.
        message: String,
    },
}

/// Trait for querying the current reachability flags of a target.
///
/// # Design
///
/// This is the single seam to the operating system. Platform backends
/// implement it in [`platform`]; tests inject mocks to drive the monitor
/// streams deterministically.
///
/// # Example
///
/// ```ignore
/// use reachability::flags::ReachabilityFlags;
/// use reachability::probe::{FlagsProbe, ProbeError, Target};
///
/// struct AlwaysReachable;
///
/// impl FlagsProbe for AlwaysReachable {
///     fn probe(&self, _target: &Target) -> Result<ReachabilityFlags, ProbeError> {
///         Ok(ReachabilityFlags::REACHABLE)
///     }
/// }
/// ```
pub trait FlagsProbe: Send + Sync {
    /// Queries the platform for the current flags of `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the platform query itself fails.
    /// An unreachable target is NOT an error: it yields `Ok` with the
    /// `REACHABLE` bit clear. In particular, a hostname that does not
    /// resolve yields empty flags.
    ///
    /// # Implementation Notes
    ///
    /// - Implementations consult kernel/OS state only; no packets are
    ///   sent toward the target.
    /// - This is a synchronous operation, called from inside the monitor
    ///   streams' `poll_next`.
    fn probe(&self, target: &Target) -> Result<ReachabilityFlags, ProbeError>;
}

impl<T: FlagsProbe + ?Sized> FlagsProbe for std::sync::Arc<T> {
    fn probe(&self, target: &Target) -> Result<ReachabilityFlags, ProbeError> {
        (**self).probe(target)
    }
}

/// Classification of the link a path egresses through.
///
/// Used to decide the cellular flag and, by extension, the Wi-Fi vs
/// cellular status split. Backends that cannot classify report
/// [`LinkKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// A wired link (Ethernet and friends).
    Wired,
    /// A wireless (Wi-Fi) link.
    Wireless,
    /// A cellular (WWAN) link.
    Cellular,
    /// The loopback link.
    Loopback,
    /// Unknown link type.
    Other,
}

impl LinkKind {
    /// Returns true for cellular links.
    #[must_use]
    pub const fn is_cellular(self) -> bool {
        matches!(self, Self::Cellular)
    }

    /// Returns true for the loopback link.
    #[must_use]
    pub const fn is_loopback(self) -> bool {
        matches!(self, Self::Loopback)
    }
}
