//! Windows change listener using `NotifyIpInterfaceChange`.
//!
//! The IP Helper API invokes a callback from the system thread pool
//! whenever an IP interface changes; the callback is bridged into an
//! async channel. An interface change is the signal to re-probe the
//! watched target.

use crate::monitor::{ChangeListener, ListenError};
use crate::probe::Target;
use std::pin::Pin;
use std::sync::mpsc;
use std::task::{Context, Poll};
use tokio::sync::mpsc as tokio_mpsc;
use tokio_stream::Stream;
use windows::Win32::Foundation::{HANDLE, NO_ERROR, WIN32_ERROR};
use windows::Win32::NetworkManagement::IpHelper::{
    CancelMibChangeNotify2, MIB_IPINTERFACE_ROW, MIB_NOTIFICATION_TYPE, NotifyIpInterfaceChange,
};
use windows::Win32::Networking::WinSock::AF_UNSPEC;

/// Windows implementation of [`ChangeListener`] using
/// `NotifyIpInterfaceChange`.
///
/// The notification facility is system-wide, so the target is not used
/// for registration; consumers re-probe their own target on every
/// event.
///
/// # One-time Semantics
///
/// Once `into_stream` is called, the listener is consumed. If the stream
/// encounters an error, callers should fall back to polling-only mode
/// rather than attempting to recreate the listener.
#[derive(Debug, Default)]
pub struct IpInterfaceListener {
    _private: (),
}

impl IpInterfaceListener {
    /// Creates a new interface change listener.
    ///
    /// # Errors
    ///
    /// This constructor cannot fail on Windows - registration happens
    /// when the stream is created - but returns `Result` for parity with
    /// the other platform listeners.
    pub const fn new(_target: &Target) -> Result<Self, ListenError> {
        Ok(Self { _private: () })
    }
}

impl ChangeListener for IpInterfaceListener {
    type Stream = IpInterfaceStream;

    fn into_stream(self) -> Self::Stream {
        IpInterfaceStream::new()
    }
}

/// Stream of interface change notifications from the IP Helper API.
///
/// Wraps the `NotifyIpInterfaceChange` callback mechanism, delivering
/// notifications through a tokio channel.
pub struct IpInterfaceStream {
    /// Receiver for notification events
    receiver: tokio_mpsc::UnboundedReceiver<Result<(), ListenError>>,
    /// Handle for cancelling the notification registration.
    /// Used implicitly through its `Drop` impl which calls
    /// `CancelMibChangeNotify2` to clean up the Windows notification.
    #[allow(dead_code)]
    handle: Option<NotificationHandle>,
    /// Whether the stream has terminated due to error
    terminated: bool,
}

impl std::fmt::Debug for IpInterfaceStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpInterfaceStream")
            .field("terminated", &self.terminated)
            .field("has_handle", &self.handle.is_some())
            .finish_non_exhaustive()
    }
}

/// RAII wrapper for the notification handle.
///
/// Automatically cancels the notification registration when dropped,
/// and reclaims the leaked `CallbackContext` to prevent memory/thread
/// leaks.
struct NotificationHandle {
    handle: HANDLE,
    /// Raw pointer to reclaim the leaked `CallbackContext` after
    /// cancellation. Dropping the context closes the channel, allowing
    /// the bridge thread to exit.
    context_ptr: *mut CallbackContext,
}

impl Drop for NotificationHandle {
    fn drop(&mut self) {
        // SAFETY: We own this handle and it was returned by
        // NotifyIpInterfaceChange. CancelMibChangeNotify2 is safe to call
        // once per handle.
        let _ = unsafe { CancelMibChangeNotify2(self.handle) };

        // SAFETY: After CancelMibChangeNotify2 returns, Windows
        // guarantees the callback won't fire again, so we can safely
        // reclaim the context. Dropping the context drops the sender,
        // which closes the channel and lets the bridge thread exit.
        drop(unsafe { Box::from_raw(self.context_ptr) });
    }
}

// SAFETY: The HANDLE is thread-safe for the cancel operation; Windows
// allows CancelMibChangeNotify2 from any thread.
unsafe impl Send for NotificationHandle {}

/// Context passed to the Windows callback.
///
/// Contains the sender half of the channel to deliver notifications.
struct CallbackContext {
    sender: mpsc::Sender<()>,
}

impl IpInterfaceStream {
    /// Registers for IP interface change notifications.
    fn new() -> Self {
        // Sync channel for the callback (called from the Windows thread
        // pool)
        let (sync_tx, sync_rx) = mpsc::channel::<()>();

        // Async channel for the stream consumer
        let (async_tx, async_rx) = tokio_mpsc::unbounded_channel();

        // Bridge thread: sync -> async, runs until either side closes
        let bridge_tx = async_tx.clone();
        std::thread::spawn(move || {
            while sync_rx.recv().is_ok() {
                if bridge_tx.send(Ok(())).is_err() {
                    // Receiver dropped, stop bridging
                    break;
                }
            }
        });

        let (handle, terminated) = match register_notification(sync_tx) {
            Ok((h, ctx_ptr)) => (
                Some(NotificationHandle {
                    handle: h,
                    context_ptr: ctx_ptr,
                }),
                false,
            ),
            Err(e) => {
                // Send the error and mark as terminated
                let _ = async_tx.send(Err(e));
                (None, true)
            }
        };

        Self {
            receiver: async_rx,
            handle,
            terminated,
        }
    }
}

impl Stream for IpInterfaceStream {
    type Item = Result<(), ListenError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.terminated {
            return Poll::Ready(None);
        }

        match Pin::new(&mut self.receiver).poll_recv(cx) {
            Poll::Ready(Some(Ok(()))) => Poll::Ready(Some(Ok(()))),
            Poll::Ready(Some(Err(e))) => {
                self.terminated = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                // Channel closed unexpectedly
                self.terminated = true;
                Poll::Ready(Some(Err(ListenError::Stopped)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Registers for IP interface change notifications.
///
/// Returns both the notification handle and the context pointer, so the
/// caller can store them together and reclaim the context when
/// cancelling.
///
/// # Coverage Note
///
/// Excluded from coverage: requires actual Windows API interaction, and
/// callback testing requires triggering real network changes.
#[cfg(not(tarpaulin_include))]
fn register_notification(
    sender: mpsc::Sender<()>,
) -> Result<(HANDLE, *mut CallbackContext), ListenError> {
    // Leak the context so it lives for the lifetime of the notification.
    // The caller reclaims it after cancellation.
    let context_ptr = Box::into_raw(Box::new(CallbackContext { sender }));
    let void_ptr = context_ptr.cast::<std::ffi::c_void>();

    let mut handle = HANDLE::default();

    // SAFETY: valid callback and context; the callback fires from the
    // Windows thread pool on interface changes. InitialNotification =
    // false means no callback on registration.
    let result = unsafe {
        NotifyIpInterfaceChange(
            AF_UNSPEC,
            Some(interface_change_callback),
            Some(void_ptr),
            false,
            &raw mut handle,
        )
    };

    if result != NO_ERROR {
        // SAFETY: registration failed, so Windows won't call the
        // callback; reclaim the leaked context.
        drop(unsafe { Box::from_raw(context_ptr) });
        return Err(windows::core::Error::from(WIN32_ERROR(result.0)).into());
    }

    Ok((handle, context_ptr))
}

/// Callback function for `NotifyIpInterfaceChange`.
///
/// # Safety
///
/// - `caller_context` must be a valid pointer to `CallbackContext`
/// - `row` may be null and is not used
///
/// # Coverage Note
///
/// Excluded from coverage: only called by Windows.
#[cfg(not(tarpaulin_include))]
unsafe extern "system" fn interface_change_callback(
    caller_context: *const std::ffi::c_void,
    _row: *const MIB_IPINTERFACE_ROW,
    _notification_type: MIB_NOTIFICATION_TYPE,
) {
    // SAFETY: caller_context was set by us in register_notification and
    // points to a valid CallbackContext.
    if caller_context.is_null() {
        return;
    }

    let context = unsafe { &*(caller_context.cast::<CallbackContext>()) };

    // Send notification through the channel (ignore send errors - the
    // receiver may be dropped)
    let _ = context.sender.send(());
}
