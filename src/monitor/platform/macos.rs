//! macOS change listener using the `SCNetworkReachability` callback.
//!
//! The callback is registered for the watched target and scheduled on a
//! private serial dispatch queue; each invocation is bridged into an
//! async channel. Registration failures surface at listener creation.

use crate::monitor::{ChangeListener, ListenError};
use crate::probe::Target;
use crate::probe::platform::macos::{ScReachability, ffi};
use std::ffi::c_void;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc as tokio_mpsc;
use tokio_stream::Stream;

/// macOS implementation of [`ChangeListener`] using the
/// SystemConfiguration callback facility.
///
/// Unlike the Linux and Windows listeners, the registration is
/// per-target: the framework invokes the callback only when that
/// target's flags change.
pub struct ReachabilityCallbackListener {
    registration: Registration,
    receiver: tokio_mpsc::UnboundedReceiver<Result<(), ListenError>>,
}

impl std::fmt::Debug for ReachabilityCallbackListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReachabilityCallbackListener")
            .finish_non_exhaustive()
    }
}

impl ReachabilityCallbackListener {
    /// Creates the listener and registers the native callback.
    ///
    /// # Errors
    ///
    /// - [`ListenError::Handle`] when the reachability reference cannot
    ///   be created for the target
    /// - [`ListenError::UnableToSetCallback`] when callback registration
    ///   is refused
    /// - [`ListenError::UnableToSetDispatchQueue`] when the queue cannot
    ///   be attached
    pub fn new(target: &Target) -> Result<Self, ListenError> {
        let handle =
            ScReachability::create(target).map_err(|e| ListenError::Handle(e.to_string()))?;

        let (tx, rx) = tokio_mpsc::unbounded_channel();
        let context_ptr = Box::into_raw(Box::new(CallbackContext { sender: tx }));

        let mut context = ffi::SCNetworkReachabilityContext {
            version: 0,
            info: context_ptr.cast::<c_void>(),
            retain: None,
            release: None,
            copy_description: None,
        };

        if !handle.set_callback(Some(reachability_callback), &mut context) {
            // SAFETY: registration failed, so the framework holds no
            // reference to the context.
            drop(unsafe { Box::from_raw(context_ptr) });
            return Err(ListenError::UnableToSetCallback);
        }

        // SAFETY: creating a private serial queue; the label is a valid
        // C string.
        let queue = unsafe {
            ffi::dispatch_queue_create(c"reachability.callback".as_ptr(), std::ptr::null())
        };
        if queue.is_null() || !handle.set_dispatch_queue(queue) {
            handle.clear_callback();
            // SAFETY: the callback is unregistered, so the context is no
            // longer referenced.
            drop(unsafe { Box::from_raw(context_ptr) });
            return Err(ListenError::UnableToSetDispatchQueue);
        }

        Ok(Self {
            registration: Registration {
                handle,
                queue,
                context_ptr,
            },
            receiver: rx,
        })
    }
}

impl ChangeListener for ReachabilityCallbackListener {
    type Stream = ReachabilityEventStream;

    fn into_stream(self) -> Self::Stream {
        ReachabilityEventStream {
            receiver: self.receiver,
            _registration: self.registration,
            terminated: false,
        }
    }
}

/// Stream of change notifications delivered by the framework callback.
pub struct ReachabilityEventStream {
    receiver: tokio_mpsc::UnboundedReceiver<Result<(), ListenError>>,
    /// Held for its `Drop` impl, which unregisters the native callback.
    _registration: Registration,
    terminated: bool,
}

impl std::fmt::Debug for ReachabilityEventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReachabilityEventStream")
            .field("terminated", &self.terminated)
            .finish_non_exhaustive()
    }
}

impl Stream for ReachabilityEventStream {
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

/// RAII wrapper for the native registration.
///
/// Unregisters the callback and queue when dropped, releases the queue,
/// and reclaims the leaked `CallbackContext`.
struct Registration {
    handle: ScReachability,
    queue: ffi::dispatch_queue_t,
    context_ptr: *mut CallbackContext,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.handle.clear_callback();

        // SAFETY: after unregistration the framework no longer invokes
        // the callback, so the queue and context can be reclaimed.
        unsafe {
            ffi::dispatch_release(self.queue);
            drop(Box::from_raw(self.context_ptr));
        }
    }
}

// SAFETY: the registration is only dropped once, and the framework
// allows unregistration from any thread.
unsafe impl Send for Registration {}

/// Context passed to the framework callback.
///
/// Contains the sender half of the channel to deliver notifications.
struct CallbackContext {
    sender: tokio_mpsc::UnboundedSender<Result<(), ListenError>>,
}

/// Callback invoked by the framework on the private dispatch queue.
///
/// # Safety
///
/// `info` must be the `CallbackContext` pointer installed at
/// registration.
unsafe extern "C" fn reachability_callback(
    _target: ffi::SCNetworkReachabilityRef,
    _flags: u32,
    info: *mut c_void,
) {
    if info.is_null() {
        return;
    }

    // SAFETY: info was set by us at registration and points to a valid
    // CallbackContext.
    let context = unsafe { &*(info.cast::<CallbackContext>()) };

    // Send notification through the channel (ignore send errors - the
    // receiver may be dropped)
    let _ = context.sender.send(Ok(()));
}
