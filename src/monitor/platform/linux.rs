//! Linux change listener using a netlink route socket.
//!
//! The socket joins the link, address and route multicast groups; every
//! message the kernel publishes there means "network state may have
//! changed". A dedicated blocking reader thread bridges the socket into
//! an async channel.

use crate::monitor::{ChangeListener, ListenError};
use crate::probe::Target;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use tokio::sync::mpsc as tokio_mpsc;
use tokio_stream::Stream;

/// Linux implementation of [`ChangeListener`] using rtnetlink multicast
/// groups.
///
/// The netlink facility is system-wide, so the target is not used for
/// registration; consumers re-probe their own target on every event.
///
/// # One-time Semantics
///
/// Once `into_stream` is called, the listener is consumed. If the stream
/// encounters an error, callers should fall back to polling-only mode
/// rather than attempting to recreate the listener.
#[derive(Debug)]
pub struct NetlinkChangeListener {
    socket: ListenSocket,
}

impl NetlinkChangeListener {
    /// Creates the listener by opening and binding the multicast socket.
    ///
    /// # Errors
    ///
    /// Returns [`ListenError::Socket`] when the socket cannot be opened
    /// or bound - the registration failure is surfaced here, before any
    /// stream exists.
    pub fn new(_target: &Target) -> Result<Self, ListenError> {
        Ok(Self {
            socket: ListenSocket::open()?,
        })
    }
}

impl ChangeListener for NetlinkChangeListener {
    type Stream = NetlinkEventStream;

    fn into_stream(self) -> Self::Stream {
        NetlinkEventStream::spawn(self.socket)
    }
}

/// Stream of change notifications read from the netlink socket.
///
/// Dropping the stream stops the reader thread; the thread notices the
/// stop flag within one receive timeout.
pub struct NetlinkEventStream {
    /// Receiver for notification events
    receiver: tokio_mpsc::UnboundedReceiver<Result<(), ListenError>>,
    /// Tells the reader thread to exit.
    stop: Arc<AtomicBool>,
    /// Whether the stream has terminated due to error
    terminated: bool,
}

impl std::fmt::Debug for NetlinkEventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetlinkEventStream")
            .field("terminated", &self.terminated)
            .finish_non_exhaustive()
    }
}

impl NetlinkEventStream {
    /// Starts the blocking reader thread bridging the socket into an
    /// async channel.
    fn spawn(socket: ListenSocket) -> Self {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));

        let thread_stop = Arc::clone(&stop);
        std::thread::spawn(move || {
            reader_loop(&socket, &thread_stop, &tx);
        });

        Self {
            receiver: rx,
            stop,
            terminated: false,
        }
    }
}

impl Drop for NetlinkEventStream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

impl Stream for NetlinkEventStream {
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

/// Reads the socket until stopped, forwarding one event per message
/// batch.
///
/// Excluded from coverage - requires live kernel netlink traffic.
#[cfg(not(tarpaulin_include))]
fn reader_loop(
    socket: &ListenSocket,
    stop: &AtomicBool,
    tx: &tokio_mpsc::UnboundedSender<Result<(), ListenError>>,
) {
    let mut buf = vec![0u8; 8192];

    while !stop.load(Ordering::SeqCst) {
        match socket.recv(&mut buf) {
            Ok(len) if len > 0 => {
                if tx.send(Ok(())).is_err() {
                    // Receiver dropped, stop bridging
                    break;
                }
            }
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                // Receive timeout: loop back to check the stop flag.
            }
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => {}
            Err(err) => {
                let _ = tx.send(Err(ListenError::Socket(err)));
                break;
            }
        }
    }
}

/// Receive timeout; bounds how long a dropped stream keeps its thread.
const RECV_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(500);

/// A netlink route socket joined to the change multicast groups.
#[derive(Debug)]
struct ListenSocket {
    fd: libc::c_int,
}

impl ListenSocket {
    /// Opens, configures and binds the multicast socket.
    ///
    /// Excluded from coverage - requires a live kernel netlink socket.
    #[cfg(not(tarpaulin_include))]
    fn open() -> Result<Self, ListenError> {
        // SAFETY: plain socket(2) call with constant arguments.
        let fd = unsafe {
            libc::socket(
                libc::AF_NETLINK,
                libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                libc::NETLINK_ROUTE,
            )
        };
        if fd < 0 {
            return Err(ListenError::Socket(std::io::Error::last_os_error()));
        }
        let socket = Self { fd };

        let timeout = libc::timeval {
            tv_sec: RECV_TIMEOUT.as_secs() as libc::time_t,
            tv_usec: libc::suseconds_t::from(RECV_TIMEOUT.subsec_micros()),
        };
        // SAFETY: timeout points to a valid timeval of the given length.
        let rc = unsafe {
            libc::setsockopt(
                socket.fd,
                libc::SOL_SOCKET,
                libc::SO_RCVTIMEO,
                std::ptr::from_ref(&timeout).cast(),
                std::mem::size_of::<libc::timeval>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(ListenError::Socket(std::io::Error::last_os_error()));
        }

        // SAFETY: sockaddr_nl is zero-initialized and valid for bind(2).
        let mut addr: libc::sockaddr_nl = unsafe { std::mem::zeroed() };
        addr.nl_family = libc::AF_NETLINK as libc::sa_family_t;
        addr.nl_groups = (libc::RTMGRP_LINK
            | libc::RTMGRP_IPV4_IFADDR
            | libc::RTMGRP_IPV4_ROUTE
            | libc::RTMGRP_IPV6_IFADDR
            | libc::RTMGRP_IPV6_ROUTE) as u32;

        // SAFETY: addr points to a valid sockaddr_nl of the given length.
        let rc = unsafe {
            libc::bind(
                socket.fd,
                std::ptr::from_ref(&addr).cast::<libc::sockaddr>(),
                std::mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(ListenError::Socket(std::io::Error::last_os_error()));
        }

        Ok(socket)
    }

    /// Excluded from coverage - requires a live kernel netlink socket.
    #[cfg(not(tarpaulin_include))]
    fn recv(&self, buf: &mut [u8]) -> std::io::Result<usize> {
        // SAFETY: buf is a valid mutable slice for the given length.
        let received = unsafe { libc::recv(self.fd, buf.as_mut_ptr().cast(), buf.len(), 0) };
        if received < 0 {
            return Err(std::io::Error::last_os_error());
        }
        // Non-negative after the check above.
        Ok(received.unsigned_abs())
    }
}

impl Drop for ListenSocket {
    fn drop(&mut self) {
        // SAFETY: fd is owned by this socket and closed exactly once.
        unsafe { libc::close(self.fd) };
    }
}

#[cfg(test)]
#[path = "linux_test.rs"]
mod tests;
