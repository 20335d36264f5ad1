//! macOS flag probe backed by `SCNetworkReachability`.
//!
//! The SystemConfiguration framework reports path flags directly; this
//! backend maps the OS flag word bit-for-bit onto
//! [`ReachabilityFlags`], which shares the Apple bit layout.

use std::ffi::CString;

use crate::flags::ReachabilityFlags;
use crate::probe::{FlagsProbe, ProbeError, Target};

/// macOS implementation of [`FlagsProbe`] using `SCNetworkReachability`.
///
/// Each probe creates a short-lived reachability reference for the
/// target and reads its flags synchronously. Hostname targets are
/// resolved inside the framework.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigurationProbe {
    _private: (),
}

impl SystemConfigurationProbe {
    /// Creates a new SystemConfiguration probe.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

impl FlagsProbe for SystemConfigurationProbe {
    fn probe(&self, target: &Target) -> Result<ReachabilityFlags, ProbeError> {
        let handle = ScReachability::create(target)?;
        Ok(handle.flags())
    }
}

/// Owned `SCNetworkReachabilityRef`, shared with the macOS listener.
pub(crate) struct ScReachability {
    raw: ffi::SCNetworkReachabilityRef,
}

// SAFETY: SCNetworkReachability is documented as thread-safe; the ref is
// only released once, on Drop.
unsafe impl Send for ScReachability {}
// SAFETY: see Send above.
unsafe impl Sync for ScReachability {}

impl ScReachability {
    /// Creates a reachability reference for the target.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Platform`] when the framework refuses to
    /// create a reference for the target.
    pub(crate) fn create(target: &Target) -> Result<Self, ProbeError> {
        let raw = match target {
            Target::Host(name) => {
                let cname = CString::new(name.as_str()).map_err(|_| ProbeError::Platform {
                    message: format!("hostname contains NUL: {name}"),
                })?;
                // SAFETY: cname is a valid NUL-terminated C string for the
                // duration of the call.
                unsafe {
                    ffi::SCNetworkReachabilityCreateWithName(std::ptr::null(), cname.as_ptr())
                }
            }
            Target::Address(addr) => create_with_address(*addr),
            Target::DefaultRoute => {
                // The zero address asks for the default route.
                let zero = ffi::sockaddr_in::zeroed();
                // SAFETY: zero is a valid sockaddr_in with sin_len set.
                unsafe {
                    ffi::SCNetworkReachabilityCreateWithAddress(
                        std::ptr::null(),
                        std::ptr::from_ref(&zero).cast(),
                    )
                }
            }
        };

        if raw.is_null() {
            return Err(ProbeError::Platform {
                message: format!("SCNetworkReachability creation failed for {target}"),
            });
        }
        Ok(Self { raw })
    }

    /// Reads the current flags; a failed read yields empty flags.
    pub(crate) fn flags(&self) -> ReachabilityFlags {
        let mut raw_flags: u32 = 0;
        // SAFETY: self.raw is a live reachability ref and raw_flags is a
        // valid out-pointer.
        let got = unsafe { ffi::SCNetworkReachabilityGetFlags(self.raw, &mut raw_flags) };
        if got == 0 {
            return ReachabilityFlags::empty();
        }
        ReachabilityFlags::from_bits_truncate(raw_flags)
    }

    /// Registers the change callback; returns false on failure.
    pub(crate) fn set_callback(
        &self,
        callout: ffi::SCNetworkReachabilityCallBack,
        context: &mut ffi::SCNetworkReachabilityContext,
    ) -> bool {
        // SAFETY: self.raw is live; context outlives the registration per
        // the caller's contract.
        unsafe { ffi::SCNetworkReachabilitySetCallback(self.raw, callout, context) != 0 }
    }

    /// Schedules callbacks on the given dispatch queue; returns false on
    /// failure.
    pub(crate) fn set_dispatch_queue(&self, queue: ffi::dispatch_queue_t) -> bool {
        // SAFETY: self.raw is live and queue is a valid dispatch queue.
        unsafe { ffi::SCNetworkReachabilitySetDispatchQueue(self.raw, queue) != 0 }
    }

    /// Unregisters the callback and dispatch queue.
    pub(crate) fn clear_callback(&self) {
        // SAFETY: passing null callback/queue unregisters, per the
        // framework contract.
        unsafe {
            ffi::SCNetworkReachabilitySetCallback(self.raw, None, std::ptr::null_mut());
            ffi::SCNetworkReachabilitySetDispatchQueue(self.raw, std::ptr::null_mut());
        }
    }
}

impl Drop for ScReachability {
    fn drop(&mut self) {
        // SAFETY: raw was returned by a Create call and is released once.
        unsafe { ffi::CFRelease(self.raw.cast()) };
    }
}

/// Creates a reachability reference for a concrete address.
fn create_with_address(addr: std::net::IpAddr) -> ffi::SCNetworkReachabilityRef {
    match addr {
        std::net::IpAddr::V4(v4) => {
            let mut sin = ffi::sockaddr_in::zeroed();
            sin.sin_addr = u32::from_ne_bytes(v4.octets());
            // SAFETY: sin is a valid sockaddr_in with sin_len set.
            unsafe {
                ffi::SCNetworkReachabilityCreateWithAddress(
                    std::ptr::null(),
                    std::ptr::from_ref(&sin).cast(),
                )
            }
        }
        std::net::IpAddr::V6(v6) => {
            let mut sin6 = ffi::sockaddr_in6::zeroed();
            sin6.sin6_addr = v6.octets();
            // SAFETY: sin6 is a valid sockaddr_in6 with sin6_len set.
            unsafe {
                ffi::SCNetworkReachabilityCreateWithAddress(
                    std::ptr::null(),
                    std::ptr::from_ref(&sin6).cast(),
                )
            }
        }
    }
}

/// SystemConfiguration and libdispatch declarations.
#[allow(non_camel_case_types)]
#[allow(non_snake_case)]
pub(crate) mod ffi {
    use core::ffi::{c_char, c_void};

    pub type SCNetworkReachabilityRef = *const c_void;
    pub type CFAllocatorRef = *const c_void;
    pub type Boolean = u8;

    #[repr(C)]
    pub struct dispatch_queue {
        _unused: [u8; 0],
    }
    pub type dispatch_queue_t = *mut dispatch_queue;

    pub type SCNetworkReachabilityCallBack = Option<
        unsafe extern "C" fn(
            target: SCNetworkReachabilityRef,
            flags: u32,
            info: *mut c_void,
        ),
    >;

    #[repr(C)]
    pub struct SCNetworkReachabilityContext {
        pub version: isize,
        pub info: *mut c_void,
        pub retain: Option<unsafe extern "C" fn(*const c_void) -> *const c_void>,
        pub release: Option<unsafe extern "C" fn(*const c_void)>,
        pub copy_description: Option<unsafe extern "C" fn(*const c_void) -> *const c_void>,
    }

    #[repr(C)]
    pub struct sockaddr_in {
        pub sin_len: u8,
        pub sin_family: u8,
        pub sin_port: u16,
        pub sin_addr: u32,
        pub sin_zero: [u8; 8],
    }

    impl sockaddr_in {
        pub const fn zeroed() -> Self {
            Self {
                sin_len: std::mem::size_of::<Self>() as u8,
                sin_family: AF_INET,
                sin_port: 0,
                sin_addr: 0,
                sin_zero: [0; 8],
            }
        }
    }

    #[repr(C)]
    pub struct sockaddr_in6 {
        pub sin6_len: u8,
        pub sin6_family: u8,
        pub sin6_port: u16,
        pub sin6_flowinfo: u32,
        pub sin6_addr: [u8; 16],
        pub sin6_scope_id: u32,
    }

    impl sockaddr_in6 {
        pub const fn zeroed() -> Self {
            Self {
                sin6_len: std::mem::size_of::<Self>() as u8,
                sin6_family: AF_INET6,
                sin6_port: 0,
                sin6_flowinfo: 0,
                sin6_addr: [0; 16],
                sin6_scope_id: 0,
            }
        }
    }

    pub const AF_INET: u8 = 2;
    pub const AF_INET6: u8 = 30;

    #[link(name = "SystemConfiguration", kind = "framework")]
    unsafe extern "C" {
        pub fn SCNetworkReachabilityCreateWithName(
            allocator: CFAllocatorRef,
            nodename: *const c_char,
        ) -> SCNetworkReachabilityRef;
        pub fn SCNetworkReachabilityCreateWithAddress(
            allocator: CFAllocatorRef,
            address: *const c_void,
        ) -> SCNetworkReachabilityRef;
        pub fn SCNetworkReachabilityGetFlags(
            target: SCNetworkReachabilityRef,
            flags: *mut u32,
        ) -> Boolean;
        pub fn SCNetworkReachabilitySetCallback(
            target: SCNetworkReachabilityRef,
            callout: SCNetworkReachabilityCallBack,
            context: *mut SCNetworkReachabilityContext,
        ) -> Boolean;
        pub fn SCNetworkReachabilitySetDispatchQueue(
            target: SCNetworkReachabilityRef,
            queue: dispatch_queue_t,
        ) -> Boolean;
    }

    #[link(name = "CoreFoundation", kind = "framework")]
    unsafe extern "C" {
        pub fn CFRelease(cf: *const c_void);
    }

    #[link(name = "System", kind = "dylib")]
    unsafe extern "C" {
        pub fn dispatch_queue_create(
            label: *const c_char,
            attr: *const c_void,
        ) -> dispatch_queue_t;
        pub fn dispatch_release(object: dispatch_queue_t);
    }
}
