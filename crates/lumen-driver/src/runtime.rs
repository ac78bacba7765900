//! Driver runtime seam for entry point resolution
//!
//! This trait is the boundary between the lazy-binding machinery and the
//! actual CUDA driver. The real implementation ([`crate::libcuda`]) talks
//! to the driver shared library; tests install counting stubs; builds
//! without the `cuda` feature fall back to [`UnavailableRuntime`], which
//! makes every slot resolve to a cached null and hard-fail only on use.

use std::ffi::c_void;
use std::ptr::NonNull;

use crate::error::Result;

/// A resolved driver entry point.
///
/// Wraps the raw address so it can live in the process-wide symbol table.
/// Entry points are code addresses inside the loaded driver image: they are
/// valid for the life of the process and never written through, which is
/// what makes the `Send + Sync` impls below sound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryPoint(NonNull<c_void>);

unsafe impl Send for EntryPoint {}
unsafe impl Sync for EntryPoint {}

impl EntryPoint {
    /// Wrap a raw entry point address. Returns `None` for null.
    pub fn new(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    /// The raw address, for casting to the symbol's native signature.
    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// Interface to the underlying CUDA driver runtime.
///
/// The four operations mirror what the driver itself exposes: a
/// version-aware entry point lookup, a plain by-name lookup for runtimes
/// that predate version-aware resolution, the global init call, and the
/// driver version query. Implementations report failures through
/// [`DriverError`](crate::DriverError); converting those into the
/// soft-failure policy (warn + cached null) is the registry's job, never
/// the runtime's.
pub trait DriverRuntime: Send + Sync {
    /// Resolve `symbol`, accepting any implementation with ABI version
    /// `min_version` or newer.
    ///
    /// `min_version` is a floor, not an exact match: a newer driver
    /// satisfying the floor resolves normally.
    ///
    /// # Errors
    ///
    /// - [`DriverError::VersionedLookupUnsupported`](crate::DriverError::VersionedLookupUnsupported)
    ///   when this runtime cannot do version-aware lookup at all; the
    ///   caller should retry via [`entry_point`](Self::entry_point)
    /// - any other error means the symbol is unavailable
    fn entry_point_by_version(&self, symbol: &str, min_version: u32) -> Result<EntryPoint>;

    /// Resolve `symbol` by name alone (pre-versioned-lookup fallback).
    fn entry_point(&self, symbol: &str) -> Result<EntryPoint>;

    /// The driver's global initialization call (`cuInit`).
    fn init(&self, flags: u32) -> Result<()>;

    /// The driver-reported version (e.g. 12040 for CUDA 12.4).
    fn driver_version(&self) -> Result<i32>;
}

/// Runtime used when no real driver can be reached.
///
/// Built without the `cuda` feature, or when opening the driver library
/// failed at first use. Every lookup fails with the recorded reason, so
/// the registry caches a null for each symbol and diagnostics like
/// `is_available` answer `false` without aborting anything.
pub struct UnavailableRuntime {
    reason: String,
}

impl UnavailableRuntime {
    /// Create a runtime whose every operation fails with `reason`.
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl DriverRuntime for UnavailableRuntime {
    fn entry_point_by_version(&self, _symbol: &str, _min_version: u32) -> Result<EntryPoint> {
        Err(crate::DriverError::DriverNotLoaded(self.reason.clone()))
    }

    fn entry_point(&self, _symbol: &str) -> Result<EntryPoint> {
        Err(crate::DriverError::DriverNotLoaded(self.reason.clone()))
    }

    fn init(&self, _flags: u32) -> Result<()> {
        Err(crate::DriverError::DriverNotLoaded(self.reason.clone()))
    }

    fn driver_version(&self) -> Result<i32> {
        Err(crate::DriverError::DriverNotLoaded(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DriverError;

    #[test]
    fn test_entry_point_rejects_null() {
        assert!(EntryPoint::new(std::ptr::null_mut()).is_none());
    }

    #[test]
    fn test_entry_point_round_trips_address() {
        static TARGET: u8 = 0;
        let raw = &TARGET as *const u8 as *mut c_void;
        let ep = EntryPoint::new(raw).unwrap();
        assert_eq!(ep.as_ptr(), raw);
    }

    #[test]
    fn test_unavailable_runtime_fails_every_operation() {
        let rt = UnavailableRuntime::new("built without the `cuda` feature");

        assert!(matches!(
            rt.entry_point_by_version("cuInit", 11000),
            Err(DriverError::DriverNotLoaded(_))
        ));
        assert!(matches!(rt.entry_point("cuInit"), Err(DriverError::DriverNotLoaded(_))));
        assert!(rt.init(0).is_err());
        assert!(rt.driver_version().is_err());
    }
}
