//! Real driver runtime over the CUDA driver shared library
//!
//! Opens the driver with `libloading` and resolves entry points through the
//! driver's own `cuGetProcAddress` family, which is what makes version-aware
//! lookup possible: the driver picks the implementation matching the
//! requested ABI floor. Drivers that predate `cuGetProcAddress` (pre-11.3)
//! still work through plain symbol lookup, with the floor unenforceable.
//!
//! Compiled only with the `cuda` feature; everything else in the crate is
//! driver-agnostic and testable without an NVIDIA stack.

use std::ffi::{c_char, c_int, c_void, CString};

use libloading::Library;
use tracing::debug;

use crate::error::{DriverError, Result};
use crate::runtime::{DriverRuntime, EntryPoint};
use crate::types::CUresult;

/// `cuGetProcAddress_v2` (CUDA 12+). The trailing out-param reports why a
/// lookup failed (symbol absent vs. version floor not satisfied).
type GetProcAddressV2 =
    unsafe extern "C" fn(*const c_char, *mut *mut c_void, c_int, u64, *mut c_int) -> CUresult;

/// `cuGetProcAddress` (CUDA 11.3 .. 12.0), without the query-result param.
type GetProcAddressV1 = unsafe extern "C" fn(*const c_char, *mut *mut c_void, c_int, u64) -> CUresult;

/// `CU_GET_PROC_ADDRESS_DEFAULT`
const GET_PROC_ADDRESS_DEFAULT: u64 = 0;

/// `CU_GET_PROC_ADDRESS_VERSION_NOT_SUFFICIENT` from
/// `CUdriverProcAddressQueryResult`.
const QUERY_VERSION_NOT_SUFFICIENT: c_int = 2;

#[derive(Clone, Copy)]
enum ProcAddress {
    V2(GetProcAddressV2),
    V1(GetProcAddressV1),
}

/// Driver runtime bound to the real CUDA driver library.
pub struct LibCudaRuntime {
    /// Keeps the driver image mapped; every resolved pointer lives inside it.
    library: Library,
    /// Version-aware lookup entry, when this driver has one.
    proc_address: Option<ProcAddress>,
}

#[cfg(target_os = "linux")]
const LIBRARY_CANDIDATES: &[&str] = &["libcuda.so.1", "libcuda.so"];
#[cfg(target_os = "windows")]
const LIBRARY_CANDIDATES: &[&str] = &["nvcuda.dll"];
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
const LIBRARY_CANDIDATES: &[&str] = &[];

impl LibCudaRuntime {
    /// Open the driver library and probe for version-aware lookup support.
    ///
    /// # Errors
    ///
    /// [`DriverError::DriverNotLoaded`] when no candidate library can be
    /// opened (no driver installed, or an unsupported platform).
    pub fn open() -> Result<Self> {
        let mut last_error = None;
        for candidate in LIBRARY_CANDIDATES {
            // Safety: loading the driver runs its initializers; that is the
            // entire point of this runtime.
            match unsafe { Library::new(candidate) } {
                Ok(library) => {
                    debug!(library = candidate, "opened CUDA driver library");
                    let proc_address = Self::probe_proc_address(&library);
                    return Ok(Self { library, proc_address });
                }
                Err(err) => last_error = Some(err.to_string()),
            }
        }
        Err(DriverError::DriverNotLoaded(match last_error {
            Some(err) => err,
            None => "no CUDA driver library candidates for this platform".to_string(),
        }))
    }

    /// Find `cuGetProcAddress_v2`, then `cuGetProcAddress`, else none.
    fn probe_proc_address(library: &Library) -> Option<ProcAddress> {
        // Safety: both signatures are fixed by the driver ABI; the copied
        // fn pointers stay valid for as long as `library` stays mapped,
        // and the runtime owns the library for its whole life.
        unsafe {
            if let Ok(symbol) = library.get::<GetProcAddressV2>(b"cuGetProcAddress_v2\0") {
                return Some(ProcAddress::V2(*symbol));
            }
            if let Ok(symbol) = library.get::<GetProcAddressV1>(b"cuGetProcAddress\0") {
                return Some(ProcAddress::V1(*symbol));
            }
        }
        None
    }

    fn symbol_cstring(symbol: &str) -> Result<CString> {
        CString::new(symbol).map_err(|_| DriverError::symbol_not_found(symbol))
    }
}

impl DriverRuntime for LibCudaRuntime {
    fn entry_point_by_version(&self, symbol: &str, min_version: u32) -> Result<EntryPoint> {
        let Some(proc_address) = &self.proc_address else {
            return Err(DriverError::VersionedLookupUnsupported);
        };

        let name = Self::symbol_cstring(symbol)?;
        let mut entry: *mut c_void = std::ptr::null_mut();

        // Safety: calling the driver's own lookup with a valid NUL-terminated
        // name and out-pointers that live across the call.
        let status = unsafe {
            match *proc_address {
                ProcAddress::V2(lookup) => {
                    let mut query_result: c_int = 0;
                    let status = lookup(
                        name.as_ptr(),
                        &mut entry,
                        min_version as c_int,
                        GET_PROC_ADDRESS_DEFAULT,
                        &mut query_result,
                    );
                    if query_result == QUERY_VERSION_NOT_SUFFICIENT {
                        return Err(DriverError::DriverTooOld {
                            symbol: symbol.to_string(),
                            min_version,
                        });
                    }
                    status
                }
                ProcAddress::V1(lookup) => lookup(
                    name.as_ptr(),
                    &mut entry,
                    min_version as c_int,
                    GET_PROC_ADDRESS_DEFAULT,
                ),
            }
        };

        if !status.is_success() {
            if status == CUresult::ERROR_NOT_FOUND {
                return Err(DriverError::symbol_not_found(symbol));
            }
            return Err(DriverError::call("cuGetProcAddress", status.0));
        }

        EntryPoint::new(entry).ok_or_else(|| DriverError::symbol_not_found(symbol))
    }

    fn entry_point(&self, symbol: &str) -> Result<EntryPoint> {
        let name = Self::symbol_cstring(symbol)?;

        // Safety: a raw pointer symbol is just the loader's address for the
        // name; it is only ever re-typed by a slot with the declared
        // signature.
        let address = unsafe {
            self.library
                .get::<*mut c_void>(name.as_bytes_with_nul())
                .map(|symbol| *symbol)
                .map_err(|_| DriverError::symbol_not_found(symbol))?
        };

        EntryPoint::new(address).ok_or_else(|| DriverError::symbol_not_found(symbol))
    }

    fn init(&self, flags: u32) -> Result<()> {
        type CuInit = unsafe extern "C" fn(u32) -> CUresult;
        let entry = self.entry_point("cuInit")?;

        // Safety: cuInit's signature is fixed by the driver ABI.
        let status = unsafe {
            let call = std::mem::transmute::<*mut c_void, CuInit>(entry.as_ptr());
            call(flags)
        };
        if status.is_success() {
            Ok(())
        } else {
            Err(DriverError::call("cuInit", status.0))
        }
    }

    fn driver_version(&self) -> Result<i32> {
        type CuDriverGetVersion = unsafe extern "C" fn(*mut c_int) -> CUresult;
        let entry = self.entry_point("cuDriverGetVersion")?;

        let mut version: c_int = 0;
        // Safety: out-pointer lives across the call; signature fixed by ABI.
        let status = unsafe {
            let call = std::mem::transmute::<*mut c_void, CuDriverGetVersion>(entry.as_ptr());
            call(&mut version)
        };
        if status.is_success() {
            Ok(version)
        } else {
            Err(DriverError::call("cuDriverGetVersion", status.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These run for real only on a machine with an NVIDIA driver; elsewhere
    // they exercise the open-failure path.

    #[test]
    fn test_open_reports_missing_driver() {
        match LibCudaRuntime::open() {
            Ok(runtime) => {
                // A real driver: the lifecycle calls must round-trip.
                let version = runtime.driver_version().unwrap();
                assert!(version > 0);
                runtime.init(0).unwrap();
            }
            Err(err) => assert!(matches!(err, DriverError::DriverNotLoaded(_))),
        }
    }

    #[test]
    fn test_interior_nul_is_rejected_not_propagated() {
        if let Ok(runtime) = LibCudaRuntime::open() {
            assert!(matches!(
                runtime.entry_point("cu\0Init"),
                Err(DriverError::SymbolNotFound { .. })
            ));
        }
    }
}
