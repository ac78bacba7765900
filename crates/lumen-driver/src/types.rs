//! CUDA driver ABI types used by the declared symbol set
//!
//! Only the types that appear in declared signatures live here. They are
//! layout-compatible with the driver's own definitions so that resolved
//! entry points can be called directly through `extern "C"` pointers.

// Driver spellings are kept verbatim; the symbol name is the currency of
// this whole layer.
#![allow(non_camel_case_types)]

use std::ffi::c_void;

/// Status code returned by every CUDA driver call.
///
/// Layout-identical to the driver's `CUresult` enum, which is a plain
/// C `int`. Wrappers return it unmodified; interpreting anything beyond
/// success/failure is the caller's business.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CUresult(pub i32);

impl CUresult {
    /// `CUDA_SUCCESS`
    pub const SUCCESS: CUresult = CUresult(0);
    /// `CUDA_ERROR_INVALID_VALUE`
    pub const ERROR_INVALID_VALUE: CUresult = CUresult(1);
    /// `CUDA_ERROR_NOT_INITIALIZED`
    pub const ERROR_NOT_INITIALIZED: CUresult = CUresult(3);
    /// `CUDA_ERROR_NOT_FOUND`
    pub const ERROR_NOT_FOUND: CUresult = CUresult(500);
    /// `CUDA_ERROR_NOT_SUPPORTED`
    pub const ERROR_NOT_SUPPORTED: CUresult = CUresult(801);

    /// Whether this status is `CUDA_SUCCESS`.
    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }
}

/// Device ordinal handle (`CUdevice`).
pub type CUdevice = i32;

/// Device pointer (`CUdeviceptr`). 64-bit on every platform the driver
/// supports today.
pub type CUdeviceptr = u64;

/// `cuuint32_t` / `cuuint64_t` scalar aliases from `cuda.h`.
pub type CUuint32 = u32;
/// See [`CUuint32`].
pub type CUuint64 = u64;

/// Device attribute selector (`CUdevice_attribute`).
pub type CUdevice_attribute = i32;

/// Function attribute selector (`CUfunction_attribute`).
pub type CUfunction_attribute = i32;

// Opaque driver handles. The driver hands these out as pointers to
// incomplete types; all this layer needs is pointer-sized identity.

/// Context handle (`CUcontext`).
pub type CUcontext = *mut c_void;
/// Loaded module handle (`CUmodule`).
pub type CUmodule = *mut c_void;
/// Kernel function handle (`CUfunction`).
pub type CUfunction = *mut c_void;
/// Stream handle (`CUstream`).
pub type CUstream = *mut c_void;

/// Opaque 128-byte tensor map descriptor (`CUtensorMap`).
///
/// The driver requires 64-byte alignment for the descriptor it fills in.
#[repr(C, align(64))]
#[derive(Clone, Copy)]
pub struct CUtensorMap {
    pub opaque: [u64; 16],
}

impl Default for CUtensorMap {
    fn default() -> Self {
        Self { opaque: [0; 16] }
    }
}

impl std::fmt::Debug for CUtensorMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CUtensorMap").finish_non_exhaustive()
    }
}

/// `CUtensorMapDataType` selector.
pub type CUtensorMapDataType = u32;
/// `CUtensorMapInterleave` selector.
pub type CUtensorMapInterleave = u32;
/// `CUtensorMapSwizzle` selector.
pub type CUtensorMapSwizzle = u32;
/// `CUtensorMapL2promotion` selector.
pub type CUtensorMapL2promotion = u32;
/// `CUtensorMapFloatOOBfill` selector.
pub type CUtensorMapFloatOOBfill = u32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curesult_success_check() {
        assert!(CUresult::SUCCESS.is_success());
        assert!(!CUresult::ERROR_NOT_FOUND.is_success());
        assert!(!CUresult(-1).is_success());
    }

    #[test]
    fn test_curesult_is_abi_transparent() {
        // The driver returns a C int; the wrapper must not widen it.
        assert_eq!(std::mem::size_of::<CUresult>(), std::mem::size_of::<i32>());
    }

    #[test]
    fn test_tensor_map_layout() {
        assert_eq!(std::mem::size_of::<CUtensorMap>(), 128);
        assert_eq!(std::mem::align_of::<CUtensorMap>(), 64);
    }
}
