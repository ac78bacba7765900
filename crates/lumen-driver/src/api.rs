//! Lazily bound CUDA driver entry points
//!
//! One wrapper per declared symbol, generated from a single table of
//! `(name, minimum driver version, native signature)` entries. Each
//! wrapper keeps the native signature exactly and binds on first call:
//!
//! 1. First invocation consults the process-wide registry under its lock,
//!    which queries the driver at most once per symbol and caches the
//!    outcome (null included).
//! 2. The outcome is memoized in a per-symbol `OnceLock`, so every later
//!    invocation is a lock-free load plus a direct call through the
//!    resolved pointer.
//! 3. Invoking a symbol the driver could not provide aborts the calling
//!    operation with an error naming the symbol.
//!
//! Wrappers keep the driver's own spelling (`cuMemAlloc`, not
//! `cu_mem_alloc`): the symbol name is the cache key, the resolution query,
//! and the name that appears in every diagnostic.
//!
//! The declared set below is the CUDA 12 surface this workspace calls;
//! adding a symbol means adding one line to the table.

use std::ffi::{c_char, c_void};
use std::sync::OnceLock;

use crate::registry::global;
use crate::types::{
    CUcontext, CUdevice, CUdevice_attribute, CUdeviceptr, CUfunction, CUfunction_attribute,
    CUmodule, CUresult, CUstream, CUtensorMap, CUtensorMapDataType, CUtensorMapFloatOOBfill,
    CUtensorMapInterleave, CUtensorMapL2promotion, CUtensorMapSwizzle, CUuint32, CUuint64,
};

/// JIT option selector (`CUjit_option`) for module loading.
#[allow(non_camel_case_types)]
pub type CUjit_option = u32;

/// One row of the static configuration table: a driver symbol and the
/// lowest driver ABI version its declared usage is compatible with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymbolSpec {
    /// Driver symbol name, exactly as exported by the driver library.
    pub name: &'static str,
    /// Version floor passed to the version-aware lookup.
    pub min_version: u32,
}

/// Hard use failure: a slot was invoked but its symbol never resolved.
#[cold]
#[inline(never)]
fn unavailable(symbol: &'static str) -> ! {
    panic!(
        "CUDA driver API '{symbol}' is not available; the installed driver is likely too old \
         for the requested ABI, or the driver library could not be loaded"
    );
}

/// Generates one lazy slot per declared symbol, plus the [`DECLARED`]
/// table the slots are generated from.
///
/// Only the captured name, version floor, and signature vary per entry;
/// the resolution algorithm lives in the registry and is never duplicated.
macro_rules! driver_api {
    ($(
        $(#[$extra:meta])*
        fn $name:ident($($arg:ident: $ty:ty),* $(,)?) -> $ret:ty, since $ver:expr;
    )*) => {
        /// Every declared symbol with its minimum required driver version.
        ///
        /// This is the build-time configuration the lazy slots are
        /// generated from; changing it changes which slots exist, not how
        /// they behave.
        pub const DECLARED: &[SymbolSpec] = &[
            $(SymbolSpec { name: stringify!($name), min_version: $ver },)*
        ];

        $(
            #[doc = concat!("Lazily bound `", stringify!($name), "` driver entry point.")]
            ///
            /// Resolves on first call and calls through the cached pointer
            /// afterwards. Panics if the driver cannot provide the symbol.
            ///
            /// # Safety
            ///
            /// Calls straight into the driver: every pointer and handle
            /// argument must satisfy the driver's documented requirements
            /// for this entry point.
            $(#[$extra])*
            #[allow(non_snake_case)]
            pub unsafe fn $name($($arg: $ty),*) -> $ret {
                type Slot = unsafe extern "C" fn($($ty),*) -> $ret;
                static SLOT: OnceLock<Option<Slot>> = OnceLock::new();

                let resolved = *SLOT.get_or_init(|| {
                    global().resolve(stringify!($name), $ver).map(|entry| {
                        // An entry point is exactly a code address; the
                        // table stores it untyped and the slot re-types it.
                        unsafe { std::mem::transmute::<*mut c_void, Slot>(entry.as_ptr()) }
                    })
                });

                match resolved {
                    Some(call) => call($($arg),*),
                    None => unavailable(stringify!($name)),
                }
            }
        )*
    };
}

driver_api! {
    fn cuDeviceGetAttribute(pi: *mut i32, attrib: CUdevice_attribute, dev: CUdevice) -> CUresult, since 11000;
    fn cuDeviceGetName(name: *mut c_char, len: i32, dev: CUdevice) -> CUresult, since 11000;
    fn cuDriverGetVersion(driver_version: *mut i32) -> CUresult, since 11000;
    fn cuFuncGetAttribute(pi: *mut i32, attrib: CUfunction_attribute, hfunc: CUfunction) -> CUresult, since 11000;
    fn cuFuncSetAttribute(hfunc: CUfunction, attrib: CUfunction_attribute, value: i32) -> CUresult, since 11000;
    fn cuGetErrorName(error: CUresult, pstr: *mut *const c_char) -> CUresult, since 11000;
    fn cuGetErrorString(error: CUresult, pstr: *mut *const c_char) -> CUresult, since 11000;
    fn cuInit(flags: u32) -> CUresult, since 11000;
    fn cuLaunchCooperativeKernel(
        f: CUfunction,
        grid_dim_x: u32,
        grid_dim_y: u32,
        grid_dim_z: u32,
        block_dim_x: u32,
        block_dim_y: u32,
        block_dim_z: u32,
        shared_mem_bytes: u32,
        stream: CUstream,
        kernel_params: *mut *mut c_void,
    ) -> CUresult, since 11000;
    fn cuLaunchKernel(
        f: CUfunction,
        grid_dim_x: u32,
        grid_dim_y: u32,
        grid_dim_z: u32,
        block_dim_x: u32,
        block_dim_y: u32,
        block_dim_z: u32,
        shared_mem_bytes: u32,
        stream: CUstream,
        kernel_params: *mut *mut c_void,
        extra: *mut *mut c_void,
    ) -> CUresult, since 11000;
    fn cuModuleGetFunction(hfunc: *mut CUfunction, hmod: CUmodule, name: *const c_char) -> CUresult, since 11000;
    fn cuModuleLoadDataEx(
        module: *mut CUmodule,
        image: *const c_void,
        num_options: u32,
        options: *mut CUjit_option,
        option_values: *mut *mut c_void,
    ) -> CUresult, since 11000;
    fn cuModuleUnload(hmod: CUmodule) -> CUresult, since 11000;
    fn cuMemGetAddressRange(pbase: *mut CUdeviceptr, psize: *mut usize, dptr: CUdeviceptr) -> CUresult, since 11000;
    fn cuMemAlloc(dptr: *mut CUdeviceptr, bytesize: usize) -> CUresult, since 11000;
    fn cuMemFree(dptr: CUdeviceptr) -> CUresult, since 11000;
    fn cuMemcpyDtoH(dst_host: *mut c_void, src_device: CUdeviceptr, byte_count: usize) -> CUresult, since 11000;
    fn cuMemcpyHtoD(dst_device: CUdeviceptr, src_host: *const c_void, byte_count: usize) -> CUresult, since 11000;
    fn cuMemcpyDtoD(dst_device: CUdeviceptr, src_device: CUdeviceptr, byte_count: usize) -> CUresult, since 11000;
    fn cuOccupancyMaxActiveBlocksPerMultiprocessor(
        num_blocks: *mut i32,
        func: CUfunction,
        block_size: i32,
        dynamic_smem_size: usize,
    ) -> CUresult, since 11000;
    fn cuStreamCreate(stream: *mut CUstream, flags: u32) -> CUresult, since 11000;
    fn cuStreamDestroy(stream: CUstream) -> CUresult, since 11000;
    fn cuStreamSynchronize(stream: CUstream) -> CUresult, since 11000;
    fn cuCtxGetCurrent(pctx: *mut CUcontext) -> CUresult, since 11000;
    fn cuCtxSetCurrent(ctx: CUcontext) -> CUresult, since 11000;
    // CUDA 12 integrated the stream memop v2 entry points into the vanilla
    // names and dropped the NVreg_EnableStreamMemOPs=1 requirement.
    fn cuStreamWaitValue32(stream: CUstream, addr: CUdeviceptr, value: CUuint32, flags: u32) -> CUresult, since 12000;
    fn cuStreamWriteValue32(stream: CUstream, addr: CUdeviceptr, value: CUuint32, flags: u32) -> CUresult, since 12000;
    fn cuTensorMapEncodeTiled(
        tensor_map: *mut CUtensorMap,
        data_type: CUtensorMapDataType,
        rank: u32,
        global_address: *mut c_void,
        global_dim: *const CUuint64,
        global_strides: *const CUuint64,
        box_dim: *const CUuint32,
        element_strides: *const CUuint32,
        interleave: CUtensorMapInterleave,
        swizzle: CUtensorMapSwizzle,
        l2_promotion: CUtensorMapL2promotion,
        oob_fill: CUtensorMapFloatOOBfill,
    ) -> CUresult, since 12000;
    fn cuTensorMapReplaceAddress(tensor_map: *mut CUtensorMap, global_address: *mut c_void) -> CUresult, since 12000;
}
