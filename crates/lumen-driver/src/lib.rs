//! Lazily bound CUDA driver API
//!
//! This crate lets callers use CUDA driver entry points through ordinary
//! call syntax without linking against a specific driver version. Each
//! declared symbol gets a lazy slot: the first invocation resolves the real
//! entry point from the driver (by name and minimum required ABI version),
//! caches it process-wide, and every later invocation is a direct call with
//! no added overhead.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  api (lazy slots)                    │
//! │   one native-signature wrapper per declared symbol   │
//! └───────────────────────┬──────────────────────────────┘
//!                         │ first call only
//!                         ▼
//! ┌──────────────────────────────────────────────────────┐
//! │          SymbolRegistry (one shared mutex)           │
//! │   symbol table + memoized driver version + resolver  │
//! └───────────────────────┬──────────────────────────────┘
//!                         │
//!                         ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              DriverRuntime (trait seam)              │
//! │   LibCudaRuntime (feature "cuda") / installed stub   │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use lumen_driver::{api, types::CUdeviceptr};
//!
//! lumen_driver::initialize();
//!
//! if lumen_driver::is_available("cuMemAlloc", 11000) {
//!     let mut ptr: CUdeviceptr = 0;
//!     let status = unsafe { api::cuMemAlloc(&mut ptr, 1 << 20) };
//!     assert!(status.is_success());
//! }
//! ```
//!
//! Resolution failures are soft: they are logged, cached as null, and only
//! become hard errors when an unresolved slot is actually invoked. This
//! lets capability probes share one cache and one resolution policy with
//! the call path.

pub mod api;
pub mod error;
pub mod registry;
pub mod runtime;
pub mod types;

#[cfg(feature = "cuda")]
pub mod libcuda;

// Re-export public API
pub use api::{SymbolSpec, DECLARED};
pub use error::{DriverError, Result};
pub use registry::{install_runtime, SymbolRegistry, UNKNOWN_VERSION};
pub use runtime::{DriverRuntime, EntryPoint, UnavailableRuntime};

/// Run the driver's global initialization (`cuInit`).
///
/// Idempotent in intent; a non-success status is logged as a warning and
/// swallowed, since the process may never exercise a driver-dependent path.
pub fn initialize() {
    registry::global().init();
}

/// The driver-reported version, memoized after the first successful query.
///
/// Negative means "cannot determine" (not "zero"); a later call retries the
/// underlying query in that case.
pub fn driver_version() -> i32 {
    registry::global().driver_version()
}

/// Whether `symbol` is resolvable with ABI floor `min_version`.
///
/// Shares the symbol table with the lazy slots: probing here never forces a
/// hard failure, and a slot invoked later reuses this probe's outcome
/// instead of re-querying the driver.
pub fn is_available(symbol: &str, min_version: u32) -> bool {
    registry::global().is_available(symbol, min_version)
}
