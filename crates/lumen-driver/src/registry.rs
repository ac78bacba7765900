//! Process-wide symbol registry for lazy driver binding
//!
//! The registry owns the three pieces of shared state behind the lazy
//! slots: the symbol table (name -> resolved entry point or null), the
//! memoized driver version, and the [`DriverRuntime`] that performs the
//! actual lookups. One `parking_lot::Mutex` guards all of it. The mutex is
//! shared across symbols rather than per-symbol: each symbol is resolved
//! at most once per process, so the lock is only ever contended on first
//! use.
//!
//! Resolution outcomes are cached whether they succeed or fail. A failed
//! lookup leaves a null entry so that repeated probes (or repeated slot
//! invocations) never re-query the driver.

use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{DriverError, Result};
use crate::runtime::{DriverRuntime, EntryPoint, UnavailableRuntime};

/// Sentinel returned by [`SymbolRegistry::driver_version`] when the driver
/// version cannot be determined. Callers must treat any negative value as
/// "unknown", not as "zero".
pub const UNKNOWN_VERSION: i32 = -1;

struct RegistryState {
    /// Resolution outcomes keyed by symbol name. `None` records an attempt
    /// that failed; absent means never attempted.
    entries: HashMap<String, Option<EntryPoint>>,
    /// Memoized driver version; [`UNKNOWN_VERSION`] until the first
    /// successful query.
    driver_version: i32,
}

/// Owner of the shared symbol table, the memoized driver version, and the
/// runtime used to resolve entry points.
///
/// There is one registry per process (see [`install_runtime`] and the
/// crate-level surface), but the type itself is plain state so tests can
/// construct private instances around stub runtimes.
pub struct SymbolRegistry {
    runtime: Box<dyn DriverRuntime>,
    state: Mutex<RegistryState>,
}

impl SymbolRegistry {
    /// Create a registry resolving through `runtime`.
    pub fn new(runtime: Box<dyn DriverRuntime>) -> Self {
        Self {
            runtime,
            state: Mutex::new(RegistryState {
                entries: HashMap::new(),
                driver_version: UNKNOWN_VERSION,
            }),
        }
    }

    /// Resolve `symbol` with ABI floor `min_version`, consulting the cache
    /// first.
    ///
    /// Exactly one runtime query is made per symbol per process, no matter
    /// how many threads race here: the second thread blocks on the lock and
    /// then observes the cached outcome. Failures are soft: logged at warn
    /// level and cached as null; the hard failure belongs to the slot that
    /// eventually tries to call through the null.
    pub fn resolve(&self, symbol: &str, min_version: u32) -> Option<EntryPoint> {
        let mut state = self.state.lock();

        // Fast path: any previous attempt, successful or not, wins.
        if let Some(cached) = state.entries.get(symbol) {
            return *cached;
        }

        // Slow path: first attempt for this symbol.
        let resolved = self.query_runtime(symbol, min_version);
        state.entries.insert(symbol.to_string(), resolved);
        resolved
    }

    /// Whether `symbol` resolves with ABI floor `min_version`.
    ///
    /// Shares the cache and resolution policy with [`resolve`](Self::resolve),
    /// so a probe here and a later slot invocation see the same outcome and
    /// the driver is still queried only once.
    pub fn is_available(&self, symbol: &str, min_version: u32) -> bool {
        self.resolve(symbol, min_version).is_some()
    }

    /// Snapshot of the cached outcome for `symbol`, if resolution has been
    /// attempted. Diagnostic only; never triggers a resolution.
    pub fn cached_entry(&self, symbol: &str) -> Option<Option<EntryPoint>> {
        self.state.lock().entries.get(symbol).copied()
    }

    /// Run the driver's global initialization.
    ///
    /// Non-success is reported as a warning and swallowed: a process that
    /// never exercises a driver-dependent path should not be taken down by
    /// a missing driver.
    pub fn init(&self) {
        let _state = self.state.lock();
        if let Err(err) = self.runtime.init(0) {
            warn!(error = %err, "CUDA driver initialization failed");
        }
    }

    /// The driver-reported version, memoized after the first successful
    /// query.
    ///
    /// On failure returns [`UNKNOWN_VERSION`] without memoizing, so a later
    /// call retries the query.
    pub fn driver_version(&self) -> i32 {
        let mut state = self.state.lock();
        if state.driver_version >= 0 {
            return state.driver_version;
        }

        match self.runtime.driver_version() {
            Ok(version) if version >= 0 => {
                debug!(version, "queried CUDA driver version");
                state.driver_version = version;
                version
            }
            Ok(version) => {
                warn!(version, "CUDA driver reported a negative version");
                UNKNOWN_VERSION
            }
            Err(err) => {
                warn!(error = %err, "failed to query CUDA driver version");
                UNKNOWN_VERSION
            }
        }
    }

    /// One uncached lookup: version-aware first, plain lookup when the
    /// runtime predates version-aware resolution.
    fn query_runtime(&self, symbol: &str, min_version: u32) -> Option<EntryPoint> {
        let attempt = match self.runtime.entry_point_by_version(symbol, min_version) {
            Err(DriverError::VersionedLookupUnsupported) => self.runtime.entry_point(symbol),
            outcome => outcome,
        };

        match attempt {
            Ok(entry) => {
                debug!(symbol, address = ?entry.as_ptr(), "bound CUDA driver symbol");
                Some(entry)
            }
            Err(err) => {
                warn!(symbol, error = %err, "failed to bind CUDA driver symbol");
                None
            }
        }
    }
}

// ================================================================================================
// Process-wide registry
// ================================================================================================

static REGISTRY: OnceLock<SymbolRegistry> = OnceLock::new();

/// Install the runtime the process-wide registry resolves through.
///
/// First-wins: must be called before anything touches a lazy slot,
/// [`crate::initialize`], [`crate::driver_version`], or
/// [`crate::is_available`]. Embedders use this to redirect resolution (and
/// tests use it to install stubs).
///
/// # Errors
///
/// Returns [`DriverError::RuntimeAlreadyInstalled`] once the registry
/// exists, whether from an earlier install or from first use of a slot.
pub fn install_runtime(runtime: Box<dyn DriverRuntime>) -> Result<()> {
    REGISTRY
        .set(SymbolRegistry::new(runtime))
        .map_err(|_| DriverError::RuntimeAlreadyInstalled)
}

/// The process-wide registry, creating it around the default runtime on
/// first use.
pub(crate) fn global() -> &'static SymbolRegistry {
    REGISTRY.get_or_init(|| SymbolRegistry::new(default_runtime()))
}

#[cfg(feature = "cuda")]
fn default_runtime() -> Box<dyn DriverRuntime> {
    match crate::libcuda::LibCudaRuntime::open() {
        Ok(runtime) => Box::new(runtime),
        Err(err) => {
            warn!(error = %err, "CUDA driver library unavailable, driver symbols will not resolve");
            Box::new(UnavailableRuntime::new(err.to_string()))
        }
    }
}

#[cfg(not(feature = "cuda"))]
fn default_runtime() -> Box<dyn DriverRuntime> {
    Box::new(UnavailableRuntime::new(
        "lumen-driver was built without the `cuda` feature",
    ))
}
