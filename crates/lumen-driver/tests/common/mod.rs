//! Shared stub driver runtime for integration tests
//!
//! Each integration test binary gets its own process, so each one installs
//! its own stub as the process-wide runtime and the static slots resolve
//! against it. The stub hands out addresses of real `extern "C"` functions,
//! which is what lets the lazy slots call all the way through.

#![allow(dead_code)]

use std::collections::HashMap;
use std::ffi::{c_char, c_void};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use lumen_driver::types::{CUresult, CUstream};
use lumen_driver::{DriverError, DriverRuntime, EntryPoint};

/// Observable call counts, shared between the installed stub and the test.
#[derive(Default)]
pub struct StubCounters {
    lookups: Mutex<HashMap<String, usize>>,
    version_queries: AtomicUsize,
    init_calls: AtomicUsize,
}

impl StubCounters {
    /// How many times the runtime was asked to resolve `symbol`.
    pub fn lookups(&self, symbol: &str) -> usize {
        self.lookups.lock().get(symbol).copied().unwrap_or(0)
    }

    pub fn version_queries(&self) -> usize {
        self.version_queries.load(Ordering::SeqCst)
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }
}

/// Stub driver runtime backed by a fixed symbol table.
pub struct StubRuntime {
    /// Symbol name -> address of a callable `extern "C"` function. Stored
    /// as `usize` so the table is `Send + Sync`.
    symbols: HashMap<&'static str, usize>,
    version: i32,
    counters: Arc<StubCounters>,
}

impl StubRuntime {
    pub fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            version: 12040,
            counters: Arc::new(StubCounters::default()),
        }
    }

    /// Declare `symbol` as resolvable to `address`.
    pub fn with_symbol(mut self, symbol: &'static str, address: *const ()) -> Self {
        self.symbols.insert(symbol, address as usize);
        self
    }

    /// Driver version the stub reports. Negative makes the query fail.
    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    pub fn counters(&self) -> Arc<StubCounters> {
        Arc::clone(&self.counters)
    }

    fn lookup(&self, symbol: &str) -> Result<EntryPoint, DriverError> {
        *self.counters.lookups.lock().entry(symbol.to_string()).or_insert(0) += 1;
        match self.symbols.get(symbol) {
            Some(&address) => Ok(EntryPoint::new(address as *mut c_void)
                .expect("stub symbol table never holds null addresses")),
            None => Err(DriverError::SymbolNotFound { symbol: symbol.to_string() }),
        }
    }
}

impl DriverRuntime for StubRuntime {
    fn entry_point_by_version(&self, symbol: &str, _min_version: u32) -> Result<EntryPoint, DriverError> {
        self.lookup(symbol)
    }

    fn entry_point(&self, symbol: &str) -> Result<EntryPoint, DriverError> {
        self.lookup(symbol)
    }

    fn init(&self, _flags: u32) -> Result<(), DriverError> {
        self.counters.init_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn driver_version(&self) -> Result<i32, DriverError> {
        self.counters.version_queries.fetch_add(1, Ordering::SeqCst);
        if self.version >= 0 {
            Ok(self.version)
        } else {
            Err(DriverError::Call { call: "cuDriverGetVersion", code: 3 })
        }
    }
}

// ================================================================================================
// Callable stub entry points
// ================================================================================================

/// Deterministic error-name string handed out by [`stub_cu_get_error_name`].
pub const STUB_ERROR_NAME: &[u8] = b"CUDA_ERROR_STUB\0";

pub extern "C" fn stub_cu_init(_flags: u32) -> CUresult {
    CUresult::SUCCESS
}

pub extern "C" fn stub_cu_get_error_name(_error: CUresult, pstr: *mut *const c_char) -> CUresult {
    unsafe {
        *pstr = STUB_ERROR_NAME.as_ptr() as *const c_char;
    }
    CUresult::SUCCESS
}

pub extern "C" fn stub_cu_stream_synchronize(_stream: CUstream) -> CUresult {
    CUresult::SUCCESS
}

/// Address of a callable stub, in the form the symbol table wants.
pub fn address_of_init() -> *const () {
    stub_cu_init as extern "C" fn(u32) -> CUresult as *const ()
}

pub fn address_of_get_error_name() -> *const () {
    stub_cu_get_error_name as extern "C" fn(CUresult, *mut *const c_char) -> CUresult as *const ()
}

pub fn address_of_stream_synchronize() -> *const () {
    stub_cu_stream_synchronize as extern "C" fn(CUstream) -> CUresult as *const ()
}
