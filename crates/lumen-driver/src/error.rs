//! Error types for driver binding operations

/// Result type for driver binding operations
pub type Result<T> = std::result::Result<T, DriverError>;

/// Errors that can occur while binding or querying the CUDA driver
///
/// Resolution failures are deliberately *soft*: the registry converts them
/// into warnings plus a cached null entry, and callers only see a hard
/// failure when an unresolved slot is actually invoked.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The driver shared library could not be opened at all
    #[error("CUDA driver library could not be loaded: {0}")]
    DriverNotLoaded(String),

    /// The requested symbol does not exist in the loaded driver
    #[error("symbol '{symbol}' not found in the CUDA driver")]
    SymbolNotFound { symbol: String },

    /// The driver is older than the symbol's minimum required version
    #[error("driver is too old for '{symbol}' (requires driver version >= {min_version})")]
    DriverTooOld { symbol: String, min_version: u32 },

    /// The runtime ABI predates version-aware entry point lookup
    ///
    /// The resolver treats this as "retry with the plain lookup", not as a
    /// terminal failure.
    #[error("version-aware entry point lookup is not supported by this driver")]
    VersionedLookupUnsupported,

    /// A driver status call returned a non-success `CUresult`
    #[error("driver call {call} failed with CUresult({code})")]
    Call { call: &'static str, code: i32 },

    /// `install_runtime` was called after the registry was already built
    #[error("a driver runtime is already installed for this process")]
    RuntimeAlreadyInstalled,
}

impl DriverError {
    /// Create a symbol-not-found error
    pub fn symbol_not_found(symbol: impl Into<String>) -> Self {
        Self::SymbolNotFound { symbol: symbol.into() }
    }

    /// Create an error for a failed driver status call
    pub fn call(call: &'static str, code: i32) -> Self {
        Self::Call { call, code }
    }
}
