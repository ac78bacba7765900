//! Benchmark for the resolved-slot fast path
//!
//! Measures what a call through a settled lazy slot costs compared to
//! calling the same function pointer directly, plus the cost of a cached
//! availability probe (which still takes the shared lock).

use std::collections::HashMap;
use std::ffi::c_void;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use lumen_driver::types::{CUresult, CUstream};
use lumen_driver::{api, DriverError, DriverRuntime, EntryPoint};

extern "C" fn stub_cu_stream_synchronize(_stream: CUstream) -> CUresult {
    CUresult::SUCCESS
}

struct BenchRuntime {
    symbols: HashMap<&'static str, usize>,
}

impl BenchRuntime {
    fn new() -> Self {
        let mut symbols = HashMap::new();
        symbols.insert(
            "cuStreamSynchronize",
            stub_cu_stream_synchronize as extern "C" fn(CUstream) -> CUresult as usize,
        );
        Self { symbols }
    }
}

impl DriverRuntime for BenchRuntime {
    fn entry_point_by_version(&self, symbol: &str, _min_version: u32) -> Result<EntryPoint, DriverError> {
        self.symbols
            .get(symbol)
            .and_then(|&address| EntryPoint::new(address as *mut c_void))
            .ok_or_else(|| DriverError::SymbolNotFound { symbol: symbol.to_string() })
    }

    fn entry_point(&self, symbol: &str) -> Result<EntryPoint, DriverError> {
        self.entry_point_by_version(symbol, 0)
    }

    fn init(&self, _flags: u32) -> Result<(), DriverError> {
        Ok(())
    }

    fn driver_version(&self) -> Result<i32, DriverError> {
        Ok(12040)
    }
}

fn benchmark_slot_calls(c: &mut Criterion) {
    lumen_driver::install_runtime(Box::new(BenchRuntime::new())).expect("first install");

    // Settle the slot so every measured call is the fast path.
    let status = unsafe { api::cuStreamSynchronize(std::ptr::null_mut()) };
    assert!(status.is_success());

    c.bench_function("resolved_slot_call", |b| {
        b.iter(|| {
            let status = unsafe { api::cuStreamSynchronize(black_box(std::ptr::null_mut())) };
            black_box(status);
        })
    });

    let direct: extern "C" fn(CUstream) -> CUresult = stub_cu_stream_synchronize;
    c.bench_function("direct_call_baseline", |b| {
        b.iter(|| {
            let status = direct(black_box(std::ptr::null_mut()));
            black_box(status);
        })
    });

    c.bench_function("cached_availability_probe", |b| {
        b.iter(|| {
            let available = lumen_driver::is_available(black_box("cuStreamSynchronize"), 11000);
            black_box(available);
        })
    });
}

criterion_group!(benches, benchmark_slot_calls);
criterion_main!(benches);
