#![allow(dead_code)]

use rt_chains::Trace;

/// Initialize tracing from `RUST_LOG` for the test binary.
///
/// `try_init()` is idempotent: first call in the process succeeds,
/// subsequent calls are silently ignored.
pub fn setup_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Path of a fixture shipped with the crate.
pub fn fixture(rel: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(rel)
}

/// The reference trace used across the codec tests.
pub fn sample_trace() -> Trace {
    Trace {
        id: 1,
        priority: 5,
        length: 10,
        period_us: 20000,
        utilisation: 0.35,
        bcrt_us: 100,
        wcrt_us: 900,
        acrt_us: 400,
        chain_count: 8,
        avg_chain_length: 4,
        seed: 42,
        merge_p: 0.2,
        sync_p: 0.1,
        variance: 1.5,
        ppe: 1,
        executors: 4,
    }
}
