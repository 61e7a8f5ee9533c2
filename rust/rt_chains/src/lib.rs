//! rt_chains - Data model for real-time callback chain scheduling experiments.
//!
//! An experiment generates a random system of callback chains from a set of
//! [`Rules`], runs it on an executor, and records one [`Trace`] per chain
//! with its best, worst and average response times. Callbacks spend their
//! time in synthetic workloads described by a [`Benchmarks`] catalog.
//!
//! This crate holds the shared types and their on-disk formats. Generation,
//! execution and analysis live elsewhere.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use rt_chains::*;
//!
//! let rules = Rules::load(Path::new("configs/baseline.json")).unwrap();
//! let catalog = Benchmarks::load(Path::new("workloads/benchmarks.json")).unwrap();
//! let work = catalog.work("matmul", 10).unwrap();
//! let cost = catalog.work_cost_us(&work).unwrap();
//!
//! let system = SystemParams::from_rules(&rules);
//! let trace = Trace::new(
//!     ChainResult {
//!         id: 0,
//!         priority: 1,
//!         length: 4,
//!         period_us: 20_000,
//!         utilisation: cost as f64 / 20_000.0,
//!         bcrt_us: 100,
//!         wcrt_us: 900,
//!         acrt_us: 400,
//!     },
//!     &system,
//! );
//! trace.write_to(&mut std::io::stdout()).unwrap();
//! ```

pub mod benchmark;
pub mod results;
pub mod rules;
pub mod trace;
pub mod types;

pub use benchmark::{Benchmark, Benchmarks, CatalogError, Work};
pub use results::{read_traces, write_traces, ResultsError, TraceReader};
pub use rules::{LoggingMode, Rules, RulesBuilder, RulesError};
pub use trace::{
    ChainResult, SystemKey, SystemParams, Trace, TraceParseError, TraceParseErrorKind,
};
pub use types::{BenchmarkIdx, TimeUs};
