//! Newtype wrappers and type aliases for domain concepts.
//!
//! Trace fields stay plain `i64`/`f64` because the results-file layout
//! fixes their textual form; the aliases here cover configuration-side
//! quantities.

/// Duration or period in microseconds.
pub type TimeUs = u64;

/// Position of a [`Benchmark`](crate::Benchmark) inside the
/// [`Benchmarks`](crate::Benchmarks) collection it was resolved against.
///
/// Only meaningful for that collection. A reloaded or reordered catalog
/// invalidates every index taken from the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BenchmarkIdx(pub usize);
