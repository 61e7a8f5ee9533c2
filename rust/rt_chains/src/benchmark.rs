//! Synthetic benchmark catalog and per-callback work assignments.
//!
//! A catalog is a JSON array of benchmark descriptors:
//!
//! ```json
//! [
//!     { "Name": "matmul", "Execution_time_us": 1500 },
//!     { "Name": "fft", "Execution_time_us": 420 }
//! ]
//! ```
//!
//! Order is preserved exactly as in the document and names are not required
//! to be unique.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{BenchmarkIdx, TimeUs};

/// One benchmark and the nominal cost of a single invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Benchmark {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Execution_time_us")]
    pub execution_time_us: TimeUs,
}

/// How many times a callback invokes one catalog benchmark.
///
/// The benchmark is referenced by its position in the [`Benchmarks`] the
/// work was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Work {
    pub benchmark: BenchmarkIdx,
    pub iterations: u64,
}

/// Errors from loading a benchmark catalog.
#[derive(Debug)]
pub enum CatalogError {
    /// The catalog file could not be read.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The catalog file is not a valid benchmark list.
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Read { path, .. } => {
                write!(f, "failed to read catalog {}", path.display())
            }
            CatalogError::Decode { path, .. } => {
                write!(f, "failed to decode catalog {}", path.display())
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Read { source, .. } => Some(source),
            CatalogError::Decode { source, .. } => Some(source),
        }
    }
}

/// Ordered benchmark catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Benchmarks(Vec<Benchmark>);

impl Benchmarks {
    pub fn new(benchmarks: Vec<Benchmark>) -> Self {
        Self(benchmarks)
    }

    /// Decode a catalog document held in memory.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read the whole catalog at `path` and decode it.
    ///
    /// Nothing is returned unless the entire document decodes.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let benchmarks = Self::from_json(&json).map_err(|source| CatalogError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            path = %path.display(),
            count = benchmarks.len(),
            "loaded benchmark catalog"
        );
        Ok(benchmarks)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, idx: BenchmarkIdx) -> Option<&Benchmark> {
        self.0.get(idx.0)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Benchmark> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Benchmark] {
        &self.0
    }

    /// Index of the first benchmark called `name`.
    pub fn position(&self, name: &str) -> Option<BenchmarkIdx> {
        self.0.iter().position(|b| b.name == name).map(BenchmarkIdx)
    }

    /// Resolve `name` into a work assignment against this catalog.
    pub fn work(&self, name: &str, iterations: u64) -> Option<Work> {
        self.position(name).map(|benchmark| Work {
            benchmark,
            iterations,
        })
    }

    pub fn resolve(&self, work: &Work) -> Option<&Benchmark> {
        self.get(work.benchmark)
    }

    /// Nominal cost of `work` in microseconds, or `None` if its index does
    /// not belong to this catalog. Saturates instead of overflowing.
    pub fn work_cost_us(&self, work: &Work) -> Option<TimeUs> {
        self.resolve(work)
            .map(|b| b.execution_time_us.saturating_mul(work.iterations))
    }
}

impl<'a> IntoIterator for &'a Benchmarks {
    type Item = &'a Benchmark;
    type IntoIter = std::slice::Iter<'a, Benchmark>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
