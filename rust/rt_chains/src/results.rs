//! Results files: one [`Trace`] line per executed chain.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, trace};

use crate::trace::{Trace, TraceParseError};

/// Write `traces` in order, one line each.
pub fn write_traces<'a, W, I>(w: &mut W, traces: I) -> io::Result<()>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = &'a Trace>,
{
    for t in traces {
        t.write_to(w)?;
    }
    Ok(())
}

/// Errors from reading a results stream.
#[derive(Debug)]
pub enum ResultsError {
    /// Reading line `line_no` (1-based) failed, e.g. on invalid UTF-8.
    Io {
        line_no: usize,
        source: io::Error,
    },
    /// A non-blank line is not a valid trace. `line_no` is 1-based.
    Parse {
        line_no: usize,
        source: TraceParseError,
    },
}

impl fmt::Display for ResultsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultsError::Io { line_no, .. } => write!(f, "failed to read line {line_no}"),
            ResultsError::Parse { line_no, .. } => write!(f, "line {line_no}"),
        }
    }
}

impl std::error::Error for ResultsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResultsError::Io { source, .. } => Some(source),
            ResultsError::Parse { source, .. } => Some(source),
        }
    }
}

/// Iterator over the traces of a results stream.
///
/// Blank lines are skipped; every other line must be a complete trace.
/// A line that fails still counts, so iteration can continue past it with
/// correct line numbers.
pub struct TraceReader<R> {
    reader: R,
    buf: String,
    line_no: usize,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            line_no: 0,
        }
    }

    /// 1-based number of the last line read.
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<Trace, ResultsError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => self.line_no += 1,
                Err(source) => {
                    self.line_no += 1;
                    return Some(Err(ResultsError::Io {
                        line_no: self.line_no,
                        source,
                    }));
                }
            }

            if self.buf.trim().is_empty() {
                continue;
            }

            trace!(line_no = self.line_no, "parsing trace");
            return Some(
                self.buf
                    .parse::<Trace>()
                    .map_err(|source| ResultsError::Parse {
                        line_no: self.line_no,
                        source,
                    }),
            );
        }
    }
}

/// Read every trace in the results file at `path`, stopping at the first
/// malformed line.
pub fn read_traces(path: &Path) -> Result<Vec<Trace>> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let traces = TraceReader::new(BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("failed to read traces from {}", path.display()))?;
    debug!(path = %path.display(), count = traces.len(), "loaded traces");
    Ok(traces)
}
