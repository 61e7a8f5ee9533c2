//! Per-chain response-time records and their results-file line format.
//!
//! One [`Trace`] is produced for every chain of a generated system. On disk
//! a trace is a single line of 16 space-separated fields, always in this
//! order:
//!
//! ```text
//! id priority length period utilisation bcrt wcrt acrt \
//!     chain_count avg_chain_length seed merge_p sync_p variance ppe executors
//! ```
//!
//! There is no header and no version marker, so the layout must never
//! change. Analysis scripts index the columns positionally.

use std::fmt;
use std::io::{self, Write};
use std::num::{ParseFloatError, ParseIntError};
use std::str::FromStr;

use crate::rules::Rules;

/// Field names in wire order.
pub const TRACE_FIELDS: [&str; 16] = [
    "id",
    "priority",
    "length",
    "period_us",
    "utilisation",
    "bcrt_us",
    "wcrt_us",
    "acrt_us",
    "chain_count",
    "avg_chain_length",
    "seed",
    "merge_p",
    "sync_p",
    "variance",
    "ppe",
    "executors",
];

/// Measured outcome of executing one generated chain.
///
/// The trailing eight fields are a copy of the parameters of the system the
/// chain belonged to (see [`SystemParams`]), so every line of a results
/// file can be interpreted on its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trace {
    /// Chain identifier, unique within a run.
    pub id: i64,
    pub priority: i64,
    /// Number of callbacks in the chain.
    pub length: i64,
    /// Release period in microseconds.
    pub period_us: i64,
    pub utilisation: f64,
    /// Best-case response time in microseconds.
    pub bcrt_us: i64,
    /// Worst-case response time in microseconds.
    pub wcrt_us: i64,
    /// Average response time in microseconds.
    pub acrt_us: i64,
    pub chain_count: i64,
    pub avg_chain_length: i64,
    pub seed: i64,
    pub merge_p: f64,
    pub sync_p: f64,
    pub variance: f64,
    /// 0 or 1.
    pub ppe: i64,
    pub executors: i64,
}

/// Per-chain half of a [`Trace`], as measured by the executor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainResult {
    pub id: i64,
    pub priority: i64,
    pub length: i64,
    pub period_us: i64,
    pub utilisation: f64,
    pub bcrt_us: i64,
    pub wcrt_us: i64,
    pub acrt_us: i64,
}

/// System-level parameters stamped onto every trace of one generated system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemParams {
    pub chain_count: i64,
    pub avg_chain_length: i64,
    pub seed: i64,
    pub merge_p: f64,
    pub sync_p: f64,
    pub variance: f64,
    pub ppe: i64,
    pub executors: i64,
}

/// Identity of a generated system, usable as a map or set key.
///
/// Reals compare by bit pattern, so `0.0` and `-0.0` are different systems
/// and a NaN equals itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemKey([u64; 8]);

impl SystemParams {
    pub fn key(&self) -> SystemKey {
        SystemKey([
            self.chain_count as u64,
            self.avg_chain_length as u64,
            self.seed as u64,
            self.merge_p.to_bits(),
            self.sync_p.to_bits(),
            self.variance.to_bits(),
            self.ppe as u64,
            self.executors as u64,
        ])
    }

    /// Snapshot the parameters a [`Rules`] configuration contributes to its
    /// traces.
    pub fn from_rules(rules: &Rules) -> Self {
        Self {
            chain_count: i64::from(rules.chain_count()),
            avg_chain_length: i64::from(rules.chain_avg_len()),
            seed: rules.random_seed(),
            merge_p: rules.chain_merge_p(),
            sync_p: rules.chain_sync_p(),
            variance: rules.chain_variance(),
            ppe: i64::from(rules.ppe()),
            executors: i64::from(rules.executor_count()),
        }
    }
}

impl Trace {
    /// Combine a chain measurement with the parameters of its system.
    pub fn new(chain: ChainResult, system: &SystemParams) -> Self {
        Self {
            id: chain.id,
            priority: chain.priority,
            length: chain.length,
            period_us: chain.period_us,
            utilisation: chain.utilisation,
            bcrt_us: chain.bcrt_us,
            wcrt_us: chain.wcrt_us,
            acrt_us: chain.acrt_us,
            chain_count: system.chain_count,
            avg_chain_length: system.avg_chain_length,
            seed: system.seed,
            merge_p: system.merge_p,
            sync_p: system.sync_p,
            variance: system.variance,
            ppe: system.ppe,
            executors: system.executors,
        }
    }

    pub fn chain_result(&self) -> ChainResult {
        ChainResult {
            id: self.id,
            priority: self.priority,
            length: self.length,
            period_us: self.period_us,
            utilisation: self.utilisation,
            bcrt_us: self.bcrt_us,
            wcrt_us: self.wcrt_us,
            acrt_us: self.acrt_us,
        }
    }

    pub fn system_params(&self) -> SystemParams {
        SystemParams {
            chain_count: self.chain_count,
            avg_chain_length: self.avg_chain_length,
            seed: self.seed,
            merge_p: self.merge_p,
            sync_p: self.sync_p,
            variance: self.variance,
            ppe: self.ppe,
            executors: self.executors,
        }
    }

    /// Whether BCRT <= ACRT <= WCRT holds.
    ///
    /// Every trace from a correct executor satisfies this. Parsing does not
    /// check it.
    pub fn response_times_ordered(&self) -> bool {
        self.bcrt_us <= self.acrt_us && self.acrt_us <= self.wcrt_us
    }

    /// Write this trace as one newline-terminated results line.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "{self}")
    }

    /// The results line for this trace, including the trailing newline.
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }
}

/// Formats the results line without the trailing newline.
///
/// Reals use the shortest representation that parses back to the same
/// `f64`, always with a decimal point or exponent (`0.35`, `1.0`, `1e-7`).
impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {:?} {} {} {} {} {} {} {:?} {:?} {:?} {} {}",
            self.id,
            self.priority,
            self.length,
            self.period_us,
            self.utilisation,
            self.bcrt_us,
            self.wcrt_us,
            self.acrt_us,
            self.chain_count,
            self.avg_chain_length,
            self.seed,
            self.merge_p,
            self.sync_p,
            self.variance,
            self.ppe,
            self.executors,
        )
    }
}

/// Conversion failure of a single token. The wrapped error is reported
/// through [`TraceParseError`]'s `source()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Int(ParseIntError),
    Real(ParseFloatError),
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::Int(_) => write!(f, "expected integer"),
            FieldError::Real(_) => write!(f, "expected real"),
        }
    }
}

/// What was wrong with a rejected trace line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceParseErrorKind {
    /// The line did not split into exactly 16 tokens.
    FieldCount { found: usize },
    /// A token did not convert to the type of its column.
    Field {
        index: usize,
        name: &'static str,
        source: FieldError,
    },
}

/// A results line that is not a valid [`Trace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceParseError {
    line: String,
    kind: TraceParseErrorKind,
}

impl TraceParseError {
    fn new(line: &str, kind: TraceParseErrorKind) -> Self {
        Self {
            line: line.trim_end_matches(['\r', '\n']).to_string(),
            kind,
        }
    }

    /// The offending input, without its line terminator.
    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn kind(&self) -> &TraceParseErrorKind {
        &self.kind
    }
}

impl fmt::Display for TraceParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TraceParseErrorKind::FieldCount { found } => write!(
                f,
                "malformed trace {:?}: expected {} fields, found {found}",
                self.line,
                TRACE_FIELDS.len()
            ),
            TraceParseErrorKind::Field {
                index,
                name,
                source,
            } => write!(
                f,
                "malformed trace {:?}: field {index} ({name}): {source}",
                self.line
            ),
        }
    }
}

impl std::error::Error for TraceParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            TraceParseErrorKind::Field {
                source: FieldError::Int(e),
                ..
            } => Some(e),
            TraceParseErrorKind::Field {
                source: FieldError::Real(e),
                ..
            } => Some(e),
            TraceParseErrorKind::FieldCount { .. } => None,
        }
    }
}

/// Tokens of one line, converted column by column.
struct Columns<'a> {
    line: &'a str,
    tokens: Vec<&'a str>,
}

impl Columns<'_> {
    fn int(&self, index: usize) -> Result<i64, TraceParseError> {
        self.tokens[index]
            .parse::<i64>()
            .map_err(|e| self.error(index, FieldError::Int(e)))
    }

    fn real(&self, index: usize) -> Result<f64, TraceParseError> {
        self.tokens[index]
            .parse::<f64>()
            .map_err(|e| self.error(index, FieldError::Real(e)))
    }

    fn error(&self, index: usize, source: FieldError) -> TraceParseError {
        TraceParseError::new(
            self.line,
            TraceParseErrorKind::Field {
                index,
                name: TRACE_FIELDS[index],
                source,
            },
        )
    }
}

impl FromStr for Trace {
    type Err = TraceParseError;

    /// Parse one results line. Surrounding whitespace, including the line
    /// terminator, is ignored. Fixed-precision reals (`0.350000`) written by
    /// older tooling are accepted.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = line.split_ascii_whitespace().collect();
        if tokens.len() != TRACE_FIELDS.len() {
            return Err(TraceParseError::new(
                line,
                TraceParseErrorKind::FieldCount {
                    found: tokens.len(),
                },
            ));
        }

        let cols = Columns { line, tokens };
        Ok(Trace {
            id: cols.int(0)?,
            priority: cols.int(1)?,
            length: cols.int(2)?,
            period_us: cols.int(3)?,
            utilisation: cols.real(4)?,
            bcrt_us: cols.int(5)?,
            wcrt_us: cols.int(6)?,
            acrt_us: cols.int(7)?,
            chain_count: cols.int(8)?,
            avg_chain_length: cols.int(9)?,
            seed: cols.int(10)?,
            merge_p: cols.real(11)?,
            sync_p: cols.real(12)?,
            variance: cols.real(13)?,
            ppe: cols.int(14)?,
            executors: cols.int(15)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Trace {
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

    #[test]
    fn test_display_layout() {
        assert_eq!(
            sample().to_line(),
            "1 5 10 20000 0.35 100 900 400 8 4 42 0.2 0.1 1.5 1 4\n"
        );
    }

    #[test]
    fn test_integral_reals_keep_decimal_point() {
        let t = Trace {
            utilisation: 1.0,
            variance: 0.0,
            ..sample()
        };
        let line = t.to_string();
        let tokens: Vec<&str> = line.split(' ').collect();
        assert_eq!(tokens[4], "1.0");
        assert_eq!(tokens[13], "0.0");
    }

    #[test]
    fn test_split_and_rejoin() {
        let t = sample();
        let sys = t.system_params();
        assert_eq!(Trace::new(t.chain_result(), &sys), t);
    }

    #[test]
    fn test_system_key_covers_every_param() {
        let sys = sample().system_params();
        assert_eq!(sys.key(), sample().system_params().key());

        let same_seed = SystemParams {
            merge_p: 0.3,
            ..sys
        };
        assert_ne!(same_seed.key(), sys.key());
        let same_seed = SystemParams {
            executors: 2,
            ..sys
        };
        assert_ne!(same_seed.key(), sys.key());
    }

    #[test]
    fn test_cause_printed_once() {
        let err = "1 5 10 20000 0.35 100 900 400 8 4 42 0.2 0.1 x 1 4"
            .parse::<Trace>()
            .unwrap_err();
        let source = std::error::Error::source(&err).unwrap().to_string();
        assert!(!err.to_string().contains(&source), "{err}");
        assert!(err.to_string().ends_with("field 13 (variance): expected real"));
    }

    #[test]
    fn test_real_in_integer_column() {
        let err = "1.0 5 10 20000 0.35 100 900 400 8 4 42 0.2 0.1 1.5 1 4"
            .parse::<Trace>()
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            TraceParseErrorKind::Field {
                index: 0,
                name: "id",
                source: FieldError::Int(_)
            }
        ));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_strips_terminator() {
        let err = "1 2 3\r\n".parse::<Trace>().unwrap_err();
        assert_eq!(err.line(), "1 2 3");
        assert_eq!(err.kind(), &TraceParseErrorKind::FieldCount { found: 3 });
    }

    #[test]
    fn test_ordering_check() {
        assert!(sample().response_times_ordered());
        let t = Trace {
            acrt_us: 1000,
            ..sample()
        };
        assert!(!t.response_times_ordered());
        let t = Trace {
            acrt_us: 50,
            ..sample()
        };
        assert!(!t.response_times_ordered());
    }
}
