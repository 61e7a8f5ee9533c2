//! Generation rules for random chain-based systems.
//!
//! A [`Rules`] value is the complete parameter set the chain generator
//! consumes: how many chains, how long, how they merge and synchronise,
//! which periods they draw from and how the resulting system is executed.
//! It is built once, validated, and then only read.
//!
//! Rules documents are JSON objects using the historical key spelling:
//!
//! ```json
//! {
//!     "Name": "baseline",
//!     "Directory": "out/baseline",
//!     "Chain_count": 8,
//!     "Chain_avg_len": 4,
//!     "Chain_merge_p": 0.2,
//!     "Chain_sync_p": 0.1,
//!     "Chain_variance": 1.5,
//!     "Util_total": 0.6,
//!     "Min_period_us": 10000,
//!     "Max_period_us": 100000,
//!     "Period_step_us": 1000.0,
//!     "Hyperperiod_count": 2,
//!     "Max_duration_us": 0,
//!     "PPE": true,
//!     "Executor_count": 4,
//!     "Random_seed": 42,
//!     "Logging_mode": 2
//! }
//! ```
//!
//! `Logging_mode` was added later and defaults to [`LoggingMode::None`] when
//! absent. Unknown keys are ignored so newer documents still load.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::TimeUs;

/// Environment variable `chaintool` reads a [`Rules::random_seed`] override from.
pub const SEED_ENV: &str = "RT_CHAINS_SEED";

/// What the executor logs while running a generated system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum LoggingMode {
    #[default]
    None,
    /// One record per callback invocation.
    Callback,
    /// One record per completed chain.
    Chain,
}

/// Integer that does not name a [`LoggingMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidLoggingMode(pub u8);

impl fmt::Display for InvalidLoggingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid logging mode {} (expected 0=none, 1=callback, 2=chain)",
            self.0
        )
    }
}

impl std::error::Error for InvalidLoggingMode {}

impl TryFrom<u8> for LoggingMode {
    type Error = InvalidLoggingMode;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(LoggingMode::None),
            1 => Ok(LoggingMode::Callback),
            2 => Ok(LoggingMode::Chain),
            other => Err(InvalidLoggingMode(other)),
        }
    }
}

impl From<LoggingMode> for u8 {
    fn from(mode: LoggingMode) -> u8 {
        match mode {
            LoggingMode::None => 0,
            LoggingMode::Callback => 1,
            LoggingMode::Chain => 2,
        }
    }
}

/// Errors from loading or validating [`Rules`].
///
/// `path` is set whenever the document came from a file.
#[derive(Debug)]
pub enum RulesError {
    /// The rules document could not be read.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The document is not a valid rules object.
    Decode {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
    /// A field is out of range.
    Invalid {
        path: Option<PathBuf>,
        reason: String,
    },
}

impl RulesError {
    fn invalid(reason: String) -> Self {
        RulesError::Invalid { path: None, reason }
    }

    fn in_file(self, file: &Path) -> Self {
        match self {
            RulesError::Decode { source, .. } => RulesError::Decode {
                path: Some(file.to_path_buf()),
                source,
            },
            RulesError::Invalid { reason, .. } => RulesError::Invalid {
                path: Some(file.to_path_buf()),
                reason,
            },
            read @ RulesError::Read { .. } => read,
        }
    }
}

impl fmt::Display for RulesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RulesError::Read { path, .. } => {
                write!(f, "failed to read rules {}", path.display())
            }
            RulesError::Decode { path: Some(p), .. } => {
                write!(f, "failed to decode rules {}", p.display())
            }
            RulesError::Decode { path: None, .. } => write!(f, "failed to decode rules"),
            RulesError::Invalid {
                path: Some(p),
                reason,
            } => write!(f, "invalid rules {}: {reason}", p.display()),
            RulesError::Invalid { path: None, reason } => write!(f, "invalid rules: {reason}"),
        }
    }
}

impl std::error::Error for RulesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RulesError::Read { source, .. } => Some(source),
            RulesError::Decode { source, .. } => Some(source),
            RulesError::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for RulesError {
    fn from(source: serde_json::Error) -> Self {
        RulesError::Decode { path: None, source }
    }
}

/// Parameters for generating one random chain-based system.
///
/// Deserializing always validates, so a `Rules` value never holds
/// out-of-range fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RulesDoc", into = "RulesDoc")]
pub struct Rules {
    name: String,
    /// Output directory for generated artifacts.
    directory: PathBuf,
    chain_count: u32,
    chain_avg_len: u32,
    chain_merge_p: f64,
    chain_sync_p: f64,
    chain_variance: f64,
    util_total: f64,
    min_period_us: TimeUs,
    max_period_us: TimeUs,
    period_step_us: f64,
    hyperperiod_count: u32,
    max_duration_us: TimeUs,
    ppe: bool,
    executor_count: u32,
    random_seed: i64,
    logging_mode: LoggingMode,
}

/// On-disk layout of a rules document.
#[derive(Serialize, Deserialize)]
struct RulesDoc {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Directory")]
    directory: PathBuf,
    #[serde(rename = "Chain_count")]
    chain_count: u32,
    #[serde(rename = "Chain_avg_len")]
    chain_avg_len: u32,
    #[serde(rename = "Chain_merge_p")]
    chain_merge_p: f64,
    #[serde(rename = "Chain_sync_p")]
    chain_sync_p: f64,
    #[serde(rename = "Chain_variance")]
    chain_variance: f64,
    #[serde(rename = "Util_total")]
    util_total: f64,
    #[serde(rename = "Min_period_us")]
    min_period_us: TimeUs,
    #[serde(rename = "Max_period_us")]
    max_period_us: TimeUs,
    #[serde(rename = "Period_step_us")]
    period_step_us: f64,
    #[serde(rename = "Hyperperiod_count")]
    hyperperiod_count: u32,
    #[serde(rename = "Max_duration_us")]
    max_duration_us: TimeUs,
    #[serde(rename = "PPE")]
    ppe: bool,
    #[serde(rename = "Executor_count")]
    executor_count: u32,
    #[serde(rename = "Random_seed")]
    random_seed: i64,
    #[serde(rename = "Logging_mode", default)]
    logging_mode: LoggingMode,
}

impl TryFrom<RulesDoc> for Rules {
    type Error = RulesError;

    fn try_from(doc: RulesDoc) -> Result<Self, Self::Error> {
        let rules = Rules {
            name: doc.name,
            directory: doc.directory,
            chain_count: doc.chain_count,
            chain_avg_len: doc.chain_avg_len,
            chain_merge_p: doc.chain_merge_p,
            chain_sync_p: doc.chain_sync_p,
            chain_variance: doc.chain_variance,
            util_total: doc.util_total,
            min_period_us: doc.min_period_us,
            max_period_us: doc.max_period_us,
            period_step_us: doc.period_step_us,
            hyperperiod_count: doc.hyperperiod_count,
            max_duration_us: doc.max_duration_us,
            ppe: doc.ppe,
            executor_count: doc.executor_count,
            random_seed: doc.random_seed,
            logging_mode: doc.logging_mode,
        };
        rules.validate()?;
        Ok(rules)
    }
}

impl From<Rules> for RulesDoc {
    fn from(rules: Rules) -> Self {
        RulesDoc {
            name: rules.name,
            directory: rules.directory,
            chain_count: rules.chain_count,
            chain_avg_len: rules.chain_avg_len,
            chain_merge_p: rules.chain_merge_p,
            chain_sync_p: rules.chain_sync_p,
            chain_variance: rules.chain_variance,
            util_total: rules.util_total,
            min_period_us: rules.min_period_us,
            max_period_us: rules.max_period_us,
            period_step_us: rules.period_step_us,
            hyperperiod_count: rules.hyperperiod_count,
            max_duration_us: rules.max_duration_us,
            ppe: rules.ppe,
            executor_count: rules.executor_count,
            random_seed: rules.random_seed,
            logging_mode: rules.logging_mode,
        }
    }
}

fn check_probability(key: &str, p: f64) -> Result<(), RulesError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(RulesError::invalid(format!(
            "{key} must be in [0, 1], got {p}"
        )))
    }
}

impl Rules {
    pub fn builder() -> RulesBuilder {
        RulesBuilder {
            rules: Rules {
                name: String::new(),
                directory: PathBuf::from("."),
                chain_count: 1,
                chain_avg_len: 1,
                chain_merge_p: 0.0,
                chain_sync_p: 0.0,
                chain_variance: 0.0,
                util_total: 0.5,
                min_period_us: 10_000,
                max_period_us: 100_000,
                period_step_us: 1_000.0,
                hyperperiod_count: 1,
                max_duration_us: 0,
                ppe: false,
                executor_count: 1,
                random_seed: 0,
                logging_mode: LoggingMode::None,
            },
        }
    }

    /// Decode and validate a rules document.
    ///
    /// Range violations are reported as [`RulesError::Invalid`], malformed
    /// documents as [`RulesError::Decode`].
    pub fn from_json(json: &str) -> Result<Self, RulesError> {
        let doc: RulesDoc = serde_json::from_str(json)?;
        Rules::try_from(doc)
    }

    /// Read, decode and validate the rules document at `path`.
    pub fn load(path: &Path) -> Result<Self, RulesError> {
        let json = std::fs::read_to_string(path).map_err(|source| RulesError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let rules = Self::from_json(&json).map_err(|e| e.in_file(path))?;
        debug!(
            path = %path.display(),
            name = rules.name.as_str(),
            chains = rules.chain_count,
            seed = rules.random_seed,
            "loaded rules"
        );
        Ok(rules)
    }

    /// Check the range constraints every consumer relies on.
    pub fn validate(&self) -> Result<(), RulesError> {
        check_probability("Chain_merge_p", self.chain_merge_p)?;
        check_probability("Chain_sync_p", self.chain_sync_p)?;
        if self.min_period_us > self.max_period_us {
            return Err(RulesError::invalid(format!(
                "Min_period_us ({}) cannot be greater than Max_period_us ({})",
                self.min_period_us, self.max_period_us
            )));
        }
        if self.executor_count == 0 {
            return Err(RulesError::invalid(
                "Executor_count must be at least 1".to_string(),
            ));
        }
        if !(self.period_step_us.is_finite() && self.period_step_us > 0.0) {
            return Err(RulesError::invalid(format!(
                "Period_step_us must be positive, got {}",
                self.period_step_us
            )));
        }
        if !(self.chain_variance.is_finite() && self.chain_variance >= 0.0) {
            return Err(RulesError::invalid(format!(
                "Chain_variance must be non-negative, got {}",
                self.chain_variance
            )));
        }
        if !self.util_total.is_finite() {
            return Err(RulesError::invalid(format!(
                "Util_total must be finite, got {}",
                self.util_total
            )));
        }
        Ok(())
    }

    /// Copy of these rules generating from a different seed.
    pub fn with_seed(&self, seed: i64) -> Self {
        Self {
            random_seed: seed,
            ..self.clone()
        }
    }

    /// How long a generated system should be simulated.
    ///
    /// An explicit `Max_duration_us` wins; otherwise the horizon is
    /// `Hyperperiod_count` times the longest possible period.
    pub fn simulation_horizon_us(&self) -> TimeUs {
        if self.max_duration_us > 0 {
            self.max_duration_us
        } else {
            self.max_period_us
                .saturating_mul(TimeUs::from(self.hyperperiod_count))
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn chain_count(&self) -> u32 {
        self.chain_count
    }

    pub fn chain_avg_len(&self) -> u32 {
        self.chain_avg_len
    }

    pub fn chain_merge_p(&self) -> f64 {
        self.chain_merge_p
    }

    pub fn chain_sync_p(&self) -> f64 {
        self.chain_sync_p
    }

    pub fn chain_variance(&self) -> f64 {
        self.chain_variance
    }

    pub fn util_total(&self) -> f64 {
        self.util_total
    }

    pub fn min_period_us(&self) -> TimeUs {
        self.min_period_us
    }

    pub fn max_period_us(&self) -> TimeUs {
        self.max_period_us
    }

    pub fn period_step_us(&self) -> f64 {
        self.period_step_us
    }

    pub fn hyperperiod_count(&self) -> u32 {
        self.hyperperiod_count
    }

    pub fn max_duration_us(&self) -> TimeUs {
        self.max_duration_us
    }

    pub fn ppe(&self) -> bool {
        self.ppe
    }

    pub fn executor_count(&self) -> u32 {
        self.executor_count
    }

    pub fn random_seed(&self) -> i64 {
        self.random_seed
    }

    pub fn logging_mode(&self) -> LoggingMode {
        self.logging_mode
    }
}

/// Builder for constructing [`Rules`] in code.
#[derive(Debug, Clone)]
pub struct RulesBuilder {
    rules: Rules,
}

impl RulesBuilder {
    pub fn name(mut self, name: &str) -> Self {
        self.rules.name = name.to_string();
        self
    }

    pub fn directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.rules.directory = dir.into();
        self
    }

    pub fn chains(mut self, count: u32, avg_len: u32) -> Self {
        self.rules.chain_count = count;
        self.rules.chain_avg_len = avg_len;
        self
    }

    pub fn merge_p(mut self, p: f64) -> Self {
        self.rules.chain_merge_p = p;
        self
    }

    pub fn sync_p(mut self, p: f64) -> Self {
        self.rules.chain_sync_p = p;
        self
    }

    pub fn variance(mut self, v: f64) -> Self {
        self.rules.chain_variance = v;
        self
    }

    pub fn util_total(mut self, u: f64) -> Self {
        self.rules.util_total = u;
        self
    }

    /// Set the period range and the step periods are rounded to.
    pub fn periods_us(mut self, min: TimeUs, max: TimeUs, step: f64) -> Self {
        self.rules.min_period_us = min;
        self.rules.max_period_us = max;
        self.rules.period_step_us = step;
        self
    }

    pub fn hyperperiod_count(mut self, n: u32) -> Self {
        self.rules.hyperperiod_count = n;
        self
    }

    pub fn max_duration_us(mut self, us: TimeUs) -> Self {
        self.rules.max_duration_us = us;
        self
    }

    pub fn ppe(mut self, enabled: bool) -> Self {
        self.rules.ppe = enabled;
        self
    }

    pub fn executors(mut self, n: u32) -> Self {
        self.rules.executor_count = n;
        self
    }

    pub fn seed(mut self, seed: i64) -> Self {
        self.rules.random_seed = seed;
        self
    }

    pub fn logging_mode(mut self, mode: LoggingMode) -> Self {
        self.rules.logging_mode = mode;
        self
    }

    pub fn build(self) -> Result<Rules, RulesError> {
        self.rules.validate()?;
        Ok(self.rules)
    }
}
