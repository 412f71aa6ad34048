#![forbid(unsafe_code)]

//! Randomised correctness checker for PLDU decomposition, linear-system
//! solving and simplex implementations.
//!
//! Fixtures come from a seeded generator, candidates are called through
//! the traits in [`candidate`], and every answer is judged by mathematical
//! property or against the `lagrade-oracle` backend.
//!
//! ## Module layout
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | `candidate` | Candidate traits, [`PlduFactors`], [`SolveAnswer`]        |
//! | `generator` | Rank-controlled matrices and small-integer vectors        |
//! | `verdict`   | [`TrialVerdict`], [`Diagnostic`], fixture fingerprints    |
//! | `pldu`      | PLDU validator                                            |
//! | `equations` | Solve and determinant validators                          |
//! | `simplex`   | LP optimality validator                                   |
//! | `report`    | Console [`Reporter`] and the serialisable [`CheckReport`] |
//! | `runner`    | [`Checker`]: trial loops, scoring, stage sequencing       |
//! | `reference` | Reference candidates used to self-check the harness       |

pub mod candidate;
pub mod equations;
pub mod generator;
pub mod pldu;
pub mod reference;
pub mod report;
pub mod runner;
pub mod simplex;
pub mod verdict;

pub use candidate::{
    CandidateError, EquationsCandidate, EquationsFns, Matrix, PlduCandidate, PlduFactors,
    SimplexCandidate, SolveAnswer,
};
pub use generator::{GenerateError, MAX_ENTRY_BOUND};
pub use reference::{ReferenceEquations, ReferencePldu, ReferenceSimplex};
pub use report::{CheckOutcome, CheckReport, Reporter, StageReport};
pub use runner::Checker;
pub use verdict::{Diagnostic, DiagnosticValue, TrialVerdict};

use std::fmt;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use lagrade_oracle::OracleError;
use lagrade_runtime::{Interrupted, Tolerance};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PLDU_MARKS: u32 = 6;
pub const PLDU_BONUS_MARKS: u32 = 2;
pub const SOLVE_MARKS: u32 = 3;
pub const DET_MARKS: u32 = 3;
pub const SIMPLEX_MARKS: u32 = 6;
/// Denominator printed on every "Final Marks" line. PLDU can exceed it
/// through the bonus round.
pub const STAGE_MAX_MARKS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Pldu,
    Equations,
    Simplex,
}

impl Stage {
    pub const ALL: [Self; 3] = [Self::Pldu, Self::Equations, Self::Simplex];

    /// Console name, as printed after "Testing" and "Final Marks for".
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Pldu => "PLDU",
            Self::Equations => "Equations",
            Self::Simplex => "Simplex",
        }
    }

    /// Identifier used in trial ids and fixture fingerprints.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Pldu => "pldu",
            Self::Equations => "equations",
            Self::Simplex => "simplex",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Matrix family used by the PLDU bonus round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusMatrices {
    /// A second pass over fresh non-singular matrices.
    NonSingular,
    /// Rank-deficient, possibly rectangular matrices.
    Singular,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckerConfig {
    pub seed: u64,
    /// Trials per check; the first failure ends a check early.
    pub num_tests: usize,
    pub tolerance: Tolerance,
    /// The reconstruction check is skipped once `L` or `D` hold an entry
    /// at or above this magnitude.
    pub sanity_bound: f64,
    /// Allowed deviation of `|u_ii|` from 1.
    pub unit_diagonal_slack: f64,
    pub pldu_bonus_matrices: BonusMatrices,
    pub min_dim: usize,
    pub max_dim: usize,
    /// Exclusive upper bound for generated matrix factor entries.
    pub entry_max: i64,
    pub vector_max: i64,
    pub simplex_rhs_max: i64,
    pub ledger_capacity: usize,
    /// Wrap console output in ANSI background colours.
    pub color: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            num_tests: 10_000,
            tolerance: Tolerance::GRADING,
            sanity_bound: 1e5,
            unit_diagonal_slack: 0.1,
            pldu_bonus_matrices: BonusMatrices::NonSingular,
            min_dim: 2,
            max_dim: 4,
            entry_max: 3,
            vector_max: 3,
            simplex_rhs_max: 1000,
            ledger_capacity: 256,
            color: false,
        }
    }
}

impl CheckerConfig {
    /// Reads a JSON config; absent fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, CheckError> {
        let raw = fs::read_to_string(path).map_err(|source| CheckError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| CheckError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CheckError> {
        if self.num_tests == 0 || self.ledger_capacity == 0 {
            return Err(CheckError::InvalidConfig(String::from(
                "num_tests and ledger_capacity must be at least 1",
            )));
        }
        if self.min_dim < 2 || self.max_dim < self.min_dim {
            return Err(CheckError::InvalidConfig(format!(
                "dimension range {}..={} must start at 2 or above and be non-empty",
                self.min_dim, self.max_dim
            )));
        }
        if self.entry_max < 2 {
            return Err(CheckError::InvalidConfig(format!(
                "entry_max {} cannot produce full-rank matrices",
                self.entry_max
            )));
        }
        if self.vector_max < 0 || self.simplex_rhs_max < 0 {
            return Err(CheckError::InvalidConfig(String::from(
                "vector bounds must be non-negative",
            )));
        }
        let largest = self.entry_max.max(self.vector_max).max(self.simplex_rhs_max);
        if largest > MAX_ENTRY_BOUND {
            return Err(CheckError::InvalidConfig(format!(
                "entry and vector bounds must not exceed {MAX_ENTRY_BOUND}, got {largest}"
            )));
        }
        let tol = self.tolerance;
        if !(tol.atol >= 0.0 && tol.rtol >= 0.0) {
            return Err(CheckError::InvalidConfig(format!(
                "tolerance must be non-negative, got atol={} rtol={}",
                tol.atol, tol.rtol
            )));
        }
        if !(self.sanity_bound > 0.0) || !(self.unit_diagonal_slack >= 0.0) {
            return Err(CheckError::InvalidConfig(String::from(
                "sanity_bound must be positive and unit_diagonal_slack non-negative",
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn dims(&self) -> RangeInclusive<usize> {
        self.min_dim..=self.max_dim
    }
}

/// Everything that stops a run. A failed property is not an error; it is
/// a [`TrialVerdict::Fail`].
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Candidate(#[from] CandidateError),
    #[error(transparent)]
    Interrupted(#[from] Interrupted),
    #[error("oracle failed on a generated fixture: {0}")]
    Oracle(#[from] OracleError),
    #[error("fixture generation failed: {0}")]
    Generate(#[from] GenerateError),
    #[error("config load failed for {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config parse failed for {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("console write failed: {0}")]
    ReportWrite(#[from] std::io::Error),
    #[error("report write failed for {path}: {source}")]
    ReportIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("report serialization failed: {0}")]
    ReportSerialize(#[source] serde_json::Error),
}
