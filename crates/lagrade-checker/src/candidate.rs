#![forbid(unsafe_code)]

//! The boundary between the checker and the implementations it grades.
//!
//! Every candidate method receives its inputs by value. The checker clones
//! the generated fixture before each call, so a candidate that scribbles
//! over its arguments cannot corrupt what the validator compares against.

use std::fmt;

use lagrade_oracle::OracleError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Row-major dense matrix.
pub type Matrix = Vec<Vec<f64>>;

/// `M = P · L · D · U` as returned by a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlduFactors {
    pub p: Matrix,
    pub l: Matrix,
    pub d: Matrix,
    pub u: Matrix,
}

/// Answer to `A x = b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "x", rename_all = "snake_case")]
pub enum SolveAnswer {
    /// No solution: `rank(A) != rank([A | b])`. Legacy code `-1`.
    Inconsistent,
    /// Consistent but underdetermined: `rank(A) < rows`. Legacy code `-2`.
    Infinite,
    Solution(Vec<f64>),
}

impl SolveAnswer {
    pub const INCONSISTENT_CODE: i64 = -1;
    pub const INFINITE_CODE: i64 = -2;

    /// Maps the legacy numeric sentinels; any other code is not a sentinel.
    #[must_use]
    pub fn from_sentinel(code: i64) -> Option<Self> {
        match code {
            Self::INCONSISTENT_CODE => Some(Self::Inconsistent),
            Self::INFINITE_CODE => Some(Self::Infinite),
            _ => None,
        }
    }

    #[must_use]
    pub fn sentinel_code(&self) -> Option<i64> {
        match self {
            Self::Inconsistent => Some(Self::INCONSISTENT_CODE),
            Self::Infinite => Some(Self::INFINITE_CODE),
            Self::Solution(_) => None,
        }
    }
}

impl fmt::Display for SolveAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inconsistent => write!(f, "inconsistent ({})", Self::INCONSISTENT_CODE),
            Self::Infinite => write!(f, "infinite solutions ({})", Self::INFINITE_CODE),
            Self::Solution(x) => write!(f, "solution of length {}", x.len()),
        }
    }
}

/// Raised by the code under test. Validators never recover from it: a
/// crashing candidate halts the run instead of being scored as a wrong answer.
#[derive(Debug, Error)]
pub enum CandidateError {
    #[error("candidate rejected its input: {0}")]
    InvalidInput(String),
    #[error("candidate failed: {0}")]
    Failed(String),
    #[error("candidate numeric backend failed: {0}")]
    Backend(#[from] OracleError),
}

pub trait PlduCandidate {
    fn pldu(&mut self, m: Matrix) -> Result<PlduFactors, CandidateError>;
}

pub trait EquationsCandidate {
    fn solve(&mut self, a: Matrix, b: Vec<f64>) -> Result<SolveAnswer, CandidateError>;

    /// Determinant; non-square inputs must yield exactly `0.0`.
    fn det(&mut self, a: Matrix) -> Result<f64, CandidateError>;
}

pub trait SimplexCandidate {
    /// Maximise `c · x` subject to `A x <= b`, `x >= 0`; returns `x`.
    fn simplex(&mut self, a: Matrix, b: Vec<f64>, c: Vec<f64>) -> Result<Vec<f64>, CandidateError>;
}

impl<F> PlduCandidate for F
where
    F: FnMut(Matrix) -> Result<PlduFactors, CandidateError>,
{
    fn pldu(&mut self, m: Matrix) -> Result<PlduFactors, CandidateError> {
        self(m)
    }
}

impl<F> SimplexCandidate for F
where
    F: FnMut(Matrix, Vec<f64>, Vec<f64>) -> Result<Vec<f64>, CandidateError>,
{
    fn simplex(&mut self, a: Matrix, b: Vec<f64>, c: Vec<f64>) -> Result<Vec<f64>, CandidateError> {
        self(a, b, c)
    }
}

/// Adapts a pair of closures into an [`EquationsCandidate`].
pub struct EquationsFns<S, D> {
    pub solve: S,
    pub det: D,
}

impl<S, D> EquationsCandidate for EquationsFns<S, D>
where
    S: FnMut(Matrix, Vec<f64>) -> Result<SolveAnswer, CandidateError>,
    D: FnMut(Matrix) -> Result<f64, CandidateError>,
{
    fn solve(&mut self, a: Matrix, b: Vec<f64>) -> Result<SolveAnswer, CandidateError> {
        (self.solve)(a, b)
    }

    fn det(&mut self, a: Matrix) -> Result<f64, CandidateError> {
        (self.det)(a)
    }
}
