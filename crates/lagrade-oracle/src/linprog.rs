#![forbid(unsafe_code)]

//! Linear programs in inequality form, solved by `microlp`:
//!
//! ```text
//! minimize    c · x
//! subject to  A_ub · x <= b_ub
//!             x >= 0
//! ```
//!
//! Infeasibility and unboundedness are statuses, not errors; errors are
//! reserved for malformed input and solver faults.

use microlp::{ComparisonOp, OptimizationDirection, Problem};
use serde::{Deserialize, Serialize};

use crate::{OracleError, matrix_shape};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinProgStatus {
    Optimal,
    Infeasible,
    Unbounded,
}

impl LinProgStatus {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Optimal => "optimization terminated successfully",
            Self::Infeasible => "the problem is infeasible",
            Self::Unbounded => "the problem is unbounded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinProgResult {
    pub status: LinProgStatus,
    /// Optimal point; `None` unless `status` is `Optimal`.
    pub x: Option<Vec<f64>>,
    /// Optimal objective `c · x`; `None` unless `status` is `Optimal`.
    pub fun: Option<f64>,
}

impl LinProgResult {
    #[must_use]
    pub fn is_optimal(&self) -> bool {
        self.status == LinProgStatus::Optimal
    }

    fn without_solution(status: LinProgStatus) -> Self {
        Self {
            status,
            x: None,
            fun: None,
        }
    }
}

pub fn linprog(c: &[f64], a_ub: &[Vec<f64>], b_ub: &[f64]) -> Result<LinProgResult, OracleError> {
    let n = c.len();
    let (rows, cols) = matrix_shape(a_ub)?;
    if rows > 0 && cols != n {
        return Err(OracleError::IncompatibleShapes {
            a_shape: (rows, cols),
            b_len: n,
        });
    }
    if b_ub.len() != rows {
        return Err(OracleError::IncompatibleShapes {
            a_shape: (rows, cols),
            b_len: b_ub.len(),
        });
    }
    let non_finite = c.iter().chain(b_ub.iter()).any(|v| !v.is_finite())
        || a_ub.iter().flatten().any(|v| !v.is_finite());
    if non_finite {
        return Err(OracleError::NonFiniteInput);
    }

    // Without constraints the optimum sits at the origin unless some cost
    // is negative.
    if rows == 0 {
        if c.iter().any(|&ci| ci < 0.0) {
            return Ok(LinProgResult::without_solution(LinProgStatus::Unbounded));
        }
        return Ok(LinProgResult {
            status: LinProgStatus::Optimal,
            x: Some(vec![0.0; n]),
            fun: Some(0.0),
        });
    }

    let mut problem = Problem::new(OptimizationDirection::Minimize);
    let vars: Vec<_> = c
        .iter()
        .map(|&ci| problem.add_var(ci, (0.0, f64::INFINITY)))
        .collect();
    for (row, &rhs) in a_ub.iter().zip(b_ub) {
        let terms: Vec<_> = vars
            .iter()
            .zip(row)
            .filter(|(_, coeff)| **coeff != 0.0)
            .map(|(&var, &coeff)| (var, coeff))
            .collect();
        problem.add_constraint(terms, ComparisonOp::Le, rhs);
    }

    match problem.solve() {
        Ok(solution) => {
            let x: Vec<f64> = vars.iter().map(|&var| solution[var].max(0.0)).collect();
            let fun = c.iter().zip(&x).map(|(ci, xi)| ci * xi).sum();
            Ok(LinProgResult {
                status: LinProgStatus::Optimal,
                x: Some(x),
                fun: Some(fun),
            })
        }
        Err(microlp::Error::Infeasible) => {
            Ok(LinProgResult::without_solution(LinProgStatus::Infeasible))
        }
        Err(microlp::Error::Unbounded) => {
            Ok(LinProgResult::without_solution(LinProgStatus::Unbounded))
        }
        Err(microlp::Error::InternalError(message)) => Err(OracleError::LinProg(message)),
    }
}
