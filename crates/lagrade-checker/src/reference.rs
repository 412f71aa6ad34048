#![forbid(unsafe_code)]

//! Known-good candidates, used to self-check the harness end to end.

use lagrade_oracle as oracle;

use crate::candidate::{
    CandidateError, EquationsCandidate, Matrix, PlduCandidate, PlduFactors, SimplexCandidate,
    SolveAnswer,
};

/// Pivots at or below this magnitude are treated as zero.
const PIVOT_EPS: f64 = 1e-10;

fn negligible(value: f64) -> bool {
    value.abs() <= PIVOT_EPS
}

/// Gaussian elimination that swaps rows only when the pivot vanishes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferencePldu;

impl PlduCandidate for ReferencePldu {
    fn pldu(&mut self, m: Matrix) -> Result<PlduFactors, CandidateError> {
        let (n, cols) = oracle::matrix_shape(&m)?;
        let steps = n.min(cols);
        let mut p = oracle::identity(n);
        let mut l = oracle::identity(n);
        let mut u = m;

        // Invariant: p · M = l · u.
        for i in 0..steps {
            if negligible(u[i][i]) {
                let Some(pivot) = (i + 1..n).find(|&r| !negligible(u[r][i])) else {
                    continue;
                };
                u.swap(i, pivot);
                p.swap(i, pivot);
                for k in 0..i {
                    let tmp = l[i][k];
                    l[i][k] = l[pivot][k];
                    l[pivot][k] = tmp;
                }
            }
            for j in i + 1..n {
                if u[j][i] == 0.0 {
                    continue;
                }
                let factor = u[j][i] / u[i][i];
                l[j][i] = factor;
                for k in i..cols {
                    u[j][k] -= factor * u[i][k];
                }
            }
        }

        let mut d = oracle::identity(n);
        for i in 0..steps {
            let pivot = u[i][i];
            if negligible(pivot) {
                continue;
            }
            d[i][i] = pivot;
            for v in &mut u[i] {
                *v /= pivot;
            }
        }
        // Drop elimination residue below the diagonal.
        for (i, row) in u.iter_mut().enumerate() {
            for v in row.iter_mut().take(i.min(cols)) {
                *v = 0.0;
            }
        }

        Ok(PlduFactors {
            p: oracle::transpose(&p),
            l,
            d,
            u,
        })
    }
}

/// Rank case analysis, then an exact solve. Wide full-row-rank systems get
/// the minimum-norm solution `Aᵀ (A Aᵀ)⁻¹ b`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceEquations;

impl EquationsCandidate for ReferenceEquations {
    fn solve(&mut self, a: Matrix, b: Vec<f64>) -> Result<SolveAnswer, CandidateError> {
        let (rows, cols) = oracle::matrix_shape(&a)?;
        let rank_a = oracle::matrix_rank(&a)?;
        if rank_a != oracle::augmented_rank(&a, &b)? {
            return Ok(SolveAnswer::Inconsistent);
        }
        if rank_a < rows {
            return Ok(SolveAnswer::Infinite);
        }
        if rows == cols {
            return Ok(SolveAnswer::Solution(oracle::solve(&a, &b)?));
        }
        let at = oracle::transpose(&a);
        let gram = oracle::matmul(&a, &at)?;
        let y = oracle::solve(&gram, &b)?;
        Ok(SolveAnswer::Solution(oracle::matvec(&at, &y)?))
    }

    fn det(&mut self, a: Matrix) -> Result<f64, CandidateError> {
        let (rows, cols) = oracle::matrix_shape(&a)?;
        if rows != cols {
            return Ok(0.0);
        }
        Ok(oracle::det(&a)?)
    }
}

/// Oracle LP on `-c`; the zero vector when there is no finite optimum.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceSimplex;

impl SimplexCandidate for ReferenceSimplex {
    fn simplex(&mut self, a: Matrix, b: Vec<f64>, c: Vec<f64>) -> Result<Vec<f64>, CandidateError> {
        let negated: Vec<f64> = c.iter().map(|v| -v).collect();
        let result = oracle::linprog(&negated, &a, &b)?;
        Ok(result.x.unwrap_or_else(|| vec![0.0; c.len()]))
    }
}
