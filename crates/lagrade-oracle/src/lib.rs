#![forbid(unsafe_code)]

//! Trusted dense numerics used to *check* candidate answers, never to grade
//! them directly: rank, inverse, exact solve, determinant and an LP
//! minimiser backed by `microlp`. Matrices are row-major `Vec<Vec<f64>>`
//! throughout.

pub mod linprog;

pub use linprog::{LinProgResult, LinProgStatus, linprog};

use nalgebra::{DMatrix, DVector, Dyn, LU, linalg::SVD};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OracleError {
    #[error("matrix rows must all have equal length")]
    RaggedMatrix,
    #[error("expected square matrix, got {rows}x{cols}")]
    ExpectedSquareMatrix { rows: usize, cols: usize },
    #[error("incompatible shapes: a_shape={a_shape:?}, b_len={b_len}")]
    IncompatibleShapes {
        a_shape: (usize, usize),
        b_len: usize,
    },
    #[error("cannot multiply {left:?} by {right:?}")]
    MatmulShapes {
        left: (usize, usize),
        right: (usize, usize),
    },
    #[error("array must not contain infs or NaNs")]
    NonFiniteInput,
    #[error("singular matrix")]
    SingularMatrix,
    #[error("linear program solver failed: {0}")]
    LinProg(String),
}

/// `(rows, cols)`; an empty matrix is `(0, 0)`.
pub fn matrix_shape(a: &[Vec<f64>]) -> Result<(usize, usize), OracleError> {
    if a.is_empty() {
        return Ok((0, 0));
    }
    let cols = a[0].len();
    if a.iter().any(|row| row.len() != cols) {
        return Err(OracleError::RaggedMatrix);
    }
    Ok((a.len(), cols))
}

/// Numerical rank via SVD with NumPy's default threshold
/// `σ_max · max(rows, cols) · ε`.
pub fn matrix_rank(a: &[Vec<f64>]) -> Result<usize, OracleError> {
    let (rows, cols) = matrix_shape(a)?;
    if rows == 0 || cols == 0 {
        return Ok(0);
    }
    validate_finite_matrix(a)?;
    let matrix = dmatrix_from_rows(a)?;
    let svd = SVD::new(matrix, false, false);
    let max_s = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
    let threshold = max_s * (rows.max(cols) as f64) * f64::EPSILON;
    Ok(svd.singular_values.iter().filter(|s| **s > threshold).count())
}

/// Rank of the augmented matrix `[A | b]`.
pub fn augmented_rank(a: &[Vec<f64>], b: &[f64]) -> Result<usize, OracleError> {
    let (rows, cols) = matrix_shape(a)?;
    if b.len() != rows {
        return Err(OracleError::IncompatibleShapes {
            a_shape: (rows, cols),
            b_len: b.len(),
        });
    }
    let augmented: Vec<Vec<f64>> = a
        .iter()
        .zip(b.iter())
        .map(|(row, &rhs)| {
            let mut out = row.clone();
            out.push(rhs);
            out
        })
        .collect();
    matrix_rank(&augmented)
}

/// Exact square solve `A x = b` through one LU factorization.
pub fn solve(a: &[Vec<f64>], b: &[f64]) -> Result<Vec<f64>, OracleError> {
    let (rows, cols) = matrix_shape(a)?;
    if rows != cols {
        return Err(OracleError::ExpectedSquareMatrix { rows, cols });
    }
    if b.len() != rows {
        return Err(OracleError::IncompatibleShapes {
            a_shape: (rows, cols),
            b_len: b.len(),
        });
    }
    validate_finite_matrix(a)?;
    if b.iter().any(|v| !v.is_finite()) {
        return Err(OracleError::NonFiniteInput);
    }
    if rows == 0 {
        return Ok(Vec::new());
    }

    let matrix = dmatrix_from_rows(a)?;
    let rhs = DVector::from_column_slice(b);
    let lu: LU<f64, Dyn, Dyn> = matrix.lu();
    if fast_rcond_from_lu(&lu, rows) < f64::EPSILON {
        return Err(OracleError::SingularMatrix);
    }
    let x = lu.solve(&rhs).ok_or(OracleError::SingularMatrix)?;
    Ok(x.iter().copied().collect())
}

/// Single LU factorization + solve against identity.
pub fn inv(a: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, OracleError> {
    let (rows, cols) = matrix_shape(a)?;
    if rows != cols {
        return Err(OracleError::ExpectedSquareMatrix { rows, cols });
    }
    validate_finite_matrix(a)?;
    if rows == 0 {
        return Ok(Vec::new());
    }

    let matrix = dmatrix_from_rows(a)?;
    let lu: LU<f64, Dyn, Dyn> = matrix.lu();
    // Reject near-singular matrices that LU may not catch exactly
    if fast_rcond_from_lu(&lu, rows) < f64::EPSILON {
        return Err(OracleError::SingularMatrix);
    }
    let identity = DMatrix::identity(rows, rows);
    let inverse = lu.solve(&identity).ok_or(OracleError::SingularMatrix)?;
    Ok(rows_from_dmatrix(&inverse))
}

pub fn det(a: &[Vec<f64>]) -> Result<f64, OracleError> {
    let (rows, cols) = matrix_shape(a)?;
    if rows != cols {
        return Err(OracleError::ExpectedSquareMatrix { rows, cols });
    }
    validate_finite_matrix(a)?;
    if rows == 0 {
        return Ok(1.0);
    }
    let matrix = dmatrix_from_rows(a)?;
    Ok(matrix.lu().determinant())
}

// ═══════════════════════════════════════════════════════════════════
// Dense helpers shared with the checker
// ═══════════════════════════════════════════════════════════════════

/// `A @ B` with shape checking; ragged operands are rejected.
pub fn matmul(a: &[Vec<f64>], b: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, OracleError> {
    let left = matrix_shape(a)?;
    let right = matrix_shape(b)?;
    if left.1 != right.0 {
        return Err(OracleError::MatmulShapes { left, right });
    }
    let mut c = vec![vec![0.0; right.1]; left.0];
    for (c_row, a_row) in c.iter_mut().zip(a.iter()) {
        for (a_ik, b_row) in a_row.iter().zip(b.iter()) {
            for (c_ij, b_kj) in c_row.iter_mut().zip(b_row.iter()) {
                *c_ij += a_ik * b_kj;
            }
        }
    }
    Ok(c)
}

/// `A @ x`.
pub fn matvec(a: &[Vec<f64>], x: &[f64]) -> Result<Vec<f64>, OracleError> {
    let (rows, cols) = matrix_shape(a)?;
    if x.len() != cols {
        return Err(OracleError::IncompatibleShapes {
            a_shape: (rows, cols),
            b_len: x.len(),
        });
    }
    Ok(a.iter()
        .map(|row| row.iter().zip(x.iter()).map(|(a, b)| a * b).sum())
        .collect())
}

pub fn dot(x: &[f64], y: &[f64]) -> Result<f64, OracleError> {
    if x.len() != y.len() {
        return Err(OracleError::IncompatibleShapes {
            a_shape: (1, y.len()),
            b_len: x.len(),
        });
    }
    Ok(x.iter().zip(y.iter()).map(|(a, b)| a * b).sum())
}

#[must_use]
pub fn identity(n: usize) -> Vec<Vec<f64>> {
    let mut m = vec![vec![0.0; n]; n];
    for (i, row) in m.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    m
}

#[must_use]
pub fn transpose(a: &[Vec<f64>]) -> Vec<Vec<f64>> {
    if a.is_empty() {
        return Vec::new();
    }
    let rows = a.len();
    let cols = a[0].len();
    let mut out = vec![vec![0.0; rows]; cols];
    for (r, row) in a.iter().enumerate().take(rows) {
        for (c, value) in row.iter().enumerate().take(cols) {
            out[c][r] = *value;
        }
    }
    out
}

/// O(n) reciprocal condition estimate from the LU diagonal; a conservative
/// lower bound on the true rcond.
fn fast_rcond_from_lu(lu: &LU<f64, Dyn, Dyn>, n: usize) -> f64 {
    if n == 0 {
        return 1.0;
    }
    let u = lu.u();
    let mut max_diag: f64 = 0.0;
    let mut min_diag = f64::INFINITY;
    for i in 0..n {
        let d = u[(i, i)].abs();
        max_diag = max_diag.max(d);
        min_diag = min_diag.min(d);
    }
    if max_diag == 0.0 {
        return 0.0;
    }
    min_diag / max_diag
}

fn validate_finite_matrix(a: &[Vec<f64>]) -> Result<(), OracleError> {
    if a.iter().flatten().any(|v| !v.is_finite()) {
        return Err(OracleError::NonFiniteInput);
    }
    Ok(())
}

fn dmatrix_from_rows(rows: &[Vec<f64>]) -> Result<DMatrix<f64>, OracleError> {
    let (m, n) = matrix_shape(rows)?;
    let mut data = Vec::with_capacity(m * n);
    for row in rows {
        data.extend_from_slice(row);
    }
    Ok(DMatrix::from_row_slice(m, n, &data))
}

fn rows_from_dmatrix(m: &DMatrix<f64>) -> Vec<Vec<f64>> {
    let mut out = vec![vec![0.0; m.ncols()]; m.nrows()];
    for (r, row) in out.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = m[(r, c)];
        }
    }
    out
}
