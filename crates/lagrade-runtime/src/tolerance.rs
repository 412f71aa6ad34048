#![forbid(unsafe_code)]

//! Approximate floating-point comparison with combined absolute and relative bounds.
//!
//! Every comparison uses `|actual - expected| <= atol + rtol * |expected|`,
//! the same asymmetric form as `numpy.allclose`: the bound scales with the
//! *expected* side only. Shapes must match exactly; nothing is broadcast.

use serde::{Deserialize, Serialize};

/// Absolute/relative tolerance pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub atol: f64,
    pub rtol: f64,
}

impl Tolerance {
    /// Default grading tolerance: 5% absolute and 5% relative.
    pub const GRADING: Self = Self {
        atol: 5e-2,
        rtol: 5e-2,
    };

    #[must_use]
    pub const fn new(atol: f64, rtol: f64) -> Self {
        Self { atol, rtol }
    }

    /// Largest admissible deviation from `expected`.
    #[must_use]
    pub fn bound(&self, expected: f64) -> f64 {
        self.atol + self.rtol * expected.abs()
    }

    #[must_use]
    pub fn scalar(&self, actual: f64, expected: f64) -> bool {
        allclose_scalar(actual, expected, self.atol, self.rtol)
    }

    #[must_use]
    pub fn vector(&self, actual: &[f64], expected: &[f64]) -> bool {
        allclose_vec(actual, expected, self.atol, self.rtol)
    }

    #[must_use]
    pub fn matrix(&self, actual: &[Vec<f64>], expected: &[Vec<f64>]) -> bool {
        allclose_matrix(actual, expected, self.atol, self.rtol)
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::GRADING
    }
}

/// Scalar closeness. NaN is never close to anything, and infinities only
/// match an identical infinity.
#[must_use]
pub fn allclose_scalar(actual: f64, expected: f64, atol: f64, rtol: f64) -> bool {
    if actual.is_nan() || expected.is_nan() {
        return false;
    }
    if actual.is_infinite() || expected.is_infinite() {
        return actual == expected;
    }
    (actual - expected).abs() <= atol + rtol * expected.abs()
}

#[must_use]
pub fn allclose_vec(actual: &[f64], expected: &[f64], atol: f64, rtol: f64) -> bool {
    if actual.len() != expected.len() {
        return false;
    }
    actual
        .iter()
        .zip(expected.iter())
        .all(|(a, e)| allclose_scalar(*a, *e, atol, rtol))
}

#[must_use]
pub fn allclose_matrix(actual: &[Vec<f64>], expected: &[Vec<f64>], atol: f64, rtol: f64) -> bool {
    if actual.len() != expected.len() {
        return false;
    }
    actual
        .iter()
        .zip(expected.iter())
        .all(|(a_row, e_row)| allclose_vec(a_row, e_row, atol, rtol))
}

/// Largest absolute element-wise difference, or `None` when shapes differ.
#[must_use]
pub fn max_abs_diff_matrix(actual: &[Vec<f64>], expected: &[Vec<f64>]) -> Option<f64> {
    if actual.len() != expected.len() {
        return None;
    }
    let mut worst: f64 = 0.0;
    for (a_row, e_row) in actual.iter().zip(expected.iter()) {
        if a_row.len() != e_row.len() {
            return None;
        }
        for (a, e) in a_row.iter().zip(e_row.iter()) {
            worst = worst.max((a - e).abs());
        }
    }
    Some(worst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grading_tolerance_accepts_five_percent_drift() {
        let tol = Tolerance::GRADING;
        assert!(tol.scalar(10.5, 10.0));
        assert!(tol.scalar(0.04, 0.0));
        assert!(!tol.scalar(10.6, 10.0));
        assert!(!tol.scalar(-10.0, 10.0));
    }

    #[test]
    fn relative_bound_scales_with_expected_only() {
        // 0.05 + 0.05 * 100 = 5.05
        assert!(allclose_scalar(105.0, 100.0, 0.05, 0.05));
        // 0.05 + 0.05 * 1 = 0.1
        assert!(!allclose_scalar(100.0, 1.0, 0.05, 0.05));
    }

    #[test]
    fn nan_is_never_close() {
        assert!(!allclose_scalar(f64::NAN, f64::NAN, 1.0, 1.0));
        assert!(!allclose_scalar(f64::NAN, 1.0, 1.0, 1.0));
        assert!(!allclose_scalar(1.0, f64::NAN, 1.0, 1.0));
    }

    #[test]
    fn infinities_only_match_themselves() {
        assert!(allclose_scalar(f64::INFINITY, f64::INFINITY, 0.0, 0.0));
        assert!(!allclose_scalar(f64::INFINITY, f64::NEG_INFINITY, 0.0, 0.0));
        assert!(!allclose_scalar(1e300, f64::INFINITY, 0.05, 0.05));
    }

    #[test]
    fn shape_mismatch_is_not_close() {
        assert!(!allclose_vec(&[1.0, 2.0], &[1.0], 1.0, 1.0));
        let a = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let ragged = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(!allclose_matrix(&a, &ragged, 1.0, 1.0));
        assert!(!allclose_matrix(&a, &a[..1], 1.0, 1.0));
        assert!(allclose_matrix(&a, &a, 0.0, 0.0));
    }

    #[test]
    fn max_abs_diff_reports_worst_entry() {
        let a = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let b = vec![vec![1.0, 2.5], vec![2.0, 4.0]];
        assert_eq!(max_abs_diff_matrix(&a, &b), Some(1.0));
        assert_eq!(max_abs_diff_matrix(&a, &b[..1]), None);
    }
}
