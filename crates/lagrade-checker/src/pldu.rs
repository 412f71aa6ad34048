#![forbid(unsafe_code)]

//! PLDU validator.
//!
//! Judges `A = P · L · D · U` by structure alone: any valid factorisation
//! passes, whichever pivoting strategy produced it.

use std::cmp::Ordering;

use lagrade_oracle::{identity, matmul, matrix_shape};

use crate::candidate::{Matrix, PlduCandidate, PlduFactors};
use crate::verdict::{Diagnostic, DiagnosticValue, Fingerprint, TrialVerdict};
use crate::{CheckError, CheckerConfig, Stage};

pub const SHAPE_P: &str = "Shape of P is incorrect";
pub const SHAPE_L: &str = "Shape of L is incorrect";
pub const SHAPE_D: &str = "Shape of D is incorrect";
pub const SHAPE_U: &str = "Shape of U is incorrect";
pub const INCORRECT_DECOMPOSITION: &str = "Incorrect decomposition";
pub const NOT_PERMUTATION: &str = "P is not a permutation matrix";
pub const NOT_UNIT_LOWER: &str = "L is not a lower triangular matrix with unit diagonal";
pub const NOT_DIAGONAL: &str = "D is not a diagonal matrix";
pub const U_NOT_NORMALIZED: &str = "U has not been normalized to have unit diagonal";

/// Runs the candidate on a copy of `a` and checks the returned factors.
///
/// Candidate errors propagate; only property violations become
/// [`TrialVerdict::Fail`].
pub fn validate_pldu<C: PlduCandidate + ?Sized>(
    candidate: &mut C,
    a: &[Vec<f64>],
    config: &CheckerConfig,
) -> Result<TrialVerdict, CheckError> {
    let (n, m) = matrix_shape(a)?;
    let factors = candidate.pldu(a.to_vec())?;

    let Some(violation) = find_violation(a, n, m, &factors, config) else {
        return Ok(TrialVerdict::Pass);
    };
    let fixture_id = Fingerprint::new(Stage::Pldu.slug()).matrix(a).finish();
    let reconstruction: DiagnosticValue = match reconstruct(&factors) {
        Some(product) => product.into(),
        None => String::from("unavailable: factor shapes do not chain").into(),
    };
    Ok(TrialVerdict::Fail(
        Diagnostic::new(violation, fixture_id)
            .with("A", a.to_vec())
            .with("P", factors.p)
            .with("L", factors.l)
            .with("D", factors.d)
            .with("U", factors.u)
            .with("reconstruction", reconstruction),
    ))
}

/// First property the factors break, checked in a fixed order.
fn find_violation(
    a: &[Vec<f64>],
    n: usize,
    m: usize,
    f: &PlduFactors,
    config: &CheckerConfig,
) -> Option<&'static str> {
    let tol = config.tolerance;

    for (factor, cols, message) in [
        (&f.p, n, SHAPE_P),
        (&f.l, n, SHAPE_L),
        (&f.d, n, SHAPE_D),
        (&f.u, m, SHAPE_U),
    ] {
        if !has_shape(factor, n, cols) {
            return Some(message);
        }
    }

    if all_below(&f.l, config.sanity_bound) && all_below(&f.d, config.sanity_bound) {
        match reconstruct(f) {
            Some(product) if tol.matrix(a, &product) => {}
            _ => return Some(INCORRECT_DECOMPOSITION),
        }
    }

    if !tol.matrix(&rows_descending(&f.p), &identity(n)) {
        return Some(NOT_PERMUTATION);
    }
    if !tol.matrix(&f.l, &unit_lower_part(&f.l)) {
        return Some(NOT_UNIT_LOWER);
    }
    if !tol.matrix(&f.d, &diagonal_part(&f.d)) {
        return Some(NOT_DIAGONAL);
    }
    let slack = config.unit_diagonal_slack;
    // NaN fails the comparison and so counts as unnormalised.
    if (0..n.min(m)).any(|i| !((f.u[i][i].abs() - 1.0).abs() <= slack)) {
        return Some(U_NOT_NORMALIZED);
    }
    None
}

fn has_shape(m: &[Vec<f64>], rows: usize, cols: usize) -> bool {
    m.len() == rows && m.iter().all(|row| row.len() == cols)
}

fn all_below(m: &[Vec<f64>], bound: f64) -> bool {
    m.iter().flatten().all(|v| v.abs() < bound)
}

/// `P · L · D · U`, or `None` when the factor shapes do not chain.
#[must_use]
pub fn reconstruct(f: &PlduFactors) -> Option<Matrix> {
    let pl = matmul(&f.p, &f.l).ok()?;
    let pld = matmul(&pl, &f.d).ok()?;
    matmul(&pld, &f.u).ok()
}

/// Rows of `p` sorted in descending lexicographic order. A permutation
/// matrix, and only a permutation matrix, sorts to the identity.
fn rows_descending(p: &[Vec<f64>]) -> Matrix {
    let mut rows = p.to_vec();
    rows.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    rows
}

fn unit_lower_part(l: &[Vec<f64>]) -> Matrix {
    l.iter()
        .enumerate()
        .map(|(i, row)| {
            row.iter()
                .enumerate()
                .map(|(j, &v)| match j.cmp(&i) {
                    Ordering::Less => v,
                    Ordering::Equal => 1.0,
                    Ordering::Greater => 0.0,
                })
                .collect()
        })
        .collect()
}

fn diagonal_part(d: &[Vec<f64>]) -> Matrix {
    d.iter()
        .enumerate()
        .map(|(i, row)| {
            row.iter()
                .enumerate()
                .map(|(j, &v)| if i == j { v } else { 0.0 })
                .collect()
        })
        .collect()
}
