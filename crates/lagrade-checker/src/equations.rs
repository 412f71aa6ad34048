#![forbid(unsafe_code)]

//! Linear-system validators: `solve` by rank case analysis, `det` against
//! the oracle.

use lagrade_oracle::{augmented_rank, det, matrix_rank, matrix_shape, matvec, solve};

use crate::candidate::{EquationsCandidate, SolveAnswer};
use crate::verdict::{Diagnostic, DiagnosticValue, Fingerprint, TrialVerdict};
use crate::{CheckError, CheckerConfig, Stage};

pub const WRONG_INCONSISTENT: &str = "Incorrect result for Inconsistent system of equations";
pub const WRONG_INFINITE: &str = "Incorrect result for Infinite solutions";
pub const WRONG_SOLUTION: &str = "Incorrect result for Ax = b";
pub const WRONG_NON_SQUARE_DET: &str = "Incorrect result for non-square matrix";
pub const WRONG_DET: &str = "Incorrect result for determinant";

/// What a correct `solve` must return for `A x = b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedAnswer {
    Inconsistent,
    Infinite,
    /// Any `x` with `A x ≈ b`.
    Solution,
}

/// Rank case analysis: `rank(A) != rank([A | b])` means no solution;
/// otherwise fewer independent rows than rows means infinitely many.
pub fn classify_system(a: &[Vec<f64>], b: &[f64]) -> Result<ExpectedAnswer, CheckError> {
    let (rows, _) = matrix_shape(a)?;
    let rank_a = matrix_rank(a)?;
    let rank_ab = augmented_rank(a, b)?;
    Ok(if rank_a != rank_ab {
        ExpectedAnswer::Inconsistent
    } else if rank_a < rows {
        ExpectedAnswer::Infinite
    } else {
        ExpectedAnswer::Solution
    })
}

pub fn validate_solve<C: EquationsCandidate + ?Sized>(
    candidate: &mut C,
    a: &[Vec<f64>],
    b: &[f64],
    config: &CheckerConfig,
) -> Result<TrialVerdict, CheckError> {
    let answer = candidate.solve(a.to_vec(), b.to_vec())?;
    let expected = classify_system(a, b)?;

    let violation = match (expected, &answer) {
        (ExpectedAnswer::Inconsistent, SolveAnswer::Inconsistent)
        | (ExpectedAnswer::Infinite, SolveAnswer::Infinite) => None,
        (ExpectedAnswer::Inconsistent, _) => Some(WRONG_INCONSISTENT),
        (ExpectedAnswer::Infinite, _) => Some(WRONG_INFINITE),
        (ExpectedAnswer::Solution, SolveAnswer::Solution(x)) => {
            // A wrong-length x cannot be multiplied and is simply wrong.
            let satisfied = matvec(a, x).is_ok_and(|ax| config.tolerance.vector(&ax, b));
            (!satisfied).then_some(WRONG_SOLUTION)
        }
        (ExpectedAnswer::Solution, _) => Some(WRONG_SOLUTION),
    };
    let Some(violation) = violation else {
        return Ok(TrialVerdict::Pass);
    };

    let fixture_id = Fingerprint::new(Stage::Equations.slug())
        .matrix(a)
        .vector(b)
        .finish();
    let returned = match answer {
        SolveAnswer::Solution(x) => DiagnosticValue::Vector(x),
        sentinel => DiagnosticValue::Text(sentinel.to_string()),
    };
    // The oracle's exact solve is shown even for sentinel cases, where it
    // usually fails and says why.
    let correct = match solve(a, b) {
        Ok(x) => DiagnosticValue::Vector(x),
        Err(err) => DiagnosticValue::Text(format!("unavailable: {err}")),
    };
    Ok(TrialVerdict::Fail(
        Diagnostic::new(violation, fixture_id)
            .with("A", a.to_vec())
            .with("b", b.to_vec())
            .with("returned answer", returned)
            .with("correct answer", correct),
    ))
}

pub fn validate_det<C: EquationsCandidate + ?Sized>(
    candidate: &mut C,
    a: &[Vec<f64>],
    config: &CheckerConfig,
) -> Result<TrialVerdict, CheckError> {
    let returned = candidate.det(a.to_vec())?;
    let (rows, cols) = matrix_shape(a)?;

    let (violation, expected) = if rows == cols {
        let expected = det(a)?;
        let ok = config.tolerance.scalar(returned, expected);
        ((!ok).then_some(WRONG_DET), expected)
    } else {
        // Non-square determinants are defined as exactly zero here.
        ((returned != 0.0).then_some(WRONG_NON_SQUARE_DET), 0.0)
    };
    let Some(violation) = violation else {
        return Ok(TrialVerdict::Pass);
    };

    let fixture_id = Fingerprint::new(Stage::Equations.slug()).matrix(a).finish();
    Ok(TrialVerdict::Fail(
        Diagnostic::new(violation, fixture_id)
            .with("A", a.to_vec())
            .with("returned answer", returned)
            .with("correct answer", expected),
    ))
}
