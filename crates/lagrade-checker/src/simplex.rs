#![forbid(unsafe_code)]

//! LP optimality validator.
//!
//! Only the objective value is judged. Any optimal vertex is accepted, and
//! the returned `x` is not checked for feasibility.

use lagrade_oracle::{dot, linprog};

use crate::candidate::SimplexCandidate;
use crate::verdict::{Diagnostic, DiagnosticValue, Fingerprint, TrialVerdict};
use crate::{CheckError, CheckerConfig, Stage};

pub const SUBOPTIMAL: &str = "Suboptimal result for Simplex";
pub const WRONG_LENGTH: &str = "Returned vector has the wrong length for Simplex";

/// Checks `maximize c · x  s.t.  A x <= b, x >= 0`.
///
/// When the oracle finds no finite optimum the trial is
/// [`TrialVerdict::Unchecked`]: nothing the candidate returns can be
/// compared against it.
pub fn validate_simplex<C: SimplexCandidate + ?Sized>(
    candidate: &mut C,
    a: &[Vec<f64>],
    b: &[f64],
    c: &[f64],
    config: &CheckerConfig,
) -> Result<TrialVerdict, CheckError> {
    let x = candidate.simplex(a.to_vec(), b.to_vec(), c.to_vec())?;
    let value = dot(c, &x).ok();

    let negated: Vec<f64> = c.iter().map(|v| -v).collect();
    let oracle = linprog(&negated, a, b)?;
    let optimal = oracle.is_optimal();
    let (optimum_x, optimum) = match (oracle.x, oracle.fun) {
        (Some(ox), Some(fun)) if optimal => (ox, -fun),
        _ => {
            return Ok(TrialVerdict::Unchecked {
                reason: String::from(oracle.status.message()),
            });
        }
    };

    let violation = match value {
        None => WRONG_LENGTH,
        Some(v) if config.tolerance.scalar(v, optimum) => return Ok(TrialVerdict::Pass),
        Some(_) => SUBOPTIMAL,
    };

    let fixture_id = Fingerprint::new(Stage::Simplex.slug())
        .matrix(a)
        .vector(b)
        .vector(c)
        .finish();
    let value_section = match value {
        Some(v) => DiagnosticValue::Scalar(v),
        None => DiagnosticValue::Text(format!(
            "undefined: {} entries for {} variables",
            x.len(),
            c.len()
        )),
    };
    Ok(TrialVerdict::Fail(
        Diagnostic::new(violation, fixture_id)
            .with("A", a.to_vec())
            .with("b", b.to_vec())
            .with("c", c.to_vec())
            .with("returned answer", x)
            .with("returned value", value_section)
            .with("correct answer", optimum_x)
            .with("correct optimal value", optimum),
    ))
}
