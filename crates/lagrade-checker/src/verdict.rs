#![forbid(unsafe_code)]

//! Trial verdicts and the diagnostics attached to failures.

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use crate::candidate::Matrix;

/// Outcome of one validated trial.
///
/// Only property violations live here. Errors raised by the candidate or
/// an interrupt are carried on the `Err` side of the validator's result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum TrialVerdict {
    Pass,
    /// Accepted without a check, e.g. an LP the oracle could not optimise.
    Unchecked { reason: String },
    Fail(Diagnostic),
}

impl TrialVerdict {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Fail(_))
    }

    #[must_use]
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::Fail(diagnostic) => Some(diagnostic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DiagnosticValue {
    Scalar(f64),
    Vector(Vec<f64>),
    Matrix(Matrix),
    Text(String),
}

impl From<f64> for DiagnosticValue {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<f64>> for DiagnosticValue {
    fn from(value: Vec<f64>) -> Self {
        Self::Vector(value)
    }
}

impl From<Matrix> for DiagnosticValue {
    fn from(value: Matrix) -> Self {
        Self::Matrix(value)
    }
}

impl From<String> for DiagnosticValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticSection {
    pub label: String,
    pub value: DiagnosticValue,
}

/// Everything a human needs to reproduce a failed trial: the violated
/// property, the inputs, the candidate's outputs and the expected values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub verdict: String,
    pub fixture_id: String,
    pub sections: Vec<DiagnosticSection>,
}

impl Diagnostic {
    #[must_use]
    pub fn new(verdict: impl Into<String>, fixture_id: impl Into<String>) -> Self {
        Self {
            verdict: verdict.into(),
            fixture_id: fixture_id.into(),
            sections: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, label: impl Into<String>, value: impl Into<DiagnosticValue>) -> Self {
        self.sections.push(DiagnosticSection {
            label: label.into(),
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn section(&self, label: &str) -> Option<&DiagnosticValue> {
        self.sections
            .iter()
            .find(|s| s.label == label)
            .map(|s| &s.value)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Verdict: {}", self.verdict)?;
        for section in &self.sections {
            writeln!(f, "{}", section.label)?;
            match &section.value {
                DiagnosticValue::Scalar(v) => writeln!(f, "{}", format_scalar(*v))?,
                DiagnosticValue::Vector(v) => writeln!(f, "{}", format_row(v))?,
                DiagnosticValue::Matrix(m) => write!(f, "{}", format_matrix(m))?,
                DiagnosticValue::Text(t) => writeln!(f, "{t}")?,
            }
        }
        write!(f, "fixture {}", self.fixture_id)
    }
}

/// Round half away from zero to two decimals, folding `-0.00` into `0.00`.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0 + 0.0
}

fn format_scalar(value: f64) -> String {
    format!("{:.2}", round2(value))
}

fn format_row(row: &[f64]) -> String {
    let mut out = String::from("[");
    for value in row {
        let _ = write!(out, " {:>8.2}", round2(*value));
    }
    out.push_str(" ]");
    out
}

/// One bracketed row per line, every entry rounded to two decimals.
#[must_use]
pub fn format_matrix(m: &[Vec<f64>]) -> String {
    let mut out = String::new();
    for row in m {
        out.push_str(&format_row(row));
        out.push('\n');
    }
    if m.is_empty() {
        out.push_str("[]\n");
    }
    out
}

/// Stable short id for a trial's inputs, for correlating console output
/// with the JSONL trial log.
#[derive(Debug, Default)]
pub struct Fingerprint {
    hasher: blake3::Hasher,
}

impl Fingerprint {
    #[must_use]
    pub fn new(stage: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(stage.as_bytes());
        Self { hasher }
    }

    #[must_use]
    pub fn matrix(mut self, m: &[Vec<f64>]) -> Self {
        self.hasher.update(&(m.len() as u64).to_le_bytes());
        for row in m {
            self = self.vector(row);
        }
        self
    }

    #[must_use]
    pub fn vector(mut self, v: &[f64]) -> Self {
        self.hasher.update(&(v.len() as u64).to_le_bytes());
        for value in v {
            self.hasher.update(&value.to_le_bytes());
        }
        self
    }

    #[must_use]
    pub fn finish(self) -> String {
        let hash = self.hasher.finalize();
        hash.to_hex().as_str()[..16].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_is_two_decimals_without_negative_zero() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(-1.235_000_1), -1.24);
        assert_eq!(format_scalar(-0.001), "0.00");
    }

    #[test]
    fn diagnostic_renders_every_section() {
        let diagnostic = Diagnostic::new("P is not a permutation matrix", "00ff")
            .with("A", vec![vec![1.0, 2.0], vec![3.0, 4.0]])
            .with("b", vec![1.0, -0.5])
            .with("returned answer", 0.333)
            .with("correct answer", String::from("unavailable: singular matrix"));
        let text = diagnostic.to_string();
        assert!(text.starts_with("Verdict: P is not a permutation matrix\n"));
        assert!(text.contains("[     1.00     2.00 ]\n[     3.00     4.00 ]\n"));
        assert!(text.contains("[     1.00    -0.50 ]"));
        assert!(text.contains("0.33"));
        assert!(text.contains("unavailable: singular matrix"));
        assert!(text.ends_with("fixture 00ff"));
        assert_eq!(
            diagnostic.section("returned answer"),
            Some(&DiagnosticValue::Scalar(0.333))
        );
    }

    #[test]
    fn fingerprint_depends_on_shape_and_values() {
        let a = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let flat = vec![vec![1.0, 2.0, 3.0, 4.0]];
        let id_a = Fingerprint::new("pldu").matrix(&a).finish();
        assert_eq!(id_a.len(), 16);
        assert_eq!(id_a, Fingerprint::new("pldu").matrix(&a).finish());
        assert_ne!(id_a, Fingerprint::new("pldu").matrix(&flat).finish());
        assert_ne!(id_a, Fingerprint::new("equations").matrix(&a).finish());
    }

    #[test]
    fn verdict_helpers() {
        let fail = TrialVerdict::Fail(Diagnostic::new("bad", "id"));
        assert!(fail.is_failure());
        assert_eq!(fail.diagnostic().map(|d| d.verdict.as_str()), Some("bad"));
        assert!(!TrialVerdict::Pass.is_failure());
        assert!(TrialVerdict::Unchecked {
            reason: String::from("unbounded")
        }
        .diagnostic()
        .is_none());
    }
}
