#![forbid(unsafe_code)]

//! Console reporting and the machine-readable run report.

use std::fs;
use std::io::Write;
use std::path::Path;

use lagrade_runtime::{TrialLedger, TrialLogEntry};
use serde::{Deserialize, Serialize};

use crate::verdict::Diagnostic;
use crate::{CheckError, Stage};

const RULE_WIDTH: usize = 80;
const INFO_STYLE: &str = "\u{1b}[43m\u{1b}[30m";
const DEBUG_STYLE: &str = "\u{1b}[41m\u{1b}[30m";
const RESET: &str = "\u{1b}[0m";

/// Result of one trial loop ("non-singular matrix", "solve Ax=b", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub name: String,
    pub trials_run: usize,
    pub passed: bool,
    pub marks_awarded: u32,
    pub bonus: bool,
    /// Trials accepted without comparison.
    pub unchecked: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    pub marks: u32,
    /// Printed denominator. `marks` may exceed it when a bonus is earned.
    pub max_marks: u32,
    pub checks: Vec<CheckOutcome>,
}

impl StageReport {
    #[must_use]
    pub fn new(stage: Stage, max_marks: u32, checks: Vec<CheckOutcome>) -> Self {
        let marks = checks.iter().map(|c| c.marks_awarded).sum();
        Self {
            stage,
            marks,
            max_marks,
            checks,
        }
    }

    #[must_use]
    pub fn check(&self, name: &str) -> Option<&CheckOutcome> {
        self.checks.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    pub seed: u64,
    pub num_tests: usize,
    pub stages: Vec<StageReport>,
}

impl CheckReport {
    #[must_use]
    pub fn total_marks(&self) -> u32 {
        self.stages.iter().map(|s| s.marks).sum()
    }

    #[must_use]
    pub fn max_marks(&self) -> u32 {
        self.stages.iter().map(|s| s.max_marks).sum()
    }

    #[must_use]
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    pub fn to_json(&self) -> Result<String, CheckError> {
        serde_json::to_string_pretty(self).map_err(CheckError::ReportSerialize)
    }

    pub fn write_json(&self, path: &Path) -> Result<(), CheckError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| CheckError::ReportIo {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Human console output plus the run's structured trial ledger.
///
/// Console text is written to any [`Write`]; with colour enabled, status
/// lines get a yellow background and failure dumps a red one.
#[derive(Debug)]
pub struct Reporter<W: Write> {
    out: W,
    color: bool,
    ledger: TrialLedger,
}

impl<W: Write> Reporter<W> {
    #[must_use]
    pub fn new(out: W, ledger_capacity: usize) -> Self {
        Self {
            out,
            color: false,
            ledger: TrialLedger::new(ledger_capacity),
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn info(&mut self, text: &str) -> Result<(), CheckError> {
        if self.color {
            write!(self.out, "{INFO_STYLE}{text}{RESET}")?;
        } else {
            self.out.write_all(text.as_bytes())?;
        }
        Ok(())
    }

    /// Rule and stage title. Simplex has a single check, so its title
    /// doubles as the check label and the result follows on the same line.
    pub fn stage_heading(&mut self, stage: Stage) -> Result<(), CheckError> {
        let rule = "-".repeat(RULE_WIDTH);
        match stage {
            Stage::Simplex => self.info(&format!("{rule}\nTesting {stage}:  ")),
            _ => self.info(&format!("{rule}\nTesting {stage}\n")),
        }
    }

    pub fn check_label(&mut self, label: &str) -> Result<(), CheckError> {
        self.info(&format!("\t {label} "))
    }

    pub fn success(&mut self) -> Result<(), CheckError> {
        self.info("\t Success!\n")
    }

    pub fn bonus_success(&mut self, marks: u32) -> Result<(), CheckError> {
        self.info(&format!("Success! ({marks} bonus marks)\n"))
    }

    pub fn failed(&mut self) -> Result<(), CheckError> {
        self.info("\t Failed\n")
    }

    /// Full numeric dump of a failed trial.
    pub fn diagnostic(&mut self, diagnostic: &Diagnostic) -> Result<(), CheckError> {
        if self.color {
            writeln!(self.out, "\n{DEBUG_STYLE}{diagnostic}{RESET}")?;
        } else {
            writeln!(self.out, "\n{diagnostic}")?;
        }
        Ok(())
    }

    pub fn final_marks(&mut self, stage: Stage, marks: u32, max: u32) -> Result<(), CheckError> {
        self.info(&format!("\t Final Marks for {stage}: {marks} / {max}\n"))
    }

    pub fn flush(&mut self) -> Result<(), CheckError> {
        self.out.flush()?;
        Ok(())
    }

    pub fn record(&mut self, entry: TrialLogEntry) {
        self.ledger.record(entry);
    }

    #[must_use]
    pub fn ledger(&self) -> &TrialLedger {
        &self.ledger
    }

    pub fn write_ledger(&self, path: &Path) -> Result<(), CheckError> {
        let mut jsonl = self.ledger.to_jsonl();
        jsonl.push('\n');
        fs::write(path, jsonl).map_err(|source| CheckError::ReportIo {
            path: path.to_path_buf(),
            source,
        })
    }

    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }
}
