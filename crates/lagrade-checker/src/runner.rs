#![forbid(unsafe_code)]

//! Trial loops, scoring and stage sequencing.
//!
//! One seeded [`StdRng`] feeds every fixture of a run, so trial order is
//! part of reproducibility: the same seed and config replay the same
//! matrices in the same order.

use std::io::Write;

use lagrade_runtime::{InterruptFlag, LogLevel, TrialLedger, TrialLogEntry, TrialResult};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::candidate::{EquationsCandidate, PlduCandidate, SimplexCandidate};
use crate::equations::{validate_det, validate_solve};
use crate::generator::{
    generate_non_singular_matrix, generate_nonnegative_vector, generate_singular_matrix,
    generate_vector,
};
use crate::pldu::validate_pldu;
use crate::report::{CheckOutcome, CheckReport, Reporter, StageReport};
use crate::simplex::validate_simplex;
use crate::verdict::TrialVerdict;
use crate::{
    BonusMatrices, CheckError, CheckerConfig, DET_MARKS, PLDU_BONUS_MARKS, PLDU_MARKS,
    SIMPLEX_MARKS, SOLVE_MARKS, STAGE_MAX_MARKS, Stage,
};

pub const CHECK_PLDU: &str = "non-singular";
pub const CHECK_PLDU_BONUS: &str = "bonus";
pub const CHECK_SOLVE: &str = "solve";
pub const CHECK_DET: &str = "det";
pub const CHECK_SIMPLEX: &str = "simplex";

/// Drives candidates through the three stages and scores them.
///
/// A stage's check stops at its first failing trial. Candidate errors,
/// oracle errors and interrupts end the whole run through `Err`.
#[derive(Debug)]
pub struct Checker<W: Write> {
    config: CheckerConfig,
    rng: StdRng,
    reporter: Reporter<W>,
    interrupt: InterruptFlag,
}

impl<W: Write> Checker<W> {
    pub fn new(config: CheckerConfig, out: W) -> Result<Self, CheckError> {
        config.validate()?;
        let reporter = Reporter::new(out, config.ledger_capacity).with_color(config.color);
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            reporter,
            interrupt: InterruptFlag::new(),
        })
    }

    /// Shares an externally owned interrupt flag, e.g. one raised from a
    /// signal handler.
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: InterruptFlag) -> Self {
        self.interrupt = interrupt;
        self
    }

    #[must_use]
    pub fn interrupt_handle(&self) -> InterruptFlag {
        self.interrupt.clone()
    }

    #[must_use]
    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    #[must_use]
    pub fn ledger(&self) -> &TrialLedger {
        self.reporter.ledger()
    }

    #[must_use]
    pub fn reporter(&self) -> &Reporter<W> {
        &self.reporter
    }

    #[must_use]
    pub fn into_output(self) -> W {
        self.reporter.into_inner()
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Restarts the random stream from `config.seed`, then runs PLDU,
    /// Equations and Simplex in that order. Stage calls made beforehand on
    /// the same checker do not shift its fixtures.
    pub fn check_all<P, E, S>(
        &mut self,
        pldu: &mut P,
        equations: &mut E,
        simplex: &mut S,
    ) -> Result<CheckReport, CheckError>
    where
        P: PlduCandidate + ?Sized,
        E: EquationsCandidate + ?Sized,
        S: SimplexCandidate + ?Sized,
    {
        self.reseed(self.config.seed);
        let stages = vec![
            self.check_pldu(pldu)?,
            self.check_equations(equations)?,
            self.check_simplex(simplex)?,
        ];
        Ok(CheckReport {
            seed: self.config.seed,
            num_tests: self.config.num_tests,
            stages,
        })
    }

    /// Non-singular round worth 6 marks; if it passes, a bonus round worth 2.
    pub fn check_pldu<C: PlduCandidate + ?Sized>(
        &mut self,
        candidate: &mut C,
    ) -> Result<StageReport, CheckError> {
        let stage = Stage::Pldu;
        self.reporter.stage_heading(stage)?;

        self.reporter.check_label("non-singular matrix:")?;
        let base = self.run_trials(stage, CHECK_PLDU, PLDU_MARKS, false, |rng, config| {
            let a = generate_non_singular_matrix(rng, config.dims(), config.entry_max)?;
            validate_pldu(candidate, &a, config)
        })?;

        let mut checks = vec![base];
        if checks[0].passed {
            let label = match self.config.pldu_bonus_matrices {
                BonusMatrices::NonSingular => "bonus: repeated non-singular matrix:",
                BonusMatrices::Singular => "bonus: singular matrix:",
            };
            self.reporter.check_label(label)?;
            let bonus = self.run_trials(
                stage,
                CHECK_PLDU_BONUS,
                PLDU_BONUS_MARKS,
                true,
                |rng, config| {
                    let a = match config.pldu_bonus_matrices {
                        BonusMatrices::NonSingular => {
                            generate_non_singular_matrix(rng, config.dims(), config.entry_max)?
                        }
                        BonusMatrices::Singular => {
                            generate_singular_matrix(rng, config.dims(), config.entry_max)?
                        }
                    };
                    validate_pldu(candidate, &a, config)
                },
            )?;
            checks.push(bonus);
        }
        self.finish_stage(stage, checks)
    }

    /// `solve` and `det`, 3 marks each, judged independently.
    pub fn check_equations<C: EquationsCandidate + ?Sized>(
        &mut self,
        candidate: &mut C,
    ) -> Result<StageReport, CheckError> {
        let stage = Stage::Equations;
        self.reporter.stage_heading(stage)?;

        self.reporter.check_label("solve Ax=b:")?;
        let solve = self.run_trials(stage, CHECK_SOLVE, SOLVE_MARKS, false, |rng, config| {
            let a = generate_non_singular_matrix(rng, config.dims(), config.entry_max)?;
            let b = generate_vector(rng, a.len(), config.vector_max)?;
            validate_solve(candidate, &a, &b, config)
        })?;

        self.reporter.check_label("determinant:")?;
        let det = self.run_trials(stage, CHECK_DET, DET_MARKS, false, |rng, config| {
            let a = generate_non_singular_matrix(rng, config.dims(), config.entry_max)?;
            validate_det(candidate, &a, config)
        })?;

        self.finish_stage(stage, vec![solve, det])
    }

    /// LP optimality over rank-deficient constraint matrices, 6 marks.
    pub fn check_simplex<C: SimplexCandidate + ?Sized>(
        &mut self,
        candidate: &mut C,
    ) -> Result<StageReport, CheckError> {
        let stage = Stage::Simplex;
        self.reporter.stage_heading(stage)?;

        let outcome = self.run_trials(stage, CHECK_SIMPLEX, SIMPLEX_MARKS, false, |rng, config| {
            let a = generate_singular_matrix(rng, config.dims(), config.entry_max)?;
            let b = generate_nonnegative_vector(rng, a.len(), config.simplex_rhs_max)?;
            let cols = a.first().map_or(0, Vec::len);
            let c = generate_vector(rng, cols, config.vector_max)?;
            validate_simplex(candidate, &a, &b, &c, config)
        })?;

        self.finish_stage(stage, vec![outcome])
    }

    fn run_trials<F>(
        &mut self,
        stage: Stage,
        check: &str,
        marks: u32,
        bonus: bool,
        mut trial: F,
    ) -> Result<CheckOutcome, CheckError>
    where
        F: FnMut(&mut StdRng, &CheckerConfig) -> Result<TrialVerdict, CheckError>,
    {
        let mut unchecked = 0;
        for index in 0..self.config.num_tests {
            let step = self
                .interrupt
                .check()
                .map_err(CheckError::from)
                .and_then(|()| trial(&mut self.rng, &self.config));
            let verdict = match step {
                Ok(verdict) => verdict,
                Err(err) => {
                    let level = match err {
                        CheckError::Interrupted(_) => LogLevel::Warn,
                        _ => LogLevel::Error,
                    };
                    let entry = self.trial_entry(stage, check, index, err.to_string());
                    self.reporter.record(entry.with_level(level));
                    return Err(err);
                }
            };

            match verdict {
                TrialVerdict::Pass => {
                    let entry = self.trial_entry(stage, check, index, String::from("pass"));
                    self.reporter.record(
                        entry
                            .with_level(LogLevel::Debug)
                            .with_result(TrialResult::Pass),
                    );
                }
                TrialVerdict::Unchecked { reason } => {
                    unchecked += 1;
                    let entry = self.trial_entry(stage, check, index, reason);
                    self.reporter.record(
                        entry
                            .with_level(LogLevel::Debug)
                            .with_result(TrialResult::Skip),
                    );
                }
                TrialVerdict::Fail(diagnostic) => {
                    let entry = self.trial_entry(stage, check, index, diagnostic.verdict.clone());
                    self.reporter.record(
                        entry
                            .with_level(LogLevel::Error)
                            .with_result(TrialResult::Fail)
                            .with_fixture(diagnostic.fixture_id.clone()),
                    );
                    self.reporter.diagnostic(&diagnostic)?;
                    self.reporter.failed()?;
                    return Ok(CheckOutcome {
                        name: check.to_string(),
                        trials_run: index + 1,
                        passed: false,
                        marks_awarded: 0,
                        bonus,
                        unchecked,
                        failure: Some(diagnostic),
                    });
                }
            }
        }

        if bonus {
            self.reporter.bonus_success(marks)?;
        } else {
            self.reporter.success()?;
        }
        Ok(CheckOutcome {
            name: check.to_string(),
            trials_run: self.config.num_tests,
            passed: true,
            marks_awarded: marks,
            bonus,
            unchecked,
            failure: None,
        })
    }

    fn trial_entry(&self, stage: Stage, check: &str, index: usize, message: String) -> TrialLogEntry {
        TrialLogEntry::new(
            format!("{}-{check}-{index:05}", stage.slug()),
            stage.slug(),
            message,
        )
        .with_seed(self.config.seed)
        .with_trial_index(index)
    }

    fn finish_stage(
        &mut self,
        stage: Stage,
        checks: Vec<CheckOutcome>,
    ) -> Result<StageReport, CheckError> {
        let report = StageReport::new(stage, STAGE_MAX_MARKS, checks);
        self.reporter.final_marks(stage, report.marks, report.max_marks)?;
        let entry = TrialLogEntry::new(
            format!("{}-final", stage.slug()),
            stage.slug(),
            format!("final marks {} / {}", report.marks, report.max_marks),
        );
        self.reporter.record(entry.with_seed(self.config.seed));
        self.reporter.flush()?;
        Ok(report)
    }
}
