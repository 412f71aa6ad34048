#![forbid(unsafe_code)]
//! End-to-end runs of the checker over reference and broken candidates.

use std::fs;
use std::path::PathBuf;

use lagrade_checker::candidate::{CandidateError, Matrix, PlduFactors};
use lagrade_checker::runner::{CHECK_DET, CHECK_PLDU, CHECK_PLDU_BONUS, CHECK_SOLVE, CHECK_SIMPLEX};
use lagrade_checker::{
    BonusMatrices, CheckError, Checker, CheckerConfig, EquationsCandidate, EquationsFns,
    PlduCandidate, ReferenceEquations, ReferencePldu, ReferenceSimplex, SolveAnswer, Stage,
};
use lagrade_runtime::{InterruptFlag, TrialLogEntry, TrialResult};

fn small_config(num_tests: usize) -> CheckerConfig {
    CheckerConfig {
        num_tests,
        ..CheckerConfig::default()
    }
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("lagrade-{}-{name}", std::process::id()))
}

#[test]
fn reference_candidates_earn_every_mark() {
    let mut checker = Checker::new(small_config(200), Vec::new()).expect("valid config");
    let report = checker
        .check_all(&mut ReferencePldu, &mut ReferenceEquations, &mut ReferenceSimplex)
        .expect("run completes");

    assert_eq!(report.seed, 0);
    assert_eq!(report.stage(Stage::Pldu).map(|s| s.marks), Some(8));
    assert_eq!(report.stage(Stage::Equations).map(|s| s.marks), Some(6));
    assert_eq!(report.stage(Stage::Simplex).map(|s| s.marks), Some(6));
    assert_eq!(report.total_marks(), 20);
    assert_eq!(report.max_marks(), 18);

    let pldu = report.stage(Stage::Pldu).expect("pldu stage");
    assert!(pldu.check(CHECK_PLDU).is_some_and(|c| c.passed && c.trials_run == 200));
    assert!(pldu.check(CHECK_PLDU_BONUS).is_some_and(|c| c.bonus));

    let out = String::from_utf8(checker.into_output()).expect("utf8");
    assert!(out.contains("Testing PLDU\n\t non-singular matrix: \t Success!\n"));
    assert!(out.contains("Success! (2 bonus marks)\n"));
    assert!(out.contains("\t Final Marks for PLDU: 8 / 6\n"));
    assert!(out.contains("Testing Equations\n\t solve Ax=b: \t Success!\n\t determinant: \t Success!\n"));
    assert!(out.contains("\t Final Marks for Equations: 6 / 6\n"));
    assert!(out.contains("Testing Simplex:  \t Success!\n\t Final Marks for Simplex: 6 / 6\n"));
    let pldu_at = out.find("Testing PLDU").expect("pldu");
    let equations_at = out.find("Testing Equations").expect("equations");
    let simplex_at = out.find("Testing Simplex").expect("simplex");
    assert!(pldu_at < equations_at && equations_at < simplex_at);
}

#[test]
fn failing_check_stops_at_first_failure_and_skips_bonus() {
    // P · L · D · U = 2A for every input.
    let mut doubled = |m: Matrix| -> Result<PlduFactors, CandidateError> {
        let eye = lagrade_oracle::identity(m.len());
        let twice: Matrix = eye
            .iter()
            .map(|row| row.iter().map(|v| 2.0 * v).collect())
            .collect();
        Ok(PlduFactors {
            p: eye.clone(),
            l: eye,
            d: twice,
            u: m,
        })
    };
    let mut checker = Checker::new(small_config(50), Vec::new()).expect("valid config");
    let stage = checker.check_pldu(&mut doubled).expect("run completes");

    assert_eq!(stage.marks, 0);
    assert_eq!(stage.checks.len(), 1);
    let base = &stage.checks[0];
    assert!(!base.passed);
    assert_eq!(base.trials_run, 1);
    assert!(base.failure.is_some());

    let failures: Vec<&TrialLogEntry> = checker.ledger().failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].trial_id, "pldu-non-singular-00000");
    assert_eq!(
        failures[0].fixture_id.as_deref(),
        base.failure.as_ref().map(|d| d.fixture_id.as_str())
    );

    let out = String::from_utf8(checker.into_output()).expect("utf8");
    assert!(out.contains("Verdict: Incorrect decomposition"));
    assert!(out.contains("\t Failed\n\t Final Marks for PLDU: 0 / 6\n"));
    assert!(!out.contains("bonus"));
}

#[test]
fn equations_checks_are_scored_independently() {
    let mut det_only = EquationsFns {
        solve: |_a: Matrix, _b: Vec<f64>| Ok::<_, CandidateError>(SolveAnswer::Inconsistent),
        det: |a: Matrix| ReferenceEquations.det(a),
    };
    let mut checker = Checker::new(small_config(20), Vec::new()).expect("valid config");
    let stage = checker.check_equations(&mut det_only).expect("run completes");
    assert_eq!(stage.marks, 3);
    assert!(stage.check(CHECK_SOLVE).is_some_and(|c| !c.passed));
    assert!(stage.check(CHECK_DET).is_some_and(|c| c.passed && c.trials_run == 20));
}

#[test]
fn candidate_error_aborts_the_run() {
    let mut crashing =
        |_a: Matrix, _b: Vec<f64>, _c: Vec<f64>| -> Result<Vec<f64>, CandidateError> {
            Err(CandidateError::Failed(String::from("pivot out of range")))
        };
    let mut checker = Checker::new(small_config(5), Vec::new()).expect("valid config");
    let result = checker.check_all(&mut ReferencePldu, &mut ReferenceEquations, &mut crashing);
    assert!(matches!(result, Err(CheckError::Candidate(_))));
    let last = checker.ledger().latest().expect("logged");
    assert_eq!(last.stage, "simplex");
    assert!(last.message.contains("pivot out of range"));
}

#[test]
fn raised_interrupt_stops_before_the_next_trial() {
    let flag = InterruptFlag::new();
    let mut checker = Checker::new(small_config(5), Vec::new())
        .expect("valid config")
        .with_interrupt(flag.clone());
    flag.raise();
    let result = checker.check_pldu(&mut ReferencePldu);
    assert!(matches!(result, Err(CheckError::Interrupted(_))));
    assert!(checker.ledger().failures().next().is_none());
}

/// Raises the interrupt from inside the candidate after a few calls.
struct InterruptingPldu {
    flag: InterruptFlag,
    calls: usize,
}

impl PlduCandidate for InterruptingPldu {
    fn pldu(&mut self, m: Matrix) -> Result<PlduFactors, CandidateError> {
        self.calls += 1;
        if self.calls == 3 {
            self.flag.raise();
        }
        ReferencePldu.pldu(m)
    }
}

#[test]
fn interrupt_mid_stage_is_not_scored_as_failure() {
    let mut checker = Checker::new(small_config(100), Vec::new()).expect("valid config");
    let mut candidate = InterruptingPldu {
        flag: checker.interrupt_handle(),
        calls: 0,
    };
    let result = checker.check_pldu(&mut candidate);
    assert!(matches!(result, Err(CheckError::Interrupted(_))));
    assert_eq!(candidate.calls, 3);
    let passes = checker
        .ledger()
        .iter()
        .filter(|e| e.result == Some(TrialResult::Pass))
        .count();
    assert_eq!(passes, 3);
}

#[test]
fn same_seed_replays_the_same_run() {
    let run = |seed| {
        let config = CheckerConfig {
            seed,
            ..small_config(30)
        };
        let mut checker = Checker::new(config, Vec::new()).expect("valid config");
        let report = checker
            .check_all(&mut ReferencePldu, &mut ReferenceEquations, &mut ReferenceSimplex)
            .expect("run completes");
        let output = String::from_utf8(checker.into_output()).expect("utf8");
        (report, output)
    };
    assert_eq!(run(7), run(7));
}

#[test]
fn check_all_restarts_the_stream_after_earlier_stage_calls() {
    let fresh = {
        let mut checker = Checker::new(small_config(20), Vec::new()).expect("valid config");
        checker
            .check_all(&mut ReferencePldu, &mut ReferenceEquations, &mut ReferenceSimplex)
            .expect("run completes")
    };
    let mut warmed = Checker::new(small_config(20), Vec::new()).expect("valid config");
    warmed.check_pldu(&mut ReferencePldu).expect("stage completes");
    let replayed = warmed
        .check_all(&mut ReferencePldu, &mut ReferenceEquations, &mut ReferenceSimplex)
        .expect("run completes");
    assert_eq!(fresh, replayed);
}

#[test]
fn singular_bonus_round_is_configurable() {
    let config = CheckerConfig {
        pldu_bonus_matrices: BonusMatrices::Singular,
        ..small_config(50)
    };
    let mut checker = Checker::new(config, Vec::new()).expect("valid config");
    let stage = checker.check_pldu(&mut ReferencePldu).expect("run completes");
    assert_eq!(stage.checks.len(), 2);
    assert!(stage.checks[0].passed);
    let out = String::from_utf8(checker.into_output()).expect("utf8");
    assert!(out.contains("\t bonus: singular matrix: "));
}

#[test]
fn simplex_stage_scores_six() {
    let mut checker = Checker::new(small_config(100), Vec::new()).expect("valid config");
    let stage = checker.check_simplex(&mut ReferenceSimplex).expect("run completes");
    assert_eq!(stage.marks, 6);
    assert!(stage.check(CHECK_SIMPLEX).is_some_and(|c| c.passed));
}

#[test]
fn config_and_report_files_round_trip() {
    let config_path = temp_path("config.json");
    fs::write(&config_path, r#"{"seed": 3, "num_tests": 10}"#).expect("write config");
    let config = CheckerConfig::load(&config_path).expect("load");
    assert_eq!(config.seed, 3);
    assert_eq!(config.num_tests, 10);

    let mut checker = Checker::new(config, Vec::new()).expect("valid config");
    let report = checker
        .check_all(&mut ReferencePldu, &mut ReferenceEquations, &mut ReferenceSimplex)
        .expect("run completes");
    let report_path = temp_path("report.json");
    report.write_json(&report_path).expect("write report");
    let raw = fs::read_to_string(&report_path).expect("read report");
    let parsed: lagrade_checker::CheckReport = serde_json::from_str(&raw).expect("parse report");
    assert_eq!(parsed, report);

    let ledger_path = temp_path("trials.jsonl");
    checker.reporter().write_ledger(&ledger_path).expect("write ledger");
    let lines = fs::read_to_string(&ledger_path).expect("read ledger");
    for line in lines.lines() {
        let entry: TrialLogEntry = serde_json::from_str(line).expect("jsonl entry");
        assert_eq!(entry.seed, Some(3));
    }

    let _ = fs::remove_file(config_path);
    let _ = fs::remove_file(report_path);
    let _ = fs::remove_file(ledger_path);
}

#[test]
fn bad_config_file_is_reported() {
    let path = temp_path("bad-config.json");
    fs::write(&path, "{ not json").expect("write");
    assert!(matches!(
        CheckerConfig::load(&path),
        Err(CheckError::ConfigParse { .. })
    ));
    let _ = fs::remove_file(path);

    let invalid = CheckerConfig {
        max_dim: 1,
        ..CheckerConfig::default()
    };
    assert!(matches!(
        Checker::new(invalid, Vec::new()),
        Err(CheckError::InvalidConfig(_))
    ));
}
