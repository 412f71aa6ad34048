#![forbid(unsafe_code)]

use lagrade_checker::{
    Checker, CheckerConfig, ReferenceEquations, ReferencePldu, ReferenceSimplex,
};
use lagrade_runtime::TrialLedger;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Default)]
struct CliArgs {
    config: Option<PathBuf>,
    seed: Option<u64>,
    num_tests: Option<usize>,
    report: Option<PathBuf>,
    log: Option<PathBuf>,
    color: bool,
}

#[derive(Debug, Clone)]
enum CliParseError {
    Help,
    Message(String),
}

fn value_for<'a>(args: &'a [String], index: usize, flag: &str) -> Result<&'a str, CliParseError> {
    args.get(index + 1)
        .map(String::as_str)
        .ok_or_else(|| CliParseError::Message(format!("missing value for {flag}")))
}

fn parse_cli_args(args: &[String]) -> Result<CliArgs, CliParseError> {
    let mut parsed = CliArgs::default();

    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "-h" | "--help" => return Err(CliParseError::Help),
            "--config" => {
                parsed.config = Some(PathBuf::from(value_for(args, index, "--config")?));
                index += 2;
            }
            "--seed" => {
                let raw = value_for(args, index, "--seed")?;
                let seed = raw.parse().map_err(|_| {
                    CliParseError::Message(format!("--seed expects an unsigned integer, got `{raw}`"))
                })?;
                parsed.seed = Some(seed);
                index += 2;
            }
            "--num-tests" => {
                let raw = value_for(args, index, "--num-tests")?;
                let count = raw.parse().map_err(|_| {
                    CliParseError::Message(format!(
                        "--num-tests expects an unsigned integer, got `{raw}`"
                    ))
                })?;
                parsed.num_tests = Some(count);
                index += 2;
            }
            "--report" => {
                parsed.report = Some(PathBuf::from(value_for(args, index, "--report")?));
                index += 2;
            }
            "--log" => {
                parsed.log = Some(PathBuf::from(value_for(args, index, "--log")?));
                index += 2;
            }
            "--color" => {
                parsed.color = true;
                index += 1;
            }
            unknown => {
                return Err(CliParseError::Message(format!(
                    "unrecognized argument `{unknown}`"
                )));
            }
        }
    }

    Ok(parsed)
}

fn print_usage(program: &str) {
    eprintln!(
        "Usage: {program} [--config <path>] [--seed <n>] [--num-tests <n>] [--report <path>] [--log <path>] [--color]"
    );
    eprintln!("  --config <path>   JSON checker configuration (defaults apply when absent)");
    eprintln!("  --seed <n>        override the configured seed");
    eprintln!("  --num-tests <n>   override the trials per check");
    eprintln!("  --report <path>   write the JSON mark report here");
    eprintln!("  --log <path>      write the JSONL trial ledger here");
    eprintln!("  --color           highlight diagnostics with ANSI colours");
}

fn build_config(args: &CliArgs) -> Result<CheckerConfig, lagrade_checker::CheckError> {
    let mut config = match &args.config {
        Some(path) => CheckerConfig::load(path)?,
        None => CheckerConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(num_tests) = args.num_tests {
        config.num_tests = num_tests;
    }
    config.color |= args.color;
    Ok(config)
}

/// Stderr lines naming each failed trial, the ledger occupancy and, when the
/// run aborted, the last trial it reached.
fn ledger_summary(ledger: &TrialLedger, aborted: bool) -> Vec<String> {
    let mut lines: Vec<String> = ledger
        .failures()
        .map(|entry| {
            format!(
                "FAIL trial={} fixture={} {}",
                entry.trial_id,
                entry.fixture_id.as_deref().unwrap_or("-"),
                entry.message
            )
        })
        .collect();
    if aborted && let Some(last) = ledger.latest() {
        lines.push(format!("last_trial={} {}", last.trial_id, last.message));
    }
    lines.push(format!(
        "ledger kept={}/{} evicted={}",
        ledger.len(),
        ledger.capacity(),
        ledger.evicted()
    ));
    lines
}

fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args().collect();
    let program = argv
        .first()
        .cloned()
        .unwrap_or_else(|| String::from("lagrade_check"));

    let args = match parse_cli_args(argv.get(1..).unwrap_or_default()) {
        Ok(args) => args,
        Err(CliParseError::Help) => {
            print_usage(&program);
            return ExitCode::SUCCESS;
        }
        Err(CliParseError::Message(message)) => {
            eprintln!("{message}");
            print_usage(&program);
            return ExitCode::from(2);
        }
    };

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("config error: {error}");
            return ExitCode::from(2);
        }
    };

    // Reference candidates self-check the harness; embedders supply their own.
    let mut checker = match Checker::new(config, std::io::stdout()) {
        Ok(checker) => checker,
        Err(error) => {
            eprintln!("config error: {error}");
            return ExitCode::from(2);
        }
    };
    let outcome = checker.check_all(&mut ReferencePldu, &mut ReferenceEquations, &mut ReferenceSimplex);

    if let Some(path) = &args.log
        && let Err(error) = checker.reporter().write_ledger(path)
    {
        eprintln!("ledger error: {error}");
        return ExitCode::from(2);
    }

    for line in ledger_summary(checker.ledger(), outcome.is_err()) {
        eprintln!("{line}");
    }

    let report = match outcome {
        Ok(report) => report,
        Err(error) => {
            eprintln!("check error: {error}");
            return ExitCode::from(2);
        }
    };

    if let Some(path) = &args.report
        && let Err(error) = report.write_json(path)
    {
        eprintln!("report error: {error}");
        return ExitCode::from(2);
    }

    eprintln!(
        "seed={} num_tests={} marks={}",
        report.seed,
        report.num_tests,
        report.total_marks()
    );
    let lost = report
        .stages
        .iter()
        .flat_map(|stage| &stage.checks)
        .any(|check| !check.passed);
    if lost {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
