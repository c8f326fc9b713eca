use std::{fmt, future::Future, io::Write};

use tracing::{Instrument, info, info_span, warn};

use crate::error::CheckError;

const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pass,
    Fail,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pass => f.write_str("PASS"),
            Status::Fail => f.write_str("FAIL"),
        }
    }
}

/// Outcome of one executed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: String,
    pub status: Status,
    pub details: String,
}

impl CheckResult {
    pub fn passed(&self) -> bool {
        self.status == Status::Pass
    }
}

/// What a check concluded after its requests completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    pub details: String,
}

impl Verdict {
    pub fn new(passed: bool, details: impl Into<String>) -> Self {
        Self {
            passed,
            details: details.into(),
        }
    }
}

/// Sequential check runner. Owns the ordered results of one run and the
/// sink the report goes to; results are echoed as they are recorded and
/// summarised once at the end.
pub struct Runner<W: Write> {
    out: W,
    results: Vec<CheckResult>,
}

impl<W: Write> Runner<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            results: Vec::new(),
        }
    }

    /// Print a framed heading.
    pub fn banner(&mut self, title: &str) {
        let rule = "=".repeat(RULE_WIDTH);
        self.emit(format_args!("{rule}\n{title}\n{rule}\n"));
    }

    /// Append a result and echo it.
    pub fn record(&mut self, name: impl Into<String>, passed: bool, details: impl Into<String>) {
        let result = CheckResult {
            name: name.into(),
            status: if passed { Status::Pass } else { Status::Fail },
            details: details.into(),
        };

        if result.passed() {
            info!(check = %result.name, details = %result.details, "check passed");
        } else {
            warn!(check = %result.name, details = %result.details, "check failed");
        }

        self.emit(format_args!("{}: {}\n", result.status, result.name));
        if !result.details.is_empty() {
            self.emit(format_args!("  Details: {}\n", result.details));
        }
        self.results.push(result);
    }

    /// Await `check` and record what it produced. Errors become a FAIL whose
    /// details carry the full error chain.
    pub async fn run_check<F>(&mut self, name: &str, check: F)
    where
        F: Future<Output = Result<Verdict, CheckError>>,
    {
        let span = info_span!("check", check = name);
        match check.instrument(span).await {
            Ok(verdict) => self.record(name, verdict.passed, verdict.details),
            Err(err) => self.record(name, false, err.render()),
        }
    }

    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    /// Print the totals and the failing checks, then hand back the results.
    pub fn summarize(mut self) -> Summary {
        let summary = Summary::new(std::mem::take(&mut self.results));
        let total = summary.total();

        self.emit(format_args!("\n"));
        self.banner("TEST SUMMARY");
        self.emit(format_args!("Passed: {}/{total}\n", summary.passed));
        self.emit(format_args!("Failed: {}/{total}\n", summary.failed));

        if summary.failed > 0 {
            self.emit(format_args!("\nFailed Tests:\n"));
            for result in summary.failures() {
                self.emit(format_args!("  - {}: {}\n", result.name, result.details));
            }
        }

        if let Err(err) = self.out.flush() {
            warn!(error = %err, "failed to flush report");
        }
        info!(
            total,
            passed = summary.passed,
            failed = summary.failed,
            "run finished"
        );
        summary
    }

    fn emit(&mut self, args: fmt::Arguments<'_>) {
        if let Err(err) = self.out.write_fmt(args) {
            warn!(error = %err, "failed to write report line");
        }
    }
}

/// Final tally of a run.
#[derive(Debug, Clone)]
pub struct Summary {
    pub results: Vec<CheckResult>,
    pub passed: usize,
    pub failed: usize,
}

impl Summary {
    fn new(results: Vec<CheckResult>) -> Self {
        let passed = results.iter().filter(|result| result.passed()).count();
        let failed = results.len() - passed;
        Self {
            results,
            passed,
            failed,
        }
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|result| !result.passed())
    }

    pub fn statuses(&self) -> Vec<Status> {
        self.results.iter().map(|result| result.status).collect()
    }

    /// 0 when every check passed, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.failed == 0 { 0 } else { 1 }
    }
}
