use crate::testing::tokenizer::normalize::escape_input;
use crate::testing::tokenizer::result::{Outcome, TestResult};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::io::{self, Write};

/// Totals of a test run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of sub-tests that ran
    pub total: usize,
    /// Number of sub-tests that did not succeed
    pub failed: usize,
    /// Failed because the tokens differ
    pub mismatched: usize,
    /// Failed because the tokenizer was killed
    pub timed_out: usize,
    /// Failed because the tokenizer crashed or produced unreadable output
    pub errored: usize,
    /// Fixture files that could not be parsed, with the reason
    pub skipped_fixtures: Vec<(String, String)>,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &Outcome) {
        self.total += 1;

        match outcome {
            Outcome::Success => return,
            Outcome::Mismatch => self.mismatched += 1,
            Outcome::TimedOut => self.timed_out += 1,
            Outcome::RunError(_) => self.errored += 1,
        }

        self.failed += 1;
    }

    /// Percentage of failed sub-tests, or None when nothing ran
    pub fn failure_rate(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }

        Some(self.failed as f64 / self.total as f64 * 100.0)
    }
}

impl Display for RunSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.failure_rate() {
            Some(rate) => write!(
                f,
                "{}/{} tests failed ({:.2}%)",
                self.failed, self.total, rate
            ),
            None => write!(f, "No tests were run."),
        }
    }
}

fn tokens_to_string(tokens: &[Value]) -> String {
    Value::Array(tokens.to_vec()).to_string()
}

/// Prints a status line per sub-test and the summary at the end
pub struct Reporter<W: Write> {
    out: W,
    verbose: bool,
    summary: RunSummary,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self {
            out,
            verbose,
            summary: RunSummary::default(),
        }
    }

    pub fn record(&mut self, result: &TestResult) -> io::Result<()> {
        self.summary.record(&result.outcome);

        writeln!(
            self.out,
            "Testing: {} - {}",
            result.subtest.description,
            result.outcome.label()
        )?;

        if self.verbose && !result.is_success() {
            self.print_details(result)?;
        }

        Ok(())
    }

    fn print_details(&mut self, result: &TestResult) -> io::Result<()> {
        let got = match (&result.actual, &result.outcome) {
            (Some(actual), _) => tokens_to_string(actual),
            (None, Outcome::RunError(reason)) => format!(
                "{} ({reason})",
                String::from_utf8_lossy(&result.stdout).trim_end()
            ),
            (None, _) => String::new(),
        };

        writeln!(self.out, "Initial state: {}", result.subtest.state)?;
        writeln!(
            self.out,
            "Input:         '{}'",
            escape_input(&result.subtest.input)
        )?;
        if let Some(tag) = &result.subtest.last_start_tag {
            writeln!(self.out, "Last start tag: {tag}")?;
        }
        writeln!(self.out, "Expected:       {}", tokens_to_string(&result.expected))?;
        writeln!(self.out, "Got:            {got}")?;
        writeln!(
            self.out,
            "stderr:         {}",
            String::from_utf8_lossy(&result.stderr).trim_end()
        )?;
        if !result.subtest.errors.is_empty() {
            let errors = result
                .subtest
                .errors
                .iter()
                .map(|err| format!("{} at {}:{}", err.code, err.line, err.col))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(self.out, "Parse errors:   {errors}")?;
        }
        writeln!(self.out)
    }

    /// Remembers a fixture file that was skipped because it could not be parsed
    pub fn skip_fixture(&mut self, path: &str, reason: &str) {
        self.summary
            .skipped_fixtures
            .push((path.to_string(), reason.to_string()));
    }

    /// Prints the summary and returns the totals
    pub fn finish(mut self) -> io::Result<RunSummary> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", self.summary)?;

        if self.summary.failed > 0 {
            writeln!(
                self.out,
                "({} mismatched, {} timed out, {} exceptions)",
                self.summary.mismatched, self.summary.timed_out, self.summary.errored
            )?;
        }

        for (path, reason) in &self.summary.skipped_fixtures {
            writeln!(self.out, "Skipped malformed fixture {path}: {reason}")?;
        }

        self.out.flush()?;
        Ok(self.summary)
    }
}
