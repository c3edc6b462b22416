use crate::testing::tokenizer::fixture::SubTest;
use crate::testing::tokenizer::normalize::{expected_tokens, normalize};
use crate::testing::tokenizer::result::{compare, Outcome, TestResult};
use crate::testing::tokenizer::runner::{Capture, RunStatus, Runner};
use futures::stream::{self, Stream, StreamExt};

/// Harness runs sub-tests against the tokenizer and judges their output
#[derive(Debug, Clone)]
pub struct Harness {
    runner: Runner,
}

impl Harness {
    pub fn new(runner: Runner) -> Self {
        Self { runner }
    }

    /// Runs a single sub-test. Every failure of the tokenizer ends up in the outcome.
    pub async fn run_subtest(&self, subtest: SubTest) -> TestResult {
        let capture = self.runner.run(&subtest).await;
        judge(subtest, capture)
    }

    /// Runs the sub-tests with at most `jobs` of them in flight. Results are yielded in the order
    /// of `subtests`, regardless of the order in which they complete.
    pub fn run_all(
        &self,
        subtests: Vec<SubTest>,
        jobs: usize,
    ) -> impl Stream<Item = TestResult> + '_ {
        stream::iter(subtests)
            .map(move |subtest| self.run_subtest(subtest))
            .buffered(jobs.max(1))
    }
}

/// Turns the captured process output into a test result
pub fn judge(subtest: SubTest, capture: Capture) -> TestResult {
    let Capture {
        status,
        stdout,
        stderr,
    } = capture;

    let (outcome, actual, expected) = match status {
        RunStatus::TimedOut => (Outcome::TimedOut, None, expected_tokens(&subtest)),
        RunStatus::Failed(reason) => (Outcome::RunError(reason), None, expected_tokens(&subtest)),
        RunStatus::Exited(status) if !status.success() => (
            Outcome::RunError(format!("tokenizer exited with {status}")),
            None,
            expected_tokens(&subtest),
        ),
        RunStatus::Exited(_) => match normalize(&stdout, &subtest) {
            Ok((actual, expected)) => (compare(&actual, &expected), Some(actual), expected),
            Err(err) => (
                Outcome::RunError(err.to_string()),
                None,
                expected_tokens(&subtest),
            ),
        },
    };

    TestResult {
        subtest,
        outcome,
        expected,
        actual,
        stdout,
        stderr,
    }
}
