//! Runs html5lib tokenizer fixtures against an external tokenizer and reports the results
pub mod config;
pub mod executable;
pub mod fixture;
pub mod harness;
pub mod normalize;
pub mod report;
pub mod result;
pub mod runner;

pub use config::HarnessConfig;
pub use executable::ExecutableLocator;
pub use fixture::{fixture_paths, read_fixture_from_path, FixtureFile, SubTest, Test};
pub use harness::Harness;
pub use report::{Reporter, RunSummary};
pub use result::{Outcome, TestResult};
pub use runner::Runner;

use futures::StreamExt;
use harness_shared::types::{Error, Result};
use log::{info, warn};
use std::io::Write;

/// Runs every sub-test of every fixture file and writes the report to `out`. Sub-test failures
/// only end up in the summary; an error is returned when the tokenizer cannot be found, the
/// fixtures cannot be listed or read, or the report cannot be written.
pub async fn run_suite<W: Write>(
    config: &HarnessConfig,
    locator: &ExecutableLocator,
    out: W,
) -> Result<RunSummary> {
    let binary = locator.locate(&config.binary)?;
    let runner = Runner::new(binary, config.timeout)
        .with_prefix_args(config.arguments.clone())
        .with_quoted_arguments(config.quote_arguments);
    let harness = Harness::new(runner);

    let mut reporter = Reporter::new(out, config.verbose);

    let paths = fixture_paths(&config.fixtures, &config.extension, &config.excluded)?;
    for path in paths {
        let fixture = match read_fixture_from_path(&path) {
            Ok(fixture) => fixture,
            Err(Error::MalformedFixture { path, reason }) => {
                warn!("skipping malformed fixture {path}: {reason}");
                reporter.skip_fixture(&path, &reason);
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        let subtests = fixture.subtests(config.filter.as_deref(), &config.default_state);
        info!(
            "running {} sub-tests from {}",
            subtests.len(),
            fixture.path
        );

        let results = harness.run_all(subtests, config.jobs);
        let mut results = std::pin::pin!(results);
        while let Some(result) = results.next().await {
            reporter.record(&result)?;
        }
    }

    Ok(reporter.finish()?)
}
