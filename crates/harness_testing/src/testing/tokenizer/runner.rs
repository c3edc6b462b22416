use crate::testing::tokenizer::fixture::SubTest;
use log::debug;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// How a tokenizer process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// The process exited by itself
    Exited(ExitStatus),
    /// The process was killed because it ran longer than the timeout
    TimedOut,
    /// The process could not be started or waited for
    Failed(String),
}

/// Output captured from a single tokenizer process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub status: RunStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Capture {
    fn without_output(status: RunStatus) -> Self {
        Self {
            status,
            stdout: Vec::new(),
            stderr: Vec::new(),
        }
    }
}

/// Starts the tokenizer under test, once per sub-test
#[derive(Debug, Clone)]
pub struct Runner {
    binary: PathBuf,
    /// Arguments that go before the sub-test arguments
    prefix_args: Vec<String>,
    timeout: Duration,
    quote_arguments: bool,
}

impl Runner {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            prefix_args: Vec::new(),
            timeout,
            quote_arguments: false,
        }
    }

    #[must_use]
    pub fn with_prefix_args(mut self, args: Vec<String>) -> Self {
        self.prefix_args = args;
        self
    }

    #[must_use]
    pub fn with_quoted_arguments(mut self, quote: bool) -> Self {
        self.quote_arguments = quote;
        self
    }

    /// The sub-test arguments in their fixed order: state, input and the last start tag when the
    /// test has one. The input is passed exactly as stored in the fixture.
    pub fn arguments(&self, subtest: &SubTest) -> Vec<String> {
        let mut args = vec![
            self.argument("state", &subtest.state),
            self.argument("input", &subtest.input),
        ];

        if let Some(tag) = &subtest.last_start_tag {
            args.push(self.argument("last-start-tag", tag));
        }

        args
    }

    fn argument(&self, name: &str, value: &str) -> String {
        if self.quote_arguments {
            format!("--{name}=\"{value}\"")
        } else {
            format!("--{name}={value}")
        }
    }

    /// Runs the tokenizer for the sub-test. The process is killed when it exceeds the timeout.
    pub async fn run(&self, subtest: &SubTest) -> Capture {
        let args = self.arguments(subtest);
        debug!(
            "running {} {:?} {:?}",
            self.binary.display(),
            self.prefix_args,
            args
        );

        let child = Command::new(&self.binary)
            .args(&self.prefix_args)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(err) => {
                return Capture::without_output(RunStatus::Failed(format!(
                    "cannot start {}: {err}",
                    self.binary.display()
                )))
            }
        };

        // Dropping the child on timeout kills it
        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Capture {
                status: RunStatus::Exited(output.status),
                stdout: output.stdout,
                stderr: output.stderr,
            },
            Ok(Err(err)) => Capture::without_output(RunStatus::Failed(format!(
                "cannot wait for {}: {err}",
                self.binary.display()
            ))),
            Err(_) => {
                debug!("{} timed out after {:?}", self.binary.display(), self.timeout);
                Capture::without_output(RunStatus::TimedOut)
            }
        }
    }
}
