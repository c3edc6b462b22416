use harness_config::settings::Setting;
use harness_config::ConfigStore;
use harness_shared::types::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Everything a test run needs to know, read once from the configuration store
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    /// Path or name of the tokenizer under test
    pub binary: String,
    /// Arguments passed before the sub-test arguments
    pub arguments: Vec<String>,
    pub timeout: Duration,
    /// Maximum number of sub-tests running at the same time
    pub jobs: usize,
    pub quote_arguments: bool,
    /// Directory with fixture files, or a single fixture file
    pub fixtures: PathBuf,
    pub extension: String,
    pub excluded: Vec<String>,
    pub default_state: String,
    /// Only tests whose description contains this text are run
    pub filter: Option<String>,
    pub verbose: bool,
}

fn setting(store: &ConfigStore, key: &str) -> Result<Setting> {
    store
        .get(key)
        .ok_or_else(|| Error::Config(format!("setting {key} is not known")).into())
}

impl HarnessConfig {
    pub fn from_store(store: &ConfigStore) -> Result<Self> {
        Ok(Self {
            binary: setting(store, "runner.binary")?.to_string(),
            arguments: setting(store, "runner.arguments")?.to_map(),
            timeout: Duration::from_millis(setting(store, "runner.timeout_ms")?.to_uint() as u64),
            jobs: setting(store, "runner.jobs")?.to_uint().max(1),
            quote_arguments: setting(store, "runner.quote_arguments")?.to_bool(),
            fixtures: PathBuf::from(setting(store, "fixtures.root")?.to_string()),
            extension: setting(store, "fixtures.extension")?.to_string(),
            excluded: setting(store, "fixtures.excluded")?.to_map(),
            default_state: setting(store, "tokenizer.default_state")?.to_string(),
            filter: None,
            verbose: false,
        })
    }
}
