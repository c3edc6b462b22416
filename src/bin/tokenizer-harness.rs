use anyhow::bail;
use clap::{Parser, Subcommand};
use harness_config::settings::Setting;
use harness_config::storage::JsonStorageAdapter;
use harness_config::ConfigStore;
use harness_testing::testing::tokenizer::{run_suite, ExecutableLocator, HarnessConfig};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[clap(
    name = "tokenizer-harness",
    version = "0.1.0",
    author = "Gosub",
    about = "Runs the html5lib tokenizer tests against an external tokenizer"
)]
struct Cli {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short = 'f', long = "filter", help = "Only run tests whose description contains this text")]
    filter: Option<String>,
    #[clap(short = 'v', long = "verbose", help = "Print details for every failing test")]
    verbose: bool,
    #[clap(short = 'b', long = "binary", help = "Path or name of the tokenizer under test")]
    binary: Option<String>,
    #[clap(long = "fixtures", help = "Fixture directory or a single fixture file")]
    fixtures: Option<PathBuf>,
    #[clap(short = 't', long = "timeout", help = "Timeout per test in milliseconds")]
    timeout: Option<u64>,
    #[clap(short = 'j', long = "jobs", help = "Number of tests running at the same time")]
    jobs: Option<usize>,
    #[clap(short = 'c', long = "config", help = "Json file with settings")]
    config: Option<PathBuf>,
    #[clap(long = "quote-arguments", help = "Wrap argument values in double quotes")]
    quote_arguments: bool,
    #[clap(short = 'd', long = "debug", help = "Enable debug logging")]
    debug: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[clap(about = "List settings with their values")]
    Settings {
        #[clap(short = 'k', long = "key", default_value = "*")]
        key: String,
    },
}

fn config_store(args: &Cli) -> anyhow::Result<ConfigStore> {
    let mut store = ConfigStore::new()?;

    if let Some(path) = &args.config {
        let storage = JsonStorageAdapter::try_from(path.as_path())?;
        store.set_storage(Box::new(storage))?;
    }

    if let Some(binary) = &args.binary {
        store.set("runner.binary", Setting::String(binary.clone()));
    }
    if let Some(timeout) = args.timeout {
        store.set("runner.timeout_ms", Setting::UInt(timeout as usize));
    }
    if let Some(jobs) = args.jobs {
        store.set("runner.jobs", Setting::UInt(jobs));
    }
    if args.quote_arguments {
        store.set("runner.quote_arguments", Setting::Bool(true));
    }
    if let Some(fixtures) = &args.fixtures {
        store.set(
            "fixtures.root",
            Setting::String(fixtures.to_string_lossy().into_owned()),
        );
    }

    Ok(store)
}

fn list_settings(store: &ConfigStore, search: &str) {
    for key in store.find(search) {
        let Some(info) = store.get_info(&key) else {
            continue;
        };
        let value = store.get(&key).unwrap_or_else(|| info.default.clone());

        println!("{key:30}: {value}");
        println!("{:30}  default {}, {}", "", info.default, info.description);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let level = if args.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    SimpleLogger::new().with_level(level).init()?;

    let store = config_store(&args)?;

    if let Some(Commands::Settings { key }) = &args.command {
        list_settings(&store, key);
        return Ok(());
    }

    let mut config = HarnessConfig::from_store(&store)?;
    config.filter = args.filter.clone();
    config.verbose = args.verbose;
    if config.timeout == Duration::ZERO {
        bail!("timeout must be larger than zero");
    }

    let locator = ExecutableLocator::from_env();

    tokio::select! {
        summary = run_suite(&config, &locator, io::stdout()) => {
            summary?;
        }
        _ = tokio::signal::ctrl_c() => {
            bail!("interrupted");
        }
    }

    Ok(())
}
