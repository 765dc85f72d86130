//! MSTest runner - run MSTest and stream its console output as structured
//! test results.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mstest_runner::config::{load_localization, ConfigLoader, RunnerConfig};
use mstest_runner::display;
use mstest_runner::mstest::{
    command_line, locate_mstest, run_tests, CategoryFilter, MsTestArgs, MsTestProcess, Source,
};
use mstest_runner::parser::{ResultParser, RunEvent};

#[derive(Parser)]
#[command(
    name = "mstest-runner",
    about = "Run MSTest and stream structured test results",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run tests and print results as they are reported.
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Test assembly to run.
    #[arg(long, conflicts_with = "metadata", required_unless_present = "metadata")]
    container: Option<PathBuf>,
    /// Test metadata (.vsmdi) file to run.
    #[arg(long)]
    metadata: Option<PathBuf>,
    /// Run only this test (repeatable).
    #[arg(long = "test")]
    tests: Vec<String>,
    /// Run this test list from the metadata file (repeatable).
    #[arg(long = "test-list")]
    test_lists: Vec<String>,
    /// Category filter expression, e.g. "Unit&!Slow".
    #[arg(long)]
    category: Option<String>,
    /// Detail to print under each result (repeatable).
    #[arg(long = "detail")]
    details: Vec<String>,
    /// Language of the runner's output.
    #[arg(long)]
    language: Option<String>,
    /// Directory to run the tests in.
    #[arg(long)]
    working_dir: Option<PathBuf>,
    /// Path to mstest.exe.
    #[arg(long)]
    exe: Option<PathBuf>,
    /// Run tests inside the MSTest process.
    #[arg(long)]
    no_isolation: bool,
    /// Config file to use instead of the default search paths.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Show attribute values untruncated.
    #[arg(long)]
    raw: bool,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Merge command-line flags over file configuration.
fn apply_overrides(mut config: RunnerConfig, args: &RunArgs) -> RunnerConfig {
    if let Some(language) = &args.language {
        config.language.clone_from(language);
    }
    if let Some(dir) = &args.working_dir {
        config.working_dir = Some(dir.clone());
    }
    if let Some(exe) = &args.exe {
        config.exe_path = Some(exe.clone());
    }
    config.no_isolation |= args.no_isolation;
    config.details.extend(args.details.iter().cloned());
    config
}

fn build_args(config: &RunnerConfig, args: &RunArgs) -> MsTestArgs {
    let source = args
        .container
        .clone()
        .map(Source::Container)
        .or_else(|| args.metadata.clone().map(Source::Metadata));

    let mut builder = MsTestArgs::new().no_isolation(config.no_isolation);
    if let Some(source) = source {
        builder = builder.source(source);
    }

    for list in &args.test_lists {
        builder = builder.add_test_list(list.clone());
    }
    for test in &args.tests {
        builder = builder.add_test(test.clone());
    }
    if let Some(category) = &args.category {
        let mut filter = CategoryFilter::new();
        filter.set(category.clone());
        builder = builder.categories(filter);
    }
    for detail in &config.details {
        builder = builder.detail(detail.clone());
    }
    if let Some(path) = &config.test_settings {
        builder = builder.test_settings(path.clone());
    }
    if let Some(path) = &config.run_config {
        builder = builder.run_config(path.clone());
    }
    if let Some(path) = &config.results_file {
        builder = builder.results_file(path.clone());
    }
    if let Some(publish) = &config.publish {
        builder = builder.publish(publish.clone());
    }
    builder
}

async fn run(args: RunArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let loader = args
        .config
        .clone()
        .map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let config = apply_overrides(loader.load()?, &args);

    let exe = match &config.exe_path {
        Some(path) => path.clone(),
        None => locate_mstest()?,
    };
    let mstest_args = build_args(&config, &args).build_args()?;
    let table = load_localization(&config)?;
    let parser = ResultParser::with_table(&table, &config.language, config.detail_map());

    tracing::info!(exe = %exe.display(), language = %config.language, "Starting MSTest");
    display::print_run_start(&command_line(&exe, &mstest_args));

    let process = MsTestProcess::spawn(&exe, &mstest_args, config.working_dir.as_deref())?;
    let mut test_run = run_tests(process, parser, config.channel_buffer)?;

    let cancel = test_run.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping test run");
            cancel.cancel();
        }
    });

    while let Some(event) = test_run.next_event().await {
        match event {
            RunEvent::Test(result) => display::print_test(&result, args.raw),
            RunEvent::Error(err) => display::print_run_error(&err, args.raw),
            RunEvent::Done(_) => {}
        }
    }

    let outcome = test_run.wait().await?;
    display::print_summary(&outcome.summary, outcome.exit_code);
    Ok(outcome.summary.is_success() && !outcome.cancelled)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run(args) => match run(args).await {
            Ok(true) => ExitCode::SUCCESS,
            Ok(false) => ExitCode::from(1),
            Err(e) => {
                display::print_error(&e.to_string());
                ExitCode::from(2)
            }
        },
    }
}
