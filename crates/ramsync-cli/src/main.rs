//! ramsync - run a workload on RAM disks with periodic saves
//!
//! `ramsync [CONFIG]` mounts the configured tmpfs volumes, loads them from
//! disk, runs the workload, saves the volumes back every `Period` seconds
//! and once more when the workload exits, then unmounts.
//!
//! ## Flags
//!
//! - `--check`: validate the config and print the plan; touch nothing
//! - `--unwind-on-error`: unmount again when mounting, loading or chown fails
//! - `--verbose`, `--json`: log level and format

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use host_ops::{missing_tools, REQUIRED_TOOLS};
use ramsync_core::{
    Config, FailurePolicy, HostServices, LogFormat, Orchestrator, DEFAULT_CONFIG_FILE,
};
use serde::Serialize;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "ramsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run a workload on RAM disks, saving them to disk periodically", long_about = None)]
struct Cli {
    /// Path to the JSON config file
    #[arg(default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Validate the config, print the plan and report missing tools
    #[arg(long)]
    check: bool,

    /// Unmount ramdisks again if mounting, loading or chown fails
    #[arg(long)]
    unwind_on_error: bool,
}

impl Cli {
    fn policy(&self) -> FailurePolicy {
        if self.unwind_on_error {
            FailurePolicy::UnwindOnSetupError
        } else {
            FailurePolicy::LeaveMounted
        }
    }
}

/// Output of `--check`.
#[derive(Serialize)]
struct Plan<'a> {
    config: &'a Config,
    missing_tools: Vec<&'static str>,
}

impl<'a> Plan<'a> {
    fn new(config: &'a Config) -> Self {
        Self {
            config,
            missing_tools: missing_tools(required_tools(config)),
        }
    }
}

/// Host tools a run of `config` shells out to.
fn required_tools(config: &Config) -> Vec<&'static str> {
    let mut tools = REQUIRED_TOOLS.to_vec();
    if !config.workload.run_as_user.is_empty() {
        tools.push("sudo");
    }
    tools
}

fn cmd_check(config: &Config) -> Result<()> {
    let plan = Plan::new(config);
    println!("{}", serde_json::to_string_pretty(&plan)?);

    if !plan.missing_tools.is_empty() {
        anyhow::bail!("Missing required tools: {}", plan.missing_tools.join(", "));
    }
    info!("Config OK");
    Ok(())
}

/// Execute one run. A failure is returned, not logged; `main` reports it.
async fn cmd_run(config: Config, host: HostServices, policy: FailurePolicy) -> Result<()> {
    let orchestrator = Orchestrator::new(config, host).with_policy(policy);

    match orchestrator.run().await {
        Ok(report) => {
            info!(
                run_id = %report.run_id,
                checkpoints = report.periodic_checkpoints,
                unwound = report.unwound,
                "Done"
            );
            Ok(())
        }
        Err(failure) => Err(failure.into()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    ramsync_core::init_tracing(LogFormat::resolve(cli.json), level);

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config.display()))?;

    if cli.check {
        return cmd_check(&config);
    }
    cmd_run(config, HostServices::system(), cli.policy()).await
}
