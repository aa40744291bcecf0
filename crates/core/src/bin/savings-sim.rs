use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use timelock_savings::scenario::{self, Scenario};
use timelock_savings::{AccountId, VaultConfig};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

/// Replay a savings-vault scenario and print the resulting events and stats.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON scenario file.
    scenario: PathBuf,

    /// TOML vault config. Without it, --owner and --custody are required.
    #[arg(long, env = "SAVINGS_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "SAVINGS_OWNER", required_unless_present = "config")]
    owner: Option<AccountId>,

    #[arg(long, env = "SAVINGS_CUSTODY", required_unless_present = "config")]
    custody: Option<AccountId>,

    /// Abort on the first failing step.
    #[arg(long)]
    strict: bool,

    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormat,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn load_config(args: &Args) -> anyhow::Result<VaultConfig> {
    let mut config = match (&args.config, args.owner, args.custody) {
        (Some(path), _, _) => VaultConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        (None, Some(owner), Some(custody)) => VaultConfig::new(owner, custody),
        _ => anyhow::bail!("either --config or both --owner and --custody are required"),
    };
    config.apply_env().context("applying SAVINGS_* overrides")?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);

    let config = load_config(&args)?;
    let text = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("reading scenario {}", args.scenario.display()))?;
    let scenario: Scenario = serde_json::from_str(&text).context("parsing scenario")?;

    tracing::info!(steps = scenario.steps.len(), strict = args.strict, "Replaying scenario");
    let report = scenario::run(&config, &scenario, args.strict)?;

    serde_json::to_writer_pretty(std::io::stdout().lock(), &report)?;
    println!();

    if !report.conserved {
        anyhow::bail!("ledger conservation check failed");
    }
    tracing::info!(
        failures = report.failures(),
        total_locked = report.stats.total_locked,
        pool_balance = report.stats.pool_balance,
        "Scenario complete"
    );
    Ok(())
}
