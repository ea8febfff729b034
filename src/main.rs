use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use monzo_splitwise::clients::{select_account, MonzoClient, SplitwiseClient};
use monzo_splitwise::config::{Config, CONFIG_LOCATIONS};
use monzo_splitwise::{BankSource, OutcomeStatus, Reconciler};

#[derive(Parser)]
#[command(
    name = "monzo-splitwise",
    about = "Add Monzo transactions tagged #splitwise to Splitwise"
)]
struct Args {
    /// Config file path (defaults to ./monzo-splitwise.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Monzo account to reconcile, overriding the config file
    #[arg(long)]
    account_id: Option<String>,

    /// Show what would be added without creating any expense
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "monzo_splitwise=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => {
            let (path, config) = Config::find_and_load()?.with_context(|| {
                format!("No config file found (looked for {})", CONFIG_LOCATIONS.join(", "))
            })?;
            tracing::info!("Loaded config from {}", path.display());
            config
        }
    };

    let monzo = MonzoClient::with_base_url(
        &config.monzo.base_url,
        &config.monzo.access_token,
        config.timeout(),
    )?;
    let splitwise = SplitwiseClient::with_base_url(
        &config.splitwise.base_url,
        &config.splitwise.access_token,
        config.timeout(),
    )?;

    let account_id = match args.account_id.or_else(|| config.monzo.account_id.clone()) {
        Some(id) => id,
        None => {
            let accounts = monzo.list_accounts().await?;
            let account = select_account(&accounts).context("No Monzo accounts found")?;
            tracing::info!("Using Monzo account {} ({})", account.id, account.account_type);
            account.id.clone()
        }
    };

    let mut options = config.options(account_id);
    options.dry_run = args.dry_run;

    let reconciler = Reconciler::new(monzo, splitwise.clone(), splitwise, options);
    let report = reconciler.run().await?;

    for outcome in &report.outcomes {
        match &outcome.status {
            OutcomeStatus::SkippedNoGroup { reason } | OutcomeStatus::Failed { reason } => {
                tracing::warn!("{} ({}): {}", outcome.transaction_id, outcome.tag, reason);
            }
            _ => {}
        }
    }
    if report.page_cap_reached {
        tracing::warn!("Bank page limit reached; rerun with a shorter window to be sure");
    }
    if report.expense_page_cap_reached {
        tracing::warn!("Splitwise page limit reached; raise reconcile.expense_limit to be sure");
    }
    tracing::info!("Done: {}", report.summary());

    Ok(if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
