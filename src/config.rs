//! Configuration file loading

use anyhow::{Context, Result};
use chrono::Duration as WindowDuration;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::clients::{DEFAULT_MONZO_URL, DEFAULT_SPLITWISE_URL};
use crate::reconciliation::{
    ReconcileOptions, DEFAULT_PAGE_LIMIT, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS,
};

/// File names searched in the working directory
pub const CONFIG_LOCATIONS: [&str; 2] = ["monzo-splitwise.toml", ".monzo-splitwise.toml"];

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonzoConfig {
    pub access_token: String,
    /// Account to reconcile; auto-selected when absent
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default = "default_monzo_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitwiseConfig {
    pub access_token: String,
    #[serde(default = "default_splitwise_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ReconcileConfig {
    pub window_days: i64,
    pub transaction_limit: usize,
    pub expense_limit: usize,
    pub timeout_secs: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            transaction_limit: DEFAULT_PAGE_LIMIT,
            expense_limit: DEFAULT_PAGE_LIMIT,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub monzo: MonzoConfig,
    pub splitwise: SplitwiseConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

fn default_monzo_url() -> String {
    DEFAULT_MONZO_URL.to_string()
}

fn default_splitwise_url() -> String {
    DEFAULT_SPLITWISE_URL.to_string()
}

impl Config {
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn find_and_load() -> Result<Option<(PathBuf, Self)>> {
        for location in CONFIG_LOCATIONS.iter().map(Path::new) {
            if location.exists() {
                return Self::load_from_file(location).map(|c| Some((location.to_path_buf(), c)));
            }
        }

        Ok(None)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.monzo.access_token.trim().is_empty(),
            "monzo.access_token cannot be empty"
        );
        anyhow::ensure!(
            !self.splitwise.access_token.trim().is_empty(),
            "splitwise.access_token cannot be empty"
        );
        anyhow::ensure!(
            (1..=MAX_WINDOW_DAYS).contains(&self.reconcile.window_days),
            "reconcile.window_days must be between 1 and {}",
            MAX_WINDOW_DAYS
        );
        anyhow::ensure!(
            self.reconcile.transaction_limit > 0 && self.reconcile.expense_limit > 0,
            "reconcile limits must be positive"
        );
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.reconcile.timeout_secs)
    }

    /// Reconciliation options for the given account
    pub fn options(&self, account_id: impl Into<String>) -> ReconcileOptions {
        ReconcileOptions {
            account_id: account_id.into(),
            window: WindowDuration::days(self.reconcile.window_days),
            transaction_limit: self.reconcile.transaction_limit,
            expense_limit: self.reconcile.expense_limit,
            dry_run: false,
        }
    }
}
