//! Monzo API client (read-only)

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::clients::{build_http_client, read_json};
use crate::traits::*;
use crate::types::*;

pub const DEFAULT_MONZO_URL: &str = "https://api.monzo.com";

/// Account type preferred when no account is configured
pub const PREFERRED_ACCOUNT_TYPE: &str = "uk_retail";

/// Monzo API client authenticated with an access token
#[derive(Debug, Clone)]
pub struct MonzoClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

#[derive(Deserialize)]
struct AccountsResponse {
    accounts: Vec<BankAccount>,
}

#[derive(Deserialize)]
struct TransactionsResponse {
    transactions: Vec<MonzoTransaction>,
}

#[derive(Deserialize)]
struct MonzoTransaction {
    id: String,
    amount: MinorUnits,
    currency: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    created: DateTime<Utc>,
    #[serde(default)]
    merchant: Option<MerchantField>,
}

/// `merchant` is an object when expanded, otherwise just its id
#[derive(Deserialize)]
#[serde(untagged)]
enum MerchantField {
    Expanded { name: String },
    Id(#[allow(dead_code)] String),
}

impl From<MonzoTransaction> for Transaction {
    fn from(txn: MonzoTransaction) -> Self {
        let description = match txn.merchant {
            Some(MerchantField::Expanded { name }) if !name.is_empty() => name,
            _ => txn.description.unwrap_or_default(),
        };
        Transaction {
            id: txn.id,
            amount: txn.amount,
            currency: txn.currency,
            description,
            notes: txn.notes.unwrap_or_default(),
            created: txn.created,
        }
    }
}

impl MonzoClient {
    /// Create a client against the production API
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> ReconcileResult<Self> {
        Self::with_base_url(DEFAULT_MONZO_URL, access_token, timeout)
    }

    /// Create a client against a custom base URL
    pub fn with_base_url(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> ReconcileResult<Self> {
        Ok(Self {
            http: build_http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> ReconcileResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        self.http
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| ReconcileError::Upstream(e.to_string()))
    }
}

/// Pick the account to reconcile: the first `uk_retail` one, else the first listed
pub fn select_account(accounts: &[BankAccount]) -> Option<&BankAccount> {
    accounts
        .iter()
        .find(|a| a.account_type == PREFERRED_ACCOUNT_TYPE)
        .or_else(|| accounts.first())
}

#[async_trait]
impl BankSource for MonzoClient {
    async fn list_accounts(&self) -> ReconcileResult<Vec<BankAccount>> {
        let resp = self.get("/accounts", &[]).await?;
        let body: AccountsResponse = read_json(resp, ReconcileError::Upstream).await?;
        Ok(body.accounts)
    }

    async fn list_transactions(
        &self,
        account_id: &str,
        since: DateTime<Utc>,
        before: DateTime<Utc>,
        limit: usize,
    ) -> ReconcileResult<Vec<Transaction>> {
        let query = [
            ("account_id", account_id.to_string()),
            ("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("before", before.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("limit", limit.to_string()),
            ("expand[]", "merchant".to_string()),
        ];
        let resp = self.get("/transactions", &query).await?;
        let body: TransactionsResponse = read_json(resp, ReconcileError::Upstream).await?;
        Ok(body.transactions.into_iter().map(Transaction::from).collect())
    }
}
