//! HTTP adapters for the bank and the expense ledger
//!
//! Both clients use bearer-token auth and a per-request timeout. Obtaining
//! or refreshing tokens happens elsewhere.

pub mod monzo;
pub mod splitwise;

pub use monzo::*;
pub use splitwise::*;

use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::types::*;

pub(crate) fn build_http_client(timeout: Duration) -> ReconcileResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(format!("monzo-splitwise/{}", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|e| ReconcileError::Http(format!("Failed to create HTTP client: {}", e)))
}

/// Check the status and decode a JSON body, mapping failures with `error`
pub(crate) async fn read_json<T: DeserializeOwned>(
    resp: reqwest::Response,
    error: fn(String) -> ReconcileError,
) -> ReconcileResult<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(error(format!("HTTP {}: {}", status.as_u16(), body.trim())));
    }
    resp.json::<T>()
        .await
        .map_err(|e| error(format!("Parse error: {}", e)))
}
