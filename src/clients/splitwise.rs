//! Splitwise API client: ledger reads and expense creation

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::clients::{build_http_client, read_json};
use crate::traits::*;
use crate::types::*;
use crate::utils::money::{format_minor_units, parse_decimal};

pub const DEFAULT_SPLITWISE_URL: &str = "https://secure.splitwise.com/api/v3.0";

/// Splitwise API client authenticated with a bearer token
#[derive(Debug, Clone)]
pub struct SplitwiseClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

#[derive(Deserialize)]
struct UserResponse {
    user: User,
}

#[derive(Deserialize)]
struct GroupsResponse {
    groups: Vec<Group>,
}

#[derive(Deserialize)]
struct ExpensesResponse {
    #[serde(default)]
    expenses: Vec<SplitwiseExpense>,
    #[serde(default)]
    errors: serde_json::Value,
}

#[derive(Deserialize)]
struct SplitwiseExpense {
    id: i64,
    #[serde(default)]
    group_id: Option<GroupId>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    details: Option<String>,
    cost: String,
    currency_code: String,
    #[serde(default)]
    users: Vec<SplitwiseExpenseUser>,
}

#[derive(Deserialize)]
struct SplitwiseExpenseUser {
    user_id: UserId,
}

impl TryFrom<SplitwiseExpense> for LedgerEntry {
    type Error = ReconcileError;

    fn try_from(expense: SplitwiseExpense) -> Result<Self, Self::Error> {
        Ok(LedgerEntry {
            id: expense.id,
            group_id: expense.group_id.unwrap_or(UNGROUPED),
            description: expense.description.unwrap_or_default(),
            details: expense.details.unwrap_or_default(),
            cost: parse_decimal(&expense.cost)?,
            currency: expense.currency_code,
            participants: expense.users.into_iter().map(|u| u.user_id).collect(),
        })
    }
}

/// Whether a Splitwise `errors` field actually reports an error
fn has_errors(errors: &serde_json::Value) -> bool {
    match errors {
        serde_json::Value::Null => false,
        serde_json::Value::Object(map) => !map.is_empty(),
        serde_json::Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

/// Form fields for `create_expense`, amounts rendered as decimals
pub fn expense_form(request: &ExpenseRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("payment".to_string(), request.payment.to_string()),
        ("cost".to_string(), format_minor_units(request.cost)),
        ("currency_code".to_string(), request.currency.clone()),
        ("description".to_string(), request.description.clone()),
        ("group_id".to_string(), request.group_id.to_string()),
        ("details".to_string(), request.details.clone()),
        (
            "date".to_string(),
            request.date.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        ("creation_method".to_string(), request.creation_method.clone()),
    ];

    for (i, user) in request.users.iter().enumerate() {
        form.push((format!("users__{i}__user_id"), user.user_id.to_string()));
        form.push((
            format!("users__{i}__paid_share"),
            format_minor_units(user.paid_share),
        ));
        form.push((
            format!("users__{i}__owed_share"),
            format_minor_units(user.owed_share),
        ));
    }

    form
}

impl SplitwiseClient {
    /// Create a client against the production API
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> ReconcileResult<Self> {
        Self::with_base_url(DEFAULT_SPLITWISE_URL, access_token, timeout)
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

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> ReconcileResult<reqwest::Response> {
        self.http
            .get(self.url(path))
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| ReconcileError::Upstream(e.to_string()))
    }
}

#[async_trait]
impl LedgerSource for SplitwiseClient {
    async fn current_user(&self) -> ReconcileResult<User> {
        let resp = self.get("/get_current_user", &[]).await?;
        let body: UserResponse = read_json(resp, ReconcileError::Upstream).await?;
        Ok(body.user)
    }

    async fn list_groups(&self) -> ReconcileResult<Vec<Group>> {
        let resp = self.get("/get_groups", &[]).await?;
        let body: GroupsResponse = read_json(resp, ReconcileError::Upstream).await?;
        Ok(body.groups)
    }

    async fn list_expenses(
        &self,
        dated_after: DateTime<Utc>,
        limit: usize,
    ) -> ReconcileResult<Vec<LedgerEntry>> {
        let query = [
            (
                "dated_after",
                dated_after.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            ("limit", limit.to_string()),
        ];
        let resp = self.get("/get_expenses", &query).await?;
        let body: ExpensesResponse = read_json(resp, ReconcileError::Upstream).await?;
        body.expenses
            .into_iter()
            .map(LedgerEntry::try_from)
            .collect()
    }
}

#[async_trait]
impl ExpenseSink for SplitwiseClient {
    async fn create_expense(&self, request: &ExpenseRequest) -> ReconcileResult<CreatedExpense> {
        let resp = self
            .http
            .post(self.url("/create_expense"))
            .bearer_auth(&self.access_token)
            .form(&expense_form(request))
            .send()
            .await
            .map_err(|e| ReconcileError::Sink(e.to_string()))?;

        let body: ExpensesResponse = read_json(resp, ReconcileError::Sink).await?;
        if has_errors(&body.errors) {
            return Err(ReconcileError::Sink(body.errors.to_string()));
        }

        body.expenses
            .first()
            .map(|expense| CreatedExpense { id: expense.id })
            .ok_or_else(|| ReconcileError::Sink("No expense returned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn field(form: &[(String, String)], key: &str) -> Option<String> {
        form.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    #[test]
    fn test_expense_form() {
        let request = ExpenseRequest {
            cost: 1000,
            currency: "GBP".to_string(),
            description: "Groceries".to_string(),
            group_id: 10,
            details: marker_for("tx_1"),
            date: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            payment: false,
            creation_method: "quickadd".to_string(),
            users: vec![
                UserShare { user_id: 1, paid_share: 1000, owed_share: 334 },
                UserShare { user_id: 2, paid_share: 0, owed_share: 333 },
                UserShare { user_id: 3, paid_share: 0, owed_share: 333 },
            ],
        };

        let form = expense_form(&request);
        let get = |key: &str| field(&form, key);

        assert_eq!(get("payment").as_deref(), Some("false"));
        assert_eq!(get("cost").as_deref(), Some("10.00"));
        assert_eq!(get("group_id").as_deref(), Some("10"));
        assert_eq!(get("details").as_deref(), Some("MonzoTransaction:tx_1"));
        assert_eq!(get("date").as_deref(), Some("2024-05-01T10:00:00Z"));
        assert_eq!(get("users__0__user_id").as_deref(), Some("1"));
        assert_eq!(get("users__0__paid_share").as_deref(), Some("10.00"));
        assert_eq!(get("users__0__owed_share").as_deref(), Some("3.34"));
        assert_eq!(get("users__2__paid_share").as_deref(), Some("0.00"));
        assert_eq!(get("users__2__owed_share").as_deref(), Some("3.33"));
    }

    #[test]
    fn test_expense_conversion() {
        let expense: SplitwiseExpense = serde_json::from_str(
            r#"{"id":99,"group_id":null,"description":"Taxi","details":null,
                "cost":"12.5","currency_code":"GBP",
                "users":[{"user_id":1,"paid_share":"12.5","owed_share":"12.5"}]}"#,
        )
        .unwrap();

        let entry = LedgerEntry::try_from(expense).unwrap();
        assert_eq!(entry.id, 99);
        assert_eq!(entry.group_id, UNGROUPED);
        assert_eq!(entry.details, "");
        assert_eq!(entry.cost, crate::utils::money::to_decimal(1250));
        assert_eq!(entry.participants, vec![1]);
    }

    #[test]
    fn test_has_errors() {
        assert!(!has_errors(&serde_json::json!(null)));
        assert!(!has_errors(&serde_json::json!({})));
        assert!(!has_errors(&serde_json::json!([])));
        assert!(has_errors(&serde_json::json!({"base": ["Invalid cost"]})));
    }
}
