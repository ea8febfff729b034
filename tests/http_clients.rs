// Tests for the Monzo and Splitwise HTTP adapters against a mock server.
use std::time::Duration;

use chrono::{TimeZone, Utc};
use mockito::{Matcher, Server};
use monzo_splitwise::clients::{MonzoClient, SplitwiseClient};
use monzo_splitwise::{
    marker_for, BankSource, ExpenseRequest, ExpenseSink, LedgerSource, OutcomeStatus,
    ReconcileError, ReconcileOptions, Reconciler, UserShare, UNGROUPED,
};

const TIMEOUT: Duration = Duration::from_secs(5);

const TRANSACTIONS_BODY: &str = r#"{
    "transactions": [
        {
            "id": "tx_1",
            "amount": -1500,
            "currency": "GBP",
            "description": "PIZZA PLACE LONDON",
            "notes": "dinner #splitwise-trip",
            "created": "2024-05-13T19:30:00.000Z",
            "merchant": {"id": "merch_1", "name": "Pizza Place"}
        },
        {
            "id": "tx_2",
            "amount": 2000,
            "currency": "GBP",
            "description": "Top up",
            "notes": "",
            "created": "2024-05-13T09:00:00.000Z",
            "merchant": null
        }
    ]
}"#;

const USER_BODY: &str = r#"{"user": {"id": 1, "first_name": "Sam", "email": "sam@example.com"}}"#;

const GROUPS_BODY: &str = r#"{
    "groups": [
        {"id": 0, "name": "Non-group expenses", "members": []},
        {"id": 20, "name": "Trip", "members": [
            {"id": 1, "first_name": "Sam"},
            {"id": 4, "first_name": "Alex"}
        ]}
    ]
}"#;

fn request() -> ExpenseRequest {
    ExpenseRequest {
        cost: 1500,
        currency: "GBP".to_string(),
        description: "Pizza Place".to_string(),
        group_id: 20,
        details: marker_for("tx_1"),
        date: Utc.with_ymd_and_hms(2024, 5, 13, 19, 30, 0).unwrap(),
        payment: false,
        creation_method: "quickadd".to_string(),
        users: vec![
            UserShare { user_id: 1, paid_share: 1500, owed_share: 750 },
            UserShare { user_id: 4, paid_share: 0, owed_share: 750 },
        ],
    }
}

#[tokio::test]
async fn test_monzo_lists_transactions_with_merchant_names() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/transactions")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("account_id".into(), "acc_1".into()),
            Matcher::UrlEncoded("since".into(), "2024-05-01T12:00:00Z".into()),
            Matcher::UrlEncoded("before".into(), "2024-05-15T12:00:00Z".into()),
            Matcher::UrlEncoded("limit".into(), "100".into()),
            Matcher::UrlEncoded("expand[]".into(), "merchant".into()),
        ]))
        .match_header("authorization", "Bearer monzo-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TRANSACTIONS_BODY)
        .create_async()
        .await;

    let client = MonzoClient::with_base_url(server.url(), "monzo-token", TIMEOUT).unwrap();
    let transactions = client
        .list_transactions(
            "acc_1",
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap(),
            100,
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0].id, "tx_1");
    assert_eq!(transactions[0].amount, -1500);
    assert_eq!(transactions[0].description, "Pizza Place");
    assert_eq!(transactions[0].notes, "dinner #splitwise-trip");
    assert_eq!(transactions[1].description, "Top up");
}

#[tokio::test]
async fn test_monzo_error_status_is_upstream_failure() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/accounts")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"code": "unauthorized.bad_access_token"}"#)
        .create_async()
        .await;

    let client = MonzoClient::with_base_url(server.url(), "expired", TIMEOUT).unwrap();
    let result = client.list_accounts().await;

    mock.assert_async().await;
    match result {
        Err(ReconcileError::Upstream(msg)) => assert!(msg.contains("401"), "{msg}"),
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_splitwise_reads_user_groups_and_expenses() {
    let mut server = Server::new_async().await;

    let user_mock = server
        .mock("GET", "/get_current_user")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer splitwise-token")
        .with_status(200)
        .with_body(USER_BODY)
        .create_async()
        .await;
    let groups_mock = server
        .mock("GET", "/get_groups")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(GROUPS_BODY)
        .create_async()
        .await;
    let expenses_mock = server
        .mock("GET", "/get_expenses")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("dated_after".into(), "2024-05-01T12:00:00Z".into()),
            Matcher::UrlEncoded("limit".into(), "50".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"{"expenses": [
                {"id": 7, "group_id": null, "description": "Taxi",
                 "details": "MonzoTransaction:tx_0", "cost": "12.5",
                 "currency_code": "GBP",
                 "users": [{"user_id": 1, "paid_share": "12.5", "owed_share": "12.5"}]}
            ]}"#,
        )
        .create_async()
        .await;

    let client = SplitwiseClient::with_base_url(server.url(), "splitwise-token", TIMEOUT).unwrap();

    let user = client.current_user().await.unwrap();
    assert_eq!(user.id, 1);
    assert_eq!(user.email.as_deref(), Some("sam@example.com"));

    let groups = client.list_groups().await.unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[1].name, "Trip");
    assert_eq!(groups[1].member_ids(), vec![1, 4]);

    let expenses = client
        .list_expenses(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(), 50)
        .await
        .unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].group_id, UNGROUPED);
    assert_eq!(expenses[0].details, "MonzoTransaction:tx_0");

    user_mock.assert_async().await;
    groups_mock.assert_async().await;
    expenses_mock.assert_async().await;
}

#[tokio::test]
async fn test_splitwise_creates_expense_from_form() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/create_expense")
        .match_header("authorization", "Bearer splitwise-token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("payment".into(), "false".into()),
            Matcher::UrlEncoded("cost".into(), "15.00".into()),
            Matcher::UrlEncoded("currency_code".into(), "GBP".into()),
            Matcher::UrlEncoded("group_id".into(), "20".into()),
            Matcher::UrlEncoded("details".into(), "MonzoTransaction:tx_1".into()),
            Matcher::UrlEncoded("creation_method".into(), "quickadd".into()),
            Matcher::UrlEncoded("users__0__user_id".into(), "1".into()),
            Matcher::UrlEncoded("users__0__paid_share".into(), "15.00".into()),
            Matcher::UrlEncoded("users__0__owed_share".into(), "7.50".into()),
            Matcher::UrlEncoded("users__1__user_id".into(), "4".into()),
            Matcher::UrlEncoded("users__1__paid_share".into(), "0.00".into()),
            Matcher::UrlEncoded("users__1__owed_share".into(), "7.50".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"{"expenses": [{"id": 321, "group_id": 20, "description": "Pizza Place",
                "details": "MonzoTransaction:tx_1", "cost": "15.0", "currency_code": "GBP",
                "users": []}], "errors": {}}"#,
        )
        .create_async()
        .await;

    let client = SplitwiseClient::with_base_url(server.url(), "splitwise-token", TIMEOUT).unwrap();
    let created = client.create_expense(&request()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(created.id, 321);
}

#[tokio::test]
async fn test_splitwise_reported_errors_are_sink_failures() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/create_expense")
        .with_status(200)
        .with_body(r#"{"expenses": [], "errors": {"base": ["Invalid user"]}}"#)
        .create_async()
        .await;

    let client = SplitwiseClient::with_base_url(server.url(), "splitwise-token", TIMEOUT).unwrap();
    let result = client.create_expense(&request()).await;

    mock.assert_async().await;
    match result {
        Err(ReconcileError::Sink(msg)) => assert!(msg.contains("Invalid user"), "{msg}"),
        other => panic!("expected sink error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_reconcile_over_http() {
    let mut monzo = Server::new_async().await;
    let mut splitwise = Server::new_async().await;

    let _transactions = monzo
        .mock("GET", "/transactions")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(TRANSACTIONS_BODY)
        .create_async()
        .await;
    let _user = splitwise
        .mock("GET", "/get_current_user")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(USER_BODY)
        .create_async()
        .await;
    let _groups = splitwise
        .mock("GET", "/get_groups")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(GROUPS_BODY)
        .create_async()
        .await;
    let _expenses = splitwise
        .mock("GET", "/get_expenses")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"expenses": []}"#)
        .create_async()
        .await;
    let create = splitwise
        .mock("POST", "/create_expense")
        .match_body(Matcher::UrlEncoded(
            "details".into(),
            "MonzoTransaction:tx_1".into(),
        ))
        .with_status(200)
        .with_body(r#"{"expenses": [{"id": 900, "cost": "15.0", "currency_code": "GBP"}], "errors": {}}"#)
        .expect(1)
        .create_async()
        .await;

    let bank = MonzoClient::with_base_url(monzo.url(), "m", TIMEOUT).unwrap();
    let ledger = SplitwiseClient::with_base_url(splitwise.url(), "s", TIMEOUT).unwrap();
    let reconciler = Reconciler::new(bank, ledger.clone(), ledger, ReconcileOptions::new("acc_1"));

    let report = reconciler
        .run_at(Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap())
        .await
        .unwrap();

    create.assert_async().await;
    assert_eq!(report.fetched_transactions, 2);
    assert_eq!(report.outcomes.len(), 1);
    match &report.outcomes[0].status {
        OutcomeStatus::Posted { expense_id, request } => {
            assert_eq!(*expense_id, 900);
            assert_eq!(request.group_id, 20);
            assert_eq!(request.description, "Pizza Place");
        }
        other => panic!("expected posted outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_ledger_fetch_aborts_run() {
    let mut monzo = Server::new_async().await;
    let mut splitwise = Server::new_async().await;

    let _transactions = monzo
        .mock("GET", "/transactions")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(TRANSACTIONS_BODY)
        .create_async()
        .await;
    let _user = splitwise
        .mock("GET", "/get_current_user")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;
    let _groups = splitwise
        .mock("GET", "/get_groups")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(GROUPS_BODY)
        .create_async()
        .await;
    let _expenses = splitwise
        .mock("GET", "/get_expenses")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"expenses": []}"#)
        .create_async()
        .await;
    let create = splitwise
        .mock("POST", "/create_expense")
        .expect(0)
        .create_async()
        .await;

    let bank = MonzoClient::with_base_url(monzo.url(), "m", TIMEOUT).unwrap();
    let ledger = SplitwiseClient::with_base_url(splitwise.url(), "s", TIMEOUT).unwrap();
    let reconciler = Reconciler::new(bank, ledger.clone(), ledger, ReconcileOptions::new("acc_1"));

    let result = reconciler.run().await;

    assert!(matches!(result, Err(ReconcileError::Upstream(_))));
    create.assert_async().await;
}
