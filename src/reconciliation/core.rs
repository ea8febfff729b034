//! Reconciliation orchestrator: fetch both snapshots, then post each tagged
//! transaction in turn

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

use crate::reconciliation::dedup::LedgerIndex;
use crate::reconciliation::groups::GroupResolver;
use crate::reconciliation::request::ExpenseRequestBuilder;
use crate::reconciliation::split::plan_split;
use crate::reconciliation::tags::extract_tagged;
use crate::traits::*;
use crate::types::*;

/// Default look-back window for transactions and expenses
pub const DEFAULT_WINDOW_DAYS: i64 = 15;

/// Longest accepted look-back window
pub const MAX_WINDOW_DAYS: i64 = 3650;

/// Default page size for both fetches
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Settings for one reconciliation pass
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Bank account whose transactions are reconciled
    pub account_id: String,
    /// Look-back window ending now
    pub window: Duration,
    /// Maximum number of bank transactions fetched
    pub transaction_limit: usize,
    /// Maximum number of ledger expenses fetched
    pub expense_limit: usize,
    /// Build and validate requests without creating anything
    pub dry_run: bool,
}

impl ReconcileOptions {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            window: Duration::days(DEFAULT_WINDOW_DAYS),
            transaction_limit: DEFAULT_PAGE_LIMIT,
            expense_limit: DEFAULT_PAGE_LIMIT,
            dry_run: false,
        }
    }
}

/// Ledger state read once per run
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    pub user: User,
    pub groups: Vec<Group>,
    pub expenses: Vec<LedgerEntry>,
}

/// What happened to one tagged transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum OutcomeStatus {
    /// Expense created in the ledger
    Posted {
        expense_id: i64,
        request: ExpenseRequest,
    },
    /// Request built during a dry run, not sent
    Planned { request: ExpenseRequest },
    /// The ledger already has an entry for this transaction
    SkippedDuplicate { ledger_entry_id: i64 },
    /// The tag names no known group, or cannot be parsed
    SkippedNoGroup { reason: String },
    /// Building or posting the expense failed
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionOutcome {
    pub transaction_id: String,
    pub tag: Tag,
    pub status: OutcomeStatus,
}

/// Outcome counts for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub posted: usize,
    pub planned: usize,
    pub skipped_duplicate: usize,
    pub skipped_no_group: usize,
    pub failed: usize,
}

impl fmt::Display for ReconcileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} posted, {} skipped (duplicate), {} skipped (no group), {} failed",
            self.posted, self.skipped_duplicate, self.skipped_no_group, self.failed
        )?;
        if self.planned > 0 {
            write!(f, ", {} planned", self.planned)?;
        }
        Ok(())
    }
}

/// Full result of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub fetched_transactions: usize,
    pub fetched_expenses: usize,
    /// The bank returned a full page; older transactions may be missing
    pub page_cap_reached: bool,
    /// The ledger returned a full page; older duplicates may go undetected
    pub expense_page_cap_reached: bool,
    pub outcomes: Vec<TransactionOutcome>,
}

impl ReconcileReport {
    pub fn summary(&self) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        for outcome in &self.outcomes {
            match outcome.status {
                OutcomeStatus::Posted { .. } => summary.posted += 1,
                OutcomeStatus::Planned { .. } => summary.planned += 1,
                OutcomeStatus::SkippedDuplicate { .. } => summary.skipped_duplicate += 1,
                OutcomeStatus::SkippedNoGroup { .. } => summary.skipped_no_group += 1,
                OutcomeStatus::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }

    /// Requests that were posted or, in a dry run, would have been
    pub fn requests(&self) -> impl Iterator<Item = &ExpenseRequest> {
        self.outcomes.iter().filter_map(|outcome| match &outcome.status {
            OutcomeStatus::Posted { request, .. } | OutcomeStatus::Planned { request } => {
                Some(request)
            }
            _ => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.summary().failed > 0
    }
}

/// Reconciles bank transactions into ledger expenses
pub struct Reconciler<B: BankSource, L: LedgerSource, S: ExpenseSink> {
    bank: B,
    ledger: L,
    sink: S,
    options: ReconcileOptions,
    validator: Box<dyn ExpenseValidator>,
}

impl<B: BankSource, L: LedgerSource, S: ExpenseSink> Reconciler<B, L, S> {
    /// Create a reconciler with the default request validator
    pub fn new(bank: B, ledger: L, sink: S, options: ReconcileOptions) -> Self {
        Self::with_validator(bank, ledger, sink, options, Box::new(DefaultExpenseValidator))
    }

    /// Create a reconciler with a custom request validator
    pub fn with_validator(
        bank: B,
        ledger: L,
        sink: S,
        options: ReconcileOptions,
        validator: Box<dyn ExpenseValidator>,
    ) -> Self {
        Self {
            bank,
            ledger,
            sink,
            options,
            validator,
        }
    }

    /// Run one pass over the window ending now
    pub async fn run(&self) -> ReconcileResult<ReconcileReport> {
        self.run_at(Utc::now()).await
    }

    /// Run one pass over the window ending at `now`.
    ///
    /// Fails only when a snapshot cannot be fetched. Every per-transaction
    /// problem is recorded in the report and the batch continues.
    pub async fn run_at(&self, now: DateTime<Utc>) -> ReconcileResult<ReconcileReport> {
        let since = now.checked_sub_signed(self.options.window).ok_or_else(|| {
            ReconcileError::Validation(format!(
                "Window of {} days before {} is out of range",
                self.options.window.num_days(),
                now
            ))
        })?;

        let (transactions, snapshot) = tokio::try_join!(
            self.fetch_transactions(since, now),
            self.fetch_ledger(since)
        )?;

        let page_cap_reached = transactions.len() >= self.options.transaction_limit;
        if page_cap_reached {
            warn!(
                "{} transactions fetched, the page limit; older transactions in the window may be missing",
                transactions.len()
            );
        }

        let index = LedgerIndex::new(&snapshot.expenses);
        let resolver = GroupResolver::new(&snapshot.groups, snapshot.user.id);

        let mut outcomes = Vec::new();
        for tagged in extract_tagged(&transactions) {
            let status = self.process(&tagged, &index, &resolver).await;
            outcomes.push(TransactionOutcome {
                transaction_id: tagged.transaction.id.clone(),
                tag: tagged.tag,
                status,
            });
        }

        let report = ReconcileReport {
            window_start: since,
            window_end: now,
            fetched_transactions: transactions.len(),
            fetched_expenses: snapshot.expenses.len(),
            page_cap_reached,
            expense_page_cap_reached: snapshot.expenses.len() >= self.options.expense_limit,
            outcomes,
        };
        info!("Reconciliation finished: {}", report.summary());
        Ok(report)
    }

    async fn fetch_transactions(
        &self,
        since: DateTime<Utc>,
        before: DateTime<Utc>,
    ) -> ReconcileResult<Vec<Transaction>> {
        let transactions = self
            .bank
            .list_transactions(
                &self.options.account_id,
                since,
                before,
                self.options.transaction_limit,
            )
            .await?;
        info!("Fetched {} transactions", transactions.len());
        Ok(transactions)
    }

    async fn fetch_ledger(&self, since: DateTime<Utc>) -> ReconcileResult<LedgerSnapshot> {
        let (user, groups, expenses) = tokio::try_join!(
            self.ledger.current_user(),
            self.ledger.list_groups(),
            self.ledger.list_expenses(since, self.options.expense_limit)
        )?;
        info!(
            "Logged in as ledger user {} ({}): fetched {} groups and {} expenses",
            user.id,
            user.email.as_deref().unwrap_or("no email"),
            groups.len(),
            expenses.len()
        );
        if expenses.len() >= self.options.expense_limit {
            warn!(
                "{} expenses fetched, the page limit; duplicates outside the page will not be detected",
                expenses.len()
            );
        }
        Ok(LedgerSnapshot {
            user,
            groups,
            expenses,
        })
    }

    async fn process(
        &self,
        tagged: &TaggedTransaction<'_>,
        index: &LedgerIndex<'_>,
        resolver: &GroupResolver<'_>,
    ) -> OutcomeStatus {
        let transaction = tagged.transaction;

        if let Some(entry) = index.find(&transaction.id) {
            debug!(
                "Transaction {} already recorded as expense {}",
                transaction.id, entry.id
            );
            return OutcomeStatus::SkippedDuplicate {
                ledger_entry_id: entry.id,
            };
        }

        let request = match self.prepare(tagged, resolver) {
            Ok(request) => request,
            Err(e) if e.is_no_group() => {
                warn!("Skipping transaction {}: {}", transaction.id, e);
                return OutcomeStatus::SkippedNoGroup {
                    reason: e.to_string(),
                };
            }
            Err(e) => {
                warn!("Cannot build expense for transaction {}: {}", transaction.id, e);
                return OutcomeStatus::Failed {
                    reason: e.to_string(),
                };
            }
        };

        if self.options.dry_run {
            info!(
                "Dry run: would add {} {} to group {} for transaction {}",
                request.cost, request.currency, request.group_id, transaction.id
            );
            return OutcomeStatus::Planned { request };
        }

        match self.sink.create_expense(&request).await {
            Ok(created) => {
                info!(
                    "Added expense {} to group {} for transaction {}",
                    created.id, request.group_id, transaction.id
                );
                OutcomeStatus::Posted {
                    expense_id: created.id,
                    request,
                }
            }
            Err(e) => {
                warn!("Failed to add expense for transaction {}: {}", transaction.id, e);
                OutcomeStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn prepare(
        &self,
        tagged: &TaggedTransaction<'_>,
        resolver: &GroupResolver<'_>,
    ) -> ReconcileResult<ExpenseRequest> {
        let resolution = resolver.resolve(&tagged.tag)?;
        let plan = plan_split(
            resolution.payer,
            tagged.transaction.cost()?,
            &resolution.participants,
        )?;

        ExpenseRequestBuilder::new(tagged.transaction)
            .group(resolution.group_id)
            .split(plan)
            .build_with(self.validator.as_ref())
    }
}
