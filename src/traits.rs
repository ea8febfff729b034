//! Traits for the external collaborators and pluggable validation

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::*;
use crate::utils::validation::*;

/// Read access to the bank
///
/// Implementations wrap the banking API; the reconciler only ever reads
/// one account's transactions for a bounded window.
#[async_trait]
pub trait BankSource: Send + Sync {
    /// List the accounts visible to the current token
    async fn list_accounts(&self) -> ReconcileResult<Vec<BankAccount>>;

    /// List transactions created in `[since, before)`, at most `limit` of them
    async fn list_transactions(
        &self,
        account_id: &str,
        since: DateTime<Utc>,
        before: DateTime<Utc>,
        limit: usize,
    ) -> ReconcileResult<Vec<Transaction>>;
}

/// Read access to the expense ledger
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Get the authenticated user
    async fn current_user(&self) -> ReconcileResult<User>;

    /// List all groups the user belongs to, with their members
    async fn list_groups(&self) -> ReconcileResult<Vec<Group>>;

    /// List expenses dated after `dated_after`, across all groups and ungrouped
    async fn list_expenses(
        &self,
        dated_after: DateTime<Utc>,
        limit: usize,
    ) -> ReconcileResult<Vec<LedgerEntry>>;
}

/// Write access to the expense ledger
#[async_trait]
pub trait ExpenseSink: Send + Sync {
    /// Create one expense
    async fn create_expense(&self, request: &ExpenseRequest) -> ReconcileResult<CreatedExpense>;
}

/// Trait for implementing custom expense request validation rules
pub trait ExpenseValidator: Send + Sync {
    /// Validate a request before it is handed to the sink
    fn validate_request(&self, request: &ExpenseRequest) -> ReconcileResult<()>;
}

/// Default validator: amounts balance, marker present, not a payment
pub struct DefaultExpenseValidator;

impl ExpenseValidator for DefaultExpenseValidator {
    fn validate_request(&self, request: &ExpenseRequest) -> ReconcileResult<()> {
        validate_positive_amount(request.cost)?;
        validate_currency(&request.currency)?;

        if request.users.is_empty() {
            return Err(ReconcileError::Validation(
                "Expense must have at least one participant".to_string(),
            ));
        }

        if request.total_owed() != request.cost {
            return Err(ReconcileError::Validation(format!(
                "Owed shares sum to {} but cost is {}",
                request.total_owed(),
                request.cost
            )));
        }

        if request.total_paid() != request.cost {
            return Err(ReconcileError::Validation(format!(
                "Paid shares sum to {} but cost is {}",
                request.total_paid(),
                request.cost
            )));
        }

        validate_details_marker(&request.details)?;

        if request.payment {
            return Err(ReconcileError::Validation(
                "Split expenses must not be recorded as payments".to_string(),
            ));
        }

        Ok(())
    }
}
