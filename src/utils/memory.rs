//! In-memory collaborators for testing and development

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::traits::*;
use crate::types::*;
use crate::utils::money::to_decimal;

fn poisoned<T>(_: T) -> ReconcileError {
    ReconcileError::Upstream("in-memory store lock poisoned".to_string())
}

/// In-memory bank holding one account's transactions
#[derive(Debug, Clone, Default)]
pub struct MemoryBank {
    accounts: Arc<RwLock<Vec<BankAccount>>>,
    transactions: Arc<RwLock<Vec<Transaction>>>,
}

impl MemoryBank {
    /// Create a bank with the given transactions, newest last
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self {
            accounts: Arc::new(RwLock::new(Vec::new())),
            transactions: Arc::new(RwLock::new(transactions)),
        }
    }

    pub fn with_accounts(self, accounts: Vec<BankAccount>) -> Self {
        if let Ok(mut current) = self.accounts.write() {
            *current = accounts;
        }
        self
    }
}

#[async_trait]
impl BankSource for MemoryBank {
    async fn list_accounts(&self) -> ReconcileResult<Vec<BankAccount>> {
        Ok(self.accounts.read().map_err(poisoned)?.clone())
    }

    async fn list_transactions(
        &self,
        _account_id: &str,
        since: DateTime<Utc>,
        before: DateTime<Utc>,
        limit: usize,
    ) -> ReconcileResult<Vec<Transaction>> {
        let transactions = self.transactions.read().map_err(poisoned)?;
        Ok(transactions
            .iter()
            .filter(|txn| txn.created >= since && txn.created < before)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// In-memory expense ledger; created expenses show up in later listings
#[derive(Debug, Clone)]
pub struct MemoryLedger {
    user: User,
    groups: Arc<RwLock<Vec<Group>>>,
    expenses: Arc<RwLock<Vec<(DateTime<Utc>, LedgerEntry)>>>,
    failing_transactions: Arc<RwLock<HashSet<String>>>,
    next_id: Arc<RwLock<i64>>,
}

impl MemoryLedger {
    /// Create a ledger for the given authenticated user
    pub fn new(user_id: UserId) -> Self {
        Self {
            user: User {
                id: user_id,
                email: None,
            },
            groups: Arc::new(RwLock::new(Vec::new())),
            expenses: Arc::new(RwLock::new(Vec::new())),
            failing_transactions: Arc::new(RwLock::new(HashSet::new())),
            next_id: Arc::new(RwLock::new(1)),
        }
    }

    pub fn with_groups(self, groups: Vec<Group>) -> Self {
        if let Ok(mut current) = self.groups.write() {
            *current = groups;
        }
        self
    }

    /// Add an existing expense dated `date`
    pub fn insert_entry(&self, date: DateTime<Utc>, entry: LedgerEntry) -> ReconcileResult<()> {
        self.expenses.write().map_err(poisoned)?.push((date, entry));
        Ok(())
    }

    /// Make creation fail for requests whose details mention `transaction_id`
    pub fn fail_on(&self, transaction_id: impl Into<String>) -> ReconcileResult<()> {
        self.failing_transactions
            .write()
            .map_err(poisoned)?
            .insert(transaction_id.into());
        Ok(())
    }

    /// All stored expenses, oldest first
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.expenses
            .read()
            .map(|expenses| expenses.iter().map(|(_, e)| e.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LedgerSource for MemoryLedger {
    async fn current_user(&self) -> ReconcileResult<User> {
        Ok(self.user.clone())
    }

    async fn list_groups(&self) -> ReconcileResult<Vec<Group>> {
        Ok(self.groups.read().map_err(poisoned)?.clone())
    }

    async fn list_expenses(
        &self,
        dated_after: DateTime<Utc>,
        limit: usize,
    ) -> ReconcileResult<Vec<LedgerEntry>> {
        let expenses = self.expenses.read().map_err(poisoned)?;
        Ok(expenses
            .iter()
            .filter(|(date, _)| *date > dated_after)
            .take(limit)
            .map(|(_, entry)| entry.clone())
            .collect())
    }
}

#[async_trait]
impl ExpenseSink for MemoryLedger {
    async fn create_expense(&self, request: &ExpenseRequest) -> ReconcileResult<CreatedExpense> {
        let should_fail = self
            .failing_transactions
            .read()
            .map_err(poisoned)?
            .iter()
            .any(|id| request.details.contains(id.as_str()));
        if should_fail {
            return Err(ReconcileError::Sink(format!(
                "rejected expense '{}'",
                request.description
            )));
        }

        let id = {
            let mut next_id = self.next_id.write().map_err(poisoned)?;
            let id = *next_id;
            *next_id += 1;
            id
        };

        let entry = LedgerEntry {
            id,
            group_id: request.group_id,
            description: request.description.clone(),
            details: request.details.clone(),
            cost: to_decimal(request.cost),
            currency: request.currency.clone(),
            participants: request.users.iter().map(|u| u.user_id).collect(),
        };
        self.insert_entry(request.date, entry)?;

        Ok(CreatedExpense { id })
    }
}
