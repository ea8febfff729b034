//! Core types and data structures for the reconciliation system

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Amount in the smallest currency denomination (pence, cents)
pub type MinorUnits = i64;

/// Identifier of a user in the expense ledger
pub type UserId = i64;

/// Identifier of a group in the expense ledger. `0` means "not in a group".
pub type GroupId = i64;

/// Group id used for expenses that do not belong to any group
pub const UNGROUPED: GroupId = 0;

/// Prefix of the idempotency marker embedded in expense details
pub const MARKER_PREFIX: &str = "MonzoTransaction:";

/// Build the idempotency marker for a bank transaction id
pub fn marker_for(transaction_id: &str) -> String {
    format!("{MARKER_PREFIX}{transaction_id}")
}

/// Bank account as listed by the banking collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: String,
    /// Account type, e.g. `uk_retail` for a current account
    #[serde(rename = "type")]
    pub account_type: String,
    #[serde(default)]
    pub description: String,
}

/// Bank transaction, read-only for the duration of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier assigned by the bank
    pub id: String,
    /// Signed amount in minor units; negative values are debits
    pub amount: MinorUnits,
    /// ISO 4217 currency code
    pub currency: String,
    /// Merchant name, or the bank's description when there is no merchant
    pub description: String,
    /// Free-text memo written by the account holder
    pub notes: String,
    /// When the bank created the transaction
    pub created: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(
        id: impl Into<String>,
        amount: MinorUnits,
        currency: impl Into<String>,
        description: impl Into<String>,
        notes: impl Into<String>,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            amount,
            currency: currency.into(),
            description: description.into(),
            notes: notes.into(),
            created,
        }
    }

    /// Outgoing money. Credits and refunds are never split.
    pub fn is_debit(&self) -> bool {
        self.amount < 0
    }

    /// Unsigned size of the transaction in minor units
    pub fn cost(&self) -> ReconcileResult<MinorUnits> {
        self.amount.checked_abs().ok_or_else(|| {
            ReconcileError::InvalidSplit(format!(
                "Amount {} of transaction {} is out of range",
                self.amount, self.id
            ))
        })
    }
}

/// Memo token carrying the `#splitwise` marker, e.g. `#splitwise-flatmates`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag(String);

impl Tag {
    /// The marker every tag contains
    pub const MARKER: &'static str = "#splitwise";

    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret the tag: ungrouped, a named group, or unrecognised
    pub fn target(&self) -> TagTarget<'_> {
        let Some(start) = self.0.find(Self::MARKER) else {
            return TagTarget::Malformed;
        };
        match &self.0[start + Self::MARKER.len()..] {
            "" | "-" => TagTarget::Ungrouped,
            rest => match rest.strip_prefix('-') {
                Some(name) => TagTarget::Group(name),
                None => TagTarget::Malformed,
            },
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a tag asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagTarget<'a> {
    /// `#splitwise` or `#splitwise-`: an expense outside any group
    Ungrouped,
    /// `#splitwise-<name>`: the group whose normalized name matches
    Group(&'a str),
    /// The marker is followed by something other than `-`
    Malformed,
}

/// A debit transaction together with the first tag found in its memo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedTransaction<'a> {
    pub transaction: &'a Transaction,
    pub tag: Tag,
}

/// Expense already recorded in the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    /// Owning group, `0` for expenses outside any group
    pub group_id: GroupId,
    pub description: String,
    /// Free text; entries created by this tool carry the marker here
    pub details: String,
    /// Cost in major units as reported by the ledger
    pub cost: BigDecimal,
    pub currency: String,
    pub participants: Vec<UserId>,
}

/// Member of a ledger group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: UserId,
}

/// Ledger group with its members in listing order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub members: Vec<Member>,
}

impl Group {
    pub fn new(id: GroupId, name: impl Into<String>, members: &[UserId]) -> Self {
        Self {
            id,
            name: name.into(),
            members: members.iter().map(|&id| Member { id }).collect(),
        }
    }

    pub fn member_ids(&self) -> Vec<UserId> {
        self.members.iter().map(|m| m.id).collect()
    }
}

/// The authenticated ledger user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

/// One participant's owed amount within a split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub user_id: UserId,
    pub owed: MinorUnits,
}

/// Per-participant owed amounts for one transaction.
///
/// The owed amounts always sum to `total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPlan {
    pub payer: UserId,
    pub total: MinorUnits,
    pub shares: Vec<Share>,
}

impl SplitPlan {
    pub fn owed_total(&self) -> MinorUnits {
        self.shares.iter().map(|s| s.owed).sum()
    }
}

/// Paid and owed amounts for one user in an expense request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserShare {
    pub user_id: UserId,
    pub paid_share: MinorUnits,
    pub owed_share: MinorUnits,
}

/// Payload for creating one shared expense in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRequest {
    /// Total cost in minor units, always positive
    pub cost: MinorUnits,
    pub currency: String,
    pub description: String,
    pub group_id: GroupId,
    /// Carries the idempotency marker of the source transaction
    pub details: String,
    pub date: DateTime<Utc>,
    /// Always `false`: these are expenses, not settlements
    pub payment: bool,
    pub creation_method: String,
    pub users: Vec<UserShare>,
}

impl ExpenseRequest {
    pub fn total_owed(&self) -> MinorUnits {
        self.users.iter().map(|u| u.owed_share).sum()
    }

    pub fn total_paid(&self) -> MinorUnits {
        self.users.iter().map(|u| u.paid_share).sum()
    }
}

/// Expense returned by the ledger after creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedExpense {
    pub id: i64,
}

/// Errors that can occur while reconciling
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReconcileError {
    #[error("Group not found: {0}")]
    GroupNotFound(String),
    #[error("Malformed tag: {0}")]
    MalformedTag(String),
    #[error("Expense creation failed: {0}")]
    Sink(String),
    #[error("Upstream fetch failed: {0}")]
    Upstream(String),
    #[error("Invalid split: {0}")]
    InvalidSplit(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("HTTP error: {0}")]
    Http(String),
}

impl ReconcileError {
    /// Tag-related failures; the transaction is skipped rather than failed
    pub fn is_no_group(&self) -> bool {
        matches!(
            self,
            ReconcileError::GroupNotFound(_) | ReconcileError::MalformedTag(_)
        )
    }
}

/// Result type for reconciliation operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;
