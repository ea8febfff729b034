//! # Monzo Splitwise
//!
//! Reconciles outgoing bank transactions tagged with `#splitwise` in their
//! memo against an expense-splitting ledger, creating each shared expense
//! exactly once.
//!
//! ## Features
//!
//! - **Tag extraction**: `#splitwise` for a personal expense, `#splitwise-<group>`
//!   to split with a group (matched ignoring case and spaces)
//! - **Idempotent posting**: every expense carries a `MonzoTransaction:<id>` marker
//!   and transactions already in the ledger are skipped
//! - **Exact splits**: integer minor units, remainder to the first participants
//! - **Partial failure**: one bad transaction never stops the rest of the batch
//! - **Collaborator abstraction**: bank and ledger behind async traits, with
//!   HTTP and in-memory implementations
//!
//! ## Quick Start
//!
//! ```rust
//! use monzo_splitwise::utils::{MemoryBank, MemoryLedger};
//! use monzo_splitwise::{Group, ReconcileOptions, Reconciler, Transaction};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let now = chrono::Utc::now();
//! let bank = MemoryBank::new(vec![Transaction::new(
//!     "tx_1", -1500, "GBP", "Pizza Place", "dinner #splitwise-trip",
//!     now - chrono::Duration::hours(1),
//! )]);
//! let ledger = MemoryLedger::new(1).with_groups(vec![Group::new(20, "Trip", &[1, 2])]);
//!
//! let reconciler = Reconciler::new(bank, ledger.clone(), ledger, ReconcileOptions::new("acc_1"));
//! let report = reconciler.run_at(now).await.unwrap();
//! assert_eq!(report.summary().posted, 1);
//! # }
//! ```

pub mod clients;
pub mod config;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
