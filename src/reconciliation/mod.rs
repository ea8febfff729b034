//! Reconciliation of tagged bank transactions into ledger expenses
//!
//! The pipeline per transaction is: tag extraction, duplicate detection,
//! group resolution, split calculation, request building, posting.

pub mod core;
pub mod dedup;
pub mod groups;
pub mod request;
pub mod split;
pub mod tags;

pub use self::core::*;
pub use dedup::*;
pub use groups::*;
pub use request::*;
pub use split::*;
pub use tags::*;
