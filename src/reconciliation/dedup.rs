//! Duplicate detection against the ledger snapshot
//!
//! A transaction counts as already reconciled when any ledger entry's details
//! contain its id as a substring. Markers written by this tool are indexed
//! for a direct lookup; everything else falls back to the substring scan so
//! hand-edited or older entries still match.
//!
//! Known limitation: an id that happens to be a substring of unrelated
//! details text is treated as reconciled.

use std::collections::HashMap;

use crate::types::*;

/// Lookup structure over one ledger snapshot
#[derive(Debug, Clone, Default)]
pub struct LedgerIndex<'a> {
    entries: &'a [LedgerEntry],
    by_marker: HashMap<&'a str, usize>,
}

impl<'a> LedgerIndex<'a> {
    /// Index every marker found in the entries' details
    pub fn new(entries: &'a [LedgerEntry]) -> Self {
        let mut by_marker = HashMap::new();
        for (position, entry) in entries.iter().enumerate() {
            for id in marker_ids(&entry.details) {
                by_marker.entry(id).or_insert(position);
            }
        }
        Self { entries, by_marker }
    }

    /// The ledger entry that already represents this transaction, if any
    pub fn find(&self, transaction_id: &str) -> Option<&'a LedgerEntry> {
        if let Some(&position) = self.by_marker.get(transaction_id) {
            return Some(&self.entries[position]);
        }
        self.entries
            .iter()
            .find(|entry| entry.details.contains(transaction_id))
    }

    pub fn contains(&self, transaction_id: &str) -> bool {
        self.find(transaction_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Transaction ids following each `MonzoTransaction:` marker in `details`
fn marker_ids(details: &str) -> impl Iterator<Item = &str> {
    details.match_indices(MARKER_PREFIX).filter_map(move |(at, _)| {
        let rest = &details[at + MARKER_PREFIX.len()..];
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let id = &rest[..end];
        (!id.is_empty()).then_some(id)
    })
}
