//! Tag extraction from transaction memos

use crate::types::*;

/// First memo token containing the `#splitwise` marker
pub fn find_tag(notes: &str) -> Option<Tag> {
    notes
        .split_whitespace()
        .find(|token| token.contains(Tag::MARKER))
        .map(Tag::new)
}

/// Debit transactions whose memo carries a tag, at most one entry each.
///
/// The returned iterator is lazy and can be cloned to walk the batch again.
pub fn extract_tagged(
    transactions: &[Transaction],
) -> impl Iterator<Item = TaggedTransaction<'_>> + Clone {
    transactions.iter().filter_map(|transaction| {
        if !transaction.is_debit() {
            return None;
        }
        find_tag(&transaction.notes).map(|tag| TaggedTransaction { transaction, tag })
    })
}
