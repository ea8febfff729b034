//! Exact, fair division of an amount between participants
//!
//! All arithmetic is integer minor units. Every participant gets
//! `amount / n`; the first `amount % n` participants in order get one more.

use crate::types::*;

/// Split `amount` into `parts` shares that sum to `amount` exactly
pub fn split_evenly(amount: MinorUnits, parts: usize) -> ReconcileResult<Vec<MinorUnits>> {
    if amount < 0 {
        return Err(ReconcileError::InvalidSplit(format!(
            "Cannot split negative amount {}",
            amount
        )));
    }
    if parts == 0 {
        return Err(ReconcileError::InvalidSplit(
            "Cannot split between zero participants".to_string(),
        ));
    }

    let parts_i = MinorUnits::try_from(parts).map_err(|_| {
        ReconcileError::InvalidSplit(format!("Too many participants: {}", parts))
    })?;
    let base = amount / parts_i;
    let remainder = (amount % parts_i) as usize;

    Ok((0..parts)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect())
}

/// Build a plan where `payer` covers `total` and each participant owes a share
pub fn plan_split(
    payer: UserId,
    total: MinorUnits,
    participants: &[UserId],
) -> ReconcileResult<SplitPlan> {
    if !participants.contains(&payer) {
        return Err(ReconcileError::InvalidSplit(format!(
            "Payer {} is not among the participants",
            payer
        )));
    }

    let owed = split_evenly(total, participants.len())?;
    let shares = participants
        .iter()
        .zip(owed)
        .map(|(&user_id, owed)| Share { user_id, owed })
        .collect();

    Ok(SplitPlan {
        payer,
        total,
        shares,
    })
}
