//! Validation utilities

use crate::types::*;

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: MinorUnits) -> ReconcileResult<()> {
    if amount <= 0 {
        Err(ReconcileError::Validation(
            "Amount must be positive".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate that a currency code looks like ISO 4217
pub fn validate_currency(currency: &str) -> ReconcileResult<()> {
    if currency.trim().is_empty() {
        return Err(ReconcileError::Validation(
            "Currency cannot be empty".to_string(),
        ));
    }

    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ReconcileError::Validation(format!(
            "Currency '{}' is not a three-letter code",
            currency
        )));
    }

    Ok(())
}

/// Validate that expense details carry an idempotency marker
pub fn validate_details_marker(details: &str) -> ReconcileResult<()> {
    match details.find(MARKER_PREFIX) {
        Some(at) if details.len() > at + MARKER_PREFIX.len() => Ok(()),
        _ => Err(ReconcileError::Validation(format!(
            "Details must contain '{}<transaction id>'",
            MARKER_PREFIX
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_amount() {
        assert!(validate_positive_amount(1).is_ok());
        assert!(validate_positive_amount(0).is_err());
        assert!(validate_positive_amount(-5).is_err());
    }

    #[test]
    fn test_currency() {
        assert!(validate_currency("GBP").is_ok());
        assert!(validate_currency("").is_err());
        assert!(validate_currency("POUNDS").is_err());
    }

    #[test]
    fn test_details_marker() {
        assert!(validate_details_marker("MonzoTransaction:tx_1").is_ok());
        assert!(validate_details_marker("note MonzoTransaction:tx_1").is_ok());
        assert!(validate_details_marker("MonzoTransaction:").is_err());
        assert!(validate_details_marker("added by hand").is_err());
    }
}
