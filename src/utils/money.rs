//! Conversions between integer minor units and the ledger's decimal strings

use bigdecimal::BigDecimal;
use std::str::FromStr;

use crate::types::*;

/// Decimal places used for every supported currency
pub const MINOR_UNIT_SCALE: i64 = 2;

/// Render minor units as a decimal amount, e.g. `750` -> `7.50`
pub fn to_decimal(amount: MinorUnits) -> BigDecimal {
    BigDecimal::new(amount.into(), MINOR_UNIT_SCALE)
}

/// Render minor units as the string the ledger API expects
pub fn format_minor_units(amount: MinorUnits) -> String {
    format!("{:.2}", to_decimal(amount))
}

/// Parse a decimal amount reported by the ledger, e.g. `"7.5"`
pub fn parse_decimal(value: &str) -> ReconcileResult<BigDecimal> {
    BigDecimal::from_str(value.trim())
        .map_err(|e| ReconcileError::Validation(format!("Invalid amount '{}': {}", value, e)))
}
