//! Conversion between decimal amounts and stored minor units.
//!
//! Amounts travel through the engine as [`Decimal`] so statement lines keep
//! whatever precision the bank printed. The database stores balances and
//! movement magnitudes as signed `i64` **minor units** with two fraction
//! digits:
//!
//! ```rust
//! use engine::money::{from_minor, to_minor};
//! use rust_decimal::Decimal;
//!
//! assert_eq!(to_minor(Decimal::new(1050, 2)).unwrap(), 1050);
//! assert_eq!(from_minor(-1), Decimal::new(-1, 2));
//! ```

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

use crate::{EngineError, ResultEngine};

/// Number of fraction digits kept by the store.
pub const MINOR_UNITS: u32 = 2;

/// Converts stored minor units into a decimal amount.
#[must_use]
pub fn from_minor(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_UNITS)
}

/// Converts a decimal amount into minor units.
///
/// Extra fraction digits are rounded half away from zero, so `10.005`
/// becomes `1001`.
pub fn to_minor(amount: Decimal) -> ResultEngine<i64> {
    let rounded = amount.round_dp_with_strategy(MINOR_UNITS, RoundingStrategy::MidpointAwayFromZero);
    rounded
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.to_i64())
        .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))
}

/// Converts a non-negative magnitude into minor units.
pub(crate) fn magnitude_to_minor(amount: Decimal) -> ResultEngine<i64> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(EngineError::InvalidAmount(
            "magnitude must be >= 0".to_string(),
        ));
    }
    to_minor(amount)
}
