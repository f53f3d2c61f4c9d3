//! Decimal type utilities for exact monetary calculations

pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

/// Monetary amount with exact decimal precision
pub type Amount = Decimal;

/// Precision helpers for wallet amounts
pub mod precision {
    use super::*;

    /// Maximum number of fractional digits an amount may carry.
    /// Matches the scale of the `wallets.balance` column.
    pub const AMOUNT_PRECISION: u32 = 8;

    /// Whether the amount fits the ledger precision without rounding
    pub fn fits_precision(amount: Amount) -> bool {
        amount.normalize().scale() <= AMOUNT_PRECISION
    }
}
