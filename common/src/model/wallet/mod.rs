//! Wallet models and related types

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Amount;
use crate::error::Error;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Kind of balance adjustment requested by a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    /// Add funds
    Deposit,
    /// Remove funds
    Withdraw,
}

impl OperationType {
    /// Signed delta for an unsigned amount: `+amount` for deposits,
    /// `-amount` for withdrawals
    pub fn signed(self, amount: Amount) -> Amount {
        match self {
            OperationType::Deposit => amount,
            OperationType::Withdraw => -amount,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationType::Deposit => "DEPOSIT",
            OperationType::Withdraw => "WITHDRAW",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPOSIT" => Ok(OperationType::Deposit),
            "WITHDRAW" => Ok(OperationType::Withdraw),
            other => Err(Error::ValidationError(format!("invalid operation type: {}", other))),
        }
    }
}

/// Balance adjustment request as submitted by a client.
///
/// The operation type is kept as the raw string so that validation happens
/// in the wallet service rather than at deserialization time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct WalletOperation {
    /// Wallet identifier
    pub wallet_id: String,
    /// "DEPOSIT" or "WITHDRAW"
    pub operation_type: String,
    /// Unsigned amount, must be positive
    #[cfg_attr(feature = "utoipa", schema(value_type = f64))]
    pub amount: Amount,
}

impl WalletOperation {
    pub fn new(wallet_id: impl Into<String>, operation_type: OperationType, amount: Amount) -> Self {
        Self {
            wallet_id: wallet_id.into(),
            operation_type: operation_type.as_str().to_string(),
            amount,
        }
    }
}

/// Committed balance of a wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct WalletBalance {
    /// Wallet identifier
    pub wallet_id: String,
    /// Balance, serialized as a JSON number
    #[serde(with = "rust_decimal::serde::float")]
    #[cfg_attr(feature = "utoipa", schema(value_type = f64))]
    pub balance: Amount,
}

impl WalletBalance {
    pub fn new(wallet_id: impl Into<String>, balance: Amount) -> Self {
        Self {
            wallet_id: wallet_id.into(),
            balance,
        }
    }
}

/// Snapshot of a wallet balance held by the balance cache.
///
/// Not authoritative: the ledger may have moved on since `observed_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Balance at the time of the snapshot
    pub balance: Amount,
    /// When the snapshot was read from the ledger
    pub observed_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Snapshot taken now
    pub fn new(balance: Amount) -> Self {
        Self {
            balance,
            observed_at: Utc::now(),
        }
    }

    /// Wall-clock expiry of this snapshot for the given TTL
    pub fn expires_at(&self, ttl: Duration) -> DateTime<Utc> {
        chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| self.observed_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
