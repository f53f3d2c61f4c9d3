//! Ledger store for authoritative wallet balances

use async_trait::async_trait;
use common::decimal::Amount;
use common::error::{Error, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sqlx::PgPool;
use tracing::debug;

/// SQLSTATE raised by Postgres when a value does not fit the column type
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// Ledger store trait defining the interface for durable balance storage.
///
/// Implementations must apply a delta as a single indivisible test-and-set:
/// the existence check, the non-negativity check and the write happen
/// atomically with respect to concurrent callers on the same wallet.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Add `delta` to the wallet balance if the result stays non-negative.
    ///
    /// Creates the wallet when it does not exist and `delta >= 0`. Returns
    /// the committed balance, or `InsufficientFunds` without applying
    /// anything when the result would be negative.
    async fn apply_delta(&self, wallet_id: &str, delta: Amount) -> Result<Amount>;

    /// Get the committed balance, `WalletNotFound` if never created
    async fn get_balance(&self, wallet_id: &str) -> Result<Amount>;
}

fn insufficient_funds(wallet_id: &str, delta: Amount) -> Error {
    Error::InsufficientFunds(format!("cannot apply {} to wallet {}", delta, wallet_id))
}

/// In-memory ledger store
pub struct InMemoryLedgerStore {
    /// Balances by wallet ID
    pub balances: DashMap<String, Amount>,
}

impl InMemoryLedgerStore {
    /// Create a new, empty in-memory ledger store
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
        }
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn apply_delta(&self, wallet_id: &str, delta: Amount) -> Result<Amount> {
        // The entry guard holds the shard write lock until it is dropped,
        // so check and write cannot interleave with another caller.
        match self.balances.entry(wallet_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let new_balance = entry
                    .get()
                    .checked_add(delta)
                    .ok_or_else(|| Error::ValidationError(format!("balance overflow for wallet {}", wallet_id)))?;
                if new_balance < Amount::ZERO {
                    return Err(insufficient_funds(wallet_id, delta));
                }
                *entry.get_mut() = new_balance;
                Ok(new_balance)
            }
            Entry::Vacant(entry) => {
                if delta < Amount::ZERO {
                    return Err(insufficient_funds(wallet_id, delta));
                }
                entry.insert(delta);
                Ok(delta)
            }
        }
    }

    async fn get_balance(&self, wallet_id: &str) -> Result<Amount> {
        self.balances
            .get(wallet_id)
            .map(|b| *b)
            .ok_or_else(|| Error::WalletNotFound(wallet_id.to_string()))
    }
}

/// PostgreSQL ledger store
pub struct PostgresLedgerStore {
    /// Database connection pool
    pool: PgPool,
}

impl PostgresLedgerStore {
    /// Create a new PostgreSQL ledger store over a shared pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Classify a driver error raised while applying a delta.
    ///
    /// Integrity faults, including a violated balance check, are store
    /// faults: the WHERE predicates reject overdrafts before the check can.
    fn map_write_error(err: sqlx::Error, wallet_id: &str) -> Error {
        if let Some(db_err) = err.as_database_error() {
            if db_err.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE) {
                return Error::ValidationError(format!("balance out of range for wallet {}", wallet_id));
            }
        }
        Error::StoreUnavailable(err)
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn apply_delta(&self, wallet_id: &str, delta: Amount) -> Result<Amount> {
        debug!("Applying delta {} to wallet {}", delta, wallet_id);

        // Each branch is one statement, so Postgres evaluates the predicate
        // against the latest row version under the row lock.
        let query = if delta < Amount::ZERO {
            // A wallet that does not exist cannot be withdrawn from, so a
            // plain conditional update is enough.
            sqlx::query_scalar::<_, Amount>(
                "UPDATE wallets
                 SET balance = balance + $2, updated_at = NOW()
                 WHERE id = $1 AND balance + $2 >= 0
                 RETURNING balance",
            )
        } else {
            sqlx::query_scalar::<_, Amount>(
                "INSERT INTO wallets (id, balance) VALUES ($1, $2)
                 ON CONFLICT (id) DO UPDATE
                 SET balance = wallets.balance + EXCLUDED.balance, updated_at = NOW()
                 WHERE wallets.balance + EXCLUDED.balance >= 0
                 RETURNING balance",
            )
        };

        query
            .bind(wallet_id)
            .bind(delta)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::map_write_error(e, wallet_id))?
            .ok_or_else(|| insufficient_funds(wallet_id, delta))
    }

    async fn get_balance(&self, wallet_id: &str) -> Result<Amount> {
        debug!("Getting balance from database: {}", wallet_id);

        sqlx::query_scalar::<_, Amount>("SELECT balance FROM wallets WHERE id = $1")
            .bind(wallet_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::WalletNotFound(wallet_id.to_string()))
    }
}
