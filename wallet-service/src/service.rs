//! Wallet service implementation
//!
//! Writes go to the ledger store and then invalidate the cached balance.
//! Reads are served cache-first and repopulate the cache on a miss.
//!
//! There is a window between a ledger commit and the following
//! invalidation in which a concurrent reader may cache the pre-write
//! balance; a failed invalidation leaves a stale entry until its TTL
//! expires. Both are bounded by the cache TTL. The non-negativity
//! guarantee lives only in the ledger store and is unaffected.

use std::sync::Arc;
use std::time::Duration;

use common::decimal::{precision, Amount};
use common::error::{Error, ErrorExt, Result};
use common::model::{CacheEntry, OperationType, WalletBalance, WalletOperation};
use sqlx::PgPool;
use tracing::{debug, error, info, warn};

use crate::cache::{BalanceCache, InMemoryBalanceCache, RedisBalanceCache};
use crate::config::{WalletServiceConfig, DEFAULT_CACHE_TTL};
use crate::ledger::{InMemoryLedgerStore, LedgerStore, PostgresLedgerStore};

/// Wallet service orchestrating the ledger store and the balance cache
pub struct WalletService {
    /// Authoritative balance storage
    store: Arc<dyn LedgerStore>,
    /// Non-authoritative read cache
    cache: Arc<dyn BalanceCache>,
    /// Time-to-live for repopulated cache entries
    cache_ttl: Duration,
}

impl WalletService {
    /// Create a new wallet service over the given store and cache
    pub fn new(store: Arc<dyn LedgerStore>, cache: Arc<dyn BalanceCache>, cache_ttl: Duration) -> Self {
        Self {
            store,
            cache,
            cache_ttl,
        }
    }

    /// Create a wallet service backed entirely by in-memory components
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryLedgerStore::new()),
            Arc::new(InMemoryBalanceCache::new()),
            DEFAULT_CACHE_TTL,
        )
    }

    /// Create a wallet service from configuration over a shared pool.
    ///
    /// Uses Redis when `redis_url` is set, the in-memory cache otherwise.
    pub async fn with_config(config: &WalletServiceConfig, pool: PgPool) -> Result<Self> {
        let cache: Arc<dyn BalanceCache> = match &config.redis_url {
            Some(url) => Arc::new(RedisBalanceCache::connect(url).await?),
            None => {
                info!("REDIS_URL not set, using in-memory balance cache");
                Arc::new(InMemoryBalanceCache::new())
            }
        };

        Ok(Self::new(
            Arc::new(PostgresLedgerStore::new(pool)),
            cache,
            config.cache_ttl,
        ))
    }

    /// Apply a client-submitted deposit or withdrawal
    pub async fn apply_operation(&self, op: &WalletOperation) -> Result<WalletBalance> {
        let operation_type: OperationType = op.operation_type.parse()?;
        validate_amount(op.amount)?;
        if op.wallet_id.is_empty() {
            return Err(Error::ValidationError("wallet id must not be empty".to_string()));
        }

        let delta = operation_type.signed(op.amount);
        info!("Applying {} of {} to wallet {}", operation_type, op.amount, op.wallet_id);

        let balance = self
            .store
            .apply_delta(&op.wallet_id, delta)
            .await
            .map_err(|e| {
                if !e.is_client_error() {
                    error!("Ledger write failed for wallet {}: {}", op.wallet_id, e);
                }
                e
            })
            .with_context(|| format!("{} on wallet {}", operation_type, op.wallet_id))?;

        // Invalidate rather than update: writing `balance` here could race
        // with a later commit and cache an older value.
        if let Err(e) = self.cache.invalidate(&op.wallet_id).await {
            warn!("Failed to invalidate cached balance for wallet {}: {}", op.wallet_id, e);
        }

        Ok(WalletBalance::new(op.wallet_id.clone(), balance))
    }

    /// Deposit funds into a wallet
    pub async fn deposit(&self, wallet_id: &str, amount: Amount) -> Result<WalletBalance> {
        self.apply_operation(&WalletOperation::new(wallet_id, OperationType::Deposit, amount))
            .await
    }

    /// Withdraw funds from a wallet
    pub async fn withdraw(&self, wallet_id: &str, amount: Amount) -> Result<WalletBalance> {
        self.apply_operation(&WalletOperation::new(wallet_id, OperationType::Withdraw, amount))
            .await
    }

    /// Get the balance of a wallet, cache first
    pub async fn get_balance(&self, wallet_id: &str) -> Result<WalletBalance> {
        match self.cache.get(wallet_id).await {
            Ok(Some(entry)) => {
                debug!(
                    "Serving cached balance for wallet {} observed at {}",
                    wallet_id, entry.observed_at
                );
                return Ok(WalletBalance::new(wallet_id, entry.balance));
            }
            Ok(None) => {}
            Err(e) => warn!("Balance cache read failed for wallet {}: {}", wallet_id, e),
        }

        let balance = self.store.get_balance(wallet_id).await.map_err(|e| {
            if !e.is_client_error() {
                error!("Ledger read failed for wallet {}: {}", wallet_id, e);
            }
            e
        })?;

        let entry = CacheEntry::new(balance);
        if let Err(e) = self.cache.set(wallet_id, &entry, self.cache_ttl).await {
            warn!("Failed to cache balance for wallet {}: {}", wallet_id, e);
        } else {
            debug!("Cached balance for wallet {} until {}", wallet_id, entry.expires_at(self.cache_ttl));
        }

        Ok(WalletBalance::new(wallet_id, balance))
    }
}

/// Amounts must be positive and fit the ledger precision
fn validate_amount(amount: Amount) -> Result<()> {
    if amount <= Amount::ZERO {
        return Err(Error::ValidationError(format!("amount must be positive, got {}", amount)));
    }
    if !precision::fits_precision(amount) {
        return Err(Error::ValidationError(format!(
            "amount {} has more than {} decimal places",
            amount,
            precision::AMOUNT_PRECISION
        )));
    }
    Ok(())
}
