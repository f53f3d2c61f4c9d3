//! Best-effort balance cache
//!
//! The cache is never consulted for the correctness of writes. Every
//! operation may fail with `Error::CacheFault`; callers log the fault and
//! carry on as if the entry were absent.

use std::time::Duration;

use async_trait::async_trait;
use common::error::{Error, Result};
use common::model::CacheEntry;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::time::Instant;
use tracing::{debug, info};

/// Cap for in-memory expiry when the configured TTL does not fit the clock
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Balance cache trait, keyed by wallet ID
#[async_trait]
pub trait BalanceCache: Send + Sync {
    /// Get an unexpired entry, `None` on miss
    async fn get(&self, wallet_id: &str) -> Result<Option<CacheEntry>>;

    /// Store or overwrite an entry with a fixed time-to-live
    async fn set(&self, wallet_id: &str, entry: &CacheEntry, ttl: Duration) -> Result<()>;

    /// Remove the entry if present
    async fn invalidate(&self, wallet_id: &str) -> Result<()>;
}

/// In-process balance cache
pub struct InMemoryBalanceCache {
    /// Entries by wallet ID, with their expiry
    entries: DashMap<String, (CacheEntry, Instant)>,
}

impl InMemoryBalanceCache {
    /// Create a new, empty in-memory cache
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Number of entries held, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InMemoryBalanceCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BalanceCache for InMemoryBalanceCache {
    async fn get(&self, wallet_id: &str) -> Result<Option<CacheEntry>> {
        let now = Instant::now();
        let expired = match self.entries.get(wallet_id) {
            Some(cached) if cached.1 > now => return Ok(Some(cached.0.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            // Only evict if nobody refreshed the entry in the meantime
            self.entries.remove_if(wallet_id, |_, (_, expires)| *expires <= now);
        }
        Ok(None)
    }

    async fn set(&self, wallet_id: &str, entry: &CacheEntry, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        // Wallets that are never read again would otherwise keep their entry
        self.entries.retain(|_, (_, expires)| *expires > now);

        self.entries
            .insert(wallet_id.to_string(), (entry.clone(), expiry_after(now, ttl)));
        Ok(())
    }

    async fn invalidate(&self, wallet_id: &str) -> Result<()> {
        self.entries.remove(wallet_id);
        Ok(())
    }
}

/// Expiry instant for `ttl`, saturating instead of overflowing the clock
fn expiry_after(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl).unwrap_or_else(|| now + FAR_FUTURE)
}

fn cache_fault(err: redis::RedisError) -> Error {
    Error::CacheFault(err.to_string())
}

/// Redis balance cache.
///
/// Values are the JSON encoding of [`CacheEntry`], stored under the wallet
/// ID with a millisecond expiry.
#[derive(Clone)]
pub struct RedisBalanceCache {
    /// Shared, auto-reconnecting connection
    conn: ConnectionManager,
}

impl RedisBalanceCache {
    /// Connect to Redis and verify the connection with a ping
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| Error::ConfigurationError(format!("invalid Redis URL: {}", e)))?;
        let mut conn = ConnectionManager::new(client).await.map_err(cache_fault)?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(cache_fault)?;

        info!("Connected to Redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl BalanceCache for RedisBalanceCache {
    async fn get(&self, wallet_id: &str) -> Result<Option<CacheEntry>> {
        let mut conn = self.conn.clone();
        let data: Option<String> = conn.get(wallet_id).await.map_err(cache_fault)?;

        match data {
            Some(data) => {
                let entry = serde_json::from_str(&data)
                    .map_err(|e| Error::CacheFault(format!("corrupt entry for wallet {}: {}", wallet_id, e)))?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, wallet_id: &str, entry: &CacheEntry, ttl: Duration) -> Result<()> {
        let payload = serde_json::to_string(entry)?;
        // PX rejects zero
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        debug!("Caching balance for wallet {} for {}ms", wallet_id, ttl_ms);

        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(wallet_id)
            .arg(payload)
            .arg("PX")
            .arg(ttl_ms)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(cache_fault)
    }

    async fn invalidate(&self, wallet_id: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(wallet_id).await.map_err(cache_fault)
    }
}
