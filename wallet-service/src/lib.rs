//! Wallet service for maintaining non-negative balances with cache-aside reads

pub mod service;
pub mod ledger;
pub mod cache;
pub mod config;

pub use service::WalletService;
pub use ledger::{LedgerStore, InMemoryLedgerStore, PostgresLedgerStore};
pub use cache::{BalanceCache, InMemoryBalanceCache, RedisBalanceCache};
pub use config::WalletServiceConfig;
