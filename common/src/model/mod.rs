//! Domain models for the wallet platform

pub mod wallet;

pub use wallet::{CacheEntry, OperationType, WalletBalance, WalletOperation};
