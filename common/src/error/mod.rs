//! Error types for the wallet platform
//!
//! This module provides a unified error handling system shared by the
//! ledger store, the balance cache and the HTTP layer. Client-facing
//! classification (400/404/500) is decided by the API gateway from these
//! variants.

use std::fmt::Display;
use thiserror::Error;

/// Wallet platform error type
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or unrecognized wallet operation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Conditional write rejected because the balance would go negative
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Wallet has never been created
    #[error("Wallet not found: {0}")]
    WalletNotFound(String),

    /// Lower-level ledger storage fault (connection, timeout, integrity)
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),

    /// Balance cache fault. Logged and absorbed, never surfaced to clients.
    #[error("Cache fault: {0}")]
    CacheFault(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Database migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error was caused by the request rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::ValidationError(_) | Error::InsufficientFunds(_) | Error::WalletNotFound(_)
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                Error::ValidationError(msg) => Error::ValidationError(format!("{}: {}", context, msg)),
                Error::InsufficientFunds(msg) => Error::InsufficientFunds(format!("{}: {}", context, msg)),
                Error::WalletNotFound(msg) => Error::WalletNotFound(format!("{}: {}", context, msg)),
                Error::CacheFault(msg) => Error::CacheFault(format!("{}: {}", context, msg)),
                Error::ConfigurationError(msg) => Error::ConfigurationError(format!("{}: {}", context, msg)),
                Error::StoreUnavailable(e) => Error::StoreUnavailable(e),
                Error::Migration(e) => Error::Migration(e),
                Error::Serialization(e) => Error::Serialization(e),
            }
        })
    }
}
