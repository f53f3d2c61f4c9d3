//! Common types and utilities for the wallet platform
//!
//! This library contains shared types, utilities, and abstractions used by
//! the wallet service and the API gateway. It provides a unified approach to
//! error handling, database access, and domain models.

pub mod error;
pub mod model;
pub mod decimal;
pub mod db;

/// Re-export important types
pub use error::{Error, Result, ErrorExt};
pub use decimal::*;

// Re-export utoipa for use in model ToSchema derives
#[cfg(feature = "utoipa")]
pub use utoipa;
