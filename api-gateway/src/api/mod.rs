//! API handlers
//!
//! Each handler follows a consistent pattern:
//! - Extract state and parameters using Axum extractors
//! - Call the wallet service, which validates the input
//! - Map the result to an explicit response structure or an `ApiError`

pub mod wallet;
