// This is a metapackage for end-to-end tests
// Re-export workspace crates as modules

pub use api_gateway;
pub use common;
pub use wallet_service;
