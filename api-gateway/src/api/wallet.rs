//! Wallet API handlers
//!
//! Handles endpoints related to wallet balances:
//! - Deposit or withdraw funds
//! - Get the current balance

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use common::model::{WalletBalance, WalletOperation};

use crate::error::ApiError;
use crate::AppState;

/// Deposit into or withdraw from a wallet
#[utoipa::path(
    post,
    path = "/api/v1/wallet",
    request_body = WalletOperation,
    responses(
        (status = 200, description = "Operation applied", body = WalletBalance),
        (status = 400, description = "Invalid request or insufficient funds"),
        (status = 500, description = "Internal server error")
    ),
    tag = "wallet"
)]
pub async fn change_wallet(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<WalletOperation>, JsonRejection>,
) -> Result<Json<WalletBalance>, ApiError> {
    let Json(operation) = payload?;

    let balance = state.wallet_service.apply_operation(&operation).await?;

    Ok(Json(balance))
}

/// Get the balance of a wallet
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{walletId}",
    params(
        ("walletId" = String, Path, description = "Wallet ID")
    ),
    responses(
        (status = 200, description = "Balance retrieved successfully", body = WalletBalance),
        (status = 404, description = "Wallet not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "wallet"
)]
pub async fn get_wallet(
    State(state): State<Arc<AppState>>,
    Path(wallet_id): Path<String>,
) -> Result<Json<WalletBalance>, ApiError> {
    let balance = state.wallet_service.get_balance(&wallet_id).await?;

    Ok(Json(balance))
}
