//! HTTP surface of the wallet service

pub mod api;
pub mod error;
pub mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use wallet_service::WalletService;

use crate::api::wallet::{change_wallet, get_wallet};

/// API documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        api::wallet::change_wallet,
        api::wallet::get_wallet,
    ),
    components(
        schemas(
            common::model::WalletOperation,
            common::model::WalletBalance,
            common::model::OperationType,
        )
    ),
    tags(
        (name = "wallet", description = "Wallet balance endpoints")
    ),
    info(
        title = "Wallet API",
        version = "1.0.0",
        description = "API for depositing into, withdrawing from and reading wallet balances"
    )
)]
pub struct ApiDoc;

/// App state shared across handlers
pub struct AppState {
    /// Wallet service
    pub wallet_service: Arc<WalletService>,
}

/// Build the application router.
///
/// Handler futures are dropped when the client disconnects or the request
/// times out, which cancels any in-flight store or cache call.
pub fn router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Set up API routes
    let api_routes = Router::new()
        .route("/wallet", post(change_wallet))
        .route("/wallets/:wallet_id", get(get_wallet));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
