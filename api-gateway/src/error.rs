//! Error handling for the API gateway

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error information
    pub error: ErrorInfo,
    /// Request ID for tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Detailed error information
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code (string identifier for the error type)
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Common(#[from] common::error::Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Any undecodable body is a client error, including the cases axum
        // would report as 415 or 422
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    /// Status code, error code and optional details for this error
    fn classify(&self) -> (StatusCode, &'static str, Option<serde_json::Value>) {
        use common::error::Error;

        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", None),
            ApiError::Common(e) => match e {
                // Client errors (4xx)
                Error::ValidationError(_) => (StatusCode::BAD_REQUEST, "validation_error", None),
                Error::InsufficientFunds(_) => (StatusCode::BAD_REQUEST, "insufficient_funds", None),
                Error::WalletNotFound(_) => (StatusCode::NOT_FOUND, "wallet_not_found", None),

                // Server errors (5xx)
                Error::StoreUnavailable(e) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "store_unavailable",
                    e.as_database_error()
                        .and_then(|dbe| dbe.code())
                        .map(|code| serde_json::json!({ "code": code })),
                ),
                Error::CacheFault(_) => (StatusCode::INTERNAL_SERVER_ERROR, "cache_fault", None),
                Error::ConfigurationError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", None),
                Error::Migration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "migration_error", None),
                Error::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error", None),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Generate a request ID for tracking errors
        let request_id = Uuid::new_v4().to_string();

        let (status, code, details) = self.classify();

        if status.is_server_error() {
            tracing::error!("API Error [{}]: {:?}", request_id, &self);
        } else {
            tracing::debug!("API Error [{}]: {}", request_id, &self);
        }

        // Internal details stay in the logs
        let message = if status.is_server_error() {
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let error_response = ErrorResponse {
            error: ErrorInfo {
                code: code.to_string(),
                message,
                details,
            },
            request_id: Some(request_id),
        };

        (status, Json(error_response)).into_response()
    }
}
