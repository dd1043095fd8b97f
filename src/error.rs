use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    response::ApiResponse,
    staging::StagingError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Unauthorized {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Order items are empty")]
    EmptyItems,

    #[error("Unknown product {0}")]
    UnknownProduct(Uuid),

    #[error("Invalid variant: {0}")]
    InvalidVariant(String),

    #[error("Invalid order state: {0}")]
    InvalidOrderState(String),

    #[error("Pre-order has expired or is invalid")]
    StagedOrderExpired,

    #[error("Amount mismatch: expected {expected}, got {claimed}")]
    AmountMismatch { expected: i64, claimed: i64 },

    #[error("Payment gateway error: {0}")]
    GatewayConfirm(String),

    #[error("Invalid bank code {0}")]
    InvalidBankCode(String),

    #[error("Unknown paymentKey")]
    UnknownPaymentKey,

    #[error("Invalid shipping status {0}")]
    InvalidShippingStatus(String),

    #[error("Invalid cancellation reason {0}")]
    InvalidCancellationReason(String),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Staging store error")]
    Staging(#[from] StagingError),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound | AppError::UnknownPaymentKey => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::BadRequest(_)
            | AppError::EmptyItems
            | AppError::UnknownProduct(_)
            | AppError::InvalidVariant(_)
            | AppError::InvalidOrderState(_)
            | AppError::StagedOrderExpired
            | AppError::AmountMismatch { .. }
            | AppError::GatewayConfirm(_)
            | AppError::InvalidBankCode(_)
            | AppError::InvalidShippingStatus(_)
            | AppError::InvalidCancellationReason(_) => StatusCode::BAD_REQUEST,
            AppError::OrmError(_) | AppError::Staging(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let body = ApiResponse::failure(
            self.to_string(),
            ErrorData {
                error: self.to_string(),
            },
        );

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
