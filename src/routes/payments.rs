use axum::{
    Json, Router,
    extract::{Query, RawQuery, State, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
};

use crate::{
    dto::payments::{
        ConfirmQuery, ConfirmResult, DepositWebhook, FailQuery, FailResult, PaymentRequestBody,
        PaymentRequestData, VirtualAccountRequestBody, VirtualAccountResult, WebhookAck,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::{checkout_service, virtual_account_service},
    state::AppState,
};

const CONFIRM_PATH: &str = "/api/payments/toss/confirm";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/toss/request", post(request_payment))
        .route("/toss/success", get(payment_success))
        .route("/toss/confirm", get(confirm_payment))
        .route("/toss/fail", get(payment_fail))
        .route("/toss/virtual-request", post(request_virtual_account))
        .route("/toss/virtual-webhook", post(deposit_webhook))
}

#[utoipa::path(
    post,
    path = "/api/payments/toss/request",
    request_body = PaymentRequestBody,
    responses(
        (status = 200, description = "Widget parameters", body = ApiResponse<PaymentRequestData>),
        (status = 400, description = "Order not PENDING or pre-order expired"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn request_payment(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<PaymentRequestBody>, JsonRejection>,
) -> AppResult<Json<ApiResponse<PaymentRequestData>>> {
    let Json(payload) = payload?;
    let resp = checkout_service::request_payment(&state, &user, payload).await?;
    Ok(Json(resp))
}

/// Gateway success redirect; the query string is handed to confirm unchanged.
#[utoipa::path(
    get,
    path = "/api/payments/toss/success",
    responses((status = 303, description = "Redirect to confirm")),
    tag = "Payments"
)]
pub async fn payment_success(RawQuery(query): RawQuery) -> Redirect {
    match query {
        Some(query) if !query.is_empty() => Redirect::to(&format!("{CONFIRM_PATH}?{query}")),
        _ => Redirect::to(CONFIRM_PATH),
    }
}

#[utoipa::path(
    get,
    path = "/api/payments/toss/confirm",
    params(ConfirmQuery),
    responses(
        (status = 200, description = "Payment confirmed", body = ApiResponse<ConfirmResult>),
        (status = 400, description = "Amount mismatch, expired pre-order or gateway rejection"),
    ),
    tag = "Payments"
)]
pub async fn confirm_payment(
    State(state): State<AppState>,
    query: Result<Query<ConfirmQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<ConfirmResult>>> {
    let Query(query) = query?;
    let resp = checkout_service::confirm_payment(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/payments/toss/fail",
    params(FailQuery),
    responses((status = 400, description = "Payment failed; pre-order discarded", body = ApiResponse<FailResult>)),
    tag = "Payments"
)]
pub async fn payment_fail(
    State(state): State<AppState>,
    query: Result<Query<FailQuery>, QueryRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<FailResult>>)> {
    let Query(query) = query?;
    let resp = checkout_service::fail_payment(&state, query).await?;
    Ok((StatusCode::BAD_REQUEST, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/payments/toss/virtual-request",
    request_body = VirtualAccountRequestBody,
    responses(
        (status = 200, description = "Virtual account issued", body = ApiResponse<VirtualAccountResult>),
        (status = 400, description = "Invalid bank code, order state or gateway failure"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn request_virtual_account(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<VirtualAccountRequestBody>, JsonRejection>,
) -> AppResult<Json<ApiResponse<VirtualAccountResult>>> {
    let Json(payload) = payload?;
    let resp = virtual_account_service::request_virtual_account(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/payments/toss/virtual-webhook",
    request_body = DepositWebhook,
    responses(
        (status = 200, description = "Notification acknowledged", body = ApiResponse<WebhookAck>),
        (status = 404, description = "Unknown paymentKey"),
    ),
    tag = "Payments"
)]
pub async fn deposit_webhook(
    State(state): State<AppState>,
    payload: Result<Json<DepositWebhook>, JsonRejection>,
) -> AppResult<Json<ApiResponse<WebhookAck>>> {
    let Json(payload) = payload?;
    let resp = virtual_account_service::handle_deposit_webhook(&state, payload).await?;
    Ok(Json(resp))
}
