use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::{JsonRejection, QueryRejection}},
    routing::{get, post},
};

use crate::{
    dto::orders::{
        CancellationRequest, CreateOrderRequest, ExchangeRefundRequest, OrderDetail, OrderList,
        StagedOrderResponse, VirtualOrderResponse,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Order,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{
        cancellation_service, checkout_service, exchange_refund_service, order_service,
        virtual_account_service,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/create", post(create_order))
        .route("/virtual/create", post(create_virtual_order))
        .route("/{order_id}", get(get_order))
        .route("/{order_id}/cancellation", post(request_cancellation))
        .route("/{order_id}/exchange-refund", post(request_exchange_refund))
}

#[utoipa::path(
    post,
    path = "/api/orders/create",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Pre-order staged for card payment", body = ApiResponse<StagedOrderResponse>),
        (status = 400, description = "Empty or invalid items"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<StagedOrderResponse>>> {
    let Json(payload) = payload?;
    let resp = checkout_service::stage_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/virtual/create",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "PENDING order created for bank transfer", body = ApiResponse<VirtualOrderResponse>),
        (status = 400, description = "Empty or invalid items"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_virtual_order(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<VirtualOrderResponse>>> {
    let Json(payload) = payload?;
    let resp = virtual_account_service::create_virtual_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "PENDING, PAID, CANCELLED or FAILED"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "Own orders", body = ApiResponse<OrderList>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<OrderListQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let Query(query) = query?;
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{order_id}",
    params(("order_id" = String, Path, description = "External order id")),
    responses(
        (status = 200, description = "Order with items and payments", body = ApiResponse<OrderDetail>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let resp = order_service::get_order(&state, &user, &order_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{order_id}/cancellation",
    params(("order_id" = String, Path, description = "External order id")),
    request_body = CancellationRequest,
    responses(
        (status = 200, description = "Cancellation requested", body = ApiResponse<Order>),
        (status = 400, description = "Invalid reason or order state"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn request_cancellation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
    payload: Result<Json<CancellationRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let Json(payload) = payload?;
    let resp = cancellation_service::request_cancellation(&state, &user, &order_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{order_id}/exchange-refund",
    params(("order_id" = String, Path, description = "External order id")),
    request_body = ExchangeRefundRequest,
    responses(
        (status = 200, description = "Exchange or refund requested", body = ApiResponse<Order>),
        (status = 400, description = "Invalid type or order state"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn request_exchange_refund(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
    payload: Result<Json<ExchangeRefundRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let Json(payload) = payload?;
    let resp =
        exchange_refund_service::request_exchange_refund(&state, &user, &order_id, payload).await?;
    Ok(Json(resp))
}
