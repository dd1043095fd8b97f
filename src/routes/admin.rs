use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::{JsonRejection, QueryRejection}},
    routing::{get, patch, post},
};

use crate::{
    dto::{
        admin::{AdminNoteRequest, ShippingUpdateRequest},
        orders::{OrderDetail, OrderList},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Order,
    response::ApiResponse,
    routes::params::{AdminOrderQuery, RequestListQuery, ShippingListQuery},
    services::{admin_service, cancellation_service, exchange_refund_service, shipping_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .route("/orders/{order_id}", get(get_order_admin))
        .route("/cancellations", get(list_cancellations))
        .route("/cancellations/{order_id}/approve", post(approve_cancellation))
        .route("/cancellations/{order_id}/reject", post(reject_cancellation))
        .route("/exchange-refunds", get(list_exchange_refunds))
        .route("/exchange-refunds/{order_id}/approve", post(approve_exchange_refund))
        .route("/exchange-refunds/{order_id}/reject", post(reject_exchange_refund))
        .route("/shipping", get(list_shipping))
        .route("/shipping/{order_id}", patch(update_shipping))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by order status"),
        ("q" = Option<String>, Query, description = "Search order id or product name"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "All orders (admin only)", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<AdminOrderQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let Query(query) = query?;
    let resp = admin_service::list_all_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{order_id}",
    params(("order_id" = String, Path, description = "External order id")),
    responses(
        (status = 200, description = "Any order with items and payments", body = ApiResponse<OrderDetail>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_order_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let resp = admin_service::get_order_admin(&state, &user, &order_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/cancellations",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "PENDING, APPROVED or REJECTED")
    ),
    responses(
        (status = 200, description = "Orders with a cancellation request", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_cancellations(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<RequestListQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let Query(query) = query?;
    let resp = admin_service::list_cancellations(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/cancellations/{order_id}/approve",
    params(("order_id" = String, Path, description = "External order id")),
    request_body = AdminNoteRequest,
    responses(
        (status = 200, description = "Cancellation approved, order cancelled", body = ApiResponse<Order>),
        (status = 400, description = "No pending cancellation"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn approve_cancellation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
    payload: Option<Json<AdminNoteRequest>>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let resp = cancellation_service::approve_cancellation(&state, &user, &order_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/cancellations/{order_id}/reject",
    params(("order_id" = String, Path, description = "External order id")),
    request_body = AdminNoteRequest,
    responses(
        (status = 200, description = "Cancellation rejected", body = ApiResponse<Order>),
        (status = 400, description = "No pending cancellation or missing note"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn reject_cancellation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
    payload: Result<Json<AdminNoteRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let Json(payload) = payload?;
    let resp = cancellation_service::reject_cancellation(&state, &user, &order_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/exchange-refunds",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "PENDING, APPROVED or REJECTED"),
        ("type" = Option<String>, Query, description = "EXCHANGE or REFUND")
    ),
    responses(
        (status = 200, description = "Orders with an exchange/refund request", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_exchange_refunds(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<RequestListQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let Query(query) = query?;
    let resp = admin_service::list_exchange_refunds(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/exchange-refunds/{order_id}/approve",
    params(("order_id" = String, Path, description = "External order id")),
    request_body = AdminNoteRequest,
    responses(
        (status = 200, description = "Exchange/refund approved", body = ApiResponse<Order>),
        (status = 400, description = "No pending request"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn approve_exchange_refund(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
    payload: Option<Json<AdminNoteRequest>>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let resp =
        exchange_refund_service::approve_exchange_refund(&state, &user, &order_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/exchange-refunds/{order_id}/reject",
    params(("order_id" = String, Path, description = "External order id")),
    request_body = AdminNoteRequest,
    responses(
        (status = 200, description = "Exchange/refund rejected", body = ApiResponse<Order>),
        (status = 400, description = "No pending request or missing note"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn reject_exchange_refund(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
    payload: Result<Json<AdminNoteRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let Json(payload) = payload?;
    let resp =
        exchange_refund_service::reject_exchange_refund(&state, &user, &order_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/shipping",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("shipping_status" = Option<String>, Query, description = "PENDING, SHIPPING or DELIVERED")
    ),
    responses(
        (status = 200, description = "Paid orders awaiting or in delivery", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_shipping(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<ShippingListQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let Query(query) = query?;
    let resp = admin_service::list_shipping(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/shipping/{order_id}",
    params(("order_id" = String, Path, description = "External order id")),
    request_body = ShippingUpdateRequest,
    responses(
        (status = 200, description = "Shipping status updated", body = ApiResponse<Order>),
        (status = 400, description = "Invalid shipping status or order not PAID"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_shipping(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
    payload: Result<Json<ShippingUpdateRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let Json(payload) = payload?;
    let resp = shipping_service::update_shipping_status(&state, &user, &order_id, payload).await?;
    Ok(Json(resp))
}
