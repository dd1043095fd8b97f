use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set, TransactionTrait};

use crate::{
    dto::{admin::AdminNoteRequest, orders::ExchangeRefundRequest},
    entity::{
        orders::{ActiveModel as OrderActive, Model as OrderModel},
        status::parse_active_enum,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{ExchangeRefundType, Order, OrderStatus, RequestStatus},
    response::{ApiResponse, Meta},
    services::cancellation_service::{clean_note, lock_order},
    state::AppState,
};

pub fn parse_type(raw: &str) -> AppResult<ExchangeRefundType> {
    parse_active_enum::<ExchangeRefundType>(&raw.trim().to_uppercase())
        .ok_or_else(|| AppError::BadRequest(format!("invalid exchange/refund type: {}", raw.trim())))
}

pub fn check_can_request(order: &OrderModel) -> AppResult<()> {
    if order.status != OrderStatus::Paid {
        return Err(AppError::InvalidOrderState(format!(
            "order is {:?}, only PAID orders can be exchanged or refunded",
            order.status
        )));
    }
    if order.exchange_refund_request_status != RequestStatus::None {
        return Err(AppError::InvalidOrderState(format!(
            "exchange/refund already {:?}",
            order.exchange_refund_request_status
        )));
    }
    if order.cancellation_request_status.is_open() {
        return Err(AppError::InvalidOrderState(
            "a cancellation request is in progress".into(),
        ));
    }
    Ok(())
}

pub fn check_pending(order: &OrderModel) -> AppResult<()> {
    if order.exchange_refund_request_status != RequestStatus::Pending {
        return Err(AppError::InvalidOrderState(format!(
            "exchange/refund is {:?}, expected PENDING",
            order.exchange_refund_request_status
        )));
    }
    Ok(())
}

pub async fn request_exchange_refund(
    state: &AppState,
    user: &AuthUser,
    order_id: &str,
    payload: ExchangeRefundRequest,
) -> AppResult<ApiResponse<Order>> {
    let request_type = parse_type(&payload.request_type)?;
    let reason = payload.reason.trim().to_string();
    if reason.is_empty() {
        return Err(AppError::BadRequest("reason is required".into()));
    }

    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, order_id).await?;
    if order.user_id != user.user_id {
        return Err(AppError::NotFound);
    }
    check_can_request(&order)?;

    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.exchange_refund_request_status = Set(RequestStatus::Pending);
    active.exchange_refund_type = Set(Some(request_type));
    active.exchange_refund_reason = Set(Some(reason));
    active.exchange_refund_requested_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(order_id = %order.order_id, kind = ?request_type, "exchange/refund requested");
    Ok(ApiResponse::success(
        "Exchange/refund requested",
        order.into(),
        Some(Meta::empty()),
    ))
}

pub async fn approve_exchange_refund(
    state: &AppState,
    user: &AuthUser,
    order_id: &str,
    payload: AdminNoteRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    process(state, order_id, RequestStatus::Approved, clean_note(payload.note)).await
}

pub async fn reject_exchange_refund(
    state: &AppState,
    user: &AuthUser,
    order_id: &str,
    payload: AdminNoteRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let note = clean_note(payload.note)
        .ok_or_else(|| AppError::BadRequest("a note is required to reject".into()))?;
    process(state, order_id, RequestStatus::Rejected, Some(note)).await
}

async fn process(
    state: &AppState,
    order_id: &str,
    outcome: RequestStatus,
    note: Option<String>,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, order_id).await?;
    check_pending(&order)?;

    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.exchange_refund_request_status = Set(outcome);
    active.exchange_refund_processed_at = Set(Some(now.into()));
    active.exchange_refund_admin_note = Set(note);
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(order_id = %order.order_id, outcome = ?outcome, "exchange/refund processed");
    let message = match outcome {
        RequestStatus::Approved => "Exchange/refund approved",
        _ => "Exchange/refund rejected",
    };
    Ok(ApiResponse::success(message, order.into(), Some(Meta::empty())))
}
