use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};

use crate::{
    dto::{admin::AdminNoteRequest, orders::CancellationRequest},
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        status::parse_active_enum,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{CancellationReason, Order, OrderStatus, RequestStatus},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn parse_reason(raw: &str) -> AppResult<CancellationReason> {
    parse_active_enum::<CancellationReason>(&raw.trim().to_uppercase())
        .ok_or_else(|| AppError::InvalidCancellationReason(raw.trim().to_string()))
}

pub fn check_can_request(order: &OrderModel) -> AppResult<()> {
    if order.status == OrderStatus::Cancelled {
        return Err(AppError::InvalidOrderState("order is already cancelled".into()));
    }
    if order.cancellation_request_status != RequestStatus::None {
        return Err(AppError::InvalidOrderState(format!(
            "cancellation already {:?}",
            order.cancellation_request_status
        )));
    }
    if order.exchange_refund_request_status.is_open() {
        return Err(AppError::InvalidOrderState(
            "an exchange/refund request is in progress".into(),
        ));
    }
    Ok(())
}

pub fn check_pending(order: &OrderModel) -> AppResult<()> {
    if order.cancellation_request_status != RequestStatus::Pending {
        return Err(AppError::InvalidOrderState(format!(
            "cancellation is {:?}, expected PENDING",
            order.cancellation_request_status
        )));
    }
    Ok(())
}

pub async fn request_cancellation(
    state: &AppState,
    user: &AuthUser,
    order_id: &str,
    payload: CancellationRequest,
) -> AppResult<ApiResponse<Order>> {
    let reason = parse_reason(&payload.reason)?;

    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, order_id).await?;
    if order.user_id != user.user_id {
        return Err(AppError::NotFound);
    }
    check_can_request(&order)?;

    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.cancellation_request_status = Set(RequestStatus::Pending);
    active.cancellation_reason = Set(Some(reason));
    active.cancellation_requested_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(order_id = %order.order_id, reason = ?reason, "cancellation requested");
    Ok(ApiResponse::success(
        "Cancellation requested",
        order.into(),
        Some(Meta::empty()),
    ))
}

/// Approving a cancellation also cancels the order.
pub async fn approve_cancellation(
    state: &AppState,
    user: &AuthUser,
    order_id: &str,
    payload: AdminNoteRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, order_id).await?;
    check_pending(&order)?;

    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.cancellation_request_status = Set(RequestStatus::Approved);
    active.status = Set(OrderStatus::Cancelled);
    active.cancellation_processed_at = Set(Some(now.into()));
    active.cancellation_admin_note = Set(clean_note(payload.note));
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(order_id = %order.order_id, admin_id = %user.user_id, "cancellation approved");
    Ok(ApiResponse::success(
        "Cancellation approved",
        order.into(),
        Some(Meta::empty()),
    ))
}

pub async fn reject_cancellation(
    state: &AppState,
    user: &AuthUser,
    order_id: &str,
    payload: AdminNoteRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let note = clean_note(payload.note)
        .ok_or_else(|| AppError::BadRequest("a note is required to reject".into()))?;

    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, order_id).await?;
    check_pending(&order)?;

    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.cancellation_request_status = Set(RequestStatus::Rejected);
    active.cancellation_processed_at = Set(Some(now.into()));
    active.cancellation_admin_note = Set(Some(note));
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(order_id = %order.order_id, admin_id = %user.user_id, "cancellation rejected");
    Ok(ApiResponse::success(
        "Cancellation rejected",
        order.into(),
        Some(Meta::empty()),
    ))
}

/// Row-locked read for a read-modify-write transition.
pub(crate) async fn lock_order<C: ConnectionTrait>(conn: &C, order_id: &str) -> AppResult<OrderModel> {
    Orders::find()
        .filter(OrderCol::OrderId.eq(order_id))
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

/// Blank notes are treated as absent.
pub(crate) fn clean_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}
