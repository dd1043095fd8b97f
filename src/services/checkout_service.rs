//! Card checkout: stage a priced pre-order, hand the widget what it needs, and
//! materialize the order once the gateway has captured the payment.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    Set, SqlErr, TransactionTrait,
    sea_query::{Expr, SimpleExpr},
};
use uuid::Uuid;

use crate::{
    dto::{
        orders::{CreateOrderRequest, StagedOrderResponse},
        payments::{
            ConfirmQuery, ConfirmResult, FailQuery, FailResult, PaymentRequestBody,
            PaymentRequestData,
        },
    },
    entity::{
        Users,
        orders::{Column as OrderCol, Entity as Orders, Model as OrderModel},
        payments::{
            ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments,
            Model as PaymentModel,
        },
    },
    error::{AppError, AppResult},
    gateway::{ConfirmRequest, ConfirmedPayment, GatewayCall, PROVIDER_TOSS},
    middleware::auth::AuthUser,
    models::{OrderStatus, PaymentStatus},
    payment_log::{self, EVENT_CONFIRM, EVENT_CONFIRM_FAIL, EVENT_CONFIRM_ORPHANED},
    response::{ApiResponse, Meta},
    services::{cart_service, order_service, pricing_service},
    staging::{StagedItem, StagedPreOrder},
    state::AppState,
};

const DEFAULT_CARD_METHOD: &str = "CARD";

pub async fn stage_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<StagedOrderResponse>> {
    let priced = pricing_service::price_order(&state.orm, &payload.items).await?;

    let pre_order = StagedPreOrder {
        owner_user_id: user.user_id,
        items: priced.items,
        total_amount: priced.total_amount,
        shipping_fee: priced.shipping_fee,
        final_amount: priced.final_amount,
        created_at: Utc::now(),
    };
    let key = state.staging.stage(&pre_order).await?;

    tracing::info!(
        user_id = %user.user_id,
        amount = pre_order.final_amount,
        lines = pre_order.items.len(),
        "pre-order staged"
    );

    Ok(ApiResponse::success(
        "Pre-order created",
        StagedOrderResponse {
            success: true,
            pre_order_key: key,
            amount: pre_order.final_amount,
            total_amount: pre_order.total_amount,
            shipping_fee: pre_order.shipping_fee,
            items: pre_order.items,
            expires_in: state.staging.ttl().as_secs(),
        },
        Some(Meta::empty()),
    ))
}

/// Parameters for the client-side gateway widget, for either a durable
/// PENDING order or a staged pre-order.
pub async fn request_payment(
    state: &AppState,
    user: &AuthUser,
    payload: PaymentRequestBody,
) -> AppResult<ApiResponse<PaymentRequestData>> {
    let order_id = payload.order_id.filter(|id| !id.trim().is_empty());
    let pre_order_key = payload.pre_order_key.filter(|key| !key.trim().is_empty());

    let data = match (order_id, pre_order_key) {
        (Some(order_id), _) => {
            let order = order_service::find_owned_order(&state.orm, user.user_id, &order_id).await?;
            if order.status != OrderStatus::Pending {
                return Err(AppError::InvalidOrderState(format!(
                    "order {} is {:?}, expected PENDING",
                    order.order_id, order.status
                )));
            }
            PaymentRequestData {
                success_url: callback_url(state, "success", None),
                fail_url: callback_url(state, "fail", None),
                order_id: order.order_id,
                amount: order.total_amount,
                order_name: order.product_name,
                client_key: state.config.toss.client_key.clone(),
                pre_order_key: None,
            }
        }
        (None, Some(key)) => {
            let pre_order = state
                .staging
                .load(&key)
                .await?
                .ok_or(AppError::StagedOrderExpired)?;
            if pre_order.owner_user_id != user.user_id {
                return Err(AppError::Forbidden);
            }
            PaymentRequestData {
                order_id: pricing_service::generate_order_id(),
                amount: pre_order.final_amount,
                order_name: pricing_service::order_name(&pre_order.items),
                success_url: callback_url(state, "success", Some(&key)),
                fail_url: callback_url(state, "fail", Some(&key)),
                client_key: state.config.toss.client_key.clone(),
                pre_order_key: Some(key),
            }
        }
        (None, None) => {
            return Err(AppError::BadRequest(
                "orderId or preOrderKey is required".into(),
            ));
        }
    };

    Ok(ApiResponse::success(
        "Payment request ready",
        data,
        Some(Meta::empty()),
    ))
}

/// Capture an authorized card payment and materialize its order.
///
/// A payment key that was already applied returns the stored result without
/// touching the gateway again.
pub async fn confirm_payment(
    state: &AppState,
    query: ConfirmQuery,
) -> AppResult<ApiResponse<ConfirmResult>> {
    if let Some(existing) = find_payment(state, &query.payment_key).await? {
        tracing::info!(payment_key = %query.payment_key, "confirm replayed");
        return replay_result(state, existing).await;
    }

    let pre_order_key = query
        .pre_order_key
        .clone()
        .filter(|key| !key.trim().is_empty());

    match pre_order_key {
        Some(key) => confirm_staged(state, &query, &key).await,
        None => confirm_pending_order(state, &query).await,
    }
}

async fn confirm_staged(
    state: &AppState,
    query: &ConfirmQuery,
    key: &str,
) -> AppResult<ApiResponse<ConfirmResult>> {
    let pre_order = state
        .staging
        .load(key)
        .await?
        .ok_or(AppError::StagedOrderExpired)?;
    ensure_amount(pre_order.final_amount, query.amount)?;

    let owner = Users::find_by_id(pre_order.owner_user_id)
        .one(&state.orm)
        .await?;
    if owner.is_none() {
        return Err(AppError::Unauthorized(
            "pre-order owner no longer exists".into(),
        ));
    }

    let call = call_confirm(state, query).await?;
    let confirmed = confirmed_payment(&call, query);

    match settle_staged(state, query, key, &call, &confirmed).await {
        Ok(payment) => {
            if let Err(err) = state.staging.purge(key).await {
                tracing::warn!(error = %err, "failed to purge pre-order after confirm");
            }
            tracing::info!(
                order_id = %query.order_id,
                payment_key = %payment.payment_key,
                amount = payment.amount,
                "order materialized"
            );
            Ok(confirm_response(query.order_id.clone(), payment, false))
        }
        Err(AppError::OrmError(err)) if is_unique_violation(&err) => {
            tracing::info!(payment_key = %query.payment_key, "concurrent confirm already applied");
            replay_after_conflict(state, query, &call, err).await
        }
        Err(err) => {
            record_orphaned_capture(state, query, &call, &err).await;
            Err(err)
        }
    }
}

/// Everything after a successful capture: the stage is read again since it
/// may have lapsed while the gateway was working.
async fn settle_staged(
    state: &AppState,
    query: &ConfirmQuery,
    key: &str,
    call: &GatewayCall,
    confirmed: &ConfirmedPayment,
) -> AppResult<PaymentModel> {
    let pre_order = state
        .staging
        .load(key)
        .await?
        .ok_or(AppError::StagedOrderExpired)?;
    ensure_amount(pre_order.final_amount, query.amount)?;
    materialize_staged(state, query, &pre_order, call, confirmed).await
}

async fn materialize_staged(
    state: &AppState,
    query: &ConfirmQuery,
    pre_order: &StagedPreOrder,
    call: &GatewayCall,
    confirmed: &ConfirmedPayment,
) -> AppResult<PaymentModel> {
    let txn = state.orm.begin().await?;

    let priced = pricing_service::PricedOrder {
        items: pre_order.items.clone(),
        total_amount: pre_order.total_amount,
        shipping_fee: pre_order.shipping_fee,
        final_amount: pre_order.final_amount,
    };
    let (order, _) = order_service::insert_order(
        &txn,
        pre_order.owner_user_id,
        query.order_id.clone(),
        &priced,
        OrderStatus::Paid,
    )
    .await?;

    let payment = insert_approved_payment(&txn, &order, query, call, confirmed).await?;
    payment_log::log_gateway_call(&txn, Some(payment.id), EVENT_CONFIRM, call).await?;
    consume_cart(&txn, pre_order.owner_user_id, &pre_order.items).await?;

    txn.commit().await?;
    Ok(payment)
}

/// Card payment for an order that already exists, e.g. a bank-transfer order
/// the customer decided to pay by card instead.
async fn confirm_pending_order(
    state: &AppState,
    query: &ConfirmQuery,
) -> AppResult<ApiResponse<ConfirmResult>> {
    let order = Orders::find()
        .filter(OrderCol::OrderId.eq(query.order_id.as_str()))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if order.status != OrderStatus::Pending {
        return Err(AppError::InvalidOrderState(format!(
            "order {} is {:?}, expected PENDING",
            order.order_id, order.status
        )));
    }
    ensure_amount(order.total_amount, query.amount)?;

    let call = call_confirm(state, query).await?;
    let confirmed = confirmed_payment(&call, query);

    match apply_pending_payment(state, &order, query, &call, &confirmed).await {
        Ok(payment) => {
            tracing::info!(order_id = %order.order_id, payment_key = %payment.payment_key, "pending order paid");
            Ok(confirm_response(order.order_id, payment, false))
        }
        Err(AppError::OrmError(err)) if is_unique_violation(&err) => {
            replay_after_conflict(state, query, &call, err).await
        }
        Err(err) => {
            record_orphaned_capture(state, query, &call, &err).await;
            Err(err)
        }
    }
}

async fn apply_pending_payment(
    state: &AppState,
    order: &OrderModel,
    query: &ConfirmQuery,
    call: &GatewayCall,
    confirmed: &ConfirmedPayment,
) -> AppResult<PaymentModel> {
    let txn = state.orm.begin().await?;

    let updated = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(OrderStatus::Paid))
        .col_expr(OrderCol::UpdatedAt, now_value(Utc::now()))
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(order.id))
                .add(OrderCol::Status.eq(OrderStatus::Pending)),
        )
        .exec(&txn)
        .await?;
    if updated.rows_affected == 0 {
        return Err(AppError::InvalidOrderState(format!(
            "order {} is no longer PENDING",
            order.order_id
        )));
    }

    // A bank-transfer account still open for this order must not settle it a second time.
    let closed = Payments::update_many()
        .col_expr(PaymentCol::Status, Expr::value(PaymentStatus::Cancelled))
        .col_expr(PaymentCol::UpdatedAt, now_value(Utc::now()))
        .filter(
            Condition::all()
                .add(PaymentCol::OrderId.eq(order.id))
                .add(PaymentCol::Status.eq(PaymentStatus::WaitingForDeposit)),
        )
        .exec(&txn)
        .await?;
    if closed.rows_affected > 0 {
        tracing::info!(
            order_id = %order.order_id,
            closed = closed.rows_affected,
            "open virtual account closed by card payment"
        );
    }

    let payment = insert_approved_payment(&txn, order, query, call, confirmed).await?;
    payment_log::log_gateway_call(&txn, Some(payment.id), EVENT_CONFIRM, call).await?;

    txn.commit().await?;
    Ok(payment)
}

/// Gateway failure callback: the pre-order is dropped immediately.
pub async fn fail_payment(state: &AppState, query: FailQuery) -> AppResult<ApiResponse<FailResult>> {
    if let Some(key) = query.pre_order_key.as_deref().filter(|key| !key.is_empty()) {
        state.staging.purge(key).await?;
    }

    tracing::info!(
        order_id = query.order_id.as_deref().unwrap_or("-"),
        code = query.code.as_deref().unwrap_or("-"),
        "payment failed at gateway"
    );

    let message = query
        .message
        .clone()
        .unwrap_or_else(|| "Payment failed".to_string());
    Ok(ApiResponse::failure(
        message,
        FailResult {
            success: false,
            code: query.code,
            message: query.message,
            order_id: query.order_id,
        },
    ))
}

async fn call_confirm(state: &AppState, query: &ConfirmQuery) -> AppResult<GatewayCall> {
    let request = ConfirmRequest {
        payment_key: query.payment_key.clone(),
        order_id: query.order_id.clone(),
        amount: query.amount,
    };
    let call = state.gateway.confirm(&request).await;
    if call.is_success() {
        return Ok(call);
    }

    let reason = call.failure_message();
    tracing::warn!(
        order_id = %query.order_id,
        payment_key = %query.payment_key,
        status = ?call.status_code,
        reason = %reason,
        "payment confirm rejected"
    );
    if let Err(err) = payment_log::log_gateway_call(&state.orm, None, EVENT_CONFIRM_FAIL, &call).await
    {
        tracing::warn!(error = %err, "payment log failed");
    }
    Err(AppError::GatewayConfirm(reason))
}

fn confirmed_payment(call: &GatewayCall, query: &ConfirmQuery) -> ConfirmedPayment {
    call.parse().unwrap_or_else(|| {
        tracing::warn!(
            payment_key = %query.payment_key,
            status = ?call.status_code,
            "confirm response could not be parsed; method and receipt defaulted"
        );
        ConfirmedPayment::default()
    })
}

/// The capture succeeded at the gateway but nothing was recorded locally.
async fn record_orphaned_capture(
    state: &AppState,
    query: &ConfirmQuery,
    call: &GatewayCall,
    cause: &AppError,
) {
    tracing::error!(
        order_id = %query.order_id,
        payment_key = %query.payment_key,
        amount = query.amount,
        error = %cause,
        "payment captured but order not recorded"
    );
    if let Err(err) =
        payment_log::log_gateway_call(&state.orm, None, EVENT_CONFIRM_ORPHANED, call).await
    {
        tracing::warn!(error = %err, "payment log failed");
    }
}

/// A concurrent confirm committed first; its transaction rolled ours back,
/// including our log row, so this call is logged against the winner.
async fn replay_after_conflict(
    state: &AppState,
    query: &ConfirmQuery,
    call: &GatewayCall,
    err: DbErr,
) -> AppResult<ApiResponse<ConfirmResult>> {
    let Some(existing) = find_payment(state, &query.payment_key).await? else {
        return Err(AppError::OrmError(err));
    };
    if let Err(err) =
        payment_log::log_gateway_call(&state.orm, Some(existing.id), EVENT_CONFIRM, call).await
    {
        tracing::warn!(error = %err, "payment log failed");
    }
    replay_result(state, existing).await
}

async fn insert_approved_payment<C: ConnectionTrait>(
    conn: &C,
    order: &OrderModel,
    query: &ConfirmQuery,
    call: &GatewayCall,
    confirmed: &ConfirmedPayment,
) -> AppResult<PaymentModel> {
    let now = Utc::now();
    let payment = PaymentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        provider: Set(PROVIDER_TOSS.to_string()),
        method: Set(confirmed
            .method
            .clone()
            .unwrap_or_else(|| DEFAULT_CARD_METHOD.to_string())),
        payment_key: Set(query.payment_key.clone()),
        amount: Set(query.amount),
        status: Set(PaymentStatus::Approved),
        approved_at: Set(Some(now.into())),
        receipt_url: Set(confirmed.receipt.as_ref().and_then(|r| r.url.clone())),
        raw_response: Set(call.response_payload.clone()),
        bank_name: Set(None),
        account_number: Set(None),
        account_holder: Set(None),
        due_date: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(conn)
    .await?;
    Ok(payment)
}

async fn consume_cart<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    items: &[StagedItem],
) -> AppResult<()> {
    let touched = cart_service::consume_purchased(conn, user_id, items).await?;
    tracing::debug!(user_id = %user_id, lines = touched, "cart lines consumed");
    Ok(())
}

async fn find_payment(state: &AppState, payment_key: &str) -> AppResult<Option<PaymentModel>> {
    Ok(Payments::find()
        .filter(PaymentCol::PaymentKey.eq(payment_key))
        .one(&state.orm)
        .await?)
}

async fn replay_result(
    state: &AppState,
    payment: PaymentModel,
) -> AppResult<ApiResponse<ConfirmResult>> {
    let order = Orders::find_by_id(payment.order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(confirm_response(order.order_id, payment, true))
}

fn confirm_response(order_id: String, payment: PaymentModel, replayed: bool) -> ApiResponse<ConfirmResult> {
    ApiResponse::success(
        "Payment confirmed",
        ConfirmResult {
            success: true,
            order_id,
            payment_key: payment.payment_key,
            amount: payment.amount,
            method: payment.method,
            receipt_url: payment.receipt_url,
            approved_at: payment.approved_at.map(|dt| dt.with_timezone(&Utc)),
            replayed,
        },
        Some(Meta::empty()),
    )
}

fn ensure_amount(expected: i64, claimed: i64) -> AppResult<()> {
    if expected != claimed {
        return Err(AppError::AmountMismatch { expected, claimed });
    }
    Ok(())
}

fn callback_url(state: &AppState, outcome: &str, pre_order_key: Option<&str>) -> String {
    let base = format!(
        "{}/api/payments/toss/{outcome}",
        state.config.public_base_url
    );
    match pre_order_key {
        Some(key) => format!("{base}?preOrderKey={key}"),
        None => base,
    }
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

pub(crate) fn now_value(now: DateTime<Utc>) -> SimpleExpr {
    let value: sea_orm::prelude::DateTimeWithTimeZone = now.into();
    Expr::value(value)
}
