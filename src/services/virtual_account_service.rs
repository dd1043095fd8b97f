//! Bank-transfer checkout: the order exists before any money moves, a virtual
//! account is issued for it, and the deposit webhook settles it.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set, TransactionTrait,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    dto::{
        orders::{CreateOrderRequest, VirtualOrderResponse},
        payments::{DepositWebhook, VirtualAccountRequestBody, VirtualAccountResult, WebhookAck},
    },
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        payments::{ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments},
    },
    error::{AppError, AppResult},
    gateway::{GatewayCall, IssuedVirtualAccount, PROVIDER_TOSS, VirtualAccountRequest},
    middleware::auth::AuthUser,
    models::{OrderStatus, PaymentStatus},
    payment_log::{
        self, EVENT_DEPOSIT_ORPHANED, EVENT_DEPOSIT_WEBHOOK, EVENT_VIRTUAL_ACCOUNT,
        EVENT_VIRTUAL_ACCOUNT_FAIL,
    },
    response::{ApiResponse, Meta},
    services::{cart_service, checkout_service::now_value, order_service, pricing_service},
    state::AppState,
};

/// Banks the gateway can open deposit accounts at.
pub const ALLOWED_BANKS: [&str; 16] = [
    "KOOKMIN", "SHINHAN", "WOORI", "HANA", "NH", "IBK", "SC", "SUHYUP", "DAEGU", "BUSAN",
    "KYONGNAM", "GWANGJU", "JEONBUK", "JEJU", "KAKAO", "TOSSBANK",
];

/// Webhook status that means the deposit arrived.
pub const DEPOSIT_DONE: &str = "DONE";

pub fn normalize_bank_code(raw: &str) -> AppResult<String> {
    let code = raw.trim().to_uppercase();
    if ALLOWED_BANKS.contains(&code.as_str()) {
        Ok(code)
    } else {
        Err(AppError::InvalidBankCode(raw.trim().to_string()))
    }
}

pub fn digits_only(account_number: &str) -> String {
    account_number.chars().filter(char::is_ascii_digit).collect()
}

pub async fn create_virtual_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<VirtualOrderResponse>> {
    let priced = pricing_service::price_order(&state.orm, &payload.items).await?;
    let order_id = pricing_service::generate_order_id();

    let txn = state.orm.begin().await?;
    let (order, _) = order_service::insert_order(
        &txn,
        user.user_id,
        order_id,
        &priced,
        OrderStatus::Pending,
    )
    .await?;
    cart_service::consume_purchased(&txn, user.user_id, &priced.items).await?;
    txn.commit().await?;

    tracing::info!(
        order_id = %order.order_id,
        user_id = %user.user_id,
        amount = order.total_amount,
        "bank-transfer order created"
    );

    Ok(ApiResponse::success(
        "Order created",
        VirtualOrderResponse {
            success: true,
            order_id: order.order_id,
            total_amount: order.total_amount,
            status: order.status,
        },
        Some(Meta::empty()),
    ))
}

pub async fn request_virtual_account(
    state: &AppState,
    user: &AuthUser,
    payload: VirtualAccountRequestBody,
) -> AppResult<ApiResponse<VirtualAccountResult>> {
    let bank = normalize_bank_code(&payload.bank)?;
    let customer_name = payload.customer_name.trim().to_string();
    if customer_name.is_empty() {
        return Err(AppError::BadRequest("customerName is required".into()));
    }

    let order = order_service::find_owned_order(&state.orm, user.user_id, &payload.order_id).await?;
    if order.status != OrderStatus::Pending {
        return Err(AppError::InvalidOrderState(format!(
            "order {} is {:?}, expected PENDING",
            order.order_id, order.status
        )));
    }

    let waiting = Payments::find()
        .filter(
            Condition::all()
                .add(PaymentCol::OrderId.eq(order.id))
                .add(PaymentCol::Status.eq(PaymentStatus::WaitingForDeposit)),
        )
        .one(&state.orm)
        .await?;
    if waiting.is_some() {
        return Err(AppError::InvalidOrderState(format!(
            "a virtual account is already open for order {}",
            order.order_id
        )));
    }

    let request = VirtualAccountRequest {
        method: VirtualAccountRequest::METHOD,
        amount: order.total_amount,
        order_id: order.order_id.clone(),
        order_name: order.product_name.clone(),
        customer_name: customer_name.clone(),
        bank: bank.clone(),
        valid_hours: VirtualAccountRequest::VALID_HOURS,
        success_url: format!("{}/api/payments/toss/success", state.config.public_base_url),
        fail_url: format!("{}/api/payments/toss/fail", state.config.public_base_url),
    };
    let call = state.gateway.issue_virtual_account(&request).await;

    let issued: Option<IssuedVirtualAccount> = if call.is_success() {
        call.parse()
    } else {
        None
    };
    let Some((payment_key, issued)) =
        issued.and_then(|issued| issued.payment_key.clone().map(|key| (key, issued)))
    else {
        return Err(issuance_failed(state, &order.order_id, &call).await);
    };

    let account = issued.virtual_account.unwrap_or_default();
    let due_date = account
        .due_date
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok());
    let now = Utc::now();

    let txn = state.orm.begin().await?;
    let payment = PaymentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        provider: Set(PROVIDER_TOSS.to_string()),
        method: Set(VirtualAccountRequest::METHOD.to_string()),
        payment_key: Set(payment_key),
        amount: Set(order.total_amount),
        status: Set(PaymentStatus::WaitingForDeposit),
        approved_at: Set(None),
        receipt_url: Set(None),
        raw_response: Set(call.response_payload.clone()),
        bank_name: Set(Some(account.bank.clone().unwrap_or_else(|| bank.clone()))),
        account_number: Set(account.account_number.as_deref().map(digits_only)),
        account_holder: Set(Some(
            account.customer_name.clone().unwrap_or(customer_name),
        )),
        due_date: Set(due_date),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;
    payment_log::log_gateway_call(&txn, Some(payment.id), EVENT_VIRTUAL_ACCOUNT, &call).await?;
    txn.commit().await?;

    tracing::info!(
        order_id = %order.order_id,
        payment_key = %payment.payment_key,
        bank = %bank,
        "virtual account issued"
    );

    Ok(ApiResponse::success(
        "Virtual account issued",
        VirtualAccountResult {
            success: true,
            order_id: order.order_id,
            payment_key: payment.payment_key,
            amount: payment.amount,
            bank: payment.bank_name,
            account_number: payment.account_number,
            account_holder: payment.account_holder,
            due_date: payment.due_date.map(|dt| dt.with_timezone(&Utc)),
        },
        Some(Meta::empty()),
    ))
}

async fn issuance_failed(state: &AppState, order_id: &str, call: &GatewayCall) -> AppError {
    let reason = if call.is_success() {
        "gateway response has no paymentKey".to_string()
    } else {
        call.failure_message()
    };
    tracing::warn!(
        order_id = %order_id,
        status = ?call.status_code,
        reason = %reason,
        "virtual account issuance failed"
    );
    if let Err(err) =
        payment_log::log_gateway_call(&state.orm, None, EVENT_VIRTUAL_ACCOUNT_FAIL, call).await
    {
        tracing::warn!(error = %err, "payment log failed");
    }
    AppError::GatewayConfirm(reason)
}

/// Deposit notification from the gateway.
///
/// Re-deliveries of `DONE` and any other status are acknowledged without a change.
/// A deposit for a closed account or an order that left PENDING is logged as
/// orphaned and leaves both rows untouched.
pub async fn handle_deposit_webhook(
    state: &AppState,
    payload: DepositWebhook,
) -> AppResult<ApiResponse<WebhookAck>> {
    let payment = Payments::find()
        .filter(PaymentCol::PaymentKey.eq(payload.payment_key.as_str()))
        .one(&state.orm)
        .await?
        .ok_or(AppError::UnknownPaymentKey)?;

    let order = Orders::find_by_id(payment.order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if order.order_id != payload.order_id {
        return Err(AppError::BadRequest(format!(
            "orderId {} does not match payment",
            payload.order_id
        )));
    }

    if payload.status != DEPOSIT_DONE {
        tracing::info!(
            payment_key = %payload.payment_key,
            status = %payload.status,
            "deposit webhook acknowledged without change"
        );
        return Ok(ack(false));
    }

    if payment.status == PaymentStatus::Approved {
        tracing::info!(payment_key = %payload.payment_key, "deposit already applied");
        return Ok(ack(false));
    }

    let raw = serde_json::to_value(&payload).map_err(anyhow::Error::from)?;
    if payment.status != PaymentStatus::WaitingForDeposit {
        return orphaned_deposit(state, payment.id, raw, "payment is no longer awaiting a deposit")
            .await;
    }

    let now = Utc::now();
    let txn = state.orm.begin().await?;
    let approved = Payments::update_many()
        .col_expr(PaymentCol::Status, Expr::value(PaymentStatus::Approved))
        .col_expr(PaymentCol::ApprovedAt, now_value(now))
        .col_expr(PaymentCol::RawResponse, Expr::value(raw.clone()))
        .col_expr(PaymentCol::UpdatedAt, now_value(now))
        .filter(
            Condition::all()
                .add(PaymentCol::Id.eq(payment.id))
                .add(PaymentCol::Status.eq(PaymentStatus::WaitingForDeposit)),
        )
        .exec(&txn)
        .await?;

    if approved.rows_affected == 0 {
        txn.rollback().await?;
        tracing::info!(payment_key = %payload.payment_key, "deposit applied by a concurrent delivery");
        return Ok(ack(false));
    }

    let paid = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(OrderStatus::Paid))
        .col_expr(OrderCol::UpdatedAt, now_value(now))
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(order.id))
                .add(OrderCol::Status.eq(OrderStatus::Pending)),
        )
        .exec(&txn)
        .await?;
    if paid.rows_affected == 0 {
        txn.rollback().await?;
        return orphaned_deposit(state, payment.id, raw, "order is no longer PENDING").await;
    }

    payment_log::log_inbound(&txn, Some(payment.id), EVENT_DEPOSIT_WEBHOOK, raw).await?;
    txn.commit().await?;

    tracing::info!(
        order_id = %order.order_id,
        payment_key = %payload.payment_key,
        "deposit confirmed"
    );
    Ok(ack(true))
}

/// A deposit arrived that can no longer settle anything. Payment and order
/// stay as they are; the notification is kept for manual refund.
async fn orphaned_deposit(
    state: &AppState,
    payment_id: Uuid,
    raw: serde_json::Value,
    reason: &str,
) -> AppResult<ApiResponse<WebhookAck>> {
    tracing::warn!(payment_id = %payment_id, reason, "deposit not applied");
    payment_log::log_inbound(&state.orm, Some(payment_id), EVENT_DEPOSIT_ORPHANED, raw).await?;
    Ok(ack(false))
}

fn ack(applied: bool) -> ApiResponse<WebhookAck> {
    ApiResponse::success(
        "Webhook received",
        WebhookAck {
            success: true,
            applied,
        },
        Some(Meta::empty()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_codes_are_normalized_and_checked() {
        assert_eq!(normalize_bank_code(" shinhan ").unwrap(), "SHINHAN");
        assert_eq!(normalize_bank_code("TOSSBANK").unwrap(), "TOSSBANK");
        assert!(matches!(
            normalize_bank_code("CITI"),
            Err(AppError::InvalidBankCode(code)) if code == "CITI"
        ));
        assert!(normalize_bank_code("").is_err());
    }

    #[test]
    fn account_numbers_keep_digits_only() {
        assert_eq!(digits_only("X6105-1234 5678"), "610512345678");
        assert_eq!(digits_only("---"), "");
    }
}
