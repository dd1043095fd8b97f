use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    entity::payment_logs::ActiveModel as PaymentLogActive,
    error::AppResult,
    gateway::{GatewayCall, PROVIDER_TOSS},
};

pub const EVENT_CONFIRM: &str = "CONFIRM";
pub const EVENT_CONFIRM_FAIL: &str = "CONFIRM_FAIL";
pub const EVENT_VIRTUAL_ACCOUNT: &str = "VIRTUAL_ACCOUNT";
pub const EVENT_VIRTUAL_ACCOUNT_FAIL: &str = "VIRTUAL_ACCOUNT_FAIL";
pub const EVENT_DEPOSIT_WEBHOOK: &str = "DEPOSIT_WEBHOOK";
/// Gateway captured the payment but no order could be recorded for it.
pub const EVENT_CONFIRM_ORPHANED: &str = "CONFIRM_ORPHANED";
/// Deposit reported for a payment or order that can no longer take it.
pub const EVENT_DEPOSIT_ORPHANED: &str = "DEPOSIT_ORPHANED";

/// Append one gateway exchange to `payment_logs`.
///
/// Works on a plain connection or inside a transaction.
pub async fn log_gateway_call<C: ConnectionTrait>(
    conn: &C,
    payment_id: Option<Uuid>,
    event_type: &str,
    call: &GatewayCall,
) -> AppResult<()> {
    PaymentLogActive {
        id: Set(Uuid::new_v4()),
        payment_id: Set(payment_id),
        provider: Set(PROVIDER_TOSS.to_string()),
        event_type: Set(event_type.to_string()),
        request_url: Set(Some(call.request_url.clone())),
        request_payload: Set(call.request_payload.clone()),
        response_payload: Set(call.response_payload.clone()),
        status_code: Set(call.status_code.map(i32::from)),
        response_time_ms: Set(Some(call.latency.as_millis() as i64)),
        error_message: Set(call.error.clone()),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;

    Ok(())
}

/// Inbound notifications have no outbound URL or latency; only the payload is kept.
pub async fn log_inbound<C: ConnectionTrait>(
    conn: &C,
    payment_id: Option<Uuid>,
    event_type: &str,
    payload: Value,
) -> AppResult<()> {
    PaymentLogActive {
        id: Set(Uuid::new_v4()),
        payment_id: Set(payment_id),
        provider: Set(PROVIDER_TOSS.to_string()),
        event_type: Set(event_type.to_string()),
        request_url: Set(None),
        request_payload: Set(payload),
        response_payload: Set(None),
        status_code: Set(None),
        response_time_ms: Set(None),
        error_message: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;

    Ok(())
}
