use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestBody {
    pub order_id: Option<String>,
    pub pre_order_key: Option<String>,
}

/// Everything the client-side payment widget needs to open the gateway window.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestData {
    pub order_id: String,
    pub amount: i64,
    pub order_name: String,
    pub success_url: String,
    pub fail_url: String,
    pub client_key: Option<String>,
    pub pre_order_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ConfirmQuery {
    pub payment_key: String,
    pub order_id: String,
    pub amount: i64,
    pub pre_order_key: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResult {
    pub success: bool,
    pub order_id: String,
    pub payment_key: String,
    pub amount: i64,
    pub method: String,
    pub receipt_url: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    /// True when this payment key had already been applied.
    pub replayed: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FailQuery {
    pub code: Option<String>,
    pub message: Option<String>,
    pub order_id: Option<String>,
    pub pre_order_key: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FailResult {
    pub success: bool,
    pub code: Option<String>,
    pub message: Option<String>,
    pub order_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VirtualAccountRequestBody {
    pub order_id: String,
    pub customer_name: String,
    pub bank: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VirtualAccountResult {
    pub success: bool,
    pub order_id: String,
    pub payment_key: String,
    pub amount: i64,
    pub bank: Option<String>,
    pub account_number: Option<String>,
    pub account_holder: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepositWebhook {
    pub payment_key: String,
    pub order_id: String,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub success: bool,
    /// False for non-terminal statuses and re-deliveries.
    pub applied: bool,
}
