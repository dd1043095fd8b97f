//! Payment gateway seam.
//!
//! Every outbound call yields a [`GatewayCall`] whether it succeeded or not, so
//! callers can always write the exchange to the payment log before deciding
//! what to do with it.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

mod toss;

pub use self::toss::TossClient;

pub const PROVIDER_TOSS: &str = "toss";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("TOSS_SECRET_KEY is empty")]
    MissingSecretKey,
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Capture a card payment the customer already authorized.
    async fn confirm(&self, request: &ConfirmRequest) -> GatewayCall;

    /// Ask the gateway to issue a deposit account for a pending order.
    async fn issue_virtual_account(&self, request: &VirtualAccountRequest) -> GatewayCall;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub payment_key: String,
    pub order_id: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualAccountRequest {
    pub method: &'static str,
    pub amount: i64,
    pub order_id: String,
    pub order_name: String,
    pub customer_name: String,
    pub bank: String,
    pub valid_hours: u32,
    pub success_url: String,
    pub fail_url: String,
}

impl VirtualAccountRequest {
    pub const METHOD: &'static str = "VIRTUAL_ACCOUNT";
    pub const VALID_HOURS: u32 = 24;
}

/// One request/response exchange with the gateway.
#[derive(Debug, Clone)]
pub struct GatewayCall {
    pub request_url: String,
    pub request_payload: Value,
    pub status_code: Option<u16>,
    pub response_payload: Option<Value>,
    pub latency: Duration,
    pub error: Option<String>,
}

impl GatewayCall {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.status_code == Some(200)
    }

    /// Best human-readable reason for a failed call.
    pub fn failure_message(&self) -> String {
        if let Some(error) = &self.error {
            return error.clone();
        }
        self.response_payload
            .as_ref()
            .and_then(|body| body.get("message"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| match self.status_code {
                Some(code) => format!("gateway responded with status {code}"),
                None => "gateway did not respond".to_string(),
            })
    }

    pub fn parse<T: DeserializeOwned>(&self) -> Option<T> {
        self.response_payload
            .clone()
            .and_then(|body| serde_json::from_value(body).ok())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedPayment {
    pub method: Option<String>,
    pub status: Option<String>,
    pub receipt: Option<Receipt>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Receipt {
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedVirtualAccount {
    pub payment_key: Option<String>,
    pub virtual_account: Option<VirtualAccountInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualAccountInfo {
    pub account_number: Option<String>,
    pub bank: Option<String>,
    pub bank_code: Option<String>,
    pub customer_name: Option<String>,
    pub due_date: Option<String>,
}
