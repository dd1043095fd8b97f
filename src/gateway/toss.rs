use std::time::Instant;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use serde_json::{Value, json};

use super::{ConfirmRequest, GatewayCall, GatewayError, PaymentGateway, VirtualAccountRequest};
use crate::config::TossConfig;

/// Status recorded when the gateway could not be reached at all.
const STATUS_UNREACHABLE: u16 = 503;
/// Status recorded when the gateway did not answer within the client timeout.
const STATUS_TIMEOUT: u16 = 504;

/// Toss Payments REST client.
#[derive(Clone)]
pub struct TossClient {
    http: reqwest::Client,
    api_base: String,
    authorization: String,
}

impl TossClient {
    pub fn new(config: &TossConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            authorization: authorization_header(&config.secret_key)?,
        })
    }

    async fn post<T: Serialize>(&self, path: &str, payload: &T) -> GatewayCall {
        let url = format!("{}{}", self.api_base, path);
        let request_payload = serde_json::to_value(payload).unwrap_or(Value::Null);
        let started = Instant::now();

        let result = self
            .http
            .post(&url)
            .header(AUTHORIZATION, &self.authorization)
            .json(&request_payload)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                let status = if err.is_timeout() {
                    STATUS_TIMEOUT
                } else {
                    STATUS_UNREACHABLE
                };
                tracing::warn!(url = %url, error = %err, "toss request failed");
                return GatewayCall {
                    request_url: url,
                    request_payload,
                    status_code: Some(status),
                    response_payload: Some(json!({ "error": err.to_string() })),
                    latency: started.elapsed(),
                    error: Some(format!("payment gateway request failed: {err}")),
                };
            }
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                return GatewayCall {
                    request_url: url,
                    request_payload,
                    status_code: Some(status),
                    response_payload: None,
                    latency: started.elapsed(),
                    error: Some(format!("failed to read gateway response: {err}")),
                };
            }
        };
        let latency = started.elapsed();

        match serde_json::from_str::<Value>(&text) {
            Ok(body) => {
                tracing::debug!(url = %url, status, ms = %latency.as_millis(), "toss responded");
                GatewayCall {
                    request_url: url,
                    request_payload,
                    status_code: Some(status),
                    response_payload: Some(body),
                    latency,
                    error: None,
                }
            }
            Err(_) => {
                let excerpt: String = text.chars().take(200).collect();
                GatewayCall {
                    request_url: url,
                    request_payload,
                    status_code: Some(status),
                    response_payload: Some(json!({ "raw": excerpt })),
                    latency,
                    error: Some("gateway response is not JSON".to_string()),
                }
            }
        }
    }
}

#[async_trait]
impl PaymentGateway for TossClient {
    async fn confirm(&self, request: &ConfirmRequest) -> GatewayCall {
        self.post("/payments/confirm", request).await
    }

    async fn issue_virtual_account(&self, request: &VirtualAccountRequest) -> GatewayCall {
        self.post("/virtual-accounts", request).await
    }
}

/// Toss authenticates with HTTP basic auth: the secret key as user, empty password.
pub fn authorization_header(secret_key: &str) -> Result<String, GatewayError> {
    if secret_key.trim().is_empty() {
        return Err(GatewayError::MissingSecretKey);
    }
    Ok(format!("Basic {}", BASE64.encode(format!("{secret_key}:"))))
}
