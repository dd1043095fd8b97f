use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::{Order, OrderItem, OrderStatus, Payment},
    staging::StagedItem,
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub color_id: Option<Uuid>,
    pub size_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StagedOrderResponse {
    pub success: bool,
    pub pre_order_key: String,
    /// Amount to charge: items plus shipping.
    pub amount: i64,
    pub total_amount: i64,
    pub shipping_fee: i64,
    pub items: Vec<StagedItem>,
    /// Seconds until the pre-order expires.
    pub expires_in: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VirtualOrderResponse {
    pub success: bool,
    pub order_id: String,
    pub total_amount: i64,
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancellationRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExchangeRefundRequest {
    #[serde(rename = "type")]
    pub request_type: String,
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payments: Vec<Payment>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
