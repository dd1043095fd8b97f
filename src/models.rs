use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub use crate::entity::status::{
    CancellationReason, ExchangeRefundType, OrderStatus, PaymentStatus, RequestStatus,
    ShippingStatus,
};
use crate::entity::{
    order_items::Model as OrderItemModel, orders::Model as OrderModel,
    payments::Model as PaymentModel,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_id: String,
    pub user_id: Uuid,
    pub product_name: String,
    pub total_amount: i64,
    pub shipping_fee: i64,
    pub status: OrderStatus,
    pub shipping_status: ShippingStatus,
    pub cancellation: RequestInfo,
    pub exchange_refund: RequestInfo,
    pub exchange_refund_type: Option<ExchangeRefundType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// State of one post-purchase request workflow on an order.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    pub status: RequestStatus,
    pub reason: Option<String>,
    pub requested_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
    pub admin_note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub subtotal: i64,
    pub color_id: Option<Uuid>,
    pub size_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub provider: String,
    pub method: String,
    pub payment_key: String,
    pub amount: i64,
    pub status: PaymentStatus,
    pub approved_at: Option<DateTime<Utc>>,
    pub receipt_url: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub account_holder: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<OrderModel> for Order {
    fn from(model: OrderModel) -> Self {
        let cancellation = RequestInfo {
            status: model.cancellation_request_status,
            reason: model
                .cancellation_reason
                .and_then(|reason| serde_json::to_value(reason).ok())
                .and_then(|value| value.as_str().map(str::to_owned)),
            requested_at: model.cancellation_requested_at.map(|dt| dt.with_timezone(&Utc)),
            processed_at: model.cancellation_processed_at.map(|dt| dt.with_timezone(&Utc)),
            admin_note: model.cancellation_admin_note,
        };
        let exchange_refund = RequestInfo {
            status: model.exchange_refund_request_status,
            reason: model.exchange_refund_reason,
            requested_at: model
                .exchange_refund_requested_at
                .map(|dt| dt.with_timezone(&Utc)),
            processed_at: model
                .exchange_refund_processed_at
                .map(|dt| dt.with_timezone(&Utc)),
            admin_note: model.exchange_refund_admin_note,
        };

        Order {
            id: model.id,
            order_id: model.order_id,
            user_id: model.user_id,
            product_name: model.product_name,
            total_amount: model.total_amount,
            shipping_fee: model.shipping_fee,
            status: model.status,
            shipping_status: model.shipping_status,
            cancellation,
            exchange_refund,
            exchange_refund_type: model.exchange_refund_type,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<OrderItemModel> for OrderItem {
    fn from(model: OrderItemModel) -> Self {
        OrderItem {
            id: model.id,
            product_id: model.product_id,
            product_name: model.product_name,
            quantity: model.quantity,
            unit_price: model.unit_price,
            subtotal: model.subtotal,
            color_id: model.color_id,
            size_id: model.size_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<PaymentModel> for Payment {
    fn from(model: PaymentModel) -> Self {
        Payment {
            id: model.id,
            provider: model.provider,
            method: model.method,
            payment_key: model.payment_key,
            amount: model.amount,
            status: model.status,
            approved_at: model.approved_at.map(|dt| dt.with_timezone(&Utc)),
            receipt_url: model.receipt_url,
            bank_name: model.bank_name,
            account_number: model.account_number,
            account_holder: model.account_holder,
            due_date: model.due_date.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
