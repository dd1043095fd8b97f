use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::{AdminNoteRequest, ShippingUpdateRequest},
        orders::{
            CancellationRequest, CreateOrderRequest, ExchangeRefundRequest, OrderDetail,
            OrderItemRequest, OrderList, StagedOrderResponse, VirtualOrderResponse,
        },
        payments::{
            ConfirmResult, DepositWebhook, FailResult, PaymentRequestBody, PaymentRequestData,
            VirtualAccountRequestBody, VirtualAccountResult, WebhookAck,
        },
    },
    models::{
        CancellationReason, ExchangeRefundType, Order, OrderItem, OrderStatus, Payment,
        PaymentStatus, RequestInfo, RequestStatus, ShippingStatus,
    },
    response::{ApiResponse, Meta},
    routes::{admin, health, orders, payments},
    staging::StagedItem,
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        orders::create_order,
        orders::create_virtual_order,
        orders::list_orders,
        orders::get_order,
        orders::request_cancellation,
        orders::request_exchange_refund,
        payments::request_payment,
        payments::payment_success,
        payments::confirm_payment,
        payments::payment_fail,
        payments::request_virtual_account,
        payments::deposit_webhook,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::list_cancellations,
        admin::approve_cancellation,
        admin::reject_cancellation,
        admin::list_exchange_refunds,
        admin::approve_exchange_refund,
        admin::reject_exchange_refund,
        admin::list_shipping,
        admin::update_shipping
    ),
    components(
        schemas(
            Order,
            OrderItem,
            Payment,
            RequestInfo,
            OrderStatus,
            ShippingStatus,
            RequestStatus,
            PaymentStatus,
            CancellationReason,
            ExchangeRefundType,
            StagedItem,
            OrderItemRequest,
            CreateOrderRequest,
            StagedOrderResponse,
            VirtualOrderResponse,
            CancellationRequest,
            ExchangeRefundRequest,
            OrderDetail,
            OrderList,
            PaymentRequestBody,
            PaymentRequestData,
            ConfirmResult,
            FailResult,
            VirtualAccountRequestBody,
            VirtualAccountResult,
            DepositWebhook,
            WebhookAck,
            AdminNoteRequest,
            ShippingUpdateRequest,
            health::HealthData,
            Meta,
            ApiResponse<OrderList>,
            ApiResponse<OrderDetail>,
            ApiResponse<Order>,
            ApiResponse<StagedOrderResponse>,
            ApiResponse<ConfirmResult>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Orders", description = "Checkout and customer order endpoints"),
        (name = "Payments", description = "Toss Payments callbacks and requests"),
        (name = "Admin", description = "Order administration endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_checkout_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/orders/create",
            "/api/payments/toss/confirm",
            "/api/payments/toss/virtual-webhook",
            "/api/admin/shipping/{order_id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
