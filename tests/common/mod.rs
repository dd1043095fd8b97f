#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::{ActiveModelTrait, Set, TransactionTrait};
use serde_json::{Value, json};
use storefront_api::{
    config::{AppConfig, TossConfig},
    db::{create_orm_conn, run_migrations},
    dto::{auth::Claims, orders::OrderItemRequest},
    entity::{
        cart_items::ActiveModel as CartActive, colors::ActiveModel as ColorActive,
        orders::Model as OrderModel, product_colors::ActiveModel as ProductColorActive,
        products::ActiveModel as ProductActive, users::ActiveModel as UserActive,
    },
    gateway::{ConfirmRequest, GatewayCall, PaymentGateway, VirtualAccountRequest},
    middleware::auth::AuthUser,
    models::OrderStatus,
    services::{order_service, pricing_service},
    staging::{InMemoryStagingStore, PreOrderStaging},
    state::AppState,
};
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const RECEIPT_URL: &str = "https://receipt.test/card";
pub const VA_PAYMENT_KEY: &str = "va_payment_key_1";

/// Scripted stand-in for the Toss API that counts how often it is called.
pub struct FakeGateway {
    pub confirm_calls: AtomicUsize,
    pub issue_calls: AtomicUsize,
    confirm_reply: Mutex<(u16, Value)>,
    issue_reply: Mutex<(u16, Value)>,
    lapse_during_confirm: Mutex<Option<(PreOrderStaging, String)>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            confirm_calls: AtomicUsize::new(0),
            issue_calls: AtomicUsize::new(0),
            confirm_reply: Mutex::new((
                200,
                json!({
                    "method": "카드",
                    "status": "DONE",
                    "receipt": { "url": RECEIPT_URL }
                }),
            )),
            issue_reply: Mutex::new((
                200,
                json!({
                    "paymentKey": VA_PAYMENT_KEY,
                    "virtualAccount": {
                        "accountNumber": "X6105-1234-5678",
                        "bank": "SHINHAN",
                        "customerName": "Kim Test",
                        "dueDate": "2026-10-19T23:59:59+09:00"
                    }
                }),
            )),
            lapse_during_confirm: Mutex::new(None),
        }
    }

    /// Drop the given pre-order while the next confirm is in flight.
    pub fn expire_stage_during_confirm(&self, staging: PreOrderStaging, key: String) {
        *self.lapse_during_confirm.lock().unwrap() = Some((staging, key));
    }

    pub fn reply_to_confirm(&self, status: u16, body: Value) {
        *self.confirm_reply.lock().unwrap() = (status, body);
    }

    pub fn reply_to_issue(&self, status: u16, body: Value) {
        *self.issue_reply.lock().unwrap() = (status, body);
    }

    pub fn confirm_count(&self) -> usize {
        self.confirm_calls.load(Ordering::SeqCst)
    }

    pub fn issue_count(&self) -> usize {
        self.issue_calls.load(Ordering::SeqCst)
    }
}

fn scripted(url: &str, payload: Value, reply: (u16, Value)) -> GatewayCall {
    GatewayCall {
        request_url: url.to_string(),
        request_payload: payload,
        status_code: Some(reply.0),
        response_payload: Some(reply.1),
        latency: Duration::from_millis(3),
        error: None,
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn confirm(&self, request: &ConfirmRequest) -> GatewayCall {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        let lapse = self.lapse_during_confirm.lock().unwrap().take();
        if let Some((staging, key)) = lapse {
            staging.purge(&key).await.unwrap();
        }
        let reply = self.confirm_reply.lock().unwrap().clone();
        scripted(
            "https://fake.toss/v1/payments/confirm",
            serde_json::to_value(request).unwrap(),
            reply,
        )
    }

    async fn issue_virtual_account(&self, request: &VirtualAccountRequest) -> GatewayCall {
        self.issue_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.issue_reply.lock().unwrap().clone();
        scripted(
            "https://fake.toss/v1/virtual-accounts",
            serde_json::to_value(request).unwrap(),
            reply,
        )
    }
}

pub struct TestApp {
    pub state: AppState,
    pub gateway: Arc<FakeGateway>,
}

pub async fn setup() -> TestApp {
    setup_with_ttl(Duration::from_secs(900)).await
}

pub async fn setup_with_ttl(ttl: Duration) -> TestApp {
    let orm = create_orm_conn("sqlite::memory:").await.unwrap();
    run_migrations(&orm).await.unwrap();

    let config = AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 3000,
        jwt_secret: JWT_SECRET.into(),
        redis_url: None,
        public_base_url: "http://shop.test".into(),
        preorder_ttl: ttl,
        toss: TossConfig {
            api_base: "https://fake.toss/v1".into(),
            secret_key: "test_secret".into(),
            client_key: Some("test_client_key".into()),
            timeout: Duration::from_secs(1),
        },
    };

    let gateway = Arc::new(FakeGateway::new());
    let state = AppState {
        orm,
        config: Arc::new(config),
        staging: PreOrderStaging::new(Arc::new(InMemoryStagingStore::new()), ttl),
        gateway: gateway.clone(),
    };

    TestApp { state, gateway }
}

pub async fn create_user(state: &AppState, role: &str) -> AuthUser {
    let id = Uuid::new_v4();
    UserActive {
        id: Set(id),
        email: Set(format!("{id}@example.com")),
        role: Set(role.to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .unwrap();

    AuthUser {
        user_id: id,
        role: role.to_string(),
    }
}

pub async fn create_product(
    state: &AppState,
    name: &str,
    price: i64,
    sale_price: Option<i64>,
) -> Uuid {
    let id = Uuid::new_v4();
    ProductActive {
        id: Set(id),
        name: Set(name.to_string()),
        description: Set(None),
        price: Set(price),
        sale_price: Set(sale_price),
        stock: Set(100),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .unwrap();
    id
}

pub async fn create_color_for(state: &AppState, product_id: Uuid, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    ColorActive {
        id: Set(id),
        name: Set(name.to_string()),
        hex_code: Set("#000000".into()),
    }
    .insert(&state.orm)
    .await
    .unwrap();
    ProductColorActive {
        product_id: Set(product_id),
        color_id: Set(id),
    }
    .insert(&state.orm)
    .await
    .unwrap();
    id
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    quantity: i32,
    color_id: Option<Uuid>,
) -> Uuid {
    let id = Uuid::new_v4();
    CartActive {
        id: Set(id),
        user_id: Set(user.user_id),
        product_id: Set(product_id),
        quantity: Set(quantity),
        color_id: Set(color_id),
        size_id: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .unwrap();
    id
}

pub fn line(product_id: Uuid, quantity: i32) -> OrderItemRequest {
    OrderItemRequest {
        product_id,
        quantity,
        color_id: None,
        size_id: None,
    }
}

/// Write an order straight to the database, bypassing checkout.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    status: OrderStatus,
) -> OrderModel {
    let priced = pricing_service::price_order(&state.orm, &[line(product_id, 1)])
        .await
        .unwrap();
    let txn = state.orm.begin().await.unwrap();
    let (order, _) = order_service::insert_order(
        &txn,
        user.user_id,
        pricing_service::generate_order_id(),
        &priced,
        status,
    )
    .await
    .unwrap();
    txn.commit().await.unwrap();
    order
}

pub fn bearer(user: &AuthUser) -> String {
    let claims = Claims {
        sub: user.user_id.to_string(),
        role: user.role.clone(),
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {token}")
}
