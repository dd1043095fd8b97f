mod common;

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;
use storefront_api::{
    dto::{
        admin::AdminNoteRequest,
        orders::{CancellationRequest, CreateOrderRequest},
        payments::{ConfirmQuery, DepositWebhook, PaymentRequestBody, VirtualAccountRequestBody},
    },
    entity::{CartItems, Orders, PaymentLogs, Payments, orders, payment_logs, payments},
    error::AppError,
    middleware::auth::AuthUser,
    models::{OrderStatus, PaymentStatus},
    services::{cancellation_service, checkout_service, virtual_account_service},
    state::AppState,
};

use common::{VA_PAYMENT_KEY, add_to_cart, create_product, create_user, line, setup};

async fn pending_order(state: &AppState, user: &AuthUser, price: i64) -> String {
    let name = format!("Cotton Hoodie {}", uuid::Uuid::new_v4().simple());
    let product = create_product(state, &name, price, None).await;
    let created = virtual_account_service::create_virtual_order(
        state,
        user,
        CreateOrderRequest {
            items: vec![line(product, 1)],
        },
    )
    .await
    .unwrap()
    .data
    .unwrap();
    created.order_id
}

fn account_request(order_id: &str, bank: &str) -> VirtualAccountRequestBody {
    VirtualAccountRequestBody {
        order_id: order_id.to_string(),
        customer_name: "Kim Test".into(),
        bank: bank.into(),
    }
}

fn webhook(order_id: &str, status: &str) -> DepositWebhook {
    DepositWebhook {
        payment_key: VA_PAYMENT_KEY.into(),
        order_id: order_id.to_string(),
        status: status.into(),
    }
}

async fn order_status(state: &AppState, order_id: &str) -> OrderStatus {
    Orders::find()
        .filter(orders::Column::OrderId.eq(order_id))
        .one(&state.orm)
        .await
        .unwrap()
        .unwrap()
        .status
}

#[tokio::test]
async fn bank_transfer_order_starts_pending_and_consumes_cart() {
    let app = setup().await;
    let state = &app.state;
    let user = create_user(state, "user").await;
    let product = create_product(state, "Fleece Vest", 45000, None).await;
    add_to_cart(state, &user, product, 2, None).await;

    let created = virtual_account_service::create_virtual_order(
        state,
        &user,
        CreateOrderRequest {
            items: vec![line(product, 2)],
        },
    )
    .await
    .unwrap()
    .data
    .unwrap();

    assert!(created.success);
    assert_eq!(created.status, OrderStatus::Pending);
    assert_eq!(created.total_amount, 90000);
    assert_eq!(order_status(state, &created.order_id).await, OrderStatus::Pending);
    assert_eq!(CartItems::find().count(&state.orm).await.unwrap(), 0);
    assert_eq!(Payments::find().count(&state.orm).await.unwrap(), 0);
}

#[tokio::test]
async fn unsupported_bank_is_rejected_without_calling_the_gateway() {
    let app = setup().await;
    let state = &app.state;
    let user = create_user(state, "user").await;
    let order_id = pending_order(state, &user, 60000).await;

    let err = virtual_account_service::request_virtual_account(
        state,
        &user,
        account_request(&order_id, "CITIBANK"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidBankCode(code) if code == "CITIBANK"));
    assert_eq!(app.gateway.issue_count(), 0);
}

#[tokio::test]
async fn virtual_account_is_issued_once_per_order() {
    let app = setup().await;
    let state = &app.state;
    let user = create_user(state, "user").await;
    let order_id = pending_order(state, &user, 60000).await;

    let issued = virtual_account_service::request_virtual_account(
        state,
        &user,
        account_request(&order_id, " shinhan "),
    )
    .await
    .unwrap()
    .data
    .unwrap();
    assert_eq!(issued.payment_key, VA_PAYMENT_KEY);
    assert_eq!(issued.amount, 60000);
    assert_eq!(issued.account_number.as_deref(), Some("610512345678"));
    assert_eq!(issued.bank.as_deref(), Some("SHINHAN"));
    assert!(issued.due_date.is_some());

    let payment = Payments::find()
        .filter(payments::Column::PaymentKey.eq(VA_PAYMENT_KEY))
        .one(&state.orm)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::WaitingForDeposit);
    assert_eq!(payment.method, "VIRTUAL_ACCOUNT");
    assert_eq!(payment.approved_at, None);

    let logs = PaymentLogs::find()
        .filter(payment_logs::Column::EventType.eq("VIRTUAL_ACCOUNT"))
        .count(&state.orm)
        .await
        .unwrap();
    assert_eq!(logs, 1);

    let err = virtual_account_service::request_virtual_account(
        state,
        &user,
        account_request(&order_id, "SHINHAN"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidOrderState(_)));
    assert_eq!(app.gateway.issue_count(), 1);
}

#[tokio::test]
async fn another_users_order_is_not_found() {
    let app = setup().await;
    let state = &app.state;
    let owner = create_user(state, "user").await;
    let stranger = create_user(state, "user").await;
    let order_id = pending_order(state, &owner, 60000).await;

    let err = virtual_account_service::request_virtual_account(
        state,
        &stranger,
        account_request(&order_id, "KAKAO"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn issuance_failure_is_logged() {
    let app = setup().await;
    let state = &app.state;
    let user = create_user(state, "user").await;
    let order_id = pending_order(state, &user, 60000).await;

    app.gateway
        .reply_to_issue(400, json!({ "code": "INVALID_BANK", "message": "은행 점검 시간" }));
    let err = virtual_account_service::request_virtual_account(
        state,
        &user,
        account_request(&order_id, "WOORI"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::GatewayConfirm(reason) if reason == "은행 점검 시간"));

    // A 200 without a paymentKey is just as unusable.
    app.gateway.reply_to_issue(200, json!({ "virtualAccount": {} }));
    let err = virtual_account_service::request_virtual_account(
        state,
        &user,
        account_request(&order_id, "WOORI"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::GatewayConfirm(_)));

    let failures = PaymentLogs::find()
        .filter(payment_logs::Column::EventType.eq("VIRTUAL_ACCOUNT_FAIL"))
        .count(&state.orm)
        .await
        .unwrap();
    assert_eq!(failures, 2);
    assert_eq!(Payments::find().count(&state.orm).await.unwrap(), 0);
}

#[tokio::test]
async fn deposit_webhook_settles_the_order_once() {
    let app = setup().await;
    let state = &app.state;
    let user = create_user(state, "user").await;
    let order_id = pending_order(state, &user, 60000).await;
    virtual_account_service::request_virtual_account(
        state,
        &user,
        account_request(&order_id, "HANA"),
    )
    .await
    .unwrap();

    let ack = virtual_account_service::handle_deposit_webhook(state, webhook(&order_id, "DONE"))
        .await
        .unwrap()
        .data
        .unwrap();
    assert!(ack.success);
    assert!(ack.applied);
    assert_eq!(order_status(state, &order_id).await, OrderStatus::Paid);

    let payment = Payments::find()
        .filter(payments::Column::PaymentKey.eq(VA_PAYMENT_KEY))
        .one(&state.orm)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Approved);
    assert!(payment.approved_at.is_some());

    let replay = virtual_account_service::handle_deposit_webhook(state, webhook(&order_id, "DONE"))
        .await
        .unwrap()
        .data
        .unwrap();
    assert!(replay.success);
    assert!(!replay.applied);

    let deposits = PaymentLogs::find()
        .filter(payment_logs::Column::EventType.eq("DEPOSIT_WEBHOOK"))
        .count(&state.orm)
        .await
        .unwrap();
    assert_eq!(deposits, 1);
}

#[tokio::test]
async fn webhook_ignores_other_statuses_and_rejects_bad_input() {
    let app = setup().await;
    let state = &app.state;
    let user = create_user(state, "user").await;
    let order_id = pending_order(state, &user, 60000).await;
    virtual_account_service::request_virtual_account(
        state,
        &user,
        account_request(&order_id, "IBK"),
    )
    .await
    .unwrap();

    let ack = virtual_account_service::handle_deposit_webhook(
        state,
        webhook(&order_id, "WAITING_FOR_DEPOSIT"),
    )
    .await
    .unwrap()
    .data
    .unwrap();
    assert!(!ack.applied);
    assert_eq!(order_status(state, &order_id).await, OrderStatus::Pending);

    let err =
        virtual_account_service::handle_deposit_webhook(state, webhook("ORD-20260101-OTHER", "DONE"))
            .await
            .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(order_status(state, &order_id).await, OrderStatus::Pending);

    let err = virtual_account_service::handle_deposit_webhook(
        state,
        DepositWebhook {
            payment_key: "pk_unknown".into(),
            order_id: order_id.clone(),
            status: "DONE".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::UnknownPaymentKey));
    assert_eq!(err.status_code().as_u16(), 404);
}

#[tokio::test]
async fn pending_order_can_be_paid_by_card() {
    let app = setup().await;
    let state = &app.state;
    let user = create_user(state, "user").await;
    let order_id = pending_order(state, &user, 60000).await;

    let request = checkout_service::request_payment(
        state,
        &user,
        PaymentRequestBody {
            order_id: Some(order_id.clone()),
            pre_order_key: None,
        },
    )
    .await
    .unwrap()
    .data
    .unwrap();
    assert_eq!(request.order_id, order_id);
    assert_eq!(request.amount, 60000);
    assert_eq!(request.pre_order_key, None);

    let result = checkout_service::confirm_payment(
        state,
        ConfirmQuery {
            payment_key: "pk_card_for_pending".into(),
            order_id: order_id.clone(),
            amount: 60000,
            pre_order_key: None,
        },
    )
    .await
    .unwrap()
    .data
    .unwrap();
    assert!(!result.replayed);
    assert_eq!(order_status(state, &order_id).await, OrderStatus::Paid);

    let err = checkout_service::request_payment(
        state,
        &user,
        PaymentRequestBody {
            order_id: Some(order_id.clone()),
            pre_order_key: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidOrderState(_)));
}

async fn approved_payments(state: &AppState) -> usize {
    Payments::find()
        .filter(payments::Column::Status.eq(PaymentStatus::Approved))
        .all(&state.orm)
        .await
        .unwrap()
        .len()
}

async fn orphaned_deposits(state: &AppState) -> u64 {
    PaymentLogs::find()
        .filter(payment_logs::Column::EventType.eq("DEPOSIT_ORPHANED"))
        .count(&state.orm)
        .await
        .unwrap()
}

#[tokio::test]
async fn card_payment_closes_the_open_virtual_account() {
    let app = setup().await;
    let state = &app.state;
    let user = create_user(state, "user").await;
    let order_id = pending_order(state, &user, 60000).await;
    virtual_account_service::request_virtual_account(
        state,
        &user,
        account_request(&order_id, "SHINHAN"),
    )
    .await
    .unwrap();

    checkout_service::confirm_payment(
        state,
        ConfirmQuery {
            payment_key: "pk_card_instead".into(),
            order_id: order_id.clone(),
            amount: 60000,
            pre_order_key: None,
        },
    )
    .await
    .unwrap();

    let account = Payments::find()
        .filter(payments::Column::PaymentKey.eq(VA_PAYMENT_KEY))
        .one(&state.orm)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.status, PaymentStatus::Cancelled);

    let ack = virtual_account_service::handle_deposit_webhook(state, webhook(&order_id, "DONE"))
        .await
        .unwrap()
        .data
        .unwrap();
    assert!(!ack.applied);
    assert_eq!(approved_payments(state).await, 1);
    assert_eq!(orphaned_deposits(state).await, 1);
    assert_eq!(order_status(state, &order_id).await, OrderStatus::Paid);
}

#[tokio::test]
async fn deposit_for_a_cancelled_order_is_not_applied() {
    let app = setup().await;
    let state = &app.state;
    let user = create_user(state, "user").await;
    let admin = create_user(state, "admin").await;
    let order_id = pending_order(state, &user, 60000).await;
    virtual_account_service::request_virtual_account(
        state,
        &user,
        account_request(&order_id, "NH"),
    )
    .await
    .unwrap();

    cancellation_service::request_cancellation(
        state,
        &user,
        &order_id,
        CancellationRequest {
            reason: "ORDERED_BY_MISTAKE".into(),
        },
    )
    .await
    .unwrap();
    cancellation_service::approve_cancellation(state, &admin, &order_id, AdminNoteRequest::default())
        .await
        .unwrap();

    let ack = virtual_account_service::handle_deposit_webhook(state, webhook(&order_id, "DONE"))
        .await
        .unwrap()
        .data
        .unwrap();
    assert!(!ack.applied);
    assert_eq!(order_status(state, &order_id).await, OrderStatus::Cancelled);
    assert_eq!(approved_payments(state).await, 0);
    assert_eq!(orphaned_deposits(state).await, 1);

    let account = Payments::find()
        .filter(payments::Column::PaymentKey.eq(VA_PAYMENT_KEY))
        .one(&state.orm)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.status, PaymentStatus::WaitingForDeposit);
}
