mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use serde_json::{Value, json};
use storefront_api::routes::create_app;
use tower::ServiceExt;

use common::{TestApp, bearer, create_product, create_user, setup};

fn app(test: &TestApp) -> Router {
    create_app(test.state.clone())
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, auth: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn missing_token_is_a_json_401() {
    let test = setup().await;
    let response = app(&test)
        .oneshot(post_json("/api/orders/create", None, r#"{"items":[]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::LOCATION).is_none());
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().starts_with("Unauthorized"));
}

#[tokio::test]
async fn staging_over_http_returns_the_pre_order() {
    let test = setup().await;
    let user = create_user(&test.state, "user").await;
    let product = create_product(&test.state, "Linen Shirt", 35000, None).await;
    let auth = bearer(&user);

    let payload = json!({ "items": [{ "productId": product, "quantity": 2 }] }).to_string();
    let response = app(&test)
        .oneshot(post_json("/api/orders/create", Some(&auth), &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body = json_body(response).await;
    assert_eq!(body["data"]["amount"], 70000);
    assert_eq!(body["data"]["shippingFee"], 0);
    assert!(
        body["data"]["preOrderKey"]
            .as_str()
            .unwrap()
            .starts_with("order:preorder:")
    );
}

#[tokio::test]
async fn malformed_json_keeps_the_envelope() {
    let test = setup().await;
    let user = create_user(&test.state, "user").await;
    let auth = bearer(&user);

    let response = app(&test)
        .oneshot(post_json("/api/orders/create", Some(&auth), "{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["message"].is_string());
    assert!(body["data"]["error"].is_string());
}

#[tokio::test]
async fn webhook_for_unknown_payment_key_is_404() {
    let test = setup().await;
    let payload = json!({
        "paymentKey": "pk_nobody",
        "orderId": "ORD-20260101-000000000000",
        "status": "DONE"
    })
    .to_string();

    let response = app(&test)
        .oneshot(post_json("/api/payments/toss/virtual-webhook", None, &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_routes_reject_customers() {
    let test = setup().await;
    let user = create_user(&test.state, "user").await;
    let admin = create_user(&test.state, "admin").await;

    let request = |auth: String| {
        Request::get("/api/admin/orders")
            .header(header::AUTHORIZATION, auth)
            .body(Body::empty())
            .unwrap()
    };

    let response = app(&test).oneshot(request(bearer(&user))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app(&test).oneshot(request(bearer(&admin))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["meta"]["total"], 0);
}

#[tokio::test]
async fn success_callback_redirects_to_confirm() {
    let test = setup().await;
    let response = app(&test)
        .oneshot(
            Request::get("/api/payments/toss/success?paymentKey=pk_1&orderId=ORD-1&amount=1000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/api/payments/toss/confirm?paymentKey=pk_1&orderId=ORD-1&amount=1000"
    );
}

#[tokio::test]
async fn fail_callback_is_a_400_with_details() {
    let test = setup().await;
    let response = app(&test)
        .oneshot(
            Request::get("/api/payments/toss/fail?code=PAY_PROCESS_CANCELED&message=cancelled")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["message"], "cancelled");
    assert_eq!(body["data"]["success"], false);
    assert_eq!(body["data"]["code"], "PAY_PROCESS_CANCELED");
}

#[tokio::test]
async fn confirm_with_bad_query_is_400() {
    let test = setup().await;
    let response = app(&test)
        .oneshot(
            Request::get("/api/payments/toss/confirm?paymentKey=pk_1&amount=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let test = setup().await;

    let response = app(&test)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["database"], "ok");

    let response = app(&test)
        .oneshot(Request::get("/api/nowhere").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert!(body["message"].is_string());
}
