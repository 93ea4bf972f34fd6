//! Endpoint tests for order creation and transitions, backed by a real throwaway sqlite store.

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use feast_common::{Money, Secret};
use feast_engine::{
    events::EventProducers,
    helpers::sign_payment_proof,
    test_utils::prepare_test_env,
    OrderFlowApi,
    PaymentApi,
    PaymentConfig,
    SqliteDatabase,
};
use serde_json::{json, Value};

use super::helpers::post_request;
use crate::routes::{UpdateOrderStatusRoute, VerifyPaymentRoute};

const GATEWAY_SECRET: &str = "endpoint-test-secret";

fn configure_with(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let config = PaymentConfig {
            gateway_secret: Secret::new(GATEWAY_SECRET.to_string()),
            cod_surcharge: Money::from_rupees(10),
        };
        let payments = PaymentApi::new(db.clone(), EventProducers::default(), config);
        let flow = OrderFlowApi::new(db, EventProducers::default());
        cfg.service(VerifyPaymentRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .app_data(web::Data::new(payments))
            .app_data(web::Data::new(flow));
    }
}

fn cod_body(rupees: i64) -> Value {
    json!({
        "order": {
            "customer_id": "cust-1",
            "seller_id": "seller-1",
            "item_name": "Paneer Tikka",
            "item_price": rupees * 100,
            "quantity": 1,
            "restaurant_name": "Spice Route",
            "total_amount": rupees * 100,
            "payment_method": "cash_on_delivery"
        }
    })
}

fn online_body(payment_id: &str, rupees: i64) -> Value {
    let signature = sign_payment_proof(GATEWAY_SECRET, "gw_ord_1", payment_id);
    json!({
        "proof": {
            "gateway_order_id": "gw_ord_1",
            "gateway_payment_id": payment_id,
            "signature": signature
        },
        "order": {
            "customer_id": "cust-1",
            "seller_id": "seller-1",
            "item_name": "Paneer Tikka",
            "item_price": rupees * 100,
            "quantity": 1,
            "restaurant_name": "Spice Route",
            "total_amount": rupees * 100,
            "payment_method": "online"
        }
    })
}

async fn create_order(db: &SqliteDatabase, body: Value) -> Value {
    let (status, body) =
        post_request("/payments/verify", body, configure_with(db.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    serde_json::from_str(&body).unwrap()
}

#[actix_web::test]
async fn cod_order_gets_the_surcharge() {
    let _ = env_logger::try_init().ok();
    let db = prepare_test_env().await;
    let order = create_order(&db, cod_body(500)).await;
    assert_eq!(order["total_amount"], 51000);
    assert_eq!(order["status"], "pending_seller");
    assert_eq!(order["payment_status"], "pending");
}

#[actix_web::test]
async fn tampered_proof_is_a_401() {
    let _ = env_logger::try_init().ok();
    let db = prepare_test_env().await;
    let mut body = online_body("gw_pay_1", 750);
    body["proof"]["signature"] = Value::String("deadbeef".repeat(8));
    let (status, body) = post_request("/payments/verify", body, configure_with(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("verification failed"));
}

#[actix_web::test]
async fn duplicate_payment_reference_is_a_409() {
    let _ = env_logger::try_init().ok();
    let db = prepare_test_env().await;
    create_order(&db, online_body("gw_pay_2", 500)).await;
    let (status, _) =
        post_request("/payments/verify", online_body("gw_pay_2", 500), configure_with(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn a_legal_transition_returns_the_updated_order() {
    let _ = env_logger::try_init().ok();
    let db = prepare_test_env().await;
    let order = create_order(&db, cod_body(300)).await;
    let oid = order["order_id"].as_str().unwrap();
    let (status, body) = post_request(
        &format!("/orders/{oid}/status"),
        json!({"target_status": "seller_accepted", "actor": "seller"}),
        configure_with(db),
    )
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["status"], "seller_accepted");
}

#[actix_web::test]
async fn an_illegal_transition_is_a_400() {
    let _ = env_logger::try_init().ok();
    let db = prepare_test_env().await;
    let order = create_order(&db, cod_body(300)).await;
    let oid = order["order_id"].as_str().unwrap();
    let (status, body) = post_request(
        &format!("/orders/{oid}/status"),
        json!({"target_status": "out_for_delivery", "actor": "delivery"}),
        configure_with(db),
    )
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid order status transition"));
}

#[actix_web::test]
async fn a_rejection_without_a_reason_is_a_400() {
    let _ = env_logger::try_init().ok();
    let db = prepare_test_env().await;
    let order = create_order(&db, cod_body(300)).await;
    let oid = order["order_id"].as_str().unwrap().to_string();
    let (status, _) = post_request(
        &format!("/orders/{oid}/status"),
        json!({"target_status": "seller_rejected", "actor": "seller"}),
        configure_with(db.clone()),
    )
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_request(
        &format!("/orders/{oid}/status"),
        json!({"target_status": "seller_rejected", "actor": "seller", "note": "out of stock"}),
        configure_with(db),
    )
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["cancellation_reason"], "out of stock");
}

#[actix_web::test]
async fn transitioning_an_unknown_order_is_a_404() {
    let _ = env_logger::try_init().ok();
    let db = prepare_test_env().await;
    let (status, _) = post_request(
        "/orders/FEAST-NOSUCHID/status",
        json!({"target_status": "seller_accepted", "actor": "seller"}),
        configure_with(db),
    )
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
}
