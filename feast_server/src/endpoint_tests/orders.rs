use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use feast_common::Money;
use feast_engine::{
    db_types::{Actor, Order, OrderId, OrderStatusType, PaymentMethod, PaymentStatus, TimelineEntry},
    OrderQueryApi,
};
use serde_json::Value;

use super::{helpers::get_request, mocks::MockOrderDb};
use crate::routes::{OrderByIdRoute, OrderTimelineRoute, OrdersSearchRoute};

fn order_fixture() -> Order {
    let t = Utc.with_ymd_and_hms(2026, 8, 18, 12, 0, 0).unwrap();
    Order {
        id: 7,
        order_id: OrderId("FEAST-AB12CD34".into()),
        customer_id: "cust-1".into(),
        seller_id: "seller-1".into(),
        item_name: "Masala Dosa".into(),
        item_price: Money::from_rupees(250),
        quantity: 2,
        restaurant_name: "Udupi Corner".into(),
        total_amount: Money::from_rupees(500),
        delivery_fee: Money::default(),
        platform_fee: Money::default(),
        tax: Money::default(),
        payment_method: PaymentMethod::Online,
        payment_status: PaymentStatus::Completed,
        gateway_payment_id: Some("gw_pay_1".into()),
        status: OrderStatusType::Preparing,
        cancelled_by: None,
        cancellation_reason: None,
        cancelled_at: None,
        actual_delivery_time: None,
        contact_email: None,
        contact_phone: None,
        created_at: t,
        updated_at: t,
    }
}

#[actix_web::test]
async fn fetch_order_by_id() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/orders/FEAST-AB12CD34", |cfg: &mut ServiceConfig| {
        let mut db = MockOrderDb::new();
        db.expect_fetch_order_by_order_id().returning(|_| Ok(Some(order_fixture())));
        cfg.service(OrderByIdRoute::<MockOrderDb>::new()).app_data(web::Data::new(OrderQueryApi::new(db)));
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["order_id"], "FEAST-AB12CD34");
    assert_eq!(order["status"], "preparing");
    assert_eq!(order["total_amount"], 50000);
}

#[actix_web::test]
async fn unknown_order_is_a_404() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/orders/FEAST-MISSING1", |cfg: &mut ServiceConfig| {
        let mut db = MockOrderDb::new();
        db.expect_fetch_order_by_order_id().returning(|_| Ok(None));
        cfg.service(OrderByIdRoute::<MockOrderDb>::new()).app_data(web::Data::new(OrderQueryApi::new(db)));
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("not found"));
}

#[actix_web::test]
async fn fetch_order_timeline() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/orders/FEAST-AB12CD34/timeline", |cfg: &mut ServiceConfig| {
        let mut db = MockOrderDb::new();
        db.expect_fetch_timeline().returning(|oid| {
            let t = Utc.with_ymd_and_hms(2026, 8, 18, 12, 0, 0).unwrap();
            Ok(vec![
                TimelineEntry {
                    id: 1,
                    order_id: oid.clone(),
                    status: OrderStatusType::PendingSeller,
                    actor: Actor::Customer,
                    message: "Order placed and awaiting seller confirmation".into(),
                    created_at: t,
                },
                TimelineEntry {
                    id: 2,
                    order_id: oid.clone(),
                    status: OrderStatusType::SellerAccepted,
                    actor: Actor::Seller,
                    message: "Order accepted by the seller".into(),
                    created_at: t + chrono::Duration::minutes(2),
                },
            ])
        });
        cfg.service(OrderTimelineRoute::<MockOrderDb>::new()).app_data(web::Data::new(OrderQueryApi::new(db)));
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let timeline: Value = serde_json::from_str(&body).unwrap();
    let entries = timeline.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["status"], "pending_seller");
    assert_eq!(entries[1]["actor"], "seller");
}

#[actix_web::test]
async fn timeline_for_unknown_order_is_a_404() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request("/orders/FEAST-MISSING1/timeline", |cfg: &mut ServiceConfig| {
        let mut db = MockOrderDb::new();
        db.expect_fetch_timeline().returning(|_| Ok(Vec::new()));
        cfg.service(OrderTimelineRoute::<MockOrderDb>::new()).app_data(web::Data::new(OrderQueryApi::new(db)));
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn search_passes_the_filter_through() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request("/orders?seller_id=seller-1&status=preparing", |cfg: &mut ServiceConfig| {
            let mut db = MockOrderDb::new();
            db.expect_search_orders()
                .withf(|q| {
                    q.seller_id.as_deref() == Some("seller-1")
                        && q.status == Some(vec![OrderStatusType::Preparing])
                        && q.customer_id.is_none()
                })
                .returning(|_| Ok(vec![order_fixture()]));
            cfg.service(OrdersSearchRoute::<MockOrderDb>::new()).app_data(web::Data::new(OrderQueryApi::new(db)));
        })
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let orders: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(orders.as_array().unwrap().len(), 1);
}
