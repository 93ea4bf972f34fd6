use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use feast_common::Money;
use feast_engine::{
    db_types::{Order, OrderId, OrderStatusType, PaymentMethod, PaymentStatus},
    SettlementApi,
    SettlementConfig,
};
use serde_json::Value;

use super::{helpers::get_request, mocks::MockOrderDb};
use crate::routes::{SellerSettlementCsvRoute, SellerSettlementRoute};

fn delivered_order(id: i64, rupees: i64) -> Order {
    let t = Utc.with_ymd_and_hms(2026, 8, 18, 12, 0, 0).unwrap();
    Order {
        id,
        order_id: OrderId(format!("FEAST-SETTLE{id:02}")),
        customer_id: "cust-1".into(),
        seller_id: "seller-1".into(),
        item_name: "Thali".into(),
        item_price: Money::from_rupees(rupees),
        quantity: 1,
        restaurant_name: "Spice Route".into(),
        total_amount: Money::from_rupees(rupees),
        delivery_fee: Money::default(),
        platform_fee: Money::default(),
        tax: Money::default(),
        payment_method: PaymentMethod::Online,
        payment_status: PaymentStatus::Completed,
        gateway_payment_id: Some(format!("gw_pay_{id}")),
        status: OrderStatusType::Delivered,
        cancelled_by: None,
        cancellation_reason: None,
        cancelled_at: None,
        actual_delivery_time: Some(t),
        contact_email: None,
        contact_phone: None,
        created_at: t,
        updated_at: t,
    }
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockOrderDb::new();
    db.expect_fetch_settlement_orders()
        .withf(|seller_id, _, _| seller_id == "seller-1")
        .returning(|_, _, _| Ok(vec![delivered_order(1, 1000), delivered_order(2, 2000)]));
    let api = SettlementApi::new(db, SettlementConfig { fee_rate: 0.05, tcs_rate: 0.01, tds_rate: 0.02 });
    cfg.service(SellerSettlementRoute::<MockOrderDb>::new())
        .service(SellerSettlementCsvRoute::<MockOrderDb>::new())
        .app_data(web::Data::new(api));
}

const PERIOD: &str = "from=2026-08-17T00:00:00Z&to=2026-08-24T00:00:00Z";

#[actix_web::test]
async fn settlement_report_carries_the_fee_breakdown() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request(&format!("/settlement/seller-1?{PERIOD}"), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let report: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(report["summary"]["gross_revenue"], 300000);
    assert_eq!(report["summary"]["platform_fee"], 15000);
    assert_eq!(report["summary"]["tax_withheld"], 9000);
    assert_eq!(report["summary"]["net_payable"], 276000);
    assert_eq!(report["summary"]["order_count"], 2);
    assert_eq!(report["lines"].as_array().unwrap().len(), 2);
    assert_eq!(report["weekly"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn settlement_csv_is_downloadable() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request(&format!("/settlement/seller-1/csv?{PERIOD}"), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("order_id,customer_id,created_at,total_amount\n"));
    assert!(body.contains("FEAST-SETTLE01"));
    assert!(body.contains("net_payable,2760.00"));
}

#[actix_web::test]
async fn an_inverted_period_is_a_400() {
    let _ = env_logger::try_init().ok();
    let (status, _) =
        get_request("/settlement/seller-1?from=2026-08-24T00:00:00Z&to=2026-08-17T00:00:00Z", configure)
            .await
            .expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
