use std::{collections::BTreeMap, fmt::Debug};

use chrono::{DateTime, Datelike, Utc};
use feast_common::Money;
use log::*;

use crate::{
    api::{
        errors::SettlementError,
        settlement_objects::{SettlementLine, SettlementPeriod, SettlementReport, WeekKey, WeeklySettlement},
    },
    db_types::Order,
    traits::OrderReader,
};

#[derive(Clone, Copy, Debug)]
pub struct SettlementConfig {
    /// Platform commission as a fraction of gross revenue.
    pub fee_rate: f64,
    /// Tax-collected-at-source rate.
    pub tcs_rate: f64,
    /// Tax-deducted-at-source rate.
    pub tds_rate: f64,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self { fee_rate: 0.05, tcs_rate: 0.01, tds_rate: 0.02 }
    }
}

/// `SettlementApi` derives seller payouts from completed orders. It is a pure read-and-aggregate layer: it holds no
/// state of its own, never writes to the order store, and recomputes every fee from `total_amount` using the
/// configured rates. The per-order fee breakdown columns are display-only and are deliberately ignored here.
pub struct SettlementApi<B> {
    db: B,
    config: SettlementConfig,
}

impl<B> Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi")
    }
}

impl<B> SettlementApi<B> {
    pub fn new(db: B, config: SettlementConfig) -> Self {
        Self { db, config }
    }

    /// Pure aggregation over an already-selected order set.
    pub fn summarize(
        &self,
        seller_id: &str,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        orders: &[Order],
    ) -> Result<SettlementPeriod, SettlementError> {
        for order in orders {
            if !order.total_amount.is_positive() {
                return Err(SettlementError::Computation(format!(
                    "order [{}] has non-positive total amount {}",
                    order.order_id, order.total_amount
                )));
            }
        }
        let gross_revenue: Money = orders.iter().map(|o| o.total_amount).sum();
        let platform_fee = gross_revenue.apply_rate(self.config.fee_rate);
        let tax_withheld = gross_revenue.apply_rate(self.config.tcs_rate + self.config.tds_rate);
        let net_payable = gross_revenue - platform_fee - tax_withheld;
        Ok(SettlementPeriod {
            seller_id: seller_id.to_string(),
            period_start,
            period_end,
            gross_revenue,
            platform_fee,
            tax_withheld,
            net_payable,
            order_count: orders.len() as u64,
        })
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn config(&self) -> SettlementConfig {
        self.config
    }
}

impl<B> SettlementApi<B>
where B: OrderReader
{
    /// Aggregate the seller's delivered, fully paid orders with `created_at` in the closed interval `[from, to]`.
    ///
    /// `gross_revenue` is the exact sum of `total_amount`; the fee and tax figures are rounded to the nearest
    /// paisa only at this output boundary, and `net_payable` is derived from the rounded figures so that
    /// `gross - fee - tax == net` holds exactly.
    pub async fn compute_settlement(
        &self,
        seller_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SettlementPeriod, SettlementError> {
        let orders = self.settlement_orders(seller_id, from, to).await?;
        let summary = self.summarize(seller_id, from, to, &orders)?;
        debug!(
            "🧾️ Settlement for seller [{seller_id}]: {} orders, gross {}, net {}",
            summary.order_count, summary.gross_revenue, summary.net_payable
        );
        Ok(summary)
    }

    /// The full report: aggregate summary, ISO-week breakdown, and one line per contributing order.
    pub async fn settlement_report(
        &self,
        seller_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SettlementReport, SettlementError> {
        let orders = self.settlement_orders(seller_id, from, to).await?;
        let summary = self.summarize(seller_id, from, to, &orders)?;
        let mut buckets: BTreeMap<WeekKey, Vec<&Order>> = BTreeMap::new();
        for order in &orders {
            buckets.entry(week_of(order)).or_default().push(order);
        }
        let mut weekly = Vec::with_capacity(buckets.len());
        for (week, bucket) in buckets {
            let (start, end) = bucket_bounds(&bucket);
            let orders: Vec<Order> = bucket.into_iter().cloned().collect();
            weekly.push(WeeklySettlement { week, settlement: self.summarize(seller_id, start, end, &orders)? });
        }
        let lines = orders.iter().map(SettlementLine::from).collect();
        Ok(SettlementReport { summary, weekly, lines })
    }

    async fn settlement_orders(
        &self,
        seller_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Order>, SettlementError> {
        if from > to {
            return Err(SettlementError::InvalidRange(format!("period start {from} is after period end {to}")));
        }
        trace!("🧾️ Fetching settlement orders for seller [{seller_id}] between {from} and {to}");
        Ok(self.db.fetch_settlement_orders(seller_id, from, to).await?)
    }
}

/// An order's week is determined by its `created_at`, not by when settlement runs.
fn week_of(order: &Order) -> WeekKey {
    let week = order.created_at.iso_week();
    WeekKey { iso_year: week.year(), iso_week: week.week() }
}

fn bucket_bounds(orders: &[&Order]) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = orders.iter().map(|o| o.created_at).min().unwrap_or_default();
    let end = orders.iter().map(|o| o.created_at).max().unwrap_or_default();
    (start, end)
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;
    use feast_common::Money;

    use super::*;
    use crate::db_types::{NewOrder, OrderId, OrderStatusType, PaymentMethod, PaymentStatus};

    fn order(created_at: DateTime<Utc>, rupees: i64) -> Order {
        let new = NewOrder::new(OrderId::from(format!("FEAST-{rupees}")), "cust".into(), "seller".into(), Money::from_rupees(rupees));
        Order {
            id: rupees,
            order_id: new.order_id,
            customer_id: new.customer_id,
            seller_id: new.seller_id,
            item_name: "Dal Makhani".into(),
            item_price: Money::from_rupees(rupees),
            quantity: 1,
            restaurant_name: "Spice Route".into(),
            total_amount: new.total_amount,
            delivery_fee: Money::default(),
            platform_fee: Money::default(),
            tax: Money::default(),
            payment_method: PaymentMethod::Online,
            payment_status: PaymentStatus::Completed,
            gateway_payment_id: None,
            status: OrderStatusType::Delivered,
            cancelled_by: None,
            cancellation_reason: None,
            cancelled_at: None,
            actual_delivery_time: Some(created_at),
            contact_email: None,
            contact_phone: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn api() -> SettlementApi<()> {
        SettlementApi::new((), SettlementConfig { fee_rate: 0.05, tcs_rate: 0.01, tds_rate: 0.02 })
    }

    #[test]
    fn fee_identity_holds_exactly() {
        let t = Utc.with_ymd_and_hms(2026, 8, 17, 12, 0, 0).unwrap();
        let orders = vec![order(t, 1000), order(t, 2000)];
        let s = api().summarize("seller", t, t, &orders).unwrap();
        assert_eq!(s.gross_revenue, Money::from_rupees(3000));
        assert_eq!(s.platform_fee, Money::from_rupees(150));
        assert_eq!(s.tax_withheld, Money::from_rupees(90));
        assert_eq!(s.net_payable, Money::from_rupees(2760));
        assert_eq!(s.gross_revenue - s.platform_fee - s.tax_withheld, s.net_payable);
        assert_eq!(s.order_count, 2);
    }

    #[test]
    fn awkward_rates_still_balance() {
        let t = Utc.with_ymd_and_hms(2026, 8, 17, 12, 0, 0).unwrap();
        let orders = vec![order(t, 333), order(t, 77)];
        let api = SettlementApi::new((), SettlementConfig { fee_rate: 0.033, tcs_rate: 0.011, tds_rate: 0.007 });
        let s = api.summarize("seller", t, t, &orders).unwrap();
        assert_eq!(s.gross_revenue - s.platform_fee - s.tax_withheld, s.net_payable);
    }

    #[test]
    fn non_positive_amount_is_a_computation_error() {
        let t = Utc.with_ymd_and_hms(2026, 8, 17, 12, 0, 0).unwrap();
        let mut bad = order(t, 100);
        bad.total_amount = Money::from_paise(0);
        let err = api().summarize("seller", t, t, &[bad]).unwrap_err();
        assert!(matches!(err, SettlementError::Computation(_)));
    }

    #[test]
    fn weeks_start_on_monday() {
        // Sunday 2026-08-23 is still ISO week 34; Monday 2026-08-24 opens week 35.
        let sunday = order(Utc.with_ymd_and_hms(2026, 8, 23, 23, 0, 0).unwrap(), 100);
        let monday = order(Utc.with_ymd_and_hms(2026, 8, 24, 1, 0, 0).unwrap(), 200);
        assert_eq!(week_of(&sunday), WeekKey { iso_year: 2026, iso_week: 34 });
        assert_eq!(week_of(&monday), WeekKey { iso_year: 2026, iso_week: 35 });
    }

    #[test]
    fn january_orders_can_belong_to_the_previous_iso_year() {
        let new_years_day = order(Utc.with_ymd_and_hms(2027, 1, 1, 9, 0, 0).unwrap(), 100);
        // 2027-01-01 is a Friday in ISO week 53 of 2026.
        assert_eq!(week_of(&new_years_day), WeekKey { iso_year: 2026, iso_week: 53 });
    }
}
