use std::fmt::Display;

use chrono::{DateTime, Utc};
use feast_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderId};

//--------------------------------------   SettlementPeriod    -------------------------------------------------------
/// A time-bounded payout aggregation for one seller. Always derived from the order store, never persisted; calling
/// the settlement engine twice over an unchanged store yields identical output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPeriod {
    pub seller_id: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub gross_revenue: Money,
    pub platform_fee: Money,
    pub tax_withheld: Money,
    pub net_payable: Money,
    pub order_count: u64,
}

//--------------------------------------       WeekKey         -------------------------------------------------------
/// Weekly bucket key. Weeks start on Monday; the key is the ISO-8601 year and week number of the order's
/// `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeekKey {
    pub iso_year: i32,
    pub iso_week: u32,
}

impl Display for WeekKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-W{:02}", self.iso_year, self.iso_week)
    }
}

//--------------------------------------    SettlementLine     -------------------------------------------------------
/// One contributing order in a settlement report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementLine {
    pub order_id: OrderId,
    pub customer_id: String,
    pub created_at: DateTime<Utc>,
    pub total_amount: Money,
}

impl From<&Order> for SettlementLine {
    fn from(o: &Order) -> Self {
        Self {
            order_id: o.order_id.clone(),
            customer_id: o.customer_id.clone(),
            created_at: o.created_at,
            total_amount: o.total_amount,
        }
    }
}

//--------------------------------------   WeeklySettlement    -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySettlement {
    pub week: WeekKey,
    pub settlement: SettlementPeriod,
}

//--------------------------------------   SettlementReport    -------------------------------------------------------
/// The full downloadable report: the aggregate summary, the weekly breakdown, and every contributing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub summary: SettlementPeriod,
    pub weekly: Vec<WeeklySettlement>,
    pub lines: Vec<SettlementLine>,
}

impl SettlementReport {
    /// Render the report as CSV: one row per contributing order, followed by the aggregate fee breakdown.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("order_id,customer_id,created_at,total_amount\n");
        for line in &self.lines {
            out.push_str(&format!(
                "{},{},{},{:.2}\n",
                line.order_id,
                line.customer_id,
                line.created_at.to_rfc3339(),
                line.total_amount.as_rupees()
            ));
        }
        out.push('\n');
        out.push_str(&format!("gross_revenue,{:.2}\n", self.summary.gross_revenue.as_rupees()));
        out.push_str(&format!("platform_fee,{:.2}\n", self.summary.platform_fee.as_rupees()));
        out.push_str(&format!("tax_withheld,{:.2}\n", self.summary.tax_withheld.as_rupees()));
        out.push_str(&format!("net_payable,{:.2}\n", self.summary.net_payable.as_rupees()));
        out.push_str(&format!("order_count,{}\n", self.summary.order_count));
        out
    }
}
