//! Order records and the two persisted item shapes.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Active,
    Closed,
}

/// One canonical order line with its pricing snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: u32,
    pub product_name: String,
    pub group_name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub unit_cost: f64,
    pub line_sale_usd: f64,
    pub line_profit_usd: f64,
}

/// Persisted order items, accepted in both historical shapes.
///
/// Old records stored a plain product-id → quantity mapping; everything
/// since stores detailed line items. Both deserialize here, and the
/// migration routine rewrites the mapping shape into the list shape so the
/// valuation engine only ever computes over [`OrderLine`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderItems {
    Canonical(Vec<OrderLine>),
    Legacy(BTreeMap<String, u32>),
}

impl OrderItems {
    pub fn is_legacy(&self) -> bool {
        matches!(self, OrderItems::Legacy(_))
    }

    /// Canonical lines, or `None` for the unmigrated mapping shape.
    pub fn lines(&self) -> Option<&[OrderLine]> {
        match self {
            OrderItems::Canonical(lines) => Some(lines),
            OrderItems::Legacy(_) => None,
        }
    }
}

/// Order totals in USD with local-currency counterparts.
///
/// Local values are `None` when no exchange rate was resolvable at
/// valuation time; they are never conflated with zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub investment_usd: f64,
    pub sale_usd: f64,
    pub profit_usd: f64,
    #[serde(default)]
    pub investment_local: Option<f64>,
    #[serde(default)]
    pub sale_local: Option<f64>,
    #[serde(default)]
    pub profit_local: Option<f64>,
}

impl OrderTotals {
    pub fn zero() -> Self {
        Self {
            investment_usd: 0.0,
            sale_usd: 0.0,
            profit_usd: 0.0,
            investment_local: None,
            sale_local: None,
            profit_local: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    /// Sequential display id shown to the operator.
    pub number: String,
    pub date: NaiveDate,
    /// Exchange rate snapshot taken when the order was saved; 0 means the
    /// rate was not configured at the time.
    pub rate: f64,
    pub status: OrderStatus,
    pub delivery_applied: bool,
    /// Delivery fee snapshot in USD taken when the order was saved.
    pub delivery_fee: f64,
    pub items: OrderItems,
    pub totals: OrderTotals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// The stored rate snapshot as an optional value, `None` when the order
    /// was saved without a configured rate.
    pub fn rate_snapshot(&self) -> Option<f64> {
        (self.rate.is_finite() && self.rate > 0.0).then_some(self.rate)
    }
}
