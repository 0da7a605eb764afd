//! Order valuation engine.
//!
//! Pure calculation over pre-fetched catalog data: callers load products,
//! groups and the resolved rate from the store and pass them in. Lines that
//! reference a deleted product are skipped; lines whose group no longer
//! resolves contribute zero to both cost and sale. Neither aborts the
//! aggregate.

use crate::core::catalog::{Group, Product, find_group, find_product};
use crate::core::order::{OrderLine, OrderTotals};
use crate::core::rate::to_local;

/// Delivery charge applied to an order's investment total.
///
/// The fee is `None` when the `delivery` config key is unset; an applied
/// charge without a configured fee adds nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeliveryCharge {
    pub applied: bool,
    pub fee: Option<f64>,
}

impl DeliveryCharge {
    pub fn none() -> Self {
        Self {
            applied: false,
            fee: None,
        }
    }

    /// The cost contributed to the order, in USD.
    pub fn cost(&self) -> f64 {
        if self.applied { self.fee.unwrap_or(0.0) } else { 0.0 }
    }
}

/// Builds the canonical line items for a set of {product, quantity}
/// selections.
///
/// Selections with quantity 0 are excluded entirely, which keeps them out
/// of the persisted item list at save time. A selection whose product id no
/// longer resolves is dropped; a product whose group name has no
/// case-insensitive match keeps its line with zero pricing.
pub fn build_order_lines(
    selections: &[(u32, u32)],
    products: &[Product],
    groups: &[Group],
) -> Vec<OrderLine> {
    let mut lines = Vec::new();

    for &(product_id, quantity) in selections {
        if quantity == 0 {
            continue;
        }
        let Some(product) = find_product(products, product_id) else {
            tracing::debug!(product_id, "selection references missing product, line skipped");
            continue;
        };

        let (unit_price, unit_cost) = match find_group(groups, &product.group) {
            Some(group) => (group.unit_price, group.unit_cost),
            None => {
                tracing::debug!(
                    product_id,
                    group = %product.group,
                    "no matching group, line contributes zero"
                );
                (0.0, 0.0)
            }
        };

        let qty = f64::from(quantity);
        lines.push(OrderLine {
            product_id,
            product_name: product.name.clone(),
            group_name: product.group.clone(),
            quantity,
            unit_price,
            unit_cost,
            line_sale_usd: qty * unit_price,
            line_profit_usd: qty * (unit_price - unit_cost),
        });
    }

    lines
}

/// Aggregates canonical lines into order totals.
///
/// The delivery charge is a cost: it raises the investment total and
/// reduces profit. Local-currency values are present only when a rate is
/// configured.
pub fn totals_from_lines(
    lines: &[OrderLine],
    rate: Option<f64>,
    delivery: DeliveryCharge,
) -> OrderTotals {
    let mut investment_usd = 0.0;
    let mut sale_usd = 0.0;

    for line in lines {
        let qty = f64::from(line.quantity);
        investment_usd += qty * line.unit_cost;
        sale_usd += line.line_sale_usd;
    }

    investment_usd += delivery.cost();
    let profit_usd = sale_usd - investment_usd;

    OrderTotals {
        investment_usd,
        sale_usd,
        profit_usd,
        investment_local: to_local(investment_usd, rate),
        sale_local: to_local(sale_usd, rate),
        profit_local: to_local(profit_usd, rate),
    }
}

/// Valuates a set of selections end to end.
pub fn valuate_order(
    selections: &[(u32, u32)],
    products: &[Product],
    groups: &[Group],
    rate: Option<f64>,
    delivery: DeliveryCharge,
) -> OrderTotals {
    let lines = build_order_lines(selections, products, groups);
    totals_from_lines(&lines, rate, delivery)
}
