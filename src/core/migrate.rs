//! One-time normalization of legacy order records.
//!
//! Old orders stored `items` as a product-id → quantity mapping. Migration
//! rewrites them into canonical line items priced at migration time (a
//! deliberate point-in-time re-pricing; historical price drift is out of
//! scope) and recomputes totals, keeping each order's originally stored
//! exchange rate for the local-currency values.

use chrono::{DateTime, Utc};

use crate::core::catalog::{Group, Product, find_group, find_product};
use crate::core::order::{Order, OrderItems, OrderLine};
use crate::core::valuation::{DeliveryCharge, totals_from_lines};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutcome {
    pub migrated: usize,
    /// Orders already in canonical form, untouched.
    pub skipped: usize,
}

#[derive(Debug)]
pub struct MigrationResult {
    /// The transformed orders, ready to be written back.
    pub migrated: Vec<Order>,
    pub outcome: MigrationOutcome,
}

/// Migrates every legacy-shaped order in `orders`.
///
/// Idempotent by construction: the legacy predicate only matches the
/// mapping shape, so a second run over the written-back data migrates
/// nothing.
pub fn migrate_legacy_orders(
    orders: &[Order],
    products: &[Product],
    groups: &[Group],
    migrated_at: DateTime<Utc>,
) -> MigrationResult {
    let mut migrated = Vec::new();
    let mut skipped = 0;

    for order in orders {
        match migrate_order(order, products, groups, migrated_at) {
            Some(order) => migrated.push(order),
            None => skipped += 1,
        }
    }

    let outcome = MigrationOutcome {
        migrated: migrated.len(),
        skipped,
    };
    MigrationResult { migrated, outcome }
}

/// Transforms one order, or returns `None` when it is already canonical.
fn migrate_order(
    order: &Order,
    products: &[Product],
    groups: &[Group],
    migrated_at: DateTime<Utc>,
) -> Option<Order> {
    let OrderItems::Legacy(mapping) = &order.items else {
        return None;
    };

    let mut lines = Vec::new();
    for (key, &quantity) in mapping {
        if quantity == 0 {
            continue;
        }
        let Ok(product_id) = key.parse::<u32>() else {
            tracing::warn!(order_id = order.id, %key, "unparsable product id in legacy items");
            continue;
        };

        let product = find_product(products, product_id);
        let group = product.and_then(|p| find_group(groups, &p.group));
        let (unit_price, unit_cost) = group.map_or((0.0, 0.0), |g| (g.unit_price, g.unit_cost));

        let qty = f64::from(quantity);
        lines.push(OrderLine {
            product_id,
            product_name: product.map_or_else(|| "(deleted product)".to_string(), |p| p.name.clone()),
            group_name: product.map_or_else(String::new, |p| p.group.clone()),
            quantity,
            unit_price,
            unit_cost,
            line_sale_usd: qty * unit_price,
            line_profit_usd: qty * (unit_price - unit_cost),
        });
    }

    let delivery = DeliveryCharge {
        applied: order.delivery_applied,
        fee: Some(order.delivery_fee),
    };
    // Local totals keep the order's stored rate, never the current one.
    let totals = totals_from_lines(&lines, order.rate_snapshot(), delivery);

    let mut migrated = order.clone();
    migrated.items = OrderItems::Canonical(lines);
    migrated.totals = totals;
    migrated.migrated_at = Some(migrated_at);
    Some(migrated)
}
