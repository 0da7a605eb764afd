//! Inventory valuation and data-quality audit.
//!
//! Aggregates the whole visible stock against the group price table and
//! reports the data-quality gaps it finds along the way: products whose
//! group no longer resolves (orphans) and groups priced below cost. The
//! full warning list is returned; truncation for display is a presentation
//! concern left to the caller.

use crate::core::catalog::{Group, Product, find_group};
use crate::core::rate::to_local;

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryReport {
    pub total_cost_usd: f64,
    pub total_sale_usd: f64,
    pub profit_usd: f64,
    pub profit_local: Option<f64>,
    /// Visible products with stock that entered the totals.
    pub counted_products: usize,
    /// Products excluded because they are hidden, reported for transparency.
    pub hidden_count: usize,
    /// Visible products with stock but no resolvable group.
    pub orphan_count: usize,
    /// Orphan warnings first, then negative-margin warnings.
    pub warnings: Vec<String>,
}

pub fn valuate_inventory(
    products: &[Product],
    groups: &[Group],
    rate: Option<f64>,
) -> InventoryReport {
    let mut total_cost_usd = 0.0;
    let mut total_sale_usd = 0.0;
    let mut counted_products = 0;
    let mut orphan_count = 0;
    let mut warnings = Vec::new();

    let hidden_count = products.iter().filter(|p| !p.visible).count();

    for product in products.iter().filter(|p| p.visible) {
        if product.stock == 0 {
            continue;
        }
        match find_group(groups, &product.group) {
            Some(group) => {
                let stock = f64::from(product.stock);
                total_cost_usd += stock * group.unit_cost;
                total_sale_usd += stock * group.unit_price;
                counted_products += 1;
            }
            None => {
                orphan_count += 1;
                warnings.push(format!(
                    "product {} \"{}\" has {} unit(s) in stock but no group named \"{}\"",
                    product.id, product.name, product.stock, product.group
                ));
            }
        }
    }

    // The margin scan covers the full table, including groups no visible
    // product currently references.
    for group in groups {
        if group.unit_cost > group.unit_price {
            warnings.push(format!(
                "group \"{}\" has unit cost {:.2} above unit price {:.2}",
                group.name, group.unit_cost, group.unit_price
            ));
        }
    }

    let profit_usd = total_sale_usd - total_cost_usd;

    InventoryReport {
        total_cost_usd,
        total_sale_usd,
        profit_usd,
        profit_local: to_local(profit_usd, rate),
        counted_products,
        hidden_count,
        orphan_count,
        warnings,
    }
}
