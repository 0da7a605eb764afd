//! Order fulfillment: the only mutation path for stock.
//!
//! Receipt is split into a pure planning step and an apply step owned by
//! the caller. Planning validates the whole order up front (status, item
//! shape, product existence) so a rejection can never leave stock
//! increments half-applied with the order still open.

use crate::core::catalog::{Product, find_product};
use crate::core::error::ReceiveError;
use crate::core::order::{Order, OrderStatus};

/// One stock increment to apply when an order is received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockAdjustment {
    pub product_id: u32,
    pub quantity: u32,
}

/// Plans the stock adjustments for receiving `order`.
///
/// Fails with [`ReceiveError::AlreadyClosed`] when the order was received
/// before (closing twice never double-increments stock), with
/// [`ReceiveError::UnmigratedItems`] for legacy-shaped items, and with
/// [`ReceiveError::MissingProduct`] when any quantity-positive line has no
/// product in the catalog. On success the caller applies every adjustment,
/// sets the status to Closed and stamps the received-at timestamp as one
/// logical unit.
pub fn plan_receipt(
    order: &Order,
    products: &[Product],
) -> Result<Vec<StockAdjustment>, ReceiveError> {
    if order.status == OrderStatus::Closed {
        return Err(ReceiveError::AlreadyClosed { order_id: order.id });
    }
    let Some(lines) = order.items.lines() else {
        return Err(ReceiveError::UnmigratedItems { order_id: order.id });
    };

    let mut adjustments = Vec::new();
    for line in lines {
        if line.quantity == 0 {
            continue;
        }
        if find_product(products, line.product_id).is_none() {
            return Err(ReceiveError::MissingProduct {
                order_id: order.id,
                product_id: line.product_id,
            });
        }
        adjustments.push(StockAdjustment {
            product_id: line.product_id,
            quantity: line.quantity,
        });
    }

    Ok(adjustments)
}
