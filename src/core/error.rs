//! Domain error taxonomy.
//!
//! Typed errors cover deterministic business failures (validation,
//! referential rules, receipt preconditions). Infrastructure failures are
//! reported through `anyhow` at the command boundary.

use thiserror::Error;

/// A monetary or quantity input was rejected before any persistence call.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Referential and uniqueness rules enforced by the repositories.
///
/// A rejected operation writes nothing; the store is left as it was.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("product {id} already exists")]
    DuplicateId { id: u32 },

    #[error("group \"{name}\" already exists")]
    DuplicateName { name: String },

    #[error("product {id} is referenced by open order {order_id}")]
    ReferencedProduct { id: u32, order_id: u64 },

    #[error("group \"{name}\" is referenced by {count} product(s)")]
    ReferencedGroup { name: String, count: usize },

    #[error("product {id} not found")]
    ProductNotFound { id: u32 },

    #[error("group \"{name}\" not found")]
    GroupNotFound { name: String },

    #[error("order {id} not found")]
    OrderNotFound { id: u64 },
}

/// Preconditions for receiving an order.
///
/// Planning fails before any stock increment is applied, so a rejection
/// never leaves stock and order status out of step.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReceiveError {
    #[error("order {order_id} is already closed")]
    AlreadyClosed { order_id: u64 },

    #[error("order {order_id} references missing product {product_id}")]
    MissingProduct { order_id: u64, product_id: u32 },

    #[error("order {order_id} still has legacy-shaped items; run `order migrate` first")]
    UnmigratedItems { order_id: u64 },
}
