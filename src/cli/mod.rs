//! Command-line surface: argument types and one module per command group.

pub mod backup;
pub mod configure;
pub mod expenses;
pub mod groups;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod rates;
pub mod setup;
pub mod ui;

use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::Subcommand;

use crate::core::error::ValidationError;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create default configuration
    Setup,
    /// Display the inventory valuation report
    Inventory,
    /// Manage the product catalog
    #[command(subcommand)]
    Product(ProductCommand),
    /// Manage pricing groups
    #[command(subcommand)]
    Group(GroupCommand),
    /// Manage the exchange-rate history
    #[command(subcommand)]
    Rate(RateCommand),
    /// Create, inspect and receive orders
    #[command(subcommand)]
    Order(OrderCommand),
    /// Record and list expenses
    #[command(subcommand)]
    Expense(ExpenseCommand),
    /// Inspect and change stored settings
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Export or import the whole store as JSON
    #[command(subcommand)]
    Backup(BackupCommand),
}

#[derive(Debug, Subcommand)]
pub enum ProductCommand {
    /// Add a product to the catalog
    Add {
        /// Unique positive product id
        #[arg(long)]
        id: u32,
        #[arg(long)]
        name: String,
        /// Pricing group name this product belongs to
        #[arg(long)]
        group: String,
        #[arg(long, default_value_t = 0)]
        stock: u32,
        #[arg(long)]
        image: Option<String>,
    },
    /// List the catalog
    List,
    /// Exclude a product from the inventory report
    Hide { id: u32 },
    /// Include a product in the inventory report again
    Show { id: u32 },
    /// Delete a product not referenced by any open order
    Rm { id: u32 },
}

#[derive(Debug, Subcommand)]
pub enum GroupCommand {
    /// Add a pricing group
    Add {
        #[arg(long)]
        name: String,
        /// Unit sale price in USD
        #[arg(long)]
        price: f64,
        /// Unit cost in USD
        #[arg(long)]
        cost: f64,
    },
    /// List pricing groups
    List,
    /// Update a group's pricing
    Set {
        name: String,
        /// New unit sale price in USD
        #[arg(long)]
        price: Option<f64>,
        /// New unit cost in USD
        #[arg(long)]
        cost: Option<f64>,
    },
    /// Delete a group no product references
    Rm { name: String },
}

#[derive(Debug, Subcommand)]
pub enum RateCommand {
    /// Record a dated entry in the rate history
    Set {
        rate: f64,
        /// Entry date, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Set the fallback rate used when the history is empty
    Fallback { rate: f64 },
    /// List the rate history
    List,
    /// Display the resolved current rate
    Current,
}

#[derive(Debug, Subcommand)]
pub enum OrderCommand {
    /// Create an order from product selections
    Create {
        /// Order line as PRODUCT_ID:QUANTITY, repeatable
        #[arg(long = "item", required = true)]
        items: Vec<ItemArg>,
        /// Display number, generated from the id when omitted
        #[arg(long)]
        number: Option<String>,
        /// Order date, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Skip the delivery charge for this order
        #[arg(long)]
        no_delivery: bool,
    },
    /// List orders
    List,
    /// Show one order with its lines and totals
    Show { id: u64 },
    /// Receive an order, adding its quantities to stock
    Receive { id: u64 },
    /// Rewrite legacy-shaped order items into line items
    Migrate,
}

#[derive(Debug, Subcommand)]
pub enum ExpenseCommand {
    /// Record an expense in local currency
    Add {
        #[arg(long)]
        description: String,
        /// Amount in local currency
        #[arg(long)]
        amount: f64,
        /// supplies, utilities, transport, wages or other
        #[arg(long, default_value = "other")]
        category: String,
        /// cash, transfer or mobile
        #[arg(long, default_value = "cash")]
        method: String,
        /// Expense date, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List expenses
    List,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Set the flat delivery fee in USD
    SetDelivery { fee: f64 },
    /// Show the stored settings
    Show,
}

#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// Write the whole store to a JSON file
    Export { file: PathBuf },
    /// Replace the whole store with a JSON file's contents
    Import { file: PathBuf },
}

/// One `PRODUCT_ID:QUANTITY` order selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemArg {
    pub product_id: u32,
    pub quantity: u32,
}

impl FromStr for ItemArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, qty) = s
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("Expected PRODUCT_ID:QUANTITY, got \"{s}\""))?;
        Ok(ItemArg {
            product_id: id
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid product id \"{id}\""))?,
            quantity: qty
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid quantity \"{qty}\""))?,
        })
    }
}

/// Rejects negative or non-finite monetary input before anything is
/// persisted.
pub(crate) fn validate_money(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::new(field, "must be a number"));
    }
    if value < 0.0 {
        return Err(ValidationError::new(field, "must not be negative"));
    }
    Ok(value)
}

/// Like [`validate_money`] but zero is rejected too.
pub(crate) fn validate_positive(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    let value = validate_money(field, value)?;
    if value == 0.0 {
        return Err(ValidationError::new(field, "must be positive"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_arg_parsing() {
        assert_eq!(
            "3:12".parse::<ItemArg>().unwrap(),
            ItemArg { product_id: 3, quantity: 12 }
        );
        assert_eq!(
            " 7 : 1 ".parse::<ItemArg>().unwrap(),
            ItemArg { product_id: 7, quantity: 1 }
        );
        assert!("3".parse::<ItemArg>().is_err());
        assert!("a:1".parse::<ItemArg>().is_err());
        assert!("1:-2".parse::<ItemArg>().is_err());
    }

    #[test]
    fn test_validate_money() {
        assert_eq!(validate_money("fee", 0.0).unwrap(), 0.0);
        assert!(validate_money("fee", -1.0).is_err());
        assert!(validate_money("fee", f64::NAN).is_err());
        assert!(validate_positive("rate", 0.0).is_err());
        assert_eq!(validate_positive("rate", 36.5).unwrap(), 36.5);
    }
}
