//! Expense records.
//!
//! Expenses are entered in local currency and carry a USD value derived at
//! entry time through the same rate resolution the valuation engine uses.
//! With no configured rate the USD value stays absent, never zero.

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Supplies,
    Utilities,
    Transport,
    Wages,
    Other,
}

impl Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ExpenseCategory::Supplies => "supplies",
                ExpenseCategory::Utilities => "utilities",
                ExpenseCategory::Transport => "transport",
                ExpenseCategory::Wages => "wages",
                ExpenseCategory::Other => "other",
            }
        )
    }
}

impl FromStr for ExpenseCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "supplies" => Ok(ExpenseCategory::Supplies),
            "utilities" => Ok(ExpenseCategory::Utilities),
            "transport" => Ok(ExpenseCategory::Transport),
            "wages" => Ok(ExpenseCategory::Wages),
            "other" => Ok(ExpenseCategory::Other),
            _ => Err(anyhow::anyhow!("Invalid expense category: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    #[serde(rename = "mobile")]
    MobilePayment,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PaymentMethod::Cash => "cash",
                PaymentMethod::Transfer => "transfer",
                PaymentMethod::MobilePayment => "mobile",
            }
        )
    }
}

impl FromStr for PaymentMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "transfer" => Ok(PaymentMethod::Transfer),
            "mobile" => Ok(PaymentMethod::MobilePayment),
            _ => Err(anyhow::anyhow!("Invalid payment method: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: u64,
    pub description: String,
    pub amount_local: f64,
    /// Derived as `amount_local / rate` at entry time; `None` when no rate
    /// was configured.
    pub amount_usd: Option<f64>,
    pub category: ExpenseCategory,
    pub date: NaiveDate,
    pub payment_method: PaymentMethod,
}

impl Expense {
    pub fn new(
        id: u64,
        description: String,
        amount_local: f64,
        category: ExpenseCategory,
        date: NaiveDate,
        payment_method: PaymentMethod,
        rate: Option<f64>,
    ) -> Self {
        Self {
            id,
            description,
            amount_local,
            amount_usd: rate.map(|r| amount_local / r),
            category,
            date,
            payment_method,
        }
    }
}
