//! Exchange-rate history and resolution.
//!
//! The rate is a USD-to-local-currency multiplier kept as a dated history;
//! a single config scalar acts as fallback for stores that never recorded
//! history. An absent or non-positive rate is "not configured" and callers
//! must suppress local-currency output rather than multiply (or divide) by
//! it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One dated entry of the exchange-rate history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateEntry {
    pub id: u64,
    /// Calendar date in local time, no time component.
    pub date: NaiveDate,
    pub rate: f64,
}

/// Resolves the current exchange rate.
///
/// Picks the history entry with the maximum date (ties broken by highest
/// id, latest write wins); an empty history falls back to the config
/// scalar. Returns `None` when neither is configured or the candidate is
/// not a finite positive number. Idempotent and side-effect-free.
pub fn resolve_current_rate(history: &[RateEntry], fallback: Option<f64>) -> Option<f64> {
    history
        .iter()
        .max_by_key(|e| (e.date, e.id))
        .map(|e| e.rate)
        .or(fallback)
        .filter(|r| r.is_finite() && *r > 0.0)
}

/// Converts a USD amount to local currency, or `None` when no rate is
/// configured.
pub fn to_local(amount_usd: f64, rate: Option<f64>) -> Option<f64> {
    rate.map(|r| amount_usd * r)
}
