//! Product catalog and pricing group records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A sellable product. `group` joins to [`Group::name`] by name, not id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// User-assigned unique id, always positive.
    pub id: u32,
    pub name: String,
    /// Pricing group this product belongs to, matched case-insensitively.
    pub group: String,
    pub stock: u32,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn default_visible() -> bool {
    true
}

/// A pricing category carrying unit sale price and unit cost, both in USD.
///
/// `unit_cost > unit_price` is allowed on write; the inventory audit flags
/// it as a negative-margin warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: u64,
    /// Unique join key, compared case-insensitively.
    pub name: String,
    pub unit_price: f64,
    pub unit_cost: f64,
}

pub fn find_product(products: &[Product], id: u32) -> Option<&Product> {
    products.iter().find(|p| p.id == id)
}

/// Case-insensitive exact match on the group name.
pub fn find_group<'a>(groups: &'a [Group], name: &str) -> Option<&'a Group> {
    let wanted = name.to_lowercase();
    groups.iter().find(|g| g.name.to_lowercase() == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: &str) -> Group {
        Group {
            id: 1,
            name: name.to_string(),
            unit_price: 5.0,
            unit_cost: 2.0,
        }
    }

    #[test]
    fn test_find_group_ignores_case() {
        let groups = vec![group("Tropical"), group("Clásico")];

        assert!(find_group(&groups, "tropical").is_some());
        assert!(find_group(&groups, "TROPICAL").is_some());
        assert!(find_group(&groups, "clásico").is_some());
        assert!(find_group(&groups, "Mantecado").is_none());
    }

    #[test]
    fn test_product_visible_defaults_to_true() {
        // Records written before the visibility flag existed omit the field
        let json = r#"{
            "id": 3,
            "name": "Barquilla",
            "group": "Tropical",
            "stock": 12,
            "created_at": "2024-06-01T00:00:00Z"
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert!(product.visible);
        assert_eq!(product.image_path, None);
    }
}
