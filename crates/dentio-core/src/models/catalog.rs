//! Service price catalog model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A billable service in the price catalog.
///
/// Catalog prices change over time; procedures snapshot the price at
/// creation and never hold a live reference to this entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceItem {
    /// Internal UUID
    pub id: String,
    pub name: String,
    /// e.g. "restorative", "surgery", "hygiene"
    pub category: Option<String>,
    /// Current catalog price (exact decimal, never floating point)
    pub price: Decimal,
    /// Inactive services stay referenced by old procedures but are not offered
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl ServiceItem {
    /// Create a new active catalog entry.
    pub fn new(name: String, price: Decimal) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            category: None,
            price,
            active: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_service() {
        let service = ServiceItem::new("Composite filling".into(), Decimal::new(7550, 2));
        assert!(service.active);
        assert_eq!(service.price.to_string(), "75.50");
    }

    #[test]
    fn test_price_is_exact() {
        // 0.10 * 3 drifts under binary floating point; Decimal must not.
        let service = ServiceItem::new("Scaling".into(), Decimal::new(10, 2));
        let tripled = service.price + service.price + service.price;
        assert_eq!(tripled.to_string(), "0.30");
    }
}
