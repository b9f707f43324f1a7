//! AppSnapshot - unit of persistence and transport
//!
//! ```text
//! {
//!   "invoices":   Invoice[],      newest first
//!   "products":   Product[],
//!   "history":    LoginEvent[],   newest first
//!   "settings":   { ... },        opaque store configuration
//!   "version":    "1.0.0",
//!   "exportedAt": ISO-8601
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::invoice::Invoice;
use super::login_event::LoginEvent;
use super::product::Product;
use crate::util;

/// Schema tag written into every snapshot
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// Opaque store configuration (name, address, currency, ...)
pub type Settings = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Invalid snapshot format: {0}")]
    InvalidFormat(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

fn default_version() -> String {
    SNAPSHOT_VERSION.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSnapshot {
    pub invoices: Vec<Invoice>,
    pub products: Vec<Product>,
    #[serde(default)]
    pub history: Vec<LoginEvent>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub exported_at: String,
}

impl Default for AppSnapshot {
    fn default() -> Self {
        Self {
            invoices: Vec::new(),
            products: Vec::new(),
            history: Vec::new(),
            settings: Settings::new(),
            version: default_version(),
            exported_at: String::new(),
        }
    }
}

impl AppSnapshot {
    pub fn new(
        invoices: Vec<Invoice>,
        products: Vec<Product>,
        history: Vec<LoginEvent>,
        settings: Settings,
    ) -> Self {
        Self {
            invoices,
            products,
            history,
            settings,
            version: default_version(),
            exported_at: util::now_iso(),
        }
    }

    /// Parse and validate a snapshot read from a file or the cloud.
    ///
    /// `invoices` and `products` must be present as arrays. Nothing is
    /// returned unless the whole document decodes, so callers can never
    /// apply half a snapshot.
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| SnapshotError::InvalidFormat(format!("not valid JSON: {e}")))?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, SnapshotError> {
        // Some drive clients hand back the JSON body as a string
        if let serde_json::Value::String(inner) = &value {
            return Self::from_json(inner);
        }

        let object = value
            .as_object()
            .ok_or_else(|| SnapshotError::InvalidFormat("expected a JSON object".into()))?;

        for field in ["invoices", "products"] {
            match object.get(field) {
                Some(serde_json::Value::Array(_)) => {}
                Some(_) => {
                    return Err(SnapshotError::InvalidFormat(format!(
                        "`{field}` must be an array"
                    )));
                }
                None => {
                    return Err(SnapshotError::InvalidFormat(format!("missing `{field}`")));
                }
            }
        }

        serde_json::from_value(value).map_err(|e| SnapshotError::InvalidFormat(e.to_string()))
    }

    /// Copy with a fresh `exportedAt`
    pub fn stamped(&self) -> Self {
        let mut snapshot = self.clone();
        snapshot.exported_at = util::now_iso();
        snapshot
    }

    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CartItem, CheckoutDetails, PaymentMethod, ProductCategory};

    #[test]
    fn test_missing_invoices_is_invalid() {
        let err = AppSnapshot::from_json(r#"{"products": []}"#).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidFormat(msg) if msg.contains("invoices")));
    }

    #[test]
    fn test_non_array_products_is_invalid() {
        let err = AppSnapshot::from_json(r#"{"invoices": [], "products": {}}"#).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidFormat(msg) if msg.contains("products")));
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(matches!(
            AppSnapshot::from_json("not json"),
            Err(SnapshotError::InvalidFormat(_))
        ));
        assert!(matches!(
            AppSnapshot::from_json("[1, 2]"),
            Err(SnapshotError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_minimal_snapshot_gets_defaults() {
        let snapshot = AppSnapshot::from_json(r#"{"invoices": [], "products": []}"#).unwrap();
        assert!(snapshot.history.is_empty());
        assert!(snapshot.settings.is_empty());
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
    }

    #[test]
    fn test_fractional_amounts_load() {
        let json = r#"{
            "invoices": [{
                "id": "a", "folio": "F-20260101-001", "uuid": "u", "date": "1 ene 2026, 10:00",
                "timestamp": 1767261600000, "customerName": "Consumidor Final",
                "customerNif": "222222222222",
                "items": [{"id": "1", "name": "Fresa", "category": "Sabores", "price": 11000.5,
                           "available": true, "quantity": 1}],
                "subtotal": 11000.5, "tax": 0, "total": 11000.5,
                "status": "Pagada", "paymentMethod": "Efectivo"
            }],
            "products": [{"id": "1", "name": "Fresa", "category": "Sabores", "price": 11000.5, "available": true}]
        }"#;
        let snapshot = AppSnapshot::from_json(json).unwrap();
        assert_eq!(snapshot.products[0].price, 11001);
        assert_eq!(snapshot.invoices[0].items[0].product.price, 11001);
        assert_eq!(snapshot.invoices[0].total, 11001);
    }

    #[test]
    fn test_string_wrapped_body() {
        let inner = r#"{"invoices": [], "products": [], "version": "1.0.0"}"#;
        let wrapped = serde_json::Value::String(inner.to_string());
        assert!(AppSnapshot::from_value(wrapped).is_ok());
    }

    #[test]
    fn test_round_trip_through_json() {
        let product = Product::new("1", "Chocolate Belga", ProductCategory::Flavors, 12000);
        let invoice = Invoice::from_cart(
            &[CartItem::new(product.clone(), 1)],
            CheckoutDetails::new(PaymentMethod::Cash),
        )
        .unwrap();
        let mut settings = Settings::new();
        settings.insert("storeName".into(), "Dulce Alya".into());
        let snapshot = AppSnapshot::new(vec![invoice], vec![product], vec![], settings);

        let text = snapshot.to_json_pretty().unwrap();
        assert!(text.contains("exportedAt"));
        assert_eq!(AppSnapshot::from_json(&text).unwrap(), snapshot);
    }

    #[test]
    fn test_stamped_refreshes_export_time() {
        let mut snapshot = AppSnapshot::default();
        snapshot.exported_at = "2020-01-01T00:00:00.000Z".into();
        let stamped = snapshot.stamped();
        assert_ne!(stamped.exported_at, snapshot.exported_at);
        assert_eq!(stamped.invoices, snapshot.invoices);
    }
}
