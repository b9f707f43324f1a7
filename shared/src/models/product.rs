//! Product Model

use serde::{Deserialize, Serialize};

use super::amount;

/// Catalog category
///
/// Serialized with the shop's own labels so existing database files load as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductCategory {
    #[serde(rename = "Sabores", alias = "Flavors")]
    Flavors,
    #[serde(rename = "Toppings")]
    Toppings,
    #[serde(rename = "Tamaños", alias = "Sizes")]
    Sizes,
    #[serde(rename = "Bebidas", alias = "Drinks")]
    Drinks,
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductCategory::Flavors => write!(f, "Sabores"),
            ProductCategory::Toppings => write!(f, "Toppings"),
            ProductCategory::Sizes => write!(f, "Tamaños"),
            ProductCategory::Drinks => write!(f, "Bebidas"),
        }
    }
}

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: ProductCategory,
    /// Unit price in whole currency units
    #[serde(deserialize_with = "amount::deserialize")]
    pub price: i64,
    #[serde(default)]
    pub description: String,
    /// Image reference (URL or data URI)
    #[serde(default)]
    pub image: String,
    pub available: bool,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: ProductCategory,
        price: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            price,
            description: String::new(),
            image: String::new(),
            available: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Product snapshot inside a cart or invoice line.
///
/// The product is copied, not referenced, so later catalog edits never
/// rewrite historical invoices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    pub fn new(product: Product, quantity: u32) -> Self {
        Self { product, quantity }
    }

    /// price × quantity, `None` on overflow
    pub fn line_total(&self) -> Option<i64> {
        self.product.price.checked_mul(i64::from(self.quantity))
    }
}
