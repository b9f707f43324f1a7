//! Default catalog used on first run, before any products are cached

use super::product::{Product, ProductCategory};

pub fn default_products() -> Vec<Product> {
    vec![
        Product::new("1", "Chocolate Belga", ProductCategory::Flavors, 12000).with_description("Oscuro 70%"),
        Product::new("2", "Vainilla Clásica", ProductCategory::Flavors, 10000).with_description("Madagascar"),
        Product::new("3", "Fresa Natural", ProductCategory::Flavors, 11000).with_description("Fruta real"),
        Product::new("4", "Menta Granizada", ProductCategory::Flavors, 10000).with_description("Refrescante"),
        Product::new("5", "Dulce de Leche", ProductCategory::Flavors, 12000).with_description("Estilo Argentino"),
        Product::new("6", "Café Espresso", ProductCategory::Drinks, 6000).with_description("Intenso"),
        Product::new("7", "Cono Waffle", ProductCategory::Sizes, 2000).with_description("Crujiente"),
        Product::new("8", "Batido Oreo", ProductCategory::Drinks, 15000).with_description("Con crema"),
    ]
}
