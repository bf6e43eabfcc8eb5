use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use std::collections::HashMap;

/// Read-only view of a product with everything compatibility checks and
/// build listings need.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductFacts {
    pub product_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub brand_name: String,
    pub category_id: i32,
    pub category_name: String,
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub specs: HashMap<String, String>,
}

impl ProductFacts {
    pub fn spec(&self, name: &str) -> Option<&str> {
        self.specs.get(name).map(String::as_str)
    }

    /// Numeric spec value, tolerating unit suffixes such as `650W` or `320mm`.
    pub fn spec_number(&self, name: &str) -> Option<f64> {
        let raw = self.spec(name)?.trim();
        let end = raw
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(raw.len());
        raw[..end].parse().ok()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub product_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub brand_name: String,
    pub category_id: i32,
    pub category_name: String,
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProductSpecRow {
    pub product_id: i32,
    pub spec_name: String,
    pub spec_value: String,
}

impl ProductRow {
    pub fn into_facts(self, specs: HashMap<String, String>) -> ProductFacts {
        ProductFacts {
            product_id: self.product_id,
            name: self.name,
            description: self.description,
            brand_name: self.brand_name,
            category_id: self.category_id,
            category_name: self.category_name,
            price: self.price,
            stock_quantity: self.stock_quantity,
            specs,
        }
    }
}

/// Product offered by the compatible-products lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompatibleProduct {
    pub product_id: i32,
    pub product_name: String,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub brand_name: String,
    pub category_name: String,
    pub specs: HashMap<String, String>,
}

impl From<ProductFacts> for CompatibleProduct {
    fn from(facts: ProductFacts) -> Self {
        Self {
            product_id: facts.product_id,
            product_name: facts.name,
            price: facts.price,
            description: facts.description,
            brand_name: facts.brand_name,
            category_name: facts.category_name,
            specs: facts.specs,
        }
    }
}
