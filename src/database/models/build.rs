use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::ApiError;

/// Header row of `custom_builds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CustomBuild {
    pub build_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub total_price: Decimal,
}

/// A build line joined with its product, brand and category display fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BuildItem {
    pub product_id: i32,
    pub quantity: i32,
    pub product_name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub brand_name: String,
    pub category_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildWithItems {
    #[serde(flatten)]
    pub build: CustomBuild,
    pub items: Vec<BuildItem>,
}

/// A requested line, before it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBuildItem {
    pub product_id: i32,
    pub quantity: i32,
}

/// Rejects empty lists and non-positive quantities, then merges repeated
/// product ids by summing their quantities. Output is ordered by product id.
pub fn normalize_items(items: &[NewBuildItem]) -> Result<Vec<NewBuildItem>, ApiError> {
    if items.is_empty() {
        return Err(ApiError::bad_request("build must contain at least one item"));
    }

    let mut merged: BTreeMap<i32, i32> = BTreeMap::new();
    for item in items {
        if item.quantity < 1 {
            return Err(ApiError::bad_request(format!(
                "quantity for product {} must be at least 1",
                item.product_id
            )));
        }
        let quantity = merged.entry(item.product_id).or_insert(0);
        *quantity = quantity
            .checked_add(item.quantity)
            .ok_or_else(|| ApiError::bad_request("quantity is too large"))?;
    }

    Ok(merged
        .into_iter()
        .map(|(product_id, quantity)| NewBuildItem { product_id, quantity })
        .collect())
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBuild {
    pub name: String,
    pub items: Vec<NewBuildItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<NewBuildItem>>,
}

impl BuildPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.items.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompatibleProductsRequest {
    pub category_id: i32,
    #[serde(default)]
    pub selected_items: Vec<i32>,
}
