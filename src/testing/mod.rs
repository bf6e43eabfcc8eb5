//! In-memory stores for service and router tests. They follow the same
//! contracts as the Postgres repositories, including "validate before
//! anything becomes visible" for build writes.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::auth::{self, Claims};
use crate::config::SecurityConfig;
use crate::database::build_repository::BuildStore;
use crate::database::category_repository::{check_tree_args, CategoryStore};
use crate::database::models::{
    normalize_items, BuildItem, BuildPatch, BuildWithItems, Category, CategoryNode, CategoryPatch, CustomBuild,
    NewBuildItem, ProductFacts,
};
use crate::database::product_repository::CatalogStore;
use crate::error::ApiError;
use crate::services::compatibility::{validate, Catalog, CompatibilityRules};
use crate::services::forest::CategoryForest;
use crate::services::pricing::total_price;

pub fn test_security() -> SecurityConfig {
    SecurityConfig {
        enable_cors: false,
        cors_origins: Vec::new(),
        jwt_secret: "test-secret".to_string(),
        jwt_issuer: "sanqa-suq-test".to_string(),
        jwt_expiry_hours: 1,
    }
}

/// `Authorization` header value for a freshly minted token.
pub fn bearer(user_id: Uuid, role: &str, security: &SecurityConfig) -> String {
    let claims = Claims::new(user_id, role, "tester@example.com", security);
    let token = auth::generate_jwt(&claims, security).expect("test token");
    format!("Bearer {}", token)
}

pub struct MemoryCategoryStore {
    rows: Mutex<Vec<Category>>,
}

impl MemoryCategoryStore {
    pub fn seeded(rows: &[(i32, &str, Option<i32>)]) -> Self {
        let rows = rows
            .iter()
            .map(|&(category_id, name, parent_category_id)| Category {
                category_id,
                name: name.to_string(),
                parent_category_id,
            })
            .collect();
        Self { rows: Mutex::new(rows) }
    }

    fn forest(&self) -> CategoryForest {
        CategoryForest::new(self.rows.lock().unwrap().clone())
    }
}

#[async_trait]
impl CategoryStore for MemoryCategoryStore {
    async fn get_all(&self) -> Result<Vec<Category>, ApiError> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by_key(|c| c.category_id);
        Ok(rows)
    }

    async fn insert(&self, name: &str, parent_id: Option<i32>) -> Result<Category, ApiError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(parent) = parent_id {
            if !rows.iter().any(|c| c.category_id == parent) {
                return Err(ApiError::internal_server_error("Failed to insert category"));
            }
        }
        let category = Category {
            category_id: rows.iter().map(|c| c.category_id).max().unwrap_or(0) + 1,
            name: name.to_string(),
            parent_category_id: parent_id,
        };
        rows.push(category.clone());
        Ok(category)
    }

    async fn get_by_id(&self, id: i32) -> Result<Category, ApiError> {
        self.forest()
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Category not found"))
    }

    async fn fetch_children(&self, id: i32) -> Result<Vec<Category>, ApiError> {
        let forest = self.forest();
        if !forest.contains(id) {
            return Err(ApiError::not_found("Category not found"));
        }
        Ok(forest.children(id).into_iter().cloned().collect())
    }

    async fn fetch_ancestors(&self, id: i32) -> Result<Vec<Category>, ApiError> {
        Ok(self.forest().lineage(id)?.into_iter().cloned().collect())
    }

    async fn fetch_descendants(&self, id: i32) -> Result<Vec<Category>, ApiError> {
        Ok(self.forest().descendants(id)?.into_iter().cloned().collect())
    }

    async fn fetch_tree(&self, id: i32, depth: i32) -> Result<CategoryNode, ApiError> {
        let levels = check_tree_args(id, depth)?;
        Ok(self.forest().subtree(id, levels)?)
    }

    async fn update(&self, id: i32, patch: &CategoryPatch) -> Result<Category, ApiError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|c| c.category_id == id)
            .ok_or_else(|| ApiError::not_found("Category not found"))?;
        if let Some(name) = &patch.name {
            row.name = name.clone();
        }
        if let Some(parent) = patch.parent_category_id {
            row.parent_category_id = parent;
        }
        Ok(row.clone())
    }

    async fn delete(&self, id: i32) -> Result<(), ApiError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|c| c.parent_category_id == Some(id)) {
            return Err(ApiError::conflict("category has subcategories"));
        }
        let before = rows.len();
        rows.retain(|c| c.category_id != id);
        if rows.len() == before {
            return Err(ApiError::not_found("Category not found"));
        }
        Ok(())
    }
}

pub struct MemoryCatalog {
    products: Vec<ProductFacts>,
    categories: Vec<Category>,
}

impl MemoryCatalog {
    pub fn new(products: Vec<ProductFacts>, categories: Vec<Category>) -> Self {
        Self { products, categories }
    }

    fn snapshot(&self, product_ids: &[i32]) -> Catalog {
        let products = self
            .products
            .iter()
            .filter(|p| product_ids.contains(&p.product_id))
            .cloned()
            .collect();
        Catalog::new(products, CategoryForest::new(self.categories.clone()))
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn catalog_for(&self, product_ids: &[i32]) -> Result<Catalog, ApiError> {
        Ok(self.snapshot(product_ids))
    }

    async fn products_in_subtree(&self, category_id: i32) -> Result<Vec<ProductFacts>, ApiError> {
        let forest = CategoryForest::new(self.categories.clone());
        let ids: Vec<i32> = forest
            .descendants(category_id)?
            .into_iter()
            .map(|c| c.category_id)
            .collect();
        let mut products: Vec<ProductFacts> = self
            .products
            .iter()
            .filter(|p| ids.contains(&p.category_id))
            .cloned()
            .collect();
        products.sort_by_key(|p| p.product_id);
        Ok(products)
    }
}

fn part(
    product_id: i32,
    category_id: i32,
    name: &str,
    brand: &str,
    price: Decimal,
    stock: i32,
    specs: &[(&str, &str)],
) -> ProductFacts {
    ProductFacts {
        product_id,
        name: name.to_string(),
        description: None,
        brand_name: brand.to_string(),
        category_id,
        category_name: String::new(),
        price: Some(price),
        stock_quantity: Some(stock),
        specs: specs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
    }
}

/// 1 Components
/// ├── 2 Motherboards: 201 (AM5), 202 (LGA1700)
/// ├── 3 CPUs: 101 (AM5)
/// └── 4 Memory: 301 (DDR5)
pub fn sample_catalog() -> MemoryCatalog {
    let category = |id: i32, name: &str, parent: Option<i32>| Category {
        category_id: id,
        name: name.to_string(),
        parent_category_id: parent,
    };
    let categories = vec![
        category(1, "Components", None),
        category(2, "Motherboards", Some(1)),
        category(3, "CPUs", Some(1)),
        category(4, "Memory", Some(1)),
    ];

    let mut products = vec![
        part(101, 3, "Ryzen 7 7700X", "AMD", Decimal::new(29900, 2), 5, &[
            ("socket", "AM5"),
            ("memory_type", "DDR5"),
            ("tdp", "105W"),
        ]),
        part(201, 2, "B650 Tomahawk", "MSI", Decimal::new(18999, 2), 3, &[
            ("socket", "AM5"),
            ("memory_type", "DDR5"),
            ("form_factor", "ATX"),
        ]),
        part(202, 2, "Z790 Prime", "ASUS", Decimal::new(20999, 2), 3, &[
            ("socket", "LGA1700"),
            ("memory_type", "DDR4/DDR5"),
            ("form_factor", "ATX"),
        ]),
        part(301, 4, "Vengeance 16GB", "Corsair", Decimal::new(4550, 2), 10, &[("memory_type", "DDR5")]),
    ];
    for product in &mut products {
        if let Some(c) = categories.iter().find(|c| c.category_id == product.category_id) {
            product.category_name = c.name.clone();
        }
    }

    MemoryCatalog::new(products, categories)
}

struct StoredBuild {
    header: CustomBuild,
    items: Vec<NewBuildItem>,
}

pub struct MemoryBuildStore {
    catalog: Arc<MemoryCatalog>,
    rules: CompatibilityRules,
    // Insertion order; newest last.
    builds: Mutex<Vec<StoredBuild>>,
}

impl MemoryBuildStore {
    pub fn new(catalog: Arc<MemoryCatalog>, rules: CompatibilityRules) -> Self {
        Self {
            catalog,
            rules,
            builds: Mutex::new(Vec::new()),
        }
    }

    /// Validates and prices staged items without touching stored state.
    fn stage(&self, items: &[NewBuildItem]) -> Result<Decimal, ApiError> {
        let ids: Vec<i32> = items.iter().map(|i| i.product_id).collect();
        let catalog = self.catalog.snapshot(&ids);
        let verdict = validate(items, &catalog, &self.rules)?;
        if !verdict.is_compatible {
            return Err(ApiError::unprocessable_entity(verdict.message));
        }
        total_price(items, &catalog).ok_or_else(|| ApiError::internal_server_error("Failed to compute build price"))
    }

    fn render(&self, stored: &StoredBuild) -> BuildWithItems {
        let ids: Vec<i32> = stored.items.iter().map(|i| i.product_id).collect();
        let catalog = self.catalog.snapshot(&ids);
        let items = stored
            .items
            .iter()
            .filter_map(|item| {
                let product = catalog.product(item.product_id)?;
                Some(BuildItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    product_name: product.name.clone(),
                    price: product.price.unwrap_or(Decimal::ZERO),
                    description: product.description.clone(),
                    brand_name: product.brand_name.clone(),
                    category_name: product.category_name.clone(),
                })
            })
            .collect();
        BuildWithItems {
            build: stored.header.clone(),
            items,
        }
    }
}

#[async_trait]
impl BuildStore for MemoryBuildStore {
    async fn create_build(&self, user_id: Uuid, name: &str, items: &[NewBuildItem]) -> Result<BuildWithItems, ApiError> {
        let items = normalize_items(items)?;
        let total = self.stage(&items)?;
        let stored = StoredBuild {
            header: CustomBuild {
                build_id: Uuid::new_v4(),
                user_id,
                name: name.to_string(),
                created_at: Utc::now(),
                total_price: total,
            },
            items,
        };
        let rendered = self.render(&stored);
        self.builds.lock().unwrap().push(stored);
        Ok(rendered)
    }

    async fn get_user_builds(&self, user_id: Uuid) -> Result<Vec<BuildWithItems>, ApiError> {
        let builds = self.builds.lock().unwrap();
        Ok(builds
            .iter()
            .rev()
            .filter(|b| b.header.user_id == user_id)
            .map(|b| self.render(b))
            .collect())
    }

    async fn get_build_by_id(&self, build_id: Uuid) -> Result<BuildWithItems, ApiError> {
        let builds = self.builds.lock().unwrap();
        builds
            .iter()
            .find(|b| b.header.build_id == build_id)
            .map(|b| self.render(b))
            .ok_or_else(|| ApiError::not_found("Build not found"))
    }

    async fn update_build(&self, build_id: Uuid, user_id: Uuid, patch: &BuildPatch) -> Result<BuildWithItems, ApiError> {
        let mut builds = self.builds.lock().unwrap();
        let stored = builds
            .iter_mut()
            .find(|b| b.header.build_id == build_id)
            .ok_or_else(|| ApiError::not_found("Build not found"))?;
        auth::access::build_write(stored.header.user_id, user_id).into_result()?;

        let staged = match &patch.items {
            Some(items) => {
                let items = normalize_items(items)?;
                let total = self.stage(&items)?;
                Some((items, total))
            }
            None => None,
        };

        if let Some(name) = &patch.name {
            stored.header.name = name.clone();
        }
        if let Some((items, total)) = staged {
            stored.items = items;
            stored.header.total_price = total;
        }
        Ok(self.render(stored))
    }

    async fn delete_build(&self, build_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
        let mut builds = self.builds.lock().unwrap();
        let index = builds
            .iter()
            .position(|b| b.header.build_id == build_id)
            .ok_or_else(|| ApiError::not_found("Build not found"))?;
        auth::access::build_write(builds[index].header.user_id, user_id).into_result()?;
        builds.remove(index);
        Ok(())
    }
}

/// Same category layout as [`sample_catalog`].
pub fn sample_categories() -> MemoryCategoryStore {
    MemoryCategoryStore::seeded(&[
        (1, "Components", None),
        (2, "Motherboards", Some(1)),
        (3, "CPUs", Some(1)),
        (4, "Memory", Some(1)),
    ])
}
