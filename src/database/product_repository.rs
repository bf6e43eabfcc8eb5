use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;

use crate::database::models::{Category, ProductFacts, ProductRow, ProductSpecRow};
use crate::error::ApiError;
use crate::services::compatibility::Catalog;
use crate::services::forest::CategoryForest;

/// Read-only product lookups backing compatibility checks.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Snapshot holding the given products (unknown ids are simply absent)
    /// and the full category forest.
    async fn catalog_for(&self, product_ids: &[i32]) -> Result<Catalog, ApiError>;

    /// Products filed anywhere under `category_id`, ordered by id.
    async fn products_in_subtree(&self, category_id: i32) -> Result<Vec<ProductFacts>, ApiError>;
}

const PRODUCT_COLUMNS: &str = r#"
    SELECT p.product_id, p.name, p.description, b.name AS brand_name,
           p.category_id, c.name AS category_name, p.price, p.stock_quantity
    FROM products p
    JOIN brands b ON b.brand_id = p.brand_id
    JOIN categories c ON c.category_id = p.category_id
"#;

pub(crate) async fn load_forest(conn: &mut PgConnection) -> Result<CategoryForest, ApiError> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT category_id, name, parent_category_id FROM categories",
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| ApiError::internal("Failed to load category forest", e))?;
    Ok(CategoryForest::new(categories))
}

async fn attach_specs(conn: &mut PgConnection, rows: Vec<ProductRow>) -> Result<Vec<ProductFacts>, ApiError> {
    let ids: Vec<i32> = rows.iter().map(|r| r.product_id).collect();
    let spec_rows = sqlx::query_as::<_, ProductSpecRow>(
        "SELECT product_id, spec_name, spec_value FROM product_specs WHERE product_id = ANY($1)",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| ApiError::internal("Failed to load product specs", e))?;

    let mut specs: HashMap<i32, HashMap<String, String>> = HashMap::new();
    for spec in spec_rows {
        specs
            .entry(spec.product_id)
            .or_default()
            .insert(spec.spec_name, spec.spec_value);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let product_specs = specs.remove(&row.product_id).unwrap_or_default();
            row.into_facts(product_specs)
        })
        .collect())
}

/// Loads a catalog snapshot on `conn`. Build writes call this with their
/// open transaction so validation sees the same state they commit against.
pub(crate) async fn load_catalog(conn: &mut PgConnection, product_ids: &[i32]) -> Result<Catalog, ApiError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "{} WHERE p.product_id = ANY($1) ORDER BY p.product_id",
        PRODUCT_COLUMNS
    ))
    .bind(product_ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| ApiError::internal("Failed to load products", e))?;

    let products = attach_specs(conn, rows).await?;
    let forest = load_forest(conn).await?;
    Ok(Catalog::new(products, forest))
}

pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn connection(&self) -> Result<sqlx::pool::PoolConnection<sqlx::Postgres>, ApiError> {
        self.pool
            .acquire()
            .await
            .map_err(|e| ApiError::internal("Failed to acquire database connection", e))
    }
}

#[async_trait]
impl CatalogStore for ProductRepository {
    async fn catalog_for(&self, product_ids: &[i32]) -> Result<Catalog, ApiError> {
        let mut conn = self.connection().await?;
        load_catalog(&mut conn, product_ids).await
    }

    async fn products_in_subtree(&self, category_id: i32) -> Result<Vec<ProductFacts>, ApiError> {
        let mut conn = self.connection().await?;
        let forest = load_forest(&mut conn).await?;
        let category_ids: Vec<i32> = forest
            .descendants(category_id)?
            .into_iter()
            .map(|c| c.category_id)
            .collect();

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{} WHERE p.category_id = ANY($1) ORDER BY p.product_id",
            PRODUCT_COLUMNS
        ))
        .bind(&category_ids)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| ApiError::internal("Failed to load products", e))?;

        attach_specs(&mut conn, rows).await
    }
}
