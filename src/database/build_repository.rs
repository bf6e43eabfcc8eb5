use async_trait::async_trait;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::access;
use crate::database::models::{normalize_items, BuildItem, BuildPatch, BuildWithItems, CustomBuild, NewBuildItem};
use crate::database::product_repository::load_catalog;
use crate::error::ApiError;
use crate::services::compatibility::{validate, CompatibilityRules};
use crate::services::pricing::total_price;

/// Storage for custom builds. Every write runs in one transaction that
/// validates the staged items before committing.
#[async_trait]
pub trait BuildStore: Send + Sync {
    async fn create_build(&self, user_id: Uuid, name: &str, items: &[NewBuildItem]) -> Result<BuildWithItems, ApiError>;

    /// Newest first.
    async fn get_user_builds(&self, user_id: Uuid) -> Result<Vec<BuildWithItems>, ApiError>;

    async fn get_build_by_id(&self, build_id: Uuid) -> Result<BuildWithItems, ApiError>;

    async fn update_build(&self, build_id: Uuid, user_id: Uuid, patch: &BuildPatch) -> Result<BuildWithItems, ApiError>;

    async fn delete_build(&self, build_id: Uuid, user_id: Uuid) -> Result<(), ApiError>;
}

#[derive(Debug, FromRow)]
struct BuildItemRow {
    build_id: Uuid,
    #[sqlx(flatten)]
    item: BuildItem,
}

const HEADER_COLUMNS: &str = "SELECT build_id, user_id, name, created_at, total_price FROM custom_builds";

const ITEMS_SQL: &str = r#"
    SELECT bi.build_id, bi.product_id, bi.quantity,
           p.name AS product_name, COALESCE(p.price, 0) AS price, p.description,
           b.name AS brand_name, c.name AS category_name
    FROM build_items bi
    JOIN products p ON p.product_id = bi.product_id
    JOIN brands b ON b.brand_id = p.brand_id
    JOIN categories c ON c.category_id = p.category_id
    WHERE bi.build_id = ANY($1)
    ORDER BY bi.build_id, bi.product_id
"#;

pub struct BuildRepository {
    pool: PgPool,
    rules: Arc<CompatibilityRules>,
}

impl BuildRepository {
    pub fn new(pool: PgPool, rules: Arc<CompatibilityRules>) -> Self {
        Self { pool, rules }
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, ApiError> {
        self.pool
            .begin()
            .await
            .map_err(|e| ApiError::internal("Failed to begin transaction", e))
    }

    async fn attach_items(&self, builds: Vec<CustomBuild>) -> Result<Vec<BuildWithItems>, ApiError> {
        let ids: Vec<Uuid> = builds.iter().map(|b| b.build_id).collect();
        let rows = sqlx::query_as::<_, BuildItemRow>(ITEMS_SQL)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ApiError::internal("Failed to fetch build items", e))?;

        let mut items: HashMap<Uuid, Vec<BuildItem>> = HashMap::new();
        for row in rows {
            items.entry(row.build_id).or_default().push(row.item);
        }

        Ok(builds
            .into_iter()
            .map(|build| BuildWithItems {
                items: items.remove(&build.build_id).unwrap_or_default(),
                build,
            })
            .collect())
    }

    /// Validates the staged items against the catalog as seen by `conn`,
    /// then stores the computed total on the header.
    async fn validate_and_price(
        &self,
        conn: &mut PgConnection,
        build_id: Uuid,
        items: &[NewBuildItem],
    ) -> Result<(), ApiError> {
        let ids: Vec<i32> = items.iter().map(|i| i.product_id).collect();
        let catalog = load_catalog(conn, &ids).await?;

        let verdict = validate(items, &catalog, &self.rules)?;
        if !verdict.is_compatible {
            warn!(%build_id, issues = verdict.issues.len(), "Rejected incompatible build");
            return Err(ApiError::unprocessable_entity(verdict.message));
        }

        let total = total_price(items, &catalog)
            .ok_or_else(|| ApiError::internal_server_error("Failed to compute build price"))?;

        sqlx::query("UPDATE custom_builds SET total_price = $2 WHERE build_id = $1")
            .bind(build_id)
            .bind(total)
            .execute(&mut *conn)
            .await
            .map_err(|e| ApiError::internal("Failed to update build price", e))?;
        Ok(())
    }

    /// Locks the header row and checks that `user_id` may change it.
    async fn lock_owned(&self, conn: &mut PgConnection, build_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
        let owner: Option<Uuid> =
            sqlx::query_scalar("SELECT user_id FROM custom_builds WHERE build_id = $1 FOR UPDATE")
                .bind(build_id)
                .fetch_optional(&mut *conn)
                .await
                .map_err(|e| ApiError::internal("Failed to fetch build", e))?;

        let owner = owner.ok_or_else(|| ApiError::not_found("Build not found"))?;
        access::build_write(owner, user_id).into_result()
    }
}

async fn insert_items(conn: &mut PgConnection, build_id: Uuid, items: &[NewBuildItem]) -> Result<(), ApiError> {
    let product_ids: Vec<i32> = items.iter().map(|i| i.product_id).collect();
    let quantities: Vec<i32> = items.iter().map(|i| i.quantity).collect();

    sqlx::query(
        "INSERT INTO build_items (build_id, product_id, quantity)
         SELECT $1, product_id, quantity
         FROM UNNEST($2::int4[], $3::int4[]) AS staged(product_id, quantity)",
    )
    .bind(build_id)
    .bind(&product_ids)
    .bind(&quantities)
    .execute(&mut *conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
            ApiError::unprocessable_entity("build references a product that does not exist")
        }
        e => ApiError::internal("Failed to insert build items", e),
    })?;
    Ok(())
}

#[async_trait]
impl BuildStore for BuildRepository {
    async fn create_build(&self, user_id: Uuid, name: &str, items: &[NewBuildItem]) -> Result<BuildWithItems, ApiError> {
        let items = normalize_items(items)?;
        let mut tx = self.begin().await?;

        let build_id: Uuid = sqlx::query_scalar(
            "INSERT INTO custom_builds (user_id, name) VALUES ($1, $2) RETURNING build_id",
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| ApiError::internal("Failed to create build", e))?;

        insert_items(&mut tx, build_id, &items).await?;
        self.validate_and_price(&mut tx, build_id, &items).await?;

        tx.commit()
            .await
            .map_err(|e| ApiError::internal("Failed to commit build", e))?;

        info!(%build_id, %user_id, items = items.len(), "Created build");
        self.get_build_by_id(build_id).await
    }

    async fn get_user_builds(&self, user_id: Uuid) -> Result<Vec<BuildWithItems>, ApiError> {
        let builds = sqlx::query_as::<_, CustomBuild>(&format!(
            "{} WHERE user_id = $1 ORDER BY created_at DESC, build_id",
            HEADER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch builds", e))?;

        self.attach_items(builds).await
    }

    async fn get_build_by_id(&self, build_id: Uuid) -> Result<BuildWithItems, ApiError> {
        let build = sqlx::query_as::<_, CustomBuild>(&format!("{} WHERE build_id = $1", HEADER_COLUMNS))
            .bind(build_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ApiError::internal("Failed to fetch build", e))?
            .ok_or_else(|| ApiError::not_found("Build not found"))?;

        let mut builds = self.attach_items(vec![build]).await?;
        builds
            .pop()
            .ok_or_else(|| ApiError::internal_server_error("Failed to fetch build"))
    }

    async fn update_build(&self, build_id: Uuid, user_id: Uuid, patch: &BuildPatch) -> Result<BuildWithItems, ApiError> {
        let items = patch.items.as_deref().map(normalize_items).transpose()?;
        let mut tx = self.begin().await?;
        self.lock_owned(&mut tx, build_id, user_id).await?;

        if let Some(name) = &patch.name {
            sqlx::query("UPDATE custom_builds SET name = $2 WHERE build_id = $1")
                .bind(build_id)
                .bind(name)
                .execute(&mut *tx)
                .await
                .map_err(|e| ApiError::internal("Failed to rename build", e))?;
        }

        if let Some(items) = &items {
            sqlx::query("DELETE FROM build_items WHERE build_id = $1")
                .bind(build_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| ApiError::internal("Failed to replace build items", e))?;

            insert_items(&mut tx, build_id, items).await?;
            self.validate_and_price(&mut tx, build_id, items).await?;
        }

        tx.commit()
            .await
            .map_err(|e| ApiError::internal("Failed to commit build", e))?;

        info!(%build_id, replaced_items = items.is_some(), "Updated build");
        self.get_build_by_id(build_id).await
    }

    async fn delete_build(&self, build_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
        let mut tx = self.begin().await?;
        self.lock_owned(&mut tx, build_id, user_id).await?;

        // build_items go with the header (ON DELETE CASCADE)
        sqlx::query("DELETE FROM custom_builds WHERE build_id = $1")
            .bind(build_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| ApiError::internal("Failed to delete build", e))?;

        tx.commit()
            .await
            .map_err(|e| ApiError::internal("Failed to commit build deletion", e))?;

        info!(%build_id, "Deleted build");
        Ok(())
    }
}
