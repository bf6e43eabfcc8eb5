use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};

use crate::database::models::{Category, CategoryNode, CategoryPatch};
use crate::error::ApiError;
use crate::services::forest::{CategoryForest, ForestError};

/// Storage for the category forest.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Category>, ApiError>;

    async fn insert(&self, name: &str, parent_id: Option<i32>) -> Result<Category, ApiError>;

    async fn get_by_id(&self, id: i32) -> Result<Category, ApiError>;

    /// Direct children only, ordered by id.
    async fn fetch_children(&self, id: i32) -> Result<Vec<Category>, ApiError>;

    /// `id` and its ancestors, nearest first.
    async fn fetch_ancestors(&self, id: i32) -> Result<Vec<Category>, ApiError>;

    /// `id` and everything below it.
    async fn fetch_descendants(&self, id: i32) -> Result<Vec<Category>, ApiError>;

    async fn fetch_tree(&self, id: i32, depth: i32) -> Result<CategoryNode, ApiError>;

    /// Applies the patch as-is. Cycle prevention is the caller's job.
    async fn update(&self, id: i32, patch: &CategoryPatch) -> Result<Category, ApiError>;

    /// Refuses to delete categories that still have children.
    async fn delete(&self, id: i32) -> Result<(), ApiError>;
}

pub fn check_tree_args(id: i32, depth: i32) -> Result<u32, ApiError> {
    if id <= 0 {
        return Err(ApiError::bad_request("category id must be a positive integer"));
    }
    u32::try_from(depth).map_err(|_| ApiError::bad_request("depth must be a non-negative integer"))
}

#[derive(Debug, FromRow)]
struct TraversalRow {
    category_id: i32,
    name: String,
    parent_category_id: Option<i32>,
    is_cycle: bool,
}

/// Turns recursive CTE rows into categories. A flagged row means the walk
/// re-entered a category already on its path.
fn collect_traversal(id: i32, rows: Vec<TraversalRow>) -> Result<Vec<Category>, ApiError> {
    if rows.is_empty() {
        return Err(ForestError::NotFound(id).into());
    }
    if let Some(row) = rows.iter().find(|r| r.is_cycle) {
        return Err(ForestError::Cycle(row.category_id).into());
    }
    Ok(rows
        .into_iter()
        .map(|r| Category {
            category_id: r.category_id,
            name: r.name,
            parent_category_id: r.parent_category_id,
        })
        .collect())
}

const ANCESTORS_SQL: &str = r#"
    WITH RECURSIVE lineage AS (
        SELECT category_id, name, parent_category_id, 0 AS depth,
               ARRAY[category_id] AS path, false AS is_cycle
        FROM categories
        WHERE category_id = $1
      UNION ALL
        SELECT c.category_id, c.name, c.parent_category_id, l.depth + 1,
               l.path || c.category_id, c.category_id = ANY(l.path)
        FROM categories c
        JOIN lineage l ON c.category_id = l.parent_category_id
        WHERE NOT l.is_cycle
    )
    SELECT category_id, name, parent_category_id, is_cycle
    FROM lineage
    ORDER BY depth
"#;

// $2 bounds the walk; NULL means unbounded.
const DESCENDANTS_SQL: &str = r#"
    WITH RECURSIVE subtree AS (
        SELECT category_id, name, parent_category_id, 0 AS depth,
               ARRAY[category_id] AS path, false AS is_cycle
        FROM categories
        WHERE category_id = $1
      UNION ALL
        SELECT c.category_id, c.name, c.parent_category_id, s.depth + 1,
               s.path || c.category_id, c.category_id = ANY(s.path)
        FROM categories c
        JOIN subtree s ON c.parent_category_id = s.category_id
        WHERE NOT s.is_cycle
          AND ($2::int4 IS NULL OR s.depth < $2)
    )
    SELECT category_id, name, parent_category_id, is_cycle
    FROM subtree
    ORDER BY depth, category_id
"#;

pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn walk_down(&self, id: i32, depth: Option<i32>) -> Result<Vec<Category>, ApiError> {
        let rows = sqlx::query_as::<_, TraversalRow>(DESCENDANTS_SQL)
            .bind(id)
            .bind(depth)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ApiError::internal("Failed to fetch category descendants", e))?;
        collect_traversal(id, rows)
    }
}

#[async_trait]
impl CategoryStore for CategoryRepository {
    async fn get_all(&self) -> Result<Vec<Category>, ApiError> {
        sqlx::query_as::<_, Category>(
            "SELECT category_id, name, parent_category_id FROM categories ORDER BY category_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch categories", e))
    }

    async fn insert(&self, name: &str, parent_id: Option<i32>) -> Result<Category, ApiError> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, parent_category_id)
             VALUES ($1, $2)
             RETURNING category_id, name, parent_category_id",
        )
        .bind(name)
        .bind(parent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ApiError::internal("Failed to insert category", e))?;

        info!(category_id = category.category_id, "Created category '{}'", category.name);
        Ok(category)
    }

    async fn get_by_id(&self, id: i32) -> Result<Category, ApiError> {
        sqlx::query_as::<_, Category>(
            "SELECT category_id, name, parent_category_id FROM categories WHERE category_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch category", e))?
        .ok_or_else(|| ApiError::not_found("Category not found"))
    }

    async fn fetch_children(&self, id: i32) -> Result<Vec<Category>, ApiError> {
        let children = sqlx::query_as::<_, Category>(
            "SELECT category_id, name, parent_category_id
             FROM categories
             WHERE parent_category_id = $1
             ORDER BY category_id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch category children", e))?;

        if children.is_empty() {
            // Distinguish a leaf from a missing category
            self.get_by_id(id).await?;
        }
        Ok(children)
    }

    async fn fetch_ancestors(&self, id: i32) -> Result<Vec<Category>, ApiError> {
        let rows = sqlx::query_as::<_, TraversalRow>(ANCESTORS_SQL)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ApiError::internal("Failed to fetch category ancestors", e))?;
        collect_traversal(id, rows)
    }

    async fn fetch_descendants(&self, id: i32) -> Result<Vec<Category>, ApiError> {
        self.walk_down(id, None).await
    }

    async fn fetch_tree(&self, id: i32, depth: i32) -> Result<CategoryNode, ApiError> {
        let levels = check_tree_args(id, depth)?;
        let rows = self.walk_down(id, Some(depth)).await?;
        debug!(category_id = id, depth, nodes = rows.len(), "Materializing category tree");

        let tree = CategoryForest::new(rows).subtree(id, levels)?;
        Ok(tree)
    }

    async fn update(&self, id: i32, patch: &CategoryPatch) -> Result<Category, ApiError> {
        let (move_parent, parent_id) = match patch.parent_category_id {
            Some(parent) => (true, parent),
            None => (false, None),
        };

        let category = sqlx::query_as::<_, Category>(
            "UPDATE categories
             SET name = COALESCE($2, name),
                 parent_category_id = CASE WHEN $3 THEN $4 ELSE parent_category_id END
             WHERE category_id = $1
             RETURNING category_id, name, parent_category_id",
        )
        .bind(id)
        .bind(patch.name.as_deref())
        .bind(move_parent)
        .bind(parent_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ApiError::internal("Failed to update category", e))?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

        info!(category_id = id, parent = ?category.parent_category_id, "Updated category");
        Ok(category)
    }

    async fn delete(&self, id: i32) -> Result<(), ApiError> {
        let has_children: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM categories WHERE parent_category_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ApiError::internal("Failed to delete category", e))?;

        if has_children {
            return Err(ApiError::conflict("category has subcategories"));
        }

        let result = sqlx::query("DELETE FROM categories WHERE category_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                    ApiError::conflict("category is still referenced by products or subcategories")
                }
                e => ApiError::internal("Failed to delete category", e),
            })?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("Category not found"));
        }

        info!(category_id = id, "Deleted category");
        Ok(())
    }
}
