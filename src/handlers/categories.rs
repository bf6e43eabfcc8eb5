use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::database::models::{Category, CategoryNode, CategoryPatch, NewCategory};
use crate::handlers::AppState;
use crate::middleware::{ApiResponse, ApiResult, ValidJson};

#[derive(Debug, Deserialize)]
pub struct TreeQuery {
    /// Levels below the requested category; 0 returns the bare node.
    pub depth: Option<String>,
    /// Older clients send the depth as `limit`.
    pub limit: Option<String>,
}

/// GET /api/categories
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    let categories = state.categories.get_all_categories().await?;
    Ok(ApiResponse::success(categories))
}

/// POST /api/categories (admin)
pub async fn create(State(state): State<AppState>, ValidJson(input): ValidJson<NewCategory>) -> ApiResult<Category> {
    let category = state.categories.create_category(input).await?;
    Ok(ApiResponse::created(category))
}

/// GET /api/categories/:id?depth=N
pub async fn tree(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TreeQuery>,
) -> ApiResult<CategoryNode> {
    let depth = query.depth.as_deref().or(query.limit.as_deref());
    let tree = state.categories.get_category_tree(&id, depth).await?;
    Ok(ApiResponse::success(tree))
}

/// GET /api/categories/:id/children
pub async fn children(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Vec<Category>> {
    let children = state.categories.get_category_children(&id).await?;
    Ok(ApiResponse::success(children))
}

/// GET /api/categories/:id/ancestors
pub async fn ancestors(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Vec<Category>> {
    let ancestors = state.categories.get_category_ancestors(&id).await?;
    Ok(ApiResponse::success(ancestors))
}

/// PUT /api/categories/:id (admin)
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(patch): ValidJson<CategoryPatch>,
) -> ApiResult<Category> {
    let category = state.categories.update_category(&id, patch).await?;
    Ok(ApiResponse::success(category))
}

/// DELETE /api/categories/:id (admin)
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.categories.delete_category(&id).await?;
    Ok(ApiResponse::no_content())
}
