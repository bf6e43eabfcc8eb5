use std::sync::Arc;
use tracing::warn;

use crate::database::category_repository::CategoryStore;
use crate::database::models::{Category, CategoryNode, CategoryPatch, NewCategory};
use crate::error::ApiError;

/// Parses a category id taken from a path segment.
pub fn parse_category_id(raw: &str) -> Result<i32, ApiError> {
    match raw.trim().parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::bad_request(format!("invalid category id '{}'", raw))),
    }
}

fn clean_name(name: &str) -> Result<String, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("category name must not be empty"));
    }
    Ok(name.to_string())
}

pub struct CategoryService {
    store: Arc<dyn CategoryStore>,
    max_tree_depth: i32,
}

impl CategoryService {
    pub fn new(store: Arc<dyn CategoryStore>, max_tree_depth: i32) -> Self {
        Self { store, max_tree_depth }
    }

    pub async fn get_all_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.store.get_all().await
    }

    pub async fn create_category(&self, input: NewCategory) -> Result<Category, ApiError> {
        let name = clean_name(&input.name)?;
        if let Some(parent_id) = input.parent_category_id {
            self.require_parent(parent_id).await?;
        }
        self.store.insert(&name, input.parent_category_id).await
    }

    pub async fn get_category(&self, id: &str) -> Result<Category, ApiError> {
        let id = parse_category_id(id)?;
        self.store.get_by_id(id).await
    }

    /// `depth` defaults to 0, the bare node.
    pub async fn get_category_tree(&self, id: &str, depth: Option<&str>) -> Result<CategoryNode, ApiError> {
        let id = parse_category_id(id)?;
        let depth = match depth {
            None => 0,
            Some(raw) => raw
                .trim()
                .parse::<i32>()
                .ok()
                .filter(|d| *d >= 0)
                .ok_or_else(|| ApiError::bad_request(format!("invalid depth '{}'", raw)))?,
        };
        if depth > self.max_tree_depth {
            return Err(ApiError::bad_request(format!(
                "depth must not exceed {}",
                self.max_tree_depth
            )));
        }
        self.store.fetch_tree(id, depth).await
    }

    pub async fn get_category_children(&self, id: &str) -> Result<Vec<Category>, ApiError> {
        let id = parse_category_id(id)?;
        self.store.fetch_children(id).await
    }

    pub async fn get_category_ancestors(&self, id: &str) -> Result<Vec<Category>, ApiError> {
        let id = parse_category_id(id)?;
        self.store.fetch_ancestors(id).await
    }

    pub async fn update_category(&self, id: &str, mut patch: CategoryPatch) -> Result<Category, ApiError> {
        let id = parse_category_id(id)?;
        if patch.is_empty() {
            return Err(ApiError::bad_request("no fields to update"));
        }
        if let Some(name) = &patch.name {
            patch.name = Some(clean_name(name)?);
        }

        if let Some(Some(parent_id)) = patch.parent_category_id {
            if parent_id == id {
                return Err(ApiError::bad_request("category cannot be its own parent"));
            }
            // Existence of `id` itself is checked here too: descendants of a
            // missing category is NotFound.
            let subtree = self.store.fetch_descendants(id).await?;
            if subtree.iter().any(|c| c.category_id == parent_id) {
                warn!(category_id = id, parent_id, "Rejected reparent under own descendant");
                return Err(ApiError::bad_request("parent cannot be a descendant of the category"));
            }
            self.require_parent(parent_id).await?;
        }

        self.store.update(id, &patch).await
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), ApiError> {
        let id = parse_category_id(id)?;
        self.store.delete(id).await
    }

    async fn require_parent(&self, parent_id: i32) -> Result<(), ApiError> {
        match self.store.get_by_id(parent_id).await {
            Ok(_) => Ok(()),
            Err(ApiError::NotFound(_)) => Err(ApiError::bad_request(format!(
                "parent category {} does not exist",
                parent_id
            ))),
            Err(e) => Err(e),
        }
    }
}
