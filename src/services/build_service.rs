use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::auth::access;
use crate::database::build_repository::BuildStore;
use crate::database::models::{
    normalize_items, BuildPatch, BuildWithItems, CompatibleProduct, CompatibleProductsRequest, NewBuild, NewBuildItem,
};
use crate::database::product_repository::CatalogStore;
use crate::error::ApiError;
use crate::services::compatibility::{validate, CompatibilityRules};

pub fn parse_build_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("invalid build id '{}'", raw)))
}

pub struct BuildService {
    builds: Arc<dyn BuildStore>,
    catalog: Arc<dyn CatalogStore>,
    // Lookups judge partial builds, so required kinds are not enforced there.
    partial_rules: CompatibilityRules,
    max_items: usize,
}

impl BuildService {
    pub fn new(
        builds: Arc<dyn BuildStore>,
        catalog: Arc<dyn CatalogStore>,
        rules: &CompatibilityRules,
        max_items: usize,
    ) -> Self {
        let partial_rules = CompatibilityRules {
            required: Vec::new(),
            ..rules.clone()
        };
        Self {
            builds,
            catalog,
            partial_rules,
            max_items,
        }
    }

    fn check_name(name: &str) -> Result<String, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::bad_request("build name must not be empty"));
        }
        Ok(name.to_string())
    }

    fn check_items(&self, items: &[NewBuildItem]) -> Result<Vec<NewBuildItem>, ApiError> {
        let items = normalize_items(items)?;
        if items.len() > self.max_items {
            return Err(ApiError::bad_request(format!(
                "a build may contain at most {} different products",
                self.max_items
            )));
        }
        Ok(items)
    }

    pub async fn create_build(&self, user_id: Uuid, input: NewBuild) -> Result<BuildWithItems, ApiError> {
        let name = Self::check_name(&input.name)?;
        let items = self.check_items(&input.items)?;
        self.builds.create_build(user_id, &name, &items).await
    }

    pub async fn get_user_builds(&self, user_id: Uuid) -> Result<Vec<BuildWithItems>, ApiError> {
        self.builds.get_user_builds(user_id).await
    }

    pub async fn get_build(&self, build_id: &str, user_id: Uuid, role: &str) -> Result<BuildWithItems, ApiError> {
        let build_id = parse_build_id(build_id)?;
        let build = self.builds.get_build_by_id(build_id).await?;
        access::build_read(build.build.user_id, user_id, role).into_result()?;
        Ok(build)
    }

    pub async fn update_build(&self, build_id: &str, user_id: Uuid, patch: BuildPatch) -> Result<BuildWithItems, ApiError> {
        let build_id = parse_build_id(build_id)?;
        if patch.is_empty() {
            return Err(ApiError::bad_request("no fields to update"));
        }

        let patch = BuildPatch {
            name: patch.name.as_deref().map(Self::check_name).transpose()?,
            items: patch.items.as_deref().map(|items| self.check_items(items)).transpose()?,
        };
        self.builds.update_build(build_id, user_id, &patch).await
    }

    pub async fn delete_build(&self, build_id: &str, user_id: Uuid) -> Result<(), ApiError> {
        let build_id = parse_build_id(build_id)?;
        self.builds.delete_build(build_id, user_id).await
    }

    /// Products under the requested category that, added once to the
    /// selected products, still make a compatible (partial) build.
    pub async fn compatible_products(&self, request: CompatibleProductsRequest) -> Result<Vec<CompatibleProduct>, ApiError> {
        if request.category_id <= 0 {
            return Err(ApiError::bad_request(format!("invalid category id '{}'", request.category_id)));
        }

        let mut selected = request.selected_items;
        selected.sort_unstable();
        selected.dedup();
        let base: Vec<NewBuildItem> = selected
            .iter()
            .map(|&product_id| NewBuildItem { product_id, quantity: 1 })
            .collect();

        let candidates = self.catalog.products_in_subtree(request.category_id).await?;
        let mut ids = selected.clone();
        ids.extend(candidates.iter().map(|p| p.product_id));
        let catalog = self.catalog.catalog_for(&ids).await?;

        if !base.is_empty() {
            let verdict = validate(&base, &catalog, &self.partial_rules)?;
            if !verdict.is_compatible {
                return Err(ApiError::unprocessable_entity(verdict.message));
            }
        }

        let mut compatible = Vec::new();
        for candidate in candidates {
            let mut items = base.clone();
            items.push(NewBuildItem {
                product_id: candidate.product_id,
                quantity: 1,
            });
            let items = normalize_items(&items)?;
            if validate(&items, &catalog, &self.partial_rules)?.is_compatible {
                compatible.push(CompatibleProduct::from(candidate));
            }
        }

        debug!(
            category_id = request.category_id,
            selected = selected.len(),
            compatible = compatible.len(),
            "Resolved compatible products"
        );
        Ok(compatible)
    }
}
