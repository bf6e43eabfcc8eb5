use axum::extract::{Extension, Path, State};

use crate::database::models::{BuildPatch, BuildWithItems, CompatibleProduct, CompatibleProductsRequest, NewBuild};
use crate::handlers::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidJson};

/// POST /api/builds
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidJson(input): ValidJson<NewBuild>,
) -> ApiResult<BuildWithItems> {
    let build = state.builds.create_build(user.user_id, input).await?;
    Ok(ApiResponse::created(build))
}

/// GET /api/builds - the caller's builds, newest first
pub async fn list(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Vec<BuildWithItems>> {
    let builds = state.builds.get_user_builds(user.user_id).await?;
    Ok(ApiResponse::success(builds))
}

/// GET /api/builds/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<BuildWithItems> {
    let build = state.builds.get_build(&id, user.user_id, &user.role).await?;
    Ok(ApiResponse::success(build))
}

/// PUT /api/builds/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidJson(patch): ValidJson<BuildPatch>,
) -> ApiResult<BuildWithItems> {
    let build = state.builds.update_build(&id, user.user_id, patch).await?;
    Ok(ApiResponse::success(build))
}

/// DELETE /api/builds/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.builds.delete_build(&id, user.user_id).await?;
    Ok(ApiResponse::no_content())
}

/// POST /api/builds/compatible
pub async fn compatible(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CompatibleProductsRequest>,
) -> ApiResult<Vec<CompatibleProduct>> {
    let products = state.builds.compatible_products(request).await?;
    Ok(ApiResponse::success(products))
}
