// handlers/mod.rs - route table and shared state
//
// Public:  GET /, /health, category reads
// User:    /api/builds/* (JWT)
// Admin:   category mutations (JWT + admin role)

pub mod builds;
pub mod categories;

use axum::{
    http::{HeaderValue, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, SecurityConfig};
use crate::database::{BuildRepository, CategoryRepository, DatabaseManager, ProductRepository};
use crate::middleware::{jwt_auth_middleware, require_admin};
use crate::services::{BuildService, CategoryService, CompatibilityRules};

#[derive(Clone)]
pub struct AppState {
    pub categories: Arc<CategoryService>,
    pub builds: Arc<BuildService>,
    pub security: Arc<SecurityConfig>,
}

impl AppState {
    /// Wires the Postgres repositories into the services
    pub fn from_pool(pool: PgPool, config: &AppConfig) -> Self {
        let rules = Arc::new(CompatibilityRules::from_config(&config.builds));

        let categories = CategoryService::new(
            Arc::new(CategoryRepository::new(pool.clone())),
            config.api.max_tree_depth,
        );
        let builds = BuildService::new(
            Arc::new(BuildRepository::new(pool.clone(), rules.clone())),
            Arc::new(ProductRepository::new(pool)),
            &rules,
            config.builds.max_items,
        );

        Self {
            categories: Arc::new(categories),
            builds: Arc::new(builds),
            security: Arc::new(config.security.clone()),
        }
    }
}

pub fn app(state: AppState, config: &AppConfig) -> Router {
    let router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(category_routes(&state))
        .merge(build_routes(&state))
        .with_state(state);

    let router = if config.security.enable_cors {
        router.layer(cors_layer(&config.security.cors_origins))
    } else {
        router
    };

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn category_routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/api/categories", get(categories::list))
        .route("/api/categories/:id", get(categories::tree))
        .route("/api/categories/:id/children", get(categories::children))
        .route("/api/categories/:id/ancestors", get(categories::ancestors));

    let admin = Router::new()
        .route("/api/categories", post(categories::create))
        .route("/api/categories/:id", put(categories::update).delete(categories::delete))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    public.merge(admin)
}

fn build_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/builds", get(builds::list).post(builds::create))
        .route("/api/builds/compatible", post(builds::compatible))
        .route(
            "/api/builds/:id",
            get(builds::get).put(builds::update).delete(builds::delete),
        )
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::permissive().allow_origin(AllowOrigin::list(origins))
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Sanqa Suq API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Product category tree and custom PC builds",
            "endpoints": {
                "categories": "/api/categories[/:id[/children|/ancestors]] (public reads, admin writes)",
                "builds": "/api/builds[/:id] (authenticated)",
                "compatible": "/api/builds/compatible (authenticated)",
                "health": "/health (public)"
            }
        }
    }))
}

async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
