pub mod auth;
pub mod extract;
pub mod response;

pub use auth::{jwt_auth_middleware, require_admin, AuthUser};
pub use extract::ValidJson;
pub use response::{ApiResponse, ApiResult};
