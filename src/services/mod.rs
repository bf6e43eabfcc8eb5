pub mod build_service;
pub mod category_service;
pub mod compatibility;
pub mod forest;
pub mod pricing;

pub use build_service::BuildService;
pub use category_service::CategoryService;
pub use compatibility::{Catalog, CompatibilityRules, ComponentKind, Verdict};
pub use forest::{CategoryForest, ForestError};
