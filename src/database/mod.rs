pub mod build_repository;
pub mod category_repository;
pub mod manager;
pub mod models;
pub mod product_repository;

pub use build_repository::{BuildRepository, BuildStore};
pub use category_repository::{CategoryRepository, CategoryStore};
pub use manager::{DatabaseError, DatabaseManager};
pub use product_repository::{CatalogStore, ProductRepository};
