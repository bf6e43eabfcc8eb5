pub mod build;
pub mod category;
pub mod product;

pub use build::{
    normalize_items, BuildItem, BuildPatch, BuildWithItems, CompatibleProductsRequest, CustomBuild, NewBuild,
    NewBuildItem,
};
pub use category::{Category, CategoryNode, CategoryPatch, NewCategory};
pub use product::{CompatibleProduct, ProductFacts, ProductRow, ProductSpecRow};
