use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// Row of the `categories` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub category_id: i32,
    pub name: String,
    pub parent_category_id: Option<i32>,
}

/// Tree-shaped projection of a category, built per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryNode {
    pub category_id: i32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_category_id: Option<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CategoryNode>,
}

impl From<Category> for CategoryNode {
    fn from(category: Category) -> Self {
        Self {
            category_id: category.category_id,
            name: category.name,
            parent_category_id: category.parent_category_id,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub parent_category_id: Option<i32>,
}

/// Partial update. `parent_category_id` distinguishes "absent" (unchanged)
/// from `null` (move to the root of the forest).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_category_id: Option<Option<i32>>,
}

impl CategoryPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent_category_id.is_none()
    }
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<i32>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i32>::deserialize(deserializer).map(Some)
}
