use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

/// Ingredients arrive either as a list or as one comma separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IngredientsInput {
    List(Vec<String>),
    Text(String),
}

impl IngredientsInput {
    pub fn into_list(self) -> Vec<String> {
        let items: Vec<String> = match self {
            IngredientsInput::List(items) => items,
            IngredientsInput::Text(text) => text.split(',').map(str::to_string).collect(),
        };
        items
            .into_iter()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRecipeRequest {
    #[serde(default)]
    pub ingredients: Option<IngredientsInput>,
}

/// Recipe exactly as the generator described it; `ingredients` are the ones
/// used and `missing_ingredients` the ones the cook still has to buy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedRecipe {
    pub title: String,
    pub ingredients: Vec<String>,
    pub missing_ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub nutrition: Map<String, Value>,
    pub time: Option<String>,
    pub difficulty: Option<String>,
    pub servings: Option<u32>,
}

/// Unchecked generator output; every field may be absent or null.
#[derive(Debug, Default, Deserialize)]
pub struct RawRecipe {
    pub title: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub missing_ingredients: Option<Vec<String>>,
    pub steps: Option<Vec<String>>,
    pub nutrition: Option<Map<String, Value>>,
    pub time: Option<Value>,
    pub difficulty: Option<Value>,
    pub servings: Option<Value>,
}

/// One entry of `GET /api/history`.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub title: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub nutrition: Map<String, Value>,
    pub time: Option<String>,
    pub difficulty: Option<String>,
    pub servings: Option<i32>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
