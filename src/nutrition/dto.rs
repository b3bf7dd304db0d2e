use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ingredients as a comma separated string or a list of any JSON values.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IngredientsInput {
    List(Vec<Value>),
    Text(String),
}

impl IngredientsInput {
    /// Text entries that are blank are dropped; list entries are all kept,
    /// with non-strings rendered as JSON, so each one is charged a portion.
    pub fn into_items(self) -> Vec<String> {
        match self {
            IngredientsInput::Text(text) => text
                .split(',')
                .map(str::trim)
                .filter(|i| !i.is_empty())
                .map(str::to_string)
                .collect(),
            IngredientsInput::List(items) => items
                .into_iter()
                .map(|v| match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NutritionRequest {
    #[serde(default)]
    pub ingredients: Option<IngredientsInput>,
    #[serde(default)]
    pub servings: Option<i64>,
    #[serde(default)]
    pub recipe: Option<RecipeInput>,
}

/// A whole recipe object may be posted instead of bare ingredients.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeInput {
    #[serde(default)]
    pub ingredients: Option<IngredientsInput>,
    #[serde(default)]
    pub servings: Option<i64>,
}

/// Per-serving estimate; macros are rendered like `"17.3g"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Nutrition {
    pub calories: i64,
    pub protein: String,
    pub fat: String,
    pub carbs: String,
}

#[derive(Debug, Serialize)]
pub struct NutritionResponse {
    pub nutrition: Nutrition,
    pub servings: i64,
}
