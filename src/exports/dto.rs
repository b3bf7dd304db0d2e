use serde::Deserialize;
use serde_json::{Map, Value};

fn default_title() -> String {
    "Recipe".to_string()
}

/// Body of `POST /api/export_pdf`; every field is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeDocument {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub nutrition: Map<String, Value>,
}
