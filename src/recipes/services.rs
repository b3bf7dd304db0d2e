use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{
    dto::{GeneratedRecipe, RawRecipe, RecipeSummary},
    generator::{GenerationError, RecipeGenerator},
    repo::RecipeStore,
    repo_types::NewRecipe,
};
use crate::error::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    #[error("Please enter at least one ingredient.")]
    MissingIngredients,
    #[error("Recipe generation failed. Try again later.")]
    GenerationFailed(#[from] GenerationError),
    #[error("Could not save recipe.")]
    PersistenceFailed(#[source] anyhow::Error),
}

impl From<RecipeError> for ApiError {
    fn from(e: RecipeError) -> Self {
        match &e {
            RecipeError::MissingIngredients => ApiError::validation(e.to_string()),
            RecipeError::GenerationFailed(cause) => {
                error!(error = %cause, "recipe generation failed");
                ApiError::Upstream(e.to_string())
            }
            RecipeError::PersistenceFailed(cause) => {
                error!(error = ?cause, "recipe persistence failed");
                ApiError::Storage(e.to_string())
            }
        }
    }
}

/// Remove a leading markdown fence line and a trailing fence, each when present.
pub(crate) fn strip_code_fence(raw: &str) -> &str {
    lazy_static! {
        static ref OPEN_FENCE_RE: Regex = Regex::new(r"^```[A-Za-z0-9_-]*").unwrap();
        static ref CLOSE_FENCE_RE: Regex = Regex::new(r"```$").unwrap();
    }
    let trimmed = raw.trim();
    let body = OPEN_FENCE_RE
        .find(trimmed)
        .map_or(trimmed, |m| &trimmed[m.end()..]);
    let body = CLOSE_FENCE_RE
        .find(body)
        .map_or(body, |m| &body[..m.start()]);
    body.trim()
}

/// Decode generator text and check it against the recipe schema.
pub(crate) fn parse_recipe(raw: &str) -> Result<GeneratedRecipe, GenerationError> {
    let raw: RawRecipe = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| GenerationError::Parse(e.to_string()))?;

    let title = raw
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| GenerationError::Schema("title".into()))?;
    let ingredients = non_empty_list(raw.ingredients)
        .ok_or_else(|| GenerationError::Schema("ingredients".into()))?;
    let steps =
        non_empty_list(raw.steps).ok_or_else(|| GenerationError::Schema("steps".into()))?;
    let servings = match raw.servings {
        None | Some(Value::Null) => None,
        Some(v) => {
            let parsed = positive_servings(&v);
            if parsed.is_none() {
                debug!(servings = %v, "servings not a positive integer; dropped");
            }
            parsed
        }
    };

    Ok(GeneratedRecipe {
        title,
        ingredients,
        missing_ingredients: raw.missing_ingredients.unwrap_or_default(),
        steps,
        nutrition: raw.nutrition.unwrap_or_default(),
        time: raw.time.and_then(text_value),
        difficulty: raw.difficulty.and_then(text_value),
        servings,
    })
}

fn non_empty_list(items: Option<Vec<String>>) -> Option<Vec<String>> {
    items.filter(|list| list.iter().any(|i| !i.trim().is_empty()))
}

fn text_value(v: Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn positive_servings(v: &Value) -> Option<u32> {
    let n = match v {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    u32::try_from(n).ok().filter(|n| *n > 0)
}

/// Used and missing ingredients as one deduplicated list, first occurrence wins.
pub(crate) fn merge_ingredients(used: &[String], missing: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    used.iter()
        .chain(missing)
        .filter(|i| seen.insert(i.as_str()))
        .cloned()
        .collect()
}

/// Generate a recipe for `user_id`, store it with merged ingredients and hand
/// back the recipe as generated.
pub async fn generate_recipe(
    generator: &dyn RecipeGenerator,
    store: &dyn RecipeStore,
    user_id: Uuid,
    ingredients: Vec<String>,
) -> Result<GeneratedRecipe, RecipeError> {
    if ingredients.is_empty() {
        warn!(%user_id, "generate called without ingredients");
        return Err(RecipeError::MissingIngredients);
    }

    let raw = generator.generate(&ingredients).await?;
    let recipe = parse_recipe(&raw)?;

    let merged = merge_ingredients(&recipe.ingredients, &recipe.missing_ingredients);
    let row = NewRecipe::encode(user_id, &recipe, &merged)
        .map_err(|e| RecipeError::PersistenceFailed(e.into()))?;
    let saved = store
        .insert(&row)
        .await
        .map_err(RecipeError::PersistenceFailed)?;

    info!(%user_id, recipe_id = %saved.id, title = %saved.title, "recipe saved");
    Ok(recipe)
}

/// The user's saved recipes, newest first.
pub async fn list_recipes(
    store: &dyn RecipeStore,
    user_id: Uuid,
) -> anyhow::Result<Vec<RecipeSummary>> {
    store
        .list_by_user(user_id)
        .await?
        .into_iter()
        .map(RecipeSummary::try_from)
        .collect()
}
