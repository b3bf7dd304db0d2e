use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{GeneratedRecipe, RecipeSummary};

/// Recipe row; list and map columns hold JSON text.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub ingredients: String,
    pub steps: String,
    pub nutrition: Option<String>,
    pub time: Option<String>,
    pub difficulty: Option<String>,
    pub servings: Option<i32>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub ingredients: String,
    pub steps: String,
    pub nutrition: Option<String>,
    pub time: Option<String>,
    pub difficulty: Option<String>,
    pub servings: Option<i32>,
    pub created_at: OffsetDateTime,
}

impl NewRecipe {
    /// Encode a generated recipe for storage, with `ingredients` replacing the
    /// generator's used list.
    pub fn encode(
        user_id: Uuid,
        recipe: &GeneratedRecipe,
        ingredients: &[String],
    ) -> serde_json::Result<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            title: recipe.title.clone(),
            ingredients: serde_json::to_string(ingredients)?,
            steps: serde_json::to_string(&recipe.steps)?,
            nutrition: Some(serde_json::to_string(&recipe.nutrition)?),
            time: recipe.time.clone(),
            difficulty: recipe.difficulty.clone(),
            servings: recipe.servings.and_then(|s| i32::try_from(s).ok()),
            created_at: OffsetDateTime::now_utc(),
        })
    }
}

impl TryFrom<Recipe> for RecipeSummary {
    type Error = anyhow::Error;

    fn try_from(r: Recipe) -> anyhow::Result<Self> {
        let ingredients: Vec<String> = serde_json::from_str(&r.ingredients)
            .with_context(|| format!("decode ingredients of recipe {}", r.id))?;
        let steps: Vec<String> = serde_json::from_str(&r.steps)
            .with_context(|| format!("decode steps of recipe {}", r.id))?;
        let nutrition: Map<String, Value> = match r.nutrition.as_deref() {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw)
                .with_context(|| format!("decode nutrition of recipe {}", r.id))?,
            _ => Map::new(),
        };
        Ok(Self {
            id: r.id,
            title: r.title,
            ingredients,
            steps,
            nutrition,
            time: r.time,
            difficulty: r.difficulty,
            servings: r.servings,
            created_at: r.created_at,
        })
    }
}
