use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use crate::db::PgStore;
use crate::recipes::repo_types::{NewRecipe, Recipe};

#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Writes the whole row or nothing.
    async fn insert(&self, recipe: &NewRecipe) -> anyhow::Result<Recipe>;
    /// The user's recipes, newest first.
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Recipe>>;
}

#[async_trait]
impl RecipeStore for PgStore {
    async fn insert(&self, recipe: &NewRecipe) -> anyhow::Result<Recipe> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        let row = sqlx::query_as::<_, Recipe>(
            r#"
            INSERT INTO recipes
                (id, user_id, title, ingredients, steps, nutrition, time, difficulty, servings, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, user_id, title, ingredients, steps, nutrition, time, difficulty,
                      servings, created_at
            "#,
        )
        .bind(recipe.id)
        .bind(recipe.user_id)
        .bind(&recipe.title)
        .bind(&recipe.ingredients)
        .bind(&recipe.steps)
        .bind(&recipe.nutrition)
        .bind(&recipe.time)
        .bind(&recipe.difficulty)
        .bind(recipe.servings)
        .bind(recipe.created_at)
        .fetch_one(&mut *tx)
        .await
        .context("insert recipe")?;
        tx.commit().await.context("commit tx")?;
        Ok(row)
    }

    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT id, user_id, title, ingredients, steps, nutrition, time, difficulty,
                   servings, created_at
            FROM recipes
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list recipes by user")?;
        Ok(rows)
    }
}
