use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Postgres-backed implementation of the user and recipe stores.
#[derive(Clone)]
pub struct PgStore {
    pub db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[cfg(test)]
pub mod memory {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use crate::auth::{
        repo::UserStore,
        repo_types::{NewUser, User},
        services::CredentialError,
    };
    use crate::recipes::{
        repo::RecipeStore,
        repo_types::{NewRecipe, Recipe},
    };

    /// In-process stand-in for Postgres with the same uniqueness rules.
    #[derive(Default)]
    pub struct MemoryStore {
        users: Mutex<Vec<User>>,
        recipes: Mutex<Vec<Recipe>>,
        fail_recipe_writes: bool,
    }

    impl MemoryStore {
        /// A store whose recipe inserts always fail.
        pub fn failing_recipe_writes() -> Self {
            Self {
                fail_recipe_writes: true,
                ..Default::default()
            }
        }

        pub fn user_count(&self) -> usize {
            self.users.lock().unwrap().len()
        }

        pub fn recipes(&self) -> Vec<Recipe> {
            self.recipes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UserStore for MemoryStore {
        async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
            Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
        }

        async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.username == username)
                .cloned())
        }

        async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn insert(&self, user: &NewUser) -> Result<User, CredentialError> {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| u.username == user.username) {
                return Err(CredentialError::DuplicateUsername);
            }
            if users.iter().any(|u| u.email == user.email) {
                return Err(CredentialError::DuplicateEmail);
            }
            let row = User {
                id: user.id,
                username: user.username.clone(),
                email: user.email.clone(),
                password_hash: user.password_hash.clone(),
                created_at: OffsetDateTime::now_utc(),
            };
            users.push(row.clone());
            Ok(row)
        }
    }

    #[async_trait]
    impl RecipeStore for MemoryStore {
        async fn insert(&self, recipe: &NewRecipe) -> anyhow::Result<Recipe> {
            if self.fail_recipe_writes {
                anyhow::bail!("recipe table unavailable");
            }
            let row = Recipe {
                id: recipe.id,
                user_id: recipe.user_id,
                title: recipe.title.clone(),
                ingredients: recipe.ingredients.clone(),
                steps: recipe.steps.clone(),
                nutrition: recipe.nutrition.clone(),
                time: recipe.time.clone(),
                difficulty: recipe.difficulty.clone(),
                servings: recipe.servings,
                created_at: recipe.created_at,
            };
            self.recipes.lock().unwrap().push(row.clone());
            Ok(row)
        }

        async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Recipe>> {
            // Reverse insertion order first so equal timestamps keep newest-first.
            let mut rows: Vec<Recipe> = self
                .recipes
                .lock()
                .unwrap()
                .iter()
                .rev()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(rows)
        }
    }
}
