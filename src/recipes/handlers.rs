use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use tracing::{info, instrument};

use super::{
    dto::{GenerateRecipeRequest, GeneratedRecipe, RecipeSummary},
    services::{generate_recipe, list_recipes},
};
use crate::{
    auth::extractors::AuthUser,
    error::{ApiJson, ApiResponse, ApiResult},
    state::AppState,
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/generate_recipe", post(generate))
        .route("/history", get(history))
}

/// Routes kept outside the `/api` prefix.
pub fn alias_routes() -> Router<AppState> {
    Router::new().route("/recipe/generate", post(generate))
}

#[instrument(skip_all)]
pub async fn generate(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<GenerateRecipeRequest>,
) -> ApiResult<GeneratedRecipe> {
    let ingredients = payload
        .ingredients
        .map(|i| i.into_list())
        .unwrap_or_default();

    let recipe = generate_recipe(
        state.generator.as_ref(),
        state.recipes.as_ref(),
        user.id,
        ingredients,
    )
    .await?;

    Ok(ApiResponse::with_message(recipe, "Recipe generated"))
}

#[instrument(skip_all)]
pub async fn history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Vec<RecipeSummary>> {
    let items = list_recipes(state.recipes.as_ref(), user.id).await?;
    info!(user_id = %user.id, count = items.len(), "history served");
    Ok(ApiResponse::ok(items))
}
