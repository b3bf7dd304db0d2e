use axum::{routing::post, Router};
use tracing::{debug, instrument, warn};

use super::{
    dto::{NutritionRequest, NutritionResponse},
    services::estimate,
};
use crate::{
    error::{ApiError, ApiJson, ApiResponse, ApiResult},
    state::AppState,
};

pub fn api_routes() -> Router<AppState> {
    Router::new().route("/calculate_nutrition", post(calculate))
}

pub fn alias_routes() -> Router<AppState> {
    Router::new().route("/nutrition/calculate", post(calculate))
}

#[instrument(skip_all)]
pub async fn calculate(ApiJson(payload): ApiJson<NutritionRequest>) -> ApiResult<NutritionResponse> {
    let mut servings = payload.servings.filter(|s| *s != 0).unwrap_or(1);
    let mut ingredients = payload
        .ingredients
        .map(|i| i.into_items())
        .unwrap_or_default();

    if ingredients.is_empty() {
        if let Some(recipe) = payload.recipe {
            ingredients = recipe
                .ingredients
                .map(|i| i.into_items())
                .unwrap_or_default();
            servings = recipe.servings.filter(|s| *s != 0).unwrap_or(servings);
        }
    }

    if ingredients.is_empty() {
        warn!("nutrition requested without ingredients");
        return Err(ApiError::validation("No ingredients provided"));
    }

    let nutrition = estimate(&ingredients, servings);
    debug!(count = ingredients.len(), servings, "nutrition estimated");
    Ok(ApiResponse::ok(NutritionResponse {
        nutrition,
        servings,
    }))
}
