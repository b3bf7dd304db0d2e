use axum::{
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use bytes::Bytes;
use tracing::{error, info, instrument};

use super::{dto::RecipeDocument, services::render_recipe_pdf};
use crate::{
    error::{ApiError, ApiJson},
    state::AppState,
};

pub fn api_routes() -> Router<AppState> {
    Router::new().route("/export_pdf", post(export_pdf))
}

#[instrument(skip_all)]
pub async fn export_pdf(ApiJson(recipe): ApiJson<RecipeDocument>) -> Result<Response, ApiError> {
    let title = recipe.title.clone();
    // printpdf documents are not Send; build the whole file on a blocking thread.
    let pdf = tokio::task::spawn_blocking(move || render_recipe_pdf(&recipe))
        .await
        .map_err(|e| {
            error!(error = %e, "pdf task panicked");
            ApiError::Internal("Could not render PDF".into())
        })?
        .map_err(|e| {
            error!(error = ?e, "pdf render failed");
            ApiError::Internal("Could not render PDF".into())
        })?;

    info!(%title, bytes = pdf.len(), "recipe exported");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"recipe.pdf\"",
            ),
        ],
        Bytes::from(pdf),
    )
        .into_response())
}
