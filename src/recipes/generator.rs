use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::GeminiConfig;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generator request failed: {0}")]
    Network(String),
    #[error("generator timed out")]
    Timeout,
    #[error("generator output unreadable: {0}")]
    Parse(String),
    #[error("generated recipe incomplete: {0}")]
    Schema(String),
}

/// Source of raw recipe text, expected to be a JSON object, possibly fenced.
#[async_trait]
pub trait RecipeGenerator: Send + Sync {
    async fn generate(&self, ingredients: &[String]) -> Result<String, GenerationError>;
}

/// Fixed recipe used when no model key is configured.
pub struct CannedGenerator;

const CANNED_RECIPE: &str = r#"{
    "title": "Mock Chicken Stir Fry",
    "ingredients": ["chicken", "broccoli", "soy sauce"],
    "missing_ingredients": ["sesame oil", "garlic"],
    "steps": ["1. Cut chicken.", "2. Stir fry with veggies.", "3. Serve."],
    "nutrition": { "calories": 450, "protein": "35g", "fat": "12g", "carbs": "10g" },
    "time": "25 mins",
    "difficulty": "Easy",
    "servings": 2
}"#;

#[async_trait]
impl RecipeGenerator for CannedGenerator {
    async fn generate(&self, ingredients: &[String]) -> Result<String, GenerationError> {
        debug!(count = ingredients.len(), "serving canned recipe");
        Ok(CANNED_RECIPE.to_string())
    }
}

pub(crate) fn build_prompt(ingredients: &[String]) -> String {
    format!(
        r#"Create a recipe using these ingredients: {}.
You can assume common pantry items (salt, pepper, oil, water) are available.
Return ONLY a JSON object with the following structure (no markdown formatting):
{{
    "title": "Recipe Name",
    "ingredients": ["list", "of", "ingredients", "used"],
    "missing_ingredients": ["list", "of", "missing", "essential", "ingredients"],
    "steps": ["step 1", "step 2"],
    "nutrition": {{ "calories": 500, "protein": "20g", "fat": "10g", "carbs": "50g" }},
    "time": "30 mins",
    "difficulty": "Easy/Medium/Hard",
    "servings": 2
}}"#,
        ingredients.join(", ")
    )
}

/// Google Gemini `generateContent` client.
pub struct GeminiGenerator {
    client: Client,
    config: GeminiConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GeminiGenerator {
    pub fn new(config: GeminiConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        info!(model = %config.model, timeout_secs = config.timeout_secs, "gemini generator ready");
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl RecipeGenerator for GeminiGenerator {
    async fn generate(&self, ingredients: &[String]) -> Result<String, GenerationError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![Part {
                    text: Some(build_prompt(ingredients)),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        debug!(model = %self.config.model, "sending gemini request");
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else {
                    GenerationError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(%status, error = %body, "gemini request failed");
            return Err(GenerationError::Network(format!("HTTP {}", status)));
        }

        let envelope: GenerateContentResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout
            } else {
                GenerationError::Parse(e.to_string())
            }
        })?;

        first_text(envelope)
    }
}

/// Text of the first part that carries any, across all candidates.
fn first_text(envelope: GenerateContentResponse) -> Result<String, GenerationError> {
    envelope
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .find_map(|p| p.text)
        .ok_or_else(|| GenerationError::Parse("no text in response".into()))
}
