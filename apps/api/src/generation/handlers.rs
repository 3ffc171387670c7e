//! Axum route handlers for the Generation API.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::generation::generator::generate_from_prompts;
use crate::llm_client::GenerationRequest;
use crate::models::provocation::Provocation;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub user_prompt: String,
}

/// POST /api/generate
///
/// Forwards caller-supplied prompts to the generator. A reply carrying a
/// `provocation` key is appended to the collection and returned as parsed.
pub async fn handle_generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let generator = state
        .generator
        .as_ref()
        .ok_or_else(|| AppError::Configuration("API key not configured".to_string()))?;

    let Json(body) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    if body.user_prompt.trim().is_empty() {
        return Err(AppError::Validation("userPrompt cannot be empty".to_string()));
    }

    let request = GenerationRequest {
        system_prompt: body.system_prompt,
        user_prompt: body.user_prompt,
    };
    let object = generate_from_prompts(generator.as_ref(), &request).await?;

    let provocation = Provocation::from_generated(object.clone());
    let total = state
        .store
        .mutate_collection(|items| {
            items.push(provocation);
            Ok::<_, AppError>(items.len())
        })
        .await?;
    info!("Stored generated provocation #{total}");

    Ok(Json(Value::Object(object)))
}
