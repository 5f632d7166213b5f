//! Caption/description generation endpoint

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::AuthUser;
use crate::AppState;
use crate::genai::{Candidate, GenerateRequest};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/ai/generate", post(generate))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody {
    user_prompt: String,
    current_caption: Option<String>,
    current_description: Option<String>,
}

#[derive(Serialize)]
struct GenerateResponse {
    caption: String,
    description: String,
    candidates: Vec<Candidate>,
}

/// POST /api/ai/generate - Run the fallback chain for a prompt. The chain
/// absorbs provider failures, so this endpoint only fails on bad input.
async fn generate(
    State(state): State<Arc<AppState>>,
    AuthUser(_user_id): AuthUser,
    Json(body): Json<GenerateBody>,
) -> Result<Json<GenerateResponse>, StatusCode> {
    if body.user_prompt.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let req = GenerateRequest {
        prompt: body.user_prompt,
        avoid_caption: body.current_caption.unwrap_or_default(),
        avoid_description: body.current_description.unwrap_or_default(),
    };

    let candidates = state.generator.generate(&req).await;
    let first = candidates
        .first()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(GenerateResponse {
        caption: first.caption.clone(),
        description: first.description.clone(),
        candidates,
    }))
}
