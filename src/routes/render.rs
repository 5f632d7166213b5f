//! Video render endpoint

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use serde::Serialize;
use std::sync::Arc;

use super::auth::AuthUser;
use crate::AppState;
use crate::render;
use crate::services::error::LogErr;
use crate::domain::posts;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/render-video/{id}", post(render_video))
}

#[derive(Serialize)]
struct RenderResponse {
    message: &'static str,
}

/// POST /api/render-video/:id - Start compositing the post's video onto its
/// styled caption card. Responds 202 immediately; the job runs detached.
async fn render_video(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<i64>,
) -> Result<(StatusCode, Json<RenderResponse>), StatusCode> {
    let post = posts::get_owned_post(&state.db, post_id, &user_id)
        .await
        .log_500("Get post error")?
        .ok_or(StatusCode::NOT_FOUND)?;

    let is_video = post
        .media
        .first()
        .map(|d| d.media_type.is_video())
        .unwrap_or(false);
    if !is_video {
        return Err(StatusCode::NOT_FOUND);
    }

    tokio::spawn(render::render_video_job(state.clone(), post));

    Ok((
        StatusCode::ACCEPTED,
        Json(RenderResponse {
            message: "Video rendering process started.",
        }),
    ))
}
