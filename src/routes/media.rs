//! Media access: signed URLs and local-backend file serving

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;

use super::auth::AuthUser;
use crate::AppState;
use crate::constants::SIGNED_URL_EXPIRY_SECS;
use crate::domain::posts;
use crate::services::error::LogErr;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/media-url/{filename}", get(get_media_url))
        .route("/media/{*key}", get(serve_media))
}

#[derive(Serialize)]
struct MediaUrlResponse {
    url: String,
}

/// GET /media-url/:filename - Mint a short-lived URL for a media key.
/// The key must be referenced by one of the requester's own posts; anything
/// else is 403 without confirming whether the object exists.
async fn get_media_url(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(filename): Path<String>,
) -> Result<Json<MediaUrlResponse>, StatusCode> {
    let owned = posts::user_references_media_key(&state.db, &user_id, &filename)
        .await
        .log_500("Media key ownership check error")?;
    if !owned {
        return Err(StatusCode::FORBIDDEN);
    }

    let url = state
        .store
        .download_url(&filename, SIGNED_URL_EXPIRY_SECS)
        .await
        .log_500("Signed URL error")?;

    Ok(Json(MediaUrlResponse { url }))
}

/// GET /media/*key - Serve media files from the local backend (development)
async fn serve_media(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    // Security: reject paths with traversal attempts or null bytes upfront
    if key.contains("..") || key.contains('\0') {
        return Err(StatusCode::FORBIDDEN);
    }

    let local_path = state.store.local_path().ok_or(StatusCode::NOT_FOUND)?;

    let full_path = local_path.join(&key);

    // Security: ensure the path doesn't escape the storage directory.
    // canonicalize() resolves symlinks and normalizes the path.
    let canonical = full_path
        .canonicalize()
        .map_err(|_| StatusCode::NOT_FOUND)?; // Silent - expected for missing files
    let storage_canonical = local_path
        .canonicalize()
        .log_500("Failed to canonicalize storage path")?;

    if !canonical.starts_with(&storage_canonical) {
        return Err(StatusCode::FORBIDDEN);
    }

    let bytes = tokio::fs::read(&canonical)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;

    let content_type = match canonical.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        _ => "application/octet-stream",
    };

    // Keys embed a timestamp, so the object under a key never changes;
    // cache for a year and skip revalidation.
    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        bytes,
    ))
}
