//! Post endpoints: upload, listings, organization, deletion

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AuthUser;
use crate::constants::{MAX_MEDIA_FILE_SIZE, MAX_UPLOAD_BODY_SIZE};
use crate::domain::posts;
use crate::media;
use crate::models::{MediaDescriptor, MediaKind, Post};
use crate::services::error::LogErr;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload-multiple", post(upload_multiple))
        .route("/posts", get(list_posts))
        .route("/archived-posts", get(list_archived))
        .route("/favorites", get(list_favorites))
        .route("/posts/{id}", delete(delete_post))
        .route("/posts/{id}/archive", patch(archive_post))
        .route("/posts/{id}/unarchive", patch(unarchive_post))
        .route("/posts/{id}/style", patch(update_style))
        .route("/posts/{id}/details", patch(update_details))
        .route(
            "/posts/{id}/favorite",
            post(add_favorite).delete(remove_favorite),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_SIZE))
}

/// POST /upload-multiple - Create a post from one or more uploaded files.
/// Multipart fields: repeated "media" files plus optional "caption" and
/// "description" text fields. Every file must be image/* or video/* and
/// within the per-file size cap; all storage uploads complete before the
/// post row is written. A rejected request removes whatever it already
/// staged, so no storage object outlives it without a referencing row.
async fn upload_multiple(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Post>), StatusCode> {
    let mut descriptors = Vec::new();
    let mut caption = String::new();
    let mut description = String::new();

    if let Err(status) = read_upload_batch(
        &state,
        &mut multipart,
        &mut descriptors,
        &mut caption,
        &mut description,
    )
    .await
    {
        unstage_batch(&state, &descriptors).await;
        return Err(status);
    }

    if descriptors.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let post = match posts::insert_post(&state.db, &user_id, &descriptors, &caption, &description)
        .await
    {
        Ok(post) => post,
        Err(e) => {
            eprintln!("Insert post error: {}", e);
            unstage_batch(&state, &descriptors).await;
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    println!(
        "[posts] Created post {} for {} ({} media)",
        post.id,
        user_id,
        post.media.len()
    );
    Ok((StatusCode::CREATED, Json(post)))
}

/// Drain the multipart stream, uploading media files as they arrive.
/// Any failure leaves the already-pushed descriptors for the caller to
/// unstage.
async fn read_upload_batch(
    state: &Arc<AppState>,
    multipart: &mut Multipart,
    descriptors: &mut Vec<MediaDescriptor>,
    caption: &mut String,
    description: &mut String,
) -> Result<(), StatusCode> {
    while let Some(field) = multipart
        .next_field()
        .await
        .log_status("Multipart field error", StatusCode::BAD_REQUEST)?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("caption") => {
                *caption = field
                    .text()
                    .await
                    .log_status("Caption field error", StatusCode::BAD_REQUEST)?;
            }
            Some("description") => {
                *description = field
                    .text()
                    .await
                    .log_status("Description field error", StatusCode::BAD_REQUEST)?;
            }
            Some("media") => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let kind =
                    MediaKind::from_mime(&content_type).ok_or(StatusCode::BAD_REQUEST)?;

                let file_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "upload".to_string());

                let body = field
                    .bytes()
                    .await
                    .log_status("Multipart body error", StatusCode::BAD_REQUEST)?;
                if body.len() > MAX_MEDIA_FILE_SIZE {
                    return Err(StatusCode::PAYLOAD_TOO_LARGE);
                }

                let descriptor = media::process_upload(&state.store, &file_name, kind, &body)
                    .await
                    .log_500("Media upload error")?;
                descriptors.push(descriptor);
            }
            _ => {}
        }
    }
    Ok(())
}

/// Best-effort removal of the storage objects a failed upload staged
async fn unstage_batch(state: &Arc<AppState>, descriptors: &[MediaDescriptor]) {
    let keys: Vec<String> = descriptors
        .iter()
        .flat_map(|d| d.keys().map(String::from))
        .collect();
    if keys.is_empty() {
        return;
    }
    let failed = state.store.delete_many(&keys).await;
    if failed > 0 {
        eprintln!(
            "[posts] Rejected upload: {} of {} staged objects not deleted",
            failed,
            keys.len()
        );
    }
}

/// GET /posts - Active posts for the requesting user, newest first
async fn list_posts(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Post>>, StatusCode> {
    let posts = posts::list_posts(&state.db, &user_id, false)
        .await
        .log_500("List posts error")?;
    Ok(Json(posts))
}

/// GET /archived-posts - Archived posts for the requesting user
async fn list_archived(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Post>>, StatusCode> {
    let posts = posts::list_posts(&state.db, &user_id, true)
        .await
        .log_500("List archived posts error")?;
    Ok(Json(posts))
}

/// GET /favorites - Non-archived posts the user has favorited
async fn list_favorites(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Post>>, StatusCode> {
    let posts = posts::list_favorites(&state.db, &user_id)
        .await
        .log_500("List favorites error")?;
    Ok(Json(posts))
}

async fn archive_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<i64>,
) -> Result<Json<Post>, StatusCode> {
    let post = posts::set_archived(&state.db, post_id, &user_id, true)
        .await
        .log_500("Archive post error")?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(post))
}

async fn unarchive_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<i64>,
) -> Result<Json<Post>, StatusCode> {
    let post = posts::set_archived(&state.db, post_id, &user_id, false)
        .await
        .log_500("Unarchive post error")?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(post))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StyleUpdate {
    template: Option<String>,
    font_family: Option<String>,
    heading_color: Option<String>,
    text_color: Option<String>,
}

/// PATCH /posts/:id/style - Partial update of presentation fields
async fn update_style(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<i64>,
    Json(update): Json<StyleUpdate>,
) -> Result<Json<Post>, StatusCode> {
    let post = posts::update_style(
        &state.db,
        post_id,
        &user_id,
        update.template.as_deref(),
        update.font_family.as_deref(),
        update.heading_color.as_deref(),
        update.text_color.as_deref(),
    )
    .await
    .log_500("Update style error")?
    .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(post))
}

#[derive(Deserialize)]
struct DetailsUpdate {
    caption: Option<String>,
    description: Option<String>,
}

/// PATCH /posts/:id/details - Partial update of caption/description
async fn update_details(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<i64>,
    Json(update): Json<DetailsUpdate>,
) -> Result<Json<Post>, StatusCode> {
    let post = posts::update_details(
        &state.db,
        post_id,
        &user_id,
        update.caption.as_deref(),
        update.description.as_deref(),
    )
    .await
    .log_500("Update details error")?
    .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(post))
}

/// DELETE /posts/:id - Delete an owned post and its storage objects.
/// Storage goes first: a crash mid-cascade leaves a dangling row (visible)
/// rather than orphaned blobs.
async fn delete_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let post = posts::get_owned_post(&state.db, post_id, &user_id)
        .await
        .log_500("Get post error")?
        .ok_or(StatusCode::NOT_FOUND)?;

    let keys: Vec<String> = post
        .media
        .iter()
        .flat_map(|d| d.keys().map(String::from))
        .collect();
    let failed = state.store.delete_many(&keys).await;
    if failed > 0 {
        eprintln!(
            "[posts] Post {} deletion: {} of {} storage objects not deleted",
            post_id,
            failed,
            keys.len()
        );
    }

    posts::delete_post(&state.db, post_id, &user_id)
        .await
        .log_500("Delete post error")?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /posts/:id/favorite - Add the user to the post's favorite set.
/// Idempotent; favoriting twice leaves a single entry.
async fn add_favorite(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<i64>,
) -> Result<Json<Post>, StatusCode> {
    let post = posts::add_favorite(&state.db, post_id, &user_id)
        .await
        .log_500("Add favorite error")?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(post))
}

/// DELETE /posts/:id/favorite - Remove the user from the favorite set
async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<i64>,
) -> Result<Json<Post>, StatusCode> {
    let post = posts::remove_favorite(&state.db, post_id, &user_id)
        .await
        .log_500("Remove favorite error")?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(post))
}
