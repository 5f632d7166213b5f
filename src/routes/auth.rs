//! Signup, account deletion, and the bearer-token auth extractor

use axum::{
    Json, Router,
    extract::{FromRequestParts, State},
    http::{StatusCode, request::Parts},
    routing::{delete, post},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};

use crate::AppState;
use crate::domain::{posts, users};
use crate::models::User;
use crate::services::error::LogErr;

pub fn routes() -> Router<Arc<AppState>> {
    // Rate limit the auth surface to blunt signup abuse and token probing
    let rate_limit_config = GovernorConfigBuilder::default()
        .per_second(6)
        .burst_size(10)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .expect("Failed to build rate limit config");

    let rate_limit_layer = GovernorLayer {
        config: rate_limit_config.into(),
    };

    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/me", delete(delete_account))
        .layer(rate_limit_layer)
}

// ============================================================================
// Auth Extractor - verifies the bearer ID token and extracts the user id
// ============================================================================

/// Extractor that verifies the Authorization bearer token against the
/// identity provider and yields the provider uid.
pub struct AuthUser(pub String);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        let uid = state.identity.verify(token).await.map_err(|e| {
            eprintln!("Token verification failed: {}", e);
            match token {
                // 403 distinguishes a presented-but-bad token from no token
                Some(_) => StatusCode::FORBIDDEN,
                None => StatusCode::UNAUTHORIZED,
            }
        })?;

        Ok(AuthUser(uid))
    }
}

// ============================================================================
// Account endpoints
// ============================================================================

// Fields default to empty so an omitted field reports 400, not a
// deserialization rejection
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct SignupRequest {
    name: String,
    email: String,
    firebase_uid: String,
}

/// POST /auth/signup - Record a user after identity-provider signup.
/// Idempotent on the uid: an existing account returns 200 with the record.
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<User>), StatusCode> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.firebase_uid.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    if let Some(existing) = users::get_user_by_uid(&state.db, &req.firebase_uid)
        .await
        .log_500("Get user by uid error")?
    {
        return Ok((StatusCode::OK, Json(existing)));
    }

    match users::insert_user(&state.db, &req.name, &req.email, &req.firebase_uid).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(user))),
        // Email already registered to a different uid
        Err(e) if users::is_unique_violation(&e) => Err(StatusCode::CONFLICT),
        Err(e) => Err(e).log_500("Insert user error"),
    }
}

/// DELETE /auth/me - Delete the account: every owned post, every referenced
/// storage object, then the user record. Storage deletes are best-effort and
/// run before the rows go away.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, StatusCode> {
    let keys = posts::media_keys_for_user(&state.db, &user_id)
        .await
        .log_500("Collect media keys error")?;

    let failed = state.store.delete_many(&keys).await;
    if failed > 0 {
        eprintln!(
            "[auth] Account deletion for {}: {} of {} storage objects not deleted",
            user_id,
            failed,
            keys.len()
        );
    }

    let removed = posts::delete_all_for_user(&state.db, &user_id)
        .await
        .log_500("Delete posts error")?;
    users::delete_user_by_uid(&state.db, &user_id)
        .await
        .log_500("Delete user error")?;

    println!(
        "[auth] Deleted account {} ({} posts, {} storage objects)",
        user_id,
        removed,
        keys.len()
    );
    Ok(StatusCode::NO_CONTENT)
}
