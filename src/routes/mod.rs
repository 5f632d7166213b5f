pub mod auth;
pub mod generate;
pub mod media;
pub mod posts;
pub mod render;
pub mod share;

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::AppState;

async fn health() -> &'static str {
    "ok"
}

/// Build all routes for the API
pub fn build_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .merge(auth::routes())
        .merge(generate::routes())
        .merge(media::routes())
        .merge(posts::routes())
        .merge(render::routes())
        .merge(share::routes())
}
