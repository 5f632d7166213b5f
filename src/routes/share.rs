//! Public surface: the share page, public post JSON, and the font proxy

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse},
    routing::get,
};
use std::sync::Arc;

use crate::AppState;
use crate::constants::SHARE_URL_EXPIRY_SECS;
use crate::domain::posts;
use crate::models::Post;
use crate::services::error::LogErr;
use crate::templates::{self, escape_html};

const FONTS_CSS_URL: &str = "https://fonts.googleapis.com/css2?family=Montserrat:wght@400;600&family=Playfair+Display&family=Roboto+Mono&family=Lobster&display=swap";

const DEFAULT_FONT: &str = "'Montserrat', sans-serif";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/share/{post_id}", get(share_page))
        .route("/api/public/posts/{id}", get(public_post))
        .route("/api/fonts", get(fonts))
}

/// GET /share/:post_id - Standalone HTML page for a shared post. Archived
/// and missing posts are indistinguishable (404).
async fn share_page(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
) -> Result<Html<String>, (StatusCode, Html<&'static str>)> {
    let not_found = || (StatusCode::NOT_FOUND, Html("<h1>Post not found</h1>"));
    let server_error = || {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html("<h1>Error loading post</h1>"),
        )
    };

    let post = posts::get_post(&state.db, post_id)
        .await
        .map_err(|e| {
            eprintln!("Share page lookup error: {}", e);
            server_error()
        })?
        .filter(|p| !p.archived)
        .ok_or_else(not_found)?;

    // Share links outlive a request, so the media URL gets the longer expiry.
    // Prefer the medium rendition where one exists.
    let descriptor = post.media.first().ok_or_else(not_found)?;
    let display_key = descriptor
        .medium_key
        .as_deref()
        .unwrap_or(&descriptor.original_key);
    let media_url = state
        .store
        .download_url(display_key, SHARE_URL_EXPIRY_SECS)
        .await
        .map_err(|e| {
            eprintln!("Share page media URL error: {}", e);
            server_error()
        })?;

    Ok(Html(render_share_page(&post, &media_url)))
}

/// Render the share page HTML: template-driven styling with per-post font
/// and color overrides, all user text escaped.
fn render_share_page(post: &Post, media_url: &str) -> String {
    let template = templates::lookup(&post.template);

    let font_family = post.font_family.as_deref().unwrap_or(DEFAULT_FONT);
    let heading_color = post
        .heading_color
        .as_deref()
        .unwrap_or(template.heading_color);
    let text_color = post.text_color.as_deref().unwrap_or(template.color);
    let background = template.background_css();
    // Pattern backgrounds get a translucent card so the text stays readable
    let (card_background, card_blur) = if template.has_background_image() {
        ("rgba(255, 255, 255, 0.9)".to_string(), "blur(10px)")
    } else {
        (background.clone(), "none")
    };

    let caption = escape_html(&post.caption);
    let description = escape_html(&post.description);
    let title = if caption.is_empty() {
        "A Memory from MemoCapsule".to_string()
    } else {
        caption.clone()
    };
    let formatted_date = post.created_at.format("%B %d, %Y");

    let is_video = post
        .media
        .first()
        .map(|d| d.media_type.is_video())
        .unwrap_or(false);
    let media_element = if is_video {
        format!(
            r#"<video src="{}" controls autoplay muted style="width:100%; display:block;"></video>"#,
            escape_html(media_url)
        )
    } else {
        format!(
            r#"<img src="{}" alt="{}" style="width:100%; display:block;">"#,
            escape_html(media_url),
            caption
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <link rel="preconnect" href="https://fonts.googleapis.com">
    <link rel="preconnect" href="https://fonts.gstatic.com" crossorigin>
    <link href="https://fonts.googleapis.com/css2?family=Lobster&family=Montserrat:wght@400;700&family=Playfair+Display:ital@0;1&family=Roboto+Mono&display=swap" rel="stylesheet">
    <title>{title}</title>
    <style>
        body {{
            font-family: {font_family};
            background: {background};
            background-size: cover;
            background-position: center;
            color: {text_color};
            display: flex;
            justify-content: center;
            align-items: center;
            min-height: 100vh;
            margin: 0;
            padding: 1rem;
            box-sizing: border-box;
        }}
        .post-container {{
            max-width: 500px;
            width: 100%;
            background-color: {card_background};
            backdrop-filter: {card_blur};
            -webkit-backdrop-filter: {card_blur};
            border-radius: 12px;
            box-shadow: 0 4px 20px rgba(0,0,0,0.15);
            overflow: hidden;
        }}
        .content {{ padding: 1.5rem; }}
        h1 {{
            font-size: 1.7em;
            margin: 0 0 0.5em 0;
            color: {heading_color};
        }}
        p {{ font-size: 1.1em; margin: 0; line-height: 1.6; }}
        .date {{ font-size: 0.85em; color: #888; margin-top: 1.5rem; }}
    </style>
</head>
<body>
    <div class="post-container">
        {media_element}
        <div class="content">
            <h1>{caption}</h1>
            <p>{description}</p>
            <p class="date">Created on: {formatted_date}</p>
        </div>
    </div>
</body>
</html>
"#
    )
}

/// GET /api/public/posts/:id - Public JSON for the share-page data fetch
async fn public_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
) -> Result<Json<Post>, StatusCode> {
    let post = posts::get_post(&state.db, post_id)
        .await
        .log_500("Public post lookup error")?
        .filter(|p| !p.archived)
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(post))
}

/// GET /api/fonts - Proxy the Google Fonts stylesheet so the frontend can
/// load it without its own cross-origin fetch
async fn fonts(State(_state): State<Arc<AppState>>) -> Result<impl IntoResponse, StatusCode> {
    let css = reqwest::get(FONTS_CSS_URL)
        .await
        .log_500("Font fetch error")?
        .text()
        .await
        .log_500("Font body error")?;

    Ok(([(header::CONTENT_TYPE, "text/css")], css))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaDescriptor, MediaKind};
    use chrono::Utc;

    fn sample_post() -> Post {
        Post {
            id: 7,
            user_id: "uid-1".into(),
            media: vec![MediaDescriptor {
                original_key: "orig-1-photo.jpg".into(),
                thumbnail_key: Some("thumb-1-photo.jpg".into()),
                medium_key: Some("med-1-photo.jpg".into()),
                media_type: MediaKind::Image,
            }],
            caption: "Our <b>day</b>".into(),
            description: "It was \"lovely\" & long.".into(),
            archived: false,
            favorited_by: vec![],
            template: "dark".into(),
            font_family: None,
            heading_color: Some("#ff0000".into()),
            text_color: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn user_text_is_escaped() {
        let html = render_share_page(&sample_post(), "/media/med-1-photo.jpg");
        assert!(html.contains("Our &lt;b&gt;day&lt;/b&gt;"));
        assert!(html.contains("It was &quot;lovely&quot; &amp; long."));
        assert!(!html.contains("<b>day</b>"));
    }

    #[test]
    fn overrides_beat_template_styles() {
        let html = render_share_page(&sample_post(), "/media/med-1-photo.jpg");
        // user heading color wins, template text color stands in for the rest
        assert!(html.contains("color: #ff0000;"));
        assert!(html.contains("color: #d1d5db;"));
        assert!(html.contains("background: #1f2d37;"));
    }

    #[test]
    fn video_posts_embed_a_video_element() {
        let mut post = sample_post();
        post.media[0].media_type = MediaKind::Video;
        post.media[0].thumbnail_key = None;
        post.media[0].medium_key = None;
        let html = render_share_page(&post, "/media/vid-1.mp4");
        assert!(html.contains("<video src=\"/media/vid-1.mp4\""));
        assert!(!html.contains("<img"));
    }
}
