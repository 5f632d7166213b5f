//! Video compositing: render a styled caption card and overlay the post's
//! video onto it with ffmpeg. Runs as a spawned background job; failures are
//! logged, never surfaced to the request that started the job.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

use crate::AppState;
use crate::models::Post;
use crate::templates::{self, escape_html};

pub type RenderError = Box<dyn std::error::Error + Send + Sync>;

const CARD_SIZE: u32 = 500;

fn browser_bin() -> String {
    std::env::var("BROWSER_BIN").unwrap_or_else(|_| "chromium".to_string())
}

/// The HTML card behind the overlaid video: caption, description, date,
/// styled by the post's template and overrides.
fn card_html(post: &Post) -> String {
    let template = templates::lookup(&post.template);
    let font_family = post
        .font_family
        .as_deref()
        .unwrap_or("'Montserrat', sans-serif");
    let heading_color = post
        .heading_color
        .as_deref()
        .unwrap_or(template.heading_color);
    let text_color = post.text_color.as_deref().unwrap_or(template.color);
    let background = template.background_css();

    format!(
        r#"<html>
<head>
<style>
@import url('https://fonts.googleapis.com/css2?family=Lobster&family=Montserrat:wght@400;700&family=Playfair+Display&family=Roboto+Mono&display=swap');
body {{ margin: 0; width: {size}px; height: {size}px; font-family: {font_family}; background: {background}; color: {text_color}; }}
.container {{ padding: 20px; }}
h3 {{ color: {heading_color}; }}
p {{ color: {text_color}; }}
</style>
</head>
<body>
<div class="container">
<h3>{caption}</h3>
<p>{description}</p>
<p>{date}</p>
</div>
</body>
</html>
"#,
        size = CARD_SIZE,
        caption = escape_html(&post.caption),
        description = escape_html(&post.description),
        date = post.created_at.format("%B %d, %Y"),
    )
}

async fn remove_quietly(path: &PathBuf) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        eprintln!("[render] Failed to cleanup temp file {}: {}", path.display(), e);
    }
}

/// Screenshot the card HTML with a headless browser.
async fn screenshot_card(html: &str, output_path: &PathBuf) -> Result<(), RenderError> {
    let temp_dir = std::env::temp_dir();
    let html_path = temp_dir.join(format!("memo_card_{}.html", rand::random::<u64>()));
    tokio::fs::write(&html_path, html)
        .await
        .map_err(|e| format!("Failed to write card HTML {:?}: {}", html_path, e))?;

    let output = Command::new(browser_bin())
        .args(["--headless", "--no-sandbox", "--disable-gpu"])
        .arg(format!("--window-size={},{}", CARD_SIZE, CARD_SIZE))
        .arg(format!("--screenshot={}", output_path.display()))
        .arg(format!("file://{}", html_path.display()))
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| format!("Failed to spawn browser: {}", e));

    remove_quietly(&html_path).await;

    let output = output?;
    if !output.status.success() || !output_path.exists() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("browser screenshot failed: {}", stderr).into());
    }
    Ok(())
}

/// Overlay the video (downscaled to 400x300) onto the card at (50, 100),
/// carrying the video's audio track through when it has one.
async fn composite(
    card_path: &PathBuf,
    video_path: &PathBuf,
    output_path: &PathBuf,
) -> Result<(), RenderError> {
    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-nostdin"])
        .args(["-i", &card_path.to_string_lossy()])
        .args(["-i", &video_path.to_string_lossy()])
        .args([
            "-filter_complex",
            "[1:v] scale=400:300 [scaled_video]; [0:v][scaled_video] overlay=50:100",
        ])
        .args(["-map", "1:a?"])
        .args(["-y", &output_path.to_string_lossy()])
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| format!("Failed to spawn ffmpeg: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("ffmpeg failed: {}", stderr).into());
    }
    Ok(())
}

/// The background job behind POST /api/render-video/:id. The caller has
/// already verified ownership and that the first descriptor is a video.
pub async fn render_video_job(state: Arc<AppState>, post: Post) {
    println!("[render] Starting video render for post {}", post.id);
    if let Err(e) = run(&state, &post).await {
        eprintln!("[render] Render failed for post {}: {}", post.id, e);
    }
}

async fn run(state: &Arc<AppState>, post: &Post) -> Result<(), RenderError> {
    let descriptor = post.media.first().ok_or("post has no media")?;

    let video_bytes = state.store.download(&descriptor.original_key).await?;

    let temp_dir = std::env::temp_dir();
    let nonce = rand::random::<u64>();
    let card_path = temp_dir.join(format!("memo_render_card_{}.png", nonce));
    let video_path = temp_dir.join(format!("memo_render_input_{}.mp4", nonce));
    let output_path = temp_dir.join(format!("memo_render_output_{}.mp4", nonce));

    tokio::fs::write(&video_path, &video_bytes)
        .await
        .map_err(|e| format!("Failed to write temp video {:?}: {}", video_path, e))?;

    let result = async {
        screenshot_card(&card_html(post), &card_path).await?;
        composite(&card_path, &video_path, &output_path).await?;

        let rendered = tokio::fs::read(&output_path)
            .await
            .map_err(|e| format!("Failed to read rendered output: {}", e))?;

        let key = format!("rendered-{}.mp4", post.id);
        state.store.upload(&key, &rendered).await?;
        println!(
            "[render] Rendered video for post {} uploaded as {}",
            post.id, key
        );
        Ok::<(), RenderError>(())
    }
    .await;

    remove_quietly(&video_path).await;
    if card_path.exists() {
        remove_quietly(&card_path).await;
    }
    if output_path.exists() {
        remove_quietly(&output_path).await;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaDescriptor, MediaKind};
    use chrono::Utc;

    #[test]
    fn card_html_escapes_and_styles() {
        let post = Post {
            id: 1,
            user_id: "uid".into(),
            media: vec![MediaDescriptor {
                original_key: "vid-1.mp4".into(),
                thumbnail_key: None,
                medium_key: None,
                media_type: MediaKind::Video,
            }],
            caption: "Trip <3".into(),
            description: "A & B went far.".into(),
            archived: false,
            favorited_by: vec![],
            template: "purple-sky".into(),
            font_family: Some("'Lobster', cursive".into()),
            heading_color: None,
            text_color: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let html = card_html(&post);
        assert!(html.contains("Trip &lt;3"));
        assert!(html.contains("A &amp; B went far."));
        assert!(html.contains("'Lobster', cursive"));
        assert!(html.contains("url(/patterns/Purple-sky.png)"));
    }
}
