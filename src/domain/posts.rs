//! Post domain - DB queries for posts
//!
//! All functions use the generic Executor pattern, allowing them to work with
//! both `&PgPool` (for standalone queries) and `&mut PgConnection` (for
//! transactions). Every owner-scoped query filters by user_id in SQL, never
//! in application code.

use sqlx::{Executor, Postgres};

use crate::models::{MediaDescriptor, Post};

const POST_COLUMNS: &str = "id, user_id, media, caption, description, archived, favorited_by, \
     template, font_family, heading_color, text_color, created_at, updated_at";

/// Insert a new post. The media descriptor list is serialized into the JSONB
/// column as-is; callers guarantee it is non-empty.
pub async fn insert_post<'e, E>(
    executor: E,
    user_id: &str,
    media: &[MediaDescriptor],
    caption: &str,
    description: &str,
) -> Result<Post, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let media_json =
        serde_json::to_value(media).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    sqlx::query_as(&format!(
        r#"
        INSERT INTO posts (user_id, media, caption, description)
        VALUES ($1, $2, $3, $4)
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(media_json)
    .bind(caption)
    .bind(description)
    .fetch_one(executor)
    .await
}

/// List a user's posts filtered by archive state, newest first.
pub async fn list_posts<'e, E>(
    executor: E,
    user_id: &str,
    archived: bool,
) -> Result<Vec<Post>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        r#"
        SELECT {POST_COLUMNS} FROM posts
        WHERE user_id = $1 AND archived = $2
        ORDER BY created_at DESC
        "#
    ))
    .bind(user_id)
    .bind(archived)
    .fetch_all(executor)
    .await
}

/// List the non-archived posts a user has favorited, newest first.
pub async fn list_favorites<'e, E>(executor: E, user_id: &str) -> Result<Vec<Post>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        r#"
        SELECT {POST_COLUMNS} FROM posts
        WHERE $1 = ANY(favorited_by) AND archived = FALSE
        ORDER BY created_at DESC
        "#
    ))
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Get a post by id regardless of owner (public share page; caller decides
/// what archived means for its surface).
pub async fn get_post<'e, E>(executor: E, post_id: i64) -> Result<Option<Post>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
        .bind(post_id)
        .fetch_optional(executor)
        .await
}

/// Get a post only if it belongs to the given user.
pub async fn get_owned_post<'e, E>(
    executor: E,
    post_id: i64,
    user_id: &str,
) -> Result<Option<Post>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE id = $1 AND user_id = $2"
    ))
    .bind(post_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Archive or unarchive an owned post. Returns None when the post does not
/// exist or belongs to someone else.
pub async fn set_archived<'e, E>(
    executor: E,
    post_id: i64,
    user_id: &str,
    archived: bool,
) -> Result<Option<Post>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        r#"
        UPDATE posts SET archived = $3, updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(post_id)
    .bind(user_id)
    .bind(archived)
    .fetch_optional(executor)
    .await
}

/// Update presentation fields on an owned post.
pub async fn update_style<'e, E>(
    executor: E,
    post_id: i64,
    user_id: &str,
    template: Option<&str>,
    font_family: Option<&str>,
    heading_color: Option<&str>,
    text_color: Option<&str>,
) -> Result<Option<Post>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        r#"
        UPDATE posts SET
            template = COALESCE($3, template),
            font_family = COALESCE($4, font_family),
            heading_color = COALESCE($5, heading_color),
            text_color = COALESCE($6, text_color),
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(post_id)
    .bind(user_id)
    .bind(template)
    .bind(font_family)
    .bind(heading_color)
    .bind(text_color)
    .fetch_optional(executor)
    .await
}

/// Update caption/description on an owned post. Absent fields keep their
/// current value.
pub async fn update_details<'e, E>(
    executor: E,
    post_id: i64,
    user_id: &str,
    caption: Option<&str>,
    description: Option<&str>,
) -> Result<Option<Post>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        r#"
        UPDATE posts SET
            caption = COALESCE($3, caption),
            description = COALESCE($4, description),
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(post_id)
    .bind(user_id)
    .bind(caption)
    .bind(description)
    .fetch_optional(executor)
    .await
}

#[derive(Debug, sqlx::FromRow)]
struct DeletedMedia {
    media: serde_json::Value,
}

/// Delete an owned post, returning its media descriptors so the caller can
/// cascade the storage delete. None when the post was not found (or not owned).
pub async fn delete_post<'e, E>(
    executor: E,
    post_id: i64,
    user_id: &str,
) -> Result<Option<Vec<MediaDescriptor>>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let row: Option<DeletedMedia> = sqlx::query_as(
        r#"
        DELETE FROM posts
        WHERE id = $1 AND user_id = $2
        RETURNING media
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    match row {
        Some(deleted) => {
            let media = serde_json::from_value(deleted.media)
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
            Ok(Some(media))
        }
        None => Ok(None),
    }
}

/// Add the user to a post's favorited_by set. Idempotent: favoriting twice
/// leaves a single entry.
pub async fn add_favorite<'e, E>(
    executor: E,
    post_id: i64,
    user_id: &str,
) -> Result<Option<Post>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        r#"
        UPDATE posts SET
            favorited_by = CASE
                WHEN $2 = ANY(favorited_by) THEN favorited_by
                ELSE array_append(favorited_by, $2)
            END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(post_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Remove the user from a post's favorited_by set.
pub async fn remove_favorite<'e, E>(
    executor: E,
    post_id: i64,
    user_id: &str,
) -> Result<Option<Post>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        r#"
        UPDATE posts SET
            favorited_by = array_remove(favorited_by, $2),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(post_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Whether any post owned by the user references the given storage key as an
/// original, thumbnail, or medium derivative. Used by the signed-URL layer:
/// a miss means Forbidden, regardless of whether the key exists under
/// another owner.
pub async fn user_references_media_key<'e, E>(
    executor: E,
    user_id: &str,
    key: &str,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM posts p, jsonb_array_elements(p.media) m
            WHERE p.user_id = $1
              AND (m->>'originalKey' = $2
                   OR m->>'thumbnailKey' = $2
                   OR m->>'mediumKey' = $2)
        )
        "#,
    )
    .bind(user_id)
    .bind(key)
    .fetch_one(executor)
    .await
}

#[derive(Debug, sqlx::FromRow)]
struct MediaOnly {
    media: serde_json::Value,
}

/// All storage keys referenced by a user's posts (for account deletion).
pub async fn media_keys_for_user<'e, E>(
    executor: E,
    user_id: &str,
) -> Result<Vec<String>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let rows: Vec<MediaOnly> = sqlx::query_as("SELECT media FROM posts WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(executor)
        .await?;

    let mut keys = Vec::new();
    for row in rows {
        let media: Vec<MediaDescriptor> =
            serde_json::from_value(row.media).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        for descriptor in &media {
            keys.extend(descriptor.keys().map(String::from));
        }
    }
    Ok(keys)
}

/// Delete every post owned by the user (account deletion cascade).
pub async fn delete_all_for_user<'e, E>(executor: E, user_id: &str) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM posts WHERE user_id = $1")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
