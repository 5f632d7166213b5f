//! User domain - DB queries for users
//!
//! All functions use the generic Executor pattern, allowing them to work with
//! both `&PgPool` (for standalone queries) and `&mut PgConnection` (for
//! transactions).

use sqlx::{Executor, Postgres};

use crate::models::User;

/// Get a user record by identity-provider uid.
pub async fn get_user_by_uid<'e, E>(
    executor: E,
    firebase_uid: &str,
) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        "SELECT id, name, email, firebase_uid, created_at FROM users WHERE firebase_uid = $1",
    )
    .bind(firebase_uid)
    .fetch_optional(executor)
    .await
}

/// Create a user record. The email and firebase_uid columns are unique;
/// callers map the unique-violation error to a 409.
pub async fn insert_user<'e, E>(
    executor: E,
    name: &str,
    email: &str,
    firebase_uid: &str,
) -> Result<User, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        INSERT INTO users (name, email, firebase_uid)
        VALUES ($1, $2, $3)
        RETURNING id, name, email, firebase_uid, created_at
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(firebase_uid)
    .fetch_one(executor)
    .await
}

/// Delete a user record by uid (account deletion cascade).
pub async fn delete_user_by_uid<'e, E>(executor: E, firebase_uid: &str) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM users WHERE firebase_uid = $1")
        .bind(firebase_uid)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Whether a database error is a unique-constraint violation (Postgres 23505).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505")
    )
}
