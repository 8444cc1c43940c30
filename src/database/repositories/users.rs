use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::user::{UserRow, UserUpdate};
use crate::database::models::wine::WineListRow;
use crate::database::DbError;

pub async fn insert(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    first_name: &str,
    last_name: &str,
) -> Result<UserRow, DbError> {
    sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (email, password_hash, first_name, last_name)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(email)
    .bind(password_hash)
    .bind(first_name)
    .bind(last_name)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if DbError::is_unique_violation(&e) {
            DbError::Conflict("A user with this email already exists.".to_string())
        } else {
            DbError::Sqlx(e)
        }
    })
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Merge present fields onto the record. Role flags are deliberately not
/// part of `UserUpdate`: they are read-only through self-service channels.
pub async fn update(pool: &PgPool, id: Uuid, update: UserUpdate) -> Result<UserRow, DbError> {
    sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users SET
            email = COALESCE($2, email),
            first_name = COALESCE($3, first_name),
            last_name = COALESCE($4, last_name),
            password_hash = COALESCE($5, password_hash)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(update.email)
    .bind(update.first_name)
    .bind(update.last_name)
    .bind(update.password_hash)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        if DbError::is_unique_violation(&e) {
            DbError::Conflict("A user with this email already exists.".to_string())
        } else {
            DbError::Sqlx(e)
        }
    })?
    .ok_or_else(|| DbError::NotFound("User not found".to_string()))
}

/// The user's favorites, list-shaped with the rating aggregate
pub async fn saved_wines(pool: &PgPool, user_id: Uuid) -> Result<Vec<WineListRow>, DbError> {
    let rows = sqlx::query_as::<_, WineListRow>(
        r#"
        SELECT w.id, w.title, w.vintage, w.price, w.image,
               AVG(r.rating)::float8 AS average_rating
        FROM wines w
        JOIN saved_wines s ON s.wine_id = w.id
        LEFT JOIN wine_reviews r ON r.wine_id = w.id
        WHERE s.user_id = $1
        GROUP BY w.id
        ORDER BY w.title, w.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Idempotent set insert: saving an already-saved wine is a no-op
pub async fn save_wine(pool: &PgPool, user_id: Uuid, wine_id: Uuid) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO saved_wines (user_id, wine_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(wine_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Idempotent set removal: removing an absent wine is a no-op
pub async fn unsave_wine(pool: &PgPool, user_id: Uuid, wine_id: Uuid) -> Result<(), DbError> {
    sqlx::query("DELETE FROM saved_wines WHERE user_id = $1 AND wine_id = $2")
        .bind(user_id)
        .bind(wine_id)
        .execute(pool)
        .await?;
    Ok(())
}
