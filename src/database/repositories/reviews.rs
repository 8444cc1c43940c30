use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::review::ReviewRow;
use crate::database::DbError;

pub const DUPLICATE_REVIEW: &str = "You have already reviewed this wine.";

pub async fn exists(pool: &PgPool, wine_id: Uuid, user_id: Uuid) -> Result<bool, DbError> {
    let found: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM wine_reviews WHERE wine_id = $1 AND user_id = $2")
            .bind(wine_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}

/// Insert a review. The (wine, user) unique constraint backs the
/// one-review-per-user invariant under concurrent requests.
pub async fn insert(
    pool: &PgPool,
    wine_id: Uuid,
    user_id: Uuid,
    rating: i32,
    comment: &str,
) -> Result<ReviewRow, DbError> {
    sqlx::query_as::<_, ReviewRow>(
        r#"
        INSERT INTO wine_reviews (wine_id, user_id, rating, comment)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(wine_id)
    .bind(user_id)
    .bind(rating)
    .bind(comment)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if DbError::is_unique_violation(&e) {
            DbError::Conflict(DUPLICATE_REVIEW.to_string())
        } else {
            DbError::Sqlx(e)
        }
    })
}

/// Delete the acting user's review of a wine; false when none exists
pub async fn delete(pool: &PgPool, wine_id: Uuid, user_id: Uuid) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM wine_reviews WHERE wine_id = $1 AND user_id = $2")
        .bind(wine_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn for_wine(pool: &PgPool, wine_id: Uuid) -> Result<Vec<ReviewRow>, DbError> {
    let rows = sqlx::query_as::<_, ReviewRow>(
        "SELECT * FROM wine_reviews WHERE wine_id = $1 ORDER BY created_at DESC, id",
    )
    .bind(wine_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
