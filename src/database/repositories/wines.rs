use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::wine::{WineDetailRow, WineInput, WineListRow, WinePatch, WineRow};
use crate::database::DbError;
use crate::filter::{BindValue, WineFilters};

const IDENTITY_CONFLICT: &str = "A wine with this title, vintage and capacity already exists.";

fn map_insert_err(e: sqlx::Error) -> DbError {
    if DbError::is_unique_violation(&e) {
        DbError::Conflict(IDENTITY_CONFLICT.to_string())
    } else {
        DbError::Sqlx(e)
    }
}

/// Filtered, aggregated catalog listing
pub async fn list(pool: &PgPool, filters: &WineFilters) -> Result<Vec<WineListRow>, DbError> {
    let compiled = filters.compile();

    let mut query = sqlx::query_as::<_, WineListRow>(&compiled.sql);
    for bind in compiled.binds {
        query = match bind {
            BindValue::Text(s) => query.bind(s),
            BindValue::Float(f) => query.bind(f),
            BindValue::Int(i) => query.bind(i),
        };
    }

    let rows = query.fetch_all(pool).await?;
    Ok(rows)
}

pub async fn detail(pool: &PgPool, id: Uuid) -> Result<Option<WineDetailRow>, DbError> {
    let row = sqlx::query_as::<_, WineDetailRow>(
        r#"
        SELECT w.*,
               (SELECT AVG(rating)::float8 FROM wine_reviews WHERE wine_id = w.id) AS average_rating
        FROM wines w
        WHERE w.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, DbError> {
    let found: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM wines WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

pub async fn insert(pool: &PgPool, input: WineInput) -> Result<WineRow, DbError> {
    sqlx::query_as::<_, WineRow>(
        r#"
        INSERT INTO wines
            (title, description, price, wine_type, abv, vintage, country,
             region, grape, characteristics, style, capacity)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(input.title)
    .bind(input.description)
    .bind(input.price)
    .bind(input.wine_type)
    .bind(input.abv)
    .bind(input.vintage)
    .bind(input.country)
    .bind(input.region)
    .bind(input.grape)
    .bind(input.characteristics)
    .bind(input.style)
    .bind(input.capacity)
    .fetch_one(pool)
    .await
    .map_err(map_insert_err)
}

/// Full replace (PUT semantics): every attribute is written
pub async fn replace(pool: &PgPool, id: Uuid, input: WineInput) -> Result<WineRow, DbError> {
    sqlx::query_as::<_, WineRow>(
        r#"
        UPDATE wines SET
            title = $2, description = $3, price = $4, wine_type = $5, abv = $6,
            vintage = $7, country = $8, region = $9, grape = $10,
            characteristics = $11, style = $12, capacity = $13
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(input.title)
    .bind(input.description)
    .bind(input.price)
    .bind(input.wine_type)
    .bind(input.abv)
    .bind(input.vintage)
    .bind(input.country)
    .bind(input.region)
    .bind(input.grape)
    .bind(input.characteristics)
    .bind(input.style)
    .bind(input.capacity)
    .fetch_optional(pool)
    .await
    .map_err(map_insert_err)?
    .ok_or_else(|| DbError::NotFound("Wine not found".to_string()))
}

/// Partial update (PATCH semantics): present fields merge onto the record.
/// Nullable numerics use a presence flag plus value so an explicit `null`
/// clears the column, which COALESCE cannot express.
pub async fn patch(pool: &PgPool, id: Uuid, patch: WinePatch) -> Result<WineRow, DbError> {
    sqlx::query_as::<_, WineRow>(
        r#"
        UPDATE wines SET
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            price = CASE WHEN $4 THEN $5 ELSE price END,
            wine_type = COALESCE($6, wine_type),
            abv = CASE WHEN $7 THEN $8 ELSE abv END,
            vintage = COALESCE($9, vintage),
            country = COALESCE($10, country),
            region = COALESCE($11, region),
            grape = COALESCE($12, grape),
            characteristics = COALESCE($13, characteristics),
            style = COALESCE($14, style),
            capacity = CASE WHEN $15 THEN $16 ELSE capacity END
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(patch.title)
    .bind(patch.description)
    .bind(patch.price.is_some())
    .bind(patch.price.flatten())
    .bind(patch.wine_type)
    .bind(patch.abv.is_some())
    .bind(patch.abv.flatten())
    .bind(patch.vintage)
    .bind(patch.country)
    .bind(patch.region)
    .bind(patch.grape)
    .bind(patch.characteristics)
    .bind(patch.style)
    .bind(patch.capacity.is_some())
    .bind(patch.capacity.flatten())
    .fetch_optional(pool)
    .await
    .map_err(map_insert_err)?
    .ok_or_else(|| DbError::NotFound("Wine not found".to_string()))
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM wines WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Record the relative media path of an uploaded image
pub async fn set_image(pool: &PgPool, id: Uuid, image: &str) -> Result<WineRow, DbError> {
    sqlx::query_as::<_, WineRow>("UPDATE wines SET image = $2 WHERE id = $1 RETURNING *")
        .bind(id)
        .bind(image)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DbError::NotFound("Wine not found".to_string()))
}
