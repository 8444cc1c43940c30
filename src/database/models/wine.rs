use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Full catalog record as stored. Text attributes default to empty strings,
/// numeric attributes and the image path are nullable.
#[derive(Debug, Clone, FromRow)]
pub struct WineRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: Option<f64>,
    pub wine_type: String,
    pub abv: Option<f64>,
    pub vintage: String,
    pub country: String,
    pub region: String,
    pub grape: String,
    pub characteristics: String,
    pub style: String,
    pub capacity: Option<f64>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// List-shaped projection with the query-time rating aggregate.
/// `average_rating` is None for wines with no reviews.
#[derive(Debug, Clone, FromRow)]
pub struct WineListRow {
    pub id: Uuid,
    pub title: String,
    pub vintage: String,
    pub price: Option<f64>,
    pub image: Option<String>,
    pub average_rating: Option<f64>,
}

/// Detail projection: full record plus the rating aggregate
#[derive(Debug, Clone, FromRow)]
pub struct WineDetailRow {
    #[sqlx(flatten)]
    pub wine: WineRow,
    pub average_rating: Option<f64>,
}

/// Payload for create and full-replace writes. Optional text fields land as
/// empty strings, matching the storage defaults.
#[derive(Debug, Clone, Default)]
pub struct WineInput {
    pub title: String,
    pub description: String,
    pub price: Option<f64>,
    pub wine_type: String,
    pub abv: Option<f64>,
    pub vintage: String,
    pub country: String,
    pub region: String,
    pub grape: String,
    pub characteristics: String,
    pub style: String,
    pub capacity: Option<f64>,
}

/// Partial update; `None` fields are left untouched. The nullable numeric
/// attributes are double-wrapped so an explicit `null` in the request body
/// (`Some(None)`) clears the stored value, distinct from an absent field.
#[derive(Debug, Clone, Default)]
pub struct WinePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Option<f64>>,
    pub wine_type: Option<String>,
    pub abv: Option<Option<f64>>,
    pub vintage: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub grape: Option<String>,
    pub characteristics: Option<String>,
    pub style: Option<String>,
    pub capacity: Option<Option<f64>>,
}
