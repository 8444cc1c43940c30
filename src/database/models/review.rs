use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// One rating + comment per (wine, user) pair; the pair is unique at the
/// database level so the invariant holds under concurrent inserts.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewRow {
    pub id: Uuid,
    pub wine_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}
