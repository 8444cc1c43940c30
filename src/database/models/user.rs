use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Account record. `email` is the login identifier; accounts are never
/// hard-deleted, only deactivated via `is_active`.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Partial update applied to a user record. `None` fields are left
/// untouched; `password_hash` is pre-hashed by the caller.
#[derive(Debug, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password_hash: Option<String>,
}
