use axum::{extract::Path, Extension};
use serde::Deserialize;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::shapes;
use crate::auth::{password, permissions};
use crate::database::models::user::UserUpdate;
use crate::database::{self, repositories::users};
use crate::error::ApiError;
use crate::extract::Json;
use crate::middleware::auth::AuthUser;

/// Partial profile update. Role flags are absent on purpose: they are
/// read-only through this channel, and unknown body fields are ignored.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

async fn profile_response(pool: &PgPool, id: Uuid) -> Result<Json<Value>, ApiError> {
    let user = users::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let saved = users::saved_wines(pool, id).await?;

    Ok(Json(shapes::user_detail(&user, &saved)))
}

async fn apply_update(
    pool: &PgPool,
    id: Uuid,
    payload: UpdateUserRequest,
) -> Result<Json<Value>, ApiError> {
    let password_hash = match payload.password.as_deref() {
        Some(pw) => {
            password::validate_password(pw)?;
            Some(password::hash_password(pw)?)
        }
        None => None,
    };

    if let Some(email) = payload.email.as_deref() {
        if email.trim().is_empty() || !email.contains('@') {
            return Err(ApiError::field_error("email", "Enter a valid email address."));
        }
    }

    let user = users::update(
        pool,
        id,
        UserUpdate {
            email: payload.email.map(|e| e.trim().to_string()),
            first_name: payload.first_name,
            last_name: payload.last_name,
            password_hash,
        },
    )
    .await?;

    let saved = users::saved_wines(pool, id).await?;
    Ok(Json(shapes::user_detail(&user, &saved)))
}

/// GET /api/users/me - Current user's profile with saved wines
pub async fn me(Extension(auth): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    profile_response(database::pool()?, auth.id).await
}

/// PATCH /api/users/me - Partial self-service profile update
pub async fn update_me(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<Value>, ApiError> {
    apply_update(database::pool()?, auth.id, payload).await
}

/// GET /api/users/:id - Profile by id; owner or elevated role only
pub async fn get(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    permissions::require_user_edit(&auth, id)?;
    profile_response(database::pool()?, id).await
}

/// PATCH /api/users/:id - Update by id; owner or elevated role only
pub async fn update(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<Value>, ApiError> {
    permissions::require_user_edit(&auth, id)?;
    apply_update(database::pool()?, id, payload).await
}
