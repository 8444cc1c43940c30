use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::api::shapes;
use crate::auth::password;
use crate::database::{self, repositories::users};
use crate::error::ApiError;
use crate::extract::Json;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// POST /auth/register - Create a new account
///
/// Email must be unique, password at least the configured minimum length.
/// Only the hash is stored; self-registered accounts are never staff.
pub async fn register(
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let email = payload.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::field_error("email", "Enter a valid email address."));
    }
    password::validate_password(&payload.password)?;

    let password_hash = password::hash_password(&payload.password)?;
    let pool = database::pool()?;

    let user = users::insert(
        pool,
        email,
        &password_hash,
        payload.first_name.trim(),
        payload.last_name.trim(),
    )
    .await?;

    tracing::info!("Registered new user {}", user.id);
    Ok((StatusCode::CREATED, Json(shapes::user(&user))))
}
