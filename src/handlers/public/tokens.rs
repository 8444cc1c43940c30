use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{self, password, Claims, TokenKind};
use crate::database::{self, repositories::users};
use crate::error::ApiError;
use crate::extract::Json;

// Same message for unknown email, wrong password and inactive account,
// so the endpoint does not reveal which accounts exist.
const BAD_CREDENTIALS: &str = "No active account found with the given credentials";

#[derive(Debug, Deserialize)]
pub struct ObtainPairRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

/// POST /auth/token - Obtain an access + refresh token pair
pub async fn obtain_pair(
    Json(payload): Json<ObtainPairRequest>,
) -> Result<Json<Value>, ApiError> {
    let pool = database::pool()?;

    let user = users::find_by_email(pool, payload.email.trim())
        .await?
        .ok_or_else(|| ApiError::unauthorized(BAD_CREDENTIALS))?;

    if !user.is_active || !password::verify_password(&payload.password, &user.password_hash) {
        return Err(ApiError::unauthorized(BAD_CREDENTIALS));
    }

    let pair = auth::issue_token_pair(&user)?;
    Ok(Json(json!({ "access": pair.access, "refresh": pair.refresh })))
}

/// POST /auth/token/refresh - Trade a refresh token for a new access token
///
/// The account is re-checked so deactivation and role changes take effect
/// at refresh time rather than only at the next full login.
pub async fn refresh(Json(payload): Json<RefreshRequest>) -> Result<Json<Value>, ApiError> {
    let claims = auth::verify_token_kind(&payload.refresh, TokenKind::Refresh)?;

    let pool = database::pool()?;
    let user = users::find_by_id(pool, claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::unauthorized(BAD_CREDENTIALS))?;

    let access = auth::generate_token(&Claims::new(&user, TokenKind::Access))?;
    Ok(Json(json!({ "access": access })))
}

/// POST /auth/token/verify - Check a token's signature and expiry
pub async fn verify(Json(payload): Json<VerifyRequest>) -> Result<Json<Value>, ApiError> {
    auth::verify_token(&payload.token)?;
    Ok(Json(json!({})))
}
