use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::database::models::user::UserRow;

pub mod password;
pub mod permissions;

/// Which half of the token pair a JWT represents. Protected routes only
/// accept access tokens; the refresh endpoint only accepts refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub kind: TokenKind,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user: &UserRow, kind: TokenKind) -> Self {
        let now = Utc::now();
        let security = &config::config().security;
        let lifetime = match kind {
            TokenKind::Access => Duration::minutes(security.access_token_expiry_mins),
            TokenKind::Refresh => Duration::hours(security.refresh_token_expiry_hours),
        };

        Self {
            sub: user.id,
            email: user.email.clone(),
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            is_active: user.is_active,
            kind,
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Access + refresh token pair returned by the token-obtain endpoint
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token is not valid for this operation")]
    WrongTokenKind,

    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("Password hashing error: {0}")]
    Hashing(String),
}

fn secret() -> Result<&'static str, AuthError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }
    Ok(secret)
}

pub fn generate_token(claims: &Claims) -> Result<String, AuthError> {
    let encoding_key = EncodingKey::from_secret(secret()?.as_bytes());

    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Issue the access + refresh pair for a freshly authenticated user
pub fn issue_token_pair(user: &UserRow) -> Result<TokenPair, AuthError> {
    Ok(TokenPair {
        access: generate_token(&Claims::new(user, TokenKind::Access))?,
        refresh: generate_token(&Claims::new(user, TokenKind::Refresh))?,
    })
}

/// Validate signature and expiry, returning the claims of either token kind
pub fn verify_token(token: &str) -> Result<Claims, AuthError> {
    let decoding_key = DecodingKey::from_secret(secret()?.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

/// Validate a token and require it to be of the given kind
pub fn verify_token_kind(token: &str, kind: TokenKind) -> Result<Claims, AuthError> {
    let claims = verify_token(token)?;
    if claims.kind != kind {
        return Err(AuthError::WrongTokenKind);
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(is_staff: bool) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: "taster@example.com".to_string(),
            password_hash: "unused".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            is_staff,
            is_superuser: false,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn access_token_round_trips_claims() {
        let user = test_user(true);
        let token = generate_token(&Claims::new(&user, TokenKind::Access)).unwrap();

        let claims = verify_token_kind(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert!(claims.is_staff);
        assert!(!claims.is_superuser);
        assert!(claims.is_active);
    }

    #[test]
    fn refresh_token_rejected_where_access_required() {
        let user = test_user(false);
        let token = generate_token(&Claims::new(&user, TokenKind::Refresh)).unwrap();

        let err = verify_token_kind(&token, TokenKind::Access).unwrap_err();
        assert!(matches!(err, AuthError::WrongTokenKind));
    }

    #[test]
    fn tampered_token_rejected() {
        let user = test_user(false);
        let mut token = generate_token(&Claims::new(&user, TokenKind::Access)).unwrap();
        token.push('x');

        assert!(matches!(
            verify_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
