use axum::body::Body;
use axum::http::{header, Request, Response};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use uuid::Uuid;

use cellar_api::auth::{generate_token, Claims, TokenKind};
use cellar_api::database::models::user::UserRow;

fn synthetic_user(is_staff: bool, is_active: bool) -> UserRow {
    UserRow {
        id: Uuid::new_v4(),
        email: "taster@example.com".to_string(),
        password_hash: String::new(),
        first_name: String::new(),
        last_name: String::new(),
        is_staff,
        is_superuser: false,
        is_active,
        created_at: Utc::now(),
    }
}

/// Mint a signed token for a synthetic user, without touching the database
pub fn token(is_staff: bool, kind: TokenKind) -> String {
    generate_token(&Claims::new(&synthetic_user(is_staff, true), kind)).expect("token generation")
}

/// Access token for an account that has been deactivated
pub fn inactive_token() -> String {
    generate_token(&Claims::new(&synthetic_user(false, false), TokenKind::Access))
        .expect("token generation")
}

/// Access token for a stored user row, for flows that hit the database
pub fn token_for(user: &UserRow) -> String {
    generate_token(&Claims::new(user, TokenKind::Access)).expect("token generation")
}

pub fn request(method: &str, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(bearer) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", bearer));
    }

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}
