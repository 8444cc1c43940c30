mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use cellar_api::auth::TokenKind;

// Request validation happens before any database access; these paths are
// exercised against the real router with no backing store.

#[tokio::test]
async fn register_rejects_short_password() {
    let res = cellar_api::app()
        .oneshot(common::request(
            "POST",
            "/auth/register",
            None,
            Some(json!({ "email": "new@example.com", "password": "four" })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(res).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["password"]
        .as_str()
        .unwrap()
        .contains("at least 5"));
}

#[tokio::test]
async fn register_rejects_invalid_email() {
    let res = cellar_api::app()
        .oneshot(common::request(
            "POST",
            "/auth/register",
            None,
            Some(json!({ "email": "not-an-email", "password": "longenough" })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(res).await;
    assert!(body["field_errors"]["email"].is_string());
}

#[tokio::test]
async fn malformed_json_body_gets_structured_error() {
    let res = cellar_api::app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(res).await;
    assert_eq!(body["error"], json!(true));
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn list_rejects_malformed_numeric_filter() {
    let token = common::token(false, TokenKind::Access);

    let res = cellar_api::app()
        .oneshot(common::request(
            "GET",
            "/api/wines?min_price=cheap",
            Some(&token),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(res).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["min_price"]
        .as_str()
        .unwrap()
        .contains("cheap"));
}

#[tokio::test]
async fn review_rating_must_stay_in_bounds() {
    let token = common::token(false, TokenKind::Access);
    let id = uuid::Uuid::new_v4();

    for rating in [-1, 11] {
        let res = cellar_api::app()
            .oneshot(common::request(
                "POST",
                &format!("/api/wines/{}/add-review", id),
                Some(&token),
                Some(json!({ "rating": rating, "comment": "Wow" })),
            ))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "rating {}", rating);
        let body = common::body_json(res).await;
        assert!(body["field_errors"]["rating"].is_string());
    }
}

#[tokio::test]
async fn blank_wine_title_rejected_before_permissions_pass() {
    // Staff token passes the catalog write gate, then validation fires
    let staff = common::token(true, TokenKind::Access);

    let res = cellar_api::app()
        .oneshot(common::request(
            "POST",
            "/api/wines",
            Some(&staff),
            Some(json!({ "title": "   " })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(res).await;
    assert!(body["field_errors"]["title"].is_string());
}
