use axum::{
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{protected, public};
use crate::middleware::auth::jwt_auth_middleware;

pub fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Protected API behind JWT auth
        .merge(protected_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn public_routes() -> Router {
    Router::new()
        .route("/auth/register", post(public::users::register))
        .route("/auth/token", post(public::tokens::obtain_pair))
        .route("/auth/token/refresh", post(public::tokens::refresh))
        .route("/auth/token/verify", post(public::tokens::verify))
}

fn protected_routes() -> Router {
    use protected::{users, wines};

    Router::new()
        // Profile management
        .route("/api/users/me", get(users::me).patch(users::update_me))
        .route("/api/users/:id", get(users::get).patch(users::update))
        // Wine catalog
        .route("/api/wines", get(wines::list).post(wines::create))
        .route(
            "/api/wines/:id",
            get(wines::retrieve)
                .put(wines::update)
                .patch(wines::partial_update)
                .delete(wines::destroy),
        )
        // Wine sub-actions
        .route("/api/wines/:id/upload-image", post(wines::upload_image))
        .route("/api/wines/:id/add-review", post(wines::add_review))
        .route("/api/wines/:id/delete-review", delete(wines::delete_review))
        .route("/api/wines/:id/save", post(wines::save))
        .route("/api/wines/:id/unsave", post(wines::unsave))
        .layer(axum::middleware::from_fn(jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "Cellar API",
        "version": version,
        "description": "Wine catalog REST API built with Rust (Axum)",
        "endpoints": {
            "register": "POST /auth/register (public)",
            "token": "POST /auth/token, /auth/token/refresh, /auth/token/verify (public)",
            "users": "GET|PATCH /api/users/me, /api/users/:id (protected)",
            "wines": "GET|POST /api/wines, GET|PUT|PATCH|DELETE /api/wines/:id (protected; writes require staff)",
            "actions": "POST /api/wines/:id/{upload-image,add-review,save,unsave}, DELETE /api/wines/:id/delete-review",
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
