use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, Query},
    http::StatusCode,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::shapes::{self, WineAction, WineShape};
use crate::auth::permissions;
use crate::config;
use crate::database::models::wine::{WineInput, WinePatch, WineRow};
use crate::database::repositories::{reviews, users, wines};
use crate::database::{self, DbError};
use crate::error::ApiError;
use crate::extract::Json;
use crate::filter::WineFilters;
use crate::middleware::auth::AuthUser;
use crate::services::media;

/// Create / full-replace payload; only the title is required
#[derive(Debug, Deserialize)]
pub struct WineRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Option<f64>,
    #[serde(default)]
    pub wine_type: String,
    pub abv: Option<f64>,
    #[serde(default)]
    pub vintage: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub grape: String,
    #[serde(default)]
    pub characteristics: String,
    pub style: Option<String>,
    pub capacity: Option<f64>,
}

impl WineRequest {
    fn into_input(self) -> Result<WineInput, ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::field_error("title", "This field may not be blank."));
        }
        Ok(WineInput {
            title: self.title,
            description: self.description,
            price: self.price,
            wine_type: self.wine_type,
            abv: self.abv,
            vintage: self.vintage,
            country: self.country,
            region: self.region,
            grape: self.grape,
            characteristics: self.characteristics,
            style: self.style.unwrap_or_default(),
            capacity: self.capacity,
        })
    }
}

/// Distinguishes an absent field from an explicit `null`: an absent field
/// stays at the outer `None` default, a present field (null included)
/// deserializes to `Some(..)`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// Patch payload. The nullable numeric attributes accept an explicit `null`
/// to clear the stored value.
#[derive(Debug, Deserialize)]
pub struct WinePatchRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub price: Option<Option<f64>>,
    pub wine_type: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub abv: Option<Option<f64>>,
    pub vintage: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub grape: Option<String>,
    pub characteristics: Option<String>,
    pub style: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub capacity: Option<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

/// Render a wine write response in the shape the action maps to
fn write_response(action: WineAction, wine: &WineRow) -> Value {
    match shapes::shape_for(action) {
        WineShape::Image => shapes::wine_image(wine),
        _ => shapes::wine_record(wine),
    }
}

/// GET /api/wines - Filtered catalog listing (any authenticated user)
pub async fn list(
    Extension(_auth): Extension<AuthUser>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let filters = WineFilters::from_params(&params)?;
    let rows = wines::list(database::pool()?, &filters).await?;

    let items: Vec<Value> = match shapes::shape_for(WineAction::List) {
        WineShape::List => rows.iter().map(shapes::wine_list_item).collect(),
        _ => unreachable!("list action always renders list items"),
    };
    Ok(Json(Value::Array(items)))
}

/// GET /api/wines/:id - Detail with average rating and reviews
pub async fn retrieve(
    Extension(_auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let pool = database::pool()?;

    let detail = wines::detail(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Wine not found"))?;
    let wine_reviews = reviews::for_wine(pool, id).await?;

    Ok(Json(shapes::wine_detail(&detail, &wine_reviews)))
}

/// POST /api/wines - Create a catalog record (elevated role only)
pub async fn create(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<WineRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    permissions::require_catalog_write(&auth)?;
    let input = payload.into_input()?;

    let wine = wines::insert(database::pool()?, input).await?;
    tracing::info!("Wine {} created by {}", wine.id, auth.email);

    Ok((
        StatusCode::CREATED,
        Json(write_response(WineAction::Create, &wine)),
    ))
}

/// PUT /api/wines/:id - Full replace (elevated role only)
pub async fn update(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<WineRequest>,
) -> Result<Json<Value>, ApiError> {
    permissions::require_catalog_write(&auth)?;
    let input = payload.into_input()?;

    let wine = wines::replace(database::pool()?, id, input).await?;
    Ok(Json(write_response(WineAction::Update, &wine)))
}

/// PATCH /api/wines/:id - Merge present fields (elevated role only)
pub async fn partial_update(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<WinePatchRequest>,
) -> Result<Json<Value>, ApiError> {
    permissions::require_catalog_write(&auth)?;

    if let Some(title) = payload.title.as_deref() {
        if title.trim().is_empty() {
            return Err(ApiError::field_error("title", "This field may not be blank."));
        }
    }

    let wine = wines::patch(
        database::pool()?,
        id,
        WinePatch {
            title: payload.title,
            description: payload.description,
            price: payload.price,
            wine_type: payload.wine_type,
            abv: payload.abv,
            vintage: payload.vintage,
            country: payload.country,
            region: payload.region,
            grape: payload.grape,
            characteristics: payload.characteristics,
            style: payload.style,
            capacity: payload.capacity,
        },
    )
    .await?;

    Ok(Json(write_response(WineAction::PartialUpdate, &wine)))
}

/// DELETE /api/wines/:id - Remove a record (elevated role only)
pub async fn destroy(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    permissions::require_catalog_write(&auth)?;

    if wines::delete(database::pool()?, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Wine not found"))
    }
}

/// POST /api/wines/:id/upload-image - Attach an image (elevated role only)
///
/// Multipart form with a single `image` file field. The file lands under
/// the media root at a path derived from the wine title plus a random
/// suffix; only that relative path is stored on the record.
pub async fn upload_image(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    permissions::require_catalog_write(&auth)?;

    let pool = database::pool()?;
    let detail = wines::detail(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Wine not found"))?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("image") {
            let file_name = field
                .file_name()
                .ok_or_else(|| ApiError::field_error("image", "Expected a file upload"))?
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;
            upload = Some((file_name, bytes.to_vec()));
        }
    }

    let (file_name, bytes) = upload
        .ok_or_else(|| ApiError::field_error("image", "No image file submitted"))?;
    if bytes.is_empty() {
        return Err(ApiError::field_error("image", "The submitted file is empty."));
    }

    let relative = media::image_path(&detail.wine.title, &file_name)?;
    media::store(&config::config().media.root, &relative, &bytes).await?;

    let wine = wines::set_image(pool, id, &relative).await?;
    Ok(Json(write_response(WineAction::UploadImage, &wine)))
}

/// POST /api/wines/:id/add-review - One review per user per wine
///
/// Wine and user attribution come from the path and token, never the body.
pub async fn add_review(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if !(0..=10).contains(&payload.rating) {
        return Err(ApiError::field_error(
            "rating",
            "Ensure this value is between 0 and 10.",
        ));
    }

    let pool = database::pool()?;
    if !wines::exists(pool, id).await? {
        return Err(ApiError::not_found("Wine not found"));
    }

    if reviews::exists(pool, id, auth.id).await? {
        return Err(ApiError::bad_request(reviews::DUPLICATE_REVIEW));
    }

    // The exists check races with concurrent inserts; the unique constraint
    // decides, and its violation gets the same client error.
    let review = reviews::insert(pool, id, auth.id, payload.rating, &payload.comment)
        .await
        .map_err(|e| match e {
            DbError::Conflict(msg) => ApiError::bad_request(msg),
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(shapes::review(&review))))
}

/// DELETE /api/wines/:id/delete-review - Remove the acting user's review
pub async fn delete_review(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if reviews::delete(database::pool()?, id, auth.id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Review not found"))
    }
}

/// POST /api/wines/:id/save - Add to the user's saved set (idempotent)
pub async fn save(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let pool = database::pool()?;
    if !wines::exists(pool, id).await? {
        return Err(ApiError::not_found("Wine not found"));
    }

    users::save_wine(pool, auth.id, id).await?;
    Ok(Json(json!({ "status": "Wine added to saved" })))
}

/// POST /api/wines/:id/unsave - Remove from the saved set (idempotent)
pub async fn unsave(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let pool = database::pool()?;
    if !wines::exists(pool, id).await? {
        return Err(ApiError::not_found("Wine not found"));
    }

    users::unsave_wine(pool, auth.id, id).await?;
    Ok(Json(json!({ "status": "Wine removed from saved" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_title_rejected_on_create() {
        let request = WineRequest {
            title: "   ".to_string(),
            description: String::new(),
            price: None,
            wine_type: String::new(),
            abv: None,
            vintage: String::new(),
            country: String::new(),
            region: String::new(),
            grape: String::new(),
            characteristics: String::new(),
            style: None,
            capacity: None,
        };
        assert!(request.into_input().is_err());
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let absent: WinePatchRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(absent.price, None);

        let cleared: WinePatchRequest = serde_json::from_value(json!({ "price": null })).unwrap();
        assert_eq!(cleared.price, Some(None));

        let set: WinePatchRequest = serde_json::from_value(json!({ "price": 12.5 })).unwrap();
        assert_eq!(set.price, Some(Some(12.5)));
    }

    #[test]
    fn optional_fields_default_to_storage_defaults() {
        let request: WineRequest =
            serde_json::from_value(json!({ "title": "Test Wine", "price": 15.99 })).unwrap();
        let input = request.into_input().unwrap();

        assert_eq!(input.title, "Test Wine");
        assert_eq!(input.price, Some(15.99));
        assert_eq!(input.description, "");
        assert_eq!(input.style, "");
        assert!(input.capacity.is_none());
    }
}
